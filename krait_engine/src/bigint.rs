//! Krait's implementation of ECMAScript's bigint primitive type.

use std::fmt::{self, Display};
use std::ops::{Add, BitAnd, BitOr, BitXor, Mul, Neg, Shl, Shr, Sub};
use std::rc::Rc;

use num_traits::{pow::Pow, FromPrimitive, One, ToPrimitive, Zero};

use crate::error::JsNativeError;

/// The raw bigint type.
pub type RawBigInt = num_bigint::BigInt;

/// JavaScript bigint primitive rust type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JsBigInt {
    inner: Rc<RawBigInt>,
}

impl JsBigInt {
    /// Create a new [`JsBigInt`].
    #[must_use]
    pub fn new<T: Into<Self>>(value: T) -> Self {
        value.into()
    }

    /// Create a [`JsBigInt`] with value `0`.
    #[inline]
    #[must_use]
    pub fn zero() -> Self {
        Self {
            inner: Rc::new(RawBigInt::zero()),
        }
    }

    /// Check if is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.inner.is_zero()
    }

    /// Gets the raw value.
    #[inline]
    #[must_use]
    pub fn as_inner(&self) -> &RawBigInt {
        &self.inner
    }

    /// Convert bigint to string with radix.
    #[inline]
    #[must_use]
    pub fn to_string_radix(&self, radix: u32) -> String {
        self.inner.to_str_radix(radix)
    }

    /// Converts the `BigInt` to a f64 type.
    ///
    /// Returns `f64::INFINITY` if the `BigInt` is too big.
    #[inline]
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.inner.to_f64().unwrap_or(f64::INFINITY)
    }

    /// Converts a string to a `BigInt` with the specified radix.
    #[inline]
    #[must_use]
    pub fn from_string_radix(buf: &str, radix: u32) -> Option<Self> {
        Some(Self {
            inner: Rc::new(RawBigInt::parse_bytes(buf.as_bytes(), radix)?),
        })
    }

    /// This function takes a string and converts it to `BigInt` type.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-stringtobigint
    #[must_use]
    pub fn from_string(mut string: &str) -> Option<Self> {
        string = string.trim();

        if string.is_empty() {
            return Some(Self::zero());
        }

        let mut radix = 10;
        if string.starts_with("0b") || string.starts_with("0B") {
            radix = 2;
            string = &string[2..];
        } else if string.starts_with("0x") || string.starts_with("0X") {
            radix = 16;
            string = &string[2..];
        } else if string.starts_with("0o") || string.starts_with("0O") {
            radix = 8;
            string = &string[2..];
        }

        Self::from_string_radix(string, radix)
    }

    /// Converts a finite `f64` with no fractional part to a `BigInt`.
    #[must_use]
    pub fn from_f64(number: f64) -> Option<Self> {
        if number.is_finite() && number.fract() == 0.0 {
            RawBigInt::from_f64(number).map(Self::new)
        } else {
            None
        }
    }

    /// Checks for mathematical equality.
    #[inline]
    #[must_use]
    pub fn equal(x: &Self, y: &Self) -> bool {
        x == y
    }

    /// Performs the `+` operation.
    #[inline]
    #[must_use]
    pub fn add(x: &Self, y: &Self) -> Self {
        Self::new(x.inner.as_ref().clone().add(y.inner.as_ref()))
    }

    /// Performs the `-` operation.
    #[inline]
    #[must_use]
    pub fn sub(x: &Self, y: &Self) -> Self {
        Self::new(x.inner.as_ref().clone().sub(y.inner.as_ref()))
    }

    /// Performs the `*` operation.
    #[inline]
    #[must_use]
    pub fn mul(x: &Self, y: &Self) -> Self {
        Self::new(x.inner.as_ref().clone().mul(y.inner.as_ref()))
    }

    /// Performs the `/` operation. Fails on division by zero.
    #[inline]
    pub fn div(x: &Self, y: &Self) -> Result<Self, JsNativeError> {
        if y.is_zero() {
            return Err(JsNativeError::range().with_message("BigInt division by zero"));
        }
        Ok(Self::new(x.inner.as_ref() / y.inner.as_ref()))
    }

    /// Performs the `%` operation. Fails on division by zero.
    #[inline]
    pub fn rem(x: &Self, y: &Self) -> Result<Self, JsNativeError> {
        if y.is_zero() {
            return Err(JsNativeError::range().with_message("BigInt division by zero"));
        }
        Ok(Self::new(x.inner.as_ref() % y.inner.as_ref()))
    }

    /// Returns `x` to the power `y`.
    pub fn pow(x: &Self, y: &Self) -> Result<Self, JsNativeError> {
        let y = y
            .inner
            .to_biguint()
            .ok_or_else(|| JsNativeError::range().with_message("BigInt negative exponent"))?;

        let num_bits =
            (x.inner.bits() as f64 * y.to_f64().unwrap_or(f64::INFINITY)).floor() + 1f64;

        if num_bits > 1_000_000_000f64 {
            return Err(JsNativeError::range().with_message("Maximum BigInt size exceeded"));
        }

        Ok(Self::new(x.inner.as_ref().clone().pow(y)))
    }

    /// Performs the `>>` operation.
    pub fn shift_right(x: &Self, y: &Self) -> Result<Self, JsNativeError> {
        match y.inner.to_i32() {
            Some(n) if n > 0 => Ok(Self::new(x.inner.as_ref().clone().shr(n as usize))),
            Some(n) => Ok(Self::new(
                x.inner.as_ref().clone().shl(n.unsigned_abs() as usize),
            )),
            None => Err(JsNativeError::range().with_message("Maximum BigInt size exceeded")),
        }
    }

    /// Performs the `<<` operation.
    pub fn shift_left(x: &Self, y: &Self) -> Result<Self, JsNativeError> {
        match y.inner.to_i32() {
            Some(n) if n > 0 => Ok(Self::new(x.inner.as_ref().clone().shl(n as usize))),
            Some(n) => Ok(Self::new(
                x.inner.as_ref().clone().shr(n.unsigned_abs() as usize),
            )),
            None => Err(JsNativeError::range().with_message("Maximum BigInt size exceeded")),
        }
    }

    /// Performs the `&` operation.
    #[inline]
    #[must_use]
    pub fn bitand(x: &Self, y: &Self) -> Self {
        Self::new(x.inner.as_ref().clone().bitand(y.inner.as_ref()))
    }

    /// Performs the `|` operation.
    #[inline]
    #[must_use]
    pub fn bitor(x: &Self, y: &Self) -> Self {
        Self::new(x.inner.as_ref().clone().bitor(y.inner.as_ref()))
    }

    /// Performs the `^` operation.
    #[inline]
    #[must_use]
    pub fn bitxor(x: &Self, y: &Self) -> Self {
        Self::new(x.inner.as_ref().clone().bitxor(y.inner.as_ref()))
    }

    /// Performs the unary `-` operation.
    #[inline]
    #[must_use]
    pub fn neg(x: &Self) -> Self {
        Self::new(x.as_inner().neg())
    }

    /// Performs the `~` operation: `-x - 1`.
    #[inline]
    #[must_use]
    pub fn not(x: &Self) -> Self {
        Self::new(x.as_inner().neg().sub(&RawBigInt::one()))
    }
}

impl Display for JsBigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<RawBigInt> for JsBigInt {
    fn from(value: RawBigInt) -> Self {
        Self {
            inner: Rc::new(value),
        }
    }
}

impl From<Box<RawBigInt>> for JsBigInt {
    fn from(value: Box<RawBigInt>) -> Self {
        Self {
            inner: Rc::new(*value),
        }
    }
}

impl From<i64> for JsBigInt {
    fn from(value: i64) -> Self {
        Self {
            inner: Rc::new(RawBigInt::from(value)),
        }
    }
}

impl From<i32> for JsBigInt {
    fn from(value: i32) -> Self {
        Self {
            inner: Rc::new(RawBigInt::from(value)),
        }
    }
}

impl From<u64> for JsBigInt {
    fn from(value: u64) -> Self {
        Self {
            inner: Rc::new(RawBigInt::from(value)),
        }
    }
}
