//! The tagged value universe.
//!
//! A [`JsValue`] is `undefined`, `null`, a boolean, an IEEE-754 double, a
//! BigInt, a string, a symbol, or a shared object reference. The coercion
//! operations (`ToPrimitive`, `ToNumber`, `ToNumeric`, `ToString`,
//! `ToPropertyKey`) live here; the operator semantics built on top of them
//! live in the evaluator.

use std::fmt;

use crate::{
    bigint::JsBigInt,
    context::Context,
    error::{EvalResult, JsNativeError},
    object::JsObject,
    property::PropertyKey,
    string::JsString,
    symbol::JsSymbol,
};

/// Which primitive type `ToPrimitive` should prefer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PreferredType {
    /// No preference; numbers win.
    Default,

    /// Prefer a number result (`valueOf` first).
    Number,

    /// Prefer a string result (`toString` first).
    String,
}

/// The result of `ToNumeric`: a double or a BigInt.
#[derive(Clone, Debug)]
pub enum Numeric {
    /// A double.
    Number(f64),

    /// A BigInt.
    BigInt(JsBigInt),
}

/// An ECMAScript language value.
#[derive(Clone, Debug, Default)]
pub enum JsValue {
    /// The `undefined` value.
    #[default]
    Undefined,

    /// The `null` value.
    Null,

    /// A boolean.
    Boolean(bool),

    /// A number: an IEEE-754 double.
    Number(f64),

    /// A BigInt.
    BigInt(JsBigInt),

    /// A string.
    String(JsString),

    /// A symbol.
    Symbol(JsSymbol),

    /// A shared object reference.
    Object(JsObject),
}

impl JsValue {
    /// Creates an `undefined` value.
    #[inline]
    #[must_use]
    pub const fn undefined() -> Self {
        Self::Undefined
    }

    /// Creates a `null` value.
    #[inline]
    #[must_use]
    pub const fn null() -> Self {
        Self::Null
    }

    /// Returns `true` for `undefined`.
    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns `true` for `null`.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for `null` and `undefined`.
    #[inline]
    #[must_use]
    pub const fn is_null_or_undefined(&self) -> bool {
        matches!(self, Self::Null | Self::Undefined)
    }

    /// Returns `true` for objects.
    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    /// Gets the object reference, if this is an object.
    #[inline]
    #[must_use]
    pub const fn as_object(&self) -> Option<&JsObject> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Gets the callable object reference, if this is one.
    #[must_use]
    pub fn as_callable(&self) -> Option<&JsObject> {
        self.as_object().filter(|object| object.is_callable())
    }

    /// Gets the number, if this is a number.
    #[inline]
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Gets the string, if this is a string.
    #[inline]
    #[must_use]
    pub const fn as_string(&self) -> Option<&JsString> {
        match self {
            Self::String(string) => Some(string),
            _ => None,
        }
    }

    /// Gets the boolean, if this is a boolean.
    #[inline]
    #[must_use]
    pub const fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Boolean(boolean) => Some(*boolean),
            _ => None,
        }
    }

    /// `typeof` semantics.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-typeof-operator
    #[must_use]
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "object",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Object(object) => {
                if object.is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// `ToBoolean ( argument )`
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-toboolean
    #[must_use]
    pub fn to_boolean(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Boolean(boolean) => *boolean,
            Self::Number(number) => *number != 0.0 && !number.is_nan(),
            Self::BigInt(bigint) => !bigint.is_zero(),
            Self::String(string) => !string.is_empty(),
            Self::Symbol(_) | Self::Object(_) => true,
        }
    }

    /// `ToPrimitive ( input [ , preferredType ] )` over the ordinary
    /// `valueOf`/`toString` protocol.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-toprimitive
    pub fn to_primitive(
        &self,
        preferred: PreferredType,
        context: &mut Context,
    ) -> EvalResult<JsValue> {
        let Self::Object(object) = self else {
            return Ok(self.clone());
        };

        let method_names: [&str; 2] = if preferred == PreferredType::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };

        for name in method_names {
            let method = object.get(name, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            if let Some(callable) = method.as_callable() {
                let result =
                    crate::eval::call::call_function(callable, self, &[], context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }

        context.throw(
            JsNativeError::typ().with_message("Cannot convert object to primitive value"),
        )?;
        Ok(JsValue::Undefined)
    }

    /// `ToNumber ( argument )`
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-tonumber
    pub fn to_number(&self, context: &mut Context) -> EvalResult<f64> {
        match self {
            Self::Undefined => Ok(f64::NAN),
            Self::Null => Ok(0.0),
            Self::Boolean(boolean) => Ok(if *boolean { 1.0 } else { 0.0 }),
            Self::Number(number) => Ok(*number),
            Self::String(string) => Ok(string_to_number(string)),
            Self::BigInt(_) => {
                context.throw(
                    JsNativeError::typ()
                        .with_message("Cannot convert a BigInt value to a number"),
                )?;
                Ok(f64::NAN)
            }
            Self::Symbol(_) => {
                context.throw(
                    JsNativeError::typ()
                        .with_message("Cannot convert a Symbol value to a number"),
                )?;
                Ok(f64::NAN)
            }
            Self::Object(_) => {
                let primitive = self.to_primitive(PreferredType::Number, context)?;
                if context.should_stop() {
                    return Ok(f64::NAN);
                }
                primitive.to_number(context)
            }
        }
    }

    /// `ToNumeric ( value )`: a number or a BigInt.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-tonumeric
    pub fn to_numeric(&self, context: &mut Context) -> EvalResult<Numeric> {
        let primitive = self.to_primitive(PreferredType::Number, context)?;
        if context.should_stop() {
            return Ok(Numeric::Number(f64::NAN));
        }
        if let Self::BigInt(bigint) = &primitive {
            return Ok(Numeric::BigInt(bigint.clone()));
        }
        Ok(Numeric::Number(primitive.to_number(context)?))
    }

    /// `ToInt32 ( argument )`
    pub fn to_int32(&self, context: &mut Context) -> EvalResult<i32> {
        let number = self.to_number(context)?;
        Ok(f64_to_uint32(number) as i32)
    }

    /// `ToUint32 ( argument )`
    pub fn to_uint32(&self, context: &mut Context) -> EvalResult<u32> {
        let number = self.to_number(context)?;
        Ok(f64_to_uint32(number))
    }

    /// `ToString ( argument )`
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-tostring
    pub fn to_string(&self, context: &mut Context) -> EvalResult<JsString> {
        match self {
            Self::Undefined => Ok("undefined".into()),
            Self::Null => Ok("null".into()),
            Self::Boolean(boolean) => Ok(if *boolean { "true" } else { "false" }.into()),
            Self::Number(number) => Ok(number_to_js_string(*number)),
            Self::BigInt(bigint) => Ok(bigint.to_string_radix(10).into()),
            Self::String(string) => Ok(string.clone()),
            Self::Symbol(_) => {
                context.throw(
                    JsNativeError::typ()
                        .with_message("Cannot convert a Symbol value to a string"),
                )?;
                Ok(JsString::empty())
            }
            Self::Object(_) => {
                let primitive = self.to_primitive(PreferredType::String, context)?;
                if context.should_stop() {
                    return Ok(JsString::empty());
                }
                primitive.to_string(context)
            }
        }
    }

    /// `ToPropertyKey ( argument )`
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-topropertykey
    pub fn to_property_key(&self, context: &mut Context) -> EvalResult<PropertyKey> {
        match self {
            Self::Symbol(symbol) => Ok(PropertyKey::Symbol(symbol.clone())),
            Self::Number(number) => {
                if number.fract() == 0.0 && *number >= 0.0 && *number < f64::from(u32::MAX) {
                    return Ok(PropertyKey::Index(*number as u32));
                }
                Ok(PropertyKey::from_string(&number_to_js_string(*number)))
            }
            Self::String(string) => Ok(PropertyKey::from_string(string)),
            _ => {
                let primitive = self.to_primitive(PreferredType::String, context)?;
                if context.should_stop() {
                    return Ok(PropertyKey::from(""));
                }
                if let Self::Symbol(symbol) = &primitive {
                    return Ok(PropertyKey::Symbol(symbol.clone()));
                }
                let string = primitive.to_string(context)?;
                Ok(PropertyKey::from(string))
            }
        }
    }

    /// Strict equality (`===`).
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-isstrictlyequal
    #[must_use]
    pub fn strict_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => JsBigInt::equal(a, b),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => JsObject::equals(a, b),
            _ => false,
        }
    }

    /// Loose equality (`==`).
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-islooselyequal
    pub fn equals(&self, other: &Self, context: &mut Context) -> EvalResult<bool> {
        // 1. If Type(x) is Type(y), return IsStrictlyEqual(x, y).
        if self.same_type(other) {
            return Ok(self.strict_equals(other));
        }

        match (self, other) {
            // 2.-3. null == undefined.
            (Self::Null, Self::Undefined) | (Self::Undefined, Self::Null) => Ok(true),

            // 4.-5. Number == String: compare numerically.
            (Self::Number(a), Self::String(s)) => Ok(*a == string_to_number(s)),
            (Self::String(s), Self::Number(b)) => Ok(string_to_number(s) == *b),

            // 6.-7. BigInt == String: StringToBigInt.
            (Self::BigInt(a), Self::String(s)) => {
                Ok(JsBigInt::from_string(s).is_some_and(|b| JsBigInt::equal(a, &b)))
            }
            (Self::String(s), Self::BigInt(b)) => {
                Ok(JsBigInt::from_string(s).is_some_and(|a| JsBigInt::equal(&a, b)))
            }

            // 8.-9. Booleans coerce to numbers.
            (Self::Boolean(a), _) => {
                let lhs = Self::Number(if *a { 1.0 } else { 0.0 });
                lhs.equals(other, context)
            }
            (_, Self::Boolean(b)) => {
                let rhs = Self::Number(if *b { 1.0 } else { 0.0 });
                self.equals(&rhs, context)
            }

            // 12. BigInt == Number: mathematical values.
            (Self::BigInt(a), Self::Number(b)) | (Self::Number(b), Self::BigInt(a)) => {
                if !b.is_finite() || b.fract() != 0.0 {
                    return Ok(false);
                }
                Ok(JsBigInt::from_f64(*b).is_some_and(|b| JsBigInt::equal(a, &b)))
            }

            // 10.-11. Objects coerce to primitives.
            (Self::Object(_), _) => {
                let lhs = self.to_primitive(PreferredType::Default, context)?;
                if context.should_stop() {
                    return Ok(false);
                }
                lhs.equals(other, context)
            }
            (_, Self::Object(_)) => {
                let rhs = other.to_primitive(PreferredType::Default, context)?;
                if context.should_stop() {
                    return Ok(false);
                }
                self.equals(&rhs, context)
            }

            _ => Ok(false),
        }
    }

    /// Returns `true` if both values have the same language type.
    #[must_use]
    fn same_type(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (Self::Undefined, Self::Undefined)
                | (Self::Null, Self::Null)
                | (Self::Boolean(_), Self::Boolean(_))
                | (Self::Number(_), Self::Number(_))
                | (Self::BigInt(_), Self::BigInt(_))
                | (Self::String(_), Self::String(_))
                | (Self::Symbol(_), Self::Symbol(_))
                | (Self::Object(_), Self::Object(_))
        )
    }

    /// Renders the value for host-facing diagnostics without running any
    /// user code: error objects render as `Name: message`, other objects as
    /// their class name.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_owned(),
            Self::Null => "null".to_owned(),
            Self::Boolean(boolean) => boolean.to_string(),
            Self::Number(number) => number_to_js_string(*number).as_str().to_owned(),
            Self::BigInt(bigint) => format!("{bigint}n"),
            Self::String(string) => string.as_str().to_owned(),
            Self::Symbol(symbol) => symbol.descriptive_string().as_str().to_owned(),
            Self::Object(object) => {
                if let Some(kind) = object.error_kind() {
                    let message = object
                        .get_own_property(&PropertyKey::from("message"))
                        .map(|descriptor| descriptor.expect_value().to_display_string())
                        .unwrap_or_default();
                    if message.is_empty() {
                        kind.name().to_owned()
                    } else {
                        format!("{}: {message}", kind.name())
                    }
                } else {
                    format!("[object {}]", object.class_name())
                }
            }
        }
    }
}

/// Structural equality for hosts and tests: `SameValueZero` on primitives
/// (so `NaN` equals `NaN`), identity on symbols and objects.
impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self.strict_equals(other),
        }
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display_string())
    }
}

impl From<bool> for JsValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for JsValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for JsValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for JsValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<usize> for JsValue {
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for JsValue {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<JsString> for JsValue {
    fn from(value: JsString) -> Self {
        Self::String(value)
    }
}

impl From<JsSymbol> for JsValue {
    fn from(value: JsSymbol) -> Self {
        Self::Symbol(value)
    }
}

impl From<JsBigInt> for JsValue {
    fn from(value: JsBigInt) -> Self {
        Self::BigInt(value)
    }
}

impl From<JsObject> for JsValue {
    fn from(value: JsObject) -> Self {
        Self::Object(value)
    }
}

/// `ToUint32` on an already-converted number.
#[must_use]
pub fn f64_to_uint32(number: f64) -> u32 {
    if !number.is_finite() || number == 0.0 {
        return 0;
    }
    let two_pow_32 = 4_294_967_296.0_f64;
    let mut modulus = number.trunc() % two_pow_32;
    if modulus < 0.0 {
        modulus += two_pow_32;
    }
    modulus as u32
}

/// Formats a double the way `ToString(Number)` does.
#[must_use]
pub fn number_to_js_string(number: f64) -> JsString {
    if number.is_nan() {
        return "NaN".into();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.into();
    }
    if number == 0.0 {
        return "0".into();
    }
    let mut buffer = ryu_js::Buffer::new();
    buffer.format(number).into()
}

/// `StringToNumber ( str )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-stringtonumber
#[must_use]
pub fn string_to_number(string: &str) -> f64 {
    let trimmed = string.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let Some(rest) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        return radix_to_number(rest, 16.0);
    }
    if let Some(rest) = trimmed
        .strip_prefix("0o")
        .or_else(|| trimmed.strip_prefix("0O"))
    {
        return radix_to_number(rest, 8.0);
    }
    if let Some(rest) = trimmed
        .strip_prefix("0b")
        .or_else(|| trimmed.strip_prefix("0B"))
    {
        return radix_to_number(rest, 2.0);
    }

    // The grammar of `StringNumericLiteral` is stricter than what
    // `fast-float` accepts (no `inf`, no `nan`, no trailing garbage).
    if trimmed
        .bytes()
        .any(|b| !matches!(b, b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return f64::NAN;
    }
    fast_float::parse(trimmed).unwrap_or(f64::NAN)
}

fn radix_to_number(digits: &str, radix: f64) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }
    let mut value = 0.0_f64;
    for byte in digits.bytes() {
        let digit = match byte {
            b'0'..=b'9' => f64::from(byte - b'0'),
            b'a'..=b'f' => f64::from(byte - b'a' + 10),
            b'A'..=b'F' => f64::from(byte - b'A' + 10),
            _ => return f64::NAN,
        };
        if digit >= radix {
            return f64::NAN;
        }
        value = value * radix + digit;
    }
    value
}
