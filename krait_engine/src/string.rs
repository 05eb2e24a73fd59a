//! The ECMAScript string type.
//!
//! [`JsString`] is an immutable, cheaply clonable string. The engine stores
//! source text as UTF-8; the few places where ECMAScript semantics are
//! defined over UTF-16 code units (string `length`, indexed access) convert
//! on the fly.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// An immutable, shared ECMAScript string.
#[derive(Clone, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct JsString {
    inner: Rc<str>,
}

impl JsString {
    /// Creates an empty string.
    #[must_use]
    pub fn empty() -> Self {
        Self { inner: "".into() }
    }

    /// Gets the string as a slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Gets the shared backing storage.
    #[inline]
    #[must_use]
    pub fn as_rc_str(&self) -> &Rc<str> {
        &self.inner
    }

    /// Returns `true` if the string is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Gets the number of UTF-16 code units in the string, the ECMAScript
    /// notion of string length.
    #[must_use]
    pub fn utf16_len(&self) -> usize {
        self.inner.encode_utf16().count()
    }

    /// Gets the code unit at the given UTF-16 index as a one-unit string,
    /// or `None` when out of bounds. Unpaired halves of surrogate pairs are
    /// replaced, which only surfaces for indexed access into the middle of
    /// an astral character.
    #[must_use]
    pub fn at_utf16(&self, index: usize) -> Option<Self> {
        let unit = self.inner.encode_utf16().nth(index)?;
        Some(Self {
            inner: String::from_utf16_lossy(&[unit]).into(),
        })
    }

    /// Concatenates two strings.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let mut buf = String::with_capacity(self.inner.len() + other.inner.len());
        buf.push_str(&self.inner);
        buf.push_str(&other.inner);
        Self { inner: buf.into() }
    }
}

impl Default for JsString {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for JsString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.inner
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        Self { inner: s.into() }
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        Self { inner: s.into() }
    }
}

impl From<Rc<str>> for JsString {
    fn from(s: Rc<str>) -> Self {
        Self { inner: s }
    }
}

impl From<&Rc<str>> for JsString {
    fn from(s: &Rc<str>) -> Self {
        Self { inner: s.clone() }
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}
