//! The ECMAScript `Symbol` type.
//!
//! Symbols compare by identity. The well-known symbols the engine consults
//! (`@@iterator`, `@@asyncIterator`, `@@toStringTag`, `@@hasInstance`) are
//! interned once per thread; every realm created on the thread shares their
//! identities.

use std::cell::Cell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::string::JsString;

thread_local! {
    static NEXT_HASH: Cell<u64> = const { Cell::new(0) };
    static WELL_KNOWN: WellKnownSymbols = WellKnownSymbols::create();
}

fn next_hash() -> u64 {
    NEXT_HASH.with(|hash| {
        let next = hash.get();
        hash.set(next + 1);
        next
    })
}

#[derive(Debug)]
struct Inner {
    hash: u64,
    description: Option<JsString>,
}

/// An ECMAScript `Symbol` value.
#[derive(Clone, Debug)]
pub struct JsSymbol {
    inner: Rc<Inner>,
}

impl JsSymbol {
    /// Creates a new unique symbol.
    #[must_use]
    pub fn new(description: Option<JsString>) -> Self {
        Self {
            inner: Rc::new(Inner {
                hash: next_hash(),
                description,
            }),
        }
    }

    /// Gets the description of the symbol, if any.
    #[must_use]
    pub fn description(&self) -> Option<&JsString> {
        self.inner.description.as_ref()
    }

    /// Gets the internal identity hash of the symbol.
    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.inner.hash
    }

    /// Gets the well-known `@@iterator` symbol.
    #[must_use]
    pub fn iterator() -> Self {
        WELL_KNOWN.with(|s| s.iterator.clone())
    }

    /// Gets the well-known `@@asyncIterator` symbol.
    #[must_use]
    pub fn async_iterator() -> Self {
        WELL_KNOWN.with(|s| s.async_iterator.clone())
    }

    /// Gets the well-known `@@toStringTag` symbol.
    #[must_use]
    pub fn to_string_tag() -> Self {
        WELL_KNOWN.with(|s| s.to_string_tag.clone())
    }

    /// Gets the well-known `@@hasInstance` symbol.
    #[must_use]
    pub fn has_instance() -> Self {
        WELL_KNOWN.with(|s| s.has_instance.clone())
    }

    /// Renders the symbol the way `String(sym)` would (`Symbol(desc)`).
    #[must_use]
    pub fn descriptive_string(&self) -> JsString {
        let description = self
            .inner
            .description
            .as_ref()
            .map_or("", JsString::as_str);
        format!("Symbol({description})").into()
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for JsSymbol {}

impl Hash for JsSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.hash.hash(state);
    }
}

impl fmt::Display for JsSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptive_string())
    }
}

/// The set of well-known symbols shared by every realm of a thread.
#[derive(Clone, Debug)]
pub struct WellKnownSymbols {
    iterator: JsSymbol,
    async_iterator: JsSymbol,
    to_string_tag: JsSymbol,
    has_instance: JsSymbol,
}

impl WellKnownSymbols {
    fn create() -> Self {
        Self {
            iterator: JsSymbol::new(Some("Symbol.iterator".into())),
            async_iterator: JsSymbol::new(Some("Symbol.asyncIterator".into())),
            to_string_tag: JsSymbol::new(Some("Symbol.toStringTag".into())),
            has_instance: JsSymbol::new(Some("Symbol.hasInstance".into())),
        }
    }

    /// Gets the thread's well-known symbol set.
    #[must_use]
    pub fn get() -> Self {
        WELL_KNOWN.with(Self::clone)
    }

    /// The `@@iterator` symbol.
    #[inline]
    #[must_use]
    pub fn iterator(&self) -> JsSymbol {
        self.iterator.clone()
    }

    /// The `@@asyncIterator` symbol.
    #[inline]
    #[must_use]
    pub fn async_iterator(&self) -> JsSymbol {
        self.async_iterator.clone()
    }

    /// The `@@toStringTag` symbol.
    #[inline]
    #[must_use]
    pub fn to_string_tag(&self) -> JsSymbol {
        self.to_string_tag.clone()
    }

    /// The `@@hasInstance` symbol.
    #[inline]
    #[must_use]
    pub fn has_instance(&self) -> JsSymbol {
        self.has_instance.clone()
    }
}
