//! Property keys, attributes and descriptors.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-property-attributes

use bitflags::bitflags;

use crate::{object::JsObject, string::JsString, symbol::JsSymbol, value::JsValue};

/// The key of an own property of an object: a string, a symbol, or an array
/// index.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum PropertyKey {
    /// A string property key.
    String(JsString),

    /// A symbol property key.
    Symbol(JsSymbol),

    /// An array-index property key (an integer in `0..=u32::MAX - 1`).
    Index(u32),
}

impl PropertyKey {
    /// Creates a key from a string, normalizing canonical index forms into
    /// [`PropertyKey::Index`].
    #[must_use]
    pub fn from_string(string: &str) -> Self {
        if let Ok(index) = string.parse::<u32>() {
            // "010" and "+1" parse but are not canonical index strings.
            if index != u32::MAX && index.to_string() == string {
                return Self::Index(index);
            }
        }
        Self::String(string.into())
    }

    /// Renders the key the way diagnostics print it.
    #[must_use]
    pub fn to_display_string(&self) -> String {
        match self {
            Self::String(s) => s.as_str().to_owned(),
            Self::Symbol(s) => s.descriptive_string().as_str().to_owned(),
            Self::Index(i) => i.to_string(),
        }
    }

    /// Gets the key as an array index, if it is one.
    #[must_use]
    pub const fn as_index(&self) -> Option<u32> {
        match self {
            Self::Index(index) => Some(*index),
            _ => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(string: &str) -> Self {
        Self::from_string(string)
    }
}

impl From<JsString> for PropertyKey {
    fn from(string: JsString) -> Self {
        Self::from_string(string.as_str())
    }
}

impl From<JsSymbol> for PropertyKey {
    fn from(symbol: JsSymbol) -> Self {
        Self::Symbol(symbol)
    }
}

impl From<u32> for PropertyKey {
    fn from(index: u32) -> Self {
        Self::Index(index)
    }
}

bitflags! {
    /// The attributes of a property, as a bitfield.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Attribute: u8 {
        /// The `[[Writable]]` attribute.
        const WRITABLE = 0b0000_0001;

        /// The `[[Enumerable]]` attribute.
        const ENUMERABLE = 0b0000_0010;

        /// The `[[Configurable]]` attribute.
        const CONFIGURABLE = 0b0000_0100;

        /// No attribute set.
        const NON_ENUMERABLE = 0b0000_0000;
    }
}

impl Attribute {
    /// All three attributes set, the default for properties created by
    /// ordinary assignment.
    #[must_use]
    pub const fn all_attrs() -> Self {
        Self::WRITABLE
            .union(Self::ENUMERABLE)
            .union(Self::CONFIGURABLE)
    }
}

/// An ECMAScript property descriptor.
///
/// Fields are individually optional so a partially filled descriptor can be
/// completed against an existing property, preserving the non-overlapping
/// fields of the prior descriptor.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-property-descriptor-specification-type
#[derive(Clone, Debug, Default)]
pub struct PropertyDescriptor {
    value: Option<JsValue>,
    get: Option<Option<JsObject>>,
    set: Option<Option<JsObject>>,
    writable: Option<bool>,
    enumerable: Option<bool>,
    configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// Creates an empty descriptor builder.
    #[must_use]
    pub fn builder() -> Self {
        Self::default()
    }

    /// Creates a full data descriptor.
    #[must_use]
    pub fn data(value: JsValue, attributes: Attribute) -> Self {
        Self {
            value: Some(value),
            get: None,
            set: None,
            writable: Some(attributes.contains(Attribute::WRITABLE)),
            enumerable: Some(attributes.contains(Attribute::ENUMERABLE)),
            configurable: Some(attributes.contains(Attribute::CONFIGURABLE)),
        }
    }

    /// Creates a full accessor descriptor.
    #[must_use]
    pub fn accessor(
        get: Option<JsObject>,
        set: Option<JsObject>,
        attributes: Attribute,
    ) -> Self {
        Self {
            value: None,
            get: Some(get),
            set: Some(set),
            writable: None,
            enumerable: Some(attributes.contains(Attribute::ENUMERABLE)),
            configurable: Some(attributes.contains(Attribute::CONFIGURABLE)),
        }
    }

    /// Sets the `[[Value]]` field.
    #[must_use]
    pub fn value(mut self, value: JsValue) -> Self {
        self.value = Some(value);
        self
    }

    /// Sets the `[[Get]]` field.
    #[must_use]
    pub fn get(mut self, get: Option<JsObject>) -> Self {
        self.get = Some(get);
        self
    }

    /// Sets the `[[Set]]` field.
    #[must_use]
    pub fn set(mut self, set: Option<JsObject>) -> Self {
        self.set = Some(set);
        self
    }

    /// Sets the `[[Writable]]` field.
    #[must_use]
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    /// Sets the `[[Enumerable]]` field.
    #[must_use]
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    /// Sets the `[[Configurable]]` field.
    #[must_use]
    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    /// Returns `true` if this is (or completes into) a data descriptor.
    #[must_use]
    pub const fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// Returns `true` if this is (or completes into) an accessor descriptor.
    #[must_use]
    pub const fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    /// Gets the `[[Value]]` field.
    #[must_use]
    pub fn expect_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }

    /// Gets the `[[Get]]` field, flattened.
    #[must_use]
    pub fn get_accessor(&self) -> Option<JsObject> {
        self.get.clone().flatten()
    }

    /// Gets the `[[Set]]` field, flattened.
    #[must_use]
    pub fn set_accessor(&self) -> Option<JsObject> {
        self.set.clone().flatten()
    }

    /// Gets the `[[Writable]]` field, defaulting absent to `false`.
    #[must_use]
    pub fn expect_writable(&self) -> bool {
        self.writable.unwrap_or(false)
    }

    /// Gets the `[[Enumerable]]` field, defaulting absent to `false`.
    #[must_use]
    pub fn expect_enumerable(&self) -> bool {
        self.enumerable.unwrap_or(false)
    }

    /// Gets the `[[Configurable]]` field, defaulting absent to `false`.
    #[must_use]
    pub fn expect_configurable(&self) -> bool {
        self.configurable.unwrap_or(false)
    }

    /// Completes this descriptor against a prior one: fields absent here
    /// keep the prior descriptor's values, so a partial redefinition never
    /// clears unrelated fields.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-validateandapplypropertydescriptor
    #[must_use]
    pub fn complete_with(mut self, prior: &Self) -> Self {
        // Switching between data and accessor forms drops the fields of the
        // other form instead of inheriting them.
        let switching = (self.is_accessor_descriptor() && prior.is_data_descriptor())
            || (self.is_data_descriptor() && prior.is_accessor_descriptor());
        if !switching {
            if self.value.is_none() {
                self.value.clone_from(&prior.value);
            }
            if self.get.is_none() {
                self.get.clone_from(&prior.get);
            }
            if self.set.is_none() {
                self.set.clone_from(&prior.set);
            }
            if self.writable.is_none() {
                self.writable = prior.writable;
            }
        } else if self.is_data_descriptor() && self.writable.is_none() {
            self.writable = Some(false);
        }
        if self.enumerable.is_none() {
            self.enumerable = prior.enumerable;
        }
        if self.configurable.is_none() {
            self.configurable = prior.configurable;
        }
        self
    }

    /// Fills absent fields with the spec defaults for a fresh property.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-completepropertydescriptor
    #[must_use]
    pub fn complete(mut self) -> Self {
        if self.is_accessor_descriptor() {
            if self.get.is_none() {
                self.get = Some(None);
            }
            if self.set.is_none() {
                self.set = Some(None);
            }
        } else {
            if self.value.is_none() {
                self.value = Some(JsValue::Undefined);
            }
            if self.writable.is_none() {
                self.writable = Some(false);
            }
        }
        if self.enumerable.is_none() {
            self.enumerable = Some(false);
        }
        if self.configurable.is_none() {
            self.configurable = Some(false);
        }
        self
    }
}
