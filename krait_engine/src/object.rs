//! The object model.
//!
//! [`JsObject`] is a shared, interior-mutable reference to an [`Object`]:
//! a prototype link, an insertion-ordered own-property map, a kind payload
//! with the internal slots of the exotic object flavors, and the private
//! elements carried by class instances. Reference counting shares the
//! objects; cycles through prototype chains and closures are accepted for
//! the lifetime of the realm.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::{
    builtins::promise::PromiseData,
    context::Context,
    error::{ErrorKind, EvalResult, JsNativeError},
    function::{BoundFunction, NativeFunctionData, ScriptFunction},
    generator::{AsyncGeneratorData, GeneratorData},
    private::PrivateElement,
    property::{Attribute, PropertyDescriptor, PropertyKey},
    string::JsString,
    value::JsValue,
};

/// The exotic flavor and internal slots of an object.
#[derive(Debug, Default)]
pub enum ObjectKind {
    /// An ordinary object.
    #[default]
    Ordinary,

    /// An array exotic object. The `length` property tracks index inserts.
    Array,

    /// An (unmapped) arguments object.
    Arguments,

    /// A standard error object.
    Error(ErrorKind),

    /// A function defined by ECMAScript code.
    Function(Rc<ScriptFunction>),

    /// A host function.
    NativeFunction(NativeFunctionData),

    /// A bound function created by `Function.prototype.bind`.
    BoundFunction(BoundFunction),

    /// A generator iterator object.
    Generator(GeneratorData),

    /// An async generator iterator object.
    AsyncGenerator(AsyncGeneratorData),

    /// A promise object.
    Promise(PromiseData),

    /// A pre-linked module namespace object.
    ModuleNamespace,
}

/// The data of an object.
#[derive(Debug, Default)]
pub struct Object {
    kind: ObjectKind,
    prototype: Option<JsObject>,
    properties: IndexMap<PropertyKey, PropertyDescriptor>,
    extensible: bool,
    private_elements: FxHashMap<u64, PrivateElement>,
}

impl Object {
    /// Gets the kind of the object.
    #[must_use]
    pub const fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// Gets the kind of the object, mutably.
    pub fn kind_mut(&mut self) -> &mut ObjectKind {
        &mut self.kind
    }

    /// Gets the generator data, if this is a generator object.
    pub fn as_generator_mut(&mut self) -> Option<&mut GeneratorData> {
        match &mut self.kind {
            ObjectKind::Generator(data) => Some(data),
            _ => None,
        }
    }

    /// Gets the async generator data, if this is an async generator object.
    pub fn as_async_generator_mut(&mut self) -> Option<&mut AsyncGeneratorData> {
        match &mut self.kind {
            ObjectKind::AsyncGenerator(data) => Some(data),
            _ => None,
        }
    }

    /// Gets the promise data, if this is a promise object.
    pub fn as_promise_mut(&mut self) -> Option<&mut PromiseData> {
        match &mut self.kind {
            ObjectKind::Promise(data) => Some(data),
            _ => None,
        }
    }
}

/// A shared, interior-mutable reference to an [`Object`].
#[derive(Clone)]
pub struct JsObject {
    inner: Rc<RefCell<Object>>,
}

impl JsObject {
    /// Creates an ordinary object with the given prototype.
    #[must_use]
    pub fn new_ordinary(prototype: Option<JsObject>) -> Self {
        Self::from_proto_and_kind(prototype, ObjectKind::Ordinary)
    }

    /// Creates an object with a `null` prototype.
    #[must_use]
    pub fn with_null_proto() -> Self {
        Self::from_proto_and_kind(None, ObjectKind::Ordinary)
    }

    /// Creates an object from its prototype and kind.
    #[must_use]
    pub fn from_proto_and_kind(prototype: Option<JsObject>, kind: ObjectKind) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Object {
                kind,
                prototype,
                properties: IndexMap::new(),
                extensible: true,
                private_elements: FxHashMap::default(),
            })),
        }
    }

    /// Creates a pre-linked module namespace object: a frozen, null-proto
    /// view over the given exports, tagged `Module`.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-module-namespace-objects
    #[must_use]
    pub fn module_namespace(
        exports: Vec<(JsString, JsValue)>,
        to_string_tag: crate::symbol::JsSymbol,
    ) -> Self {
        let object = Self::from_proto_and_kind(None, ObjectKind::ModuleNamespace);
        for (name, value) in exports {
            object.insert_property(
                PropertyKey::from(name),
                PropertyDescriptor::data(value, Attribute::ENUMERABLE),
            );
        }
        object.insert_property(
            PropertyKey::Symbol(to_string_tag),
            PropertyDescriptor::data(JsValue::from("Module"), Attribute::empty()),
        );
        object.prevent_extensions();
        object
    }

    /// Creates an array object holding the given values.
    #[must_use]
    pub fn array_from(values: Vec<JsValue>, prototype: Option<JsObject>) -> Self {
        let object = Self::from_proto_and_kind(prototype, ObjectKind::Array);
        {
            let mut inner = object.inner.borrow_mut();
            let len = values.len() as u32;
            for (i, value) in values.into_iter().enumerate() {
                inner.properties.insert(
                    PropertyKey::Index(i as u32),
                    PropertyDescriptor::data(value, Attribute::all_attrs()),
                );
            }
            inner.properties.insert(
                PropertyKey::from("length"),
                PropertyDescriptor::data(JsValue::from(f64::from(len)), Attribute::WRITABLE),
            );
        }
        object
    }

    /// Borrows the object data.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently mutably borrowed.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Object> {
        self.inner.borrow()
    }

    /// Mutably borrows the object data.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently borrowed.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, Object> {
        self.inner.borrow_mut()
    }

    /// Returns `true` if both references point to the same object.
    #[inline]
    #[must_use]
    pub fn equals(lhs: &Self, rhs: &Self) -> bool {
        Rc::ptr_eq(&lhs.inner, &rhs.inner)
    }

    /// Gets the prototype of the object.
    #[must_use]
    pub fn prototype(&self) -> Option<JsObject> {
        self.inner.borrow().prototype.clone()
    }

    /// Sets the prototype of the object.
    pub fn set_prototype(&self, prototype: Option<JsObject>) {
        self.inner.borrow_mut().prototype = prototype;
    }

    /// Returns `true` if new properties may be added.
    #[must_use]
    pub fn is_extensible(&self) -> bool {
        self.inner.borrow().extensible
    }

    /// Disallows adding new properties.
    pub fn prevent_extensions(&self) {
        self.inner.borrow_mut().extensible = false;
    }

    /// Returns `true` if the object is callable.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(
            self.inner.borrow().kind,
            ObjectKind::Function(_) | ObjectKind::NativeFunction(_) | ObjectKind::BoundFunction(_)
        )
    }

    /// Returns `true` if `new` may be applied to the object.
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        match &self.inner.borrow().kind {
            ObjectKind::Function(function) => {
                let node = function.node();
                !node.is_arrow() && !node.kind().is_async() && !node.kind().is_generator()
                    && !function.is_method()
            }
            ObjectKind::NativeFunction(data) => data.constructor,
            ObjectKind::BoundFunction(bound) => bound.target.is_constructor(),
            _ => false,
        }
    }

    /// Gets the script function data, if this is a script function.
    #[must_use]
    pub fn as_script_function(&self) -> Option<Rc<ScriptFunction>> {
        match &self.inner.borrow().kind {
            ObjectKind::Function(function) => Some(function.clone()),
            _ => None,
        }
    }

    /// Returns `true` for array exotic objects.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.inner.borrow().kind, ObjectKind::Array)
    }

    /// Returns `true` for promise objects.
    #[must_use]
    pub fn is_promise(&self) -> bool {
        matches!(self.inner.borrow().kind, ObjectKind::Promise(_))
    }

    /// Returns `true` for error objects, optionally of a specific kind.
    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.inner.borrow().kind {
            ObjectKind::Error(kind) => Some(kind),
            _ => None,
        }
    }

    /// Gets a clone of the own property descriptor for `key`.
    #[must_use]
    pub fn get_own_property(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        self.inner.borrow().properties.get(key).cloned()
    }

    /// Returns `true` if `key` names an own or inherited property.
    #[must_use]
    pub fn has_property(&self, key: &PropertyKey) -> bool {
        let mut current = self.clone();
        loop {
            if current.inner.borrow().properties.contains_key(key) {
                return true;
            }
            let prototype = current.prototype();
            match prototype {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Returns `true` if `key` names an own property.
    #[must_use]
    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.inner.borrow().properties.contains_key(key)
    }

    /// Inserts a property without running the redefinition checks. The
    /// builtin-construction path uses this.
    pub fn insert_property<K: Into<PropertyKey>>(&self, key: K, descriptor: PropertyDescriptor) {
        let key = key.into();
        let mut object = self.inner.borrow_mut();
        let descriptor = descriptor.complete();
        update_array_length_on_insert(&mut object, &key);
        object.properties.insert(key, descriptor);
    }

    /// `[[DefineOwnProperty]]`: defines or redefines a property, completing
    /// a partial descriptor against the prior one so non-overlapping fields
    /// survive.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-ordinarydefineownproperty
    #[must_use]
    pub fn define_own_property(&self, key: PropertyKey, descriptor: PropertyDescriptor) -> bool {
        let mut object = self.inner.borrow_mut();
        match object.properties.get(&key) {
            Some(prior) => {
                if !prior.expect_configurable() {
                    // A non-configurable data property still accepts value
                    // updates while writable.
                    let writable_update = prior.is_data_descriptor()
                        && prior.expect_writable()
                        && descriptor.is_data_descriptor();
                    if !writable_update {
                        return false;
                    }
                }
                let completed = descriptor.complete_with(prior);
                if matches!(object.kind, ObjectKind::Array) {
                    apply_array_length_set(&mut object, &key, &completed);
                }
                object.properties.insert(key, completed);
            }
            None => {
                if !object.extensible {
                    return false;
                }
                let completed = descriptor.complete();
                if matches!(object.kind, ObjectKind::Array) {
                    apply_array_length_set(&mut object, &key, &completed);
                }
                update_array_length_on_insert(&mut object, &key);
                object.properties.insert(key, completed);
            }
        }
        true
    }

    /// `[[Delete]]`: removes an own property if it is configurable.
    #[must_use]
    pub fn delete_property(&self, key: &PropertyKey) -> bool {
        let mut object = self.inner.borrow_mut();
        match object.properties.get(key) {
            Some(descriptor) => {
                if descriptor.expect_configurable() {
                    object.properties.shift_remove(key);
                    true
                } else {
                    false
                }
            }
            None => true,
        }
    }

    /// `[[OwnPropertyKeys]]`: array indexes in ascending order, then string
    /// keys in insertion order, then symbol keys in insertion order.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-ordinaryownpropertykeys
    #[must_use]
    pub fn own_property_keys(&self) -> Vec<PropertyKey> {
        let object = self.inner.borrow();
        let mut indexes = Vec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for key in object.properties.keys() {
            match key {
                PropertyKey::Index(index) => indexes.push(*index),
                PropertyKey::String(_) => strings.push(key.clone()),
                PropertyKey::Symbol(_) => symbols.push(key.clone()),
            }
        }
        indexes.sort_unstable();
        let mut keys: Vec<PropertyKey> = indexes.into_iter().map(PropertyKey::Index).collect();
        keys.extend(strings);
        keys.extend(symbols);
        keys
    }

    /// `[[Get]]` with the object itself as receiver.
    pub fn get<K: Into<PropertyKey>>(&self, key: K, context: &mut Context) -> EvalResult<JsValue> {
        let key = key.into();
        let receiver = JsValue::from(self.clone());
        self.get_with_receiver(&key, &receiver, context)
    }

    /// `[[Get]]`: walks the prototype chain; accessors are invoked with the
    /// given receiver.
    pub fn get_with_receiver(
        &self,
        key: &PropertyKey,
        receiver: &JsValue,
        context: &mut Context,
    ) -> EvalResult<JsValue> {
        let mut current = self.clone();
        loop {
            let descriptor = current.get_own_property(key);
            if let Some(descriptor) = descriptor {
                if descriptor.is_accessor_descriptor() {
                    return match descriptor.get_accessor() {
                        Some(getter) => crate::eval::call::call_function(
                            &getter, receiver, &[], context,
                        ),
                        None => Ok(JsValue::Undefined),
                    };
                }
                return Ok(descriptor.expect_value());
            }
            let prototype = current.prototype();
            match prototype {
                Some(parent) => current = parent,
                None => return Ok(JsValue::Undefined),
            }
        }
    }

    /// `[[Set]]` with the object itself as receiver. Returns `false` when
    /// the assignment was rejected; strict-mode callers turn that into a
    /// `TypeError`.
    pub fn set<K: Into<PropertyKey>>(
        &self,
        key: K,
        value: JsValue,
        context: &mut Context,
    ) -> EvalResult<bool> {
        let key = key.into();
        let receiver = JsValue::from(self.clone());
        self.set_with_receiver(&key, value, &receiver, context)
    }

    /// `[[Set]]`: honors inherited setters and non-writable data
    /// properties; otherwise creates or updates an own data property.
    pub fn set_with_receiver(
        &self,
        key: &PropertyKey,
        value: JsValue,
        receiver: &JsValue,
        context: &mut Context,
    ) -> EvalResult<bool> {
        let mut current = self.clone();
        loop {
            let descriptor = current.get_own_property(key);
            if let Some(descriptor) = descriptor {
                if descriptor.is_accessor_descriptor() {
                    return match descriptor.set_accessor() {
                        Some(setter) => {
                            crate::eval::call::call_function(&setter, receiver, &[value], context)?;
                            Ok(true)
                        }
                        None => Ok(false),
                    };
                }
                if !descriptor.expect_writable() {
                    return Ok(false);
                }
                // Write to the receiver, not the holder of the inherited
                // property.
                let target = match receiver {
                    JsValue::Object(object) => object.clone(),
                    _ => self.clone(),
                };
                return Ok(target.define_own_property(
                    key.clone(),
                    PropertyDescriptor::builder().value(value),
                ));
            }
            let prototype = current.prototype();
            match prototype {
                Some(parent) => current = parent,
                None => {
                    let target = match receiver {
                        JsValue::Object(object) => object.clone(),
                        _ => self.clone(),
                    };
                    return Ok(target.define_own_property(
                        key.clone(),
                        PropertyDescriptor::data(value, Attribute::all_attrs()),
                    ));
                }
            }
        }
    }

    /// `GetMethod ( V, P )`: gets a property and checks that it is either
    /// absent or callable.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-getmethod
    pub fn get_method<K: Into<PropertyKey>>(
        &self,
        key: K,
        context: &mut Context,
    ) -> EvalResult<Option<JsObject>> {
        let key = key.into();
        let value = self.get(key.clone(), context)?;
        if context.should_stop() {
            return Ok(None);
        }
        match value {
            JsValue::Undefined | JsValue::Null => Ok(None),
            JsValue::Object(object) if object.is_callable() => Ok(Some(object)),
            _ => {
                context.throw(
                    JsNativeError::typ()
                        .with_message(format!("{} is not a function", key.to_display_string())),
                )?;
                Ok(None)
            }
        }
    }

    /// Gets the array `length`, if this is an array object.
    #[must_use]
    pub fn array_length(&self) -> Option<u32> {
        if !self.is_array() {
            return None;
        }
        let descriptor = self.get_own_property(&PropertyKey::from("length"))?;
        match descriptor.expect_value() {
            JsValue::Number(n) => Some(n as u32),
            _ => Some(0),
        }
    }

    /// Gets a private element.
    #[must_use]
    pub fn get_private(&self, id: u64) -> Option<PrivateElement> {
        self.inner.borrow().private_elements.get(&id).cloned()
    }

    /// Returns `true` if the object carries the private element, which is
    /// the brand check for its class.
    #[must_use]
    pub fn has_private(&self, id: u64) -> bool {
        self.inner.borrow().private_elements.contains_key(&id)
    }

    /// Installs a private element on the object.
    pub fn install_private(&self, id: u64, element: PrivateElement) {
        self.inner.borrow_mut().private_elements.insert(id, element);
    }

    /// Writes a private field. Returns `false` if the object does not carry
    /// the field, or carries it as a method.
    #[must_use]
    pub fn set_private_field(&self, id: u64, value: JsValue) -> bool {
        let mut object = self.inner.borrow_mut();
        match object.private_elements.get_mut(&id) {
            Some(PrivateElement::Field(slot)) => {
                *slot = value;
                true
            }
            _ => false,
        }
    }

    /// Renders a short type name for diagnostics.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self.inner.borrow().kind {
            ObjectKind::Array => "Array",
            ObjectKind::Error(_) => "Error",
            ObjectKind::Function(_)
            | ObjectKind::NativeFunction(_)
            | ObjectKind::BoundFunction(_) => "Function",
            ObjectKind::Generator(_) => "Generator",
            ObjectKind::AsyncGenerator(_) => "AsyncGenerator",
            ObjectKind::Promise(_) => "Promise",
            ObjectKind::Arguments => "Arguments",
            ObjectKind::ModuleNamespace => "Module",
            ObjectKind::Ordinary => "Object",
        }
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Objects can be cyclic; print only the identity and kind.
        write!(f, "JsObject({:p})", Rc::as_ptr(&self.inner))
    }
}

/// Bumps the array `length` when an index at or past it is inserted.
fn update_array_length_on_insert(object: &mut Object, key: &PropertyKey) {
    if !matches!(object.kind, ObjectKind::Array) {
        return;
    }
    let Some(index) = key.as_index() else {
        return;
    };
    let length_key = PropertyKey::from("length");
    let current = match object.properties.get(&length_key) {
        Some(descriptor) => match descriptor.expect_value() {
            JsValue::Number(n) => n as u32,
            _ => 0,
        },
        None => 0,
    };
    if index >= current {
        object.properties.insert(
            length_key,
            PropertyDescriptor::data(
                JsValue::from(f64::from(index + 1)),
                Attribute::WRITABLE,
            ),
        );
    }
}

/// Truncates the stored indexes when the array `length` is set smaller.
fn apply_array_length_set(object: &mut Object, key: &PropertyKey, descriptor: &PropertyDescriptor) {
    let is_length = matches!(key, PropertyKey::String(s) if s.as_str() == "length");
    if !is_length || !descriptor.is_data_descriptor() {
        return;
    }
    let new_length = match descriptor.expect_value() {
        JsValue::Number(n) if n >= 0.0 && n.fract() == 0.0 => n as u32,
        _ => return,
    };
    let doomed: Vec<PropertyKey> = object
        .properties
        .keys()
        .filter(|key| matches!(key, PropertyKey::Index(i) if *i >= new_length))
        .cloned()
        .collect();
    for key in doomed {
        object.properties.shift_remove(&key);
    }
}
