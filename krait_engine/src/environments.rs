//! Lexical environments.
//!
//! Environments form a parent chain from the innermost block scope out to
//! the global scope. Each record stores declarative bindings; a record may
//! additionally wrap a *with-object* that acts as a virtual outer record
//! for identifier lookups. Function-scope records are the hoisting targets
//! of `var` and sloppy-mode function declarations.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-environment-records

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{object::JsObject, string::JsString, value::JsValue};

/// A single binding in a declarative environment record.
#[derive(Clone, Debug)]
pub struct Binding {
    /// The bound value. `None` is the *uninitialized* TDZ sentinel.
    value: Option<JsValue>,

    /// `false` for `const` bindings.
    mutable: bool,

    /// `true` for `let`/`const`/class bindings.
    lexical: bool,

    /// `true` for function parameters.
    parameter: bool,

    /// `true` if this lexical binding blocks an Annex-B var-side binding of
    /// the same name.
    blocks_function_scope: bool,

    /// `true` for the parameter of a simple (bare-identifier) catch clause,
    /// which is permeable for the Annex-B analysis.
    simple_catch: bool,
}

/// The result of [`DeclarativeEnvironment::delete_binding`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteBinding {
    /// The binding was found and removed.
    Deleted,

    /// No binding of that name exists in the chain.
    NotFound,

    /// The binding exists but may not be removed.
    NotConfigurable,
}

/// Options for [`DeclarativeEnvironment::define`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefineOptions {
    /// `false` for `const` bindings.
    pub mutable: bool,

    /// `true` for `let`/`const`/class bindings.
    pub lexical: bool,

    /// `true` for function parameters.
    pub parameter: bool,

    /// `true` if the binding blocks Annex-B hoisting of a same-named
    /// function declaration.
    pub blocks_function_scope: bool,

    /// `true` for simple catch parameters.
    pub simple_catch: bool,
}

impl DefineOptions {
    /// Options for a mutable lexical (`let`) binding.
    #[must_use]
    pub fn lexical() -> Self {
        Self {
            mutable: true,
            lexical: true,
            ..Self::default()
        }
    }

    /// Options for a `const` binding.
    #[must_use]
    pub fn constant() -> Self {
        Self {
            mutable: false,
            lexical: true,
            ..Self::default()
        }
    }

    /// Options for a function-scoped (`var`) binding.
    #[must_use]
    pub fn var() -> Self {
        Self {
            mutable: true,
            ..Self::default()
        }
    }

    /// Options for a function parameter binding.
    #[must_use]
    pub fn param() -> Self {
        Self {
            mutable: true,
            parameter: true,
            ..Self::default()
        }
    }
}

/// The function slots of a function-scope environment: the `this` binding,
/// the active function object and the `new.target` value.
///
/// Arrow functions create no slots, so `this` lookups pass through them to
/// the enclosing function scope. A derived class constructor starts with an
/// *uninitialized* `this` slot that only `super()` fills.
#[derive(Debug)]
pub struct FunctionSlots {
    this: RefCell<Option<JsValue>>,
    function_object: JsObject,
    new_target: Option<JsObject>,
}

impl FunctionSlots {
    /// Creates slots with an already-bound `this`.
    #[must_use]
    pub fn new(this: JsValue, function_object: JsObject, new_target: Option<JsObject>) -> Self {
        Self {
            this: RefCell::new(Some(this)),
            function_object,
            new_target,
        }
    }

    /// Creates slots with an uninitialized `this`, for derived class
    /// constructors.
    #[must_use]
    pub fn new_uninitialized_this(function_object: JsObject, new_target: Option<JsObject>) -> Self {
        Self {
            this: RefCell::new(None),
            function_object,
            new_target,
        }
    }

    /// Gets the bound `this`, or `None` while it is uninitialized.
    #[must_use]
    pub fn this(&self) -> Option<JsValue> {
        self.this.borrow().clone()
    }

    /// Returns `true` once `this` has been bound.
    #[must_use]
    pub fn is_this_initialized(&self) -> bool {
        self.this.borrow().is_some()
    }

    /// Binds `this`. Returns `false` if it was already bound, which the
    /// caller reports as a re-entrant `super()` call.
    #[must_use]
    pub fn bind_this(&self, this: JsValue) -> bool {
        let mut slot = self.this.borrow_mut();
        if slot.is_some() {
            return false;
        }
        *slot = Some(this);
        true
    }

    /// Gets the active function object of this scope.
    #[must_use]
    pub fn function_object(&self) -> &JsObject {
        &self.function_object
    }

    /// Gets the `new.target` of the activation, if the function was
    /// constructed.
    #[must_use]
    pub const fn new_target(&self) -> Option<&JsObject> {
        self.new_target.as_ref()
    }
}

/// A declarative environment record.
#[derive(Debug)]
pub struct DeclarativeEnvironment {
    parent: Option<Environment>,
    bindings: RefCell<FxHashMap<JsString, Binding>>,
    function_scope: bool,
    strict: bool,
    global: bool,
    with_object: Option<JsObject>,
    slots: Option<FunctionSlots>,
    /// Lexical names declared directly in the body this record belongs to.
    /// `var`/function hoisting may not pass a name through a record that
    /// lists it here.
    body_lexical_names: RefCell<FxHashSet<JsString>>,
}

/// A shared handle on an environment record.
pub type Environment = Rc<DeclarativeEnvironment>;

impl DeclarativeEnvironment {
    /// Creates the global environment record. The global object serves as
    /// its object record: lookups that miss the declarative bindings fall
    /// through to its properties.
    #[must_use]
    pub fn new_global(global_object: JsObject) -> Environment {
        Rc::new(Self {
            parent: None,
            bindings: RefCell::default(),
            function_scope: true,
            strict: false,
            global: true,
            with_object: Some(global_object),
            slots: None,
            body_lexical_names: RefCell::default(),
        })
    }

    /// Creates a block-scope record.
    #[must_use]
    pub fn new_block(parent: Environment) -> Environment {
        let strict = parent.strict;
        Rc::new(Self {
            parent: Some(parent),
            bindings: RefCell::default(),
            function_scope: false,
            strict,
            global: false,
            with_object: None,
            slots: None,
            body_lexical_names: RefCell::default(),
        })
    }

    /// Creates a strict block-scope record. Class bodies use this: their
    /// code is strict regardless of the surrounding mode.
    #[must_use]
    pub fn new_strict_block(parent: Environment) -> Environment {
        Rc::new(Self {
            parent: Some(parent),
            bindings: RefCell::default(),
            function_scope: false,
            strict: true,
            global: false,
            with_object: None,
            slots: None,
            body_lexical_names: RefCell::default(),
        })
    }

    /// Creates a function-scope record.
    #[must_use]
    pub fn new_function(parent: Environment, strict: bool, slots: Option<FunctionSlots>) -> Environment {
        let strict = strict || parent.strict;
        Rc::new(Self {
            parent: Some(parent),
            bindings: RefCell::default(),
            function_scope: true,
            strict,
            global: false,
            with_object: None,
            slots,
            body_lexical_names: RefCell::default(),
        })
    }

    /// Creates a record wrapping a with-object as a virtual outer record.
    #[must_use]
    pub fn new_with(parent: Environment, object: JsObject) -> Environment {
        let strict = parent.strict;
        Rc::new(Self {
            parent: Some(parent),
            bindings: RefCell::default(),
            function_scope: false,
            strict,
            global: false,
            with_object: Some(object),
            slots: None,
            body_lexical_names: RefCell::default(),
        })
    }

    /// Gets the parent record, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<&Environment> {
        self.parent.as_ref()
    }

    /// Returns `true` for function-scope records.
    #[must_use]
    pub const fn is_function_scope(&self) -> bool {
        self.function_scope
    }

    /// Returns `true` for the global record.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.global
    }

    /// Returns `true` for records created inside strict code.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Gets the with-object of this record, if it wraps one.
    #[must_use]
    pub const fn with_object(&self) -> Option<&JsObject> {
        self.with_object.as_ref()
    }

    /// Gets the function slots of this record, if it is a function
    /// activation.
    #[must_use]
    pub const fn slots(&self) -> Option<&FunctionSlots> {
        self.slots.as_ref()
    }

    /// Records the lexical names declared directly in this record's body,
    /// blocking `var`/function hoisting through it.
    pub fn set_body_lexical_names(&self, names: FxHashSet<JsString>) {
        *self.body_lexical_names.borrow_mut() = names;
    }

    /// Returns `true` if the given name is a body lexical name of this
    /// record.
    #[must_use]
    pub fn is_body_lexical_name(&self, name: &JsString) -> bool {
        self.body_lexical_names.borrow().contains(name)
    }

    /// Defines a binding in this record, initializing it with `value`.
    pub fn define(&self, name: JsString, value: JsValue, options: DefineOptions) {
        self.bindings.borrow_mut().insert(
            name,
            Binding {
                value: Some(value),
                mutable: options.mutable,
                lexical: options.lexical,
                parameter: options.parameter,
                blocks_function_scope: options.blocks_function_scope,
                simple_catch: options.simple_catch,
            },
        );
    }

    /// Defines an *uninitialized* lexical binding: the TDZ state a `let`/
    /// `const` occupies between hoisting and its declaration statement.
    pub fn define_uninitialized(&self, name: JsString, options: DefineOptions) {
        self.bindings.borrow_mut().insert(
            name,
            Binding {
                value: None,
                mutable: options.mutable,
                lexical: options.lexical,
                parameter: options.parameter,
                blocks_function_scope: options.blocks_function_scope,
                simple_catch: options.simple_catch,
            },
        );
    }

    /// Initializes an existing uninitialized binding.
    pub fn initialize(&self, name: &JsString, value: JsValue) {
        if let Some(binding) = self.bindings.borrow_mut().get_mut(name) {
            binding.value = Some(value);
        }
    }

    /// Returns `true` if this record has an own binding of that name.
    #[must_use]
    pub fn has_own_binding(&self, name: &JsString) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Returns `true` if this record has an own *lexical* binding of that
    /// name.
    #[must_use]
    pub fn has_own_lexical_binding(&self, name: &JsString) -> bool {
        self.bindings
            .borrow()
            .get(name)
            .is_some_and(|binding| binding.lexical)
    }

    /// Returns `true` if this record has an own lexical binding that blocks
    /// Annex-B hoisting of the given name. Simple catch parameters are
    /// permeable.
    #[must_use]
    pub fn blocks_annex_b_function(&self, name: &JsString) -> bool {
        self.bindings.borrow().get(name).is_some_and(|binding| {
            binding.lexical && binding.blocks_function_scope && !binding.simple_catch
        })
    }

    /// Gets the state of an own binding: `None` when absent,
    /// `Some(None)` when present but uninitialized, `Some(Some(v))` when
    /// readable.
    #[must_use]
    pub fn own_binding_value(&self, name: &JsString) -> Option<Option<JsValue>> {
        self.bindings
            .borrow()
            .get(name)
            .map(|binding| binding.value.clone())
    }

    /// Returns `true` if the own binding exists and is immutable.
    #[must_use]
    pub fn is_own_binding_const(&self, name: &JsString) -> bool {
        self.bindings
            .borrow()
            .get(name)
            .is_some_and(|binding| !binding.mutable)
    }

    /// Assigns an own binding, returning `false` for `const` bindings.
    /// The caller is responsible for the TDZ check.
    #[must_use]
    pub fn assign_own(&self, name: &JsString, value: JsValue) -> bool {
        let mut bindings = self.bindings.borrow_mut();
        let Some(binding) = bindings.get_mut(name) else {
            return false;
        };
        if !binding.mutable {
            return false;
        }
        binding.value = Some(value);
        true
    }

    /// Reads a binding through the chain without failing: `None` for
    /// unresolved names and for bindings still in their TDZ. With-object
    /// properties are only consulted when they hold plain data.
    #[must_use]
    pub fn try_get(self: &Environment, name: &JsString) -> Option<JsValue> {
        let mut env = self.clone();
        loop {
            if let Some(value) = env.own_binding_value(name) {
                return value;
            }
            if let Some(object) = &env.with_object {
                let key = crate::property::PropertyKey::from_string(name);
                if let Some(descriptor) = object.get_own_property(&key) {
                    if descriptor.is_data_descriptor() {
                        return Some(descriptor.expect_value());
                    }
                    return None;
                }
            }
            match env.parent.clone() {
                Some(parent) => env = parent,
                None => return None,
            }
        }
    }

    /// Returns `true` if the name resolves anywhere in the chain,
    /// with-object properties included.
    #[must_use]
    pub fn has_binding(self: &Environment, name: &JsString) -> bool {
        let mut env = self.clone();
        loop {
            if env.has_own_binding(name) {
                return true;
            }
            if let Some(object) = &env.with_object {
                if object.has_property(&crate::property::PropertyKey::from_string(name)) {
                    return true;
                }
            }
            match env.parent.clone() {
                Some(parent) => env = parent,
                None => return false,
            }
        }
    }

    /// Walks to the nearest function-scope record (this one included).
    #[must_use]
    pub fn function_scope(self: &Environment) -> Environment {
        let mut env = self.clone();
        loop {
            if env.function_scope {
                return env;
            }
            let parent = env
                .parent
                .clone()
                .expect("scope chains always end in a function scope");
            env = parent;
        }
    }

    /// Defines a function-scoped (`var`) binding, walking up to the nearest
    /// function scope. An existing binding of the name keeps its value when
    /// `has_initializer` is `false`.
    pub fn define_function_scoped(
        self: &Environment,
        name: JsString,
        value: JsValue,
        has_initializer: bool,
    ) {
        let scope = self.function_scope();
        let mut bindings = scope.bindings.borrow_mut();
        match bindings.get_mut(&name) {
            Some(binding) => {
                if has_initializer || binding.value.is_none() {
                    binding.value = Some(value);
                }
            }
            None => {
                bindings.insert(
                    name,
                    Binding {
                        value: Some(value),
                        mutable: true,
                        lexical: false,
                        parameter: false,
                        blocks_function_scope: false,
                        simple_catch: false,
                    },
                );
            }
        }
    }

    /// Assigns the nearest function-scope binding of the name if one
    /// exists, for the Annex-B dual-binding writeback. Returns `true` on
    /// success.
    #[must_use]
    pub fn try_assign_blocked_binding(self: &Environment, name: &JsString, value: JsValue) -> bool {
        let scope = self.function_scope();
        scope.assign_own(name, value)
    }

    /// Removes a binding, walking the chain. Declarative bindings are not
    /// configurable; with-object (and global-object) properties delete by
    /// the property rules.
    #[must_use]
    pub fn delete_binding(self: &Environment, name: &JsString) -> DeleteBinding {
        let mut env = self.clone();
        loop {
            {
                let mut bindings = env.bindings.borrow_mut();
                if let Some(binding) = bindings.get(name) {
                    if env.global && !binding.lexical && !binding.parameter {
                        bindings.remove(name);
                        return DeleteBinding::Deleted;
                    }
                    return DeleteBinding::NotConfigurable;
                }
            }
            if let Some(object) = &env.with_object {
                let key = crate::property::PropertyKey::from_string(name);
                if object.has_own_property(&key) {
                    return if object.delete_property(&key) {
                        DeleteBinding::Deleted
                    } else {
                        DeleteBinding::NotConfigurable
                    };
                }
            }
            match env.parent.clone() {
                Some(parent) => env = parent,
                None => return DeleteBinding::NotFound,
            }
        }
    }

    /// Walks to the nearest record with function slots, passing through
    /// arrow activations.
    #[must_use]
    pub fn this_environment(self: &Environment) -> Option<Environment> {
        let mut env = self.clone();
        loop {
            if env.slots.is_some() {
                return Some(env);
            }
            match env.parent.clone() {
                Some(parent) => env = parent,
                None => return None,
            }
        }
    }
}
