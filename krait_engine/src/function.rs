//! Callable internal data: script functions and host functions.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use krait_ast::function::Function as FunctionNode;

use crate::{
    context::Context,
    environments::Environment,
    error::EvalResult,
    object::JsObject,
    private::{PrivateElement, PrivateEnvironment, PrivateName},
    property::PropertyKey,
    realm::Realm,
    string::JsString,
    value::JsValue,
};

/// How a function treats its `this` argument.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-ecmascript-function-objects
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ThisMode {
    /// Arrow functions: `this` is resolved lexically in the defining scope.
    Lexical,

    /// Strict functions: `this` is used as passed.
    Strict,

    /// Sloppy functions: `undefined` and `null` are replaced by the global
    /// object.
    Global,
}

/// Whether a class constructor is a base or a derived constructor.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConstructorKind {
    /// A base constructor: allocates its own `this`.
    Base,

    /// A derived constructor: receives `this` from `super()`.
    Derived,
}

/// The key of a class field.
#[derive(Clone, Debug)]
pub enum FieldKey {
    /// An ordinary property key.
    Property(PropertyKey),

    /// A private name.
    Private(PrivateName),
}

/// A class instance field record, stored on the constructor and run by
/// `InitializeInstance` during construction.
#[derive(Clone, Debug)]
pub struct ClassFieldRecord {
    /// The field key.
    pub key: FieldKey,

    /// The initializer expression, if any.
    pub init: Option<krait_ast::Expression>,
}

/// The internal data of a function defined by ECMAScript code.
#[derive(Debug)]
pub struct ScriptFunction {
    node: Rc<FunctionNode>,
    environment: Environment,
    realm: Realm,
    this_mode: ThisMode,
    home_object: RefCell<Option<JsObject>>,
    constructor_kind: ConstructorKind,
    is_class_constructor: bool,
    /// Set for the synthesized constructor of a class without an explicit
    /// one; a derived default forwards its arguments to `super`.
    is_default_constructor: bool,
    /// Methods have no `[[Construct]]`.
    is_method: bool,
    fields: RefCell<Vec<ClassFieldRecord>>,
    private_methods: RefCell<Vec<(PrivateName, PrivateElement)>>,
    private_scope: Option<Rc<PrivateEnvironment>>,
}

impl ScriptFunction {
    /// Creates the internal data for a function closing over `environment`.
    #[must_use]
    pub fn new(
        node: Rc<FunctionNode>,
        environment: Environment,
        realm: Realm,
        private_scope: Option<Rc<PrivateEnvironment>>,
    ) -> Self {
        let this_mode = if node.is_arrow() {
            ThisMode::Lexical
        } else if node.is_strict() || environment.is_strict() {
            ThisMode::Strict
        } else {
            ThisMode::Global
        };
        Self {
            node,
            environment,
            realm,
            this_mode,
            home_object: RefCell::new(None),
            constructor_kind: ConstructorKind::Base,
            is_class_constructor: false,
            is_default_constructor: false,
            is_method: false,
            fields: RefCell::new(Vec::new()),
            private_methods: RefCell::new(Vec::new()),
            private_scope,
        }
    }

    /// Marks this function as a class constructor of the given kind.
    pub fn set_class_constructor(&mut self, kind: ConstructorKind, is_default: bool) {
        self.is_class_constructor = true;
        self.constructor_kind = kind;
        self.is_default_constructor = is_default;
        // Class bodies are always strict code.
        self.this_mode = ThisMode::Strict;
    }

    /// Marks this function as a method definition, removing `[[Construct]]`.
    pub fn set_method(&mut self) {
        self.is_method = true;
    }

    /// Returns `true` for method definitions.
    #[must_use]
    pub const fn is_method(&self) -> bool {
        self.is_method
    }

    /// Gets the AST node of the function.
    #[must_use]
    pub fn node(&self) -> &Rc<FunctionNode> {
        &self.node
    }

    /// Gets the defining environment.
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Gets the realm the function was created in.
    #[must_use]
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// Gets the `this` mode.
    #[must_use]
    pub const fn this_mode(&self) -> ThisMode {
        self.this_mode
    }

    /// Gets the home object used for `super` references, if any.
    #[must_use]
    pub fn home_object(&self) -> Option<JsObject> {
        self.home_object.borrow().clone()
    }

    /// Sets the home object.
    pub fn set_home_object(&self, home: JsObject) {
        *self.home_object.borrow_mut() = Some(home);
    }

    /// Gets the constructor kind.
    #[must_use]
    pub const fn constructor_kind(&self) -> ConstructorKind {
        self.constructor_kind
    }

    /// Returns `true` for class constructors.
    #[must_use]
    pub const fn is_class_constructor(&self) -> bool {
        self.is_class_constructor
    }

    /// Returns `true` for synthesized default constructors.
    #[must_use]
    pub const fn is_default_constructor(&self) -> bool {
        self.is_default_constructor
    }

    /// Gets the instance field records.
    #[must_use]
    pub fn fields(&self) -> Vec<ClassFieldRecord> {
        self.fields.borrow().clone()
    }

    /// Replaces the instance field records.
    pub fn set_fields(&self, fields: Vec<ClassFieldRecord>) {
        *self.fields.borrow_mut() = fields;
    }

    /// Gets the private methods installed on every instance.
    #[must_use]
    pub fn private_methods(&self) -> Vec<(PrivateName, PrivateElement)> {
        self.private_methods.borrow().clone()
    }

    /// Replaces the private method records.
    pub fn set_private_methods(&self, methods: Vec<(PrivateName, PrivateElement)>) {
        *self.private_methods.borrow_mut() = methods;
    }

    /// Gets the private scope the function body resolves `#` names in.
    #[must_use]
    pub const fn private_scope(&self) -> Option<&Rc<PrivateEnvironment>> {
        self.private_scope.as_ref()
    }
}

/// The boxed signature of a host function.
type NativeFn = dyn Fn(&JsValue, &[JsValue], &mut Context) -> EvalResult<JsValue>;

/// A host (native) function. JS-level throws are reported through the
/// context signal; the `Err` side is reserved for host faults.
#[derive(Clone)]
pub struct NativeFunction {
    inner: Rc<NativeFn>,
}

impl NativeFunction {
    /// Creates a native function from a plain `fn` pointer.
    #[must_use]
    pub fn from_fn_ptr(
        function: fn(&JsValue, &[JsValue], &mut Context) -> EvalResult<JsValue>,
    ) -> Self {
        Self {
            inner: Rc::new(function),
        }
    }

    /// Creates a native function from a closure.
    #[must_use]
    pub fn from_closure<F>(closure: F) -> Self
    where
        F: Fn(&JsValue, &[JsValue], &mut Context) -> EvalResult<JsValue> + 'static,
    {
        Self {
            inner: Rc::new(closure),
        }
    }

    /// Calls the wrapped function.
    pub fn call(
        &self,
        this: &JsValue,
        args: &[JsValue],
        context: &mut Context,
    ) -> EvalResult<JsValue> {
        (self.inner)(this, args, context)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction").finish_non_exhaustive()
    }
}

/// The internal data of a host function object.
#[derive(Clone, Debug)]
pub struct NativeFunctionData {
    /// The wrapped host closure.
    pub function: NativeFunction,

    /// The diagnostic name of the function.
    pub name: JsString,

    /// Whether `new` may be applied to the function.
    pub constructor: bool,

    /// The message reported when construction is disallowed; `None` uses a
    /// generic one.
    pub construct_error: Option<String>,
}

/// The internal data of a bound function created by
/// `Function.prototype.bind`.
#[derive(Clone, Debug)]
pub struct BoundFunction {
    /// The wrapped callable.
    pub target: JsObject,

    /// The bound `this` value.
    pub this: JsValue,

    /// The partially applied arguments.
    pub args: Vec<JsValue>,
}
