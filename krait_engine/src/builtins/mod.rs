//! The minimal intrinsic objects of a realm.
//!
//! The standard library proper is a host concern; the engine only carries
//! what the language semantics themselves reach for: the prototype chain
//! roots, `Function.prototype` utilities (`call`/`apply`/`bind`), the
//! iterator and generator prototypes, the error constructors, a small
//! `Promise` with a job queue, and the `Symbol` namespace.

pub(crate) mod array;
pub(crate) mod error;
pub(crate) mod function;
pub(crate) mod generator;
pub(crate) mod iterable;
pub(crate) mod object;
pub mod promise;
pub(crate) mod symbol;

use rustc_hash::FxHashSet;

use crate::{
    context::Context,
    error::EvalResult,
    function::{NativeFunction, NativeFunctionData},
    object::{JsObject, ObjectKind},
    property::{Attribute, PropertyDescriptor, PropertyKey},
    realm::Intrinsics,
    string::JsString,
    symbol::WellKnownSymbols,
    value::JsValue,
};

/// Creates a host function object.
#[must_use]
pub fn new_native_function(
    data: NativeFunctionData,
    length: u32,
    function_prototype: JsObject,
) -> JsObject {
    let name = data.name.clone();
    let object =
        JsObject::from_proto_and_kind(Some(function_prototype), ObjectKind::NativeFunction(data));
    object.insert_property(
        "name",
        PropertyDescriptor::data(JsValue::from(name), Attribute::CONFIGURABLE),
    );
    object.insert_property(
        "length",
        PropertyDescriptor::data(JsValue::from(length), Attribute::CONFIGURABLE),
    );
    object
}

/// Defines a non-enumerable method on an object.
pub(crate) fn def_method<K: Into<PropertyKey>>(
    target: &JsObject,
    key: K,
    name: &str,
    length: u32,
    function_prototype: &JsObject,
    f: fn(&JsValue, &[JsValue], &mut Context) -> EvalResult<JsValue>,
) {
    let function = new_native_function(
        NativeFunctionData {
            function: NativeFunction::from_fn_ptr(f),
            name: name.into(),
            constructor: false,
            construct_error: None,
        },
        length,
        function_prototype.clone(),
    );
    target.insert_property(
        key,
        PropertyDescriptor::data(
            function.into(),
            Attribute::WRITABLE | Attribute::CONFIGURABLE,
        ),
    );
}

/// Defines a non-enumerable closure-backed method on an object.
pub(crate) fn def_closure_method<K: Into<PropertyKey>>(
    target: &JsObject,
    key: K,
    name: &str,
    length: u32,
    function_prototype: &JsObject,
    function: NativeFunction,
) {
    let function = new_native_function(
        NativeFunctionData {
            function,
            name: name.into(),
            constructor: false,
            construct_error: None,
        },
        length,
        function_prototype.clone(),
    );
    target.insert_property(
        key,
        PropertyDescriptor::data(
            function.into(),
            Attribute::WRITABLE | Attribute::CONFIGURABLE,
        ),
    );
}

/// Defines a non-enumerable data property.
pub(crate) fn def_property<K: Into<PropertyKey>, V: Into<JsValue>>(
    target: &JsObject,
    key: K,
    value: V,
    attributes: Attribute,
) {
    target.insert_property(key, PropertyDescriptor::data(value.into(), attributes));
}

/// Builds the intrinsics, the global object and the restricted-global set
/// of a fresh realm.
pub(crate) fn create_intrinsics(
    well_known: &WellKnownSymbols,
) -> (Intrinsics, JsObject, FxHashSet<JsString>) {
    // Prototype chain roots.
    let object_prototype = JsObject::with_null_proto();
    // `%Function.prototype%` is itself a callable that accepts any
    // arguments and returns undefined.
    let function_prototype = new_native_function(
        NativeFunctionData {
            function: NativeFunction::from_fn_ptr(|_, _, _| Ok(JsValue::Undefined)),
            name: "".into(),
            constructor: false,
            construct_error: None,
        },
        0,
        object_prototype.clone(),
    );

    object::init(&object_prototype, &function_prototype);
    function::init(&function_prototype);

    let (iterator_prototype, async_iterator_prototype) =
        iterable::init(&object_prototype, &function_prototype, well_known);

    let array_prototype = array::init(&object_prototype, &function_prototype, well_known);

    let (generator_prototype, async_generator_prototype) = generator::init(
        &iterator_prototype,
        &async_iterator_prototype,
        &function_prototype,
        well_known,
    );

    let (error, type_error, range_error, reference_error, syntax_error) =
        error::init(&object_prototype, &function_prototype);

    let promise = promise::init(&object_prototype, &function_prototype, well_known);

    let symbol_namespace = symbol::init(&function_prototype, well_known);

    let intrinsics = Intrinsics {
        object_prototype: object_prototype.clone(),
        function_prototype,
        array_prototype,
        iterator_prototype,
        async_iterator_prototype,
        generator_prototype,
        async_generator_prototype,
        error: error.clone(),
        type_error: type_error.clone(),
        range_error: range_error.clone(),
        reference_error: reference_error.clone(),
        syntax_error: syntax_error.clone(),
        promise: promise.clone(),
        symbol_namespace: symbol_namespace.clone(),
    };

    // The global object.
    let global = JsObject::new_ordinary(Some(object_prototype));
    def_property(
        &global,
        "globalThis",
        global.clone(),
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    );
    def_property(&global, "undefined", JsValue::Undefined, Attribute::empty());
    def_property(&global, "NaN", f64::NAN, Attribute::empty());
    def_property(&global, "Infinity", f64::INFINITY, Attribute::empty());
    def_property(
        &global,
        "Error",
        error.constructor(),
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    );
    def_property(
        &global,
        "TypeError",
        type_error.constructor(),
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    );
    def_property(
        &global,
        "RangeError",
        range_error.constructor(),
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    );
    def_property(
        &global,
        "ReferenceError",
        reference_error.constructor(),
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    );
    def_property(
        &global,
        "SyntaxError",
        syntax_error.constructor(),
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    );
    def_property(
        &global,
        "Promise",
        promise.constructor(),
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    );
    def_property(
        &global,
        "Symbol",
        symbol_namespace,
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    );

    // Non-configurable globals that lexical declarations may not shadow.
    let restricted_globals: FxHashSet<JsString> = ["undefined", "NaN", "Infinity"]
        .into_iter()
        .map(JsString::from)
        .collect();

    (intrinsics, global, restricted_globals)
}
