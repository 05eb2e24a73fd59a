//! The `Symbol` namespace object.
//!
//! The namespace carries the well-known symbol identities as properties and
//! acts as the symbol factory when called. Member accesses of the form
//! `Symbol.iterator` on this object are short-circuited by the evaluator's
//! hot path before reaching ordinary property lookup.

use crate::{
    function::{NativeFunction, NativeFunctionData},
    object::JsObject,
    property::Attribute,
    symbol::{JsSymbol, WellKnownSymbols},
    value::JsValue,
};

use super::{def_property, new_native_function};

/// Builds the `Symbol` namespace.
pub(crate) fn init(function_prototype: &JsObject, well_known: &WellKnownSymbols) -> JsObject {
    let namespace = new_native_function(
        NativeFunctionData {
            function: NativeFunction::from_fn_ptr(symbol_factory),
            name: "Symbol".into(),
            constructor: false,
            construct_error: Some("Symbol is not a constructor".into()),
        },
        0,
        function_prototype.clone(),
    );

    def_property(
        &namespace,
        "iterator",
        well_known.iterator(),
        Attribute::empty(),
    );
    def_property(
        &namespace,
        "asyncIterator",
        well_known.async_iterator(),
        Attribute::empty(),
    );
    def_property(
        &namespace,
        "toStringTag",
        well_known.to_string_tag(),
        Attribute::empty(),
    );
    def_property(
        &namespace,
        "hasInstance",
        well_known.has_instance(),
        Attribute::empty(),
    );

    namespace
}

/// `Symbol ( [ description ] )`
fn symbol_factory(
    _: &JsValue,
    args: &[JsValue],
    context: &mut crate::context::Context,
) -> crate::error::EvalResult<JsValue> {
    let description = match args.first() {
        None | Some(JsValue::Undefined) => None,
        Some(value) => {
            let description = value.to_string(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            Some(description)
        }
    };
    Ok(JsValue::Symbol(JsSymbol::new(description)))
}
