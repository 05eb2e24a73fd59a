//! `%Function.prototype%`: `call`, `apply` and `bind`.

use crate::{
    context::Context,
    error::{EvalResult, JsNativeError},
    eval::call::call_function,
    function::BoundFunction,
    object::{JsObject, ObjectKind},
    value::JsValue,
};

use super::def_method;

/// Installs the `Function.prototype` methods.
pub(crate) fn init(function_prototype: &JsObject) {
    def_method(
        function_prototype,
        "call",
        "call",
        1,
        function_prototype,
        call,
    );
    def_method(
        function_prototype,
        "apply",
        "apply",
        2,
        function_prototype,
        apply,
    );
    def_method(
        function_prototype,
        "bind",
        "bind",
        1,
        function_prototype,
        bind,
    );
}

fn this_function(this: &JsValue, context: &mut Context) -> EvalResult<Option<JsObject>> {
    match this.as_callable() {
        Some(function) => Ok(Some(function.clone())),
        None => {
            context.throw(JsNativeError::typ().with_message("this is not a function"))?;
            Ok(None)
        }
    }
}

/// `Function.prototype.call ( thisArg, ...args )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-function.prototype.call
fn call(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let Some(function) = this_function(this, context)? else {
        return Ok(JsValue::Undefined);
    };
    let this_arg = args.first().cloned().unwrap_or_default();
    let rest = args.get(1..).unwrap_or(&[]);
    call_function(&function, &this_arg, rest, context)
}

/// `Function.prototype.apply ( thisArg, argArray )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-function.prototype.apply
fn apply(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let Some(function) = this_function(this, context)? else {
        return Ok(JsValue::Undefined);
    };
    let this_arg = args.first().cloned().unwrap_or_default();
    let arg_array = args.get(1).cloned().unwrap_or_default();

    let call_args = match &arg_array {
        JsValue::Undefined | JsValue::Null => Vec::new(),
        JsValue::Object(object) => {
            // CreateListFromArrayLike over the index range.
            let length = object.get("length", context)?.to_number(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            let length = if length.is_finite() && length > 0.0 {
                length as u32
            } else {
                0
            };
            let mut list = Vec::with_capacity(length as usize);
            for index in 0..length {
                let element = object.get(index, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                list.push(element);
            }
            list
        }
        _ => {
            return context.throw(
                JsNativeError::typ()
                    .with_message("second argument to Function.prototype.apply must be an array"),
            );
        }
    };

    call_function(&function, &this_arg, &call_args, context)
}

/// `Function.prototype.bind ( thisArg, ...args )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-function.prototype.bind
fn bind(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let Some(function) = this_function(this, context)? else {
        return Ok(JsValue::Undefined);
    };
    let this_arg = args.first().cloned().unwrap_or_default();
    let bound_args = args.get(1..).unwrap_or(&[]).to_vec();

    let bound = JsObject::from_proto_and_kind(
        function.prototype(),
        ObjectKind::BoundFunction(BoundFunction {
            target: function,
            this: this_arg,
            args: bound_args,
        }),
    );
    Ok(bound.into())
}
