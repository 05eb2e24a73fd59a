//! `%Object.prototype%`.

use crate::{
    context::Context,
    error::{EvalResult, JsNativeError},
    object::JsObject,
    string::JsString,
    value::JsValue,
};

use super::def_method;

/// Installs the `Object.prototype` methods the coercion protocols reach
/// for.
pub(crate) fn init(object_prototype: &JsObject, function_prototype: &JsObject) {
    def_method(
        object_prototype,
        "toString",
        "toString",
        0,
        function_prototype,
        to_string,
    );
    def_method(
        object_prototype,
        "valueOf",
        "valueOf",
        0,
        function_prototype,
        value_of,
    );
    def_method(
        object_prototype,
        "hasOwnProperty",
        "hasOwnProperty",
        1,
        function_prototype,
        has_own_property,
    );
}

/// `Object.prototype.toString ( )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-object.prototype.tostring
fn to_string(this: &JsValue, _: &[JsValue], _: &mut Context) -> EvalResult<JsValue> {
    let tag = match this {
        JsValue::Undefined => "Undefined",
        JsValue::Null => "Null",
        JsValue::Object(object) => object.class_name(),
        _ => "Object",
    };
    Ok(JsValue::from(JsString::from(format!("[object {tag}]"))))
}

/// `Object.prototype.valueOf ( )`
fn value_of(this: &JsValue, _: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    if this.is_null_or_undefined() {
        return context.throw(
            JsNativeError::typ().with_message("Object.prototype.valueOf called on null or undefined"),
        );
    }
    Ok(this.clone())
}

/// `Object.prototype.hasOwnProperty ( V )`
fn has_own_property(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let key = args
        .first()
        .cloned()
        .unwrap_or_default()
        .to_property_key(context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let Some(object) = this.as_object() else {
        return Ok(JsValue::Boolean(false));
    };
    Ok(JsValue::Boolean(object.has_own_property(&key)))
}
