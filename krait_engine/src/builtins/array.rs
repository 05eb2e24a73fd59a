//! `%Array.prototype%`: the iteration protocol plus the few methods the
//! coercion protocols and tests lean on.

use std::cell::Cell;
use std::rc::Rc;

use crate::{
    context::Context,
    error::{EvalResult, JsNativeError},
    function::NativeFunction,
    iterator::create_iter_result_object,
    object::JsObject,
    property::{Attribute, PropertyDescriptor, PropertyKey},
    string::JsString,
    symbol::WellKnownSymbols,
    value::JsValue,
};

use super::{def_method, new_native_function};

/// Builds `%Array.prototype%`.
pub(crate) fn init(
    object_prototype: &JsObject,
    function_prototype: &JsObject,
    well_known: &WellKnownSymbols,
) -> JsObject {
    let array_prototype = JsObject::new_ordinary(Some(object_prototype.clone()));

    let values = new_native_function(
        crate::function::NativeFunctionData {
            function: NativeFunction::from_fn_ptr(values),
            name: "values".into(),
            constructor: false,
            construct_error: None,
        },
        0,
        function_prototype.clone(),
    );
    // `values` and `@@iterator` are the same function object.
    array_prototype.insert_property(
        "values",
        PropertyDescriptor::data(
            values.clone().into(),
            Attribute::WRITABLE | Attribute::CONFIGURABLE,
        ),
    );
    array_prototype.insert_property(
        PropertyKey::Symbol(well_known.iterator()),
        PropertyDescriptor::data(values.into(), Attribute::WRITABLE | Attribute::CONFIGURABLE),
    );

    def_method(&array_prototype, "push", "push", 1, function_prototype, push);
    def_method(&array_prototype, "join", "join", 1, function_prototype, join);
    def_method(
        &array_prototype,
        "toString",
        "toString",
        0,
        function_prototype,
        to_string,
    );

    array_prototype
}

fn this_object(this: &JsValue, context: &mut Context) -> EvalResult<Option<JsObject>> {
    match this.as_object() {
        Some(object) => Ok(Some(object.clone())),
        None => {
            context.throw(JsNativeError::typ().with_message("this is not an object"))?;
            Ok(None)
        }
    }
}

fn length_of(object: &JsObject, context: &mut Context) -> EvalResult<u32> {
    let length = object.get("length", context)?.to_number(context)?;
    if context.should_stop() {
        return Ok(0);
    }
    Ok(if length.is_finite() && length > 0.0 {
        length as u32
    } else {
        0
    })
}

/// `Array.prototype.values ( )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-array.prototype.values
fn values(this: &JsValue, _: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let Some(target) = this_object(this, context)? else {
        return Ok(JsValue::Undefined);
    };

    let iterator =
        JsObject::new_ordinary(Some(context.realm().intrinsics().iterator_prototype()));
    let position = Rc::new(Cell::new(0_u32));
    let next = NativeFunction::from_closure(move |_, _, context| {
        let index = position.get();
        let length = length_of(&target, context)?;
        if context.should_stop() || index >= length {
            return Ok(create_iter_result_object(JsValue::Undefined, true, context));
        }
        position.set(index + 1);
        let element = target.get(index, context)?;
        if context.should_stop() {
            return Ok(create_iter_result_object(JsValue::Undefined, true, context));
        }
        Ok(create_iter_result_object(element, false, context))
    });
    super::def_closure_method(
        &iterator,
        "next",
        "next",
        0,
        &context.realm().intrinsics().function_prototype(),
        next,
    );
    Ok(iterator.into())
}

/// `Array.prototype.push ( ...items )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-array.prototype.push
fn push(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let Some(target) = this_object(this, context)? else {
        return Ok(JsValue::Undefined);
    };
    let mut length = length_of(&target, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    for item in args {
        target.set(length, item.clone(), context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        length += 1;
    }
    target.set("length", JsValue::from(length), context)?;
    Ok(JsValue::from(length))
}

/// `Array.prototype.join ( separator )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-array.prototype.join
fn join(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let Some(target) = this_object(this, context)? else {
        return Ok(JsValue::Undefined);
    };
    let separator = match args.first() {
        None | Some(JsValue::Undefined) => JsString::from(","),
        Some(value) => {
            let separator = value.to_string(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            separator
        }
    };

    let length = length_of(&target, context)?;
    let mut pieces = Vec::with_capacity(length as usize);
    for index in 0..length {
        let element = target.get(index, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        if element.is_null_or_undefined() {
            pieces.push(String::new());
        } else {
            let piece = element.to_string(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            pieces.push(piece.as_str().to_owned());
        }
    }
    Ok(JsValue::from(JsString::from(
        pieces.join(separator.as_str()),
    )))
}

/// `Array.prototype.toString ( )`
fn to_string(this: &JsValue, _: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    join(this, &[], context)
}
