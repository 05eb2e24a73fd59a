//! The standard error constructors.
//!
//! Error objects are thrown when runtime errors occur. Each of the five
//! kinds the evaluator raises (`Error`, `TypeError`, `RangeError`,
//! `ReferenceError`, `SyntaxError`) gets a constructor/prototype pair; the
//! subtype constructors inherit from `Error` the way the specification
//! links them.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-error-objects

use crate::{
    context::Context,
    error::{ErrorKind, EvalResult, JsNativeError},
    function::{NativeFunction, NativeFunctionData},
    object::{JsObject, ObjectKind},
    property::{Attribute, PropertyDescriptor},
    realm::StandardConstructor,
    string::JsString,
    value::JsValue,
};

use super::{def_method, def_property, new_native_function};

/// Builds the five error constructor records.
pub(crate) fn init(
    object_prototype: &JsObject,
    function_prototype: &JsObject,
) -> (
    StandardConstructor,
    StandardConstructor,
    StandardConstructor,
    StandardConstructor,
    StandardConstructor,
) {
    let error = build_error(
        ErrorKind::Error,
        object_prototype.clone(),
        function_prototype.clone(),
        function_prototype,
    );
    let type_error = build_error(
        ErrorKind::Type,
        error.prototype(),
        error.constructor(),
        function_prototype,
    );
    let range_error = build_error(
        ErrorKind::Range,
        error.prototype(),
        error.constructor(),
        function_prototype,
    );
    let reference_error = build_error(
        ErrorKind::Reference,
        error.prototype(),
        error.constructor(),
        function_prototype,
    );
    let syntax_error = build_error(
        ErrorKind::Syntax,
        error.prototype(),
        error.constructor(),
        function_prototype,
    );
    (error, type_error, range_error, reference_error, syntax_error)
}

/// Builds one constructor/prototype pair.
///
/// `proto_parent` is the prototype's `[[Prototype]]` and `ctor_parent` the
/// constructor's: subtype constructors inherit from the `Error`
/// constructor itself.
fn build_error(
    kind: ErrorKind,
    proto_parent: JsObject,
    ctor_parent: JsObject,
    function_prototype: &JsObject,
) -> StandardConstructor {
    let prototype = JsObject::new_ordinary(Some(proto_parent));
    let attribute = Attribute::WRITABLE | Attribute::CONFIGURABLE;
    def_property(&prototype, "name", JsString::from(kind.name()), attribute);
    def_property(&prototype, "message", JsString::from(""), attribute);
    if matches!(kind, ErrorKind::Error) {
        def_method(
            &prototype,
            "toString",
            "toString",
            0,
            function_prototype,
            to_string,
        );
    }

    let constructor = new_native_function(
        NativeFunctionData {
            function: NativeFunction::from_closure(move |_, args, context| {
                constructor_body(kind, args, context)
            }),
            name: kind.name().into(),
            constructor: true,
            construct_error: None,
        },
        1,
        ctor_parent,
    );
    def_property(&constructor, "prototype", prototype.clone(), Attribute::empty());
    def_property(&prototype, "constructor", constructor.clone(), attribute);

    StandardConstructor::new(constructor, prototype)
}

/// `Error ( message )`: builds a fresh error object whether invoked as a
/// call or a construction.
fn constructor_body(
    kind: ErrorKind,
    args: &[JsValue],
    context: &mut Context,
) -> EvalResult<JsValue> {
    let intrinsics = context.realm().intrinsics();
    let prototype = match kind {
        ErrorKind::Error => intrinsics.error().prototype(),
        ErrorKind::Type => intrinsics.type_error().prototype(),
        ErrorKind::Range => intrinsics.range_error().prototype(),
        ErrorKind::Reference => intrinsics.reference_error().prototype(),
        ErrorKind::Syntax => intrinsics.syntax_error().prototype(),
    };

    // 2. Let O be OrdinaryCreateFromConstructor(newTarget, « [[ErrorData]] »).
    let object = JsObject::from_proto_and_kind(Some(prototype), ObjectKind::Error(kind));

    // 3. If message is not undefined, define O.message.
    let message = args.first().cloned().unwrap_or_default();
    if !message.is_undefined() {
        let message = message.to_string(context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        object.insert_property(
            "message",
            PropertyDescriptor::data(
                message.into(),
                Attribute::WRITABLE | Attribute::CONFIGURABLE,
            ),
        );
    }

    // 4. Return O.
    Ok(object.into())
}

/// `Error.prototype.toString ( )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-error.prototype.tostring
fn to_string(this: &JsValue, _: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    // 1.-2. Non-object receivers throw a TypeError.
    let Some(object) = this.as_object().cloned() else {
        return context.throw(JsNativeError::typ().with_message("'this' is not an Object"));
    };

    // 3.-4. Let name be ? Get(O, "name"), defaulting to "Error".
    let name = object.get("name", context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let name = if name.is_undefined() {
        JsString::from("Error")
    } else {
        let name = name.to_string(context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        name
    };

    // 5.-6. Let msg be ? Get(O, "message"), defaulting to "".
    let msg = object.get("message", context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let msg = if msg.is_undefined() {
        JsString::empty()
    } else {
        let msg = msg.to_string(context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        msg
    };

    // 7.-9. Concatenate.
    if name.is_empty() {
        return Ok(msg.into());
    }
    if msg.is_empty() {
        return Ok(name.into());
    }
    Ok(JsString::from(format!("{name}: {msg}")).into())
}

/// Builds the throwable object for a native error from the realm's
/// standard constructors.
pub(crate) fn create_error_object(context: &mut Context, error: &JsNativeError) -> JsValue {
    let intrinsics = context.realm().intrinsics();
    let prototype = match error.kind {
        ErrorKind::Error => intrinsics.error().prototype(),
        ErrorKind::Type => intrinsics.type_error().prototype(),
        ErrorKind::Range => intrinsics.range_error().prototype(),
        ErrorKind::Reference => intrinsics.reference_error().prototype(),
        ErrorKind::Syntax => intrinsics.syntax_error().prototype(),
    };
    let object = JsObject::from_proto_and_kind(Some(prototype), ObjectKind::Error(error.kind));
    object.insert_property(
        "message",
        PropertyDescriptor::data(
            JsString::from(error.message.as_str()).into(),
            Attribute::WRITABLE | Attribute::CONFIGURABLE,
        ),
    );
    object.into()
}
