//! `%GeneratorPrototype%` and `%AsyncGeneratorPrototype%`.
//!
//! A Generator is an instance of a generator function and conforms to both
//! the Iterator and Iterable interfaces.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-generator-objects

use crate::{
    context::Context,
    error::EvalResult,
    generator::{async_generator_enqueue, generator_resume, ResumeKind, ResumePayload},
    object::JsObject,
    property::Attribute,
    symbol::WellKnownSymbols,
    value::JsValue,
};

use super::{def_method, def_property};

/// Builds the generator and async generator prototypes.
pub(crate) fn init(
    iterator_prototype: &JsObject,
    async_iterator_prototype: &JsObject,
    function_prototype: &JsObject,
    well_known: &WellKnownSymbols,
) -> (JsObject, JsObject) {
    let generator_prototype = JsObject::new_ordinary(Some(iterator_prototype.clone()));
    def_method(&generator_prototype, "next", "next", 1, function_prototype, next);
    def_method(
        &generator_prototype,
        "return",
        "return",
        1,
        function_prototype,
        r#return,
    );
    def_method(
        &generator_prototype,
        "throw",
        "throw",
        1,
        function_prototype,
        throw,
    );
    def_property(
        &generator_prototype,
        well_known.to_string_tag(),
        "Generator",
        Attribute::CONFIGURABLE,
    );

    let async_generator_prototype =
        JsObject::new_ordinary(Some(async_iterator_prototype.clone()));
    def_method(
        &async_generator_prototype,
        "next",
        "next",
        1,
        function_prototype,
        async_next,
    );
    def_method(
        &async_generator_prototype,
        "return",
        "return",
        1,
        function_prototype,
        async_return,
    );
    def_method(
        &async_generator_prototype,
        "throw",
        "throw",
        1,
        function_prototype,
        async_throw,
    );
    def_property(
        &async_generator_prototype,
        well_known.to_string_tag(),
        "AsyncGenerator",
        Attribute::CONFIGURABLE,
    );

    (generator_prototype, async_generator_prototype)
}

fn first(args: &[JsValue]) -> JsValue {
    args.first().cloned().unwrap_or_default()
}

/// `Generator.prototype.next ( value )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-generator.prototype.next
fn next(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    // 1. Return ? GeneratorResume(this value, value, empty).
    generator_resume(
        this,
        ResumePayload {
            kind: ResumeKind::Normal,
            value: first(args),
        },
        context,
    )
}

/// `Generator.prototype.return ( value )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-generator.prototype.return
fn r#return(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    // 1.-3. Return ? GeneratorResumeAbrupt(g, ReturnCompletion(value), empty).
    generator_resume(
        this,
        ResumePayload {
            kind: ResumeKind::Return,
            value: first(args),
        },
        context,
    )
}

/// `Generator.prototype.throw ( exception )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-generator.prototype.throw
fn throw(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    // 1.-3. Return ? GeneratorResumeAbrupt(g, ThrowCompletion(exception), empty).
    generator_resume(
        this,
        ResumePayload {
            kind: ResumeKind::Throw,
            value: first(args),
        },
        context,
    )
}

/// `AsyncGenerator.prototype.next ( value )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-asyncgenerator-prototype-next
fn async_next(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    async_generator_enqueue(
        this,
        ResumePayload {
            kind: ResumeKind::Normal,
            value: first(args),
        },
        context,
    )
}

/// `AsyncGenerator.prototype.return ( value )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-asyncgenerator-prototype-return
fn async_return(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    async_generator_enqueue(
        this,
        ResumePayload {
            kind: ResumeKind::Return,
            value: first(args),
        },
        context,
    )
}

/// `AsyncGenerator.prototype.throw ( exception )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-asyncgenerator-prototype-throw
fn async_throw(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    async_generator_enqueue(
        this,
        ResumePayload {
            kind: ResumeKind::Throw,
            value: first(args),
        },
        context,
    )
}
