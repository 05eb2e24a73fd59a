//! The engine `Promise`.
//!
//! A deliberately small promise: states, reaction records, `then`/`catch`,
//! `Promise.resolve`/`Promise.reject`, and resolution with thenable
//! chaining. Settling never runs reactions inline; jobs go through the
//! realm queue and run when the embedder drains it.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-promise-objects

use std::cell::Cell;
use std::rc::Rc;

use crate::{
    context::{Context, Signal},
    error::{EvalResult, JsNativeError},
    eval::call::call_function,
    function::{NativeFunction, NativeFunctionData},
    job::NativeJob,
    object::{JsObject, ObjectKind},
    property::Attribute,
    realm::StandardConstructor,
    symbol::WellKnownSymbols,
    value::JsValue,
};

use super::{def_method, def_property, new_native_function};

/// The state of a promise.
#[derive(Clone, Debug, Default)]
pub enum PromiseState {
    /// The promise hasn't been resolved.
    #[default]
    Pending,

    /// The promise was fulfilled with a success value.
    Fulfilled(JsValue),

    /// The promise was rejected with a failure reason.
    Rejected(JsValue),
}

impl PromiseState {
    /// Gets the inner value of a fulfilled promise state.
    #[must_use]
    pub const fn as_fulfilled(&self) -> Option<&JsValue> {
        match self {
            Self::Fulfilled(value) => Some(value),
            _ => None,
        }
    }
}

/// One queued reaction: handlers plus the downstream capability.
#[derive(Debug)]
struct Reaction {
    fulfill: Option<JsObject>,
    reject: Option<JsObject>,
    capability: Option<PromiseCapability>,
}

/// The internal data of a promise object.
#[derive(Debug, Default)]
pub struct PromiseData {
    state: PromiseState,
    reactions: Vec<Reaction>,
}

impl PromiseData {
    /// Gets the state.
    #[must_use]
    pub fn state(&self) -> &PromiseState {
        &self.state
    }
}

/// `PromiseCapability Records`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-promisecapability-records
#[derive(Clone, Debug)]
pub struct PromiseCapability {
    promise: JsObject,
}

impl PromiseCapability {
    /// Creates a capability over a fresh pending promise.
    #[must_use]
    pub fn new(context: &Context) -> Self {
        Self {
            promise: new_pending(context),
        }
    }

    /// Gets the promise.
    #[must_use]
    pub fn promise(&self) -> &JsObject {
        &self.promise
    }

    /// Resolves the promise of the capability.
    pub fn resolve(&self, value: JsValue, context: &mut Context) -> EvalResult<()> {
        resolve_promise(&self.promise, value, context)
    }

    /// Rejects the promise of the capability.
    pub fn reject(&self, reason: JsValue, context: &mut Context) -> EvalResult<()> {
        reject_promise(&self.promise, reason, context)
    }
}

/// Creates a fresh pending promise object.
#[must_use]
pub fn new_pending(context: &Context) -> JsObject {
    JsObject::from_proto_and_kind(
        Some(context.realm().intrinsics().promise().prototype()),
        ObjectKind::Promise(PromiseData::default()),
    )
}

/// Reads the state of a promise object.
#[must_use]
pub fn promise_state(promise: &JsObject) -> Option<PromiseState> {
    match promise.borrow().kind() {
        ObjectKind::Promise(data) => Some(data.state.clone()),
        _ => None,
    }
}

/// `FulfillPromise ( promise, value )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-fulfillpromise
pub(crate) fn fulfill_promise(
    promise: &JsObject,
    value: JsValue,
    context: &mut Context,
) -> EvalResult<()> {
    let reactions = {
        let mut object = promise.borrow_mut();
        let Some(data) = object.as_promise_mut() else {
            return Ok(());
        };
        if !matches!(data.state, PromiseState::Pending) {
            return Ok(());
        }
        data.state = PromiseState::Fulfilled(value.clone());
        std::mem::take(&mut data.reactions)
    };
    for reaction in reactions {
        enqueue_reaction(reaction.fulfill, false, value.clone(), reaction.capability, context);
    }
    Ok(())
}

/// `RejectPromise ( promise, reason )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-rejectpromise
pub(crate) fn reject_promise(
    promise: &JsObject,
    reason: JsValue,
    context: &mut Context,
) -> EvalResult<()> {
    let reactions = {
        let mut object = promise.borrow_mut();
        let Some(data) = object.as_promise_mut() else {
            return Ok(());
        };
        if !matches!(data.state, PromiseState::Pending) {
            return Ok(());
        }
        data.state = PromiseState::Rejected(reason.clone());
        std::mem::take(&mut data.reactions)
    };
    for reaction in reactions {
        enqueue_reaction(reaction.reject, true, reason.clone(), reaction.capability, context);
    }
    Ok(())
}

/// The resolution algorithm: chains promises and thenables, fulfills plain
/// values.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-promise-resolve-functions
pub(crate) fn resolve_promise(
    promise: &JsObject,
    value: JsValue,
    context: &mut Context,
) -> EvalResult<()> {
    if let Some(inner) = value.as_object() {
        // 6. If SameValue(resolution, promise), reject with a TypeError.
        if JsObject::equals(inner, promise) {
            let reason = error_value(
                JsNativeError::typ().with_message("Chaining cycle detected for promise"),
                context,
            );
            return reject_promise(promise, reason, context);
        }

        // Engine promises chain directly.
        if inner.is_promise() {
            let capability = PromiseCapability {
                promise: promise.clone(),
            };
            perform_then(inner, None, None, Some(capability), context);
            return Ok(());
        }

        // Generic thenables resolve through their `then` in a job.
        let then = inner.get("then", context)?;
        if context.should_stop() {
            let Signal::Throw(reason) = context.take_signal() else {
                return Ok(());
            };
            return reject_promise(promise, reason, context);
        }
        if let Some(then) = then.as_callable().cloned() {
            let value = value.clone();
            let target = promise.clone();
            context.realm().enqueue_job(NativeJob::new(move |context| {
                let (resolve, reject) = create_resolving_functions(&target, context);
                call_function(
                    &then,
                    &value,
                    &[resolve.into(), reject.into()],
                    context,
                )?;
                if context.should_stop() {
                    if let Signal::Throw(reason) = context.take_signal() {
                        reject_promise(&target, reason, context)?;
                    }
                }
                Ok(())
            }));
            return Ok(());
        }
    }

    fulfill_promise(promise, value, context)
}

/// `PerformPromiseThen ( promise, onFulfilled, onRejected [ , resultCapability ] )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-performpromisethen
pub(crate) fn perform_then(
    promise: &JsObject,
    on_fulfilled: Option<JsObject>,
    on_rejected: Option<JsObject>,
    capability: Option<PromiseCapability>,
    context: &mut Context,
) {
    let settled = {
        let mut object = promise.borrow_mut();
        let Some(data) = object.as_promise_mut() else {
            return;
        };
        match data.state.clone() {
            PromiseState::Pending => {
                data.reactions.push(Reaction {
                    fulfill: on_fulfilled,
                    reject: on_rejected,
                    capability,
                });
                return;
            }
            settled => settled,
        }
    };
    match settled {
        PromiseState::Fulfilled(value) => {
            enqueue_reaction(on_fulfilled, false, value, capability, context);
        }
        PromiseState::Rejected(reason) => {
            enqueue_reaction(on_rejected, true, reason, capability, context);
        }
        PromiseState::Pending => {}
    }
}

/// Attaches Rust continuations to a promise, for the async function and
/// async generator drivers.
pub(crate) fn on_settle<F, G>(
    promise: &JsObject,
    on_fulfilled: F,
    on_rejected: G,
    context: &mut Context,
) where
    F: FnOnce(JsValue, &mut Context) -> EvalResult<()> + 'static,
    G: FnOnce(JsValue, &mut Context) -> EvalResult<()> + 'static,
{
    let fulfill = native_once(on_fulfilled, context);
    let reject = native_once(on_rejected, context);
    perform_then(promise, Some(fulfill), Some(reject), None, context);
}

fn native_once<F>(f: F, context: &Context) -> JsObject
where
    F: FnOnce(JsValue, &mut Context) -> EvalResult<()> + 'static,
{
    let slot = Rc::new(std::cell::RefCell::new(Some(f)));
    new_native_function(
        NativeFunctionData {
            function: NativeFunction::from_closure(move |_, args, context| {
                if let Some(f) = slot.borrow_mut().take() {
                    f(args.first().cloned().unwrap_or_default(), context)?;
                }
                Ok(JsValue::Undefined)
            }),
            name: "".into(),
            constructor: false,
            construct_error: None,
        },
        1,
        context.realm().intrinsics().function_prototype(),
    )
}

/// Enqueues a `PromiseReactionJob`.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-newpromisereactionjob
fn enqueue_reaction(
    handler: Option<JsObject>,
    is_rejection: bool,
    value: JsValue,
    capability: Option<PromiseCapability>,
    context: &mut Context,
) {
    context.realm().enqueue_job(NativeJob::new(move |context| {
        match handler {
            Some(handler) => {
                let result = call_function(&handler, &JsValue::Undefined, &[value], context)?;
                if context.should_stop() {
                    if let Signal::Throw(reason) = context.take_signal() {
                        if let Some(capability) = capability {
                            capability.reject(reason, context)?;
                        }
                    }
                } else if let Some(capability) = capability {
                    capability.resolve(result, context)?;
                }
            }
            None => {
                // Without a handler the settlement passes through.
                if let Some(capability) = capability {
                    if is_rejection {
                        capability.reject(value, context)?;
                    } else {
                        capability.resolve(value, context)?;
                    }
                }
            }
        }
        Ok(())
    }));
}

/// `CreateResolvingFunctions ( promise )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-createresolvingfunctions
fn create_resolving_functions(promise: &JsObject, context: &Context) -> (JsObject, JsObject) {
    let already_resolved = Rc::new(Cell::new(false));
    let function_prototype = context.realm().intrinsics().function_prototype();

    let target = promise.clone();
    let flag = already_resolved.clone();
    let resolve = new_native_function(
        NativeFunctionData {
            function: NativeFunction::from_closure(move |_, args, context| {
                if !flag.replace(true) {
                    resolve_promise(&target, args.first().cloned().unwrap_or_default(), context)?;
                }
                Ok(JsValue::Undefined)
            }),
            name: "resolve".into(),
            constructor: false,
            construct_error: None,
        },
        1,
        function_prototype.clone(),
    );

    let target = promise.clone();
    let reject = new_native_function(
        NativeFunctionData {
            function: NativeFunction::from_closure(move |_, args, context| {
                if !already_resolved.replace(true) {
                    reject_promise(&target, args.first().cloned().unwrap_or_default(), context)?;
                }
                Ok(JsValue::Undefined)
            }),
            name: "reject".into(),
            constructor: false,
            construct_error: None,
        },
        1,
        function_prototype,
    );

    (resolve, reject)
}

fn error_value(error: JsNativeError, context: &mut Context) -> JsValue {
    super::error::create_error_object(context, &error)
}

/// Builds the `Promise` constructor record.
pub(crate) fn init(
    object_prototype: &JsObject,
    function_prototype: &JsObject,
    well_known: &WellKnownSymbols,
) -> StandardConstructor {
    let prototype = JsObject::new_ordinary(Some(object_prototype.clone()));
    def_method(&prototype, "then", "then", 2, function_prototype, then);
    def_method(&prototype, "catch", "catch", 1, function_prototype, catch);
    def_property(
        &prototype,
        well_known.to_string_tag(),
        "Promise",
        Attribute::CONFIGURABLE,
    );

    let constructor = new_native_function(
        NativeFunctionData {
            function: NativeFunction::from_fn_ptr(promise_constructor),
            name: "Promise".into(),
            constructor: true,
            construct_error: None,
        },
        1,
        function_prototype.clone(),
    );
    def_property(
        &constructor,
        "prototype",
        prototype.clone(),
        Attribute::empty(),
    );
    def_property(
        &prototype,
        "constructor",
        constructor.clone(),
        Attribute::WRITABLE | Attribute::CONFIGURABLE,
    );
    def_method(
        &constructor,
        "resolve",
        "resolve",
        1,
        function_prototype,
        promise_resolve,
    );
    def_method(
        &constructor,
        "reject",
        "reject",
        1,
        function_prototype,
        promise_reject,
    );

    StandardConstructor::new(constructor, prototype)
}

/// `Promise ( executor )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-promise-executor
fn promise_constructor(
    _: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> EvalResult<JsValue> {
    let Some(executor) = args.first().and_then(JsValue::as_callable).cloned() else {
        return context.throw(JsNativeError::typ().with_message("Promise resolver is not a function"));
    };

    let promise = new_pending(context);
    let (resolve, reject) = create_resolving_functions(&promise, context);

    call_function(
        &executor,
        &JsValue::Undefined,
        &[resolve.into(), reject.into()],
        context,
    )?;
    if context.should_stop() {
        if let Signal::Throw(reason) = context.take_signal() {
            reject_promise(&promise, reason, context)?;
        }
    }

    Ok(promise.into())
}

/// `Promise.resolve ( x )`
fn promise_resolve(_: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let value = args.first().cloned().unwrap_or_default();
    if let Some(object) = value.as_object() {
        if object.is_promise() {
            return Ok(value);
        }
    }
    let promise = new_pending(context);
    resolve_promise(&promise, value, context)?;
    Ok(promise.into())
}

/// `Promise.reject ( r )`
fn promise_reject(_: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let reason = args.first().cloned().unwrap_or_default();
    let promise = new_pending(context);
    reject_promise(&promise, reason, context)?;
    Ok(promise.into())
}

/// `Promise.prototype.then ( onFulfilled, onRejected )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-promise.prototype.then
fn then(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let Some(promise) = this.as_object().filter(|o| o.is_promise()).cloned() else {
        return context.throw(JsNativeError::typ().with_message("then called on a non-promise"));
    };
    let on_fulfilled = args.first().and_then(JsValue::as_callable).cloned();
    let on_rejected = args.get(1).and_then(JsValue::as_callable).cloned();
    let capability = PromiseCapability::new(context);
    let result = capability.promise().clone();
    perform_then(&promise, on_fulfilled, on_rejected, Some(capability), context);
    Ok(result.into())
}

/// `Promise.prototype.catch ( onRejected )`
fn catch(this: &JsValue, args: &[JsValue], context: &mut Context) -> EvalResult<JsValue> {
    let on_rejected = args.first().cloned().unwrap_or_default();
    then(this, &[JsValue::Undefined, on_rejected], context)
}
