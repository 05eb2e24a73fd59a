//! The await scheduler contract.
//!
//! `await` funnels through a single operation: [`Scheduler::try_await`].
//! Values that are not promise-like resolve immediately; engine promises
//! that have already settled resolve or throw synchronously; everything
//! else surfaces as *pending* so an async caller can suspend and re-enter
//! on settlement. Synchronous callers receiving `Pending` raise a host
//! fault: there is no blocking bridge.

use crate::{
    builtins::promise::{self, PromiseState},
    context::Context,
    error::EvalResult,
    object::JsObject,
    value::JsValue,
};

/// The outcome of [`Scheduler::try_await`].
#[derive(Debug)]
pub enum AwaitOutcome {
    /// The awaited value is available now.
    Resolved(JsValue),

    /// The awaited promise was already rejected; a `Throw` signal has been
    /// set on the context.
    Settled,

    /// The awaited promise is pending. The caller may suspend and attach
    /// settlement callbacks to the carried promise.
    Pending(JsObject),
}

/// The abstract boundary between `await` and the host's event loop.
pub trait Scheduler {
    /// Resolves an awaited value as far as it can without suspending.
    fn try_await(&self, value: &JsValue, context: &mut Context) -> EvalResult<AwaitOutcome>;
}

/// The built-in scheduler over the engine promise and the realm job queue.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultScheduler;

impl Scheduler for DefaultScheduler {
    fn try_await(&self, value: &JsValue, context: &mut Context) -> EvalResult<AwaitOutcome> {
        let Some(object) = value.as_object() else {
            return Ok(AwaitOutcome::Resolved(value.clone()));
        };

        if object.is_promise() {
            return Ok(match promise::promise_state(object) {
                Some(PromiseState::Fulfilled(value)) => AwaitOutcome::Resolved(value),
                Some(PromiseState::Rejected(reason)) => {
                    context.throw_value(reason);
                    AwaitOutcome::Settled
                }
                _ => AwaitOutcome::Pending(object.clone()),
            });
        }

        // A generic thenable: adopt it into an engine promise. Its `then`
        // runs as a job, so the adoption is always pending here.
        let then = object.get("then", context)?;
        if context.should_stop() {
            return Ok(AwaitOutcome::Settled);
        }
        if then.as_callable().is_some() {
            let adopted = promise::new_pending(context);
            promise::resolve_promise(&adopted, value.clone(), context)?;
            return Ok(AwaitOutcome::Pending(adopted));
        }

        Ok(AwaitOutcome::Resolved(value.clone()))
    }
}
