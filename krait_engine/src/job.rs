//! The promise job queue.
//!
//! Settling a promise does not run its reactions inline; it enqueues jobs
//! on the realm. The embedder (or the test harness) drains them with
//! [`Context::run_jobs`][crate::context::Context::run_jobs], which preserves
//! FIFO order. Job ordering across host integrations is the embedder's
//! concern; the engine only guarantees the queue order of a single realm.

use crate::{context::Context, error::EvalResult};

/// A pending job: a closure run with the context when the queue drains.
pub struct NativeJob {
    f: Box<dyn FnOnce(&mut Context) -> EvalResult<()>>,
}

impl NativeJob {
    /// Creates a job from a closure.
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(&mut Context) -> EvalResult<()> + 'static,
    {
        Self { f: Box::new(f) }
    }

    /// Runs the job.
    pub fn call(self, context: &mut Context) -> EvalResult<()> {
        (self.f)(context)
    }
}

impl std::fmt::Debug for NativeJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeJob").finish_non_exhaustive()
    }
}
