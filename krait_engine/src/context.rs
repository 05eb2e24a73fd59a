//! The evaluation context: per-execution mutable state.
//!
//! A [`Context`] pairs a realm handle with everything the evaluator
//! mutates while running: the flow [`Signal`], the current source
//! reference, the call depth, the scope-frame stack, the private-name
//! scope stack, and the cancellation token. Contexts are cheap to create
//! and single-threaded; host re-entrancy goes through the same context and
//! increments the call depth.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use krait_ast::{Program, Span};

use crate::{
    error::{EvalError, EvalResult, Fault, JsNativeError},
    generator::GeneratorRun,
    private::PrivateEnvironment,
    realm::Realm,
    scheduler::{DefaultScheduler, Scheduler},
    string::JsString,
    value::JsValue,
};

/// The current flow signal of an execution.
#[derive(Clone, Debug, Default)]
pub enum Signal {
    /// Normal flow.
    #[default]
    Empty,

    /// A `return` in flight.
    Return(JsValue),

    /// A `break` in flight, optionally labelled.
    Break(Option<JsString>),

    /// A `continue` in flight, optionally labelled.
    Continue(Option<JsString>),

    /// A thrown value in flight.
    Throw(JsValue),
}

impl Signal {
    /// Returns `true` for any non-`Empty` signal.
    #[must_use]
    pub const fn is_abrupt(&self) -> bool {
        !matches!(self, Self::Empty)
    }
}

/// The kind of a scope frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScopeKind {
    /// The program (script/eval/module) frame.
    Program,

    /// A function activation frame.
    Function,

    /// A block frame.
    Block,
}

/// The strictness mode of a scope frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScopeMode {
    /// Strict code.
    Strict,

    /// Sloppy code without Annex-B extensions.
    Sloppy,

    /// Sloppy code with Annex-B block-function semantics.
    SloppyAnnexB,
}

/// One entry of the scope-frame stack.
#[derive(Clone, Debug)]
pub struct ScopeFrame {
    /// The frame kind.
    pub kind: ScopeKind,

    /// The strictness mode.
    pub mode: ScopeMode,

    /// Set when Annex-B analysis must be skipped inside this frame.
    pub skip_annex_b: bool,
}

/// Configurable execution limits.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeLimits {
    max_call_depth: usize,
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            max_call_depth: 512,
        }
    }
}

impl RuntimeLimits {
    /// Gets the maximum call depth.
    #[must_use]
    pub const fn max_call_depth(&self) -> usize {
        self.max_call_depth
    }

    /// Sets the maximum call depth.
    pub fn set_max_call_depth(&mut self, value: usize) {
        self.max_call_depth = value;
    }
}

/// A cancellation token: cloneable, settable from any thread, polled by
/// the evaluator at statement boundaries, generator instruction dispatch
/// and iterator steps. Cancellation raises an uncatchable fault.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a fresh, unsignalled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Builder for [`Context`].
#[derive(Default)]
pub struct ContextBuilder {
    limits: RuntimeLimits,
    cancellation: Option<CancellationToken>,
    annex_b: bool,
    realm: Option<Realm>,
    scheduler: Option<Rc<dyn Scheduler>>,
}

impl ContextBuilder {
    /// Creates a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime limits.
    #[must_use]
    pub fn limits(mut self, limits: RuntimeLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Enables sloppy-mode Annex-B semantics.
    #[must_use]
    pub fn annex_b(mut self, enabled: bool) -> Self {
        self.annex_b = enabled;
        self
    }

    /// Reuses an existing realm instead of creating one.
    #[must_use]
    pub fn realm(mut self, realm: Realm) -> Self {
        self.realm = Some(realm);
        self
    }

    /// Substitutes the await scheduler.
    #[must_use]
    pub fn scheduler(mut self, scheduler: Rc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> Context {
        let realm = self
            .realm
            .unwrap_or_else(|| Realm::create(self.annex_b));
        Context {
            realm,
            signal: Signal::Empty,
            source_ref: None,
            source: None,
            call_depth: 0,
            limits: self.limits,
            cancellation: self.cancellation.unwrap_or_default(),
            scope_frames: Vec::new(),
            private_scopes: Vec::new(),
            generator_run: None,
            scheduler: self
                .scheduler
                .unwrap_or_else(|| Rc::new(DefaultScheduler)),
        }
    }
}

/// The evaluation context.
pub struct Context {
    realm: Realm,
    signal: Signal,
    source_ref: Option<Span>,
    source: Option<Rc<str>>,
    call_depth: usize,
    limits: RuntimeLimits,
    cancellation: CancellationToken,
    scope_frames: Vec<ScopeFrame>,
    private_scopes: Vec<Rc<PrivateEnvironment>>,
    pub(crate) generator_run: Option<GeneratorRun>,
    scheduler: Rc<dyn Scheduler>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates a context over a fresh realm with Annex-B enabled, the
    /// default host configuration.
    #[must_use]
    pub fn new() -> Self {
        ContextBuilder::new().annex_b(true).build()
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    /// Gets the realm of the context.
    #[must_use]
    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    /// Evaluates a program in the context's realm and returns its
    /// completion value.
    pub fn eval(&mut self, program: &Program) -> Result<JsValue, EvalError> {
        crate::eval::evaluate_program(
            program,
            &self.realm.global_environment(),
            crate::eval::EvalOptions::default(),
            self,
        )
    }

    // === Flow signal ===

    /// Gets the current signal.
    #[must_use]
    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    /// Returns `true` whenever the signal is abrupt; every dispatcher
    /// checks this after each sub-evaluation.
    #[inline]
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.signal.is_abrupt()
    }

    /// Takes the current signal, resetting it to `Empty`.
    #[must_use]
    pub fn take_signal(&mut self) -> Signal {
        std::mem::take(&mut self.signal)
    }

    /// Replaces the current signal.
    pub fn set_signal(&mut self, signal: Signal) {
        self.signal = signal;
    }

    /// Sets a `Throw` signal carrying the given value.
    pub fn throw_value(&mut self, value: JsValue) {
        self.signal = Signal::Throw(value);
    }

    /// Builds the error object for a native error and sets a `Throw`
    /// signal carrying it. Returns `Ok(undefined)` so callers can
    /// `return context.throw(...)` from value-producing evaluators.
    pub fn throw(&mut self, error: JsNativeError) -> EvalResult<JsValue> {
        let value = crate::builtins::error::create_error_object(self, &error);
        self.signal = Signal::Throw(value);
        Ok(JsValue::Undefined)
    }

    // === Diagnostics ===

    /// Sets the source reference of the node being evaluated.
    pub fn set_source_ref(&mut self, span: Span) {
        if !span.is_empty() {
            self.source_ref = Some(span);
        }
    }

    /// Gets the most recent source reference.
    #[must_use]
    pub const fn source_ref(&self) -> Option<Span> {
        self.source_ref
    }

    /// Sets the source text spans point into.
    pub fn set_source(&mut self, source: Rc<str>) {
        self.source = Some(source);
    }

    /// Gets the source text of the program being evaluated, together with
    /// the most recent source reference a diagnostic would point at.
    #[must_use]
    pub fn source_slice(&self) -> Option<&str> {
        let span = self.source_ref?;
        let source = self.source.as_deref()?;
        source.get(span.start() as usize..span.end() as usize)
    }

    // === Cancellation & limits ===

    /// Gets the cancellation token.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Polls the cancellation token.
    pub fn check_cancelled(&self) -> EvalResult<()> {
        if self.cancellation.is_cancelled() {
            return Err(Fault::Cancelled);
        }
        Ok(())
    }

    /// Gets the runtime limits.
    #[must_use]
    pub const fn limits(&self) -> &RuntimeLimits {
        &self.limits
    }

    /// Enters a call, failing once the depth limit is exceeded.
    pub fn enter_call(&mut self) -> EvalResult<()> {
        self.call_depth += 1;
        if self.call_depth > self.limits.max_call_depth {
            self.call_depth -= 1;
            return Err(Fault::CallDepthExceeded);
        }
        Ok(())
    }

    /// Leaves a call.
    pub fn leave_call(&mut self) {
        self.call_depth = self.call_depth.saturating_sub(1);
    }

    // === Scope frames ===

    /// Pushes a scope frame.
    pub fn push_scope_frame(&mut self, frame: ScopeFrame) {
        self.scope_frames.push(frame);
    }

    /// Pops the innermost scope frame.
    pub fn pop_scope_frame(&mut self) {
        self.scope_frames.pop();
    }

    /// Gets the innermost scope frame, if any.
    #[must_use]
    pub fn scope_frame(&self) -> Option<&ScopeFrame> {
        self.scope_frames.last()
    }

    // === Private-name scopes ===

    /// Pushes a private-name scope.
    pub fn push_private_scope(&mut self, scope: Rc<PrivateEnvironment>) {
        self.private_scopes.push(scope);
    }

    /// Pops the innermost private-name scope.
    pub fn pop_private_scope(&mut self) {
        self.private_scopes.pop();
    }

    /// Gets the innermost private-name scope, if any.
    #[must_use]
    pub fn private_scope(&self) -> Option<&Rc<PrivateEnvironment>> {
        self.private_scopes.last()
    }

    // === Jobs ===

    /// Drains the promise job queue in FIFO order.
    pub fn run_jobs(&mut self) -> EvalResult<()> {
        while let Some(job) = self.realm.pop_job() {
            job.call(self)?;
        }
        Ok(())
    }

    /// Gets the await scheduler.
    #[must_use]
    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        self.scheduler.clone()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("signal", &self.signal)
            .field("call_depth", &self.call_depth)
            .finish_non_exhaustive()
    }
}
