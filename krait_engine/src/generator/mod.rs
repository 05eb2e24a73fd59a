//! The generator engine: plans, iterator objects, resume protocol, and the
//! async function / async generator drivers built on the same executor.

pub(crate) mod executor;
pub(crate) mod lowering;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::{
    builtins::promise::{self, PromiseCapability},
    context::Context,
    environments::Environment,
    error::{EvalResult, Fault, JsNativeError},
    eval::hoisting,
    function::ScriptFunction,
    iterator::{create_iter_result_object, IteratorRecord},
    object::{JsObject, ObjectKind},
    private::PrivateEnvironment,
    value::JsValue,
};

use self::executor::StepOutcome;
use self::lowering::Plan;

/// How a suspended generator is re-entered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum ResumeKind {
    /// `next(value)`.
    Normal,

    /// `throw(error)`.
    Throw,

    /// `return(value)`.
    Return,
}

/// The payload delivered to a suspended generator by an external entry.
#[derive(Clone, Debug)]
pub(crate) struct ResumePayload {
    /// The entry flavor.
    pub kind: ResumeKind,

    /// The delivered value.
    pub value: JsValue,
}

/// The per-site state of an in-flight `yield*` delegation.
#[derive(Debug)]
pub(crate) struct StarState {
    /// The delegated iterator.
    pub iterator: IteratorRecord,

    /// The memoized completion value once the delegation finished.
    pub done_value: Option<JsValue>,
}

impl StarState {
    pub(crate) fn new(iterator: IteratorRecord) -> Self {
        Self {
            iterator,
            done_value: None,
        }
    }
}

/// The transient per-instruction evaluation state of a running generator
/// or async body, installed on the context while its statements evaluate.
#[derive(Debug, Default)]
pub(crate) struct GeneratorRun {
    /// Async-step mode: awaits may suspend.
    pub async_mode: bool,

    /// The suspension-site cursor of the current evaluation pass.
    cursor: usize,

    /// Recorded resume payloads, by site; replayed when the interrupted
    /// instruction re-evaluates.
    pub records: FxHashMap<usize, ResumePayload>,

    /// In-flight `yield*` delegations, by site.
    pub star_states: FxHashMap<usize, StarState>,
}

impl GeneratorRun {
    fn new(async_mode: bool) -> Self {
        Self {
            async_mode,
            ..Self::default()
        }
    }

    /// Takes the next site id of this evaluation pass.
    pub(crate) fn next_site(&mut self) -> usize {
        let site = self.cursor;
        self.cursor += 1;
        site
    }

    /// Rewinds the site cursor for a replay pass.
    pub(crate) fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Drops the transient state once an instruction completes.
    pub(crate) fn clear_transient(&mut self) {
        self.cursor = 0;
        self.records.clear();
        self.star_states.clear();
    }
}

/// Everything a suspended generator needs to continue: its plan, program
/// counter, environment stack, try-frames, slots and resume state.
#[derive(Debug)]
pub(crate) struct GeneratorContext {
    pub(crate) plan: Rc<Plan>,
    pub(crate) pc: usize,
    pub(crate) env_stack: Vec<Environment>,
    pub(crate) frames: Vec<executor::TryFrame>,
    pub(crate) slots: Vec<Option<executor::SlotValue>>,
    pub(crate) run: GeneratorRun,
    /// The site of the last expression-level suspension, for payload
    /// injection on resume.
    pub(crate) suspended_site: Option<usize>,
    /// The payload of an instruction-level resume (`Yield` instructions).
    pub(crate) pending_resume: Option<ResumePayload>,
    pub(crate) private_scope: Option<Rc<PrivateEnvironment>>,
    /// The completion value of the most recent statement.
    pub(crate) last_value: JsValue,
}

impl GeneratorContext {
    fn new(
        plan: Rc<Plan>,
        env: Environment,
        async_mode: bool,
        private_scope: Option<Rc<PrivateEnvironment>>,
    ) -> Self {
        let slot_count = plan.slot_count;
        Self {
            plan,
            pc: 0,
            env_stack: vec![env],
            frames: Vec::new(),
            slots: (0..slot_count).map(|_| None).collect(),
            run: GeneratorRun::new(async_mode),
            suspended_site: None,
            pending_resume: None,
            private_scope,
            last_value: JsValue::Undefined,
        }
    }

    /// Injects an external resume payload according to how the generator
    /// suspended.
    fn inject(&mut self, payload: ResumePayload) {
        match self.suspended_site.take() {
            Some(site) => {
                self.run.records.insert(site, payload);
            }
            None => self.pending_resume = Some(payload),
        }
    }
}

/// Indicates the state of a generator.
#[derive(Debug)]
pub(crate) enum GeneratorState {
    /// Created, never entered.
    SuspendedStart {
        /// The `[[GeneratorContext]]` internal slot.
        context: GeneratorContext,
    },

    /// Suspended at a yield.
    SuspendedYield {
        /// The `[[GeneratorContext]]` internal slot.
        context: GeneratorContext,
    },

    /// Currently running; re-entry is a `TypeError`.
    Executing,

    /// Done; every further entry completes immediately.
    Completed,
}

/// The internal data of a generator iterator object.
#[derive(Debug)]
pub struct GeneratorData {
    pub(crate) state: GeneratorState,
}

/// Indicates the state of an async generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AsyncGeneratorState {
    SuspendedStart,
    SuspendedYield,
    Executing,
    Completed,
}

/// One queued `next`/`throw`/`return` request of an async generator.
#[derive(Debug)]
pub(crate) struct AsyncGeneratorRequest {
    /// The `[[Completion]]` slot.
    pub completion: ResumePayload,

    /// The `[[Capability]]` slot.
    pub capability: PromiseCapability,
}

/// The internal data of an async generator iterator object.
#[derive(Debug)]
pub struct AsyncGeneratorData {
    pub(crate) state: AsyncGeneratorState,
    pub(crate) context: Option<GeneratorContext>,
    pub(crate) queue: VecDeque<AsyncGeneratorRequest>,
}

/// Builds the plan of a function body, surfacing lowering failures as
/// unsupported-construct faults.
fn build_plan(script: &ScriptFunction, async_mode: bool) -> EvalResult<Rc<Plan>> {
    lowering::build(script.node().body().statements(), async_mode)
        .map(Rc::new)
        .map_err(Fault::Unsupported)
}

/// Hoists the body declarations of a generator/async activation into its
/// function environment.
fn hoist_body(
    script: &ScriptFunction,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    let items = script.node().body().statements();
    let names = hoisting::collect_block_names(items);
    env.set_body_lexical_names(names.lexical.clone());
    hoisting::declare_lexical_bindings(items, env, false, context)?;
    if context.should_stop() {
        return Ok(());
    }
    let annex_b = context.realm().annex_b() && !env.is_strict();
    hoisting::hoist_declarations(items, env, annex_b, context)
}

/// Creates the generator iterator object for a generator-function call.
/// The environment already carries the bound parameters and `this`.
pub(crate) fn create_generator_object(
    callee: &JsObject,
    script: &Rc<ScriptFunction>,
    env: Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let is_async = script.node().kind().is_async();
    let plan = build_plan(script, is_async)?;
    hoist_body(script, &env, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    let prototype = callee.get("prototype", context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let prototype = prototype.as_object().cloned().unwrap_or_else(|| {
        if is_async {
            context.realm().intrinsics().async_generator_prototype()
        } else {
            context.realm().intrinsics().generator_prototype()
        }
    });

    let gen_context =
        GeneratorContext::new(plan, env, is_async, script.private_scope().cloned());

    let kind = if is_async {
        ObjectKind::AsyncGenerator(AsyncGeneratorData {
            state: AsyncGeneratorState::SuspendedStart,
            context: Some(gen_context),
            queue: VecDeque::new(),
        })
    } else {
        ObjectKind::Generator(GeneratorData {
            state: GeneratorState::SuspendedStart {
                context: gen_context,
            },
        })
    };
    Ok(JsObject::from_proto_and_kind(Some(prototype), kind).into())
}

/// `GeneratorResume` / `GeneratorResumeAbrupt`: the external entry points
/// of a sync generator.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-generatorresume
pub(crate) fn generator_resume(
    generator: &JsValue,
    payload: ResumePayload,
    context: &mut Context,
) -> EvalResult<JsValue> {
    // 1. Let state be ? GeneratorValidate(generator, generatorBrand).
    let Some(generator_obj) = generator.as_object().cloned() else {
        return context.throw(
            JsNativeError::typ().with_message("Generator method called on non generator"),
        );
    };

    // 4.-7. Extract the context, marking the generator as executing.
    let extracted = {
        let mut object = generator_obj.borrow_mut();
        let Some(data) = object.as_generator_mut() else {
            return context.throw(
                JsNativeError::typ().with_message("Generator method called on non generator"),
            );
        };
        match std::mem::replace(&mut data.state, GeneratorState::Executing) {
            GeneratorState::Executing => {
                return context.throw(
                    JsNativeError::typ().with_message("Generator is already executing"),
                );
            }
            // 2. If state is completed, finish immediately.
            GeneratorState::Completed => {
                data.state = GeneratorState::Completed;
                return completed_entry(&payload, context);
            }
            GeneratorState::SuspendedStart { context: gen_context } => {
                // `throw`/`return` before the first `next` completes the
                // generator without running it.
                if payload.kind != ResumeKind::Normal {
                    data.state = GeneratorState::Completed;
                    return completed_entry(&payload, context);
                }
                (gen_context, false)
            }
            GeneratorState::SuspendedYield { context: gen_context } => (gen_context, true),
        }
    };
    let (mut gen_context, inject) = extracted;

    if inject {
        gen_context.inject(payload);
    }

    // 5. Run the instruction loop until a yield, completion or throw.
    let outcome = executor::run(&mut gen_context, context)?;

    let mut object = generator_obj.borrow_mut();
    let Some(data) = object.as_generator_mut() else {
        return Err(Fault::Invariant("generator object changed kind mid-run".into()));
    };
    match outcome {
        StepOutcome::Yielded(value) => {
            data.state = GeneratorState::SuspendedYield {
                context: gen_context,
            };
            drop(object);
            Ok(create_iter_result_object(value, false, context))
        }
        StepOutcome::Complete(value) => {
            data.state = GeneratorState::Completed;
            drop(object);
            Ok(create_iter_result_object(value, true, context))
        }
        StepOutcome::Thrown(value) => {
            data.state = GeneratorState::Completed;
            drop(object);
            context.throw_value(value);
            Ok(JsValue::Undefined)
        }
        StepOutcome::Pending(_) => {
            Err(Fault::Invariant("sync generator produced a pending await".into()))
        }
    }
}

/// Finishes an entry into an already-completed generator.
fn completed_entry(payload: &ResumePayload, context: &mut Context) -> EvalResult<JsValue> {
    match payload.kind {
        ResumeKind::Normal => Ok(create_iter_result_object(JsValue::Undefined, true, context)),
        ResumeKind::Return => Ok(create_iter_result_object(
            payload.value.clone(),
            true,
            context,
        )),
        ResumeKind::Throw => {
            context.throw_value(payload.value.clone());
            Ok(JsValue::Undefined)
        }
    }
}

// === Async functions ===

/// Runs an async function call: the body executes through the plan
/// executor in async-step mode; the call immediately returns a promise.
/// A synchronous throw anywhere in the setup rejects the promise instead
/// of propagating.
pub(crate) fn run_async_function(
    callee: &JsObject,
    script: &Rc<ScriptFunction>,
    this: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> EvalResult<JsValue> {
    let capability = PromiseCapability::new(context);

    let env = crate::eval::call::prepare_activation(callee, script, this, None, false, context);
    crate::eval::call::init_activation(script, args, &env, context)?;
    if let Some(reason) = take_thrown(context) {
        capability.reject(reason, context)?;
        return Ok(capability.promise().clone().into());
    }

    let plan = build_plan(script, true)?;
    hoist_body(script, &env, context)?;
    if let Some(reason) = take_thrown(context) {
        capability.reject(reason, context)?;
        return Ok(capability.promise().clone().into());
    }

    let gen_context =
        GeneratorContext::new(plan, env, true, script.private_scope().cloned());
    let state = Rc::new(RefCell::new(Some(gen_context)));
    drive_async_function(&state, None, &capability, context)?;
    Ok(capability.promise().clone().into())
}

fn take_thrown(context: &mut Context) -> Option<JsValue> {
    if !context.should_stop() {
        return None;
    }
    match context.take_signal() {
        crate::context::Signal::Throw(value) => Some(value),
        other => {
            context.set_signal(other);
            None
        }
    }
}

/// Steps an async function until it settles or suspends; suspensions
/// re-enter through promise reactions.
fn drive_async_function(
    state: &Rc<RefCell<Option<GeneratorContext>>>,
    payload: Option<ResumePayload>,
    capability: &PromiseCapability,
    context: &mut Context,
) -> EvalResult<()> {
    let Some(mut gen_context) = state.borrow_mut().take() else {
        return Ok(());
    };
    if let Some(payload) = payload {
        gen_context.inject(payload);
    }

    match executor::run(&mut gen_context, context)? {
        StepOutcome::Complete(value) => capability.resolve(value, context),
        StepOutcome::Thrown(reason) => capability.reject(reason, context),
        StepOutcome::Pending(promise) => {
            *state.borrow_mut() = Some(gen_context);
            let fulfilled_state = state.clone();
            let fulfilled_capability = capability.clone();
            let rejected_state = state.clone();
            let rejected_capability = capability.clone();
            promise::on_settle(
                &promise,
                move |value, context| {
                    drive_async_function(
                        &fulfilled_state,
                        Some(ResumePayload {
                            kind: ResumeKind::Normal,
                            value,
                        }),
                        &fulfilled_capability,
                        context,
                    )
                },
                move |reason, context| {
                    drive_async_function(
                        &rejected_state,
                        Some(ResumePayload {
                            kind: ResumeKind::Throw,
                            value: reason,
                        }),
                        &rejected_capability,
                        context,
                    )
                },
                context,
            );
            Ok(())
        }
        StepOutcome::Yielded(_) => Err(Fault::Invariant(
            "async function produced a yield".into(),
        )),
    }
}

// === Async generators ===

/// `AsyncGeneratorEnqueue`: queues a request and resumes the generator if
/// it is suspended. Every entry returns a promise.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-asyncgeneratorenqueue
pub(crate) fn async_generator_enqueue(
    generator: &JsValue,
    completion: ResumePayload,
    context: &mut Context,
) -> EvalResult<JsValue> {
    // 2. Let promiseCapability be ! NewPromiseCapability(%Promise%).
    let capability = PromiseCapability::new(context);

    // 3.-4. Validate, rejecting instead of throwing.
    let Some(generator_obj) = generator.as_object().cloned() else {
        let reason = error_value(
            JsNativeError::typ().with_message("generator resumed on non generator object"),
            context,
        );
        capability.reject(reason, context)?;
        return Ok(capability.promise().clone().into());
    };
    let is_async_generator = matches!(
        generator_obj.borrow().kind(),
        ObjectKind::AsyncGenerator(_)
    );
    if !is_async_generator {
        let reason = error_value(
            JsNativeError::typ().with_message("generator resumed on non generator object"),
            context,
        );
        capability.reject(reason, context)?;
        return Ok(capability.promise().clone().into());
    }

    // 8. Perform AsyncGeneratorEnqueue(generator, completion, promiseCapability).
    {
        let mut object = generator_obj.borrow_mut();
        if let Some(data) = object.as_async_generator_mut() {
            data.queue.push_back(AsyncGeneratorRequest {
                completion,
                capability: capability.clone(),
            });
        }
    }

    // 9.-10. Resume the generator if it is suspended.
    pump_async_generator(&generator_obj, context)?;

    Ok(capability.promise().clone().into())
}

fn error_value(error: JsNativeError, context: &mut Context) -> JsValue {
    crate::builtins::error::create_error_object(context, &error)
}

/// Drains the request queue while the generator can make progress.
fn pump_async_generator(generator: &JsObject, context: &mut Context) -> EvalResult<()> {
    loop {
        enum Action {
            Run(GeneratorContext, Option<ResumePayload>),
            Settle(ResumePayload, PromiseCapability),
            Idle,
        }

        let action = {
            let mut object = generator.borrow_mut();
            let Some(data) = object.as_async_generator_mut() else {
                return Ok(());
            };
            if data.queue.is_empty() {
                Action::Idle
            } else {
                match data.state {
                    AsyncGeneratorState::Completed => {
                        let request = data.queue.pop_front();
                        match request {
                            Some(request) => {
                                Action::Settle(request.completion, request.capability)
                            }
                            None => Action::Idle,
                        }
                    }
                    AsyncGeneratorState::SuspendedStart => {
                        let completion = data
                            .queue
                            .front()
                            .map(|request| request.completion.clone());
                        match (completion, data.context.take()) {
                            (Some(completion), Some(gen_context)) => {
                                if completion.kind == ResumeKind::Normal {
                                    data.state = AsyncGeneratorState::Executing;
                                    Action::Run(gen_context, None)
                                } else {
                                    // Abrupt entry before the first
                                    // `next` completes the generator.
                                    data.state = AsyncGeneratorState::Completed;
                                    let request = data.queue.pop_front();
                                    match request {
                                        Some(request) => Action::Settle(
                                            request.completion,
                                            request.capability,
                                        ),
                                        None => Action::Idle,
                                    }
                                }
                            }
                            _ => Action::Idle,
                        }
                    }
                    AsyncGeneratorState::SuspendedYield => {
                        let completion = data
                            .queue
                            .front()
                            .map(|request| request.completion.clone());
                        match (completion, data.context.take()) {
                            (Some(completion), Some(gen_context)) => {
                                data.state = AsyncGeneratorState::Executing;
                                Action::Run(gen_context, Some(completion))
                            }
                            _ => Action::Idle,
                        }
                    }
                    AsyncGeneratorState::Executing => Action::Idle,
                }
            }
        };

        match action {
            Action::Idle => return Ok(()),
            Action::Settle(completion, capability) => {
                settle_completed_request(&completion, &capability, context)?;
            }
            Action::Run(gen_context, payload) => {
                advance_async_generator(generator, gen_context, payload, context)?;
            }
        }
    }
}

/// Settles a request made against an already-completed async generator.
fn settle_completed_request(
    completion: &ResumePayload,
    capability: &PromiseCapability,
    context: &mut Context,
) -> EvalResult<()> {
    match completion.kind {
        ResumeKind::Normal => {
            let result = create_iter_result_object(JsValue::Undefined, true, context);
            capability.resolve(result, context)
        }
        ResumeKind::Return => {
            let result = create_iter_result_object(completion.value.clone(), true, context);
            capability.resolve(result, context)
        }
        ResumeKind::Throw => capability.reject(completion.value.clone(), context),
    }
}

/// Runs one executor step of an async generator and applies its outcome.
fn advance_async_generator(
    generator: &JsObject,
    mut gen_context: GeneratorContext,
    payload: Option<ResumePayload>,
    context: &mut Context,
) -> EvalResult<()> {
    if let Some(payload) = payload {
        gen_context.inject(payload);
    }

    let outcome = executor::run(&mut gen_context, context)?;

    match outcome {
        StepOutcome::Yielded(value) => {
            {
                let mut object = generator.borrow_mut();
                if let Some(data) = object.as_async_generator_mut() {
                    data.state = AsyncGeneratorState::SuspendedYield;
                    data.context = Some(gen_context);
                }
            }
            let capability = pop_front_capability(generator);
            if let Some(capability) = capability {
                let result = create_iter_result_object(value, false, context);
                capability.resolve(result, context)?;
            }
            Ok(())
        }
        StepOutcome::Complete(value) => {
            {
                let mut object = generator.borrow_mut();
                if let Some(data) = object.as_async_generator_mut() {
                    data.state = AsyncGeneratorState::Completed;
                    data.context = None;
                }
            }
            let capability = pop_front_capability(generator);
            if let Some(capability) = capability {
                let result = create_iter_result_object(value, true, context);
                capability.resolve(result, context)?;
            }
            Ok(())
        }
        StepOutcome::Thrown(reason) => {
            {
                let mut object = generator.borrow_mut();
                if let Some(data) = object.as_async_generator_mut() {
                    data.state = AsyncGeneratorState::Completed;
                    data.context = None;
                }
            }
            let capability = pop_front_capability(generator);
            if let Some(capability) = capability {
                capability.reject(reason, context)?;
            }
            Ok(())
        }
        StepOutcome::Pending(promise) => {
            // Await in flight: keep the state Executing so concurrent
            // entries only enqueue, and re-enter on settlement.
            {
                let mut object = generator.borrow_mut();
                if let Some(data) = object.as_async_generator_mut() {
                    data.context = Some(gen_context);
                }
            }
            let fulfilled = generator.clone();
            let rejected = generator.clone();
            promise::on_settle(
                &promise,
                move |value, context| {
                    resume_after_await(
                        &fulfilled,
                        ResumePayload {
                            kind: ResumeKind::Normal,
                            value,
                        },
                        context,
                    )
                },
                move |reason, context| {
                    resume_after_await(
                        &rejected,
                        ResumePayload {
                            kind: ResumeKind::Throw,
                            value: reason,
                        },
                        context,
                    )
                },
                context,
            );
            Ok(())
        }
    }
}

fn pop_front_capability(generator: &JsObject) -> Option<PromiseCapability> {
    let mut object = generator.borrow_mut();
    let data = object.as_async_generator_mut()?;
    data.queue.pop_front().map(|request| request.capability)
}

/// Re-enters an async generator once an awaited promise settles, then
/// keeps pumping the queue.
fn resume_after_await(
    generator: &JsObject,
    payload: ResumePayload,
    context: &mut Context,
) -> EvalResult<()> {
    let gen_context = {
        let mut object = generator.borrow_mut();
        let Some(data) = object.as_async_generator_mut() else {
            return Ok(());
        };
        data.context.take()
    };
    let Some(gen_context) = gen_context else {
        return Ok(());
    };
    advance_async_generator(generator, gen_context, Some(payload), context)?;
    pump_async_generator(generator, context)
}
