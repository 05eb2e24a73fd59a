//! The program-counter-driven instruction executor.
//!
//! Runs a lowered [`Plan`][super::lowering::Plan] instruction by
//! instruction, preserving the environment stack across suspensions and
//! routing abrupt completions through the try-frame stack.

use krait_ast::declaration::Binding;

use crate::{
    context::{Context, Signal},
    environments::{DeclarativeEnvironment, DefineOptions, Environment},
    error::{EvalResult, Fault, JsNativeError, SuspendKind},
    eval::{
        self,
        expression::eval_expression,
        hoisting,
        pattern::{bind_pattern_binding, BindingMode},
    },
    iterator::{get_iterator, ForInEnumerator, IteratorHint, IteratorRecord},
    object::JsObject,
    scheduler::AwaitOutcome,
    value::JsValue,
};

use super::{
    lowering::{Instruction, IterKind, ResumeTarget, ResumeTargetMode},
    GeneratorContext, ResumeKind, ResumePayload,
};

/// The observable result of one executor entry.
#[derive(Debug)]
pub(crate) enum StepOutcome {
    /// Suspended at a yield, producing `{value, done: false}`.
    Yielded(JsValue),

    /// Completed, producing `{value, done: true}`.
    Complete(JsValue),

    /// Completed with an uncaught throw.
    Thrown(JsValue),

    /// Suspended on a pending await; the wrapper re-enters on settlement.
    Pending(JsObject),
}

/// One entry of the try-frame stack.
#[derive(Debug)]
pub(crate) struct TryFrame {
    handler: Option<usize>,
    catch_binding: Option<Binding>,
    finally: Option<usize>,
    catch_used: bool,
    finally_scheduled: bool,
    pending: Option<Pending>,
    scope_len: usize,
}

/// What an [`Instruction::EndFinally`] resumes.
#[derive(Debug)]
enum Pending {
    /// Continue at the given instruction.
    Goto(usize),

    /// Re-raise an abrupt completion.
    Abrupt(Abrupt),
}

/// An abrupt completion in flight through the frame stack.
#[derive(Debug)]
enum Abrupt {
    Throw(JsValue),
    Return(JsValue),
    Break {
        target: usize,
        frame_depth: usize,
        scope_depth: usize,
    },
    Continue {
        target: usize,
        frame_depth: usize,
        scope_depth: usize,
    },
}

/// A slot of the plan: a plain value, an iterator driver, or a delegation
/// record.
#[derive(Debug)]
pub(crate) enum SlotValue {
    Value(JsValue),
    Iter(IterDriver),
    Star(IteratorRecord),
}

/// The driver state of a lowered `for-in`/`for-of` loop.
#[derive(Debug)]
pub(crate) enum IterDriver {
    Proto {
        record: IteratorRecord,
        kind: IterKind,
        base_len: usize,
    },
    Enumerate {
        enumerator: ForInEnumerator,
        base_len: usize,
    },
}

/// The result of evaluating a fragment under the generator run state.
enum StepEval<T> {
    Done(T),
    Suspended(SuspendKind),
}

/// What became of a possibly-abrupt signal after a fragment evaluated.
enum Absorbed {
    /// No signal: the instruction completes normally.
    Clean,

    /// The signal was routed through the frames; the program counter has
    /// been redirected.
    Redirected,

    /// The signal terminated the generator.
    Finished(StepOutcome),
}

/// Runs the instruction loop until a suspension, completion or uncaught
/// throw.
pub(crate) fn run(gen: &mut GeneratorContext, context: &mut Context) -> EvalResult<StepOutcome> {
    loop {
        context.check_cancelled()?;

        let plan = gen.plan.clone();
        let Some(instruction) = plan.instructions.get(gen.pc) else {
            return Ok(StepOutcome::Complete(std::mem::take(&mut gen.last_value)));
        };

        match instruction {
            Instruction::Complete => {
                return Ok(StepOutcome::Complete(std::mem::take(&mut gen.last_value)));
            }

            Instruction::Statement { item, next } => {
                let item = item.clone();
                let eval = eval_in_run(gen, context, |env, context| {
                    eval::eval_statement_list_item(&item, env, context)
                })?;
                match eval {
                    StepEval::Suspended(kind) => return suspend_outcome(kind),
                    StepEval::Done(value) => {
                        if let Some(value) = value {
                            gen.last_value = value;
                        }
                        match absorb_signal(gen, context)? {
                            Absorbed::Finished(outcome) => return Ok(outcome),
                            Absorbed::Redirected => {}
                            Absorbed::Clean => {
                                gen.run.clear_transient();
                                gen.pc = *next;
                            }
                        }
                    }
                }
            }

            Instruction::Yield { expr, next } => {
                if gen.pending_resume.is_some() {
                    // Re-entry: the payload is consumed by the
                    // StoreResumeValue that follows.
                    gen.pc = *next;
                    continue;
                }
                let expr = expr.clone();
                let eval = eval_in_run(gen, context, |env, context| match &expr {
                    Some(expr) => eval_expression(expr, env, context),
                    None => Ok(JsValue::Undefined),
                })?;
                match eval {
                    StepEval::Suspended(kind) => return suspend_outcome(kind),
                    StepEval::Done(value) => match absorb_signal(gen, context)? {
                        Absorbed::Finished(outcome) => return Ok(outcome),
                        Absorbed::Redirected => {}
                        Absorbed::Clean => {
                            gen.run.clear_transient();
                            gen.suspended_site = None;
                            return Ok(StepOutcome::Yielded(value));
                        }
                    },
                }
            }

            Instruction::StoreResumeValue { target, next } => {
                let payload = gen.pending_resume.take().unwrap_or(ResumePayload {
                    kind: ResumeKind::Normal,
                    value: JsValue::Undefined,
                });
                match payload.kind {
                    ResumeKind::Throw => {
                        match handle_abrupt(gen, Abrupt::Throw(payload.value), context)? {
                            Some(outcome) => return Ok(outcome),
                            None => continue,
                        }
                    }
                    ResumeKind::Return => {
                        match handle_abrupt(gen, Abrupt::Return(payload.value), context)? {
                            Some(outcome) => return Ok(outcome),
                            None => continue,
                        }
                    }
                    ResumeKind::Normal => {
                        gen.last_value = payload.value.clone();
                        if let Some(target) = target {
                            store_target(gen, target, payload.value, context)?;
                            match absorb_signal(gen, context)? {
                                Absorbed::Finished(outcome) => return Ok(outcome),
                                Absorbed::Redirected => continue,
                                Absorbed::Clean => {}
                            }
                        }
                        gen.pc = *next;
                    }
                }
            }

            Instruction::StoreSlot { slot, target, next } => {
                let value = match gen.slots.get_mut(*slot).and_then(Option::take) {
                    Some(SlotValue::Value(value)) => value,
                    _ => JsValue::Undefined,
                };
                store_target(gen, target, value, context)?;
                match absorb_signal(gen, context)? {
                    Absorbed::Finished(outcome) => return Ok(outcome),
                    Absorbed::Redirected => continue,
                    Absorbed::Clean => gen.pc = *next,
                }
            }

            Instruction::YieldStar {
                iter_expr,
                state_slot,
                result_slot,
                next,
            } => {
                let outcome =
                    step_yield_star(gen, iter_expr, *state_slot, *result_slot, *next, context)?;
                if let Some(outcome) = outcome {
                    return Ok(outcome);
                }
            }

            Instruction::EnterTry {
                handler,
                catch_binding,
                finally,
                next,
            } => {
                gen.frames.push(TryFrame {
                    handler: *handler,
                    catch_binding: catch_binding.clone(),
                    finally: *finally,
                    catch_used: false,
                    finally_scheduled: false,
                    pending: None,
                    scope_len: gen.env_stack.len(),
                });
                gen.pc = *next;
            }

            Instruction::LeaveTry { next } => {
                let schedule = {
                    let Some(frame) = gen.frames.last_mut() else {
                        return Err(Fault::Invariant("LeaveTry without a frame".into()));
                    };
                    match frame.finally {
                        Some(finally) if !frame.finally_scheduled => {
                            frame.finally_scheduled = true;
                            frame.pending = Some(Pending::Goto(*next));
                            Some((finally, frame.scope_len))
                        }
                        _ => None,
                    }
                };
                match schedule {
                    Some((finally, scope_len)) => {
                        truncate_scopes(gen, scope_len);
                        gen.pc = finally;
                    }
                    None => {
                        gen.frames.pop();
                        gen.pc = *next;
                    }
                }
            }

            Instruction::EndFinally { next } => {
                let Some(frame) = gen.frames.pop() else {
                    return Err(Fault::Invariant("EndFinally without a frame".into()));
                };
                match frame.pending {
                    Some(Pending::Goto(target)) => gen.pc = target,
                    Some(Pending::Abrupt(abrupt)) => {
                        if let Some(outcome) = handle_abrupt(gen, abrupt, context)? {
                            return Ok(outcome);
                        }
                    }
                    None => gen.pc = *next,
                }
            }

            Instruction::EnterScope { items, next } => {
                let parent = current_env(gen);
                let env = DeclarativeEnvironment::new_block(parent);
                let names = hoisting::collect_block_names(items);
                env.set_body_lexical_names(names.lexical.clone());
                gen.env_stack.push(env.clone());
                hoisting::declare_lexical_bindings(items, &env, true, context)?;
                match absorb_signal(gen, context)? {
                    Absorbed::Finished(outcome) => return Ok(outcome),
                    Absorbed::Redirected => {}
                    Absorbed::Clean => gen.pc = *next,
                }
            }

            Instruction::LeaveScope { next } => {
                if gen.env_stack.len() > 1 {
                    gen.env_stack.pop();
                }
                gen.pc = *next;
            }

            Instruction::Jump { target } => gen.pc = *target,

            Instruction::Branch {
                cond,
                if_true,
                if_false,
            } => {
                let cond = cond.clone();
                let eval = eval_in_run(gen, context, |env, context| {
                    eval_expression(&cond, env, context)
                })?;
                match eval {
                    StepEval::Suspended(kind) => return suspend_outcome(kind),
                    StepEval::Done(value) => match absorb_signal(gen, context)? {
                        Absorbed::Finished(outcome) => return Ok(outcome),
                        Absorbed::Redirected => {}
                        Absorbed::Clean => {
                            gen.run.clear_transient();
                            gen.pc = if value.to_boolean() { *if_true } else { *if_false };
                        }
                    },
                }
            }

            Instruction::Break {
                target,
                frame_depth,
                scope_depth,
            } => {
                if let Some(outcome) = handle_abrupt(
                    gen,
                    Abrupt::Break {
                        target: *target,
                        frame_depth: *frame_depth,
                        scope_depth: *scope_depth,
                    },
                    context,
                )? {
                    return Ok(outcome);
                }
            }

            Instruction::Continue {
                target,
                frame_depth,
                scope_depth,
            } => {
                if let Some(outcome) = handle_abrupt(
                    gen,
                    Abrupt::Continue {
                        target: *target,
                        frame_depth: *frame_depth,
                        scope_depth: *scope_depth,
                    },
                    context,
                )? {
                    return Ok(outcome);
                }
            }

            Instruction::Return { expr } => {
                let expr = expr.clone();
                let eval = eval_in_run(gen, context, |env, context| match &expr {
                    Some(expr) => eval_expression(expr, env, context),
                    None => Ok(JsValue::Undefined),
                })?;
                match eval {
                    StepEval::Suspended(kind) => return suspend_outcome(kind),
                    StepEval::Done(value) => match absorb_signal(gen, context)? {
                        Absorbed::Finished(outcome) => return Ok(outcome),
                        Absorbed::Redirected => {}
                        Absorbed::Clean => {
                            gen.run.clear_transient();
                            if let Some(outcome) =
                                handle_abrupt(gen, Abrupt::Return(value), context)?
                            {
                                return Ok(outcome);
                            }
                        }
                    },
                }
            }

            Instruction::IteratorInit {
                expr,
                slot,
                kind,
                next,
            } => {
                let expr = expr.clone();
                let eval = eval_in_run(gen, context, |env, context| {
                    eval_expression(&expr, env, context)
                })?;
                let value = match eval {
                    StepEval::Suspended(kind) => return suspend_outcome(kind),
                    StepEval::Done(value) => value,
                };
                match absorb_signal(gen, context)? {
                    Absorbed::Finished(outcome) => return Ok(outcome),
                    Absorbed::Redirected => continue,
                    Absorbed::Clean => {}
                }
                gen.run.clear_transient();

                let base_len = gen.env_stack.len();
                let driver = match kind {
                    IterKind::Enumerate => IterDriver::Enumerate {
                        enumerator: ForInEnumerator::new(&value),
                        base_len,
                    },
                    IterKind::Sync | IterKind::Async => {
                        let hint = if *kind == IterKind::Async {
                            IteratorHint::Async
                        } else {
                            IteratorHint::Sync
                        };
                        let record = get_iterator(&value, hint, context)?;
                        match absorb_signal(gen, context)? {
                            Absorbed::Finished(outcome) => return Ok(outcome),
                            Absorbed::Redirected => continue,
                            Absorbed::Clean => {}
                        }
                        let Some(record) = record else {
                            continue;
                        };
                        IterDriver::Proto {
                            record,
                            kind: *kind,
                            base_len,
                        }
                    }
                };
                if let Some(slot_ref) = gen.slots.get_mut(*slot) {
                    *slot_ref = Some(SlotValue::Iter(driver));
                }
                gen.pc = *next;
            }

            Instruction::IteratorMoveNext {
                slot,
                init,
                break_target,
                next,
            } => {
                let init = init.clone();
                let outcome = step_move_next(gen, *slot, &init, *break_target, *next, context)?;
                if let Some(outcome) = outcome {
                    return Ok(outcome);
                }
            }
        }
    }
}

fn current_env(gen: &GeneratorContext) -> Environment {
    gen.env_stack
        .last()
        .cloned()
        .unwrap_or_else(|| unreachable!("generator environment stack is never empty"))
}

fn truncate_scopes(gen: &mut GeneratorContext, len: usize) {
    while gen.env_stack.len() > len.max(1) {
        gen.env_stack.pop();
    }
}

/// Evaluates a fragment with the generator run state installed on the
/// context, capturing suspensions.
fn eval_in_run<T>(
    gen: &mut GeneratorContext,
    context: &mut Context,
    f: impl FnOnce(&Environment, &mut Context) -> EvalResult<T>,
) -> EvalResult<StepEval<T>> {
    let mut run = std::mem::take(&mut gen.run);
    run.rewind();
    context.generator_run = Some(run);
    if let Some(private_scope) = &gen.private_scope {
        context.push_private_scope(private_scope.clone());
    }

    let env = current_env(gen);
    let result = f(&env, context);

    if gen.private_scope.is_some() {
        context.pop_private_scope();
    }
    gen.run = context
        .generator_run
        .take()
        .ok_or_else(|| Fault::Invariant("generator run state vanished".into()))?;

    match result {
        Ok(value) => Ok(StepEval::Done(value)),
        Err(Fault::Suspend(suspension)) => {
            gen.suspended_site = Some(suspension.site);
            Ok(StepEval::Suspended(suspension.kind))
        }
        Err(fault) => Err(fault),
    }
}

fn suspend_outcome(kind: SuspendKind) -> EvalResult<StepOutcome> {
    match kind {
        SuspendKind::Yield(value) => Ok(StepOutcome::Yielded(value)),
        SuspendKind::Await(promise) => match promise {
            JsValue::Object(promise) => Ok(StepOutcome::Pending(promise)),
            _ => Err(Fault::Invariant("await suspension without a promise".into())),
        },
    }
}

/// Converts an abrupt signal raised by a fragment into frame routing.
fn absorb_signal(gen: &mut GeneratorContext, context: &mut Context) -> EvalResult<Absorbed> {
    if !context.should_stop() {
        return Ok(Absorbed::Clean);
    }
    let routed = match context.take_signal() {
        Signal::Throw(value) => handle_abrupt(gen, Abrupt::Throw(value), context)?,
        Signal::Return(value) => handle_abrupt(gen, Abrupt::Return(value), context)?,
        Signal::Empty => return Ok(Absorbed::Clean),
        Signal::Break(_) | Signal::Continue(_) => {
            return Err(Fault::Unsupported(
                "break across an unlowered statement boundary in a generator".into(),
            ));
        }
    };
    Ok(match routed {
        Some(outcome) => Absorbed::Finished(outcome),
        None => Absorbed::Redirected,
    })
}

/// `HandleAbruptCompletion`: walks the try-frame stack top-down, running
/// catch handlers and scheduling finalizers, until the completion is
/// consumed or escapes. `None` means the program counter was redirected.
fn handle_abrupt(
    gen: &mut GeneratorContext,
    abrupt: Abrupt,
    context: &mut Context,
) -> EvalResult<Option<StepOutcome>> {
    let mut abrupt = abrupt;
    loop {
        // Loop jumps whose frames are fully unwound land directly.
        if let Abrupt::Break {
            target,
            frame_depth,
            scope_depth,
        }
        | Abrupt::Continue {
            target,
            frame_depth,
            scope_depth,
        } = &abrupt
        {
            if gen.frames.len() <= *frame_depth {
                let (target, scope_depth) = (*target, *scope_depth);
                truncate_scopes(gen, scope_depth + 1);
                gen.run.clear_transient();
                gen.pc = target;
                return Ok(None);
            }
        }

        if gen.frames.is_empty() {
            return match abrupt {
                Abrupt::Throw(value) => Ok(Some(StepOutcome::Thrown(value))),
                Abrupt::Return(value) => Ok(Some(StepOutcome::Complete(value))),
                Abrupt::Break { .. } | Abrupt::Continue { .. } => Err(Fault::Invariant(
                    "loop jump escaped the instruction stream".into(),
                )),
            };
        }

        // A throw with an unused handler dispatches to the catch.
        let catch_ready = {
            let frame = &gen.frames[gen.frames.len() - 1];
            matches!(abrupt, Abrupt::Throw(_)) && frame.handler.is_some() && !frame.catch_used
        };
        if catch_ready {
            let (handler, catch_binding, scope_len) = {
                let last = gen.frames.len() - 1;
                let frame = &mut gen.frames[last];
                frame.catch_used = true;
                (
                    frame.handler.unwrap_or_default(),
                    frame.catch_binding.clone(),
                    frame.scope_len,
                )
            };
            let Abrupt::Throw(value) = abrupt else {
                return Err(Fault::Invariant("catch dispatch without a throw".into()));
            };
            truncate_scopes(gen, scope_len);

            // The catch-parameter scope.
            let catch_env = DeclarativeEnvironment::new_block(current_env(gen));
            gen.env_stack.push(catch_env.clone());
            match catch_binding {
                Some(Binding::Identifier(ident)) => {
                    catch_env.define(
                        ident.name().into(),
                        value,
                        DefineOptions {
                            simple_catch: true,
                            ..DefineOptions::lexical()
                        },
                    );
                }
                Some(Binding::Pattern(pattern)) => {
                    bind_pattern_binding(&pattern, value, BindingMode::Let, &catch_env, context)?;
                    if context.should_stop() {
                        // Destructuring the catch parameter threw:
                        // re-handle with this handler marked used.
                        if let Signal::Throw(new_value) = context.take_signal() {
                            abrupt = Abrupt::Throw(new_value);
                            continue;
                        }
                    }
                }
                None => {}
            }
            gen.run.clear_transient();
            gen.pc = handler;
            return Ok(None);
        }

        // An unscheduled finalizer intercepts any abrupt completion.
        let finally_ready = {
            let frame = &gen.frames[gen.frames.len() - 1];
            frame.finally.filter(|_| !frame.finally_scheduled)
        };
        if let Some(finally) = finally_ready {
            let scope_len = {
                let last = gen.frames.len() - 1;
                let frame = &mut gen.frames[last];
                frame.finally_scheduled = true;
                frame.pending = Some(Pending::Abrupt(abrupt));
                frame.scope_len
            };
            truncate_scopes(gen, scope_len);
            gen.run.clear_transient();
            gen.pc = finally;
            return Ok(None);
        }

        gen.frames.pop();
    }
}

/// Stores a consumed resume value (or `yield*` result) into its binding.
fn store_target(
    gen: &mut GeneratorContext,
    target: &ResumeTarget,
    value: JsValue,
    context: &mut Context,
) -> EvalResult<()> {
    let env = current_env(gen);
    match target.mode {
        ResumeTargetMode::Assign => crate::eval::expression::assign_identifier(
            target.name.as_rc_str(),
            value,
            &env,
            context,
        ),
        ResumeTargetMode::Let | ResumeTargetMode::Const => {
            env.initialize(&target.name, value);
            Ok(())
        }
        ResumeTargetMode::Var => {
            env.define_function_scoped(target.name.clone(), value, true);
            Ok(())
        }
    }
}

/// One pass over an instruction-level `yield*` delegation.
fn step_yield_star(
    gen: &mut GeneratorContext,
    iter_expr: &krait_ast::Expression,
    state_slot: usize,
    result_slot: usize,
    next: usize,
    context: &mut Context,
) -> EvalResult<Option<StepOutcome>> {
    // Lazily create the delegated iterator.
    let missing = !matches!(gen.slots.get(state_slot), Some(Some(SlotValue::Star(_))));
    if missing {
        let iter_expr = iter_expr.clone();
        let eval = eval_in_run(gen, context, |env, context| {
            eval_expression(&iter_expr, env, context)
        })?;
        let value = match eval {
            StepEval::Suspended(kind) => return suspend_outcome(kind).map(Some),
            StepEval::Done(value) => value,
        };
        match absorb_signal(gen, context)? {
            Absorbed::Finished(outcome) => return Ok(Some(outcome)),
            Absorbed::Redirected => return Ok(None),
            Absorbed::Clean => {}
        }
        gen.run.clear_transient();
        let record = get_iterator(&value, IteratorHint::Sync, context)?;
        match absorb_signal(gen, context)? {
            Absorbed::Finished(outcome) => return Ok(Some(outcome)),
            Absorbed::Redirected => return Ok(None),
            Absorbed::Clean => {}
        }
        let Some(record) = record else {
            return Ok(None);
        };
        if let Some(slot) = gen.slots.get_mut(state_slot) {
            *slot = Some(SlotValue::Star(record));
        }
    }

    let record = match gen.slots.get(state_slot) {
        Some(Some(SlotValue::Star(record))) => record.clone(),
        _ => return Err(Fault::Invariant("yield* state slot vanished".into())),
    };
    let iterator_value = JsValue::from(record.iterator().clone());

    let payload = gen.pending_resume.take().unwrap_or(ResumePayload {
        kind: ResumeKind::Normal,
        value: JsValue::Undefined,
    });

    let raw = match payload.kind {
        ResumeKind::Normal => {
            let mut record = record.clone();
            let raw = record.step_raw(Some(&payload.value), context)?;
            match absorb_signal(gen, context)? {
                Absorbed::Finished(outcome) => return Ok(Some(outcome)),
                Absorbed::Redirected => return Ok(None),
                Absorbed::Clean => {}
            }
            raw
        }
        ResumeKind::Throw => {
            let method = record.iterator().get_method("throw", context)?;
            match absorb_signal(gen, context)? {
                Absorbed::Finished(outcome) => return Ok(Some(outcome)),
                Absorbed::Redirected => return Ok(None),
                Absorbed::Clean => {}
            }
            let Some(method) = method else {
                // No `throw`: close the sub-iterator and raise in the
                // outer generator.
                record.close(context)?;
                context.throw(
                    JsNativeError::typ()
                        .with_message("The iterator does not provide a 'throw' method"),
                )?;
                return match absorb_signal(gen, context)? {
                    Absorbed::Finished(outcome) => Ok(Some(outcome)),
                    _ => Ok(None),
                };
            };
            let raw = crate::eval::call::call_function(
                &method,
                &iterator_value,
                &[payload.value],
                context,
            )?;
            match absorb_signal(gen, context)? {
                Absorbed::Finished(outcome) => return Ok(Some(outcome)),
                Absorbed::Redirected => return Ok(None),
                Absorbed::Clean => {}
            }
            raw
        }
        ResumeKind::Return => {
            let method = record.iterator().get_method("return", context)?;
            match absorb_signal(gen, context)? {
                Absorbed::Finished(outcome) => return Ok(Some(outcome)),
                Absorbed::Redirected => return Ok(None),
                Absorbed::Clean => {}
            }
            let Some(method) = method else {
                return handle_abrupt(gen, Abrupt::Return(payload.value), context);
            };
            let raw = crate::eval::call::call_function(
                &method,
                &iterator_value,
                &[payload.value],
                context,
            )?;
            match absorb_signal(gen, context)? {
                Absorbed::Finished(outcome) => return Ok(Some(outcome)),
                Absorbed::Redirected => return Ok(None),
                Absorbed::Clean => {}
            }
            return match unwrap_result(raw, context)? {
                Unwrapped::Done(value) => handle_abrupt(gen, Abrupt::Return(value), context),
                Unwrapped::Value(value) => {
                    gen.suspended_site = None;
                    Ok(Some(StepOutcome::Yielded(value)))
                }
                Unwrapped::Stopped => match absorb_signal(gen, context)? {
                    Absorbed::Finished(outcome) => Ok(Some(outcome)),
                    _ => Ok(None),
                },
            };
        }
    };

    match unwrap_result(raw, context)? {
        Unwrapped::Done(value) => {
            if let Some(slot) = gen.slots.get_mut(result_slot) {
                *slot = Some(SlotValue::Value(value));
            }
            gen.pc = next;
            Ok(None)
        }
        Unwrapped::Value(value) => {
            gen.suspended_site = None;
            Ok(Some(StepOutcome::Yielded(value)))
        }
        Unwrapped::Stopped => match absorb_signal(gen, context)? {
            Absorbed::Finished(outcome) => Ok(Some(outcome)),
            _ => Ok(None),
        },
    }
}

enum Unwrapped {
    Value(JsValue),
    Done(JsValue),
    Stopped,
}

fn unwrap_result(raw: JsValue, context: &mut Context) -> EvalResult<Unwrapped> {
    let Some(result) = raw.as_object().cloned() else {
        context
            .throw(JsNativeError::typ().with_message("iterator result is not an object"))?;
        return Ok(Unwrapped::Stopped);
    };
    let done = result.get("done", context)?.to_boolean();
    if context.should_stop() {
        return Ok(Unwrapped::Stopped);
    }
    let value = result.get("value", context)?;
    if context.should_stop() {
        return Ok(Unwrapped::Stopped);
    }
    Ok(if done {
        Unwrapped::Done(value)
    } else {
        Unwrapped::Value(value)
    })
}

/// One pass over a lowered loop's move-next: unwinds the previous
/// iteration scope, pulls a value (possibly through an await), and binds
/// the loop head.
fn step_move_next(
    gen: &mut GeneratorContext,
    slot: usize,
    init: &krait_ast::statement::IterableLoopInitializer,
    break_target: usize,
    next: usize,
    context: &mut Context,
) -> EvalResult<Option<StepOutcome>> {
    let base_len = match gen.slots.get(slot) {
        Some(Some(SlotValue::Iter(IterDriver::Proto { base_len, .. })))
        | Some(Some(SlotValue::Iter(IterDriver::Enumerate { base_len, .. }))) => *base_len,
        _ => return Err(Fault::Invariant("loop driver slot vanished".into())),
    };
    truncate_scopes(gen, base_len);

    // An await-resume payload carries the settled iterator result.
    let resumed = gen.pending_resume.take();

    let stepped: Option<JsValue> = if let Some(payload) = resumed {
        match payload.kind {
            ResumeKind::Throw => {
                return handle_abrupt(gen, Abrupt::Throw(payload.value), context);
            }
            ResumeKind::Return => {
                return handle_abrupt(gen, Abrupt::Return(payload.value), context);
            }
            ResumeKind::Normal => match unwrap_result(payload.value, context)? {
                Unwrapped::Done(_) => None,
                Unwrapped::Value(value) => Some(value),
                Unwrapped::Stopped => {
                    return match absorb_signal(gen, context)? {
                        Absorbed::Finished(outcome) => Ok(Some(outcome)),
                        _ => Ok(None),
                    };
                }
            },
        }
    } else {
        let driver_step = {
            let Some(Some(SlotValue::Iter(driver))) = gen.slots.get_mut(slot) else {
                return Err(Fault::Invariant("loop driver slot vanished".into()));
            };
            match driver {
                IterDriver::Enumerate { enumerator, .. } => {
                    DriverStep::Ready(enumerator.step().map(JsValue::from))
                }
                IterDriver::Proto { record, kind, .. } => {
                    if *kind == IterKind::Async {
                        DriverStep::NeedsRaw(record.clone())
                    } else {
                        DriverStep::Sync(record.clone())
                    }
                }
            }
        };
        match driver_step {
            DriverStep::Ready(value) => value,
            DriverStep::Sync(mut record) => {
                let value = record.step(context)?;
                write_back_record(gen, slot, record);
                match absorb_signal(gen, context)? {
                    Absorbed::Finished(outcome) => return Ok(Some(outcome)),
                    Absorbed::Redirected => return Ok(None),
                    Absorbed::Clean => {}
                }
                value
            }
            DriverStep::NeedsRaw(mut record) => {
                let raw = record.step_raw(None, context)?;
                write_back_record(gen, slot, record);
                match absorb_signal(gen, context)? {
                    Absorbed::Finished(outcome) => return Ok(Some(outcome)),
                    Absorbed::Redirected => return Ok(None),
                    Absorbed::Clean => {}
                }
                let scheduler = context.scheduler();
                match scheduler.try_await(&raw, context)? {
                    AwaitOutcome::Resolved(settled) => match unwrap_result(settled, context)? {
                        Unwrapped::Done(_) => None,
                        Unwrapped::Value(value) => Some(value),
                        Unwrapped::Stopped => {
                            return match absorb_signal(gen, context)? {
                                Absorbed::Finished(outcome) => Ok(Some(outcome)),
                                _ => Ok(None),
                            };
                        }
                    },
                    AwaitOutcome::Settled => {
                        return match absorb_signal(gen, context)? {
                            Absorbed::Finished(outcome) => Ok(Some(outcome)),
                            _ => Ok(None),
                        };
                    }
                    AwaitOutcome::Pending(promise) => {
                        gen.suspended_site = None;
                        return Ok(Some(StepOutcome::Pending(promise)));
                    }
                }
            }
        }
    };

    let Some(value) = stepped else {
        gen.pc = break_target;
        return Ok(None);
    };

    // The per-iteration scope.
    let base = current_env(gen);
    let bound = eval::bind_iteration_value(init, value, &base, context)?;
    let body_env = if std::rc::Rc::ptr_eq(&bound, &base) {
        DeclarativeEnvironment::new_block(base)
    } else {
        bound
    };
    gen.env_stack.push(body_env);
    match absorb_signal(gen, context)? {
        Absorbed::Finished(outcome) => return Ok(Some(outcome)),
        Absorbed::Redirected => return Ok(None),
        Absorbed::Clean => {}
    }
    gen.pc = next;
    Ok(None)
}

enum DriverStep {
    Ready(Option<JsValue>),
    Sync(IteratorRecord),
    NeedsRaw(IteratorRecord),
}

fn write_back_record(gen: &mut GeneratorContext, slot: usize, record: IteratorRecord) {
    if let Some(Some(SlotValue::Iter(IterDriver::Proto { record: stored, .. }))) =
        gen.slots.get_mut(slot)
    {
        *stored = record;
    }
}
