//! The statement/expression evaluator.
//!
//! A recursive dispatcher over the AST. Values are produced by return;
//! abrupt completions (`return`/`break`/`continue`/`throw`) travel through
//! the context [`Signal`] and are checked after every sub-evaluation. Host
//! faults propagate through `Result` and bypass user `catch`.

pub(crate) mod call;
pub(crate) mod class;
pub(crate) mod expression;
pub(crate) mod function;
pub(crate) mod hoisting;
pub(crate) mod operators;
pub(crate) mod pattern;

use krait_ast::{
    declaration::{Binding, Declaration, LexicalDeclaration},
    statement::{
        Case, ForLoopInitializer, IterableLoopInitializer, LabelledItem, Statement,
    },
    statement_list::{ExecutionKind, StatementListItem},
    Program,
};

use crate::{
    context::{Context, ScopeFrame, ScopeKind, ScopeMode, Signal},
    environments::{DeclarativeEnvironment, DefineOptions, Environment},
    error::{EvalError, EvalResult, JsNativeError},
    iterator::{get_iterator, ForInEnumerator, IteratorHint, IteratorRecord},
    string::JsString,
    value::JsValue,
};

pub use hoisting::{collect_block_names, BlockNames};

use self::expression::eval_expression;
use self::pattern::{bind_pattern_binding, BindingMode};

/// Options for [`evaluate_program`].
#[derive(Clone, Copy, Debug)]
pub struct EvalOptions {
    /// The kind of code being executed.
    pub execution_kind: ExecutionKind,

    /// Wrap strict programs in a fresh strict environment instead of
    /// executing directly against the passed one.
    pub create_strict_env: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            execution_kind: ExecutionKind::Script,
            create_strict_env: true,
        }
    }
}

/// Evaluates a program against an environment and returns its completion
/// value: the value of the last value-producing statement, or `undefined`.
///
/// An uncaught `Throw` signal, cancellation, or exceeding the call-depth
/// limit surface as [`EvalError`].
pub fn evaluate_program(
    program: &Program,
    env: &Environment,
    options: EvalOptions,
    context: &mut Context,
) -> Result<JsValue, EvalError> {
    context.set_source(program.source().clone());

    let strict =
        program.is_strict() || matches!(options.execution_kind, ExecutionKind::Module);
    let env = if strict && options.create_strict_env {
        DeclarativeEnvironment::new_function(env.clone(), true, None)
    } else {
        env.clone()
    };

    let annex_b = context.realm().annex_b() && !strict;
    context.push_scope_frame(ScopeFrame {
        kind: ScopeKind::Program,
        mode: if strict {
            ScopeMode::Strict
        } else if annex_b {
            ScopeMode::SloppyAnnexB
        } else {
            ScopeMode::Sloppy
        },
        skip_annex_b: !annex_b,
    });

    let result = eval_body(program.body().statements(), &env, annex_b, context);
    context.pop_scope_frame();

    let value = result?;
    match context.take_signal() {
        Signal::Empty => Ok(value),
        Signal::Throw(thrown) => Err(EvalError::Uncaught { value: thrown }),
        Signal::Return(value) => Ok(value),
        Signal::Break(_) | Signal::Continue(_) => Ok(JsValue::Undefined),
    }
}

/// Evaluates a program or function body against its (already function
/// scoped) environment: scans names, hoists, then runs the statements.
pub(crate) fn eval_body(
    items: &[StatementListItem],
    env: &Environment,
    annex_b: bool,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let names = hoisting::collect_block_names(items);
    env.set_body_lexical_names(names.lexical.clone());

    hoisting::declare_lexical_bindings(items, env, false, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    hoisting::hoist_declarations(items, env, annex_b, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    eval_statement_items(items, env, context)
}

fn eval_statement_items(
    items: &[StatementListItem],
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let mut completion = JsValue::Undefined;
    for item in items {
        context.check_cancelled()?;
        if let Some(value) = eval_statement_list_item(item, env, context)? {
            completion = value;
        }
        if context.should_stop() {
            break;
        }
    }
    Ok(completion)
}

/// Evaluates one statement or declaration. Returns `None` for items that
/// produce no completion value.
pub(crate) fn eval_statement_list_item(
    item: &StatementListItem,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    match item {
        StatementListItem::Statement(statement) => eval_statement(statement, env, context),
        StatementListItem::Declaration(declaration) => {
            eval_declaration(declaration, env, context)?;
            Ok(None)
        }
    }
}

fn eval_declaration(
    declaration: &Declaration,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    match declaration {
        Declaration::Function(function) => {
            // The binding was created during hoisting; what remains is the
            // Annex-B writeback of the block-level value to the var slot.
            let Some(ident) = function.name() else {
                return Ok(());
            };
            let name = JsString::from(ident.name());
            if env.is_function_scope() {
                return Ok(());
            }
            if annex_b_enabled(context) && !annex_b_blocked(env, &name) {
                if let Some(Some(value)) = env.own_binding_value(&name) {
                    let _ = env.try_assign_blocked_binding(&name, value);
                }
            }
            Ok(())
        }
        Declaration::Class(class) => {
            let value = class::eval_class(class, env, context)?;
            if context.should_stop() {
                return Ok(());
            }
            if let Some(ident) = class.name() {
                env.initialize(&ident.name().into(), value);
            }
            Ok(())
        }
        Declaration::Lexical(lexical) => {
            let is_const = lexical.is_const();
            for variable in lexical.variable_list().as_ref() {
                match variable.binding() {
                    Binding::Identifier(ident) => {
                        let value = match variable.init() {
                            Some(init) => {
                                let value = expression::eval_named_expression(
                                    init,
                                    Some(ident.name()),
                                    env,
                                    context,
                                )?;
                                if context.should_stop() {
                                    return Ok(());
                                }
                                value
                            }
                            None => JsValue::Undefined,
                        };
                        env.initialize(&ident.name().into(), value);
                    }
                    Binding::Pattern(pattern) => {
                        let Some(init) = variable.init() else {
                            context.throw(JsNativeError::syntax().with_message(
                                "Missing initializer in destructuring declaration",
                            ))?;
                            return Ok(());
                        };
                        let value = eval_expression(init, env, context)?;
                        if context.should_stop() {
                            return Ok(());
                        }
                        let mode = if is_const {
                            BindingMode::Const
                        } else {
                            BindingMode::Let
                        };
                        bind_pattern_binding(pattern, value, mode, env, context)?;
                        if context.should_stop() {
                            return Ok(());
                        }
                    }
                }
            }
            Ok(())
        }
    }
}

fn annex_b_enabled(context: &Context) -> bool {
    context
        .scope_frame()
        .is_some_and(|frame| matches!(frame.mode, ScopeMode::SloppyAnnexB) && !frame.skip_annex_b)
}

/// Returns `true` if a lexical binding between `env` and its function
/// scope blocks the Annex-B var-side assignment of `name`.
fn annex_b_blocked(env: &Environment, name: &JsString) -> bool {
    let mut current = env.clone();
    loop {
        // A lexical binding anywhere up to (and including) the function
        // scope blocks; the block-level binding of the function itself
        // doesn't count because it is not marked as a blocker.
        if current.blocks_annex_b_function(name) {
            return true;
        }
        if current.is_function_scope() {
            return false;
        }
        match current.parent() {
            Some(parent) => current = parent.clone(),
            None => return false,
        }
    }
}

/// Evaluates a statement. Returns `None` for statements that produce no
/// completion value.
pub(crate) fn eval_statement(
    statement: &Statement,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    eval_labelled_statement(statement, env, &[], context)
}

fn eval_labelled_statement(
    statement: &Statement,
    env: &Environment,
    labels: &[JsString],
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    match statement {
        Statement::Empty => Ok(None),

        Statement::Expression(expression) => {
            let value = eval_expression(expression, env, context)?;
            Ok(Some(value))
        }

        Statement::Var(declaration) => {
            for variable in declaration.0.as_ref() {
                match variable.binding() {
                    Binding::Identifier(ident) => {
                        if let Some(init) = variable.init() {
                            let value = expression::eval_named_expression(
                                init,
                                Some(ident.name()),
                                env,
                                context,
                            )?;
                            if context.should_stop() {
                                return Ok(None);
                            }
                            env.define_function_scoped(ident.name().into(), value, true);
                        }
                    }
                    Binding::Pattern(pattern) => {
                        let Some(init) = variable.init() else {
                            context.throw(JsNativeError::syntax().with_message(
                                "Missing initializer in destructuring declaration",
                            ))?;
                            return Ok(None);
                        };
                        let value = eval_expression(init, env, context)?;
                        if context.should_stop() {
                            return Ok(None);
                        }
                        bind_pattern_binding(pattern, value, BindingMode::Var, env, context)?;
                        if context.should_stop() {
                            return Ok(None);
                        }
                    }
                }
            }
            Ok(None)
        }

        Statement::Block(block) => eval_block(block.statement_list().statements(), env, context),

        Statement::If(node) => {
            let condition = eval_expression(node.cond(), env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            if condition.to_boolean() {
                eval_statement(node.body(), env, context)
            } else if let Some(else_node) = node.else_node() {
                eval_statement(else_node, env, context)
            } else {
                Ok(None)
            }
        }

        Statement::WhileLoop(node) => {
            let mut completion = None;
            loop {
                context.check_cancelled()?;
                let condition = eval_expression(node.condition(), env, context)?;
                if context.should_stop() {
                    break;
                }
                if !condition.to_boolean() {
                    break;
                }
                if let Some(value) = eval_statement(node.body(), env, context)? {
                    completion = Some(value);
                }
                if handle_loop_signal(labels, context) {
                    break;
                }
            }
            Ok(completion)
        }

        Statement::DoWhileLoop(node) => {
            let mut completion = None;
            loop {
                context.check_cancelled()?;
                if let Some(value) = eval_statement(node.body(), env, context)? {
                    completion = Some(value);
                }
                if handle_loop_signal(labels, context) {
                    break;
                }
                let condition = eval_expression(node.cond(), env, context)?;
                if context.should_stop() || !condition.to_boolean() {
                    break;
                }
            }
            Ok(completion)
        }

        Statement::ForLoop(node) => eval_for_loop(node, env, labels, context),

        Statement::ForInLoop(node) => eval_for_in(node, env, labels, context),

        Statement::ForOfLoop(node) => eval_for_of(node, env, labels, context),

        Statement::Switch(node) => eval_switch(node, env, labels, context),

        Statement::Continue(node) => {
            context.set_signal(Signal::Continue(
                node.label().map(|label| label.name().into()),
            ));
            Ok(None)
        }

        Statement::Break(node) => {
            context.set_signal(Signal::Break(
                node.label().map(|label| label.name().into()),
            ));
            Ok(None)
        }

        Statement::Return(node) => {
            let value = match node.target() {
                Some(target) => {
                    let value = eval_expression(target, env, context)?;
                    if context.should_stop() {
                        return Ok(None);
                    }
                    value
                }
                None => JsValue::Undefined,
            };
            context.set_signal(Signal::Return(value));
            Ok(None)
        }

        Statement::Labelled(node) => {
            let label = JsString::from(node.label().name());
            let mut all_labels: Vec<JsString> = labels.to_vec();
            all_labels.push(label.clone());
            let result = match node.item() {
                LabelledItem::Statement(statement) => {
                    eval_labelled_statement(statement, env, &all_labels, context)?
                }
                LabelledItem::Function(_) => None,
            };
            // A break targeting this label is consumed here.
            if let Signal::Break(Some(target)) = context.signal() {
                if *target == label {
                    let _ = context.take_signal();
                }
            }
            Ok(result)
        }

        Statement::Throw(node) => {
            context.set_source_ref(node.span());
            let value = eval_expression(node.target(), env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            context.throw_value(value);
            Ok(None)
        }

        Statement::Try(node) => eval_try(node, env, context),

        Statement::With(node) => {
            let object = eval_expression(node.expression(), env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            let Some(object) = object.as_object().cloned() else {
                context.throw(
                    JsNativeError::typ().with_message("Cannot apply 'with' to a primitive value"),
                )?;
                return Ok(None);
            };
            let with_env = DeclarativeEnvironment::new_with(env.clone(), object);
            eval_statement(node.statement(), &with_env, context)
        }
    }
}

/// Evaluates a block in a fresh scope.
pub(crate) fn eval_block(
    items: &[StatementListItem],
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    let block_env = DeclarativeEnvironment::new_block(env.clone());
    let names = hoisting::collect_block_names(items);
    block_env.set_body_lexical_names(names.lexical.clone());
    hoisting::declare_lexical_bindings(items, &block_env, true, context)?;
    if context.should_stop() {
        return Ok(None);
    }
    let value = eval_statement_items(items, &block_env, context)?;
    Ok(Some(value))
}

/// Consumes `continue` signals aimed at this loop. Returns `true` when the
/// loop should stop iterating.
fn handle_loop_signal(labels: &[JsString], context: &mut Context) -> bool {
    match context.signal() {
        Signal::Empty => false,
        Signal::Continue(None) => {
            let _ = context.take_signal();
            false
        }
        Signal::Continue(Some(label)) => {
            if labels.contains(label) {
                let _ = context.take_signal();
                false
            } else {
                true
            }
        }
        Signal::Break(None) => {
            let _ = context.take_signal();
            true
        }
        Signal::Break(Some(label)) => {
            if labels.contains(label) {
                let _ = context.take_signal();
            }
            true
        }
        Signal::Return(_) | Signal::Throw(_) => true,
    }
}

fn eval_for_loop(
    node: &krait_ast::statement::ForLoop,
    env: &Environment,
    labels: &[JsString],
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    // The loop head gets its own scope so `let` variables are fresh per
    // iteration for the closures the body creates.
    let head_env = DeclarativeEnvironment::new_block(env.clone());
    let mut per_iteration: Vec<JsString> = Vec::new();

    match node.init() {
        Some(ForLoopInitializer::Expression(expression)) => {
            eval_expression(expression, &head_env, context)?;
        }
        Some(ForLoopInitializer::Var(declaration)) => {
            eval_statement(&Statement::Var(declaration.clone()), &head_env, context)?;
        }
        Some(ForLoopInitializer::Lexical(lexical)) => {
            let is_const = lexical.is_const();
            for variable in lexical.variable_list().as_ref() {
                for ident in variable.idents() {
                    let name = JsString::from(ident.name());
                    if !is_const {
                        per_iteration.push(name.clone());
                    }
                    head_env.define_uninitialized(
                        name,
                        if is_const {
                            DefineOptions::constant()
                        } else {
                            DefineOptions::lexical()
                        },
                    );
                }
            }
            eval_declaration(&Declaration::Lexical(lexical.clone()), &head_env, context)?;
        }
        None => {}
    }
    if context.should_stop() {
        return Ok(None);
    }

    let mut completion = None;
    let mut iteration_env = copy_loop_env(&head_env, &per_iteration, env);
    loop {
        context.check_cancelled()?;

        if let Some(condition) = node.condition() {
            let condition = eval_expression(condition, &iteration_env, context)?;
            if context.should_stop() {
                break;
            }
            if !condition.to_boolean() {
                break;
            }
        }

        if let Some(value) = eval_statement(node.body(), &iteration_env, context)? {
            completion = Some(value);
        }
        if handle_loop_signal(labels, context) {
            break;
        }

        if let Some(final_expr) = node.final_expr() {
            eval_expression(final_expr, &iteration_env, context)?;
            if context.should_stop() {
                break;
            }
        }

        iteration_env = copy_loop_env(&iteration_env, &per_iteration, env);
    }
    Ok(completion)
}

/// Creates the next per-iteration environment, copying the loop variables'
/// current values.
fn copy_loop_env(
    previous: &Environment,
    per_iteration: &[JsString],
    parent: &Environment,
) -> Environment {
    if per_iteration.is_empty() {
        return previous.clone();
    }
    let next = DeclarativeEnvironment::new_block(parent.clone());
    for name in per_iteration {
        if let Some(Some(value)) = previous.own_binding_value(name) {
            next.define(name.clone(), value, DefineOptions::lexical());
        }
    }
    next
}

/// Binds one iteration value for a `for-in`/`for-of` head, returning the
/// environment the body runs in.
pub(crate) fn bind_iteration_value(
    initializer: &IterableLoopInitializer,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Environment> {
    match initializer {
        IterableLoopInitializer::Identifier(ident) => {
            expression::assign_identifier(ident.name(), value, env, context)?;
            Ok(env.clone())
        }
        IterableLoopInitializer::Access(access) => {
            expression::assign_property_access(access, value, env, context)?;
            Ok(env.clone())
        }
        IterableLoopInitializer::Var(binding) => {
            match binding {
                Binding::Identifier(ident) => {
                    env.define_function_scoped(ident.name().into(), value, true);
                }
                Binding::Pattern(pattern) => {
                    bind_pattern_binding(pattern, value, BindingMode::Var, env, context)?;
                }
            }
            Ok(env.clone())
        }
        IterableLoopInitializer::Let(binding) | IterableLoopInitializer::Const(binding) => {
            let mode = if matches!(initializer, IterableLoopInitializer::Const(_)) {
                BindingMode::Const
            } else {
                BindingMode::Let
            };
            let iter_env = DeclarativeEnvironment::new_block(env.clone());
            match binding {
                Binding::Identifier(ident) => {
                    let options = if matches!(mode, BindingMode::Const) {
                        DefineOptions::constant()
                    } else {
                        DefineOptions::lexical()
                    };
                    iter_env.define(ident.name().into(), value, options);
                }
                Binding::Pattern(pattern) => {
                    bind_pattern_binding(pattern, value, mode, &iter_env, context)?;
                }
            }
            Ok(iter_env)
        }
        IterableLoopInitializer::Pattern(pattern) => {
            pattern::assign_pattern(pattern, value, env, context)?;
            Ok(env.clone())
        }
    }
}

fn eval_for_in(
    node: &krait_ast::statement::ForInLoop,
    env: &Environment,
    labels: &[JsString],
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    let target = eval_expression(node.target(), env, context)?;
    if context.should_stop() {
        return Ok(None);
    }
    // `for-in` over null/undefined performs no iteration.
    if target.is_null_or_undefined() {
        return Ok(None);
    }

    let mut enumerator = ForInEnumerator::new(&target);
    let mut completion = None;
    loop {
        context.check_cancelled()?;
        let Some(key) = enumerator.step() else {
            break;
        };
        let body_env =
            bind_iteration_value(node.initializer(), key.into(), env, context)?;
        if context.should_stop() {
            break;
        }
        if let Some(value) = eval_statement(node.body(), &body_env, context)? {
            completion = Some(value);
        }
        if handle_loop_signal(labels, context) {
            break;
        }
    }
    Ok(completion)
}

fn eval_for_of(
    node: &krait_ast::statement::ForOfLoop,
    env: &Environment,
    labels: &[JsString],
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    let iterable = eval_expression(node.iterable(), env, context)?;
    if context.should_stop() {
        return Ok(None);
    }

    let hint = if node.r#await() {
        IteratorHint::Async
    } else {
        IteratorHint::Sync
    };
    let Some(mut record) = get_iterator(&iterable, hint, context)? else {
        return Ok(None);
    };

    let mut completion = None;
    loop {
        context.check_cancelled()?;
        let stepped = if node.r#await() {
            step_awaited(&mut record, env, context)?
        } else {
            record.step(context)?
        };
        if context.should_stop() {
            return Ok(completion);
        }
        let Some(value) = stepped else {
            break;
        };

        let body_env = bind_iteration_value(node.initializer(), value, env, context)?;
        if !context.should_stop() {
            if let Some(value) = eval_statement(node.body(), &body_env, context)? {
                completion = Some(value);
            }
        }

        match context.signal() {
            Signal::Empty => continue,
            Signal::Continue(None) => {
                let _ = context.take_signal();
                continue;
            }
            Signal::Continue(Some(label)) if labels.contains(label) => {
                let _ = context.take_signal();
                continue;
            }
            Signal::Break(None) => {
                let _ = context.take_signal();
                record.close(context)?;
                break;
            }
            Signal::Break(Some(label)) => {
                if labels.contains(label) {
                    let _ = context.take_signal();
                }
                record.close(context)?;
                break;
            }
            Signal::Return(_) | Signal::Throw(_) | Signal::Continue(Some(_)) => {
                record.close(context)?;
                break;
            }
        }
    }
    Ok(completion)
}

/// Pulls one result from an async iterator, awaiting the result object and
/// unwrapping it.
fn step_awaited(
    record: &mut IteratorRecord,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    let raw = record.step_raw(None, context)?;
    if context.should_stop() {
        return Ok(None);
    }
    let settled = expression::await_value(raw, env, context)?;
    if context.should_stop() {
        return Ok(None);
    }
    let Some(result) = settled.as_object().cloned() else {
        context.throw(JsNativeError::typ().with_message("iterator result is not an object"))?;
        return Ok(None);
    };
    let done = result.get("done", context)?.to_boolean();
    if context.should_stop() {
        return Ok(None);
    }
    if done {
        return Ok(None);
    }
    let value = result.get("value", context)?;
    if context.should_stop() {
        return Ok(None);
    }
    Ok(Some(value))
}

fn eval_switch(
    node: &krait_ast::statement::Switch,
    env: &Environment,
    labels: &[JsString],
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    let discriminant = eval_expression(node.val(), env, context)?;
    if context.should_stop() {
        return Ok(None);
    }

    // All clauses share one block scope.
    let switch_env = DeclarativeEnvironment::new_block(env.clone());
    for case in node.cases() {
        hoisting::declare_lexical_bindings(
            case.body().statements(),
            &switch_env,
            true,
            context,
        )?;
        if context.should_stop() {
            return Ok(None);
        }
    }

    // Find the matched clause: cases in order, then `default`.
    let mut start = None;
    for (index, case) in node.cases().iter().enumerate() {
        let Some(condition) = case.condition() else {
            continue;
        };
        let candidate = eval_expression(condition, &switch_env, context)?;
        if context.should_stop() {
            return Ok(None);
        }
        if discriminant.strict_equals(&candidate) {
            start = Some(index);
            break;
        }
    }
    if start.is_none() {
        start = node.cases().iter().position(Case::is_default);
    }
    let Some(start) = start else {
        return Ok(None);
    };

    // Execute from the matched clause onwards; fall-through included.
    let mut completion = None;
    'clauses: for case in &node.cases()[start..] {
        for item in case.body().statements() {
            context.check_cancelled()?;
            if let Some(value) = eval_statement_list_item(item, &switch_env, context)? {
                completion = Some(value);
            }
            if context.should_stop() {
                break 'clauses;
            }
        }
    }

    // An unlabelled break (or one naming an enclosing label) exits here.
    if let Signal::Break(label) = context.signal() {
        match label {
            None => {
                let _ = context.take_signal();
            }
            Some(label) => {
                if labels.contains(label) {
                    let _ = context.take_signal();
                }
            }
        }
    }
    Ok(completion)
}

fn eval_try(
    node: &krait_ast::statement::Try,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<JsValue>> {
    let mut completion = eval_block(node.block().statement_list().statements(), env, context)?;

    if matches!(context.signal(), Signal::Throw(_)) {
        if let Some(catch) = node.handler() {
            let thrown = match context.take_signal() {
                Signal::Throw(thrown) => thrown,
                other => {
                    context.set_signal(other);
                    return Ok(completion);
                }
            };
            let catch_env = DeclarativeEnvironment::new_block(env.clone());
            match catch.parameter() {
                Some(Binding::Identifier(ident)) => {
                    catch_env.define(
                        ident.name().into(),
                        thrown,
                        DefineOptions {
                            simple_catch: true,
                            ..DefineOptions::lexical()
                        },
                    );
                }
                Some(Binding::Pattern(pattern)) => {
                    bind_pattern_binding(pattern, thrown, BindingMode::Let, &catch_env, context)?;
                }
                None => {}
            }
            if !context.should_stop() {
                completion =
                    eval_block(catch.block().statement_list().statements(), &catch_env, context)?;
            }
        }
    }

    if let Some(finally) = node.finally() {
        // The finalizer observes but does not swallow the completion in
        // flight; its own abrupt completion supersedes it.
        let preserved = context.take_signal();
        eval_block(finally.block().statement_list().statements(), env, context)?;
        if !context.should_stop() {
            context.set_signal(preserved);
        }
    }

    Ok(completion)
}

// Re-exported for the harness and embedders that drive evaluation
// manually.
pub use call::{call_function, call_value, construct};
