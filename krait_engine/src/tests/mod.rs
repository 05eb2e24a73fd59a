//! The engine test-suite.
//!
//! Programs are assembled with the `krait_ast` builder (there is no parser
//! in this repository) and driven through [`TestAction`] batches sharing
//! one context, so later actions observe the globals of earlier ones.

mod annex_b;
mod async_generator;
mod classes;
mod control_flow;
mod destructuring;
mod env;
mod errors;
mod function;
mod generators;
mod iterators;
mod operators;

use krait_ast::Program;

use crate::{Context, ErrorKind, EvalError, JsValue};

/// One step of a test scenario.
pub(crate) enum TestAction {
    /// Runs a program, asserting it does not throw.
    Run(Program),

    /// Runs a program, asserting its completion value is `true`.
    Assert(Program),

    /// Runs a program, asserting its completion value.
    AssertEq(Program, JsValue),

    /// Runs a program, asserting it throws a native error of the given
    /// kind and message.
    AssertNativeError(Program, ErrorKind, &'static str),

    /// Runs a program and hands its completion value to a predicate.
    AssertWithOp(Program, fn(JsValue, &mut Context) -> bool),

    /// Runs arbitrary operations on the context (e.g. draining jobs).
    InspectContext(fn(&mut Context)),
}

impl TestAction {
    pub(crate) const fn run(program: Program) -> Self {
        Self::Run(program)
    }

    pub(crate) const fn assert(program: Program) -> Self {
        Self::Assert(program)
    }

    pub(crate) fn assert_eq<V: Into<JsValue>>(program: Program, expected: V) -> Self {
        Self::AssertEq(program, expected.into())
    }

    pub(crate) const fn assert_native_error(
        program: Program,
        kind: ErrorKind,
        message: &'static str,
    ) -> Self {
        Self::AssertNativeError(program, kind, message)
    }

    pub(crate) const fn assert_with_op(
        program: Program,
        op: fn(JsValue, &mut Context) -> bool,
    ) -> Self {
        Self::AssertWithOp(program, op)
    }

    pub(crate) const fn inspect_context(op: fn(&mut Context)) -> Self {
        Self::InspectContext(op)
    }
}

/// Runs a batch of test actions over a fresh context.
#[track_caller]
pub(crate) fn run_test_actions(actions: impl IntoIterator<Item = TestAction>) {
    let mut context = Context::new();
    run_test_actions_with(actions, &mut context);
}

/// Runs a batch of test actions over the given context.
#[track_caller]
pub(crate) fn run_test_actions_with(
    actions: impl IntoIterator<Item = TestAction>,
    context: &mut Context,
) {
    for (index, action) in actions.into_iter().enumerate() {
        match action {
            TestAction::Run(program) => {
                if let Err(error) = context.eval(&program) {
                    panic!("action {index}: unexpected error `{error}`");
                }
            }
            TestAction::Assert(program) => match context.eval(&program) {
                Ok(value) => assert_eq!(
                    value,
                    JsValue::Boolean(true),
                    "action {index}: expected `true`, got `{value}`"
                ),
                Err(error) => panic!("action {index}: unexpected error `{error}`"),
            },
            TestAction::AssertEq(program, expected) => match context.eval(&program) {
                Ok(value) => assert_eq!(
                    value, expected,
                    "action {index}: expected `{expected}`, got `{value}`"
                ),
                Err(error) => panic!("action {index}: unexpected error `{error}`"),
            },
            TestAction::AssertNativeError(program, kind, message) => {
                match context.eval(&program) {
                    Ok(value) => {
                        panic!("action {index}: expected an error, got `{value}`")
                    }
                    Err(EvalError::Uncaught { value }) => {
                        let object = value
                            .as_object()
                            .unwrap_or_else(|| panic!("action {index}: thrown value is not an object"));
                        assert_eq!(
                            object.error_kind(),
                            Some(kind),
                            "action {index}: wrong error kind for `{value}`"
                        );
                        let found = object
                            .get_own_property(&crate::property::PropertyKey::from("message"))
                            .map(|descriptor| descriptor.expect_value().to_display_string())
                            .unwrap_or_default();
                        assert_eq!(found, message, "action {index}: wrong error message");
                    }
                    Err(error) => {
                        panic!("action {index}: expected a thrown error, got fault `{error}`")
                    }
                }
            }
            TestAction::AssertWithOp(program, op) => match context.eval(&program) {
                Ok(value) => {
                    assert!(op(value, context), "action {index}: predicate failed");
                }
                Err(error) => panic!("action {index}: unexpected error `{error}`"),
            },
            TestAction::InspectContext(op) => op(context),
        }
    }
}
