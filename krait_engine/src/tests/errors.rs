use krait_ast::builder::*;
use krait_ast::stmt_list;

use super::{run_test_actions, run_test_actions_with, TestAction};
use crate::{
    CancellationToken, Context, ErrorKind, EvalError, Fault, JsValue, RuntimeLimits,
};

#[test]
fn thrown_errors_are_instances_of_their_constructor() {
    // try { throw new TypeError('x') } catch (e) { e instanceof TypeError }
    run_test_actions([TestAction::assert(program(stmt_list![try_catch(
        stmt_list![throw(new_(ident("TypeError"), vec!["x".into()]))],
        Some(id("e").into()),
        stmt_list![stmt(instance_of(ident("e"), ident("TypeError")))],
    )]),)]);
}

#[test]
fn error_objects_carry_name_and_message() {
    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([(
            "e",
            Some(new_(ident("Error"), vec!["boom".into()])),
        )])])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("e"), "message"))]),
            "boom",
        ),
        TestAction::assert_eq(program(stmt_list![stmt(member(ident("e"), "name"))]), "Error"),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(member(ident("e"), "toString"), vec![]))]),
            "Error: boom",
        ),
    ]);
}

#[test]
fn subtype_errors_inherit_from_error() {
    run_test_actions([
        TestAction::assert(program(stmt_list![stmt(instance_of(
            new_(ident("RangeError"), vec![]),
            ident("Error")
        ))]),),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                new_(ident("ReferenceError"), vec![]),
                "name",
            ))]),
            "ReferenceError",
        ),
    ]);
}

#[test]
fn any_value_can_be_thrown() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![try_catch(
            stmt_list![throw(add(40, 2))],
            Some(id("e").into()),
            stmt_list![stmt(ident("e"))],
        )]),
        42,
    )]);
}

#[test]
fn uncaught_throws_surface_to_the_host() {
    let mut context = Context::new();
    let result = context.eval(&program(stmt_list![throw(new_(
        ident("TypeError"),
        vec!["broken".into()],
    ))]));
    match result {
        Err(EvalError::Uncaught { value }) => {
            assert_eq!(value.to_display_string(), "TypeError: broken");
        }
        other => panic!("expected an uncaught error, got {other:?}"),
    }
}

#[test]
fn finally_does_not_swallow_throws() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![try_finally(
            stmt_list![throw(new_(ident("TypeError"), vec!["kept".into()]))],
            stmt_list![stmt(1)],
        )]),
        ErrorKind::Type,
        "kept",
    )]);
}

#[test]
fn catch_rethrow_replaces_the_error() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![try_catch(
            stmt_list![throw(new_(ident("TypeError"), vec!["inner".into()]))],
            Some(id("e").into()),
            stmt_list![throw(new_(ident("RangeError"), vec!["outer".into()]))],
        )]),
        ErrorKind::Range,
        "outer",
    )]);
}

#[test]
fn cancellation_is_uncatchable() {
    let token = CancellationToken::new();
    token.cancel();
    let mut context = Context::builder().cancellation(token).build();

    // Even a try/catch around the whole body cannot observe cancellation.
    let result = context.eval(&program(stmt_list![try_catch(
        stmt_list![stmt(1)],
        Some(id("e").into()),
        stmt_list![stmt(2)],
    )]));
    assert!(matches!(
        result,
        Err(EvalError::Fault(Fault::Cancelled))
    ));
}

#[test]
fn cancellation_stops_loops() {
    let token = CancellationToken::new();
    let mut context = Context::builder().cancellation(token.clone()).build();

    // The loop body cancels the evaluation itself through a host function.
    run_test_actions_with(
        [TestAction::run(program(stmt_list![var_decl([(
            "i",
            Some(0.into()),
        )])]))],
        &mut context,
    );
    token.cancel();
    let result = context.eval(&program(stmt_list![while_loop(
        true,
        stmt(assign(id("i"), add(ident("i"), 1))),
    )]));
    assert!(matches!(
        result,
        Err(EvalError::Fault(Fault::Cancelled))
    ));
}

#[test]
fn call_depth_overflow_is_a_fault() {
    let mut limits = RuntimeLimits::default();
    limits.set_max_call_depth(64);
    let mut context = Context::builder().limits(limits).build();

    let result = context.eval(&program(stmt_list![
        func_decl(
            "f",
            params(&[]),
            stmt_list![ret(call(ident("f"), vec![]))],
        ),
        stmt(call(ident("f"), vec![])),
    ]));
    match result {
        Err(EvalError::Fault(fault @ Fault::CallDepthExceeded)) => {
            assert_eq!(fault.to_string(), "Exceeded maximum call depth");
        }
        other => panic!("expected a call-depth fault, got {other:?}"),
    }
}

#[test]
fn call_depth_faults_bypass_user_catch() {
    let mut limits = RuntimeLimits::default();
    limits.set_max_call_depth(64);
    let mut context = Context::builder().limits(limits).build();

    let result = context.eval(&program(stmt_list![
        func_decl(
            "f",
            params(&[]),
            stmt_list![ret(call(ident("f"), vec![]))],
        ),
        try_catch(
            stmt_list![stmt(call(ident("f"), vec![]))],
            Some(id("e").into()),
            stmt_list![stmt("caught")],
        ),
    ]));
    assert!(matches!(
        result,
        Err(EvalError::Fault(Fault::CallDepthExceeded))
    ));
}

#[test]
fn pure_expressions_are_stable_across_evaluations() {
    // Evaluating the same pure expression twice yields identical values.
    let mut context = Context::new();
    let pure = program(stmt_list![stmt(add(mul(3, 7), cond(lt(1, 2), 10, 20)))]);
    let first = context.eval(&pure).expect("first evaluation");
    let second = context.eval(&pure).expect("second evaluation");
    assert_eq!(first, second);
    assert_eq!(first, JsValue::from(31));
}

#[test]
fn host_faults_render_their_messages() {
    assert_eq!(Fault::Cancelled.to_string(), "evaluation cancelled");
    assert_eq!(
        Fault::CallDepthExceeded.to_string(),
        "Exceeded maximum call depth"
    );
}
