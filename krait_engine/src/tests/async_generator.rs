use krait_ast::builder::*;
use krait_ast::operator::AssignOp;
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};
use crate::builtins::promise::{promise_state, PromiseState};
use crate::{Context, JsValue};

#[track_caller]
fn assert_fulfilled_with(promise: &JsValue, expected: &JsValue) {
    let object = promise.as_object().expect("expected a promise object");
    let Some(PromiseState::Fulfilled(value)) = promise_state(object) else {
        panic!("promise was not fulfilled");
    };
    assert_eq!(&value, expected);
}

fn drain_jobs(context: &mut Context) {
    context.run_jobs().expect("job queue drained");
}

#[test]
fn async_functions_return_promises() {
    // async function f() { return (await Promise.resolve(1)) + 1 }
    run_test_actions([
        TestAction::run(program(stmt_list![
            async_decl(
                "f",
                params(&[]),
                stmt_list![ret(add(
                    await_(call(
                        member(ident("Promise"), "resolve"),
                        vec![1.into()],
                    )),
                    1,
                ))],
            ),
            var_decl([("p", Some(call(ident("f"), vec![])))]),
        ])),
        TestAction::inspect_context(drain_jobs),
        TestAction::assert_with_op(program(stmt_list![stmt(ident("p"))]), |value, _| {
            assert_fulfilled_with(&value, &JsValue::from(2));
            true
        }),
    ]);
}

#[test]
fn async_functions_reject_on_synchronous_throws() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            async_decl("f", params(&[]), stmt_list![throw("boom")]),
            var_decl([("p", Some(call(ident("f"), vec![])))]),
        ])),
        TestAction::assert_with_op(program(stmt_list![stmt(ident("p"))]), |value, _| {
            let object = value.as_object().expect("expected a promise object");
            matches!(
                promise_state(object),
                Some(PromiseState::Rejected(reason)) if reason == JsValue::from("boom")
            )
        }),
    ]);
}

#[test]
fn await_of_a_rejected_promise_throws_into_the_body() {
    // async function g() { try { await Promise.reject(5) } catch (e) { return e + 1 } }
    run_test_actions([
        TestAction::run(program(stmt_list![
            async_decl(
                "g",
                params(&[]),
                stmt_list![try_catch(
                    stmt_list![stmt(await_(call(
                        member(ident("Promise"), "reject"),
                        vec![5.into()],
                    )))],
                    Some(id("e").into()),
                    stmt_list![ret(add(ident("e"), 1))],
                )],
            ),
            var_decl([("p", Some(call(ident("g"), vec![])))]),
        ])),
        TestAction::inspect_context(drain_jobs),
        TestAction::assert_with_op(program(stmt_list![stmt(ident("p"))]), |value, _| {
            assert_fulfilled_with(&value, &JsValue::from(6));
            true
        }),
    ]);
}

#[test]
fn await_of_a_pending_promise_suspends_until_settlement() {
    // var resolve; var gate = new Promise(r => resolve = r);
    // async function f() { out = await gate }
    run_test_actions([
        TestAction::run(program(stmt_list![
            var_decl([("resolve", None), ("out", Some(0.into()))]),
            var_decl([(
                "gate",
                Some(new_(
                    ident("Promise"),
                    vec![arrow(
                        params(&["r"]),
                        stmt_list![stmt(assign(id("resolve"), ident("r")))],
                    )],
                )),
            )]),
            async_decl(
                "f",
                params(&[]),
                stmt_list![stmt(assign(id("out"), await_(ident("gate"))))],
            ),
            stmt(call(ident("f"), vec![])),
        ])),
        // Still pending: the body parked at the await.
        TestAction::assert_eq(program(stmt_list![stmt(ident("out"))]), 0),
        TestAction::run(program(stmt_list![stmt(call(
            ident("resolve"),
            vec![42.into()],
        ))])),
        TestAction::inspect_context(drain_jobs),
        TestAction::assert_eq(program(stmt_list![stmt(ident("out"))]), 42),
    ]);
}

#[test]
fn non_thenables_resolve_immediately() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            async_decl("f", params(&[]), stmt_list![ret(await_(7))]),
            var_decl([("p", Some(call(ident("f"), vec![])))]),
        ])),
        TestAction::inspect_context(drain_jobs),
        TestAction::assert_with_op(program(stmt_list![stmt(ident("p"))]), |value, _| {
            assert_fulfilled_with(&value, &JsValue::from(7));
            true
        }),
    ]);
}

#[test]
fn async_generators_yield_through_for_await() {
    // async function* ag() { yield await Promise.resolve(1); yield 2 }
    // async function drive() { for await (const v of ag()) out.push(v) }
    run_test_actions([
        TestAction::run(program(stmt_list![
            var_decl([("out", Some(array(vec![])))]),
            async_gen_decl(
                "ag",
                params(&[]),
                stmt_list![
                    stmt(yield_(await_(call(
                        member(ident("Promise"), "resolve"),
                        vec![1.into()],
                    )))),
                    stmt(yield_(2)),
                ],
            ),
            async_decl(
                "drive",
                params(&[]),
                stmt_list![for_await_of(
                    of_const("v"),
                    call(ident("ag"), vec![]),
                    block(stmt_list![stmt(call(
                        member(ident("out"), "push"),
                        vec![ident("v")],
                    ))]),
                )],
            ),
            stmt(call(ident("drive"), vec![])),
        ])),
        TestAction::inspect_context(drain_jobs),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(
                member(ident("out"), "join"),
                vec![",".into()],
            ))]),
            "1,2",
        ),
    ]);
}

#[test]
fn async_generator_next_returns_promises() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            async_gen_decl("ag", params(&[]), stmt_list![stmt(yield_(1))]),
            var_decl([("it", Some(call(ident("ag"), vec![])))]),
            var_decl([("p", Some(call(member(ident("it"), "next"), vec![])))]),
        ])),
        TestAction::inspect_context(drain_jobs),
        TestAction::assert_with_op(program(stmt_list![stmt(ident("p"))]), |value, context| {
            let object = value.as_object().expect("expected a promise object");
            let Some(PromiseState::Fulfilled(result)) = promise_state(object) else {
                return false;
            };
            let result = result.as_object().expect("expected an iterator result");
            let value = result
                .get("value", context)
                .expect("value read succeeds");
            let done = result.get("done", context).expect("done read succeeds");
            value == JsValue::from(1) && done == JsValue::Boolean(false)
        }),
    ]);
}

#[test]
fn async_generator_return_settles_done() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            async_gen_decl("ag", params(&[]), stmt_list![stmt(yield_(1))]),
            var_decl([("it", Some(call(ident("ag"), vec![])))]),
            var_decl([(
                "p",
                Some(call(member(ident("it"), "return"), vec![9.into()])),
            )]),
        ])),
        TestAction::inspect_context(drain_jobs),
        TestAction::assert_with_op(program(stmt_list![stmt(ident("p"))]), |value, context| {
            let object = value.as_object().expect("expected a promise object");
            let Some(PromiseState::Fulfilled(result)) = promise_state(object) else {
                return false;
            };
            let result = result.as_object().expect("expected an iterator result");
            let value = result
                .get("value", context)
                .expect("value read succeeds");
            let done = result.get("done", context).expect("done read succeeds");
            value == JsValue::from(9) && done == JsValue::Boolean(true)
        }),
    ]);
}

#[test]
fn thenables_are_adopted_by_await() {
    // A plain object with a callable `then` awaits like a promise.
    run_test_actions([
        TestAction::run(program(stmt_list![
            var_decl([(
                "thenable",
                Some(object(vec![prop(
                    "then",
                    func_expr(
                        None,
                        params(&["res"]),
                        stmt_list![stmt(call(ident("res"), vec![11.into()]))],
                    ),
                )])),
            )]),
            async_decl("f", params(&[]), stmt_list![ret(await_(ident("thenable")))]),
            var_decl([("p", Some(call(ident("f"), vec![])))]),
        ])),
        TestAction::inspect_context(drain_jobs),
        TestAction::assert_with_op(program(stmt_list![stmt(ident("p"))]), |value, _| {
            assert_fulfilled_with(&value, &JsValue::from(11));
            true
        }),
    ]);
}
