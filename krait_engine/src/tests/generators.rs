use krait_ast::builder::*;
use krait_ast::operator::AssignOp;
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};
use crate::{ErrorKind, JsValue};

#[test]
fn next_produces_yielded_values_in_order() {
    // function* g() { yield 1; yield 2 }
    run_test_actions([
        TestAction::run(program(stmt_list![
            gen_decl(
                "g",
                params(&[]),
                stmt_list![stmt(yield_(1)), stmt(yield_(2))],
            ),
            const_decl([("it", Some(call(ident("g"), vec![])))]),
        ])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                call(member(ident("it"), "next"), vec![]),
                "value",
            ))]),
            1,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                call(member(ident("it"), "next"), vec![]),
                "value",
            ))]),
            2,
        ),
        // The third entry completes the generator.
        TestAction::run(program(stmt_list![var_decl([(
            "last",
            Some(call(member(ident("it"), "next"), vec![])),
        )])])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("last"), "done"))]),
            true,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("last"), "value"))]),
            JsValue::undefined(),
        ),
        // And every entry after completion stays completed.
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                call(member(ident("it"), "next"), vec![]),
                "done",
            ))]),
            true,
        ),
    ]);
}

#[test]
fn resume_values_flow_back_in() {
    // function* g() { const a = yield 1; yield a + 1 }
    run_test_actions([
        TestAction::run(program(stmt_list![
            gen_decl(
                "g",
                params(&[]),
                stmt_list![
                    const_decl([("a", Some(yield_(1)))]),
                    stmt(yield_(add(ident("a"), 1))),
                ],
            ),
            const_decl([("it", Some(call(ident("g"), vec![])))]),
            stmt(call(member(ident("it"), "next"), vec![])),
        ])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                call(member(ident("it"), "next"), vec![10.into()]),
                "value",
            ))]),
            11,
        ),
    ]);
}

#[test]
fn generators_are_iterable() {
    // for-of drives the generator through the iterator protocol.
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            gen_decl(
                "g",
                params(&[]),
                stmt_list![stmt(yield_(1)), stmt(yield_(2)), stmt(yield_(3))],
            ),
            var_decl([("s", Some(0.into()))]),
            for_of(
                of_const("v"),
                call(ident("g"), vec![]),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("s"), ident("v")))]),
            ),
            stmt(ident("s")),
        ]),
        6,
    )]);
}

#[test]
fn loops_inside_generators() {
    // function* g() { for (let i = 0; i < 3; i++) { yield i } }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            gen_decl(
                "g",
                params(&[]),
                stmt_list![for_loop(
                    Some(for_let([("i", Some(0.into()))])),
                    Some(lt(ident("i"), 3)),
                    Some(update_ident(
                        krait_ast::operator::UpdateOp::IncrementPost,
                        "i"
                    )),
                    block(stmt_list![stmt(yield_(ident("i")))]),
                )],
            ),
            var_decl([("s", Some(0.into()))]),
            for_of(
                of_const("v"),
                call(ident("g"), vec![]),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("s"), ident("v")))]),
            ),
            stmt(ident("s")),
        ]),
        3,
    )]);
}

#[test]
fn while_and_break_inside_generators() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            gen_decl(
                "g",
                params(&[]),
                stmt_list![
                    var_decl([("i", Some(0.into()))]),
                    while_loop(
                        true,
                        block(stmt_list![
                            stmt(assign_op(AssignOp::Add, id("i"), 1)),
                            if_stmt(lt(3, ident("i")), break_stmt(None), None),
                            stmt(yield_(ident("i"))),
                        ]),
                    ),
                ],
            ),
            var_decl([("log", Some("".into()))]),
            for_of(
                of_const("v"),
                call(ident("g"), vec![]),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("log"), ident("v")))]),
            ),
            stmt(ident("log")),
        ]),
        "123",
    )]);
}

#[test]
fn yield_star_delegates_and_produces_the_return_value() {
    // function* inner() { yield 1; yield 2; return 3 }
    // function* outer() { const r = yield* inner(); yield r }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            gen_decl(
                "inner",
                params(&[]),
                stmt_list![stmt(yield_(1)), stmt(yield_(2)), ret(3)],
            ),
            gen_decl(
                "outer",
                params(&[]),
                stmt_list![
                    const_decl([("r", Some(yield_star(call(ident("inner"), vec![]))))]),
                    stmt(yield_(ident("r"))),
                ],
            ),
            var_decl([("log", Some("".into()))]),
            for_of(
                of_const("v"),
                call(ident("outer"), vec![]),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("log"), ident("v")))]),
            ),
            stmt(ident("log")),
        ]),
        "123",
    )]);
}

#[test]
fn return_entry_runs_finally_blocks() {
    // function* g() { try { yield 1 } finally { cleaned = true } }
    run_test_actions([
        TestAction::run(program(stmt_list![
            var_decl([("cleaned", Some(false.into()))]),
            gen_decl(
                "g",
                params(&[]),
                stmt_list![try_finally(
                    stmt_list![stmt(yield_(1))],
                    stmt_list![stmt(assign(id("cleaned"), true))],
                )],
            ),
            const_decl([("it", Some(call(ident("g"), vec![])))]),
            stmt(call(member(ident("it"), "next"), vec![])),
            var_decl([(
                "r",
                Some(call(member(ident("it"), "return"), vec![5.into()])),
            )]),
        ])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("cleaned"))]), true),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("r"), "value"))]),
            5,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("r"), "done"))]),
            true,
        ),
    ]);
}

#[test]
fn throw_entry_dispatches_to_catch() {
    // function* g() { try { yield 1 } catch (e) { yield e + 1 } }
    run_test_actions([
        TestAction::run(program(stmt_list![
            gen_decl(
                "g",
                params(&[]),
                stmt_list![try_catch(
                    stmt_list![stmt(yield_(1))],
                    Some(id("e").into()),
                    stmt_list![stmt(yield_(add(ident("e"), 1)))],
                )],
            ),
            const_decl([("it", Some(call(ident("g"), vec![])))]),
            stmt(call(member(ident("it"), "next"), vec![])),
            var_decl([(
                "r",
                Some(call(member(ident("it"), "throw"), vec![10.into()])),
            )]),
        ])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("r"), "value"))]),
            11,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("r"), "done"))]),
            false,
        ),
    ]);
}

#[test]
fn throw_before_start_completes_the_generator() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            gen_decl("g", params(&[]), stmt_list![stmt(yield_(1))]),
            const_decl([("it", Some(call(ident("g"), vec![])))]),
            var_decl([("caught", Some(0.into()))]),
            try_catch(
                stmt_list![stmt(call(member(ident("it"), "throw"), vec![9.into()]))],
                Some(id("e").into()),
                stmt_list![stmt(assign(id("caught"), ident("e")))],
            ),
        ])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("caught"))]), 9),
        // The generator is completed afterwards.
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                call(member(ident("it"), "next"), vec![]),
                "done",
            ))]),
            true,
        ),
    ]);
}

#[test]
fn reentrant_next_is_a_type_error() {
    // function* g() { yield it.next() } -- entering a running generator.
    run_test_actions([
        TestAction::run(program(stmt_list![
            gen_decl(
                "g",
                params(&[]),
                stmt_list![stmt(yield_(call(member(ident("it"), "next"), vec![])))],
            ),
            var_decl([("it", Some(call(ident("g"), vec![])))]),
        ])),
        TestAction::assert_native_error(
            program(stmt_list![stmt(call(member(ident("it"), "next"), vec![]))]),
            ErrorKind::Type,
            "Generator is already executing",
        ),
    ]);
}

#[test]
fn generator_method_on_non_generator_fails() {
    // Stealing `next` and calling it on a plain object.
    run_test_actions([
        TestAction::run(program(stmt_list![
            gen_decl("g", params(&[]), stmt_list![]),
            var_decl([("n", Some(member(call(ident("g"), vec![]), "next").into()))]),
        ])),
        TestAction::assert_native_error(
            program(stmt_list![stmt(call(
                member(ident("n"), "call"),
                vec![object(vec![])],
            ))]),
            ErrorKind::Type,
            "Generator method called on non generator",
        ),
    ]);
}

#[test]
fn yields_inside_expressions_replay_correctly() {
    // function* g() { const a = (yield 1) + (yield 2); yield a }
    run_test_actions([
        TestAction::run(program(stmt_list![
            gen_decl(
                "g",
                params(&[]),
                stmt_list![
                    const_decl([("a", Some(add(yield_(1), yield_(2))))]),
                    stmt(yield_(ident("a"))),
                ],
            ),
            const_decl([("it", Some(call(ident("g"), vec![])))]),
        ])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                call(member(ident("it"), "next"), vec![]),
                "value",
            ))]),
            1,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                call(member(ident("it"), "next"), vec![10.into()]),
                "value",
            ))]),
            2,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                call(member(ident("it"), "next"), vec![20.into()]),
                "value",
            ))]),
            30,
        ),
    ]);
}

#[test]
fn generator_parameters_bind_at_the_call() {
    // function* g(a) { yield a } -- the argument is bound when g() runs,
    // before the first next().
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            gen_decl("g", params(&["a"]), stmt_list![stmt(yield_(ident("a")))]),
            stmt(member(
                call(
                    member(call(ident("g"), vec![7.into()]), "next"),
                    vec![],
                ),
                "value",
            )),
        ]),
        7,
    )]);
}
