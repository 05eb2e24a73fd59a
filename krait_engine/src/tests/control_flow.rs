use krait_ast::builder::*;
use krait_ast::operator::AssignOp;
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};
use crate::JsValue;

#[test]
fn if_else_branches() {
    run_test_actions([
        TestAction::assert_eq(
            program(stmt_list![if_stmt(true, stmt(1), Some(stmt(2)))]),
            1,
        ),
        TestAction::assert_eq(
            program(stmt_list![if_stmt(0, stmt(1), Some(stmt(2)))]),
            2,
        ),
        TestAction::assert_eq(
            program(stmt_list![if_stmt(false, stmt(1), None)]),
            JsValue::undefined(),
        ),
    ]);
}

#[test]
fn while_loop_accumulates() {
    // var i = 0, s = 0; while (i < 5) { i += 1; s += i } s
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("i", Some(0.into())), ("s", Some(0.into()))]),
            while_loop(
                lt(ident("i"), 5),
                block(stmt_list![
                    stmt(assign_op(AssignOp::Add, id("i"), 1)),
                    stmt(assign_op(AssignOp::Add, id("s"), ident("i"))),
                ]),
            ),
            stmt(ident("s")),
        ]),
        15,
    )]);
}

#[test]
fn do_while_runs_at_least_once() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("r", Some(0.into()))]),
            do_while(stmt(assign(id("r"), 1)), false),
            stmt(ident("r")),
        ]),
        1,
    )]);
}

#[test]
fn classic_for_loop() {
    // var s = 0; for (let i = 0; i < 5; i++) { s += i } s
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("s", Some(0.into()))]),
            for_loop(
                Some(for_let([("i", Some(0.into()))])),
                Some(lt(ident("i"), 5)),
                Some(update_ident(krait_ast::operator::UpdateOp::IncrementPost, "i")),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("s"), ident("i")))]),
            ),
            stmt(ident("s")),
        ]),
        10,
    )]);
}

#[test]
fn for_loop_let_bindings_are_per_iteration() {
    // var fns = []; for (let i = 0; i < 3; i++) { fns.push(function () { return i }) }
    // fns[0]() + fns[1]() + fns[2]()
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("fns", Some(array(vec![])))]),
            for_loop(
                Some(for_let([("i", Some(0.into()))])),
                Some(lt(ident("i"), 3)),
                Some(update_ident(krait_ast::operator::UpdateOp::IncrementPost, "i")),
                block(stmt_list![stmt(call(
                    member(ident("fns"), "push"),
                    vec![func_expr(None, params(&[]), stmt_list![ret(ident("i"))])],
                ))]),
            ),
            stmt(add(
                add(
                    call(index(ident("fns"), 0), vec![]),
                    call(index(ident("fns"), 1), vec![]),
                ),
                call(index(ident("fns"), 2), vec![]),
            )),
        ]),
        3,
    )]);
}

#[test]
fn break_exits_the_loop() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("i", Some(0.into()))]),
            while_loop(
                true,
                block(stmt_list![
                    stmt(assign_op(AssignOp::Add, id("i"), 1)),
                    if_stmt(le(5, ident("i")), break_stmt(None), None),
                ]),
            ),
            stmt(ident("i")),
        ]),
        5,
    )]);
}

#[test]
fn continue_skips_to_the_next_iteration() {
    // var s = 0; for (let i = 0; i < 5; i++) { if (i === 2) continue; s += i } s
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("s", Some(0.into()))]),
            for_loop(
                Some(for_let([("i", Some(0.into()))])),
                Some(lt(ident("i"), 5)),
                Some(update_ident(krait_ast::operator::UpdateOp::IncrementPost, "i")),
                block(stmt_list![
                    if_stmt(strict_eq(ident("i"), 2), continue_stmt(None), None),
                    stmt(assign_op(AssignOp::Add, id("s"), ident("i"))),
                ]),
            ),
            stmt(ident("s")),
        ]),
        8,
    )]);
}

#[test]
fn labelled_break_exits_nested_loops() {
    // outer: for (let i = 0; ...) { for (let j = 0; ...) { if (...) break outer; s += 1 } }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("s", Some(0.into()))]),
            label(
                "outer",
                for_loop(
                    Some(for_let([("i", Some(0.into()))])),
                    Some(lt(ident("i"), 3)),
                    Some(update_ident(krait_ast::operator::UpdateOp::IncrementPost, "i")),
                    block(stmt_list![for_loop(
                        Some(for_let([("j", Some(0.into()))])),
                        Some(lt(ident("j"), 3)),
                        Some(update_ident(
                            krait_ast::operator::UpdateOp::IncrementPost,
                            "j"
                        )),
                        block(stmt_list![
                            if_stmt(
                                strict_eq(ident("s"), 4),
                                break_stmt(Some("outer")),
                                None
                            ),
                            stmt(assign_op(AssignOp::Add, id("s"), 1)),
                        ]),
                    )]),
                ),
            ),
            stmt(ident("s")),
        ]),
        4,
    )]);
}

#[test]
fn labelled_continue_targets_the_outer_loop() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("s", Some(0.into()))]),
            label(
                "outer",
                for_loop(
                    Some(for_let([("i", Some(0.into()))])),
                    Some(lt(ident("i"), 3)),
                    Some(update_ident(krait_ast::operator::UpdateOp::IncrementPost, "i")),
                    block(stmt_list![
                        for_loop(
                            Some(for_let([("j", Some(0.into()))])),
                            Some(lt(ident("j"), 3)),
                            Some(update_ident(
                                krait_ast::operator::UpdateOp::IncrementPost,
                                "j"
                            )),
                            block(stmt_list![
                                if_stmt(
                                    strict_eq(ident("j"), 1),
                                    continue_stmt(Some("outer")),
                                    None
                                ),
                                stmt(assign_op(AssignOp::Add, id("s"), 1)),
                            ]),
                        ),
                        // Unreachable when the inner loop always continues
                        // the outer one at j === 1.
                        stmt(assign_op(AssignOp::Add, id("s"), 100)),
                    ]),
                ),
            ),
            stmt(ident("s")),
        ]),
        3,
    )]);
}

#[test]
fn switch_matches_and_falls_through() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("r", Some(0.into()))]),
            switch_stmt(
                2,
                vec![
                    case(1, stmt_list![stmt(assign(id("r"), 1))]),
                    case(2, stmt_list![stmt(assign(id("r"), 2))]),
                    case(3, stmt_list![stmt(assign_op(AssignOp::Add, id("r"), 10))]),
                ],
            ),
            stmt(ident("r")),
        ]),
        12,
    )]);
}

#[test]
fn switch_break_stops_fall_through() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("r", Some(0.into()))]),
            switch_stmt(
                1,
                vec![
                    case(
                        1,
                        stmt_list![stmt(assign(id("r"), 1)), break_stmt(None)],
                    ),
                    case(2, stmt_list![stmt(assign(id("r"), 2))]),
                ],
            ),
            stmt(ident("r")),
        ]),
        1,
    )]);
}

#[test]
fn switch_default_runs_when_nothing_matches() {
    // The default clause is only entered after every case fails, even when
    // it appears before later cases; fall-through continues from it.
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("r", Some(0.into()))]),
            switch_stmt(
                99,
                vec![
                    case(1, stmt_list![stmt(assign(id("r"), 1))]),
                    default_case(stmt_list![stmt(assign(id("r"), 50))]),
                    case(2, stmt_list![stmt(assign_op(AssignOp::Add, id("r"), 1))]),
                ],
            ),
            stmt(ident("r")),
        ]),
        51,
    )]);
}

#[test]
fn try_catch_catches() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("r", Some(0.into()))]),
            try_catch(
                stmt_list![throw(7)],
                Some(id("e").into()),
                stmt_list![stmt(assign(id("r"), ident("e")))],
            ),
            stmt(ident("r")),
        ]),
        7,
    )]);
}

#[test]
fn finally_runs_on_both_paths() {
    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([("log", Some("".into()))])])),
        TestAction::run(program(stmt_list![try_finally(
            stmt_list![stmt(assign_op(AssignOp::Add, id("log"), "t"))],
            stmt_list![stmt(assign_op(AssignOp::Add, id("log"), "f"))],
        )])),
        TestAction::run(program(stmt_list![try_catch_finally(
            stmt_list![throw(1)],
            Some(id("e").into()),
            stmt_list![stmt(assign_op(AssignOp::Add, id("log"), "c"))],
            stmt_list![stmt(assign_op(AssignOp::Add, id("log"), "F"))],
        )])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("log"))]), "tfcF"),
    ]);
}

#[test]
fn finally_observes_but_does_not_swallow_returns() {
    // function f() { try { return 1 } finally { mark = true } }
    run_test_actions([
        TestAction::run(program(stmt_list![
            var_decl([("mark", Some(false.into()))]),
            func_decl(
                "f",
                params(&[]),
                stmt_list![try_finally(
                    stmt_list![ret(1)],
                    stmt_list![stmt(assign(id("mark"), true))],
                )],
            ),
        ])),
        TestAction::assert_eq(program(stmt_list![stmt(call(ident("f"), vec![]))]), 1),
        TestAction::assert_eq(program(stmt_list![stmt(ident("mark"))]), true),
    ]);
}

#[test]
fn catch_parameter_destructures() {
    // try { throw { a: 1 } } catch ({ a }) { a }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![try_catch(
            stmt_list![throw(object(vec![prop("a", 1)]))],
            Some(object_binding(&["a"]).into()),
            stmt_list![stmt(ident("a"))],
        )]),
        1,
    )]);
}

#[test]
fn nested_try_rethrow() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("r", Some(0.into()))]),
            try_catch(
                stmt_list![try_catch(
                    stmt_list![throw(1)],
                    Some(id("e").into()),
                    stmt_list![throw(add(ident("e"), 1))],
                )],
                Some(id("e").into()),
                stmt_list![stmt(assign(id("r"), ident("e")))],
            ),
            stmt(ident("r")),
        ]),
        2,
    )]);
}

#[test]
fn empty_statement_produces_nothing() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            krait_ast::Statement::Empty,
            let_decl([("a", Some(10.into()))]),
            krait_ast::Statement::Empty,
            if_stmt(ident("a"), krait_ast::Statement::Empty, None),
            stmt(ident("a")),
        ]),
        10,
    )]);
}

#[test]
fn result_of_empty_block() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![block(stmt_list![])]),
        JsValue::undefined(),
    )]);
}
