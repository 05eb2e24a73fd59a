use krait_ast::builder::*;
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};

#[test]
fn block_functions_get_a_var_side_binding() {
    // { function f() { return 5 } } typeof f
    run_test_actions([
        TestAction::run(program(stmt_list![block(stmt_list![func_decl(
            "f",
            params(&[]),
            stmt_list![ret(5)],
        )])])),
        TestAction::assert_eq(program(stmt_list![stmt(type_of(ident("f")))]), "function"),
        TestAction::assert_eq(program(stmt_list![stmt(call(ident("f"), vec![]))]), 5),
    ]);
}

#[test]
fn var_side_binding_is_undefined_before_the_block_runs() {
    // typeof f is "undefined" before the block evaluates its declaration.
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("before", Some(type_of(ident("f"))))]),
            block(stmt_list![func_decl("f", params(&[]), stmt_list![])]),
            stmt(add(add(ident("before"), ";"), type_of(ident("f")))),
        ]),
        "undefined;function",
    )]);
}

#[test]
fn lexical_names_block_the_var_side_binding() {
    // let f = 1; { function f() {} } -- the block binding stays local.
    run_test_actions([
        TestAction::run(program(stmt_list![
            let_decl([("f", Some(1.into()))]),
            block(stmt_list![func_decl("f", params(&[]), stmt_list![])]),
        ])),
        TestAction::assert_eq(program(stmt_list![stmt(type_of(ident("f")))]), "number"),
    ]);
}

#[test]
fn simple_catch_parameters_are_permeable() {
    // try { throw 1 } catch (f) { { function f() { return 7 } } }
    run_test_actions([
        TestAction::run(program(stmt_list![try_catch(
            stmt_list![throw(1)],
            Some(id("f").into()),
            stmt_list![block(stmt_list![func_decl(
                "f",
                params(&[]),
                stmt_list![ret(7)],
            )])],
        )])),
        TestAction::assert_eq(program(stmt_list![stmt(type_of(ident("f")))]), "function"),
        TestAction::assert_eq(program(stmt_list![stmt(call(ident("f"), vec![]))]), 7),
    ]);
}

#[test]
fn destructured_catch_parameters_block() {
    // try { throw { f: 1 } } catch ({ f }) { { function f() {} } }
    run_test_actions([
        TestAction::run(program(stmt_list![try_catch(
            stmt_list![throw(object(vec![prop("f", 1)]))],
            Some(object_binding(&["f"]).into()),
            stmt_list![block(stmt_list![func_decl(
                "f",
                params(&[]),
                stmt_list![],
            )])],
        )])),
        TestAction::assert_eq(program(stmt_list![stmt(type_of(ident("f")))]), "undefined"),
    ]);
}

#[test]
fn strict_mode_keeps_block_functions_lexical() {
    run_test_actions([TestAction::assert_eq(
        strict_program(stmt_list![
            block(stmt_list![func_decl("f", params(&[]), stmt_list![])]),
            stmt(type_of(ident("f"))),
        ]),
        "undefined",
    )]);
}

#[test]
fn block_functions_inside_functions() {
    // function outer() { { function inner() { return 3 } } return inner() }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl(
                "outer",
                params(&[]),
                stmt_list![
                    block(stmt_list![func_decl(
                        "inner",
                        params(&[]),
                        stmt_list![ret(3)],
                    )]),
                    ret(call(ident("inner"), vec![])),
                ],
            ),
            stmt(call(ident("outer"), vec![])),
        ]),
        3,
    )]);
}

#[test]
fn annex_b_can_be_disabled() {
    let mut context = crate::Context::builder().annex_b(false).build();
    super::run_test_actions_with(
        [
            TestAction::run(program(stmt_list![block(stmt_list![func_decl(
                "f",
                params(&[]),
                stmt_list![],
            )])])),
            TestAction::assert_eq(program(stmt_list![stmt(type_of(ident("f")))]), "undefined"),
        ],
        &mut context,
    );
}
