use krait_ast::builder::*;
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};
use crate::{ErrorKind, JsValue};

#[test]
fn empty_var_decl_undefined() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![var_decl([("a", None)]), stmt(ident("a"))]),
        JsValue::undefined(),
    )]);
}

#[test]
fn empty_let_decl_undefined() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![let_decl([("a", None)]), stmt(ident("a"))]),
        JsValue::undefined(),
    )]);
}

#[test]
fn var_decl_hoisting_simple() {
    // x = 5; var x; x
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            stmt(assign(id("x"), 5)),
            var_decl([("x", None)]),
            stmt(ident("x")),
        ]),
        5,
    )]);
}

#[test]
fn var_decl_hoisting_with_initialization() {
    // x = 5; var x = 10; x
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            stmt(assign(id("x"), 5)),
            var_decl([("x", Some(10.into()))]),
            stmt(ident("x")),
        ]),
        10,
    )]);
}

#[test]
fn var_decl_hoisting_2_variables_hoisting() {
    // x = y; var x = 10; var y = 5; x
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            stmt(assign(id("x"), ident("y"))),
            var_decl([("x", Some(10.into()))]),
            var_decl([("y", Some(5.into()))]),
            stmt(ident("x")),
        ]),
        10,
    )]);
}

#[test]
fn var_decl_hoisting_uninitialized_read() {
    // var x = y; var y = 5; x
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("x", Some(ident("y")))]),
            var_decl([("y", Some(5.into()))]),
            stmt(ident("x")),
        ]),
        JsValue::undefined(),
    )]);
}

#[test]
fn function_decl_hoisting_in_block() {
    // { let a = hello(); function hello() { return 5 } a }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![block(stmt_list![
            let_decl([("a", Some(call(ident("hello"), vec![])))]),
            func_decl("hello", params(&[]), stmt_list![ret(5)]),
            stmt(ident("a")),
        ])]),
        5,
    )]);
}

#[test]
fn function_decl_hoisting_mutual_recursion() {
    // { let x = b(); function a() { return 5 } function b() { return a() } x }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![block(stmt_list![
            let_decl([("x", Some(call(ident("b"), vec![])))]),
            func_decl("a", params(&[]), stmt_list![ret(5)]),
            func_decl("b", params(&[]), stmt_list![ret(call(ident("a"), vec![]))]),
            stmt(ident("x")),
        ])]),
        5,
    )]);
}

#[test]
fn tdz_read_fails() {
    // { x; let x; }
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![block(stmt_list![
            stmt(ident("x")),
            let_decl([("x", None)]),
        ])]),
        ErrorKind::Reference,
        "Cannot access 'x' before initialization",
    )]);
}

#[test]
fn tdz_assignment_fails() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![block(stmt_list![
            stmt(assign(id("x"), 1)),
            let_decl([("x", None)]),
        ])]),
        ErrorKind::Reference,
        "Cannot access 'x' before initialization",
    )]);
}

#[test]
fn const_reassignment_fails() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![
            const_decl([("x", Some(1.into()))]),
            stmt(assign(id("x"), 2)),
        ]),
        ErrorKind::Type,
        "Cannot reassign constant 'x'",
    )]);
}

#[test]
fn duplicate_lexical_declaration_fails() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![block(stmt_list![
            let_decl([("a", None)]),
            let_decl([("a", None)]),
        ])]),
        ErrorKind::Syntax,
        "Identifier 'a' has already been declared",
    )]);
}

#[test]
fn restricted_global_shadowing_fails() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![let_decl([("undefined", None)])]),
        ErrorKind::Syntax,
        "Cannot declare a lexical binding named 'undefined'",
    )]);
}

#[test]
fn unresolved_identifier_fails() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![stmt(ident("bar"))]),
        ErrorKind::Reference,
        "bar is not defined",
    )]);
}

#[test]
fn block_scoped_shadowing() {
    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([("x", Some(1.into()))])])),
        TestAction::assert_eq(
            program(stmt_list![block(stmt_list![
                let_decl([("x", Some(2.into()))]),
                stmt(ident("x")),
            ])]),
            2,
        ),
        // The block binding shadows; the outer var is untouched.
        TestAction::assert_eq(program(stmt_list![stmt(ident("x"))]), 1),
    ]);
}

#[test]
fn sloppy_assignment_creates_global_property() {
    run_test_actions([
        TestAction::run(program(stmt_list![stmt(assign(id("accidental"), 42))])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("globalThis"), "accidental"))]),
            42,
        ),
    ]);
}

#[test]
fn strict_assignment_to_undeclared_fails() {
    run_test_actions([TestAction::assert_native_error(
        strict_program(stmt_list![stmt(assign(id("zzz"), 1))]),
        ErrorKind::Reference,
        "zzz is not defined",
    )]);
}

#[test]
fn delete_of_global_object_property() {
    run_test_actions([
        TestAction::run(program(stmt_list![stmt(assign(id("gone"), 1))])),
        TestAction::assert(program(stmt_list![stmt(unary(
            krait_ast::operator::UnaryOp::Delete,
            ident("gone")
        ))]),),
        TestAction::assert_eq(program(stmt_list![stmt(type_of(ident("gone")))]), "undefined"),
    ]);
}

#[test]
fn with_statement_lookup_and_assignment() {
    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([(
            "o",
            Some(object(vec![prop("a", 10)])),
        )])])),
        TestAction::assert_eq(
            program(stmt_list![with_stmt(ident("o"), stmt(ident("a")))]),
            10,
        ),
        TestAction::run(program(stmt_list![with_stmt(
            ident("o"),
            stmt(assign(id("a"), 20)),
        )])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("o"), "a"))]),
            20,
        ),
    ]);
}

#[test]
fn with_statement_falls_through_to_outer_scope() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            var_decl([("o", Some(object(vec![prop("a", 1)])))]),
            var_decl([("b", Some(5.into()))]),
        ])),
        TestAction::assert_eq(
            program(stmt_list![with_stmt(ident("o"), stmt(add(ident("a"), ident("b"))))]),
            6,
        ),
    ]);
}

#[test]
fn closures_capture_their_environment() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            func_decl(
                "make_counter",
                params(&[]),
                stmt_list![
                    var_decl([("c", Some(0.into()))]),
                    ret(func_expr(
                        None,
                        params(&[]),
                        stmt_list![
                            stmt(assign_op(krait_ast::operator::AssignOp::Add, id("c"), 1)),
                            ret(ident("c")),
                        ],
                    )),
                ],
            ),
            var_decl([("tick", Some(call(ident("make_counter"), vec![])))]),
        ])),
        TestAction::assert_eq(program(stmt_list![stmt(call(ident("tick"), vec![]))]), 1),
        TestAction::assert_eq(program(stmt_list![stmt(call(ident("tick"), vec![]))]), 2),
        TestAction::assert_eq(program(stmt_list![stmt(call(ident("tick"), vec![]))]), 3),
    ]);
}

#[test]
fn object_field_set() {
    // let m = {}; m['key'] = 22; m['key']
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            let_decl([("m", Some(object(vec![])))]),
            stmt(assign(index(ident("m"), "key"), 22)),
            stmt(index(ident("m"), "key")),
        ]),
        22,
    )]);
}

#[test]
fn array_field_set() {
    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([("m", None)])])),
        // element changes
        TestAction::assert_eq(
            program(stmt_list![
                stmt(assign(id("m"), array(vec![1.into(), 2.into(), 3.into()]))),
                stmt(assign(index(ident("m"), 1), 5)),
                stmt(index(ident("m"), 1)),
            ]),
            5,
        ),
        // length changes
        TestAction::assert_eq(
            program(stmt_list![
                stmt(assign(id("m"), array(vec![1.into(), 2.into(), 3.into()]))),
                stmt(assign(index(ident("m"), 10), 52)),
                stmt(member(ident("m"), "length")),
            ]),
            11,
        ),
        // negative index won't affect length
        TestAction::assert_eq(
            program(stmt_list![
                stmt(assign(id("m"), array(vec![1.into(), 2.into(), 3.into()]))),
                stmt(assign(index(ident("m"), -11), 5)),
                stmt(member(ident("m"), "length")),
            ]),
            3,
        ),
        // non-numeric key won't affect length
        TestAction::assert_eq(
            program(stmt_list![
                stmt(assign(id("m"), array(vec![1.into(), 2.into(), 3.into()]))),
                stmt(assign(index(ident("m"), "magic"), 5)),
                stmt(member(ident("m"), "length")),
            ]),
            3,
        ),
    ]);
}

#[test]
fn pre_linked_module_namespaces_are_consumable() {
    use crate::environments::DefineOptions;
    use crate::object::JsObject;
    use crate::symbol::JsSymbol;
    use crate::Context;

    let mut context = Context::new();
    let namespace = JsObject::module_namespace(
        vec![("answer".into(), JsValue::from(42))],
        JsSymbol::to_string_tag(),
    );
    context.realm().global_environment().define(
        "mod".into(),
        namespace.into(),
        DefineOptions::constant(),
    );

    super::run_test_actions_with(
        [
            TestAction::assert_eq(
                program(stmt_list![stmt(member(ident("mod"), "answer"))]),
                42,
            ),
            // The namespace is frozen: writes through it are rejected.
            TestAction::assert_eq(
                program(stmt_list![
                    stmt(assign(member(ident("mod"), "missing"), 1)),
                    stmt(type_of(member(ident("mod"), "missing"))),
                ]),
                "undefined",
            ),
        ],
        &mut context,
    );
}

#[test]
fn hoisting_is_idempotent() {
    use crate::eval::collect_block_names;
    use krait_ast::StatementListItem;

    let body = stmt_list![
        let_decl([("a", None)]),
        const_decl([("b", Some(1.into()))]),
        var_decl([("c", None)]),
        try_catch(stmt_list![], Some(id("e").into()), stmt_list![]),
    ];
    let items: &[StatementListItem] = body.statements();

    let first = collect_block_names(items);
    let second = collect_block_names(items);
    assert_eq!(first.lexical, second.lexical);
    assert_eq!(first.catch_params, second.catch_params);
    assert_eq!(first.simple_catch, second.simple_catch);
    assert!(first.lexical.contains("a"));
    assert!(first.lexical.contains("b"));
    assert!(!first.lexical.contains("c"));
    assert!(first.simple_catch.contains("e"));
}
