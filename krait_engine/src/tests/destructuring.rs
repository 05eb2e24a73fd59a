use krait_ast::builder::*;
use krait_ast::expression::Ident;
use krait_ast::pattern::{ArrayPatternElement, ObjectPatternElement};
use krait_ast::property::PropertyName;
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};
use crate::ErrorKind;

#[test]
fn array_pattern_defaults() {
    // const [a = 1, b = 2] = [undefined]; [a, b]
    run_test_actions([
        TestAction::run(program(stmt_list![const_pattern(
            array_pattern(vec![
                ArrayPatternElement::SingleName {
                    ident: Ident::new("a"),
                    default_init: Some(1.into()),
                },
                ArrayPatternElement::SingleName {
                    ident: Ident::new("b"),
                    default_init: Some(2.into()),
                },
            ]),
            array(vec![undefined()]),
        )])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("a"))]), 1),
        TestAction::assert_eq(program(stmt_list![stmt(ident("b"))]), 2),
    ]);
}

#[test]
fn array_pattern_binds_positionally() {
    run_test_actions([
        TestAction::run(program(stmt_list![let_pattern(
            array_binding(&["x", "y"]),
            array(vec![1.into(), 2.into(), 3.into()]),
        )])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("x"))]), 1),
        TestAction::assert_eq(program(stmt_list![stmt(ident("y"))]), 2),
    ]);
}

#[test]
fn array_rest_collects_the_tail() {
    run_test_actions([
        TestAction::run(program(stmt_list![const_pattern(
            array_pattern(vec![
                ArrayPatternElement::SingleName {
                    ident: Ident::new("first"),
                    default_init: None,
                },
                ArrayPatternElement::SingleNameRest {
                    ident: Ident::new("rest"),
                },
            ]),
            array(vec![1.into(), 2.into(), 3.into()]),
        )])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("first"))]), 1),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("rest"), "length"))]),
            2,
        ),
        TestAction::assert_eq(program(stmt_list![stmt(index(ident("rest"), 0))]), 2),
    ]);
}

#[test]
fn object_pattern_binds_and_renames() {
    // const { a, b: c, d = 4 } = { a: 1, b: 2 }; a + c + d
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            const_pattern(
                object_pattern(vec![
                    ObjectPatternElement::SingleName {
                        name: PropertyName::from("a"),
                        ident: Ident::new("a"),
                        default_init: None,
                    },
                    ObjectPatternElement::SingleName {
                        name: PropertyName::from("b"),
                        ident: Ident::new("c"),
                        default_init: None,
                    },
                    ObjectPatternElement::SingleName {
                        name: PropertyName::from("d"),
                        ident: Ident::new("d"),
                        default_init: Some(4.into()),
                    },
                ]),
                object(vec![prop("a", 1), prop("b", 2)]),
            ),
            stmt(add(add(ident("a"), ident("c")), ident("d"))),
        ]),
        7,
    )]);
}

#[test]
fn nested_patterns() {
    // const { a: [x, y] } = { a: [1, 2] }; x + y
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            const_pattern(
                object_pattern(vec![ObjectPatternElement::Pattern {
                    name: PropertyName::from("a"),
                    pattern: array_binding(&["x", "y"]),
                    default_init: None,
                }]),
                object(vec![prop("a", array(vec![1.into(), 2.into()]))]),
            ),
            stmt(add(ident("x"), ident("y"))),
        ]),
        3,
    )]);
}

#[test]
fn object_rest_excludes_consumed_keys() {
    // const { a, ...rest } = { a: 1, b: 2, c: 3 }
    run_test_actions([
        TestAction::run(program(stmt_list![const_pattern(
            object_pattern(vec![
                ObjectPatternElement::SingleName {
                    name: PropertyName::from("a"),
                    ident: Ident::new("a"),
                    default_init: None,
                },
                ObjectPatternElement::RestProperty {
                    ident: Ident::new("rest"),
                },
            ]),
            object(vec![prop("a", 1), prop("b", 2), prop("c", 3)]),
        )])),
        TestAction::assert_eq(
            program(stmt_list![stmt(add(
                member(ident("rest"), "b"),
                member(ident("rest"), "c"),
            ))]),
            5,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(
                member(ident("rest"), "hasOwnProperty"),
                vec!["a".into()],
            ))]),
            false,
        ),
    ]);
}

#[test]
fn assignment_patterns_write_existing_bindings() {
    // var a, b; [a, b] = [1, 2]
    run_test_actions([
        TestAction::run(program(stmt_list![
            var_decl([("a", None), ("b", None)]),
            stmt(assign(
                array_binding(&["a", "b"]),
                array(vec![1.into(), 2.into()]),
            )),
        ])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("a"))]), 1),
        TestAction::assert_eq(program(stmt_list![stmt(ident("b"))]), 2),
    ]);
}

#[test]
fn swap_through_an_array_pattern() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            let_decl([("a", Some(1.into())), ("b", Some(2.into()))]),
            stmt(assign(
                array_binding(&["a", "b"]),
                array(vec![ident("b"), ident("a")]),
            )),
        ])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("a"))]), 2),
        TestAction::assert_eq(program(stmt_list![stmt(ident("b"))]), 1),
    ]);
}

#[test]
fn assignment_pattern_targets_properties() {
    // var o = {}; [o.x] = [5]; o.x
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("o", Some(object(vec![])))]),
            stmt(assign(
                array_pattern(vec![ArrayPatternElement::PropertyAccess {
                    access: member(ident("o"), "x"),
                    default_init: None,
                }]),
                array(vec![5.into()]),
            )),
            stmt(member(ident("o"), "x")),
        ]),
        5,
    )]);
}

#[test]
fn destructuring_null_fails() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![let_pattern(object_binding(&["a"]), null())]),
        ErrorKind::Type,
        "Cannot destructure 'undefined' or 'null'",
    )]);
}

#[test]
fn iterator_close_runs_exactly_once() {
    // A never-ending iterator: destructuring a finite pattern must call
    // its `return` exactly once per destructuring.
    let make_iterable = program(stmt_list![
        var_decl([("returns", Some(0.into()))]),
        var_decl([(
            "iterable",
            Some(object(vec![computed_prop(
                member(ident("Symbol"), "iterator"),
                func_expr(
                    None,
                    params(&[]),
                    stmt_list![ret(object(vec![
                        prop(
                            "next",
                            func_expr(
                                None,
                                params(&[]),
                                stmt_list![ret(object(vec![
                                    prop("value", 1),
                                    prop("done", false),
                                ]))],
                            ),
                        ),
                        prop(
                            "return",
                            func_expr(
                                None,
                                params(&[]),
                                stmt_list![
                                    stmt(assign_op(
                                        krait_ast::operator::AssignOp::Add,
                                        id("returns"),
                                        1,
                                    )),
                                    ret(object(vec![prop("done", true)])),
                                ],
                            ),
                        ),
                    ]))],
                ),
            )])),
        )]),
    ]);

    run_test_actions([
        TestAction::run(make_iterable),
        // Normal completion of a shorter pattern closes the iterator.
        TestAction::run(program(stmt_list![let_pattern(
            array_binding(&["a"]),
            ident("iterable"),
        )])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("returns"))]), 1),
        // An abrupt completion (a throwing default) also closes it, once.
        TestAction::run(program(stmt_list![try_catch(
            stmt_list![let_pattern(
                array_pattern(vec![
                    ArrayPatternElement::SingleName {
                        ident: Ident::new("q"),
                        default_init: None,
                    },
                    ArrayPatternElement::Pattern {
                        // Array-destructuring a number throws: numbers are
                        // not iterable.
                        pattern: array_binding(&["nope"]),
                        default_init: None,
                    },
                ]),
                ident("iterable"),
            )],
            Some(id("e").into()),
            stmt_list![],
        )])),
        TestAction::assert_eq(program(stmt_list![stmt(ident("returns"))]), 2),
    ]);
}
