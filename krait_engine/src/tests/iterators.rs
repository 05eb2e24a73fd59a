use krait_ast::builder::*;
use krait_ast::operator::AssignOp;
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};
use crate::ErrorKind;

#[test]
fn for_of_over_arrays() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("s", Some(0.into()))]),
            for_of(
                of_const("v"),
                array(vec![1.into(), 2.into(), 3.into()]),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("s"), ident("v")))]),
            ),
            stmt(ident("s")),
        ]),
        6,
    )]);
}

#[test]
fn for_of_over_strings() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("s", Some("".into()))]),
            for_of(
                of_const("c"),
                "abc",
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("s"), ident("c")))]),
            ),
            stmt(ident("s")),
        ]),
        "abc",
    )]);
}

#[test]
fn for_of_over_custom_iterables() {
    // An iterable counting down from 3.
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([(
                "countdown",
                Some(object(vec![computed_prop(
                    member(ident("Symbol"), "iterator"),
                    func_expr(
                        None,
                        params(&[]),
                        stmt_list![
                            var_decl([("n", Some(4.into()))]),
                            ret(object(vec![prop(
                                "next",
                                func_expr(
                                    None,
                                    params(&[]),
                                    stmt_list![
                                        stmt(assign_op(AssignOp::Sub, id("n"), 1)),
                                        ret(object(vec![
                                            prop("value", ident("n")),
                                            prop("done", strict_eq(ident("n"), 0)),
                                        ])),
                                    ],
                                ),
                            )])),
                        ],
                    ),
                )])),
            )]),
            var_decl([("log", Some("".into()))]),
            for_of(
                of_const("v"),
                ident("countdown"),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("log"), ident("v")))]),
            ),
            stmt(ident("log")),
        ]),
        "321",
    )]);
}

#[test]
fn for_of_break_closes_the_iterator() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("closed", Some(false.into()))]),
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
                                        stmt(assign(id("closed"), true)),
                                        ret(object(vec![prop("done", true)])),
                                    ],
                                ),
                            ),
                        ]))],
                    ),
                )])),
            )]),
            for_of(
                of_const("v"),
                ident("iterable"),
                block(stmt_list![break_stmt(None)]),
            ),
            stmt(ident("closed")),
        ]),
        true,
    )]);
}

#[test]
fn for_of_defensive_iterator_fallback() {
    // An object with `next` but no @@iterator is treated as the iterator.
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("s", Some(0.into()))]),
            var_decl([("n", Some(0.into()))]),
            var_decl([(
                "fake",
                Some(object(vec![prop(
                    "next",
                    func_expr(
                        None,
                        params(&[]),
                        stmt_list![
                            stmt(assign_op(AssignOp::Add, id("n"), 1)),
                            ret(object(vec![
                                prop("value", ident("n")),
                                prop("done", lt(2, ident("n"))),
                            ])),
                        ],
                    ),
                )])),
            )]),
            for_of(
                of_const("v"),
                ident("fake"),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("s"), ident("v")))]),
            ),
            stmt(ident("s")),
        ]),
        3,
    )]);
}

#[test]
fn for_of_non_iterable_fails() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![for_of(of_const("v"), 5, block(stmt_list![]))]),
        ErrorKind::Type,
        "Value is not iterable",
    )]);
}

#[test]
fn for_in_walks_the_prototype_chain() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl("B", params(&[]), stmt_list![]),
            stmt(assign(
                member(member(ident("B"), "prototype"), "inherited"),
                1,
            )),
            var_decl([("o", Some(new_(ident("B"), vec![])))]),
            stmt(assign(member(ident("o"), "own"), 2)),
            var_decl([("log", Some("".into()))]),
            for_in(
                of_const("k"),
                ident("o"),
                block(stmt_list![
                    stmt(assign_op(AssignOp::Add, id("log"), ident("k"))),
                    stmt(assign_op(AssignOp::Add, id("log"), ";")),
                ]),
            ),
            stmt(ident("log")),
        ]),
        "own;inherited;",
    )]);
}

#[test]
fn for_in_skips_shadowed_keys() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl("B", params(&[]), stmt_list![]),
            stmt(assign(member(member(ident("B"), "prototype"), "k"), 1)),
            var_decl([("o", Some(new_(ident("B"), vec![])))]),
            stmt(assign(member(ident("o"), "k"), 2)),
            var_decl([("count", Some(0.into()))]),
            for_in(
                of_const("k"),
                ident("o"),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("count"), 1))]),
            ),
            stmt(ident("count")),
        ]),
        1,
    )]);
}

#[test]
fn for_in_over_nullish_does_nothing() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("count", Some(0.into()))]),
            for_in(
                of_const("k"),
                null(),
                block(stmt_list![stmt(assign_op(AssignOp::Add, id("count"), 1))]),
            ),
            stmt(ident("count")),
        ]),
        0,
    )]);
}

#[test]
fn spread_in_calls() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl(
                "f",
                params(&["a", "b", "c"]),
                stmt_list![ret(add(add(ident("a"), ident("b")), ident("c")))],
            ),
            stmt(call(
                ident("f"),
                vec![spread(array(vec![1.into(), 2.into(), 3.into()]))],
            )),
        ]),
        6,
    )]);
}

#[test]
fn spread_in_array_literals() {
    run_test_actions([
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                array(vec![0.into(), spread(array(vec![1.into(), 2.into()]))]),
                "length",
            ))]),
            3,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(
                member(
                    array(vec![0.into(), spread(array(vec![1.into(), 2.into()]))]),
                    "join",
                ),
                vec![",".into()],
            ))]),
            "0,1,2",
        ),
    ]);
}

#[test]
fn left_to_right_element_evaluation() {
    // [a(), b(), c()] runs the three functions in order, exactly once.
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("log", Some("".into()))]),
            func_decl(
                "a",
                params(&[]),
                stmt_list![stmt(assign_op(AssignOp::Add, id("log"), "a")), ret(1)],
            ),
            func_decl(
                "b",
                params(&[]),
                stmt_list![stmt(assign_op(AssignOp::Add, id("log"), "b")), ret(2)],
            ),
            func_decl(
                "c",
                params(&[]),
                stmt_list![stmt(assign_op(AssignOp::Add, id("log"), "c")), ret(3)],
            ),
            var_decl([(
                "arr",
                Some(array(vec![
                    call(ident("a"), vec![]),
                    call(ident("b"), vec![]),
                    call(ident("c"), vec![]),
                ])),
            )]),
            stmt(add(ident("log"), member(ident("arr"), "length"))),
        ]),
        "abc3",
    )]);
}

#[test]
fn optional_chaining_short_circuits() {
    use krait_ast::Expression;

    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([("o", Some(null().into()))])])),
        // o?.a is undefined, and the chain cut skips the rest.
        TestAction::assert_eq(
            program(stmt_list![stmt(Expression::PropertyAccess(opt_member(
                ident("o"),
                "a"
            )))]),
            crate::JsValue::undefined(),
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(Expression::PropertyAccess(
                member(
                    Expression::PropertyAccess(opt_member(ident("o"), "a")),
                    "b",
                ),
            ))]),
            crate::JsValue::undefined(),
        ),
        // A nullish callee with ?.() also short-circuits.
        TestAction::assert_eq(
            program(stmt_list![
                var_decl([("q", Some(object(vec![])))]),
                stmt(opt_call(member(ident("q"), "missing").optional(), vec![])),
            ]),
            crate::JsValue::undefined(),
        ),
        // Without the optional marker, a nullish base throws.
        TestAction::assert_native_error(
            program(stmt_list![stmt(member(ident("o"), "a"))]),
            ErrorKind::Type,
            "Cannot read properties of null or undefined",
        ),
    ]);
}

#[test]
fn template_literals() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            let_decl([("a", Some(10.into()))]),
            stmt(template(vec![
                tpl_str("result: "),
                tpl_expr(ident("a")),
                tpl_str(" and "),
                tpl_expr(add(ident("a"), 10)),
            ])),
        ]),
        "result: 10 and 20",
    )]);
}

#[test]
fn tagged_templates_receive_strings_and_values() {
    use krait_ast::expression::TaggedTemplate;
    use krait_ast::Expression;

    // tag`a${1}b${2}` with tag joining what it sees.
    let tag = func_decl(
        "tag",
        params_with(vec![param(id("strings"), None), rest_param(id("values"))]),
        stmt_list![ret(add(
            add(
                call(member(ident("strings"), "join"), vec!["|".into()]),
                call(
                    member(member(ident("strings"), "raw"), "join"),
                    vec!["|".into()],
                ),
            ),
            call(member(ident("values"), "join"), vec!["|".into()]),
        ))],
    );
    let template = Expression::TaggedTemplate(TaggedTemplate::new(
        ident("tag"),
        vec![Some("a".into()), Some("b".into()), Some("".into())].into(),
        vec!["a".into(), "b".into(), "".into()].into(),
        vec![Expression::from(1), Expression::from(2)].into(),
    ));

    run_test_actions([TestAction::assert_eq(
        program(stmt_list![tag, stmt(template)]),
        "a|b|a|b|1|2",
    )]);
}
