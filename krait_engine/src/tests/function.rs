use krait_ast::builder::*;
use krait_ast::declaration::Binding;
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};
use crate::{ErrorKind, JsValue};

#[test]
fn var_capture_sees_later_assignment() {
    // var x = 1; function f() { return x } x = 2; f()
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([("x", Some(1.into()))]),
            func_decl("f", params(&[]), stmt_list![ret(ident("x"))]),
            stmt(assign(id("x"), 2)),
            stmt(call(ident("f"), vec![])),
        ]),
        2,
    )]);
}

#[test]
fn parameters_bind_positionally() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl(
                "add3",
                params(&["a", "b", "c"]),
                stmt_list![ret(add(add(ident("a"), ident("b")), ident("c")))],
            ),
            stmt(call(ident("add3"), vec![1.into(), 2.into(), 3.into()])),
        ]),
        6,
    )]);
}

#[test]
fn missing_arguments_are_undefined() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl("f", params(&["a"]), stmt_list![ret(type_of(ident("a")))]),
            stmt(call(ident("f"), vec![])),
        ]),
        "undefined",
    )]);
}

#[test]
fn default_parameters() {
    run_test_actions([
        TestAction::run(program(stmt_list![func_decl(
            "f",
            params_with(vec![
                param(id("a"), Some(1.into())),
                param(id("b"), Some(2.into())),
            ]),
            stmt_list![ret(add(ident("a"), ident("b")))],
        )])),
        TestAction::assert_eq(program(stmt_list![stmt(call(ident("f"), vec![]))]), 3),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(ident("f"), vec![5.into()]))]),
            7,
        ),
        // An explicit `undefined` still takes the default.
        TestAction::assert_eq(
            program(stmt_list![stmt(call(
                ident("f"),
                vec![undefined(), 5.into()]
            ))]),
            6,
        ),
    ]);
}

#[test]
fn rest_parameter_collects_the_remainder() {
    run_test_actions([
        TestAction::run(program(stmt_list![func_decl(
            "f",
            params_with(vec![param(id("a"), None), rest_param(id("r"))]),
            stmt_list![ret(member(ident("r"), "length"))],
        )])),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(
                ident("f"),
                vec![1.into(), 2.into(), 3.into()]
            ))]),
            2,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(ident("f"), vec![1.into()]))]),
            0,
        ),
    ]);
}

#[test]
fn arguments_object() {
    // function f() { return arguments.length + arguments[0] }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl(
                "f",
                params(&[]),
                stmt_list![ret(add(
                    member(ident("arguments"), "length"),
                    index(ident("arguments"), 0),
                ))],
            ),
            stmt(call(ident("f"), vec![10.into(), 20.into()])),
        ]),
        12,
    )]);
}

#[test]
fn method_this_binding() {
    // var foo = { a: 3, bar: function () { return this.a + 5 } }; foo.bar()
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([(
                "foo",
                Some(object(vec![
                    prop("a", 3),
                    prop(
                        "bar",
                        func_expr(
                            None,
                            params(&[]),
                            stmt_list![ret(add(member(this(), "a"), 5))],
                        ),
                    ),
                ])),
            )]),
            stmt(call(member(ident("foo"), "bar"), vec![])),
        ]),
        8,
    )]);
}

#[test]
fn arrow_functions_use_the_lexical_this() {
    // var obj = { v: 42, m: function () { var a = () => this.v; return a() } }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            var_decl([(
                "obj",
                Some(object(vec![
                    prop("v", 42),
                    prop(
                        "m",
                        func_expr(
                            None,
                            params(&[]),
                            stmt_list![
                                var_decl([(
                                    "a",
                                    Some(arrow(
                                        params(&[]),
                                        stmt_list![ret(member(this(), "v"))],
                                    )),
                                )]),
                                ret(call(ident("a"), vec![])),
                            ],
                        ),
                    ),
                ])),
            )]),
            stmt(call(member(ident("obj"), "m"), vec![])),
        ]),
        42,
    )]);
}

#[test]
fn call_and_apply_rebind_this() {
    run_test_actions([
        TestAction::run(program(stmt_list![func_decl(
            "f",
            params(&["x"]),
            stmt_list![ret(add(member(this(), "v"), ident("x")))],
        )])),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(
                member(ident("f"), "call"),
                vec![object(vec![prop("v", 1)]), 2.into()],
            ))]),
            3,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(
                member(ident("f"), "apply"),
                vec![object(vec![prop("v", 1)]), array(vec![2.into()])],
            ))]),
            3,
        ),
    ]);
}

#[test]
fn bound_functions() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            func_decl(
                "f",
                params(&["x"]),
                stmt_list![ret(add(member(this(), "v"), ident("x")))],
            ),
            var_decl([(
                "g",
                Some(call(
                    member(ident("f"), "bind"),
                    vec![object(vec![prop("v", 10)])],
                )),
            )]),
        ])),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(ident("g"), vec![5.into()]))]),
            15,
        ),
    ]);
}

#[test]
fn constructors_allocate_instances() {
    run_test_actions([
        TestAction::run(program(stmt_list![func_decl(
            "Point",
            params(&["n"]),
            stmt_list![stmt(assign(member(this(), "n"), ident("n")))],
        )])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(
                new_(ident("Point"), vec![7.into()]),
                "n"
            ))]),
            7,
        ),
        TestAction::assert(program(stmt_list![stmt(instance_of(
            new_(ident("Point"), vec![1.into()]),
            ident("Point")
        ))]),),
    ]);
}

#[test]
fn constructor_return_override() {
    // function R() { return { x: 1 } }; new R().x
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl(
                "R",
                params(&[]),
                stmt_list![ret(object(vec![prop("x", 1)]))],
            ),
            stmt(member(new_(ident("R"), vec![]), "x")),
        ]),
        1,
    )]);
}

#[test]
fn constructor_primitive_return_is_ignored() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl(
                "R",
                params(&[]),
                stmt_list![stmt(assign(member(this(), "x"), 2)), ret(5)],
            ),
            stmt(member(new_(ident("R"), vec![]), "x")),
        ]),
        2,
    )]);
}

#[test]
fn new_target_distinguishes_call_from_construct() {
    run_test_actions([
        TestAction::run(program(stmt_list![func_decl(
            "g",
            params(&[]),
            stmt_list![stmt(assign(
                member(this(), "t"),
                strict_eq(new_target(), ident("g")),
            ))],
        )])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(new_(ident("g"), vec![]), "t"))]),
            true,
        ),
        // A plain call sees `new.target` as undefined.
        TestAction::assert_eq(
            program(stmt_list![
                func_decl(
                    "h",
                    params(&[]),
                    stmt_list![ret(strict_eq(new_target(), undefined()))],
                ),
                stmt(call(ident("h"), vec![])),
            ]),
            true,
        ),
    ]);
}

#[test]
fn arrow_functions_are_not_constructors() {
    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([(
            "a",
            Some(arrow(params(&[]), stmt_list![])),
        )])])),
        TestAction::assert_native_error(
            program(stmt_list![stmt(new_(ident("a"), vec![]))]),
            ErrorKind::Type,
            "value is not a constructor",
        ),
    ]);
}

#[test]
fn anonymous_functions_take_their_binding_name() {
    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([(
            "h",
            Some(func_expr(None, params(&[]), stmt_list![])),
        )])])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("h"), "name"))]),
            "h",
        ),
    ]);
}

#[test]
fn function_length_counts_required_parameters() {
    run_test_actions([
        TestAction::run(program(stmt_list![func_decl(
            "f",
            params_with(vec![
                param(id("a"), None),
                param(id("b"), Some(1.into())),
                rest_param(id("r")),
            ]),
            stmt_list![],
        )])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("f"), "length"))]),
            1,
        ),
    ]);
}

#[test]
fn recursion() {
    // function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2) }
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl(
                "fib",
                params(&["n"]),
                stmt_list![ret(cond(
                    lt(ident("n"), 2),
                    ident("n"),
                    add(
                        call(ident("fib"), vec![sub(ident("n"), 1)]),
                        call(ident("fib"), vec![sub(ident("n"), 2)]),
                    ),
                ))],
            ),
            stmt(call(ident("fib"), vec![10.into()])),
        ]),
        55,
    )]);
}

#[test]
fn parameter_patterns_destructure() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl(
                "f",
                params_with(vec![param(
                    Binding::Pattern(array_binding(&["a", "b"])),
                    None,
                )]),
                stmt_list![ret(add(ident("a"), ident("b")))],
            ),
            stmt(call(ident("f"), vec![array(vec![1.into(), 2.into()])])),
        ]),
        3,
    )]);
}

#[test]
fn functions_return_undefined_without_return() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            func_decl("f", params(&[]), stmt_list![stmt(1)]),
            stmt(call(ident("f"), vec![])),
        ]),
        JsValue::undefined(),
    )]);
}

#[test]
fn immediately_invoked_function_expressions() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![stmt(call(
            func_expr(None, params(&["x"]), stmt_list![ret(mul(ident("x"), 2))]),
            vec![21.into()],
        ))]),
        42,
    )]);
}
