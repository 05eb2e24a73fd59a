use float_cmp::approx_eq;
use krait_ast::builder::*;
use krait_ast::operator::{ArithmeticOp, AssignOp, BitwiseOp, RelationalOp, UnaryOp, UpdateOp};
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};
use crate::{ErrorKind, JsBigInt, JsValue};

#[test]
fn numeric_addition() {
    run_test_actions([TestAction::assert_eq(program(stmt_list![stmt(add(1, 2))]), 3)]);
}

#[test]
fn string_concatenation() {
    run_test_actions([
        TestAction::assert_eq(
            program(stmt_list![stmt(add("hello ", "world"))]),
            "hello world",
        ),
        // A string operand turns `+` into concatenation.
        TestAction::assert_eq(program(stmt_list![stmt(add(1, "2"))]), "12"),
        TestAction::assert_eq(program(stmt_list![stmt(add("1", 2))]), "12"),
    ]);
}

#[test]
fn arithmetic_operators() {
    run_test_actions([
        TestAction::assert_eq(program(stmt_list![stmt(sub(7, 10))]), -3),
        TestAction::assert_eq(program(stmt_list![stmt(mul(7, 3))]), 21),
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(ArithmeticOp::Div, 9, 2))]),
            4.5,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(ArithmeticOp::Mod, 10, 3))]),
            1,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(ArithmeticOp::Exp, 2, 10))]),
            1024,
        ),
    ]);
}

#[test]
fn float_addition_rounds_like_doubles() {
    run_test_actions([TestAction::assert_with_op(
        program(stmt_list![stmt(add(0.1, 0.2))]),
        |value, _| {
            let Some(number) = value.as_number() else {
                return false;
            };
            approx_eq!(f64, number, 0.3, epsilon = 1e-12)
        },
    )]);
}

#[test]
fn division_by_zero() {
    run_test_actions([
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(ArithmeticOp::Div, 1, 0))]),
            f64::INFINITY,
        ),
        TestAction::assert_with_op(
            program(stmt_list![stmt(binary(ArithmeticOp::Div, 0, 0))]),
            |value, _| value.as_number().is_some_and(f64::is_nan),
        ),
    ]);
}

#[test]
fn loose_equality() {
    run_test_actions([
        TestAction::assert(program(stmt_list![stmt(loose_eq(1, "1"))]),),
        TestAction::assert(program(stmt_list![stmt(loose_eq(null(), undefined()))]),),
        TestAction::assert_eq(program(stmt_list![stmt(loose_eq(0, null()))]), false),
        TestAction::assert(program(stmt_list![stmt(loose_eq(true, 1))]),),
    ]);
}

#[test]
fn strict_equality() {
    run_test_actions([
        TestAction::assert_eq(program(stmt_list![stmt(strict_eq(1, "1"))]), false),
        TestAction::assert(program(stmt_list![stmt(strict_eq("a", "a"))]),),
        // NaN is never strictly equal to itself.
        TestAction::assert_eq(
            program(stmt_list![stmt(strict_eq(ident("NaN"), ident("NaN")))]),
            false,
        ),
    ]);
}

#[test]
fn relational_operators() {
    run_test_actions([
        TestAction::assert(program(stmt_list![stmt(lt(1, 2))]),),
        TestAction::assert_eq(program(stmt_list![stmt(lt(10, 9))]), false),
        TestAction::assert(program(stmt_list![stmt(lt("a", "b"))]),),
        TestAction::assert(program(stmt_list![stmt(le(2, 2))]),),
        // A NaN operand makes every comparison false.
        TestAction::assert_eq(program(stmt_list![stmt(lt(ident("NaN"), 1))]), false),
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(RelationalOp::GreaterThan, 3, 1))]),
            true,
        ),
    ]);
}

#[test]
fn bitwise_and_shifts() {
    run_test_actions([
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(BitwiseOp::And, 6, 3))]),
            2,
        ),
        TestAction::assert_eq(program(stmt_list![stmt(binary(BitwiseOp::Or, 4, 1))]), 5),
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(BitwiseOp::Xor, 6, 3))]),
            5,
        ),
        // The shift count is masked to five bits.
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(BitwiseOp::Shl, 1, 33))]),
            2,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(BitwiseOp::Shr, -8, 1))]),
            -4,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(binary(BitwiseOp::UShr, -1, 0))]),
            4_294_967_295_u32,
        ),
    ]);
}

#[test]
fn bigint_arithmetic() {
    run_test_actions([
        TestAction::assert_eq(
            program(stmt_list![stmt(add(bigint(1), bigint(2)))]),
            JsValue::BigInt(JsBigInt::from(3)),
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(mul(bigint(6), bigint(7)))]),
            JsValue::BigInt(JsBigInt::from(42)),
        ),
        TestAction::assert(program(stmt_list![stmt(strict_eq(
            binary(ArithmeticOp::Div, bigint(7), bigint(2)),
            bigint(3)
        ))]),),
    ]);
}

#[test]
fn bigint_mixing_is_a_type_error() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![stmt(add(bigint(1), 1))]),
        ErrorKind::Type,
        "Cannot mix BigInt and other types, use explicit conversions",
    )]);
}

#[test]
fn unary_plus_rejects_bigint() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![stmt(unary(UnaryOp::Plus, bigint(1)))]),
        ErrorKind::Type,
        "Cannot convert a BigInt value to a number",
    )]);
}

#[test]
fn unary_operators() {
    run_test_actions([
        TestAction::assert_eq(program(stmt_list![stmt(neg(5))]), -5),
        TestAction::assert_eq(program(stmt_list![stmt(unary(UnaryOp::Plus, "3"))]), 3),
        TestAction::assert_eq(program(stmt_list![stmt(not(0))]), true),
        TestAction::assert_eq(program(stmt_list![stmt(unary(UnaryOp::Tilde, 5))]), -6),
        TestAction::assert_eq(
            program(stmt_list![stmt(unary(UnaryOp::Void, 42))]),
            JsValue::Undefined,
        ),
    ]);
}

#[test]
fn typeof_operator() {
    run_test_actions([
        TestAction::assert_eq(program(stmt_list![stmt(type_of(5))]), "number"),
        TestAction::assert_eq(program(stmt_list![stmt(type_of("x"))]), "string"),
        TestAction::assert_eq(program(stmt_list![stmt(type_of(true))]), "boolean"),
        TestAction::assert_eq(program(stmt_list![stmt(type_of(undefined()))]), "undefined"),
        TestAction::assert_eq(program(stmt_list![stmt(type_of(null()))]), "object"),
        TestAction::assert_eq(program(stmt_list![stmt(type_of(bigint(1)))]), "bigint"),
        TestAction::assert_eq(
            program(stmt_list![stmt(type_of(func_expr(None, params(&[]), stmt_list![])))]),
            "function",
        ),
    ]);
}

#[test]
fn typeof_undeclared_never_throws() {
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![stmt(type_of(ident("surely_not_declared")))]),
        "undefined",
    )]);
}

#[test]
fn logical_operators_short_circuit() {
    run_test_actions([
        // The right operand of a short-circuited `&&` never evaluates.
        TestAction::assert_eq(
            program(stmt_list![stmt(and(false, ident("not_declared")))]),
            false,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(or(true, ident("not_declared")))]),
            true,
        ),
        TestAction::assert_eq(program(stmt_list![stmt(and(true, 7))]), 7),
        TestAction::assert_eq(program(stmt_list![stmt(or(0, 8))]), 8),
        TestAction::assert_eq(program(stmt_list![stmt(coalesce(null(), 5))]), 5),
        TestAction::assert_eq(program(stmt_list![stmt(coalesce(0, 5))]), 0),
    ]);
}

#[test]
fn conditional_and_sequence() {
    run_test_actions([
        TestAction::assert_eq(program(stmt_list![stmt(cond(true, 1, 2))]), 1),
        TestAction::assert_eq(program(stmt_list![stmt(cond(0, 1, 2))]), 2),
        TestAction::assert_eq(
            program(stmt_list![stmt(seq(vec![1.into(), 2.into(), 3.into()]))]),
            3,
        ),
    ]);
}

#[test]
fn update_expressions() {
    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([("x", Some(1.into()))])])),
        // Postfix produces the old value.
        TestAction::assert_eq(
            program(stmt_list![stmt(update_ident(UpdateOp::IncrementPost, "x"))]),
            1,
        ),
        TestAction::assert_eq(program(stmt_list![stmt(ident("x"))]), 2),
        // Prefix produces the new value.
        TestAction::assert_eq(
            program(stmt_list![stmt(update_ident(UpdateOp::IncrementPre, "x"))]),
            3,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(update_ident(UpdateOp::DecrementPre, "x"))]),
            2,
        ),
    ]);
}

#[test]
fn compound_assignment() {
    run_test_actions([
        TestAction::run(program(stmt_list![var_decl([("x", Some(5.into()))])])),
        TestAction::assert_eq(
            program(stmt_list![stmt(assign_op(AssignOp::Add, id("x"), 3))]),
            8,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(assign_op(AssignOp::Mul, id("x"), 2))]),
            16,
        ),
        TestAction::assert_eq(program(stmt_list![stmt(ident("x"))]), 16),
    ]);
}

#[test]
fn logical_assignment() {
    run_test_actions([
        TestAction::run(program(stmt_list![
            var_decl([("a", Some(null().into()))]),
            var_decl([("b", Some(5.into()))]),
        ])),
        TestAction::assert_eq(
            program(stmt_list![stmt(assign_op(AssignOp::Coalesce, id("a"), 1))]),
            1,
        ),
        // `b` is truthy, so `??=` leaves it alone.
        TestAction::assert_eq(
            program(stmt_list![stmt(assign_op(AssignOp::Coalesce, id("b"), 9))]),
            5,
        ),
        TestAction::assert_eq(
            program(stmt_list![stmt(assign_op(AssignOp::BoolAnd, id("b"), 7))]),
            7,
        ),
    ]);
}

#[test]
fn in_operator() {
    run_test_actions([
        TestAction::assert(program(stmt_list![stmt(in_(
            "a",
            object(vec![prop("a", 1)])
        ))]),),
        TestAction::assert_eq(
            program(stmt_list![stmt(in_("b", object(vec![prop("a", 1)])))]),
            false,
        ),
        TestAction::assert_native_error(
            program(stmt_list![stmt(in_("a", 5))]),
            ErrorKind::Type,
            "Cannot use 'in' operator to search for 'a' in a non-object",
        ),
    ]);
}

#[test]
fn instanceof_operator() {
    run_test_actions([
        TestAction::run(program(stmt_list![func_decl("F", params(&[]), stmt_list![])])),
        TestAction::assert(program(stmt_list![stmt(instance_of(
            new_(ident("F"), vec![]),
            ident("F")
        ))]),),
        TestAction::assert_eq(
            program(stmt_list![stmt(instance_of(
                object(vec![]),
                ident("F")
            ))]),
            false,
        ),
        TestAction::assert_native_error(
            program(stmt_list![stmt(instance_of(1, 2))]),
            ErrorKind::Type,
            "right-hand side of 'instanceof' is not an object",
        ),
    ]);
}

#[test]
fn string_to_number_coercions() {
    run_test_actions([
        TestAction::assert_eq(program(stmt_list![stmt(sub("10", 1))]), 9),
        TestAction::assert_eq(program(stmt_list![stmt(mul("0x10", 1))]), 16),
        TestAction::assert_eq(program(stmt_list![stmt(mul("  12  ", 1))]), 12),
        TestAction::assert_eq(program(stmt_list![stmt(mul("", 1))]), 0),
        TestAction::assert_with_op(
            program(stmt_list![stmt(mul("garbage", 1))]),
            |value, _| value.as_number().is_some_and(f64::is_nan),
        ),
        TestAction::assert_eq(program(stmt_list![stmt(mul("Infinity", 2))]), f64::INFINITY),
    ]);
}
