//! Binary and unary operator semantics, with the ES2024 coercion rules.

use krait_ast::operator::{ArithmeticOp, BinaryOp, BitwiseOp, RelationalOp, UnaryOp};

use crate::{
    bigint::JsBigInt,
    context::Context,
    error::{EvalResult, Fault, JsNativeError},
    object::JsObject,
    symbol::JsSymbol,
    value::{JsValue, Numeric, PreferredType},
};

const BIGINT_MIX: &str = "Cannot mix BigInt and other types, use explicit conversions";

/// Applies a strict (non-short-circuiting) binary operator.
pub(crate) fn apply_binary(
    op: BinaryOp,
    lhs: &JsValue,
    rhs: &JsValue,
    context: &mut Context,
) -> EvalResult<JsValue> {
    match op {
        BinaryOp::Arithmetic(op) => apply_arithmetic(op, lhs, rhs, context),
        BinaryOp::Bitwise(op) => apply_bitwise(op, lhs, rhs, context),
        BinaryOp::Relational(op) => apply_relational(op, lhs, rhs, context),
        BinaryOp::Logical(_) => Err(Fault::Invariant(
            "logical operators evaluate lazily in the expression dispatcher".into(),
        )),
    }
}

/// `ApplyStringOrNumericBinaryOperator`, the additive half.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-applystringornumericbinaryoperator
fn apply_arithmetic(
    op: ArithmeticOp,
    lhs: &JsValue,
    rhs: &JsValue,
    context: &mut Context,
) -> EvalResult<JsValue> {
    if op == ArithmeticOp::Add {
        // 1. Let lprim be ? ToPrimitive(lval), rprim be ? ToPrimitive(rval).
        let lprim = lhs.to_primitive(PreferredType::Default, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        let rprim = rhs.to_primitive(PreferredType::Default, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }

        // 2. If either is a String, string concatenation wins.
        if lprim.as_string().is_some() || rprim.as_string().is_some() {
            let lstr = lprim.to_string(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            let rstr = rprim.to_string(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            return Ok(JsValue::String(lstr.concat(&rstr)));
        }

        // 3. Otherwise both sides convert through ToNumeric.
        return numeric_op(op, &lprim, &rprim, context);
    }

    numeric_op(op, lhs, rhs, context)
}

fn numeric_op(
    op: ArithmeticOp,
    lhs: &JsValue,
    rhs: &JsValue,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let lnum = lhs.to_numeric(context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let rnum = rhs.to_numeric(context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    match (lnum, rnum) {
        (Numeric::Number(a), Numeric::Number(b)) => Ok(JsValue::Number(match op {
            ArithmeticOp::Add => a + b,
            ArithmeticOp::Sub => a - b,
            ArithmeticOp::Mul => a * b,
            ArithmeticOp::Div => a / b,
            ArithmeticOp::Mod => a % b,
            ArithmeticOp::Exp => a.powf(b),
        })),
        (Numeric::BigInt(a), Numeric::BigInt(b)) => {
            let result = match op {
                ArithmeticOp::Add => Ok(JsBigInt::add(&a, &b)),
                ArithmeticOp::Sub => Ok(JsBigInt::sub(&a, &b)),
                ArithmeticOp::Mul => Ok(JsBigInt::mul(&a, &b)),
                ArithmeticOp::Div => JsBigInt::div(&a, &b),
                ArithmeticOp::Mod => JsBigInt::rem(&a, &b),
                ArithmeticOp::Exp => JsBigInt::pow(&a, &b),
            };
            match result {
                Ok(value) => Ok(JsValue::BigInt(value)),
                Err(error) => context.throw(error),
            }
        }
        _ => context.throw(JsNativeError::typ().with_message(BIGINT_MIX)),
    }
}

fn apply_bitwise(
    op: BitwiseOp,
    lhs: &JsValue,
    rhs: &JsValue,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let lnum = lhs.to_numeric(context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let rnum = rhs.to_numeric(context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    match (lnum, rnum) {
        (Numeric::Number(a), Numeric::Number(b)) => {
            let a32 = crate::value::f64_to_uint32(a) as i32;
            let b32 = crate::value::f64_to_uint32(b);
            Ok(match op {
                BitwiseOp::And => JsValue::from(a32 & b32 as i32),
                BitwiseOp::Or => JsValue::from(a32 | b32 as i32),
                BitwiseOp::Xor => JsValue::from(a32 ^ b32 as i32),
                // The shift count is the right operand modulo 32.
                BitwiseOp::Shl => JsValue::from(a32.wrapping_shl(b32 & 0x1F)),
                BitwiseOp::Shr => JsValue::from(a32.wrapping_shr(b32 & 0x1F)),
                BitwiseOp::UShr => {
                    JsValue::from((a32 as u32).wrapping_shr(b32 & 0x1F) as f64)
                }
            })
        }
        (Numeric::BigInt(a), Numeric::BigInt(b)) => {
            let result = match op {
                BitwiseOp::And => Ok(JsBigInt::bitand(&a, &b)),
                BitwiseOp::Or => Ok(JsBigInt::bitor(&a, &b)),
                BitwiseOp::Xor => Ok(JsBigInt::bitxor(&a, &b)),
                BitwiseOp::Shl => JsBigInt::shift_left(&a, &b),
                BitwiseOp::Shr => JsBigInt::shift_right(&a, &b),
                BitwiseOp::UShr => {
                    return context.throw(
                        JsNativeError::typ()
                            .with_message("BigInts have no unsigned right shift"),
                    );
                }
            };
            match result {
                Ok(value) => Ok(JsValue::BigInt(value)),
                Err(error) => context.throw(error),
            }
        }
        _ => context.throw(JsNativeError::typ().with_message(BIGINT_MIX)),
    }
}

fn apply_relational(
    op: RelationalOp,
    lhs: &JsValue,
    rhs: &JsValue,
    context: &mut Context,
) -> EvalResult<JsValue> {
    match op {
        RelationalOp::StrictEqual => Ok(JsValue::Boolean(lhs.strict_equals(rhs))),
        RelationalOp::StrictNotEqual => Ok(JsValue::Boolean(!lhs.strict_equals(rhs))),
        RelationalOp::Equal => Ok(JsValue::Boolean(lhs.equals(rhs, context)?)),
        RelationalOp::NotEqual => Ok(JsValue::Boolean(!lhs.equals(rhs, context)?)),
        RelationalOp::LessThan => compare(lhs, rhs, Ordering::Less, false, context),
        RelationalOp::LessThanOrEqual => compare(lhs, rhs, Ordering::Greater, true, context),
        RelationalOp::GreaterThan => compare(lhs, rhs, Ordering::Greater, false, context),
        RelationalOp::GreaterThanOrEqual => compare(lhs, rhs, Ordering::Less, true, context),
        RelationalOp::In => apply_in(lhs, rhs, context),
        RelationalOp::InstanceOf => apply_instanceof(lhs, rhs, context),
    }
}

use std::cmp::Ordering;

/// `IsLessThan`-family comparisons: the result is whether the operands
/// compare (or, negated, do not compare) as `expected`.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-islessthan
fn compare(
    lhs: &JsValue,
    rhs: &JsValue,
    expected: Ordering,
    negate: bool,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let lprim = lhs.to_primitive(PreferredType::Number, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let rprim = rhs.to_primitive(PreferredType::Number, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    let ordering = match (&lprim, &rprim) {
        (JsValue::String(a), JsValue::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (JsValue::BigInt(a), JsValue::BigInt(b)) => Some(a.cmp(b)),
        (JsValue::BigInt(a), _) => {
            let b = rprim.to_number(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            a.to_f64().partial_cmp(&b)
        }
        (_, JsValue::BigInt(b)) => {
            let a = lprim.to_number(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            a.partial_cmp(&b.to_f64())
        }
        _ => {
            let a = lprim.to_number(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            let b = rprim.to_number(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            a.partial_cmp(&b)
        }
    };

    // An undefined comparison (NaN on either side) is always false.
    let Some(ordering) = ordering else {
        return Ok(JsValue::Boolean(false));
    };
    let matched = ordering == expected;
    Ok(JsValue::Boolean(if negate { !matched } else { matched }))
}

/// The `in` operator.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-relational-operators-runtime-semantics-evaluation
fn apply_in(lhs: &JsValue, rhs: &JsValue, context: &mut Context) -> EvalResult<JsValue> {
    let Some(object) = rhs.as_object() else {
        return context.throw(JsNativeError::typ().with_message(format!(
            "Cannot use 'in' operator to search for '{}' in a non-object",
            lhs.to_display_string()
        )));
    };
    let key = lhs.to_property_key(context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    Ok(JsValue::Boolean(object.has_property(&key)))
}

/// The `instanceof` operator: `@@hasInstance` first, then
/// `OrdinaryHasInstance`.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-instanceofoperator
fn apply_instanceof(lhs: &JsValue, rhs: &JsValue, context: &mut Context) -> EvalResult<JsValue> {
    let Some(target) = rhs.as_object() else {
        return context.throw(
            JsNativeError::typ().with_message("right-hand side of 'instanceof' is not an object"),
        );
    };

    let method = target.get_method(JsSymbol::has_instance(), context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    if let Some(method) = method {
        let result = crate::eval::call::call_function(&method, rhs, &[lhs.clone()], context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        return Ok(JsValue::Boolean(result.to_boolean()));
    }

    ordinary_has_instance(lhs, target, context)
}

/// `OrdinaryHasInstance ( C, O )`
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-ordinaryhasinstance
fn ordinary_has_instance(
    value: &JsValue,
    constructor: &JsObject,
    context: &mut Context,
) -> EvalResult<JsValue> {
    if !constructor.is_callable() {
        return context.throw(
            JsNativeError::typ().with_message("right-hand side of 'instanceof' is not callable"),
        );
    }

    let Some(object) = value.as_object() else {
        return Ok(JsValue::Boolean(false));
    };

    let prototype = constructor.get("prototype", context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let Some(prototype) = prototype.as_object() else {
        return context.throw(
            JsNativeError::typ().with_message("function has non-object prototype in instanceof"),
        );
    };

    let mut current = object.prototype();
    while let Some(parent) = current {
        if JsObject::equals(&parent, prototype) {
            return Ok(JsValue::Boolean(true));
        }
        current = parent.prototype();
    }
    Ok(JsValue::Boolean(false))
}

/// Applies an eager unary operator (`typeof`, `delete` and `void` are
/// handled by the dispatcher).
pub(crate) fn apply_unary(
    op: UnaryOp,
    value: &JsValue,
    context: &mut Context,
) -> EvalResult<JsValue> {
    match op {
        UnaryOp::Minus => {
            let numeric = value.to_numeric(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            Ok(match numeric {
                Numeric::Number(number) => JsValue::Number(-number),
                Numeric::BigInt(bigint) => JsValue::BigInt(JsBigInt::neg(&bigint)),
            })
        }
        UnaryOp::Plus => {
            // Unary plus is `ToNumber`, which rejects BigInts.
            let number = value.to_number(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            Ok(JsValue::Number(number))
        }
        UnaryOp::Not => Ok(JsValue::Boolean(!value.to_boolean())),
        UnaryOp::Tilde => {
            let numeric = value.to_numeric(context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            Ok(match numeric {
                Numeric::Number(number) => {
                    JsValue::from(!(crate::value::f64_to_uint32(number) as i32))
                }
                Numeric::BigInt(bigint) => JsValue::BigInt(JsBigInt::not(&bigint)),
            })
        }
        UnaryOp::TypeOf | UnaryOp::Delete | UnaryOp::Void => Err(Fault::Invariant(
            "reference-sensitive unary operators evaluate in the dispatcher".into(),
        )),
    }
}
