//! Array and object destructuring, for declarations and assignments.
//!
//! Both binders reuse the iterator protocol for array patterns and the
//! property protocol for object patterns, covering spread/rest elements,
//! defaults (with anonymous-function name inference) and nested patterns.

use std::rc::Rc;

use krait_ast::{
    expression::{Expression, PropertyAccess},
    pattern::{ArrayPatternElement, ObjectPatternElement, Pattern},
    property::PropertyName,
};

use crate::{
    context::Context,
    environments::{DefineOptions, Environment},
    error::{EvalResult, JsNativeError},
    iterator::{get_iterator, IteratorHint, IteratorRecord},
    object::JsObject,
    property::{Attribute, PropertyDescriptor, PropertyKey},
    value::JsValue,
};

use super::expression::{
    assign_identifier, eval_expression, eval_named_expression, get_value_property,
};

/// How the leaves of a pattern bind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum BindingMode {
    /// Function-scoped `var` bindings.
    Var,

    /// Lexical `let` bindings.
    Let,

    /// Lexical `const` bindings.
    Const,

    /// Function parameter bindings.
    Param,

    /// Assignments to existing references.
    Assign,
}

fn bind_leaf(
    name: &Rc<str>,
    value: JsValue,
    mode: BindingMode,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    match mode {
        BindingMode::Var => {
            env.define_function_scoped(name.into(), value, true);
            Ok(())
        }
        BindingMode::Let => {
            env.define(
                name.into(),
                value,
                DefineOptions {
                    blocks_function_scope: true,
                    ..DefineOptions::lexical()
                },
            );
            Ok(())
        }
        BindingMode::Const => {
            env.define(
                name.into(),
                value,
                DefineOptions {
                    blocks_function_scope: true,
                    ..DefineOptions::constant()
                },
            );
            Ok(())
        }
        BindingMode::Param => {
            env.define(name.into(), value, DefineOptions::param());
            Ok(())
        }
        BindingMode::Assign => assign_identifier(name, value, env, context),
    }
}

/// Destructures `value` into a *binding* pattern (declarations and
/// parameters).
pub(crate) fn bind_pattern_binding(
    pattern: &Pattern,
    value: JsValue,
    mode: BindingMode,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    bind_pattern(pattern, value, mode, env, context)
}

/// Destructures `value` into an *assignment* pattern (existing bindings
/// and property references).
pub(crate) fn assign_pattern(
    pattern: &Pattern,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    bind_pattern(pattern, value, BindingMode::Assign, env, context)
}

fn bind_pattern(
    pattern: &Pattern,
    value: JsValue,
    mode: BindingMode,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    match pattern {
        Pattern::Array(array) => bind_array_pattern(array.elements(), value, mode, env, context),
        Pattern::Object(object) => {
            bind_object_pattern(object.elements(), value, mode, env, context)
        }
    }
}

fn bind_array_pattern(
    elements: &[ArrayPatternElement],
    value: JsValue,
    mode: BindingMode,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    let Some(mut record) = get_iterator(&value, IteratorHint::Sync, context)? else {
        return Ok(());
    };

    let result = bind_array_elements(elements, &mut record, mode, env, context);

    // `IteratorClose` runs exactly once: on abrupt completion, or when the
    // pattern finished before the iterator did. A `done` iterator (normal
    // exhaustion or a throw raised by the iterator itself) is not closed.
    match &result {
        Err(_) => {}
        Ok(()) => {
            if !record.done() {
                record.close(context)?;
            }
        }
    }
    result
}

fn bind_array_elements(
    elements: &[ArrayPatternElement],
    record: &mut IteratorRecord,
    mode: BindingMode,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    for element in elements {
        match element {
            ArrayPatternElement::Elision => {
                if !record.done() {
                    record.step(context)?;
                    if context.should_stop() {
                        return Ok(());
                    }
                }
            }

            ArrayPatternElement::SingleName {
                ident,
                default_init,
            } => {
                let value = next_or_undefined(record, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                let value = apply_default(
                    value,
                    default_init.as_ref(),
                    Some(ident.name()),
                    env,
                    context,
                )?;
                if context.should_stop() {
                    return Ok(());
                }
                bind_leaf(ident.name(), value, mode, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }

            ArrayPatternElement::PropertyAccess {
                access,
                default_init,
            } => {
                // Resolve the assignment reference before pulling the
                // iterator, preserving left-hand-side evaluation order.
                let Some((base, key)) = resolve_access_reference(access, env, context)? else {
                    return Ok(());
                };
                let value = next_or_undefined(record, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                let value =
                    apply_default(value, default_init.as_ref(), None, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                write_resolved_reference(base, key, value, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }

            ArrayPatternElement::Pattern {
                pattern,
                default_init,
            } => {
                let value = next_or_undefined(record, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                let value =
                    apply_default(value, default_init.as_ref(), None, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                bind_pattern(pattern, value, mode, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }

            ArrayPatternElement::SingleNameRest { ident } => {
                let rest = collect_rest(record, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                bind_leaf(ident.name(), rest, mode, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }

            ArrayPatternElement::PropertyAccessRest { access } => {
                let Some((base, key)) = resolve_access_reference(access, env, context)? else {
                    return Ok(());
                };
                let rest = collect_rest(record, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                write_resolved_reference(base, key, rest, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }

            ArrayPatternElement::PatternRest { pattern } => {
                let rest = collect_rest(record, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                bind_pattern(pattern, rest, mode, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

fn next_or_undefined(
    record: &mut IteratorRecord,
    context: &mut Context,
) -> EvalResult<JsValue> {
    if record.done() {
        return Ok(JsValue::Undefined);
    }
    Ok(record.step(context)?.unwrap_or(JsValue::Undefined))
}

fn collect_rest(record: &mut IteratorRecord, context: &mut Context) -> EvalResult<JsValue> {
    let mut values = Vec::new();
    while let Some(value) = record.step(context)? {
        values.push(value);
    }
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    Ok(JsObject::array_from(
        values,
        Some(context.realm().intrinsics().array_prototype()),
    )
    .into())
}

/// Evaluates a default initializer for an `undefined` input, inferring a
/// name into anonymous function definitions.
fn apply_default(
    value: JsValue,
    default: Option<&Expression>,
    inferred: Option<&Rc<str>>,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    if !value.is_undefined() {
        return Ok(value);
    }
    let Some(default) = default else {
        return Ok(value);
    };
    eval_named_expression(default, inferred, env, context)
}

/// Pre-resolves a property-access reference: evaluates its base and key.
fn resolve_access_reference(
    access: &PropertyAccess,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<(JsValue, PropertyKey)>> {
    let base = eval_expression(access.target(), env, context)?;
    if context.should_stop() {
        return Ok(None);
    }
    let key = match access.field() {
        krait_ast::expression::PropertyAccessField::Const(name) => PropertyKey::from_string(name),
        krait_ast::expression::PropertyAccessField::Expr(expression) => {
            let value = eval_expression(expression, env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            let key = value.to_property_key(context)?;
            if context.should_stop() {
                return Ok(None);
            }
            key
        }
    };
    Ok(Some((base, key)))
}

fn write_resolved_reference(
    base: JsValue,
    key: PropertyKey,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    if base.is_null_or_undefined() {
        context.throw(
            JsNativeError::typ().with_message("Cannot set properties of null or undefined"),
        )?;
        return Ok(());
    }
    let Some(object) = base.as_object() else {
        return Ok(());
    };
    let accepted = object.set_with_receiver(&key, value, &base, context)?;
    if !accepted && env.is_strict() && !context.should_stop() {
        context.throw(JsNativeError::typ().with_message(format!(
            "Cannot assign to read only property '{}'",
            key.to_display_string()
        )))?;
    }
    Ok(())
}

fn bind_object_pattern(
    elements: &[ObjectPatternElement],
    value: JsValue,
    mode: BindingMode,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    // 1. `RequireObjectCoercible`.
    if value.is_null_or_undefined() {
        context.throw(
            JsNativeError::typ()
                .with_message("Cannot destructure 'undefined' or 'null'"),
        )?;
        return Ok(());
    }

    let mut consumed: Vec<PropertyKey> = Vec::new();

    for element in elements {
        match element {
            ObjectPatternElement::SingleName {
                name,
                ident,
                default_init,
            } => {
                let key = pattern_property_key(name, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                let read = get_value_property(&value, &key, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                consumed.push(key);
                let read = apply_default(
                    read,
                    default_init.as_ref(),
                    Some(ident.name()),
                    env,
                    context,
                )?;
                if context.should_stop() {
                    return Ok(());
                }
                bind_leaf(ident.name(), read, mode, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }

            ObjectPatternElement::Pattern {
                name,
                pattern,
                default_init,
            } => {
                let key = pattern_property_key(name, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                let read = get_value_property(&value, &key, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                consumed.push(key);
                let read = apply_default(read, default_init.as_ref(), None, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                bind_pattern(pattern, read, mode, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }

            ObjectPatternElement::AssignmentPropertyAccess {
                name,
                access,
                default_init,
            } => {
                let key = pattern_property_key(name, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                let Some((base, target_key)) = resolve_access_reference(access, env, context)?
                else {
                    return Ok(());
                };
                let read = get_value_property(&value, &key, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                consumed.push(key);
                let read = apply_default(read, default_init.as_ref(), None, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                write_resolved_reference(base, target_key, read, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }

            ObjectPatternElement::RestProperty { ident } => {
                let rest = collect_rest_object(&value, &consumed, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                bind_leaf(ident.name(), rest, mode, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }

            ObjectPatternElement::AssignmentRestPropertyAccess { access } => {
                let Some((base, target_key)) = resolve_access_reference(access, env, context)?
                else {
                    return Ok(());
                };
                let rest = collect_rest_object(&value, &consumed, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                write_resolved_reference(base, target_key, rest, env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

fn pattern_property_key(
    name: &PropertyName,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<PropertyKey> {
    match name {
        PropertyName::Literal(literal) => Ok(PropertyKey::from_string(literal)),
        PropertyName::Computed(expression) => {
            let value = eval_expression(expression, env, context)?;
            if context.should_stop() {
                return Ok(PropertyKey::from(""));
            }
            value.to_property_key(context)
        }
    }
}

/// Collects every enumerable own key not consumed by the pattern into a
/// fresh object, preserving `[[OwnPropertyKeys]]` order.
fn collect_rest_object(
    value: &JsValue,
    consumed: &[PropertyKey],
    context: &mut Context,
) -> EvalResult<JsValue> {
    let rest = JsObject::new_ordinary(Some(context.realm().intrinsics().object_prototype()));
    let Some(source) = value.as_object() else {
        return Ok(rest.into());
    };
    for key in source.own_property_keys() {
        if consumed.contains(&key) {
            continue;
        }
        let Some(descriptor) = source.get_own_property(&key) else {
            continue;
        };
        if !descriptor.expect_enumerable() {
            continue;
        }
        let read = source.get_with_receiver(&key, value, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        rest.insert_property(key, PropertyDescriptor::data(read, Attribute::all_attrs()));
    }
    Ok(rest.into())
}
