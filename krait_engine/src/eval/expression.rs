//! The expression dispatcher.

use std::rc::Rc;

use krait_ast::{
    expression::{
        AssignTarget, Expression, Literal, PropertyAccess, PropertyAccessField, TemplatePart,
        UpdateTarget,
    },
    operator::{BinaryOp, LogicalOp, UnaryOp},
    property::{MethodKind, PropertyDefinition, PropertyName},
};

use crate::{
    bigint::JsBigInt,
    context::{Context, Signal},
    environments::Environment,
    error::{EvalResult, Fault, JsNativeError, SuspendKind, Suspension},
    iterator::{get_iterator, IteratorHint},
    object::JsObject,
    private::{PrivateElement, PrivateName},
    property::{Attribute, PropertyDescriptor, PropertyKey},
    scheduler::AwaitOutcome,
    string::JsString,
    value::{JsValue, Numeric},
};

use super::{call, class, function, operators, pattern};

/// Evaluates an expression to a value. An abrupt signal may be set; the
/// returned value is `undefined` in that case.
pub(crate) fn eval_expression(
    expression: &Expression,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    eval_named_expression(expression, None, env, context)
}

/// Evaluates an expression, propagating an inferred name into anonymous
/// function and class definitions.
pub(crate) fn eval_named_expression(
    expression: &Expression,
    inferred_name: Option<&Rc<str>>,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    match expression {
        Expression::Literal(literal) => Ok(eval_literal(literal)),

        Expression::Identifier(ident) => resolve_identifier(ident.name(), env, context),

        Expression::This => this_value(env, context),

        Expression::NewTarget => {
            let slots_env = env.this_environment();
            Ok(slots_env
                .as_ref()
                .and_then(|env| env.slots())
                .and_then(|slots| slots.new_target().cloned())
                .map_or(JsValue::Undefined, JsValue::from))
        }

        Expression::Array(literal) => eval_array_literal(literal, env, context),

        Expression::Object(literal) => eval_object_literal(literal, env, context),

        Expression::Template(template) => eval_template(template, env, context),

        Expression::TaggedTemplate(template) => eval_tagged_template(template, env, context),

        Expression::Function(node) => {
            let value = function::make_function(node, env, context);
            if node.name().is_none() {
                if let Some(name) = inferred_name {
                    function::set_function_name(&value, name);
                }
            }
            Ok(value.into())
        }

        Expression::Class(node) => {
            let value = class::eval_class(node, env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            if node.name().is_none() {
                if let (Some(name), Some(object)) = (inferred_name, value.as_object()) {
                    function::set_function_name(object, name);
                }
            }
            Ok(value)
        }

        Expression::Spread(_) => Err(Fault::Invariant(
            "spread element outside an array literal or argument list".into(),
        )),

        Expression::PropertyAccess(_)
        | Expression::PrivateAccess(_)
        | Expression::Call(_) => {
            let value = eval_chain(expression, env, context)?;
            Ok(value.map_or(JsValue::Undefined, |(value, _)| value))
        }

        Expression::SuperPropertyAccess(access) => {
            let key = eval_access_field(access.field(), env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            super_property_get(&key, env, context)
        }

        Expression::SuperCall(node) => call::eval_super_call(node, env, context),

        Expression::New(node) => {
            context.set_source_ref(node.span());
            let constructor = eval_expression(node.target(), env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            let Some(args) = eval_arguments(node.args(), env, context)? else {
                return Ok(JsValue::Undefined);
            };
            call::construct_value(&constructor, &args, None, context)
        }

        Expression::Unary(node) => eval_unary(node, env, context),

        Expression::Update(node) => eval_update(node, env, context),

        Expression::Binary(node) => match node.op() {
            BinaryOp::Logical(op) => eval_logical(op, node.lhs(), node.rhs(), env, context),
            op => {
                let lhs = eval_expression(node.lhs(), env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                let rhs = eval_expression(node.rhs(), env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                operators::apply_binary(op, &lhs, &rhs, context)
            }
        },

        Expression::Conditional(node) => {
            let condition = eval_expression(node.condition(), env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            if condition.to_boolean() {
                eval_expression(node.if_true(), env, context)
            } else {
                eval_expression(node.if_false(), env, context)
            }
        }

        Expression::Assign(node) => eval_assign(node, env, context),

        Expression::Sequence(expressions) => {
            let mut value = JsValue::Undefined;
            for expression in expressions.iter() {
                value = eval_expression(expression, env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
            }
            Ok(value)
        }

        Expression::Await(node) => {
            let operand_site = begin_suspension_site(context);
            if let Some(site) = operand_site {
                if let Some(recorded) = recorded_payload(site, context) {
                    return Ok(apply_recorded(recorded, context));
                }
            }
            let operand = eval_expression(node.target(), env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            await_with_site(operand, operand_site, context)
        }

        Expression::Yield(node) => eval_yield(node, env, context),
    }
}

fn eval_literal(literal: &Literal) -> JsValue {
    match literal {
        Literal::Null => JsValue::Null,
        Literal::Undefined => JsValue::Undefined,
        Literal::Bool(boolean) => JsValue::Boolean(*boolean),
        Literal::Num(number) => JsValue::Number(*number),
        Literal::String(string) => JsValue::String(string.into()),
        Literal::BigInt(bigint) => JsValue::BigInt(JsBigInt::from(bigint.as_ref().clone())),
    }
}

/// Resolves an identifier through the environment chain, observing TDZ and
/// with-object records.
pub(crate) fn resolve_identifier(
    name: &Rc<str>,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let key = JsString::from(name);
    let mut current = env.clone();
    loop {
        match current.own_binding_value(&key) {
            Some(Some(value)) => return Ok(value),
            Some(None) => {
                return context.throw(JsNativeError::reference().with_message(format!(
                    "Cannot access '{key}' before initialization"
                )));
            }
            None => {}
        }
        if let Some(object) = current.with_object() {
            let property = PropertyKey::from_string(&key);
            if object.has_property(&property) {
                let object = object.clone();
                return object.get(property, context);
            }
        }
        match current.parent() {
            Some(parent) => current = parent.clone(),
            None => {
                return context.throw(
                    JsNativeError::reference().with_message(format!("{key} is not defined")),
                );
            }
        }
    }
}

/// Assigns an identifier through the environment chain: TDZ reads fail,
/// `const` reassignment fails, with-objects intercept, and unresolved
/// names become global object properties in sloppy mode.
pub(crate) fn assign_identifier(
    name: &Rc<str>,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    let key = JsString::from(name);
    let mut current = env.clone();
    loop {
        if current.has_own_binding(&key) {
            if current.own_binding_value(&key) == Some(None) {
                context.throw(JsNativeError::reference().with_message(format!(
                    "Cannot access '{key}' before initialization"
                )))?;
                return Ok(());
            }
            if current.is_own_binding_const(&key) {
                context.throw(
                    JsNativeError::typ()
                        .with_message(format!("Cannot reassign constant '{key}'")),
                )?;
                return Ok(());
            }
            let _ = current.assign_own(&key, value);
            return Ok(());
        }
        if let Some(object) = current.with_object() {
            let property = PropertyKey::from_string(&key);
            if object.has_property(&property) {
                let object = object.clone();
                object.set(property, value, context)?;
                return Ok(());
            }
        }
        match current.parent() {
            Some(parent) => current = parent.clone(),
            None => break,
        }
    }

    if env.is_strict() {
        context.throw(
            JsNativeError::reference().with_message(format!("{key} is not defined")),
        )?;
        return Ok(());
    }
    // Sloppy mode: create the property on the global object.
    let global = context.realm().global_object();
    global.set(PropertyKey::from_string(&key), value, context)?;
    Ok(())
}

/// Gets the `this` of the running execution.
pub(crate) fn this_value(env: &Environment, context: &mut Context) -> EvalResult<JsValue> {
    let Some(slots_env) = env.this_environment() else {
        return Ok(context.realm().global_object().into());
    };
    let Some(slots) = slots_env.slots() else {
        return Ok(context.realm().global_object().into());
    };
    match slots.this() {
        Some(value) => Ok(value),
        None => context.throw(JsNativeError::reference().with_message(
            "Must call super constructor in derived class before accessing 'this'",
        )),
    }
}

fn eval_array_literal(
    literal: &krait_ast::expression::ArrayLiteral,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let mut values = Vec::with_capacity(literal.elements().len());
    for element in literal.elements() {
        match element {
            None => values.push(JsValue::Undefined),
            Some(Expression::Spread(spread)) => {
                let iterable = eval_expression(spread.target(), env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                let Some(mut record) = get_iterator(&iterable, IteratorHint::Sync, context)?
                else {
                    return Ok(JsValue::Undefined);
                };
                while let Some(value) = record.step(context)? {
                    values.push(value);
                }
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
            }
            Some(expression) => {
                let value = eval_expression(expression, env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                values.push(value);
            }
        }
    }
    Ok(JsObject::array_from(
        values,
        Some(context.realm().intrinsics().array_prototype()),
    )
    .into())
}

fn eval_property_name(
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

fn eval_object_literal(
    literal: &krait_ast::expression::ObjectLiteral,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let object = JsObject::new_ordinary(Some(context.realm().intrinsics().object_prototype()));

    for member in literal.members() {
        match member {
            PropertyDefinition::IdentifierReference(ident) => {
                let value = resolve_identifier(ident.name(), env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                object.insert_property(
                    PropertyKey::from_string(ident.name()),
                    PropertyDescriptor::data(value, Attribute::all_attrs()),
                );
            }
            PropertyDefinition::Property(name, expression) => {
                let key = eval_property_name(name, env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                let inferred = name.literal().cloned();
                let value =
                    eval_named_expression(expression, inferred.as_ref(), env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                object.insert_property(
                    key,
                    PropertyDescriptor::data(value, Attribute::all_attrs()),
                );
            }
            PropertyDefinition::MethodDefinition(name, kind, node) => {
                let key = eval_property_name(name, env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                let method = function::make_method(node, env, object.clone(), context);
                function::set_function_name(&method, &key_to_name(&key, *kind));
                let descriptor = match kind {
                    MethodKind::Ordinary => PropertyDescriptor::data(
                        method.into(),
                        Attribute::all_attrs(),
                    ),
                    MethodKind::Get => PropertyDescriptor::builder()
                        .get(Some(method))
                        .enumerable(true)
                        .configurable(true),
                    MethodKind::Set => PropertyDescriptor::builder()
                        .set(Some(method))
                        .enumerable(true)
                        .configurable(true),
                };
                // Getter/setter pairs for the same key merge.
                let _ = object.define_own_property(key, descriptor);
            }
            PropertyDefinition::SpreadObject(expression) => {
                let source = eval_expression(expression, env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                if let Some(source) = source.as_object() {
                    for key in source.own_property_keys() {
                        let Some(descriptor) = source.get_own_property(&key) else {
                            continue;
                        };
                        if !descriptor.expect_enumerable() {
                            continue;
                        }
                        let value = source.get_with_receiver(
                            &key,
                            &JsValue::from(source.clone()),
                            context,
                        )?;
                        if context.should_stop() {
                            return Ok(JsValue::Undefined);
                        }
                        object.insert_property(
                            key,
                            PropertyDescriptor::data(value, Attribute::all_attrs()),
                        );
                    }
                }
            }
        }
    }

    Ok(object.into())
}

fn key_to_name(key: &PropertyKey, kind: MethodKind) -> Rc<str> {
    let base = key.to_display_string();
    match kind {
        MethodKind::Get => format!("get {base}").into(),
        MethodKind::Set => format!("set {base}").into(),
        MethodKind::Ordinary => base.into(),
    }
}

fn eval_template(
    template: &krait_ast::expression::TemplateLiteral,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let mut buffer = String::new();
    for part in template.parts() {
        match part {
            TemplatePart::String(chunk) => buffer.push_str(chunk),
            TemplatePart::Expr(expression) => {
                let value = eval_expression(expression, env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                let piece = value.to_string(context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                buffer.push_str(&piece);
            }
        }
    }
    Ok(JsValue::from(JsString::from(buffer)))
}

fn eval_tagged_template(
    template: &krait_ast::expression::TaggedTemplate,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let array_prototype = context.realm().intrinsics().array_prototype();

    // The strings array carries the cooked chunks, with `raw` attached.
    let cookeds: Vec<JsValue> = template
        .cookeds()
        .iter()
        .map(|cooked| {
            cooked
                .as_ref()
                .map_or(JsValue::Undefined, |s| JsValue::String(s.into()))
        })
        .collect();
    let strings = JsObject::array_from(cookeds, Some(array_prototype.clone()));
    let raws: Vec<JsValue> = template
        .raws()
        .iter()
        .map(|raw| JsValue::String(raw.into()))
        .collect();
    let raw = JsObject::array_from(raws, Some(array_prototype));
    strings.insert_property(
        "raw",
        PropertyDescriptor::data(raw.into(), Attribute::all_attrs()),
    );

    let mut args = vec![JsValue::from(strings)];
    for expression in template.exprs() {
        let value = eval_expression(expression, env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        args.push(value);
    }

    // The tag callee follows the call protocol for its `this`.
    let Some((this, callee)) = eval_callee(template.tag(), env, context)? else {
        return Ok(JsValue::Undefined);
    };
    call::call_value(&callee, &this, &args, context)
}

/// Evaluates a callee expression into a `(this, function)` pair.
pub(crate) fn eval_callee(
    expression: &Expression,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<(JsValue, JsValue)>> {
    match expression {
        Expression::PropertyAccess(access) => {
            let target = eval_expression(access.target(), env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            let key = eval_access_field(access.field(), env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            let function = get_value_property(&target, &key, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            Ok(Some((target, function)))
        }
        Expression::SuperPropertyAccess(access) => {
            let key = eval_access_field(access.field(), env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            let this = this_value(env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            let function = super_property_get(&key, env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            Ok(Some((this, function)))
        }
        _ => {
            let function = eval_expression(expression, env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            Ok(Some((JsValue::Undefined, function)))
        }
    }
}

/// Evaluates an argument list, expanding spread elements. Returns `None`
/// when a signal surfaced.
pub(crate) fn eval_arguments(
    args: &[Expression],
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<Vec<JsValue>>> {
    let mut values = Vec::with_capacity(args.len());
    for argument in args {
        match argument {
            Expression::Spread(spread) => {
                let iterable = eval_expression(spread.target(), env, context)?;
                if context.should_stop() {
                    return Ok(None);
                }
                let Some(mut record) = get_iterator(&iterable, IteratorHint::Sync, context)?
                else {
                    return Ok(None);
                };
                while let Some(value) = record.step(context)? {
                    values.push(value);
                }
                if context.should_stop() {
                    return Ok(None);
                }
            }
            expression => {
                let value = eval_expression(expression, env, context)?;
                if context.should_stop() {
                    return Ok(None);
                }
                values.push(value);
            }
        }
    }
    Ok(Some(values))
}

fn eval_access_field(
    field: &PropertyAccessField,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<PropertyKey> {
    match field {
        PropertyAccessField::Const(name) => Ok(PropertyKey::from_string(name)),
        PropertyAccessField::Expr(expression) => {
            let value = eval_expression(expression, env, context)?;
            if context.should_stop() {
                return Ok(PropertyKey::from(""));
            }
            value.to_property_key(context)
        }
    }
}

/// Member access on an arbitrary value: objects walk their chain, strings
/// expose `length` and indexed code units, everything else reads
/// `undefined`.
pub(crate) fn get_value_property(
    base: &JsValue,
    key: &PropertyKey,
    context: &mut Context,
) -> EvalResult<JsValue> {
    match base {
        JsValue::Object(object) => object.get_with_receiver(key, base, context),
        JsValue::String(string) => match key {
            PropertyKey::String(name) if name.as_str() == "length" => {
                Ok(JsValue::from(string.utf16_len()))
            }
            PropertyKey::Index(index) => Ok(string
                .at_utf16(*index as usize)
                .map_or(JsValue::Undefined, JsValue::from)),
            _ => Ok(JsValue::Undefined),
        },
        _ => Ok(JsValue::Undefined),
    }
}

/// Evaluates a member/call chain, cutting it short at optional links with
/// nullish bases. Returns the value plus a flag marking whether the chain
/// was cut.
#[allow(clippy::type_complexity)]
fn eval_chain(
    expression: &Expression,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<(JsValue, bool)>> {
    match expression {
        Expression::PropertyAccess(access) => {
            context.set_source_ref(access.span());
            let Some((target, cut)) = eval_chain_target(access.target(), env, context)? else {
                return Ok(None);
            };
            if cut {
                return Ok(Some((JsValue::Undefined, true)));
            }
            if target.is_null_or_undefined() {
                if access.is_optional() {
                    return Ok(Some((JsValue::Undefined, true)));
                }
                context.throw(JsNativeError::typ().with_message(
                    "Cannot read properties of null or undefined",
                ))?;
                return Ok(None);
            }

            // Hot path: well-known symbol lookups on the `Symbol`
            // namespace skip the property machinery.
            if let (Some(object), PropertyAccessField::Const(name)) =
                (target.as_object(), access.field())
            {
                if JsObject::equals(object, &context.realm().intrinsics().symbol_namespace()) {
                    let well_known = context.realm().well_known().clone();
                    match name.as_ref() {
                        "iterator" => return Ok(Some((well_known.iterator().into(), false))),
                        "asyncIterator" => {
                            return Ok(Some((well_known.async_iterator().into(), false)));
                        }
                        "toStringTag" => {
                            return Ok(Some((well_known.to_string_tag().into(), false)));
                        }
                        _ => {}
                    }
                }
            }

            let key = eval_access_field(access.field(), env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            let value = get_value_property(&target, &key, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            Ok(Some((value, false)))
        }

        Expression::PrivateAccess(access) => {
            let Some((target, cut)) = eval_chain_target(access.target(), env, context)? else {
                return Ok(None);
            };
            if cut {
                return Ok(Some((JsValue::Undefined, true)));
            }
            let value = private_get(&target, access.name(), context)?;
            if context.should_stop() {
                return Ok(None);
            }
            Ok(Some((value, false)))
        }

        Expression::Call(node) => {
            context.set_source_ref(node.span());
            let pair = match node.target() {
                Expression::PropertyAccess(access) => {
                    let Some((target, cut)) = eval_chain_target(access.target(), env, context)?
                    else {
                        return Ok(None);
                    };
                    if cut {
                        return Ok(Some((JsValue::Undefined, true)));
                    }
                    if target.is_null_or_undefined() {
                        if access.is_optional() {
                            return Ok(Some((JsValue::Undefined, true)));
                        }
                        context.throw(JsNativeError::typ().with_message(
                            "Cannot read properties of null or undefined",
                        ))?;
                        return Ok(None);
                    }
                    let key = eval_access_field(access.field(), env, context)?;
                    if context.should_stop() {
                        return Ok(None);
                    }
                    let function = get_value_property(&target, &key, context)?;
                    if context.should_stop() {
                        return Ok(None);
                    }
                    Some((target, function))
                }
                Expression::PrivateAccess(access) => {
                    let Some((target, cut)) = eval_chain_target(access.target(), env, context)?
                    else {
                        return Ok(None);
                    };
                    if cut {
                        return Ok(Some((JsValue::Undefined, true)));
                    }
                    let function = private_get(&target, access.name(), context)?;
                    if context.should_stop() {
                        return Ok(None);
                    }
                    Some((target, function))
                }
                target => {
                    let Some((function, cut)) = eval_chain_target(target, env, context)? else {
                        return Ok(None);
                    };
                    if cut {
                        return Ok(Some((JsValue::Undefined, true)));
                    }
                    eval_callee_value_pair(target, function, env, context)?
                }
            };
            let Some((this, function)) = pair else {
                return Ok(None);
            };

            if function.is_null_or_undefined() && node.is_optional() {
                return Ok(Some((JsValue::Undefined, true)));
            }
            let Some(args) = eval_arguments(node.args(), env, context)? else {
                return Ok(None);
            };
            let value = call::call_value(&function, &this, &args, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            Ok(Some((value, false)))
        }

        other => {
            let value = eval_expression(other, env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            Ok(Some((value, false)))
        }
    }
}

/// Evaluates the base of a chain link, preserving chain cuts from nested
/// links.
fn eval_chain_target(
    expression: &Expression,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<(JsValue, bool)>> {
    match expression {
        Expression::PropertyAccess(_) | Expression::PrivateAccess(_) | Expression::Call(_) => {
            eval_chain(expression, env, context)
        }
        other => {
            let value = eval_expression(other, env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            Ok(Some((value, false)))
        }
    }
}

/// Completes a non-member callee into its `(this, function)` pair.
#[allow(clippy::type_complexity)]
fn eval_callee_value_pair(
    target: &Expression,
    function: JsValue,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<(JsValue, JsValue)>> {
    match target {
        Expression::SuperPropertyAccess(_) => {
            let this = this_value(env, context)?;
            if context.should_stop() {
                return Ok(None);
            }
            Ok(Some((this, function)))
        }
        _ => Ok(Some((JsValue::Undefined, function))),
    }
}

/// Resolves a private name in the current private-name scope. Access from
/// outside any scope that declares the name is invalid.
fn resolve_private_name(
    name: &Rc<str>,
    context: &mut Context,
) -> EvalResult<Option<PrivateName>> {
    let resolved = context
        .private_scope()
        .cloned()
        .and_then(|scope| scope.resolve(name));
    match resolved {
        Some(resolved) => Ok(Some(resolved)),
        None => {
            context
                .throw(JsNativeError::typ().with_message("Invalid access of private member"))?;
            Ok(None)
        }
    }
}

fn private_get(
    target: &JsValue,
    name: &Rc<str>,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let Some(resolved) = resolve_private_name(name, context)? else {
        return Ok(JsValue::Undefined);
    };
    let Some(object) = target.as_object().cloned() else {
        return context
            .throw(JsNativeError::typ().with_message("Invalid access of private member"));
    };
    match object.get_private(resolved.id()) {
        Some(PrivateElement::Field(value)) => Ok(value),
        Some(PrivateElement::Method(method)) => Ok(method.into()),
        Some(PrivateElement::Accessor { getter, setter: _ }) => match getter {
            Some(getter) => call::call_function(&getter, target, &[], context),
            None => context.throw(
                JsNativeError::typ()
                    .with_message(format!("'#{name}' was defined without a getter")),
            ),
        },
        None => context
            .throw(JsNativeError::typ().with_message("Invalid access of private member")),
    }
}

pub(crate) fn private_set(
    target: &JsValue,
    name: &Rc<str>,
    value: JsValue,
    context: &mut Context,
) -> EvalResult<()> {
    let Some(resolved) = resolve_private_name(name, context)? else {
        return Ok(());
    };
    let Some(object) = target.as_object().cloned() else {
        context.throw(JsNativeError::typ().with_message("Invalid access of private member"))?;
        return Ok(());
    };
    match object.get_private(resolved.id()) {
        Some(PrivateElement::Field(_)) => {
            let _ = object.set_private_field(resolved.id(), value);
            Ok(())
        }
        Some(PrivateElement::Method(_)) => {
            context.throw(
                JsNativeError::typ()
                    .with_message(format!("Cannot assign to private method '#{name}'")),
            )?;
            Ok(())
        }
        Some(PrivateElement::Accessor { getter: _, setter }) => match setter {
            Some(setter) => {
                call::call_function(&setter, target, &[value], context)?;
                Ok(())
            }
            None => {
                context.throw(
                    JsNativeError::typ()
                        .with_message(format!("'#{name}' was defined without a setter")),
                )?;
                Ok(())
            }
        },
        None => {
            context
                .throw(JsNativeError::typ().with_message("Invalid access of private member"))?;
            Ok(())
        }
    }
}

/// `super.prop` reads resolve on the home object's prototype, with the
/// current `this` as receiver.
fn super_property_get(
    key: &PropertyKey,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let Some(base) = super_base(env, context)? else {
        return Ok(JsValue::Undefined);
    };
    let this = this_value(env, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    base.get_with_receiver(key, &this, context)
}

pub(crate) fn super_base(
    env: &Environment,
    context: &mut Context,
) -> EvalResult<Option<JsObject>> {
    let function = env
        .this_environment()
        .as_ref()
        .and_then(|env| env.slots())
        .map(|slots| slots.function_object().clone());
    let Some(function) = function else {
        context.throw(
            JsNativeError::syntax().with_message("'super' keyword unexpected here"),
        )?;
        return Ok(None);
    };
    let home = function
        .as_script_function()
        .and_then(|script| script.home_object());
    let Some(home) = home else {
        context.throw(
            JsNativeError::syntax().with_message("'super' keyword unexpected here"),
        )?;
        return Ok(None);
    };
    Ok(home.prototype())
}

pub(crate) fn assign_property_access(
    access: &PropertyAccess,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    let target = eval_expression(access.target(), env, context)?;
    if context.should_stop() {
        return Ok(());
    }
    if target.is_null_or_undefined() {
        context.throw(
            JsNativeError::typ()
                .with_message("Cannot set properties of null or undefined"),
        )?;
        return Ok(());
    }
    let key = eval_access_field(access.field(), env, context)?;
    if context.should_stop() {
        return Ok(());
    }
    let Some(object) = target.as_object() else {
        // Assignments to primitive members are silently dropped in sloppy
        // mode and fail in strict mode.
        if env.is_strict() {
            context.throw(JsNativeError::typ().with_message(format!(
                "Cannot create property '{}' on {}",
                key.to_display_string(),
                target.type_of()
            )))?;
        }
        return Ok(());
    };
    let accepted = object.set_with_receiver(&key, value, &target, context)?;
    if context.should_stop() {
        return Ok(());
    }
    if !accepted && env.is_strict() {
        context.throw(JsNativeError::typ().with_message(format!(
            "Cannot assign to read only property '{}'",
            key.to_display_string()
        )))?;
    }
    Ok(())
}

fn eval_assign(
    node: &krait_ast::expression::Assign,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    // Logical assignments short-circuit before evaluating the value.
    if let Some(op) = node.op().logical_op() {
        let current = read_assign_target(node.target(), env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        let write = match op {
            LogicalOp::And => current.to_boolean(),
            LogicalOp::Or => !current.to_boolean(),
            LogicalOp::Coalesce => current.is_null_or_undefined(),
        };
        if !write {
            return Ok(current);
        }
        let value = eval_named_expression(
            node.value(),
            assign_target_name(node.target()),
            env,
            context,
        )?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        write_assign_target(node.target(), value.clone(), env, context)?;
        return Ok(value);
    }

    if let Some(op) = node.op().binary_op() {
        let current = read_assign_target(node.target(), env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        let rhs = eval_expression(node.value(), env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        let value = operators::apply_binary(op, &current, &rhs, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        write_assign_target(node.target(), value.clone(), env, context)?;
        return Ok(value);
    }

    // Plain assignment.
    if let AssignTarget::Pattern(pattern) = node.target() {
        let value = eval_expression(node.value(), env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        pattern::assign_pattern(pattern, value.clone(), env, context)?;
        return Ok(value);
    }
    let value = eval_named_expression(
        node.value(),
        assign_target_name(node.target()),
        env,
        context,
    )?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    write_assign_target(node.target(), value.clone(), env, context)?;
    Ok(value)
}

fn assign_target_name(target: &AssignTarget) -> Option<&Rc<str>> {
    match target {
        AssignTarget::Identifier(ident) => Some(ident.name()),
        _ => None,
    }
}

fn read_assign_target(
    target: &AssignTarget,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    match target {
        AssignTarget::Identifier(ident) => resolve_identifier(ident.name(), env, context),
        AssignTarget::PropertyAccess(access) => {
            eval_expression(&Expression::PropertyAccess(access.clone()), env, context)
        }
        AssignTarget::PrivateAccess(access) => eval_expression(
            &Expression::PrivateAccess(access.clone()),
            env,
            context,
        ),
        AssignTarget::SuperPropertyAccess(access) => {
            let key = eval_access_field(access.field(), env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            super_property_get(&key, env, context)
        }
        AssignTarget::Pattern(_) => Err(Fault::Invariant(
            "compound assignment to a destructuring pattern".into(),
        )),
    }
}

fn write_assign_target(
    target: &AssignTarget,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    match target {
        AssignTarget::Identifier(ident) => assign_identifier(ident.name(), value, env, context),
        AssignTarget::PropertyAccess(access) => {
            assign_property_access(access, value, env, context)
        }
        AssignTarget::PrivateAccess(access) => {
            let base = eval_expression(access.target(), env, context)?;
            if context.should_stop() {
                return Ok(());
            }
            private_set(&base, access.name(), value, context)
        }
        AssignTarget::SuperPropertyAccess(access) => {
            let key = eval_access_field(access.field(), env, context)?;
            if context.should_stop() {
                return Ok(());
            }
            let Some(base) = super_base(env, context)? else {
                return Ok(());
            };
            let this = this_value(env, context)?;
            if context.should_stop() {
                return Ok(());
            }
            base.set_with_receiver(&key, value, &this, context)?;
            Ok(())
        }
        AssignTarget::Pattern(pattern) => pattern::assign_pattern(pattern, value, env, context),
    }
}

fn eval_unary(
    node: &krait_ast::expression::Unary,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    match node.op() {
        UnaryOp::TypeOf => {
            // `typeof unresolvable` is "undefined", never a throw; a TDZ
            // read still fails.
            if let Expression::Identifier(ident) = node.target() {
                let key = JsString::from(ident.name());
                let mut current = env.clone();
                loop {
                    match current.own_binding_value(&key) {
                        Some(Some(value)) => return Ok(value.type_of().into()),
                        Some(None) => {
                            return context.throw(JsNativeError::reference().with_message(
                                format!("Cannot access '{key}' before initialization"),
                            ));
                        }
                        None => {}
                    }
                    if let Some(object) = current.with_object() {
                        let property = PropertyKey::from_string(&key);
                        if object.has_property(&property) {
                            let object = object.clone();
                            let value = object.get(property, context)?;
                            if context.should_stop() {
                                return Ok(JsValue::Undefined);
                            }
                            return Ok(value.type_of().into());
                        }
                    }
                    match current.parent() {
                        Some(parent) => current = parent.clone(),
                        None => return Ok("undefined".into()),
                    }
                }
            }
            let value = eval_expression(node.target(), env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            Ok(value.type_of().into())
        }

        UnaryOp::Delete => eval_delete(node.target(), env, context),

        UnaryOp::Void => {
            eval_expression(node.target(), env, context)?;
            Ok(JsValue::Undefined)
        }

        op => {
            let value = eval_expression(node.target(), env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            operators::apply_unary(op, &value, context)
        }
    }
}

fn eval_delete(
    target: &Expression,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    match target {
        Expression::PropertyAccess(access) => {
            let base = eval_expression(access.target(), env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            if base.is_null_or_undefined() {
                if access.is_optional() {
                    return Ok(JsValue::Boolean(true));
                }
                return context.throw(JsNativeError::typ().with_message(
                    "Cannot read properties of null or undefined",
                ));
            }
            let key = eval_access_field(access.field(), env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            let Some(object) = base.as_object() else {
                return Ok(JsValue::Boolean(true));
            };
            let deleted = object.delete_property(&key);
            if !deleted && env.is_strict() {
                return context.throw(JsNativeError::typ().with_message(format!(
                    "Cannot delete property '{}'",
                    key.to_display_string()
                )));
            }
            Ok(JsValue::Boolean(deleted))
        }
        Expression::Identifier(ident) => {
            if env.is_strict() {
                return context.throw(JsNativeError::syntax().with_message(
                    "Delete of an unqualified identifier in strict mode",
                ));
            }
            let deleted = env.delete_binding(&ident.name().into());
            Ok(JsValue::Boolean(!matches!(
                deleted,
                crate::environments::DeleteBinding::NotConfigurable
            )))
        }
        other => {
            eval_expression(other, env, context)?;
            Ok(JsValue::Boolean(true))
        }
    }
}

fn eval_update(
    node: &krait_ast::expression::Update,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let old = match node.target() {
        UpdateTarget::Identifier(ident) => resolve_identifier(ident.name(), env, context)?,
        UpdateTarget::PropertyAccess(access) => {
            eval_expression(&Expression::PropertyAccess(access.clone()), env, context)?
        }
    };
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    let old = old.to_numeric(context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    let (old_value, new_value) = match old {
        Numeric::Number(number) => {
            let delta = if node.op().is_increment() { 1.0 } else { -1.0 };
            (JsValue::Number(number), JsValue::Number(number + delta))
        }
        Numeric::BigInt(bigint) => {
            let one = JsBigInt::from(1);
            let updated = if node.op().is_increment() {
                JsBigInt::add(&bigint, &one)
            } else {
                JsBigInt::sub(&bigint, &one)
            };
            (JsValue::BigInt(bigint), JsValue::BigInt(updated))
        }
    };

    match node.target() {
        UpdateTarget::Identifier(ident) => {
            assign_identifier(ident.name(), new_value.clone(), env, context)?;
        }
        UpdateTarget::PropertyAccess(access) => {
            assign_property_access(access, new_value.clone(), env, context)?;
        }
    }
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    Ok(if node.op().is_prefix() {
        new_value
    } else {
        old_value
    })
}

fn eval_logical(
    op: LogicalOp,
    lhs: &Expression,
    rhs: &Expression,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let lhs = eval_expression(lhs, env, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let take_rhs = match op {
        LogicalOp::And => lhs.to_boolean(),
        LogicalOp::Or => !lhs.to_boolean(),
        LogicalOp::Coalesce => lhs.is_null_or_undefined(),
    };
    if take_rhs {
        eval_expression(rhs, env, context)
    } else {
        Ok(lhs)
    }
}

// === Suspension machinery (yield / await sites) ===

/// Takes the next suspension-site id when running under a generator or
/// async body.
fn begin_suspension_site(context: &mut Context) -> Option<usize> {
    context.generator_run.as_mut().map(|run| run.next_site())
}

/// Gets the recorded resume payload of a site, if the current pass is a
/// replay over it.
fn recorded_payload(
    site: usize,
    context: &mut Context,
) -> Option<crate::generator::ResumePayload> {
    context
        .generator_run
        .as_ref()
        .and_then(|run| run.records.get(&site).cloned())
}

/// Applies a recorded payload at a replayed site: normal resumes produce
/// the value, abrupt resumes re-raise through the signal.
fn apply_recorded(
    payload: crate::generator::ResumePayload,
    context: &mut Context,
) -> JsValue {
    use crate::generator::ResumeKind;
    match payload.kind {
        ResumeKind::Normal => payload.value,
        ResumeKind::Throw => {
            context.throw_value(payload.value);
            JsValue::Undefined
        }
        ResumeKind::Return => {
            context.set_signal(Signal::Return(payload.value));
            JsValue::Undefined
        }
    }
}

/// Awaits an already-evaluated operand from a statement driver (for
/// `for await-of`).
pub(crate) fn await_value(
    operand: JsValue,
    _env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let site = begin_suspension_site(context);
    if let Some(site) = site {
        if let Some(recorded) = recorded_payload(site, context) {
            return Ok(apply_recorded(recorded, context));
        }
    }
    await_with_site(operand, site, context)
}

fn await_with_site(
    operand: JsValue,
    site: Option<usize>,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let async_mode = context
        .generator_run
        .as_ref()
        .is_some_and(|run| run.async_mode);

    let scheduler = context.scheduler();
    match scheduler.try_await(&operand, context)? {
        AwaitOutcome::Resolved(value) => {
            if let (Some(site), Some(run)) = (site, context.generator_run.as_mut()) {
                // Memoize so a later suspension in the same instruction
                // does not re-await on replay.
                run.records.insert(
                    site,
                    crate::generator::ResumePayload {
                        kind: crate::generator::ResumeKind::Normal,
                        value: value.clone(),
                    },
                );
            }
            Ok(value)
        }
        AwaitOutcome::Settled => {
            let throw_reason = if let Signal::Throw(reason) = context.signal() {
                Some(reason.clone())
            } else {
                None
            };
            if let (Some(site), Some(run), Some(reason)) =
                (site, context.generator_run.as_mut(), throw_reason)
            {
                run.records.insert(
                    site,
                    crate::generator::ResumePayload {
                        kind: crate::generator::ResumeKind::Throw,
                        value: reason,
                    },
                );
            }
            Ok(JsValue::Undefined)
        }
        AwaitOutcome::Pending(promise) => {
            if !async_mode {
                return Err(Fault::Unsupported(
                    "await of a pending promise outside an async context".into(),
                ));
            }
            let site = site.ok_or_else(|| {
                Fault::Invariant("async mode without an active suspension site".into())
            })?;
            Err(Fault::Suspend(Box::new(Suspension {
                site,
                kind: SuspendKind::Await(promise.into()),
            })))
        }
    }
}

fn eval_yield(
    node: &krait_ast::expression::Yield,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    if context.generator_run.is_none() {
        return Err(Fault::Unsupported("yield outside a generator body".into()));
    }
    let Some(site) = begin_suspension_site(context) else {
        return Err(Fault::Unsupported("yield outside a generator body".into()));
    };

    if node.is_delegate() {
        return eval_yield_star(node, site, env, context);
    }

    if let Some(recorded) = recorded_payload(site, context) {
        return Ok(apply_recorded(recorded, context));
    }

    let value = match node.target() {
        Some(target) => {
            let value = eval_expression(target, env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            value
        }
        None => JsValue::Undefined,
    };

    // An async generator awaits the operand before yielding it.
    let value = if context
        .generator_run
        .as_ref()
        .is_some_and(|run| run.async_mode)
    {
        let value = await_value(value, env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        value
    } else {
        value
    };

    Err(Fault::Suspend(Box::new(Suspension {
        site,
        kind: SuspendKind::Yield(value),
    })))
}

/// Delegating `yield*`: drives the sub-iterator, forwarding resume
/// payloads, and completes with the sub-iterator's return value.
fn eval_yield_star(
    node: &krait_ast::expression::Yield,
    site: usize,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    use crate::generator::{ResumeKind, ResumePayload};

    // A finished delegation replays its memoized completion.
    if let Some(run) = context.generator_run.as_ref() {
        if let Some(state) = run.star_states.get(&site) {
            if let Some(done) = state.done_value.clone() {
                return Ok(done);
            }
        }
    }

    let async_mode = context
        .generator_run
        .as_ref()
        .is_some_and(|run| run.async_mode);

    // Lazily create the delegated iterator.
    let has_state = context
        .generator_run
        .as_ref()
        .is_some_and(|run| run.star_states.contains_key(&site));
    if !has_state {
        let target = node.target().ok_or_else(|| {
            Fault::Invariant("delegating yield without an iterable operand".into())
        })?;
        let iterable = eval_expression(target, env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        let hint = if async_mode {
            IteratorHint::Async
        } else {
            IteratorHint::Sync
        };
        let Some(record) = get_iterator(&iterable, hint, context)? else {
            return Ok(JsValue::Undefined);
        };
        if let Some(run) = context.generator_run.as_mut() {
            run.star_states
                .insert(site, crate::generator::StarState::new(record));
        }
    }

    context.check_cancelled()?;

    // The payload delivered by the latest external entry, if any.
    let payload = context
        .generator_run
        .as_mut()
        .and_then(|run| run.records.remove(&site))
        .unwrap_or(ResumePayload {
            kind: ResumeKind::Normal,
            value: JsValue::Undefined,
        });

    let record = context
        .generator_run
        .as_ref()
        .and_then(|run| run.star_states.get(&site))
        .map(|state| state.iterator.clone())
        .ok_or_else(|| Fault::Invariant("yield* state vanished mid-delegation".into()))?;
    let iterator_value = JsValue::from(record.iterator().clone());

    let raw = match payload.kind {
        ResumeKind::Normal => {
            let mut record = record.clone();
            let raw = record.step_raw(Some(&payload.value), context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            raw
        }
        ResumeKind::Throw => {
            let method = record.iterator().get_method("throw", context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            let Some(method) = method else {
                // The delegated iterator cannot handle throws: close it
                // and re-raise in the outer generator.
                record.close(context)?;
                return context.throw(JsNativeError::typ().with_message(
                    "The iterator does not provide a 'throw' method",
                ));
            };
            let raw =
                call::call_function(&method, &iterator_value, &[payload.value], context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            raw
        }
        ResumeKind::Return => {
            let method = record.iterator().get_method("return", context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            let Some(method) = method else {
                context.set_signal(Signal::Return(payload.value));
                return finish_yield_star(site, JsValue::Undefined, context);
            };
            let raw =
                call::call_function(&method, &iterator_value, &[payload.value], context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            let raw = maybe_await(raw, async_mode, env, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            return match unwrap_step_result(raw, context)? {
                StepUnwrap::Done(value) => {
                    context.set_signal(Signal::Return(value));
                    finish_yield_star(site, JsValue::Undefined, context)
                }
                StepUnwrap::Value(value) => Err(Fault::Suspend(Box::new(Suspension {
                    site,
                    kind: SuspendKind::Yield(value),
                }))),
                StepUnwrap::Stopped => Ok(JsValue::Undefined),
            };
        }
    };

    let raw = maybe_await(raw, async_mode, env, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    match unwrap_step_result(raw, context)? {
        StepUnwrap::Done(value) => finish_yield_star(site, value, context),
        // Not done: suspend, producing the sub-iterator's value without
        // advancing past the delegation site.
        StepUnwrap::Value(value) => Err(Fault::Suspend(Box::new(Suspension {
            site,
            kind: SuspendKind::Yield(value),
        }))),
        StepUnwrap::Stopped => Ok(JsValue::Undefined),
    }
}

/// Awaits an intermediate value when delegating inside an async generator.
fn maybe_await(
    value: JsValue,
    async_mode: bool,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    if async_mode {
        await_value(value, env, context)
    } else {
        Ok(value)
    }
}

enum StepUnwrap {
    Value(JsValue),
    Done(JsValue),
    Stopped,
}

fn unwrap_step_result(result: JsValue, context: &mut Context) -> EvalResult<StepUnwrap> {
    let Some(result) = result.as_object().cloned() else {
        context.throw(JsNativeError::typ().with_message("iterator result is not an object"))?;
        return Ok(StepUnwrap::Stopped);
    };
    let done = result.get("done", context)?.to_boolean();
    if context.should_stop() {
        return Ok(StepUnwrap::Stopped);
    }
    let value = result.get("value", context)?;
    if context.should_stop() {
        return Ok(StepUnwrap::Stopped);
    }
    Ok(if done {
        StepUnwrap::Done(value)
    } else {
        StepUnwrap::Value(value)
    })
}

fn finish_yield_star(
    site: usize,
    value: JsValue,
    context: &mut Context,
) -> EvalResult<JsValue> {
    if let Some(run) = context.generator_run.as_mut() {
        if let Some(state) = run.star_states.get_mut(&site) {
            state.done_value = Some(value.clone());
        }
    }
    Ok(value)
}
