//! Function object creation and activation plumbing.

use std::rc::Rc;

use krait_ast::{
    declaration::Binding,
    function::{Function as FunctionNode, FunctionKind},
};

use crate::{
    context::Context,
    environments::{DefineOptions, Environment},
    error::EvalResult,
    function::ScriptFunction,
    object::{JsObject, ObjectKind},
    property::{Attribute, PropertyDescriptor, PropertyKey},
    string::JsString,
    symbol::JsSymbol,
    value::JsValue,
};

use super::pattern::{bind_pattern_binding, BindingMode};

/// Creates a function object for a function definition closing over `env`.
pub(crate) fn make_function(
    node: &Rc<FunctionNode>,
    env: &Environment,
    context: &mut Context,
) -> JsObject {
    let script = ScriptFunction::new(
        node.clone(),
        env.clone(),
        context.realm().clone(),
        context.private_scope().cloned(),
    );
    function_object_from_script(script, context)
}

/// Creates a method object: like [`make_function`] but with a home object
/// and no `[[Construct]]`.
pub(crate) fn make_method(
    node: &Rc<FunctionNode>,
    env: &Environment,
    home: JsObject,
    context: &mut Context,
) -> JsObject {
    let mut script = ScriptFunction::new(
        node.clone(),
        env.clone(),
        context.realm().clone(),
        context.private_scope().cloned(),
    );
    script.set_method();
    script.set_home_object(home);
    function_object_from_script(script, context)
}

/// Wraps prepared [`ScriptFunction`] data into a function object, wiring
/// `name`, `length` and (for constructible flavors) `prototype`.
pub(crate) fn function_object_from_script(
    script: ScriptFunction,
    context: &mut Context,
) -> JsObject {
    let intrinsics = context.realm().intrinsics().clone();
    let node = script.node().clone();
    let is_method = script.is_method();

    let name: JsString = node
        .name()
        .map_or_else(JsString::empty, |ident| ident.name().into());
    let length = node.parameters().length();

    let object = JsObject::from_proto_and_kind(
        Some(intrinsics.function_prototype()),
        ObjectKind::Function(Rc::new(script)),
    );
    object.insert_property(
        "name",
        PropertyDescriptor::data(name.into(), Attribute::CONFIGURABLE),
    );
    object.insert_property(
        "length",
        PropertyDescriptor::data(JsValue::from(length), Attribute::CONFIGURABLE),
    );

    // Constructible flavors get a `prototype` object; generator flavors
    // get one linking their instances to the generator prototypes.
    if node.kind().is_generator() {
        let parent = if node.kind().is_async() {
            intrinsics.async_generator_prototype()
        } else {
            intrinsics.generator_prototype()
        };
        let prototype = JsObject::new_ordinary(Some(parent));
        object.insert_property(
            "prototype",
            PropertyDescriptor::data(prototype.into(), Attribute::WRITABLE),
        );
    } else if !node.is_arrow() && !is_method && node.kind() == FunctionKind::Ordinary {
        let prototype = JsObject::new_ordinary(Some(intrinsics.object_prototype()));
        prototype.insert_property(
            "constructor",
            PropertyDescriptor::data(
                object.clone().into(),
                Attribute::WRITABLE | Attribute::CONFIGURABLE,
            ),
        );
        object.insert_property(
            "prototype",
            PropertyDescriptor::data(prototype.into(), Attribute::WRITABLE),
        );
    }

    object
}

/// Names an anonymous function after its binding target, if it is still
/// unnamed.
pub(crate) fn set_function_name(object: &JsObject, name: &str) {
    let key = PropertyKey::from("name");
    let current = object
        .get_own_property(&key)
        .map(|descriptor| descriptor.expect_value());
    let unnamed = matches!(&current, Some(JsValue::String(s)) if s.is_empty()) || current.is_none();
    if unnamed {
        object.insert_property(
            key,
            PropertyDescriptor::data(
                JsValue::String(name.into()),
                Attribute::CONFIGURABLE,
            ),
        );
    }
}

/// Binds the formal parameters of an activation into its environment:
/// positional values, defaults, destructuring patterns and the rest
/// parameter.
pub(crate) fn bind_parameters(
    node: &FunctionNode,
    args: &[JsValue],
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    let mut position = 0_usize;
    for parameter in node.parameters().as_ref() {
        if parameter.is_rest() {
            let rest: Vec<JsValue> = args.get(position..).unwrap_or(&[]).to_vec();
            let rest = JsObject::array_from(
                rest,
                Some(context.realm().intrinsics().array_prototype()),
            );
            bind_parameter_value(parameter.variable().binding(), rest.into(), env, context)?;
            if context.should_stop() {
                return Ok(());
            }
            position = args.len();
            continue;
        }

        let mut value = args.get(position).cloned().unwrap_or_default();
        position += 1;

        if value.is_undefined() {
            if let Some(default) = parameter.variable().init() {
                let inferred = match parameter.variable().binding() {
                    Binding::Identifier(ident) => Some(ident.name().clone()),
                    Binding::Pattern(_) => None,
                };
                value = super::expression::eval_named_expression(
                    default,
                    inferred.as_ref(),
                    env,
                    context,
                )?;
                if context.should_stop() {
                    return Ok(());
                }
            }
        }

        bind_parameter_value(parameter.variable().binding(), value, env, context)?;
        if context.should_stop() {
            return Ok(());
        }
    }
    Ok(())
}

fn bind_parameter_value(
    binding: &Binding,
    value: JsValue,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    match binding {
        Binding::Identifier(ident) => {
            env.define(ident.name().into(), value, DefineOptions::param());
            Ok(())
        }
        Binding::Pattern(pattern) => {
            bind_pattern_binding(pattern, value, BindingMode::Param, env, context)
        }
    }
}

/// Creates the (unmapped) `arguments` object of an activation.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-createunmappedargumentsobject
pub(crate) fn create_arguments_object(args: &[JsValue], context: &Context) -> JsObject {
    let intrinsics = context.realm().intrinsics();

    // 2. Let obj be OrdinaryObjectCreate(%Object.prototype%).
    let object = JsObject::from_proto_and_kind(
        Some(intrinsics.object_prototype()),
        ObjectKind::Arguments,
    );

    // 5.-6. The indexed arguments.
    for (index, value) in args.iter().enumerate() {
        object.insert_property(
            PropertyKey::Index(index as u32),
            PropertyDescriptor::data(value.clone(), Attribute::all_attrs()),
        );
    }

    // 4. "length" is non-enumerable.
    object.insert_property(
        "length",
        PropertyDescriptor::data(
            JsValue::from(args.len()),
            Attribute::WRITABLE | Attribute::CONFIGURABLE,
        ),
    );

    // 7. @@iterator is %Array.prototype.values%.
    let values = intrinsics
        .array_prototype()
        .get_own_property(&PropertyKey::from("values"))
        .map(|descriptor| descriptor.expect_value());
    if let Some(values) = values {
        object.insert_property(
            PropertyKey::Symbol(JsSymbol::iterator()),
            PropertyDescriptor::data(values, Attribute::WRITABLE | Attribute::CONFIGURABLE),
        );
    }

    object
}

/// Returns `true` if a parameter of the function binds the given name.
pub(crate) fn parameters_bind_name(node: &FunctionNode, name: &str) -> bool {
    node.parameters()
        .bound_idents()
        .iter()
        .any(|ident| ident.as_str() == name)
}
