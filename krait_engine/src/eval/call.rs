//! The call and construct protocols.

use std::rc::Rc;

use krait_ast::function::FunctionKind;

use crate::{
    context::{Context, ScopeFrame, ScopeKind, ScopeMode, Signal},
    environments::{DeclarativeEnvironment, DefineOptions, Environment, FunctionSlots},
    error::{EvalResult, JsNativeError},
    function::{ConstructorKind, ScriptFunction, ThisMode},
    object::{JsObject, ObjectKind},
    private::PrivateElement,
    value::JsValue,
};

use super::{eval_body, expression, function as function_eval};

/// Calls an arbitrary value; non-callables raise a `TypeError`.
pub fn call_value(
    callee: &JsValue,
    this: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> EvalResult<JsValue> {
    let Some(function) = callee.as_callable() else {
        return context.throw(
            JsNativeError::typ()
                .with_message(format!("{} is not a function", callee.to_display_string())),
        );
    };
    call_function(&function.clone(), this, args, context)
}

/// `[[Call]]` on a function object.
pub fn call_function(
    callee: &JsObject,
    this: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> EvalResult<JsValue> {
    context.check_cancelled()?;
    context.enter_call()?;
    let result = dispatch_call(callee, this, args, context);
    context.leave_call();
    result
}

fn dispatch_call(
    callee: &JsObject,
    this: &JsValue,
    args: &[JsValue],
    context: &mut Context,
) -> EvalResult<JsValue> {
    let kind = {
        let object = callee.borrow();
        match object.kind() {
            ObjectKind::NativeFunction(data) => CallKind::Native(data.function.clone()),
            ObjectKind::BoundFunction(bound) => {
                CallKind::Bound(bound.target.clone(), bound.this.clone(), bound.args.clone())
            }
            ObjectKind::Function(script) => CallKind::Script(script.clone()),
            _ => {
                return Err(crate::error::Fault::Invariant(
                    "call dispatched on a non-callable object".into(),
                ));
            }
        }
    };

    match kind {
        CallKind::Native(native) => native.call(this, args, context),
        CallKind::Bound(target, bound_this, bound_args) => {
            let mut all_args = bound_args;
            all_args.extend_from_slice(args);
            call_function(&target, &bound_this, &all_args, context)
        }
        CallKind::Script(script) => {
            if script.is_class_constructor() {
                return context.throw(JsNativeError::typ().with_message(
                    "Class constructor cannot be invoked without 'new'",
                ));
            }
            match script.node().kind() {
                FunctionKind::Generator | FunctionKind::AsyncGenerator => {
                    let env = prepare_activation(callee, &script, this, None, false, context);
                    init_activation(&script, args, &env, context)?;
                    if context.should_stop() {
                        return Ok(JsValue::Undefined);
                    }
                    crate::generator::create_generator_object(callee, &script, env, context)
                }
                FunctionKind::Async => {
                    crate::generator::run_async_function(callee, &script, this, args, context)
                }
                FunctionKind::Ordinary => {
                    let env = prepare_activation(callee, &script, this, None, false, context);
                    init_activation(&script, args, &env, context)?;
                    if context.should_stop() {
                        return Ok(JsValue::Undefined);
                    }
                    let (value, _returned) = run_activation(&script, &env, context)?;
                    Ok(value)
                }
            }
        }
    }
}

enum CallKind {
    Native(crate::function::NativeFunction),
    Bound(JsObject, JsValue, Vec<JsValue>),
    Script(Rc<ScriptFunction>),
}

/// Builds the activation environment of a script function: function slots
/// (unless an arrow), `this` per the function's mode, and the captured
/// scope as parent.
pub(crate) fn prepare_activation(
    callee: &JsObject,
    script: &ScriptFunction,
    this: &JsValue,
    new_target: Option<JsObject>,
    uninitialized_this: bool,
    context: &Context,
) -> Environment {
    let node = script.node();
    let slots = if node.is_arrow() {
        None
    } else if uninitialized_this {
        Some(FunctionSlots::new_uninitialized_this(
            callee.clone(),
            new_target,
        ))
    } else {
        let this = match script.this_mode() {
            ThisMode::Strict | ThisMode::Lexical => this.clone(),
            ThisMode::Global => {
                if this.is_null_or_undefined() {
                    context.realm().global_object().into()
                } else {
                    this.clone()
                }
            }
        };
        Some(FunctionSlots::new(this, callee.clone(), new_target))
    };
    DeclarativeEnvironment::new_function(
        script.environment().clone(),
        node.is_strict(),
        slots,
    )
}

/// Binds parameters, the `arguments` object, and the hoisted declarations
/// of the body.
pub(crate) fn init_activation(
    script: &ScriptFunction,
    args: &[JsValue],
    env: &Environment,
    context: &mut Context,
) -> EvalResult<()> {
    let node = script.node();

    if let Some(private_scope) = script.private_scope() {
        context.push_private_scope(private_scope.clone());
    }

    function_eval::bind_parameters(node, args, env, context)?;
    if context.should_stop() {
        if script.private_scope().is_some() {
            context.pop_private_scope();
        }
        return Ok(());
    }

    if !node.is_arrow() && !function_eval::parameters_bind_name(node, "arguments") {
        let arguments = function_eval::create_arguments_object(args, context);
        env.define(
            "arguments".into(),
            arguments.into(),
            DefineOptions::var(),
        );
    }

    if script.private_scope().is_some() {
        context.pop_private_scope();
    }
    Ok(())
}

/// Runs the body of an already-initialized activation. The boolean marks
/// an explicit `return`.
pub(crate) fn run_activation(
    script: &ScriptFunction,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<(JsValue, bool)> {
    let node = script.node();
    let annex_b = context.realm().annex_b() && !env.is_strict();

    if let Some(private_scope) = script.private_scope() {
        context.push_private_scope(private_scope.clone());
    }
    context.push_scope_frame(ScopeFrame {
        kind: ScopeKind::Function,
        mode: if env.is_strict() {
            ScopeMode::Strict
        } else if annex_b {
            ScopeMode::SloppyAnnexB
        } else {
            ScopeMode::Sloppy
        },
        skip_annex_b: !annex_b,
    });

    let result = eval_body(node.body().statements(), env, annex_b, context);

    context.pop_scope_frame();
    if script.private_scope().is_some() {
        context.pop_private_scope();
    }
    result?;

    match context.signal() {
        Signal::Return(_) => {
            let Signal::Return(value) = context.take_signal() else {
                return Ok((JsValue::Undefined, false));
            };
            Ok((value, true))
        }
        _ => Ok((JsValue::Undefined, false)),
    }
}

/// `[[Construct]]` on an arbitrary value.
pub(crate) fn construct_value(
    constructor: &JsValue,
    args: &[JsValue],
    new_target: Option<JsObject>,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let Some(function) = constructor.as_object() else {
        return context.throw(
            JsNativeError::typ().with_message(format!(
                "{} is not a constructor",
                constructor.to_display_string()
            )),
        );
    };
    construct(&function.clone(), args, new_target, context)
}

/// `[[Construct]]`: allocates the instance, runs instance-field
/// initializers, invokes the body, and applies the return-override rule.
pub fn construct(
    constructor: &JsObject,
    args: &[JsValue],
    new_target: Option<JsObject>,
    context: &mut Context,
) -> EvalResult<JsValue> {
    if !constructor.is_constructor() {
        // Host functions may carry a bespoke refusal message.
        let message = {
            let object = constructor.borrow();
            match object.kind() {
                ObjectKind::NativeFunction(data) => data
                    .construct_error
                    .clone()
                    .unwrap_or_else(|| format!("{} is not a constructor", data.name)),
                _ => "value is not a constructor".to_owned(),
            }
        };
        return context.throw(JsNativeError::typ().with_message(message));
    }

    context.check_cancelled()?;
    context.enter_call()?;
    let result = dispatch_construct(constructor, args, new_target, context);
    context.leave_call();
    result
}

fn dispatch_construct(
    constructor: &JsObject,
    args: &[JsValue],
    new_target: Option<JsObject>,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let kind = {
        let object = constructor.borrow();
        match object.kind() {
            ObjectKind::NativeFunction(data) => CallKind::Native(data.function.clone()),
            ObjectKind::BoundFunction(bound) => {
                CallKind::Bound(bound.target.clone(), bound.this.clone(), bound.args.clone())
            }
            ObjectKind::Function(script) => CallKind::Script(script.clone()),
            _ => {
                return Err(crate::error::Fault::Invariant(
                    "construct dispatched on a non-callable object".into(),
                ));
            }
        }
    };

    match kind {
        CallKind::Native(native) => {
            // Host constructors build their own instance.
            let result = native.call(&JsValue::Undefined, args, context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            if result.is_object() {
                return Ok(result);
            }
            Ok(JsObject::new_ordinary(Some(
                context.realm().intrinsics().object_prototype(),
            ))
            .into())
        }
        CallKind::Bound(target, _, bound_args) => {
            let mut all_args = bound_args;
            all_args.extend_from_slice(args);
            construct(&target, &all_args, new_target, context)
        }
        CallKind::Script(script) => {
            construct_script(constructor, &script, args, new_target, context)
        }
    }
}

fn construct_script(
    constructor: &JsObject,
    script: &Rc<ScriptFunction>,
    args: &[JsValue],
    new_target: Option<JsObject>,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let new_target = new_target.unwrap_or_else(|| constructor.clone());

    if script.constructor_kind() == ConstructorKind::Derived {
        // A derived default constructor forwards its arguments to super.
        if script.is_default_constructor() {
            let Some(super_constructor) = constructor.prototype() else {
                return context.throw(
                    JsNativeError::typ().with_message("superclass must be a constructor"),
                );
            };
            let instance = construct(&super_constructor, args, Some(new_target), context)?;
            if context.should_stop() {
                return Ok(JsValue::Undefined);
            }
            initialize_instance_elements(constructor, &instance, context)?;
            return Ok(instance);
        }

        // `this` stays uninitialized until the body calls `super()`.
        let env = prepare_activation(
            constructor,
            script,
            &JsValue::Undefined,
            Some(new_target),
            true,
            context,
        );
        init_activation(script, args, &env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        let (value, returned) = run_activation(script, &env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        if returned && value.is_object() {
            return Ok(value);
        }
        if returned && !value.is_undefined() {
            return context.throw(JsNativeError::typ().with_message(
                "Derived constructors may only return an object or undefined",
            ));
        }
        let this = env.slots().and_then(FunctionSlots::this);
        return match this {
            Some(this) => Ok(this),
            None => context.throw(JsNativeError::reference().with_message(
                "Must call super constructor in derived class before returning",
            )),
        };
    }

    // Base constructors (and ordinary functions) allocate the instance,
    // with its prototype taken from the originally invoked constructor.
    let prototype = new_target.get("prototype", context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let prototype = prototype
        .as_object()
        .cloned()
        .unwrap_or_else(|| context.realm().intrinsics().object_prototype());
    let instance = JsObject::new_ordinary(Some(prototype));
    let instance_value = JsValue::from(instance);

    initialize_instance_elements(constructor, &instance_value, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    let env = prepare_activation(
        constructor,
        script,
        &instance_value,
        Some(new_target),
        false,
        context,
    );
    init_activation(script, args, &env, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }
    let (value, returned) = run_activation(script, &env, context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    // The return override: an explicit object return replaces the
    // allocated instance.
    if returned && value.is_object() {
        return Ok(value);
    }
    Ok(instance_value)
}

/// `InitializeInstanceElements`: installs the class's private methods and
/// runs its instance-field initializers on a fresh instance.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-initializeinstanceelements
pub(crate) fn initialize_instance_elements(
    constructor: &JsObject,
    instance: &JsValue,
    context: &mut Context,
) -> EvalResult<()> {
    let Some(script) = constructor.as_script_function() else {
        return Ok(());
    };

    if let Some(object) = instance.as_object() {
        for (name, element) in script.private_methods() {
            object.install_private(name.id(), element);
        }
    }

    let fields = script.fields();
    if fields.is_empty() {
        return Ok(());
    }

    if let Some(private_scope) = script.private_scope() {
        context.push_private_scope(private_scope.clone());
    }
    let result = run_field_initializers(constructor, &script, instance, context);
    if script.private_scope().is_some() {
        context.pop_private_scope();
    }
    result
}

fn run_field_initializers(
    constructor: &JsObject,
    script: &Rc<ScriptFunction>,
    instance: &JsValue,
    context: &mut Context,
) -> EvalResult<()> {
    use crate::function::FieldKey;
    use crate::property::{Attribute, PropertyDescriptor};

    for record in script.fields() {
        let env = DeclarativeEnvironment::new_function(
            script.environment().clone(),
            true,
            Some(FunctionSlots::new(
                instance.clone(),
                constructor.clone(),
                None,
            )),
        );
        let inferred: Option<Rc<str>> = match &record.key {
            FieldKey::Property(key) => Some(key.to_display_string().into()),
            FieldKey::Private(name) => Some(format!("#{}", name.description()).into()),
        };
        let value = match &record.init {
            Some(init) => {
                let value =
                    expression::eval_named_expression(init, inferred.as_ref(), &env, context)?;
                if context.should_stop() {
                    return Ok(());
                }
                value
            }
            None => JsValue::Undefined,
        };
        let Some(object) = instance.as_object() else {
            continue;
        };
        match &record.key {
            FieldKey::Property(key) => {
                object.insert_property(
                    key.clone(),
                    PropertyDescriptor::data(value, Attribute::all_attrs()),
                );
            }
            FieldKey::Private(name) => {
                object.install_private(name.id(), PrivateElement::Field(value));
            }
        }
    }
    Ok(())
}

/// Evaluates a `super(...)` call inside a derived constructor.
pub(crate) fn eval_super_call(
    node: &krait_ast::expression::SuperCall,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    let slots_env = env.this_environment();
    let Some(slots) = slots_env.as_ref().and_then(|env| env.slots()) else {
        return context.throw(
            JsNativeError::syntax().with_message("'super' keyword unexpected here"),
        );
    };
    let active = slots.function_object().clone();
    let new_target = slots.new_target().cloned().unwrap_or_else(|| active.clone());

    // The superclass constructor is the active function's [[Prototype]].
    let Some(super_constructor) = active.prototype() else {
        return context
            .throw(JsNativeError::typ().with_message("superclass must be a constructor"));
    };
    if !super_constructor.is_constructor() {
        return context
            .throw(JsNativeError::typ().with_message("superclass must be a constructor"));
    }

    let Some(args) = expression::eval_arguments(node.args(), env, context)? else {
        return Ok(JsValue::Undefined);
    };

    let result = construct(&super_constructor, &args, Some(new_target), context)?;
    if context.should_stop() {
        return Ok(JsValue::Undefined);
    }

    if !slots.bind_this(result.clone()) {
        return context.throw(
            JsNativeError::reference()
                .with_message("Super constructor may only be called once"),
        );
    }

    // Binding `this` also runs the derived class's own field
    // initializers.
    initialize_instance_elements(&active, &result, context)?;
    Ok(result)
}
