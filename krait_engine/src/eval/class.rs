//! Class definition evaluation.
//!
//! More information:
//!  - [ECMAScript reference][spec]
//!
//! [spec]: https://tc39.es/ecma262/#sec-runtime-semantics-classdefinitionevaluation

use std::rc::Rc;

use krait_ast::{
    function::{Class, ClassElement, FormalParameterList, Function as FunctionNode, FunctionKind},
    property::MethodKind,
    statement_list::StatementList,
};
use rustc_hash::FxHashMap;

use crate::{
    context::Context,
    environments::{DeclarativeEnvironment, DefineOptions, Environment},
    error::{EvalResult, JsNativeError},
    function::{ClassFieldRecord, ConstructorKind, FieldKey, ScriptFunction},
    object::JsObject,
    private::{PrivateElement, PrivateEnvironment, PrivateName},
    property::{Attribute, PropertyDescriptor, PropertyKey},
    value::JsValue,
};

use super::{
    expression::{eval_expression, eval_named_expression},
    function as function_eval,
};

/// Evaluates a class definition to its constructor object.
pub(crate) fn eval_class(
    class: &Rc<Class>,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<JsValue> {
    context.set_source_ref(class.span());

    // Class bodies are strict code; the class binding lives in its own
    // scope so methods can reference the class by name.
    let class_env = DeclarativeEnvironment::new_strict_block(env.clone());

    // (e) Allocate the private-name scope when any `#` member exists.
    let private_names = collect_private_names(class);
    let private_env = if private_names.is_empty() {
        None
    } else {
        Some(PrivateEnvironment::new(
            context.private_scope().cloned(),
            &private_names,
        ))
    };
    if let Some(private_env) = &private_env {
        context.push_private_scope(private_env.clone());
    }

    let result = eval_class_inner(class, &class_env, private_env.as_ref(), context);

    if private_env.is_some() {
        context.pop_private_scope();
    }
    result
}

fn eval_class_inner(
    class: &Rc<Class>,
    class_env: &Environment,
    private_env: Option<&Rc<PrivateEnvironment>>,
    context: &mut Context,
) -> EvalResult<JsValue> {
    // (a) Resolve the superclass.
    let mut super_constructor = None;
    let mut extends_null = false;
    if let Some(super_ref) = class.super_ref() {
        let value = eval_expression(super_ref, class_env, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        match value {
            JsValue::Null => extends_null = true,
            JsValue::Object(object) if object.is_constructor() => {
                super_constructor = Some(object);
            }
            _ => {
                return context.throw(
                    JsNativeError::typ().with_message("superclass must be a constructor"),
                );
            }
        }
    }
    let derived = super_constructor.is_some();

    // (c) The prototype object, linked to the superclass's prototype.
    let proto_parent = if extends_null {
        None
    } else if let Some(super_constructor) = &super_constructor {
        let parent = super_constructor.get("prototype", context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
        match parent {
            JsValue::Object(object) => Some(object),
            JsValue::Null => None,
            _ => {
                return context.throw(JsNativeError::typ().with_message(
                    "superclass prototype must be an object or null",
                ));
            }
        }
    } else {
        Some(context.realm().intrinsics().object_prototype())
    };
    let prototype = JsObject::new_ordinary(proto_parent);

    // (b) The constructor function, strict, carrying the class scope.
    let constructor_kind = if derived {
        ConstructorKind::Derived
    } else {
        ConstructorKind::Base
    };
    let (node, is_default) = match class.constructor() {
        Some(node) => (node.clone(), false),
        None => (Rc::new(default_constructor_node(class)), true),
    };
    let mut script = ScriptFunction::new(
        node,
        class_env.clone(),
        context.realm().clone(),
        context.private_scope().cloned(),
    );
    script.set_class_constructor(constructor_kind, is_default);
    script.set_home_object(prototype.clone());
    let script = Rc::new(script);
    let constructor = crate::object::JsObject::from_proto_and_kind(
        Some(if let Some(super_constructor) = &super_constructor {
            super_constructor.clone()
        } else {
            context.realm().intrinsics().function_prototype()
        }),
        crate::object::ObjectKind::Function(script.clone()),
    );
    let class_name: crate::string::JsString = class
        .name()
        .map_or_else(crate::string::JsString::empty, |ident| ident.name().into());
    constructor.insert_property(
        "name",
        PropertyDescriptor::data(class_name.clone().into(), Attribute::CONFIGURABLE),
    );
    constructor.insert_property(
        "length",
        PropertyDescriptor::data(
            JsValue::from(script.node().parameters().length()),
            Attribute::CONFIGURABLE,
        ),
    );

    // (c) Install the prototype link pair.
    constructor.insert_property(
        "prototype",
        PropertyDescriptor::data(prototype.clone().into(), Attribute::empty()),
    );
    prototype.insert_property(
        "constructor",
        PropertyDescriptor::data(
            constructor.clone().into(),
            Attribute::WRITABLE | Attribute::CONFIGURABLE,
        ),
    );

    // The inner class binding.
    if let Some(ident) = class.name() {
        class_env.define(
            ident.name().into(),
            constructor.clone().into(),
            DefineOptions::constant(),
        );
    }

    // (d) Methods and accessors; (f) field records. Instance private
    // methods are collected and installed per-instance during
    // construction; static members apply immediately.
    let mut instance_fields: Vec<ClassFieldRecord> = Vec::new();
    let mut static_fields: Vec<ClassFieldRecord> = Vec::new();
    let mut instance_private_methods: FxHashMap<u64, (PrivateName, PrivateElement)> =
        FxHashMap::default();

    for element in class.elements() {
        match element {
            ClassElement::MethodDefinition {
                name,
                kind,
                function,
                is_static,
            } => {
                let key = class_property_key(name, class_env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                let home = if *is_static {
                    constructor.clone()
                } else {
                    prototype.clone()
                };
                let method = function_eval::make_method(function, class_env, home.clone(), context);
                function_eval::set_function_name(&method, &method_name(&key, *kind));
                define_class_method(&home, key, *kind, method);
            }

            ClassElement::PrivateMethodDefinition {
                name,
                kind,
                function,
                is_static,
            } => {
                let Some(private_name) = private_env.and_then(|env| env.resolve(name)) else {
                    continue;
                };
                let home = if *is_static {
                    constructor.clone()
                } else {
                    prototype.clone()
                };
                let method = function_eval::make_method(function, class_env, home, context);
                function_eval::set_function_name(&method, &format!("#{name}"));
                let element = private_method_element(*kind, method);
                if *is_static {
                    merge_private_element(&constructor, &private_name, element);
                } else {
                    merge_collected_private(
                        &mut instance_private_methods,
                        private_name,
                        element,
                    );
                }
            }

            ClassElement::FieldDefinition {
                name,
                init,
                is_static,
            } => {
                let key = class_property_key(name, class_env, context)?;
                if context.should_stop() {
                    return Ok(JsValue::Undefined);
                }
                let record = ClassFieldRecord {
                    key: FieldKey::Property(key),
                    init: init.clone(),
                };
                if *is_static {
                    static_fields.push(record);
                } else {
                    instance_fields.push(record);
                }
            }

            ClassElement::PrivateFieldDefinition {
                name,
                init,
                is_static,
            } => {
                let Some(private_name) = private_env.and_then(|env| env.resolve(name)) else {
                    continue;
                };
                let record = ClassFieldRecord {
                    key: FieldKey::Private(private_name),
                    init: init.clone(),
                };
                if *is_static {
                    static_fields.push(record);
                } else {
                    instance_fields.push(record);
                }
            }
        }
    }

    script.set_fields(instance_fields);
    script.set_private_methods(instance_private_methods.into_values().collect());

    // (f) Static fields run now, with `this` bound to the constructor.
    for record in static_fields {
        run_static_field(&constructor, &script, &record, context)?;
        if context.should_stop() {
            return Ok(JsValue::Undefined);
        }
    }

    Ok(constructor.into())
}

/// Builds the synthesized constructor node of a class without an explicit
/// one. The derived flavor's argument forwarding happens natively in the
/// construct protocol.
fn default_constructor_node(class: &Class) -> FunctionNode {
    let name = class.name().cloned();
    FunctionNode::new(
        name,
        FormalParameterList::default(),
        StatementList::default(),
        FunctionKind::Ordinary,
    )
    .strict()
}

fn collect_private_names(class: &Class) -> Vec<Rc<str>> {
    let mut names: Vec<Rc<str>> = Vec::new();
    for element in class.elements() {
        let name = match element {
            ClassElement::PrivateMethodDefinition { name, .. }
            | ClassElement::PrivateFieldDefinition { name, .. } => name,
            _ => continue,
        };
        if !names.iter().any(|existing| existing == name) {
            names.push(name.clone());
        }
    }
    names
}

fn class_property_key(
    name: &krait_ast::property::PropertyName,
    env: &Environment,
    context: &mut Context,
) -> EvalResult<PropertyKey> {
    match name {
        krait_ast::property::PropertyName::Literal(literal) => {
            Ok(PropertyKey::from_string(literal))
        }
        krait_ast::property::PropertyName::Computed(expression) => {
            let value = eval_expression(expression, env, context)?;
            if context.should_stop() {
                return Ok(PropertyKey::from(""));
            }
            value.to_property_key(context)
        }
    }
}

fn method_name(key: &PropertyKey, kind: MethodKind) -> String {
    let base = key.to_display_string();
    match kind {
        MethodKind::Get => format!("get {base}"),
        MethodKind::Set => format!("set {base}"),
        MethodKind::Ordinary => base,
    }
}

/// Defines a method/getter/setter on a class home object. Class members
/// are non-enumerable; accessor pairs merge.
fn define_class_method(home: &JsObject, key: PropertyKey, kind: MethodKind, method: JsObject) {
    let descriptor = match kind {
        MethodKind::Ordinary => PropertyDescriptor::data(
            method.into(),
            Attribute::WRITABLE | Attribute::CONFIGURABLE,
        ),
        MethodKind::Get => PropertyDescriptor::builder()
            .get(Some(method))
            .enumerable(false)
            .configurable(true),
        MethodKind::Set => PropertyDescriptor::builder()
            .set(Some(method))
            .enumerable(false)
            .configurable(true),
    };
    let _ = home.define_own_property(key, descriptor);
}

fn private_method_element(kind: MethodKind, method: JsObject) -> PrivateElement {
    match kind {
        MethodKind::Ordinary => PrivateElement::Method(method),
        MethodKind::Get => PrivateElement::Accessor {
            getter: Some(method),
            setter: None,
        },
        MethodKind::Set => PrivateElement::Accessor {
            getter: None,
            setter: Some(method),
        },
    }
}

/// Installs a static private element, merging accessor halves.
fn merge_private_element(target: &JsObject, name: &PrivateName, element: PrivateElement) {
    let merged = match (target.get_private(name.id()), element) {
        (
            Some(PrivateElement::Accessor { getter, setter }),
            PrivateElement::Accessor {
                getter: new_getter,
                setter: new_setter,
            },
        ) => PrivateElement::Accessor {
            getter: new_getter.or(getter),
            setter: new_setter.or(setter),
        },
        (_, element) => element,
    };
    target.install_private(name.id(), merged);
}

fn merge_collected_private(
    collected: &mut FxHashMap<u64, (PrivateName, PrivateElement)>,
    name: PrivateName,
    element: PrivateElement,
) {
    let merged = match (collected.remove(&name.id()), element) {
        (
            Some((_, PrivateElement::Accessor { getter, setter })),
            PrivateElement::Accessor {
                getter: new_getter,
                setter: new_setter,
            },
        ) => PrivateElement::Accessor {
            getter: new_getter.or(getter),
            setter: new_setter.or(setter),
        },
        (_, element) => element,
    };
    collected.insert(name.id(), (name, merged));
}

/// Runs one static field initializer with `this` bound to the
/// constructor.
fn run_static_field(
    constructor: &JsObject,
    script: &Rc<ScriptFunction>,
    record: &ClassFieldRecord,
    context: &mut Context,
) -> EvalResult<()> {
    let env = DeclarativeEnvironment::new_function(
        script.environment().clone(),
        true,
        Some(crate::environments::FunctionSlots::new(
            constructor.clone().into(),
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
            let value = eval_named_expression(init, inferred.as_ref(), &env, context)?;
            if context.should_stop() {
                return Ok(());
            }
            value
        }
        None => JsValue::Undefined,
    };
    match &record.key {
        FieldKey::Property(key) => {
            constructor.insert_property(
                key.clone(),
                PropertyDescriptor::data(value, Attribute::all_attrs()),
            );
        }
        FieldKey::Private(name) => {
            constructor.install_private(name.id(), PrivateElement::Field(value));
        }
    }
    Ok(())
}
