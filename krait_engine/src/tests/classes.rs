use krait_ast::builder::*;
use krait_ast::expression::Ident;
use krait_ast::function::{Class, ClassElement};
use krait_ast::property::{MethodKind, PropertyName};
use krait_ast::stmt_list;

use super::{run_test_actions, TestAction};
use crate::ErrorKind;

fn simple_class(name: &str, elements: Vec<ClassElement>) -> Class {
    Class::new(Some(Ident::new(name)), None, None, elements.into())
}

#[test]
fn methods_and_this() {
    // class A { constructor(v) { this.v = v } double() { return this.v * 2 } }
    let class = Class::new(
        Some(Ident::new("A")),
        None,
        Some(method(
            params(&["v"]),
            stmt_list![stmt(assign(member(this(), "v"), ident("v")))],
        )),
        vec![ClassElement::MethodDefinition {
            name: PropertyName::from("double"),
            kind: MethodKind::Ordinary,
            function: method(params(&[]), stmt_list![ret(mul(member(this(), "v"), 2))]),
            is_static: false,
        }]
        .into(),
    );
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            class_decl(class),
            stmt(call(
                member(new_(ident("A"), vec![21.into()]), "double"),
                vec![],
            )),
        ]),
        42,
    )]);
}

#[test]
fn private_field_with_getter() {
    // class A { #p = 7; get p() { return this.#p } }
    let class = simple_class(
        "A",
        vec![
            ClassElement::PrivateFieldDefinition {
                name: "p".into(),
                init: Some(7.into()),
                is_static: false,
            },
            ClassElement::MethodDefinition {
                name: PropertyName::from("p"),
                kind: MethodKind::Get,
                function: method(params(&[]), stmt_list![ret(private_member(this(), "p"))]),
                is_static: false,
            },
        ],
    );
    run_test_actions([
        TestAction::run(program(stmt_list![class_decl(class)])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(new_(ident("A"), vec![]), "p"))]),
            7,
        ),
        // From outside the class body, `#p` access is invalid.
        TestAction::assert_native_error(
            program(stmt_list![stmt(private_member(new_(ident("A"), vec![]), "p"))]),
            ErrorKind::Type,
            "Invalid access of private member",
        ),
    ]);
}

#[test]
fn private_brand_check_rejects_foreign_objects() {
    // class M { #p = 1; read(o) { return o.#p } }
    let class = simple_class(
        "M",
        vec![
            ClassElement::PrivateFieldDefinition {
                name: "p".into(),
                init: Some(1.into()),
                is_static: false,
            },
            ClassElement::MethodDefinition {
                name: PropertyName::from("read"),
                kind: MethodKind::Ordinary,
                function: method(
                    params(&["o"]),
                    stmt_list![ret(private_member(ident("o"), "p"))],
                ),
                is_static: false,
            },
        ],
    );
    run_test_actions([
        TestAction::run(program(stmt_list![
            class_decl(class),
            var_decl([("m", Some(new_(ident("M"), vec![])))]),
        ])),
        // Reading through an instance works.
        TestAction::assert_eq(
            program(stmt_list![stmt(call(
                member(ident("m"), "read"),
                vec![ident("m")],
            ))]),
            1,
        ),
        // A foreign object lacks the brand.
        TestAction::assert_native_error(
            program(stmt_list![stmt(call(
                member(ident("m"), "read"),
                vec![object(vec![])],
            ))]),
            ErrorKind::Type,
            "Invalid access of private member",
        ),
    ]);
}

#[test]
fn private_methods() {
    // class M { #inc(x) { return x + 1 } run(x) { return this.#inc(x) } }
    let class = simple_class(
        "M",
        vec![
            ClassElement::PrivateMethodDefinition {
                name: "inc".into(),
                kind: MethodKind::Ordinary,
                function: method(params(&["x"]), stmt_list![ret(add(ident("x"), 1))]),
                is_static: false,
            },
            ClassElement::MethodDefinition {
                name: PropertyName::from("run"),
                kind: MethodKind::Ordinary,
                function: method(
                    params(&["x"]),
                    stmt_list![ret(call(private_member(this(), "inc"), vec![ident("x")]))],
                ),
                is_static: false,
            },
        ],
    );
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            class_decl(class),
            stmt(call(
                member(new_(ident("M"), vec![]), "run"),
                vec![4.into()],
            )),
        ]),
        5,
    )]);
}

#[test]
fn getters_and_setters_pair_up() {
    // class T { get x() { return this.raw } set x(v) { this.raw = v * 2 } }
    let class = simple_class(
        "T",
        vec![
            ClassElement::MethodDefinition {
                name: PropertyName::from("x"),
                kind: MethodKind::Get,
                function: method(params(&[]), stmt_list![ret(member(this(), "raw"))]),
                is_static: false,
            },
            ClassElement::MethodDefinition {
                name: PropertyName::from("x"),
                kind: MethodKind::Set,
                function: method(
                    params(&["v"]),
                    stmt_list![stmt(assign(member(this(), "raw"), mul(ident("v"), 2)))],
                ),
                is_static: false,
            },
        ],
    );
    run_test_actions([
        TestAction::run(program(stmt_list![
            class_decl(class),
            var_decl([("t", Some(new_(ident("T"), vec![])))]),
            stmt(assign(member(ident("t"), "x"), 4)),
        ])),
        TestAction::assert_eq(program(stmt_list![stmt(member(ident("t"), "x"))]), 8),
    ]);
}

#[test]
fn instance_fields_see_this() {
    // class F { v = 3; double() { return this.v * 2 } }
    let class = simple_class(
        "F",
        vec![
            ClassElement::FieldDefinition {
                name: PropertyName::from("v"),
                init: Some(3.into()),
                is_static: false,
            },
            ClassElement::MethodDefinition {
                name: PropertyName::from("double"),
                kind: MethodKind::Ordinary,
                function: method(params(&[]), stmt_list![ret(mul(member(this(), "v"), 2))]),
                is_static: false,
            },
        ],
    );
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            class_decl(class),
            stmt(call(member(new_(ident("F"), vec![]), "double"), vec![])),
        ]),
        6,
    )]);
}

#[test]
fn static_members_live_on_the_constructor() {
    let class = simple_class(
        "S",
        vec![
            ClassElement::FieldDefinition {
                name: PropertyName::from("n"),
                init: Some(9.into()),
                is_static: true,
            },
            ClassElement::MethodDefinition {
                name: PropertyName::from("twice"),
                kind: MethodKind::Ordinary,
                function: method(params(&[]), stmt_list![ret(mul(member(this(), "n"), 2))]),
                is_static: true,
            },
        ],
    );
    run_test_actions([
        TestAction::run(program(stmt_list![class_decl(class)])),
        TestAction::assert_eq(program(stmt_list![stmt(member(ident("S"), "n"))]), 9),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(member(ident("S"), "twice"), vec![]))]),
            18,
        ),
    ]);
}

fn point_class() -> Class {
    Class::new(
        Some(Ident::new("Point")),
        None,
        Some(method(
            params(&["n"]),
            stmt_list![stmt(assign(member(this(), "n"), ident("n")))],
        )),
        vec![ClassElement::MethodDefinition {
            name: PropertyName::from("describe"),
            kind: MethodKind::Ordinary,
            function: method(params(&[]), stmt_list![ret(add("p", member(this(), "n")))]),
            is_static: false,
        }]
        .into(),
    )
}

#[test]
fn derived_classes_call_super() {
    // class Labeled extends Point {
    //     constructor(n) { super(n); this.label = "L" }
    //     describe() { return this.label + super.describe() }
    // }
    let derived = Class::new(
        Some(Ident::new("Labeled")),
        Some(ident("Point")),
        Some(method(
            params(&["n"]),
            stmt_list![
                stmt(super_call(vec![ident("n")])),
                stmt(assign(member(this(), "label"), "L")),
            ],
        )),
        vec![ClassElement::MethodDefinition {
            name: PropertyName::from("describe"),
            kind: MethodKind::Ordinary,
            function: method(
                params(&[]),
                stmt_list![ret(add(
                    member(this(), "label"),
                    call(super_member("describe"), vec![]),
                ))],
            ),
            is_static: false,
        }]
        .into(),
    );
    run_test_actions([
        TestAction::run(program(stmt_list![
            class_decl(point_class()),
            class_decl(derived),
            var_decl([("l", Some(new_(ident("Labeled"), vec![3.into()])))]),
        ])),
        TestAction::assert_eq(
            program(stmt_list![stmt(call(member(ident("l"), "describe"), vec![]))]),
            "Lp3",
        ),
        TestAction::assert(program(stmt_list![stmt(instance_of(
            ident("l"),
            ident("Point")
        ))]),),
        TestAction::assert(program(stmt_list![stmt(instance_of(
            ident("l"),
            ident("Labeled")
        ))]),),
    ]);
}

#[test]
fn default_derived_constructor_forwards_arguments() {
    // class C extends Point {}
    let derived = Class::new(Some(Ident::new("C")), Some(ident("Point")), None, vec![].into());
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            class_decl(point_class()),
            class_decl(derived),
            stmt(member(new_(ident("C"), vec![5.into()]), "n")),
        ]),
        5,
    )]);
}

#[test]
fn this_before_super_fails() {
    let derived = Class::new(
        Some(Ident::new("D")),
        Some(ident("Point")),
        Some(method(
            params(&[]),
            stmt_list![stmt(assign(member(this(), "x"), 1))],
        )),
        vec![].into(),
    );
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![
            class_decl(point_class()),
            class_decl(derived),
            stmt(new_(ident("D"), vec![])),
        ]),
        ErrorKind::Reference,
        "Must call super constructor in derived class before accessing 'this'",
    )]);
}

#[test]
fn calling_super_twice_fails() {
    let derived = Class::new(
        Some(Ident::new("D")),
        Some(ident("Point")),
        Some(method(
            params(&[]),
            stmt_list![
                stmt(super_call(vec![1.into()])),
                stmt(super_call(vec![2.into()])),
            ],
        )),
        vec![].into(),
    );
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![
            class_decl(point_class()),
            class_decl(derived),
            stmt(new_(ident("D"), vec![])),
        ]),
        ErrorKind::Reference,
        "Super constructor may only be called once",
    )]);
}

#[test]
fn class_constructors_require_new() {
    run_test_actions([
        TestAction::run(program(stmt_list![class_decl(simple_class("A", vec![]))])),
        TestAction::assert_native_error(
            program(stmt_list![stmt(call(ident("A"), vec![]))]),
            ErrorKind::Type,
            "Class constructor cannot be invoked without 'new'",
        ),
    ]);
}

#[test]
fn non_constructor_superclass_fails() {
    let class = Class::new(Some(Ident::new("A")), Some(5.into()), None, vec![].into());
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![class_decl(class)]),
        ErrorKind::Type,
        "superclass must be a constructor",
    )]);
}

#[test]
fn class_expressions_infer_their_binding_name() {
    let class = Class::new(None, None, None, vec![].into());
    run_test_actions([
        TestAction::run(program(stmt_list![const_decl([(
            "K",
            Some(class_expr(class)),
        )])])),
        TestAction::assert_eq(
            program(stmt_list![stmt(member(ident("K"), "name"))]),
            "K",
        ),
    ]);
}

#[test]
fn computed_method_names() {
    // class A { ["m" + 1]() { return 7 } }
    let class = simple_class(
        "A",
        vec![ClassElement::MethodDefinition {
            name: PropertyName::from(add("m", 1)),
            kind: MethodKind::Ordinary,
            function: method(params(&[]), stmt_list![ret(7)]),
            is_static: false,
        }],
    );
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            class_decl(class),
            stmt(call(member(new_(ident("A"), vec![]), "m1"), vec![])),
        ]),
        7,
    )]);
}

#[test]
fn methods_can_reference_the_class_binding() {
    // class A { make() { return new A() } }
    let class = simple_class(
        "A",
        vec![ClassElement::MethodDefinition {
            name: PropertyName::from("make"),
            kind: MethodKind::Ordinary,
            function: method(params(&[]), stmt_list![ret(new_(ident("A"), vec![]))]),
            is_static: false,
        }],
    );
    run_test_actions([TestAction::assert(program(stmt_list![
        class_decl(class),
        stmt(instance_of(
            call(member(new_(ident("A"), vec![]), "make"), vec![]),
            ident("A"),
        )),
    ]),)]);
}

#[test]
fn class_declarations_are_in_the_tdz_until_evaluated() {
    run_test_actions([TestAction::assert_native_error(
        program(stmt_list![block(stmt_list![
            stmt(new_(ident("A"), vec![])),
            class_decl(simple_class("A", vec![])),
        ])]),
        ErrorKind::Reference,
        "Cannot access 'A' before initialization",
    )]);
}

#[test]
fn static_private_fields() {
    // class S { static #secret = 6; static reveal() { return S.#secret } }
    let class = simple_class(
        "S",
        vec![
            ClassElement::PrivateFieldDefinition {
                name: "secret".into(),
                init: Some(6.into()),
                is_static: true,
            },
            ClassElement::MethodDefinition {
                name: PropertyName::from("reveal"),
                kind: MethodKind::Ordinary,
                function: method(
                    params(&[]),
                    stmt_list![ret(private_member(ident("S"), "secret"))],
                ),
                is_static: true,
            },
        ],
    );
    run_test_actions([TestAction::assert_eq(
        program(stmt_list![
            class_decl(class),
            stmt(call(member(ident("S"), "reveal"), vec![])),
        ]),
        6,
    )]);
}

#[test]
fn prototype_wiring() {
    run_test_actions([
        TestAction::run(program(stmt_list![class_decl(simple_class("A", vec![]))])),
        // A.prototype.constructor === A
        TestAction::assert(program(stmt_list![stmt(strict_eq(
            member(member(ident("A"), "prototype"), "constructor"),
            ident("A"),
        ))]),),
    ]);
}
