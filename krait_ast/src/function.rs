//! Function and class definition nodes.

use std::rc::Rc;

use crate::{
    declaration::{Binding, Variable},
    expression::{Expression, Ident},
    property::{MethodKind, PropertyName},
    statement_list::StatementList,
    Span,
};

/// The execution flavor of a function body.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FunctionKind {
    /// An ordinary function.
    Ordinary,

    /// An `async function`.
    Async,

    /// A `function*` generator.
    Generator,

    /// An `async function*` generator.
    AsyncGenerator,
}

impl FunctionKind {
    /// Returns `true` for async functions and async generators.
    #[inline]
    #[must_use]
    pub const fn is_async(self) -> bool {
        matches!(self, Self::Async | Self::AsyncGenerator)
    }

    /// Returns `true` for generators and async generators.
    #[inline]
    #[must_use]
    pub const fn is_generator(self) -> bool {
        matches!(self, Self::Generator | Self::AsyncGenerator)
    }
}

/// A function definition, shared between declarations, expressions, arrow
/// functions and method bodies. The [`FunctionKind`] and the arrow flag
/// distinguish the flavors.
#[derive(Clone, Debug)]
pub struct Function {
    name: Option<Ident>,
    parameters: FormalParameterList,
    body: StatementList,
    kind: FunctionKind,
    is_arrow: bool,
    strict: bool,
    span: Span,
}

impl Function {
    /// Creates a new function definition.
    #[must_use]
    pub fn new(
        name: Option<Ident>,
        parameters: FormalParameterList,
        body: StatementList,
        kind: FunctionKind,
    ) -> Self {
        Self {
            name,
            parameters,
            body,
            kind,
            is_arrow: false,
            strict: false,
            span: Span::EMPTY,
        }
    }

    /// Marks this function as an arrow function.
    #[must_use]
    pub fn arrow(mut self) -> Self {
        self.is_arrow = true;
        self
    }

    /// Marks this function body as strict code (a `"use strict"` directive).
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Attaches a source span to this function.
    #[must_use]
    pub fn spanned(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Gets the name of the function, if any.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> Option<&Ident> {
        self.name.as_ref()
    }

    /// Gets the parameter list.
    #[inline]
    #[must_use]
    pub const fn parameters(&self) -> &FormalParameterList {
        &self.parameters
    }

    /// Gets the body of the function.
    #[inline]
    #[must_use]
    pub const fn body(&self) -> &StatementList {
        &self.body
    }

    /// Gets the execution flavor.
    #[inline]
    #[must_use]
    pub const fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Returns `true` for arrow functions.
    #[inline]
    #[must_use]
    pub const fn is_arrow(&self) -> bool {
        self.is_arrow
    }

    /// Returns `true` if the body carries a strict directive.
    #[inline]
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Gets the source span of the function.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }
}

/// A single formal parameter.
#[derive(Clone, Debug)]
pub struct FormalParameter {
    variable: Variable,
    is_rest: bool,
}

impl FormalParameter {
    /// Creates a new formal parameter.
    #[must_use]
    pub fn new<B: Into<Binding>>(binding: B, init: Option<Expression>, is_rest: bool) -> Self {
        let variable = match binding.into() {
            Binding::Identifier(ident) => Variable::from_identifier(ident, init),
            Binding::Pattern(pattern) => Variable::from_pattern(pattern, init),
        };
        Self { variable, is_rest }
    }

    /// Gets the declarator of the parameter.
    #[inline]
    #[must_use]
    pub const fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Returns `true` for a rest parameter (`...args`).
    #[inline]
    #[must_use]
    pub const fn is_rest(&self) -> bool {
        self.is_rest
    }

    /// Returns `true` if the parameter is a plain identifier without an
    /// initializer.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        !self.is_rest
            && self.variable.init().is_none()
            && matches!(self.variable.binding(), Binding::Identifier(_))
    }
}

/// An ordered list of formal parameters with the derived flags the
/// evaluator needs.
#[derive(Clone, Debug, Default)]
pub struct FormalParameterList {
    parameters: Box<[FormalParameter]>,
    is_simple: bool,
    length: u32,
}

impl FormalParameterList {
    /// Creates a new parameter list, computing the derived flags.
    #[must_use]
    pub fn new<P: Into<Box<[FormalParameter]>>>(parameters: P) -> Self {
        let parameters = parameters.into();
        let is_simple = parameters.iter().all(FormalParameter::is_simple);
        let mut length = 0;
        for parameter in parameters.iter() {
            if parameter.is_rest() || parameter.variable().init().is_some() {
                break;
            }
            length += 1;
        }
        Self {
            parameters,
            is_simple,
            length,
        }
    }

    /// Gets the parameters.
    #[inline]
    #[must_use]
    pub fn as_ref(&self) -> &[FormalParameter] {
        &self.parameters
    }

    /// Returns `true` if every parameter is a plain identifier without an
    /// initializer or rest marker.
    #[inline]
    #[must_use]
    pub const fn is_simple(&self) -> bool {
        self.is_simple
    }

    /// Gets the expected argument count: the number of parameters before the
    /// first initializer or rest parameter.
    #[inline]
    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Gets the list of identifiers bound by the parameters.
    #[must_use]
    pub fn bound_idents(&self) -> Vec<&Ident> {
        let mut idents = Vec::new();
        for parameter in self.parameters.iter() {
            idents.extend(parameter.variable().idents());
        }
        idents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{ArrayPattern, ArrayPatternElement, Pattern};

    #[test]
    fn parameter_list_flags() {
        let simple = FormalParameterList::new(vec![
            FormalParameter::new(Ident::new("a"), None, false),
            FormalParameter::new(Ident::new("b"), None, false),
        ]);
        assert!(simple.is_simple());
        assert_eq!(simple.length(), 2);

        let with_default = FormalParameterList::new(vec![
            FormalParameter::new(Ident::new("a"), None, false),
            FormalParameter::new(Ident::new("b"), Some(Expression::from(1)), false),
            FormalParameter::new(Ident::new("c"), None, false),
        ]);
        assert!(!with_default.is_simple());
        // The length stops at the first initializer.
        assert_eq!(with_default.length(), 1);

        let with_rest = FormalParameterList::new(vec![
            FormalParameter::new(Ident::new("a"), None, false),
            FormalParameter::new(Ident::new("r"), None, true),
        ]);
        assert!(!with_rest.is_simple());
        assert_eq!(with_rest.length(), 1);
    }

    #[test]
    fn pattern_parameters_bind_their_idents() {
        let pattern = Pattern::Array(ArrayPattern::new(vec![
            ArrayPatternElement::SingleName {
                ident: Ident::new("x"),
                default_init: None,
            },
            ArrayPatternElement::SingleNameRest {
                ident: Ident::new("rest"),
            },
        ]));
        let list = FormalParameterList::new(vec![FormalParameter::new(pattern, None, false)]);
        let bound: Vec<&str> = list.bound_idents().iter().map(|i| i.as_str()).collect();
        assert_eq!(bound, ["x", "rest"]);
    }
}

/// A class definition.
///
/// More information:
///  - [ECMAScript reference][spec]
///
/// [spec]: https://tc39.es/ecma262/#sec-class-definitions
#[derive(Clone, Debug)]
pub struct Class {
    name: Option<Ident>,
    super_ref: Option<Box<Expression>>,
    constructor: Option<Rc<Function>>,
    elements: Box<[ClassElement]>,
    span: Span,
}

impl Class {
    /// Creates a new class definition.
    #[must_use]
    pub fn new(
        name: Option<Ident>,
        super_ref: Option<Expression>,
        constructor: Option<Rc<Function>>,
        elements: Box<[ClassElement]>,
    ) -> Self {
        Self {
            name,
            super_ref: super_ref.map(Box::new),
            constructor,
            elements,
            span: Span::EMPTY,
        }
    }

    /// Attaches a source span to this class.
    #[must_use]
    pub fn spanned(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Gets the name of the class, if any.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> Option<&Ident> {
        self.name.as_ref()
    }

    /// Gets the superclass expression, if any.
    #[inline]
    #[must_use]
    pub fn super_ref(&self) -> Option<&Expression> {
        self.super_ref.as_deref()
    }

    /// Gets the explicit constructor, if any.
    #[inline]
    #[must_use]
    pub const fn constructor(&self) -> Option<&Rc<Function>> {
        self.constructor.as_ref()
    }

    /// Gets the class elements.
    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[ClassElement] {
        &self.elements
    }

    /// Gets the source span of the class.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Returns `true` if any element defines a private member.
    #[must_use]
    pub fn has_private_elements(&self) -> bool {
        self.elements.iter().any(|element| {
            matches!(
                element,
                ClassElement::PrivateMethodDefinition { .. }
                    | ClassElement::PrivateFieldDefinition { .. }
            )
        })
    }
}

/// A member of a class body.
#[derive(Clone, Debug)]
pub enum ClassElement {
    /// A method, getter or setter.
    MethodDefinition {
        /// The method name.
        name: PropertyName,
        /// The method flavor.
        kind: MethodKind,
        /// The method body.
        function: Rc<Function>,
        /// `true` for `static` members.
        is_static: bool,
    },

    /// A field definition.
    FieldDefinition {
        /// The field name.
        name: PropertyName,
        /// The field initializer.
        init: Option<Expression>,
        /// `true` for `static` members.
        is_static: bool,
    },

    /// A private method, getter or setter (`#name() {}`).
    PrivateMethodDefinition {
        /// The private name, without the leading `#`.
        name: Rc<str>,
        /// The method flavor.
        kind: MethodKind,
        /// The method body.
        function: Rc<Function>,
        /// `true` for `static` members.
        is_static: bool,
    },

    /// A private field definition (`#name = expr`).
    PrivateFieldDefinition {
        /// The private name, without the leading `#`.
        name: Rc<str>,
        /// The field initializer.
        init: Option<Expression>,
        /// `true` for `static` members.
        is_static: bool,
    },
}
