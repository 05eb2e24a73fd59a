//! The [`Expression`] Parse Node.
//!
//! ECMAScript expressions produce values. The node inventory here covers
//! literals, identifier references, member and call forms (including the
//! optional-chaining variants), the operator expressions, template literals,
//! function and class expressions, and the suspension forms `await` and
//! `yield`.

use std::rc::Rc;

use num_bigint::BigInt;

use crate::{
    function::{Class, Function},
    operator::{AssignOp, BinaryOp, UnaryOp, UpdateOp},
    pattern::Pattern,
    property::{PropertyDefinition, PropertyName},
    Span,
};

/// An identifier node, carrying the referenced name.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Ident {
    name: Rc<str>,
}

impl Ident {
    /// Creates a new identifier.
    #[must_use]
    pub fn new<N: Into<Rc<str>>>(name: N) -> Self {
        Self { name: name.into() }
    }

    /// Gets the name of the identifier.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &Rc<str> {
        &self.name
    }

    /// Gets the name as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl From<&str> for Ident {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The `Expression` Parse Node.
#[derive(Clone, Debug)]
pub enum Expression {
    /// See [`Literal`].
    Literal(Literal),

    /// An identifier reference.
    Identifier(Ident),

    /// The `this` expression.
    This,

    /// The `new.target` meta property.
    NewTarget,

    /// See [`ArrayLiteral`].
    Array(ArrayLiteral),

    /// See [`ObjectLiteral`].
    Object(ObjectLiteral),

    /// See [`TemplateLiteral`].
    Template(TemplateLiteral),

    /// See [`TaggedTemplate`].
    TaggedTemplate(TaggedTemplate),

    /// A function expression (ordinary, arrow, async, generator or
    /// async generator, distinguished by the node's flags).
    Function(Rc<Function>),

    /// A class expression.
    Class(Rc<Class>),

    /// A spread element (`...expr`), valid inside array literals and
    /// argument lists.
    Spread(Spread),

    /// See [`PropertyAccess`].
    PropertyAccess(PropertyAccess),

    /// See [`PrivateAccess`].
    PrivateAccess(PrivateAccess),

    /// See [`SuperPropertyAccess`].
    SuperPropertyAccess(SuperPropertyAccess),

    /// See [`Call`].
    Call(Call),

    /// See [`SuperCall`].
    SuperCall(SuperCall),

    /// See [`New`].
    New(New),

    /// See [`Unary`].
    Unary(Unary),

    /// See [`Update`].
    Update(Update),

    /// See [`Binary`].
    Binary(Binary),

    /// See [`Conditional`].
    Conditional(Conditional),

    /// See [`Assign`].
    Assign(Assign),

    /// A comma-separated sequence; evaluates every expression in order and
    /// produces the value of the last one.
    Sequence(Box<[Expression]>),

    /// See [`Await`].
    Await(Await),

    /// See [`Yield`].
    Yield(Yield),
}

impl Expression {
    /// Returns `true` if this is an anonymous function or class definition,
    /// the forms whose bound name is inferred from their binding target.
    ///
    /// More information:
    ///  - [ECMAScript reference][spec]
    ///
    /// [spec]: https://tc39.es/ecma262/#sec-isanonymousfunctiondefinition
    #[must_use]
    pub fn is_anonymous_function_definition(&self) -> bool {
        match self {
            Self::Function(f) => f.name().is_none(),
            Self::Class(c) => c.name().is_none(),
            _ => false,
        }
    }
}

/// A literal expression.
#[derive(Clone, Debug)]
pub enum Literal {
    /// The `null` literal.
    Null,

    /// The `undefined` value. Not strictly a literal in the grammar, but an
    /// upstream parser may resolve the unshadowed global here.
    Undefined,

    /// A boolean literal.
    Bool(bool),

    /// A numeric literal.
    Num(f64),

    /// A string literal.
    String(Rc<str>),

    /// A BigInt literal (`123n`).
    BigInt(Box<BigInt>),
}

/// An array literal. `None` elements are elisions.
#[derive(Clone, Debug)]
pub struct ArrayLiteral {
    elements: Box<[Option<Expression>]>,
}

impl ArrayLiteral {
    /// Creates a new array literal.
    #[must_use]
    pub fn new<E: Into<Box<[Option<Expression>]>>>(elements: E) -> Self {
        Self {
            elements: elements.into(),
        }
    }

    /// Gets the elements of the literal.
    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[Option<Expression>] {
        &self.elements
    }
}

/// An object literal.
#[derive(Clone, Debug)]
pub struct ObjectLiteral {
    members: Box<[PropertyDefinition]>,
}

impl ObjectLiteral {
    /// Creates a new object literal.
    #[must_use]
    pub fn new<M: Into<Box<[PropertyDefinition]>>>(members: M) -> Self {
        Self {
            members: members.into(),
        }
    }

    /// Gets the members of the literal.
    #[inline]
    #[must_use]
    pub fn members(&self) -> &[PropertyDefinition] {
        &self.members
    }
}

/// One piece of a template literal: either a cooked chunk of text or a
/// substitution expression.
#[derive(Clone, Debug)]
pub enum TemplatePart {
    /// A chunk of literal text.
    String(Rc<str>),

    /// A `${expr}` substitution.
    Expr(Expression),
}

/// A template literal.
#[derive(Clone, Debug)]
pub struct TemplateLiteral {
    parts: Box<[TemplatePart]>,
}

impl TemplateLiteral {
    /// Creates a new template literal.
    #[must_use]
    pub fn new<P: Into<Box<[TemplatePart]>>>(parts: P) -> Self {
        Self {
            parts: parts.into(),
        }
    }

    /// Gets the parts of the literal.
    #[inline]
    #[must_use]
    pub fn parts(&self) -> &[TemplatePart] {
        &self.parts
    }
}

/// A tagged template (`` tag`a ${x} b` ``).
///
/// The cooked strings may be absent for chunks with invalid escape
/// sequences; the raw strings are always present.
#[derive(Clone, Debug)]
pub struct TaggedTemplate {
    tag: Box<Expression>,
    cookeds: Box<[Option<Rc<str>>]>,
    raws: Box<[Rc<str>]>,
    exprs: Box<[Expression]>,
}

impl TaggedTemplate {
    /// Creates a new tagged template.
    #[must_use]
    pub fn new(
        tag: Expression,
        cookeds: Box<[Option<Rc<str>>]>,
        raws: Box<[Rc<str>]>,
        exprs: Box<[Expression]>,
    ) -> Self {
        Self {
            tag: tag.into(),
            cookeds,
            raws,
            exprs,
        }
    }

    /// Gets the tag expression.
    #[inline]
    #[must_use]
    pub fn tag(&self) -> &Expression {
        &self.tag
    }

    /// Gets the cooked strings.
    #[inline]
    #[must_use]
    pub fn cookeds(&self) -> &[Option<Rc<str>>] {
        &self.cookeds
    }

    /// Gets the raw strings.
    #[inline]
    #[must_use]
    pub fn raws(&self) -> &[Rc<str>] {
        &self.raws
    }

    /// Gets the substitution expressions.
    #[inline]
    #[must_use]
    pub fn exprs(&self) -> &[Expression] {
        &self.exprs
    }
}

/// A spread element.
#[derive(Clone, Debug)]
pub struct Spread {
    target: Box<Expression>,
}

impl Spread {
    /// Creates a new spread element.
    #[must_use]
    pub fn new(target: Expression) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Gets the spread target.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Expression {
        &self.target
    }
}

/// The field of a property access: a constant name (`a.b`) or a computed
/// expression (`a[b]`).
#[derive(Clone, Debug)]
pub enum PropertyAccessField {
    /// A constant field name.
    Const(Rc<str>),

    /// A computed field expression.
    Expr(Box<Expression>),
}

impl From<&str> for PropertyAccessField {
    fn from(name: &str) -> Self {
        Self::Const(name.into())
    }
}

impl From<Expression> for PropertyAccessField {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr.into())
    }
}

/// A property access, optionally an optional-chaining link (`a?.b`).
#[derive(Clone, Debug)]
pub struct PropertyAccess {
    target: Box<Expression>,
    field: PropertyAccessField,
    optional: bool,
    span: Span,
}

impl PropertyAccess {
    /// Creates a new property access.
    #[must_use]
    pub fn new<F: Into<PropertyAccessField>>(target: Expression, field: F) -> Self {
        Self {
            target: target.into(),
            field: field.into(),
            optional: false,
            span: Span::EMPTY,
        }
    }

    /// Marks this access as an optional-chaining link.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attaches a source span to this access.
    #[must_use]
    pub fn spanned(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Gets the target of the access.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Expression {
        &self.target
    }

    /// Gets the accessed field.
    #[inline]
    #[must_use]
    pub fn field(&self) -> &PropertyAccessField {
        &self.field
    }

    /// Returns `true` if the access is an optional-chaining link.
    #[inline]
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Gets the source span of the access.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }
}

/// A private member access (`obj.#name`).
#[derive(Clone, Debug)]
pub struct PrivateAccess {
    target: Box<Expression>,
    name: Rc<str>,
}

impl PrivateAccess {
    /// Creates a new private access. `name` excludes the leading `#`.
    #[must_use]
    pub fn new<N: Into<Rc<str>>>(target: Expression, name: N) -> Self {
        Self {
            target: target.into(),
            name: name.into(),
        }
    }

    /// Gets the target of the access.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Expression {
        &self.target
    }

    /// Gets the private name, without the leading `#`.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &Rc<str> {
        &self.name
    }
}

/// A `super` property access (`super.prop` or `super[expr]`).
#[derive(Clone, Debug)]
pub struct SuperPropertyAccess {
    field: PropertyAccessField,
}

impl SuperPropertyAccess {
    /// Creates a new `super` property access.
    #[must_use]
    pub fn new<F: Into<PropertyAccessField>>(field: F) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Gets the accessed field.
    #[inline]
    #[must_use]
    pub fn field(&self) -> &PropertyAccessField {
        &self.field
    }
}

/// A call expression, optionally an optional-chaining link (`f?.()`).
#[derive(Clone, Debug)]
pub struct Call {
    target: Box<Expression>,
    args: Box<[Expression]>,
    optional: bool,
    span: Span,
}

impl Call {
    /// Creates a new call expression.
    #[must_use]
    pub fn new<A: Into<Box<[Expression]>>>(target: Expression, args: A) -> Self {
        Self {
            target: target.into(),
            args: args.into(),
            optional: false,
            span: Span::EMPTY,
        }
    }

    /// Marks this call as an optional-chaining link.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attaches a source span to this call.
    #[must_use]
    pub fn spanned(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Gets the callee expression.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Expression {
        &self.target
    }

    /// Gets the argument expressions.
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    /// Returns `true` if the call is an optional-chaining link.
    #[inline]
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Gets the source span of the call.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }
}

/// A `super(...)` call, valid only inside derived class constructors.
#[derive(Clone, Debug)]
pub struct SuperCall {
    args: Box<[Expression]>,
}

impl SuperCall {
    /// Creates a new `super` call.
    #[must_use]
    pub fn new<A: Into<Box<[Expression]>>>(args: A) -> Self {
        Self { args: args.into() }
    }

    /// Gets the argument expressions.
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[Expression] {
        &self.args
    }
}

/// A `new` expression.
#[derive(Clone, Debug)]
pub struct New {
    target: Box<Expression>,
    args: Box<[Expression]>,
    span: Span,
}

impl New {
    /// Creates a new `new` expression.
    #[must_use]
    pub fn new<A: Into<Box<[Expression]>>>(target: Expression, args: A) -> Self {
        Self {
            target: target.into(),
            args: args.into(),
            span: Span::EMPTY,
        }
    }

    /// Attaches a source span to this expression.
    #[must_use]
    pub fn spanned(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Gets the constructor expression.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Expression {
        &self.target
    }

    /// Gets the argument expressions.
    #[inline]
    #[must_use]
    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    /// Gets the source span of the expression.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }
}

/// A unary operator expression.
#[derive(Clone, Debug)]
pub struct Unary {
    op: UnaryOp,
    target: Box<Expression>,
}

impl Unary {
    /// Creates a new unary expression.
    #[must_use]
    pub fn new(op: UnaryOp, target: Expression) -> Self {
        Self {
            op,
            target: target.into(),
        }
    }

    /// Gets the operator.
    #[inline]
    #[must_use]
    pub const fn op(&self) -> UnaryOp {
        self.op
    }

    /// Gets the operand.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Expression {
        &self.target
    }
}

/// The target of an update expression.
#[derive(Clone, Debug)]
pub enum UpdateTarget {
    /// An identifier target (`a++`).
    Identifier(Ident),

    /// A property access target (`a.b++`).
    PropertyAccess(PropertyAccess),
}

/// An update (increment/decrement) expression.
#[derive(Clone, Debug)]
pub struct Update {
    op: UpdateOp,
    target: Box<UpdateTarget>,
}

impl Update {
    /// Creates a new update expression.
    #[must_use]
    pub fn new(op: UpdateOp, target: UpdateTarget) -> Self {
        Self {
            op,
            target: target.into(),
        }
    }

    /// Gets the operator.
    #[inline]
    #[must_use]
    pub const fn op(&self) -> UpdateOp {
        self.op
    }

    /// Gets the update target.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &UpdateTarget {
        &self.target
    }
}

/// A binary operator expression.
#[derive(Clone, Debug)]
pub struct Binary {
    op: BinaryOp,
    lhs: Box<Expression>,
    rhs: Box<Expression>,
}

impl Binary {
    /// Creates a new binary expression.
    #[must_use]
    pub fn new(op: BinaryOp, lhs: Expression, rhs: Expression) -> Self {
        Self {
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    /// Gets the operator.
    #[inline]
    #[must_use]
    pub const fn op(&self) -> BinaryOp {
        self.op
    }

    /// Gets the left-hand operand.
    #[inline]
    #[must_use]
    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    /// Gets the right-hand operand.
    #[inline]
    #[must_use]
    pub fn rhs(&self) -> &Expression {
        &self.rhs
    }
}

/// A conditional (`cond ? a : b`) expression.
#[derive(Clone, Debug)]
pub struct Conditional {
    condition: Box<Expression>,
    if_true: Box<Expression>,
    if_false: Box<Expression>,
}

impl Conditional {
    /// Creates a new conditional expression.
    #[must_use]
    pub fn new(condition: Expression, if_true: Expression, if_false: Expression) -> Self {
        Self {
            condition: condition.into(),
            if_true: if_true.into(),
            if_false: if_false.into(),
        }
    }

    /// Gets the condition.
    #[inline]
    #[must_use]
    pub fn condition(&self) -> &Expression {
        &self.condition
    }

    /// Gets the consequent.
    #[inline]
    #[must_use]
    pub fn if_true(&self) -> &Expression {
        &self.if_true
    }

    /// Gets the alternate.
    #[inline]
    #[must_use]
    pub fn if_false(&self) -> &Expression {
        &self.if_false
    }
}

/// The target of an assignment.
#[derive(Clone, Debug)]
pub enum AssignTarget {
    /// An identifier binding.
    Identifier(Ident),

    /// A property or index of an object.
    PropertyAccess(PropertyAccess),

    /// A private member of an object.
    PrivateAccess(PrivateAccess),

    /// A property of the `super` base.
    SuperPropertyAccess(SuperPropertyAccess),

    /// A destructuring pattern.
    Pattern(Pattern),
}

impl From<Ident> for AssignTarget {
    fn from(ident: Ident) -> Self {
        Self::Identifier(ident)
    }
}

impl From<PropertyAccess> for AssignTarget {
    fn from(access: PropertyAccess) -> Self {
        Self::PropertyAccess(access)
    }
}

impl From<Pattern> for AssignTarget {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

/// An assignment expression, covering plain, compound and logical
/// assignments as well as destructuring assignments through
/// [`AssignTarget::Pattern`].
#[derive(Clone, Debug)]
pub struct Assign {
    op: AssignOp,
    target: Box<AssignTarget>,
    value: Box<Expression>,
}

impl Assign {
    /// Creates a new assignment expression.
    #[must_use]
    pub fn new<T: Into<AssignTarget>>(op: AssignOp, target: T, value: Expression) -> Self {
        Self {
            op,
            target: Box::new(target.into()),
            value: value.into(),
        }
    }

    /// Gets the operator.
    #[inline]
    #[must_use]
    pub const fn op(&self) -> AssignOp {
        self.op
    }

    /// Gets the assignment target.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &AssignTarget {
        &self.target
    }

    /// Gets the assigned value expression.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &Expression {
        &self.value
    }
}

/// An `await` expression.
#[derive(Clone, Debug)]
pub struct Await {
    target: Box<Expression>,
}

impl Await {
    /// Creates a new `await` expression.
    #[must_use]
    pub fn new(target: Expression) -> Self {
        Self {
            target: target.into(),
        }
    }

    /// Gets the awaited expression.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Expression {
        &self.target
    }
}

/// A `yield` or `yield*` expression.
#[derive(Clone, Debug)]
pub struct Yield {
    target: Option<Box<Expression>>,
    delegate: bool,
}

impl Yield {
    /// Creates a new `yield` expression.
    #[must_use]
    pub fn new(target: Option<Expression>, delegate: bool) -> Self {
        Self {
            target: target.map(Box::new),
            delegate,
        }
    }

    /// Gets the yielded expression, if any.
    #[inline]
    #[must_use]
    pub fn target(&self) -> Option<&Expression> {
        self.target.as_deref()
    }

    /// Returns `true` for a delegating `yield*`.
    #[inline]
    #[must_use]
    pub const fn is_delegate(&self) -> bool {
        self.delegate
    }
}

impl From<Ident> for Expression {
    fn from(ident: Ident) -> Self {
        Self::Identifier(ident)
    }
}

impl From<Literal> for Expression {
    fn from(lit: Literal) -> Self {
        Self::Literal(lit)
    }
}

impl From<PropertyAccess> for Expression {
    fn from(access: PropertyAccess) -> Self {
        Self::PropertyAccess(access)
    }
}

impl From<Call> for Expression {
    fn from(call: Call) -> Self {
        Self::Call(call)
    }
}

impl From<PropertyName> for Expression {
    fn from(name: PropertyName) -> Self {
        match name {
            PropertyName::Literal(s) => Self::Literal(Literal::String(s)),
            PropertyName::Computed(expr) => *expr,
        }
    }
}
