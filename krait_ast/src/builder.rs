//! Terse constructors for assembling ASTs programmatically.
//!
//! The upstream parser is not part of this repository, so embedders and the
//! engine test-suite build programs through these helpers. Expression
//! helpers accept anything convertible into an [`Expression`]; bare Rust
//! literals convert into the corresponding ECMAScript literals.

use std::rc::Rc;

use num_bigint::BigInt;

use crate::{
    declaration::{Binding, Declaration, LexicalDeclaration, VarDeclaration, Variable, VariableList},
    expression::{
        ArrayLiteral, Assign, AssignTarget, Await, Binary, Call, Conditional, Expression, Ident,
        Literal, New, ObjectLiteral, PrivateAccess, PropertyAccess, PropertyAccessField, Spread,
        SuperCall, SuperPropertyAccess, TemplateLiteral, TemplatePart, Unary, Update, UpdateTarget,
        Yield,
    },
    function::{Class, FormalParameter, FormalParameterList, Function, FunctionKind},
    operator::{AssignOp, BinaryOp, LogicalOp, RelationalOp, UnaryOp, UpdateOp},
    pattern::{ArrayPattern, ArrayPatternElement, ObjectPattern, ObjectPatternElement, Pattern},
    property::{PropertyDefinition, PropertyName},
    statement::{
        Block, Case, Catch, Continue, DoWhileLoop, Finally, ForInLoop, ForLoop,
        ForLoopInitializer, ForOfLoop, If, IterableLoopInitializer, Labelled, LabelledItem,
        Return, Statement, Switch, Throw, Try, WhileLoop, With,
    },
    statement_list::{Program, StatementList},
};

impl From<f64> for Expression {
    fn from(v: f64) -> Self {
        Self::Literal(Literal::Num(v))
    }
}

impl From<i32> for Expression {
    fn from(v: i32) -> Self {
        Self::Literal(Literal::Num(f64::from(v)))
    }
}

impl From<bool> for Expression {
    fn from(v: bool) -> Self {
        Self::Literal(Literal::Bool(v))
    }
}

impl From<&str> for Expression {
    fn from(v: &str) -> Self {
        Self::Literal(Literal::String(v.into()))
    }
}

/// Builds a [`StatementList`] from anything convertible into its items.
#[macro_export]
macro_rules! stmt_list {
    ($($item:expr),* $(,)?) => {
        $crate::StatementList::from(vec![
            $($crate::StatementListItem::from($item)),*
        ])
    };
}

/// Creates a program from its statement list.
pub fn program<B: Into<StatementList>>(body: B) -> Program {
    Program::new(body)
}

/// Creates a strict program from its statement list.
pub fn strict_program<B: Into<StatementList>>(body: B) -> Program {
    Program::new(body).strict()
}

/// Creates an identifier node.
pub fn id(name: &str) -> Ident {
    Ident::new(name)
}

/// Creates an identifier reference expression.
pub fn ident(name: &str) -> Expression {
    Expression::Identifier(Ident::new(name))
}

/// Creates a `null` literal.
pub fn null() -> Expression {
    Expression::Literal(Literal::Null)
}

/// Creates an `undefined` literal.
pub fn undefined() -> Expression {
    Expression::Literal(Literal::Undefined)
}

/// Creates a BigInt literal.
pub fn bigint<V: Into<BigInt>>(v: V) -> Expression {
    Expression::Literal(Literal::BigInt(Box::new(v.into())))
}

/// Creates a `this` expression.
pub fn this() -> Expression {
    Expression::This
}

/// Creates a `new.target` expression.
pub fn new_target() -> Expression {
    Expression::NewTarget
}

/// Creates an array literal without holes.
pub fn array<E: IntoIterator<Item = Expression>>(elements: E) -> Expression {
    Expression::Array(ArrayLiteral::new(
        elements.into_iter().map(Some).collect::<Vec<_>>(),
    ))
}

/// Creates an array literal with holes (`None` elements are elisions).
pub fn array_with_holes<E: IntoIterator<Item = Option<Expression>>>(elements: E) -> Expression {
    Expression::Array(ArrayLiteral::new(elements.into_iter().collect::<Vec<_>>()))
}

/// Creates an object literal.
pub fn object<M: IntoIterator<Item = PropertyDefinition>>(members: M) -> Expression {
    Expression::Object(ObjectLiteral::new(members.into_iter().collect::<Vec<_>>()))
}

/// Creates an ordinary `name: value` object member.
pub fn prop<V: Into<Expression>>(name: &str, value: V) -> PropertyDefinition {
    PropertyDefinition::Property(PropertyName::from(name), value.into())
}

/// Creates a computed-name object member.
pub fn computed_prop<K: Into<Expression>, V: Into<Expression>>(key: K, value: V) -> PropertyDefinition {
    PropertyDefinition::Property(PropertyName::from(key.into()), value.into())
}

/// Creates a spread element.
pub fn spread<E: Into<Expression>>(target: E) -> Expression {
    Expression::Spread(Spread::new(target.into()))
}

/// Creates a template literal from its parts.
pub fn template<P: IntoIterator<Item = TemplatePart>>(parts: P) -> Expression {
    Expression::Template(TemplateLiteral::new(parts.into_iter().collect::<Vec<_>>()))
}

/// Creates a literal chunk of a template.
pub fn tpl_str(s: &str) -> TemplatePart {
    TemplatePart::String(s.into())
}

/// Creates a substitution chunk of a template.
pub fn tpl_expr<E: Into<Expression>>(e: E) -> TemplatePart {
    TemplatePart::Expr(e.into())
}

/// Creates a named property access (`target.name`).
pub fn member<T: Into<Expression>>(target: T, name: &str) -> PropertyAccess {
    PropertyAccess::new(target.into(), name)
}

/// Creates a computed property access (`target[key]`).
pub fn index<T: Into<Expression>, K: Into<Expression>>(target: T, key: K) -> PropertyAccess {
    PropertyAccess::new(target.into(), key.into())
}

/// Creates a private member access (`target.#name`).
pub fn private_member<T: Into<Expression>>(target: T, name: &str) -> Expression {
    Expression::PrivateAccess(PrivateAccess::new(target.into(), name))
}

/// Creates a `super.name` access.
pub fn super_member(name: &str) -> Expression {
    Expression::SuperPropertyAccess(SuperPropertyAccess::new(name))
}

/// Creates a call expression.
pub fn call<T, A>(target: T, args: A) -> Expression
where
    T: Into<Expression>,
    A: IntoIterator<Item = Expression>,
{
    Expression::Call(Call::new(target.into(), args.into_iter().collect::<Vec<_>>()))
}

/// Creates a `super(...)` call.
pub fn super_call<A: IntoIterator<Item = Expression>>(args: A) -> Expression {
    Expression::SuperCall(SuperCall::new(args.into_iter().collect::<Vec<_>>()))
}

/// Creates a `new` expression.
pub fn new_<T, A>(target: T, args: A) -> Expression
where
    T: Into<Expression>,
    A: IntoIterator<Item = Expression>,
{
    Expression::New(New::new(target.into(), args.into_iter().collect::<Vec<_>>()))
}

/// Creates a unary expression.
pub fn unary<E: Into<Expression>>(op: UnaryOp, target: E) -> Expression {
    Expression::Unary(Unary::new(op, target.into()))
}

/// Creates a `typeof` expression.
pub fn type_of<E: Into<Expression>>(target: E) -> Expression {
    unary(UnaryOp::TypeOf, target)
}

/// Creates a logical negation.
pub fn not<E: Into<Expression>>(target: E) -> Expression {
    unary(UnaryOp::Not, target)
}

/// Creates a numeric negation.
pub fn neg<E: Into<Expression>>(target: E) -> Expression {
    unary(UnaryOp::Minus, target)
}

/// Creates a binary expression.
pub fn binary<O, L, R>(op: O, lhs: L, rhs: R) -> Expression
where
    O: Into<BinaryOp>,
    L: Into<Expression>,
    R: Into<Expression>,
{
    Expression::Binary(Binary::new(op.into(), lhs.into(), rhs.into()))
}

/// Creates an addition.
pub fn add<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(crate::operator::ArithmeticOp::Add, lhs, rhs)
}

/// Creates a subtraction.
pub fn sub<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(crate::operator::ArithmeticOp::Sub, lhs, rhs)
}

/// Creates a multiplication.
pub fn mul<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(crate::operator::ArithmeticOp::Mul, lhs, rhs)
}

/// Creates a strict equality test.
pub fn strict_eq<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(RelationalOp::StrictEqual, lhs, rhs)
}

/// Creates a loose equality test.
pub fn loose_eq<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(RelationalOp::Equal, lhs, rhs)
}

/// Creates a less-than test.
pub fn lt<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(RelationalOp::LessThan, lhs, rhs)
}

/// Creates a less-than-or-equal test.
pub fn le<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(RelationalOp::LessThanOrEqual, lhs, rhs)
}

/// Creates an `instanceof` test.
pub fn instance_of<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(RelationalOp::InstanceOf, lhs, rhs)
}

/// Creates an `in` test.
pub fn in_<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(RelationalOp::In, lhs, rhs)
}

/// Creates a short-circuiting `&&`.
pub fn and<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(LogicalOp::And, lhs, rhs)
}

/// Creates a short-circuiting `||`.
pub fn or<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(LogicalOp::Or, lhs, rhs)
}

/// Creates a nullish coalescing `??`.
pub fn coalesce<L: Into<Expression>, R: Into<Expression>>(lhs: L, rhs: R) -> Expression {
    binary(LogicalOp::Coalesce, lhs, rhs)
}

/// Creates an update expression on an identifier.
pub fn update_ident(op: UpdateOp, name: &str) -> Expression {
    Expression::Update(Update::new(op, UpdateTarget::Identifier(Ident::new(name))))
}

/// Creates a conditional (`c ? t : f`) expression.
pub fn cond<C, T, F>(condition: C, if_true: T, if_false: F) -> Expression
where
    C: Into<Expression>,
    T: Into<Expression>,
    F: Into<Expression>,
{
    Expression::Conditional(Conditional::new(
        condition.into(),
        if_true.into(),
        if_false.into(),
    ))
}

/// Creates a plain assignment.
pub fn assign<T: Into<AssignTarget>, V: Into<Expression>>(target: T, value: V) -> Expression {
    Expression::Assign(Assign::new(AssignOp::Assign, target, value.into()))
}

/// Creates a compound or logical assignment.
pub fn assign_op<T: Into<AssignTarget>, V: Into<Expression>>(
    op: AssignOp,
    target: T,
    value: V,
) -> Expression {
    Expression::Assign(Assign::new(op, target, value.into()))
}

/// Creates a comma sequence.
pub fn seq<E: IntoIterator<Item = Expression>>(exprs: E) -> Expression {
    Expression::Sequence(exprs.into_iter().collect::<Vec<_>>().into())
}

/// Creates an `await` expression.
pub fn await_<E: Into<Expression>>(target: E) -> Expression {
    Expression::Await(Await::new(target.into()))
}

/// Creates a `yield` expression.
pub fn yield_<E: Into<Expression>>(target: E) -> Expression {
    Expression::Yield(Yield::new(Some(target.into()), false))
}

/// Creates a bare `yield`.
pub fn yield_none() -> Expression {
    Expression::Yield(Yield::new(None, false))
}

/// Creates a delegating `yield*`.
pub fn yield_star<E: Into<Expression>>(target: E) -> Expression {
    Expression::Yield(Yield::new(Some(target.into()), true))
}

/// Creates a simple parameter list from identifier names.
pub fn params(names: &[&str]) -> FormalParameterList {
    FormalParameterList::new(
        names
            .iter()
            .map(|name| FormalParameter::new(Ident::new(*name), None, false))
            .collect::<Vec<_>>(),
    )
}

/// Creates a parameter list from explicit parameters.
pub fn params_with<P: IntoIterator<Item = FormalParameter>>(parameters: P) -> FormalParameterList {
    FormalParameterList::new(parameters.into_iter().collect::<Vec<_>>())
}

/// Creates a single parameter.
pub fn param<B: Into<Binding>>(binding: B, init: Option<Expression>) -> FormalParameter {
    FormalParameter::new(binding, init, false)
}

/// Creates a rest parameter.
pub fn rest_param<B: Into<Binding>>(binding: B) -> FormalParameter {
    FormalParameter::new(binding, None, true)
}

fn function_node(
    kind: FunctionKind,
    name: Option<&str>,
    parameters: FormalParameterList,
    body: StatementList,
) -> Function {
    Function::new(name.map(Ident::new), parameters, body, kind)
}

/// Creates a function declaration.
pub fn func_decl<B: Into<StatementList>>(
    name: &str,
    parameters: FormalParameterList,
    body: B,
) -> Declaration {
    Declaration::Function(Rc::new(function_node(
        FunctionKind::Ordinary,
        Some(name),
        parameters,
        body.into(),
    )))
}

/// Creates a generator declaration.
pub fn gen_decl<B: Into<StatementList>>(
    name: &str,
    parameters: FormalParameterList,
    body: B,
) -> Declaration {
    Declaration::Function(Rc::new(function_node(
        FunctionKind::Generator,
        Some(name),
        parameters,
        body.into(),
    )))
}

/// Creates an async function declaration.
pub fn async_decl<B: Into<StatementList>>(
    name: &str,
    parameters: FormalParameterList,
    body: B,
) -> Declaration {
    Declaration::Function(Rc::new(function_node(
        FunctionKind::Async,
        Some(name),
        parameters,
        body.into(),
    )))
}

/// Creates an async generator declaration.
pub fn async_gen_decl<B: Into<StatementList>>(
    name: &str,
    parameters: FormalParameterList,
    body: B,
) -> Declaration {
    Declaration::Function(Rc::new(function_node(
        FunctionKind::AsyncGenerator,
        Some(name),
        parameters,
        body.into(),
    )))
}

/// Creates a function expression.
pub fn func_expr<B: Into<StatementList>>(
    name: Option<&str>,
    parameters: FormalParameterList,
    body: B,
) -> Expression {
    Expression::Function(Rc::new(function_node(
        FunctionKind::Ordinary,
        name,
        parameters,
        body.into(),
    )))
}

/// Creates a generator expression.
pub fn gen_expr<B: Into<StatementList>>(
    name: Option<&str>,
    parameters: FormalParameterList,
    body: B,
) -> Expression {
    Expression::Function(Rc::new(function_node(
        FunctionKind::Generator,
        name,
        parameters,
        body.into(),
    )))
}

/// Creates an arrow function expression.
pub fn arrow<B: Into<StatementList>>(parameters: FormalParameterList, body: B) -> Expression {
    Expression::Function(Rc::new(
        function_node(FunctionKind::Ordinary, None, parameters, body.into()).arrow(),
    ))
}

/// Creates an async arrow function expression.
pub fn async_arrow<B: Into<StatementList>>(parameters: FormalParameterList, body: B) -> Expression {
    Expression::Function(Rc::new(
        function_node(FunctionKind::Async, None, parameters, body.into()).arrow(),
    ))
}

/// Creates a class declaration.
pub fn class_decl(class: Class) -> Declaration {
    Declaration::Class(Rc::new(class))
}

/// Creates a class expression.
pub fn class_expr(class: Class) -> Expression {
    Expression::Class(Rc::new(class))
}

/// Creates a method body for a class or object literal.
pub fn method<B: Into<StatementList>>(parameters: FormalParameterList, body: B) -> Rc<Function> {
    Rc::new(function_node(
        FunctionKind::Ordinary,
        None,
        parameters,
        body.into(),
    ))
}

/// Creates an expression statement.
pub fn stmt<E: Into<Expression>>(expr: E) -> Statement {
    Statement::Expression(expr.into())
}

/// Creates a block statement.
pub fn block<B: Into<StatementList>>(body: B) -> Statement {
    Statement::Block(Block::from(body.into()))
}

/// Creates a `var` declaration statement.
pub fn var_decl<'a, D>(declarators: D) -> Statement
where
    D: IntoIterator<Item = (&'a str, Option<Expression>)>,
{
    Statement::Var(VarDeclaration(variable_list(declarators)))
}

/// Creates a `let` declaration.
pub fn let_decl<'a, D>(declarators: D) -> Declaration
where
    D: IntoIterator<Item = (&'a str, Option<Expression>)>,
{
    Declaration::Lexical(LexicalDeclaration::Let(variable_list(declarators)))
}

/// Creates a `const` declaration.
pub fn const_decl<'a, D>(declarators: D) -> Declaration
where
    D: IntoIterator<Item = (&'a str, Option<Expression>)>,
{
    Declaration::Lexical(LexicalDeclaration::Const(variable_list(declarators)))
}

/// Creates a `let` declaration destructuring into a pattern.
pub fn let_pattern<P: Into<Pattern>>(pattern: P, init: Expression) -> Declaration {
    Declaration::Lexical(LexicalDeclaration::Let(VariableList::new(vec![
        Variable::from_pattern(pattern.into(), Some(init)),
    ])))
}

/// Creates a `const` declaration destructuring into a pattern.
pub fn const_pattern<P: Into<Pattern>>(pattern: P, init: Expression) -> Declaration {
    Declaration::Lexical(LexicalDeclaration::Const(VariableList::new(vec![
        Variable::from_pattern(pattern.into(), Some(init)),
    ])))
}

fn variable_list<'a, D>(declarators: D) -> VariableList
where
    D: IntoIterator<Item = (&'a str, Option<Expression>)>,
{
    VariableList::new(
        declarators
            .into_iter()
            .map(|(name, init)| Variable::from_identifier(Ident::new(name), init))
            .collect::<Vec<_>>(),
    )
}

/// Creates an `if` statement.
pub fn if_stmt<C: Into<Expression>>(
    condition: C,
    body: Statement,
    else_node: Option<Statement>,
) -> Statement {
    Statement::If(If::new(condition.into(), body, else_node))
}

/// Creates a `while` loop.
pub fn while_loop<C: Into<Expression>>(condition: C, body: Statement) -> Statement {
    Statement::WhileLoop(WhileLoop::new(condition.into(), body))
}

/// Creates a `do`/`while` loop.
pub fn do_while<C: Into<Expression>>(body: Statement, condition: C) -> Statement {
    Statement::DoWhileLoop(DoWhileLoop::new(body, condition.into()))
}

/// Creates a classic `for` loop.
pub fn for_loop(
    init: Option<ForLoopInitializer>,
    condition: Option<Expression>,
    final_expr: Option<Expression>,
    body: Statement,
) -> Statement {
    Statement::ForLoop(ForLoop::new(init, condition, final_expr, body))
}

/// Creates a `for`-loop initializer from a `let` declaration.
pub fn for_let<'a, D>(declarators: D) -> ForLoopInitializer
where
    D: IntoIterator<Item = (&'a str, Option<Expression>)>,
{
    ForLoopInitializer::Lexical(LexicalDeclaration::Let(variable_list(declarators)))
}

/// Creates a `for`-loop initializer from a `var` declaration.
pub fn for_var<'a, D>(declarators: D) -> ForLoopInitializer
where
    D: IntoIterator<Item = (&'a str, Option<Expression>)>,
{
    ForLoopInitializer::Var(VarDeclaration(variable_list(declarators)))
}

/// Creates a `for-of` loop.
pub fn for_of<I: Into<Expression>>(
    initializer: IterableLoopInitializer,
    iterable: I,
    body: Statement,
) -> Statement {
    Statement::ForOfLoop(ForOfLoop::new(initializer, iterable.into(), body, false))
}

/// Creates a `for await-of` loop.
pub fn for_await_of<I: Into<Expression>>(
    initializer: IterableLoopInitializer,
    iterable: I,
    body: Statement,
) -> Statement {
    Statement::ForOfLoop(ForOfLoop::new(initializer, iterable.into(), body, true))
}

/// Creates a `for-in` loop.
pub fn for_in<T: Into<Expression>>(
    initializer: IterableLoopInitializer,
    target: T,
    body: Statement,
) -> Statement {
    Statement::ForInLoop(ForInLoop::new(initializer, target.into(), body))
}

/// Creates a per-iteration `let` binding for a `for-in`/`for-of` head.
pub fn of_let(name: &str) -> IterableLoopInitializer {
    IterableLoopInitializer::Let(Binding::Identifier(Ident::new(name)))
}

/// Creates a per-iteration `const` binding for a `for-in`/`for-of` head.
pub fn of_const(name: &str) -> IterableLoopInitializer {
    IterableLoopInitializer::Const(Binding::Identifier(Ident::new(name)))
}

/// Creates a per-iteration `var` binding for a `for-in`/`for-of` head.
pub fn of_var(name: &str) -> IterableLoopInitializer {
    IterableLoopInitializer::Var(Binding::Identifier(Ident::new(name)))
}

/// Creates a `switch` statement.
pub fn switch_stmt<V, C>(val: V, cases: C) -> Statement
where
    V: Into<Expression>,
    C: IntoIterator<Item = Case>,
{
    Statement::Switch(Switch::new(val.into(), cases.into_iter().collect::<Vec<_>>()))
}

/// Creates a `case` clause.
pub fn case<C: Into<Expression>, B: Into<StatementList>>(condition: C, body: B) -> Case {
    Case::new(condition.into(), body.into())
}

/// Creates the `default` clause.
pub fn default_case<B: Into<StatementList>>(body: B) -> Case {
    Case::default(body.into())
}

/// Creates a `break` statement.
pub fn break_stmt(label: Option<&str>) -> Statement {
    Statement::Break(crate::statement::Break::new(label.map(Ident::new)))
}

/// Creates a `continue` statement.
pub fn continue_stmt(label: Option<&str>) -> Statement {
    Statement::Continue(Continue::new(label.map(Ident::new)))
}

/// Creates a `return` statement with a value.
pub fn ret<E: Into<Expression>>(target: E) -> Statement {
    Statement::Return(Return::new(Some(target.into())))
}

/// Creates a bare `return`.
pub fn ret_none() -> Statement {
    Statement::Return(Return::new(None))
}

/// Creates a labelled statement.
pub fn label(name: &str, statement: Statement) -> Statement {
    Statement::Labelled(Labelled::new(
        LabelledItem::Statement(statement),
        Ident::new(name),
    ))
}

/// Creates a `throw` statement.
pub fn throw<E: Into<Expression>>(target: E) -> Statement {
    Statement::Throw(Throw::new(target.into()))
}

/// Creates a `try`/`catch` statement.
pub fn try_catch<B, H>(block: B, parameter: Option<Binding>, handler: H) -> Statement
where
    B: Into<StatementList>,
    H: Into<StatementList>,
{
    Statement::Try(Try::new(
        Block::from(block.into()),
        Some(Catch::new(parameter, Block::from(handler.into()))),
        None,
    ))
}

/// Creates a `try`/`finally` statement.
pub fn try_finally<B, F>(block: B, finally: F) -> Statement
where
    B: Into<StatementList>,
    F: Into<StatementList>,
{
    Statement::Try(Try::new(
        Block::from(block.into()),
        None,
        Some(Finally::from(Block::from(finally.into()))),
    ))
}

/// Creates a `try`/`catch`/`finally` statement.
pub fn try_catch_finally<B, H, F>(
    block: B,
    parameter: Option<Binding>,
    handler: H,
    finally: F,
) -> Statement
where
    B: Into<StatementList>,
    H: Into<StatementList>,
    F: Into<StatementList>,
{
    Statement::Try(Try::new(
        Block::from(block.into()),
        Some(Catch::new(parameter, Block::from(handler.into()))),
        Some(Finally::from(Block::from(finally.into()))),
    ))
}

/// Creates a `with` statement.
pub fn with_stmt<E: Into<Expression>>(expression: E, statement: Statement) -> Statement {
    Statement::With(With::new(expression.into(), statement))
}

/// Creates an array pattern of plain identifier bindings.
pub fn array_binding(names: &[&str]) -> Pattern {
    Pattern::Array(ArrayPattern::new(
        names
            .iter()
            .map(|name| ArrayPatternElement::SingleName {
                ident: Ident::new(*name),
                default_init: None,
            })
            .collect::<Vec<_>>(),
    ))
}

/// Creates an array pattern from explicit elements.
pub fn array_pattern<E: IntoIterator<Item = ArrayPatternElement>>(elements: E) -> Pattern {
    Pattern::Array(ArrayPattern::new(elements.into_iter().collect::<Vec<_>>()))
}

/// Creates an object pattern from explicit elements.
pub fn object_pattern<E: IntoIterator<Item = ObjectPatternElement>>(elements: E) -> Pattern {
    Pattern::Object(ObjectPattern::new(elements.into_iter().collect::<Vec<_>>()))
}

/// Creates an object pattern of shorthand identifier bindings.
pub fn object_binding(names: &[&str]) -> Pattern {
    Pattern::Object(ObjectPattern::new(
        names
            .iter()
            .map(|name| ObjectPatternElement::SingleName {
                name: PropertyName::from(*name),
                ident: Ident::new(*name),
                default_init: None,
            })
            .collect::<Vec<_>>(),
    ))
}

/// Creates the field of a computed member expression usable as a property
/// name.
pub fn computed<E: Into<Expression>>(expr: E) -> PropertyName {
    PropertyName::from(expr.into())
}

/// Creates an optional named property access (`target?.name`).
pub fn opt_member<T: Into<Expression>>(target: T, name: &str) -> PropertyAccess {
    PropertyAccess::new(target.into(), name).optional()
}

/// Creates an optional call (`target?.()`).
pub fn opt_call<T, A>(target: T, args: A) -> Expression
where
    T: Into<Expression>,
    A: IntoIterator<Item = Expression>,
{
    Expression::Call(Call::new(target.into(), args.into_iter().collect::<Vec<_>>()).optional())
}

/// Creates a field reference usable as the target of a
/// [`PropertyAccessField`]-based helper.
pub fn field_of(name: &str) -> PropertyAccessField {
    PropertyAccessField::from(name)
}
