//! Statement lists and the top-level [`Program`] node.

use std::rc::Rc;

use crate::{declaration::Declaration, statement::Statement};

/// An item of a [`StatementList`]: a statement or a declaration.
#[derive(Clone, Debug)]
pub enum StatementListItem {
    /// A statement.
    Statement(Statement),

    /// A declaration.
    Declaration(Declaration),
}

impl From<Statement> for StatementListItem {
    fn from(statement: Statement) -> Self {
        Self::Statement(statement)
    }
}

impl From<Declaration> for StatementListItem {
    fn from(declaration: Declaration) -> Self {
        Self::Declaration(declaration)
    }
}

/// A list of statements and declarations.
#[derive(Clone, Debug, Default)]
pub struct StatementList {
    statements: Box<[StatementListItem]>,
}

impl StatementList {
    /// Gets the items of the list.
    #[inline]
    #[must_use]
    pub fn statements(&self) -> &[StatementListItem] {
        &self.statements
    }

    /// Returns `true` if the list is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl From<Vec<StatementListItem>> for StatementList {
    fn from(statements: Vec<StatementListItem>) -> Self {
        Self {
            statements: statements.into(),
        }
    }
}

impl From<Box<[StatementListItem]>> for StatementList {
    fn from(statements: Box<[StatementListItem]>) -> Self {
        Self { statements }
    }
}

/// The kind of source a program was produced from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ExecutionKind {
    /// Global script code.
    #[default]
    Script,

    /// Code passed to a direct or indirect `eval`.
    Eval,

    /// Module code. Always strict.
    Module,
}

/// A complete program: the root node handed to the evaluator.
#[derive(Clone, Debug, Default)]
pub struct Program {
    body: StatementList,
    strict: bool,
    source: Rc<str>,
}

impl Program {
    /// Creates a new program from its body.
    #[must_use]
    pub fn new<B: Into<StatementList>>(body: B) -> Self {
        Self {
            body: body.into(),
            strict: false,
            source: "".into(),
        }
    }

    /// Marks the program as strict code (a `"use strict"` directive).
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// Attaches the source text the program's spans point into.
    #[must_use]
    pub fn with_source<S: Into<Rc<str>>>(mut self, source: S) -> Self {
        self.source = source.into();
        self
    }

    /// Gets the body of the program.
    #[inline]
    #[must_use]
    pub const fn body(&self) -> &StatementList {
        &self.body
    }

    /// Returns `true` if the program is strict code.
    #[inline]
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Gets the shared source text.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &Rc<str> {
        &self.source
    }
}
