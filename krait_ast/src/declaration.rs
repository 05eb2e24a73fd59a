//! Declaration nodes: functions, classes, and lexical/var declarations.

use std::rc::Rc;

use crate::{
    expression::{Expression, Ident},
    function::{Class, Function},
    pattern::Pattern,
};

/// A hoistable or lexical declaration.
///
/// `var` declarations are *not* here: they hoist like statements and live in
/// [`crate::statement::Statement::Var`].
#[derive(Clone, Debug)]
pub enum Declaration {
    /// A function declaration (ordinary, async, generator or async
    /// generator, distinguished by the node's flags).
    Function(Rc<Function>),

    /// A class declaration.
    Class(Rc<Class>),

    /// A `let` or `const` declaration.
    Lexical(LexicalDeclaration),
}

/// A `let` or `const` declaration.
#[derive(Clone, Debug)]
pub enum LexicalDeclaration {
    /// A `const` declaration. Every declarator must carry an initializer.
    Const(VariableList),

    /// A `let` declaration.
    Let(VariableList),
}

impl LexicalDeclaration {
    /// Gets the declared variables.
    #[must_use]
    pub const fn variable_list(&self) -> &VariableList {
        match self {
            Self::Const(list) | Self::Let(list) => list,
        }
    }

    /// Returns `true` for `const` declarations.
    #[must_use]
    pub const fn is_const(&self) -> bool {
        matches!(self, Self::Const(_))
    }
}

/// A `var` declaration statement payload.
#[derive(Clone, Debug)]
pub struct VarDeclaration(pub VariableList);

/// A non-empty list of variable declarators.
#[derive(Clone, Debug)]
pub struct VariableList {
    list: Box<[Variable]>,
}

impl VariableList {
    /// Creates a variable list.
    ///
    /// # Panics
    ///
    /// Panics if the list of variables is empty.
    #[must_use]
    pub fn new<L: Into<Box<[Variable]>>>(list: L) -> Self {
        let list = list.into();
        assert!(!list.is_empty(), "a variable list must not be empty");
        Self { list }
    }

    /// Gets the declarators.
    #[inline]
    #[must_use]
    pub fn as_ref(&self) -> &[Variable] {
        &self.list
    }
}

/// A single declarator: a binding with an optional initializer.
#[derive(Clone, Debug)]
pub struct Variable {
    binding: Binding,
    init: Option<Expression>,
}

impl Variable {
    /// Creates a declarator from an identifier.
    #[must_use]
    pub fn from_identifier(ident: Ident, init: Option<Expression>) -> Self {
        Self {
            binding: Binding::Identifier(ident),
            init,
        }
    }

    /// Creates a declarator from a destructuring pattern.
    #[must_use]
    pub fn from_pattern(pattern: Pattern, init: Option<Expression>) -> Self {
        Self {
            binding: Binding::Pattern(pattern),
            init,
        }
    }

    /// Gets the binding of the declarator.
    #[inline]
    #[must_use]
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Gets the initializer of the declarator, if any.
    #[inline]
    #[must_use]
    pub const fn init(&self) -> Option<&Expression> {
        self.init.as_ref()
    }

    /// Gets the list of identifiers bound by the declarator.
    #[must_use]
    pub fn idents(&self) -> Vec<&Ident> {
        match &self.binding {
            Binding::Identifier(ident) => vec![ident],
            Binding::Pattern(pattern) => pattern.idents(),
        }
    }
}

/// A binding: a plain identifier or a destructuring pattern.
#[derive(Clone, Debug)]
pub enum Binding {
    /// An identifier binding.
    Identifier(Ident),

    /// A pattern binding.
    Pattern(Pattern),
}

impl From<Ident> for Binding {
    fn from(ident: Ident) -> Self {
        Self::Identifier(ident)
    }
}

impl From<Pattern> for Binding {
    fn from(pattern: Pattern) -> Self {
        Self::Pattern(pattern)
    }
}

impl Binding {
    /// Gets the list of identifiers bound by this binding.
    #[must_use]
    pub fn idents(&self) -> Vec<&Ident> {
        match self {
            Self::Identifier(ident) => vec![ident],
            Self::Pattern(pattern) => pattern.idents(),
        }
    }
}
