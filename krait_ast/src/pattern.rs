//! A pattern binding or assignment node.
//!
//! A [`Pattern`] corresponds to both the `BindingPattern` and the
//! `AssignmentPattern` grammar productions: declarations destructure into
//! fresh bindings, while assignment patterns destructure into existing
//! bindings or property references. The assignment-flavored variants carry
//! [`PropertyAccess`] references so an evaluator can preserve the evaluation
//! order of the left-hand side.
//!
//! More information:
//!  - [`BindingPattern` reference][spec1]
//!  - [`AssignmentPattern` reference][spec2]
//!
//! [spec1]: https://tc39.es/ecma262/#prod-BindingPattern
//! [spec2]: https://tc39.es/ecma262/#prod-AssignmentPattern

use crate::{
    expression::{Expression, Ident, PropertyAccess},
    property::PropertyName,
};

/// An object or array pattern binding or assignment.
#[derive(Clone, Debug)]
pub enum Pattern {
    /// An object pattern (`let {a, b, c} = object`).
    Object(ObjectPattern),

    /// An array pattern (`[a, b, c] = array`).
    Array(ArrayPattern),
}

impl From<ObjectPattern> for Pattern {
    fn from(obj: ObjectPattern) -> Self {
        Self::Object(obj)
    }
}

impl From<ArrayPattern> for Pattern {
    fn from(arr: ArrayPattern) -> Self {
        Self::Array(arr)
    }
}

impl Pattern {
    /// Gets the list of identifiers declared or assigned by the pattern.
    #[must_use]
    pub fn idents(&self) -> Vec<&Ident> {
        match self {
            Self::Object(pattern) => pattern.idents(),
            Self::Array(pattern) => pattern.idents(),
        }
    }
}

/// An object pattern.
#[derive(Clone, Debug)]
pub struct ObjectPattern(Box<[ObjectPatternElement]>);

impl ObjectPattern {
    /// Creates a new object pattern.
    #[must_use]
    pub fn new<E: Into<Box<[ObjectPatternElement]>>>(elements: E) -> Self {
        Self(elements.into())
    }

    /// Gets the elements of the pattern.
    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[ObjectPatternElement] {
        &self.0
    }

    /// Returns `true` if the pattern contains a rest element.
    #[must_use]
    pub fn has_rest(&self) -> bool {
        matches!(
            self.0.last(),
            Some(
                ObjectPatternElement::RestProperty { .. }
                    | ObjectPatternElement::AssignmentRestPropertyAccess { .. }
            )
        )
    }

    fn idents(&self) -> Vec<&Ident> {
        let mut idents = Vec::new();
        for element in self.0.iter() {
            match element {
                ObjectPatternElement::SingleName { ident, .. }
                | ObjectPatternElement::RestProperty { ident } => idents.push(ident),
                ObjectPatternElement::Pattern { pattern, .. } => {
                    idents.extend(pattern.idents());
                }
                ObjectPatternElement::AssignmentPropertyAccess { .. }
                | ObjectPatternElement::AssignmentRestPropertyAccess { .. } => {}
            }
        }
        idents
    }
}

/// An array pattern.
#[derive(Clone, Debug)]
pub struct ArrayPattern(Box<[ArrayPatternElement]>);

impl ArrayPattern {
    /// Creates a new array pattern.
    #[must_use]
    pub fn new<E: Into<Box<[ArrayPatternElement]>>>(elements: E) -> Self {
        Self(elements.into())
    }

    /// Gets the elements of the pattern.
    #[inline]
    #[must_use]
    pub fn elements(&self) -> &[ArrayPatternElement] {
        &self.0
    }

    fn idents(&self) -> Vec<&Ident> {
        let mut idents = Vec::new();
        for element in self.0.iter() {
            match element {
                ArrayPatternElement::SingleName { ident, .. }
                | ArrayPatternElement::SingleNameRest { ident } => idents.push(ident),
                ArrayPatternElement::Pattern { pattern, .. }
                | ArrayPatternElement::PatternRest { pattern } => {
                    idents.extend(pattern.idents());
                }
                ArrayPatternElement::Elision
                | ArrayPatternElement::PropertyAccess { .. }
                | ArrayPatternElement::PropertyAccessRest { .. } => {}
            }
        }
        idents
    }
}

/// An element of an object pattern.
#[derive(Clone, Debug)]
pub enum ObjectPatternElement {
    /// A single-name binding (`{ a }`, `{ a: b }`, `{ a = 1 }`).
    SingleName {
        /// The source property name.
        name: PropertyName,
        /// The bound identifier.
        ident: Ident,
        /// The default initializer.
        default_init: Option<Expression>,
    },

    /// A nested pattern (`{ a: [x, y] }`).
    Pattern {
        /// The source property name.
        name: PropertyName,
        /// The nested pattern.
        pattern: Pattern,
        /// The default initializer.
        default_init: Option<Expression>,
    },

    /// An assignment to a property reference (`({ a: obj.b } = v)`).
    AssignmentPropertyAccess {
        /// The source property name.
        name: PropertyName,
        /// The assigned property reference.
        access: PropertyAccess,
        /// The default initializer.
        default_init: Option<Expression>,
    },

    /// A rest binding (`{ ...rest }`).
    RestProperty {
        /// The bound identifier.
        ident: Ident,
    },

    /// A rest assignment to a property reference (`({ ...obj.rest } = v)`).
    AssignmentRestPropertyAccess {
        /// The assigned property reference.
        access: PropertyAccess,
    },
}

/// An element of an array pattern.
#[derive(Clone, Debug)]
pub enum ArrayPatternElement {
    /// An elision (`[, a]`): consumes one iterator result and discards it.
    Elision,

    /// A single-name binding (`[a]`, `[a = 1]`).
    SingleName {
        /// The bound identifier.
        ident: Ident,
        /// The default initializer.
        default_init: Option<Expression>,
    },

    /// An assignment to a property reference (`[obj.a] = v`).
    PropertyAccess {
        /// The assigned property reference.
        access: PropertyAccess,
        /// The default initializer.
        default_init: Option<Expression>,
    },

    /// A nested pattern (`[[x, y]]`).
    Pattern {
        /// The nested pattern.
        pattern: Pattern,
        /// The default initializer.
        default_init: Option<Expression>,
    },

    /// A rest binding (`[...rest]`).
    SingleNameRest {
        /// The bound identifier.
        ident: Ident,
    },

    /// A rest assignment to a property reference (`[...obj.rest] = v`).
    PropertyAccessRest {
        /// The assigned property reference.
        access: PropertyAccess,
    },

    /// A rest binding into a nested pattern (`[...[x, y]]`).
    PatternRest {
        /// The nested pattern.
        pattern: Pattern,
    },
}
