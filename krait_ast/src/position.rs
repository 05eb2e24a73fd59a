//! Source positions for AST nodes.

use std::fmt;
use std::rc::Rc;

/// A span of source text, described by the byte offsets of its start and end.
///
/// Spans are carried by the nodes an evaluator reports diagnostics for. An
/// AST assembled programmatically (without an upstream parser) may leave all
/// spans empty.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Span {
    start: u32,
    end: u32,
}

impl Span {
    /// The empty span, used by nodes with no source backing.
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    /// Creates a new span from start and end byte offsets.
    ///
    /// # Panics
    ///
    /// Panics if `start` is bigger than `end`.
    #[inline]
    #[must_use]
    pub fn new(start: u32, end: u32) -> Self {
        assert!(start <= end, "a span must start before it ends");
        Self { start, end }
    }

    /// Gets the starting byte offset.
    #[inline]
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Gets the ending byte offset.
    #[inline]
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Returns `true` if this span does not point into any source.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A reference into the source text of a program: a [`Span`] plus the shared
/// source it indexes, from which the referenced slice can be recovered for
/// diagnostics.
#[derive(Clone, Debug, Default)]
pub struct SourceRef {
    span: Span,
    source: Rc<str>,
}

impl SourceRef {
    /// Creates a new source reference.
    #[must_use]
    pub fn new(span: Span, source: Rc<str>) -> Self {
        Self { span, source }
    }

    /// Gets the span of this reference.
    #[inline]
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Gets the referenced slice of source text, or the empty string if the
    /// span does not point into the source.
    #[must_use]
    pub fn text(&self) -> &str {
        let (start, end) = (self.span.start as usize, self.span.end as usize);
        self.source.get(start..end).unwrap_or("")
    }
}
