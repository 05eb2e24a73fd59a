//! Error types.
//!
//! The engine distinguishes two error channels, per the run-time semantics:
//!
//! - **ECMAScript throws** are plain values that travel through the
//!   evaluation context's `Throw` signal and are observable by `try`/
//!   `catch`. [`JsNativeError`] is the builder for the standard error
//!   objects (`TypeError`, `ReferenceError`, ...).
//! - **Host faults** ([`Fault`]) are uncatchable: cancellation, call-depth
//!   overflow, unsupported constructs and internal invariant breaches. They
//!   unwind through every user frame and surface to the embedder as
//!   [`EvalError`].

use thiserror::Error;

use crate::value::JsValue;

/// The result type of every fallible evaluator step. The error side carries
/// only host faults; ECMAScript throws travel through the context signal.
pub type EvalResult<T> = Result<T, Fault>;

/// The kind of a standard error object.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ErrorKind {
    /// The `Error` object type.
    Error,

    /// The `TypeError` type.
    Type,

    /// The `RangeError` type.
    Range,

    /// The `ReferenceError` type.
    Reference,

    /// The `SyntaxError` type.
    Syntax,
}

impl ErrorKind {
    /// Gets the value of the `name` property of this error kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Type => "TypeError",
            Self::Range => "RangeError",
            Self::Reference => "ReferenceError",
            Self::Syntax => "SyntaxError",
        }
    }
}

/// A native error under construction: a kind plus a message. Convert it
/// into a throwable error object with
/// [`Context::throw`][crate::context::Context::throw] or
/// [`JsNativeError::to_opaque`][crate::realm::Realm].
#[derive(Clone, Debug, Error)]
#[error("{}: {message}", kind.name())]
pub struct JsNativeError {
    /// The kind of the error.
    pub kind: ErrorKind,

    /// The error message.
    pub message: String,
}

impl JsNativeError {
    /// Creates a new `Error` builder.
    #[must_use]
    pub fn error() -> Self {
        Self {
            kind: ErrorKind::Error,
            message: String::new(),
        }
    }

    /// Creates a new `TypeError` builder.
    #[must_use]
    pub fn typ() -> Self {
        Self {
            kind: ErrorKind::Type,
            message: String::new(),
        }
    }

    /// Creates a new `RangeError` builder.
    #[must_use]
    pub fn range() -> Self {
        Self {
            kind: ErrorKind::Range,
            message: String::new(),
        }
    }

    /// Creates a new `ReferenceError` builder.
    #[must_use]
    pub fn reference() -> Self {
        Self {
            kind: ErrorKind::Reference,
            message: String::new(),
        }
    }

    /// Creates a new `SyntaxError` builder.
    #[must_use]
    pub fn syntax() -> Self {
        Self {
            kind: ErrorKind::Syntax,
            message: String::new(),
        }
    }

    /// Sets the message of the error.
    #[must_use]
    pub fn with_message<M: Into<String>>(mut self, message: M) -> Self {
        self.message = message.into();
        self
    }
}

/// The payload of a cooperative suspension unwinding out of a generator or
/// async body. Only the generator executor may observe this fault; it
/// escaping to the embedder is an engine bug.
#[derive(Debug)]
pub struct Suspension {
    /// The suspension site, assigned during lowering.
    pub(crate) site: usize,

    /// What the suspension produces.
    pub(crate) kind: SuspendKind,
}

/// The flavor of a suspension.
#[derive(Debug)]
pub(crate) enum SuspendKind {
    /// A `yield` producing the given value.
    Yield(JsValue),

    /// An `await` of the given pending promise.
    Await(JsValue),
}

/// An uncatchable host-level failure.
#[derive(Debug, Error)]
pub enum Fault {
    /// The cancellation token was signalled.
    #[error("evaluation cancelled")]
    Cancelled,

    /// The configured maximum call depth was exceeded.
    #[error("Exceeded maximum call depth")]
    CallDepthExceeded,

    /// The evaluator met a construct it does not support.
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    /// An internal invariant did not hold.
    #[error("internal invariant violated: {0}")]
    Invariant(String),

    /// A generator/async suspension in flight. Intercepted by the generator
    /// executor, never surfaced to the embedder.
    #[error("suspension escaped its executor")]
    Suspend(Box<Suspension>),
}

/// The error surface of [`evaluate_program`][crate::evaluate_program]: an
/// uncaught ECMAScript throw, or a host fault.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The program completed with an uncaught `Throw` signal.
    #[error("Uncaught {}", .value.to_display_string())]
    Uncaught {
        /// The thrown value.
        value: JsValue,
    },

    /// A host fault aborted the evaluation.
    #[error(transparent)]
    Fault(#[from] Fault),
}

impl EvalError {
    /// Gets the thrown value of an uncaught throw, if that is what this is.
    #[must_use]
    pub const fn as_thrown(&self) -> Option<&JsValue> {
        match self {
            Self::Uncaught { value } => Some(value),
            Self::Fault(_) => None,
        }
    }
}
