//! Krait's **`krait_engine`** crate: a tree-walking evaluator for a large
//! subset of the ECMAScript language.
//!
//! # Crate Overview
//! Given a typed AST produced by an upstream parser (see [`krait_ast`]),
//! the engine executes the program and returns its completion value,
//! observing ECMAScript semantics for scoping, hoisting, strict mode,
//! closures, iteration, generators, classes, destructuring and
//! async/await. Generator and async bodies run through a small linear
//! instruction plan with an explicit program counter, so they can suspend
//! between instructions and resume later.
//!
//! The standard library proper is a host concern; the realm only carries
//! the intrinsics the language semantics themselves reach for (prototype
//! roots, error constructors, a minimal `Promise` with a job queue, the
//! `Symbol` namespace).
//!
//! ```
//! use krait_ast::builder::*;
//! use krait_ast::stmt_list;
//! use krait_engine::{Context, JsValue};
//!
//! let mut context = Context::new();
//! let program = program(stmt_list![
//!     var_decl([("x", Some(1.into()))]),
//!     stmt(add(ident("x"), 2)),
//! ]);
//! let value = context.eval(&program).unwrap();
//! assert_eq!(value, JsValue::from(3));
//! ```
//!
//! # Krait Crates
//!  - **krait_ast** - Krait's ECMAScript Abstract Syntax Tree.
//!  - **krait_engine** - Krait's evaluator, value model and runtime.

#![doc(html_logo_url = "https://raw.githubusercontent.com/krait-dev/krait/main/assets/logo.svg")]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![warn(clippy::dbg_macro)]
#![allow(
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::option_if_let_else,
    clippy::use_self
)]

pub mod bigint;
pub mod builtins;
pub mod context;
pub mod environments;
pub mod error;
pub mod eval;
pub mod function;
pub mod iterator;
pub mod job;
pub mod object;
pub mod private;
pub mod property;
pub mod realm;
pub mod scheduler;
pub mod string;
pub mod symbol;
pub mod generator;
pub mod value;

#[cfg(test)]
mod tests;

pub use self::{
    bigint::JsBigInt,
    context::{CancellationToken, Context, ContextBuilder, RuntimeLimits, Signal},
    error::{ErrorKind, EvalError, EvalResult, Fault, JsNativeError},
    eval::{evaluate_program, EvalOptions},
    object::JsObject,
    realm::Realm,
    scheduler::{AwaitOutcome, DefaultScheduler, Scheduler},
    string::JsString,
    symbol::JsSymbol,
    value::JsValue,
};
