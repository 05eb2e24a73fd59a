//! Krait's **`krait_ast`** crate implements the typed ECMAScript abstract
//! syntax tree consumed by the evaluator.
//!
//! # Crate Overview
//! **krait_ast** contains representations of the Parse Nodes the evaluator
//! executes. Grammar productions that exist only to raise early errors have
//! no counterpart here; an upstream parser is expected to have enforced
//! them. The AST is split into three main components: [`Declaration`]s,
//! [`Expression`]s and [`Statement`]s, with [`StatementList`] combining all
//! of them and [`Program`] as the root node handed to the evaluator.
//!
//! There is no parser in this repository: the AST *is* the input interface.
//! The [`builder`] module offers terse constructors for assembling programs
//! programmatically, which the engine test-suite uses throughout.
//!
//! # Krait Crates
//!  - **krait_ast** - Krait's ECMAScript Abstract Syntax Tree.
//!  - **krait_engine** - Krait's evaluator, value model and runtime.

#![doc(html_logo_url = "https://raw.githubusercontent.com/krait-dev/krait/main/assets/logo.svg")]
#![cfg_attr(not(test), forbid(clippy::unwrap_used))]
#![warn(missing_docs, clippy::dbg_macro)]
#![allow(
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::option_if_let_else
)]

mod position;

pub mod builder;
pub mod declaration;
pub mod expression;
pub mod function;
pub mod operator;
pub mod pattern;
pub mod property;
pub mod statement;
pub mod statement_list;

pub use self::{
    declaration::Declaration,
    expression::Expression,
    position::{SourceRef, Span},
    statement::Statement,
    statement_list::{ExecutionKind, Program, StatementList, StatementListItem},
};
