// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! Predicate compilation for Lattice modules.
//!
//! A module-side predicate over named columns ([`PredicateExpr`]) is lowered
//! against a concrete row type into the erased filter AST ([`Expr`]) a host
//! evaluates: comparisons carry a column index and a constant that was
//! encoded with the column's type at compile time. The compiled form is
//! handed over as bytes; only the closed shape of column-vs-constant
//! comparisons under `and`/`or`/`not` is accepted.

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod ast;
mod compile;
mod error;
mod expr;

pub use ast::{Cmp, CmpArgs, CmpOp, Expr, Logic, LogicOp, Rhs, Unary, UnaryOp, expr_type};
pub use compile::compile;
pub use error::FilterError;
pub use expr::{Literal, PredicateExpr};
