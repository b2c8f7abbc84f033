// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! The predicate surface handed to the compiler.
//!
//! Callers build this tree by hand or from a parser; the compiler lowers it
//! against a concrete row type. Shapes outside the supported set
//! (column-vs-constant comparisons under boolean connectives) are carried so
//! they can be rejected with a precise error instead of failing to parse.

use crate::ast::{CmpOp, LogicOp};

/// A constant operand, untyped until it meets a column.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
	Bool(bool),
	Int(i128),
	Float(f64),
	String(String),
}

/// An unlowered predicate over named columns.
#[derive(Clone, Debug, PartialEq)]
pub enum PredicateExpr {
	Column(String),
	Literal(Literal),
	Compare {
		op: CmpOp,
		left: Box<PredicateExpr>,
		right: Box<PredicateExpr>,
	},
	Logic {
		op: LogicOp,
		left: Box<PredicateExpr>,
		right: Box<PredicateExpr>,
	},
	Not(Box<PredicateExpr>),
	/// Function calls are never compilable; kept so rejection can name the
	/// function.
	Call {
		name: String,
		args: Vec<PredicateExpr>,
	},
}

impl PredicateExpr {
	pub fn column(name: impl Into<String>) -> Self {
		PredicateExpr::Column(name.into())
	}

	pub fn int(value: impl Into<i128>) -> Self {
		PredicateExpr::Literal(Literal::Int(value.into()))
	}

	pub fn float(value: f64) -> Self {
		PredicateExpr::Literal(Literal::Float(value))
	}

	pub fn bool(value: bool) -> Self {
		PredicateExpr::Literal(Literal::Bool(value))
	}

	pub fn string(value: impl Into<String>) -> Self {
		PredicateExpr::Literal(Literal::String(value.into()))
	}

	pub fn compare(op: CmpOp, left: PredicateExpr, right: PredicateExpr) -> Self {
		PredicateExpr::Compare {
			op,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	pub fn eq(left: PredicateExpr, right: PredicateExpr) -> Self {
		Self::compare(CmpOp::Eq, left, right)
	}

	pub fn and(left: PredicateExpr, right: PredicateExpr) -> Self {
		PredicateExpr::Logic {
			op: LogicOp::And,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	pub fn or(left: PredicateExpr, right: PredicateExpr) -> Self {
		PredicateExpr::Logic {
			op: LogicOp::Or,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	pub fn not(arg: PredicateExpr) -> Self {
		PredicateExpr::Not(Box::new(arg))
	}
}
