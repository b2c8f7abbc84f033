// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

use lattice_type::BuiltinType;

/// Errors raised while lowering a predicate against a row type.
///
/// Compilation is all-or-nothing: on error no partial AST is emitted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
	#[error("unknown column `{column}`")]
	UnknownColumn {
		column: String,
	},

	#[error("row has {columns} columns, filterable rows carry at most 256")]
	RowTooWide {
		columns: usize,
	},

	#[error("column `{column}` compared against another column; only constants are supported")]
	FieldComparison {
		column: String,
	},

	#[error("comparison between two constants")]
	ConstantComparison,

	#[error("call to `{name}` cannot be compiled into a filter")]
	UnsupportedCall {
		name: String,
	},

	#[error("expression shape is not supported in a filter")]
	UnsupportedExpression,

	#[error("column `{column}` is {expected:?}, the literal does not fit that type")]
	TypeMismatch {
		column: String,
		expected: BuiltinType,
	},

	#[error("literal {value} is out of range for column `{column}` ({expected:?})")]
	OutOfRange {
		column: String,
		value: i128,
		expected: BuiltinType,
	},

	#[error("column `{column}` is not a filterable builtin")]
	UnfilterableColumn {
		column: String,
	},
}
