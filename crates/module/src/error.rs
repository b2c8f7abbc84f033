// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

use lattice_type::{DecodeError, TypeRef};

use crate::def::ColumnAttr;

/// Errors raised by the module declaration and call boundary.
///
/// Declaration errors abort the registration that caused them and leave the
/// registries untouched. Call errors fail the single reducer call being
/// processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModuleError {
	#[error("sum type has {variants} variants, the serializable maximum is 256")]
	TooManyVariants {
		variants: usize,
	},

	#[error("table `{table}`: {attrs} column attributes for a row type with {columns} columns")]
	ColumnCountMismatch {
		table: String,
		columns: usize,
		attrs: usize,
	},

	#[error("table `{table}`: column `{column}` carries {attr:?} but is not an integer")]
	NonIntegerColumn {
		table: String,
		column: String,
		attr: ColumnAttr,
	},

	#[error("table `{table}`: index `{index}` names column {column_id}, the row has {columns} columns")]
	IndexColumnOutOfRange {
		table: String,
		index: String,
		column_id: u8,
		columns: usize,
	},

	#[error("row type {type_ref} does not resolve to a product type")]
	RowTypeNotProduct {
		type_ref: TypeRef,
	},

	#[error("type reference {type_ref} is not allocated in the typespace")]
	UnknownTypeRef {
		type_ref: TypeRef,
	},

	#[error("typespace slot {type_ref} was allocated but never filled")]
	UnfilledTypeSlot {
		type_ref: TypeRef,
	},

	#[error("no reducer is registered under id {id}")]
	UnknownReducer {
		id: usize,
	},

	#[error(transparent)]
	Decode(#[from] DecodeError),
}
