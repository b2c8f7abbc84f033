// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! Module schema aggregation and the reducer call boundary.
//!
//! A Lattice module declares its surface — types, tables, reducers, named
//! exports — into a [`ModuleRegistry`] during initialization. The registry
//! validates every declaration up front (column attribute arity, integer
//! requirements for generated columns, index column ranges, the 256-variant
//! sum limit) so that an invalid schema is rejected before a host ever sees
//! it. Once declared, the schema is served as a self-described binary
//! document and reducer calls are dispatched against the strict-length
//! argument contract.

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod def;
mod error;
mod identity;
mod reducer;
mod registry;

pub use def::{ColumnAttr, IndexDef, IndexKind, ModuleDef, ModuleExport, ReducerDef, TableDef, TypeAlias};
pub use error::ModuleError;
pub use identity::Identity;
pub use reducer::{Reducer, ReducerContext};
pub use registry::{
	MAX_SUM_VARIANTS, ModuleRegistry, alloc_type_slot, call_reducer, describe_module, fill_type_slot,
	register_reducer, register_table, register_type, register_type_alias,
};
