// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

use lattice_type::Reader;

use crate::{def::ReducerDef, error::ModuleError, identity::Identity};

/// Per-call metadata handed to every reducer invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReducerContext {
	pub sender: Identity,
	pub timestamp_micros: u64,
}

/// A callable module entry point.
///
/// `invoke` decodes its arguments from `args` in the order [`def`] declares
/// them; the dispatcher checks afterwards that the buffer was fully
/// consumed. The return value reports call errors only: a reducer has no
/// result payload by construction.
///
/// [`def`]: Reducer::def
pub trait Reducer: Send + Sync {
	fn def(&self) -> ReducerDef;

	fn invoke(&self, ctx: &ReducerContext, args: &mut Reader<'_>) -> Result<(), ModuleError>;
}
