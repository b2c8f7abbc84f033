// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! Declaration-time aggregation and the call boundary.
//!
//! A module declares itself into a [`ModuleRegistry`] during initialization:
//! types, tables, reducers, aliases. Afterwards the registry is effectively
//! read-only; [`describe`](ModuleRegistry::describe) serializes the schema
//! document and [`call_reducer`](ModuleRegistry::call_reducer) dispatches
//! calls. Free functions at the bottom expose the same operations on the
//! process-wide registry.

use std::mem;

use lattice_type::{AlgebraicType, Described, Reader, TypeRef};
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{
	def::{ModuleDef, ModuleExport, TableDef, TypeAlias},
	error::ModuleError,
	reducer::{Reducer, ReducerContext},
};

/// The sum discriminant is a single byte, so a serializable sum carries at
/// most this many variants.
pub const MAX_SUM_VARIANTS: usize = 256;

#[derive(Default)]
pub struct ModuleRegistry {
	def: ModuleDef,
	reducers: Vec<Box<dyn Reducer>>,
}

impl ModuleRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn def(&self) -> &ModuleDef {
		&self.def
	}

	/// Validates and adds a type to the typespace.
	pub fn register_type(&mut self, algebraic_type: AlgebraicType) -> Result<TypeRef, ModuleError> {
		validate_type(&algebraic_type)?;
		let type_ref = self.def.typespace.add(algebraic_type);
		tracing::debug!(%type_ref, "registered type");
		Ok(type_ref)
	}

	/// Reserves a typespace slot for a definition that needs to mention
	/// itself.
	pub fn alloc_type_slot(&mut self) -> TypeRef {
		self.def.typespace.alloc()
	}

	/// Validates and installs the definitive type into a reserved slot.
	pub fn fill_type_slot(&mut self, type_ref: TypeRef, algebraic_type: AlgebraicType) -> Result<(), ModuleError> {
		validate_type(&algebraic_type)?;
		self.def.typespace.fill(type_ref, algebraic_type);
		tracing::debug!(%type_ref, "filled type slot");
		Ok(())
	}

	/// Validates and records a table declaration.
	pub fn register_table(&mut self, table: TableDef) -> Result<(), ModuleError> {
		let row = self.def.typespace.resolve(table.data).ok_or(ModuleError::UnknownTypeRef {
			type_ref: table.data,
		})?;
		let product = row.as_product().ok_or(ModuleError::RowTypeNotProduct {
			type_ref: table.data,
		})?;

		if table.column_attrs.len() != product.elements.len() {
			return Err(ModuleError::ColumnCountMismatch {
				table: table.name,
				columns: product.elements.len(),
				attrs: table.column_attrs.len(),
			});
		}

		for (element, attr) in product.elements.iter().zip(&table.column_attrs) {
			if attr.requires_integer() && !resolve_shallow(&self.def, &element.algebraic_type).is_integer() {
				return Err(ModuleError::NonIntegerColumn {
					table: table.name,
					column: element.name.clone(),
					attr: *attr,
				});
			}
		}

		for index in &table.indexes {
			for &column_id in &index.column_ids {
				if usize::from(column_id) >= product.elements.len() {
					return Err(ModuleError::IndexColumnOutOfRange {
						table: table.name,
						index: index.name.clone(),
						column_id,
						columns: product.elements.len(),
					});
				}
			}
		}

		tracing::debug!(table = %table.name, "registered table");
		self.def.tables.push(table);
		Ok(())
	}

	/// Validates a reducer's argument types and records it for dispatch.
	/// Dispatch ids are assigned in registration order.
	pub fn register_reducer(&mut self, reducer: Box<dyn Reducer>) -> Result<(), ModuleError> {
		let def = reducer.def();
		for arg in &def.args {
			validate_type(&arg.algebraic_type)?;
		}
		tracing::debug!(reducer = %def.name, id = self.reducers.len(), "registered reducer");
		self.def.reducers.push(def);
		self.reducers.push(reducer);
		Ok(())
	}

	/// Publishes a name for a typespace entry.
	pub fn register_type_alias(&mut self, name: impl Into<String>, ty: TypeRef) -> Result<(), ModuleError> {
		if self.def.typespace.resolve(ty).is_none() {
			return Err(ModuleError::UnknownTypeRef {
				type_ref: ty,
			});
		}
		self.def.exports.push(ModuleExport::TypeAlias(TypeAlias {
			name: name.into(),
			ty,
		}));
		Ok(())
	}

	/// Serializes the schema document. Placeholder slots must all be filled
	/// by now; repeated calls yield byte-identical output.
	pub fn describe(&self) -> Result<Vec<u8>, ModuleError> {
		if let Some(&type_ref) = self.def.typespace.unfilled().first() {
			return Err(ModuleError::UnfilledTypeSlot {
				type_ref,
			});
		}
		Ok(ModuleDef::codec().encode(&self.def))
	}

	/// Dispatches one reducer call. The argument buffer must hold exactly
	/// the declared arguments; leftover bytes fail the call.
	pub fn call_reducer(&self, id: usize, ctx: &ReducerContext, args: &[u8]) -> Result<(), ModuleError> {
		let reducer = self.reducers.get(id).ok_or(ModuleError::UnknownReducer {
			id,
		})?;
		let mut reader = Reader::new(args);
		reducer.invoke(ctx, &mut reader).inspect_err(|error| {
			tracing::warn!(id, %error, "reducer call failed");
		})?;
		reader.expect_end()?;
		Ok(())
	}
}

/// One level of `Ref` indirection; deeper chains stay unresolved and fail
/// the integer check.
fn resolve_shallow<'a>(def: &'a ModuleDef, ty: &'a AlgebraicType) -> &'a AlgebraicType {
	match ty {
		AlgebraicType::Ref(type_ref) => def.typespace.resolve(*type_ref).unwrap_or(ty),
		_ => ty,
	}
}

/// Rejects descriptors no value could ever travel under: a sum with more
/// variants than the one-byte discriminant can address, anywhere in the
/// tree.
fn validate_type(algebraic_type: &AlgebraicType) -> Result<(), ModuleError> {
	match algebraic_type {
		AlgebraicType::Sum(sum) => {
			if sum.variants.len() > MAX_SUM_VARIANTS {
				return Err(ModuleError::TooManyVariants {
					variants: sum.variants.len(),
				});
			}
			for variant in &sum.variants {
				validate_type(&variant.algebraic_type)?;
			}
			Ok(())
		}
		AlgebraicType::Product(product) => {
			for element in &product.elements {
				validate_type(&element.algebraic_type)?;
			}
			Ok(())
		}
		AlgebraicType::Builtin(builtin) => match builtin {
			lattice_type::BuiltinType::Array(element) => validate_type(element),
			lattice_type::BuiltinType::Map {
				key,
				value,
			} => {
				validate_type(key)?;
				validate_type(value)
			}
			_ => Ok(()),
		},
		AlgebraicType::Ref(_) => Ok(()),
	}
}

static MODULE: Lazy<RwLock<ModuleRegistry>> = Lazy::new(|| RwLock::new(ModuleRegistry::new()));

pub fn register_type(algebraic_type: AlgebraicType) -> Result<TypeRef, ModuleError> {
	MODULE.write().register_type(algebraic_type)
}

pub fn alloc_type_slot() -> TypeRef {
	MODULE.write().alloc_type_slot()
}

pub fn fill_type_slot(type_ref: TypeRef, algebraic_type: AlgebraicType) -> Result<(), ModuleError> {
	MODULE.write().fill_type_slot(type_ref, algebraic_type)
}

pub fn register_table(table: TableDef) -> Result<(), ModuleError> {
	MODULE.write().register_table(table)
}

pub fn register_reducer(reducer: Box<dyn Reducer>) -> Result<(), ModuleError> {
	MODULE.write().register_reducer(reducer)
}

pub fn register_type_alias(name: impl Into<String>, ty: TypeRef) -> Result<(), ModuleError> {
	MODULE.write().register_type_alias(name, ty)
}

/// Serializes the process-wide schema document.
///
/// The live document is swapped out for a fresh scratch one for the
/// duration, so registrations racing with the description protocol land in
/// the scratch document and are discarded instead of leaking into the
/// catalog being serialized.
pub fn describe_module() -> Result<Vec<u8>, ModuleError> {
	let snapshot = {
		let mut module = MODULE.write();
		mem::take(&mut module.def)
	};
	let result = {
		let scratch = ModuleRegistry {
			def: snapshot,
			reducers: Vec::new(),
		};
		let described = scratch.describe();
		MODULE.write().def = scratch.def;
		described
	};
	result
}

pub fn call_reducer(id: usize, ctx: &ReducerContext, args: &[u8]) -> Result<(), ModuleError> {
	MODULE.read().call_reducer(id, ctx, args)
}

#[cfg(test)]
mod tests {
	use std::sync::{Arc, Mutex};

	use lattice_type::{DecodeError, Writer};

	use super::*;
	use crate::{
		def::{ColumnAttr, IndexDef, IndexKind, ReducerDef},
		identity::Identity,
	};

	fn user_row() -> AlgebraicType {
		AlgebraicType::product([("id", AlgebraicType::u64()), ("name", AlgebraicType::string())])
	}

	fn ctx() -> ReducerContext {
		ReducerContext {
			sender: Identity::new(vec![1, 2, 3]),
			timestamp_micros: 1_700_000_000_000_000,
		}
	}

	struct CreateUser {
		seen: Arc<Mutex<Vec<(u64, String)>>>,
	}

	impl Reducer for CreateUser {
		fn def(&self) -> ReducerDef {
			ReducerDef::new(
				"create_user",
				[("id", AlgebraicType::u64()), ("name", AlgebraicType::string())],
			)
		}

		fn invoke(&self, _ctx: &ReducerContext, args: &mut Reader<'_>) -> Result<(), ModuleError> {
			let id = args.read_u64()?;
			let name = args.read_str()?;
			self.seen.lock().unwrap().push((id, name));
			Ok(())
		}
	}

	#[test]
	fn table_with_integer_identity_column_is_accepted() {
		let mut registry = ModuleRegistry::new();
		let row = registry.register_type(user_row()).unwrap();
		registry.register_table(TableDef {
			name: "users".into(),
			data: row,
			column_attrs: vec![ColumnAttr::Identity, ColumnAttr::Unset],
			indexes: vec![],
		})
		.unwrap();
		assert_eq!(registry.def().tables.len(), 1);
	}

	#[test]
	fn auto_inc_on_string_column_is_rejected() {
		let mut registry = ModuleRegistry::new();
		let row = registry.register_type(user_row()).unwrap();
		let err = registry
			.register_table(TableDef {
				name: "users".into(),
				data: row,
				column_attrs: vec![ColumnAttr::Unset, ColumnAttr::AutoInc],
				indexes: vec![],
			})
			.unwrap_err();
		assert_eq!(
			err,
			ModuleError::NonIntegerColumn {
				table: "users".into(),
				column: "name".into(),
				attr: ColumnAttr::AutoInc,
			}
		);
		assert!(registry.def().tables.is_empty());
	}

	#[test]
	fn column_attr_count_must_match_row_width() {
		let mut registry = ModuleRegistry::new();
		let row = registry.register_type(user_row()).unwrap();
		let err = registry
			.register_table(TableDef {
				name: "users".into(),
				data: row,
				column_attrs: vec![ColumnAttr::Unset],
				indexes: vec![],
			})
			.unwrap_err();
		assert_eq!(
			err,
			ModuleError::ColumnCountMismatch {
				table: "users".into(),
				columns: 2,
				attrs: 1,
			}
		);
	}

	#[test]
	fn index_over_missing_column_is_rejected() {
		let mut registry = ModuleRegistry::new();
		let row = registry.register_type(user_row()).unwrap();
		let err = registry
			.register_table(TableDef {
				name: "users".into(),
				data: row,
				column_attrs: vec![ColumnAttr::Unset, ColumnAttr::Unset],
				indexes: vec![IndexDef {
					name: "broken".into(),
					kind: IndexKind::BTree,
					column_ids: vec![2],
				}],
			})
			.unwrap_err();
		assert_eq!(
			err,
			ModuleError::IndexColumnOutOfRange {
				table: "users".into(),
				index: "broken".into(),
				column_id: 2,
				columns: 2,
			}
		);
	}

	#[test]
	fn non_product_row_type_is_rejected() {
		let mut registry = ModuleRegistry::new();
		let row = registry.register_type(AlgebraicType::u32()).unwrap();
		let err = registry
			.register_table(TableDef {
				name: "scalars".into(),
				data: row,
				column_attrs: vec![],
				indexes: vec![],
			})
			.unwrap_err();
		assert_eq!(
			err,
			ModuleError::RowTypeNotProduct {
				type_ref: row
			}
		);
	}

	#[test]
	fn oversized_sum_is_rejected_anywhere_in_the_tree() {
		let oversized = AlgebraicType::sum((0..257).map(|i| (format!("v{i}"), AlgebraicType::unit())));
		let mut registry = ModuleRegistry::new();
		assert_eq!(
			registry.register_type(AlgebraicType::array(oversized)).unwrap_err(),
			ModuleError::TooManyVariants {
				variants: 257
			}
		);

		let exactly_256 = AlgebraicType::sum((0..256).map(|i| (format!("v{i}"), AlgebraicType::unit())));
		assert!(registry.register_type(exactly_256).is_ok());
	}

	#[test]
	fn describe_requires_every_slot_filled() {
		let mut registry = ModuleRegistry::new();
		let slot = registry.alloc_type_slot();
		assert_eq!(
			registry.describe().unwrap_err(),
			ModuleError::UnfilledTypeSlot {
				type_ref: slot
			}
		);

		registry.fill_type_slot(
			slot,
			AlgebraicType::product([
				("value", AlgebraicType::u32()),
				("next", AlgebraicType::option(AlgebraicType::Ref(slot))),
			]),
		)
		.unwrap();
		let first = registry.describe().unwrap();
		let second = registry.describe().unwrap();
		assert_eq!(first, second);
	}

	#[test]
	fn alias_must_point_at_an_allocated_slot() {
		let mut registry = ModuleRegistry::new();
		assert_eq!(
			registry.register_type_alias("Missing", TypeRef(0)).unwrap_err(),
			ModuleError::UnknownTypeRef {
				type_ref: TypeRef(0)
			}
		);
		let row = registry.register_type(user_row()).unwrap();
		registry.register_type_alias("UserRow", row).unwrap();
		assert_eq!(registry.def().exports.len(), 1);
	}

	#[test]
	fn call_reducer_decodes_args_in_declared_order() {
		let mut registry = ModuleRegistry::new();
		let seen = Arc::new(Mutex::new(Vec::new()));
		registry.register_reducer(Box::new(CreateUser {
			seen: Arc::clone(&seen),
		}))
		.unwrap();

		let mut args = Writer::new();
		args.write_u64(42);
		args.write_str("alice");
		registry.call_reducer(0, &ctx(), &args.into_bytes()).unwrap();
		assert_eq!(*seen.lock().unwrap(), vec![(42, "alice".to_string())]);
	}

	#[test]
	fn call_with_trailing_bytes_fails_but_registry_survives() {
		let mut registry = ModuleRegistry::new();
		let seen = Arc::new(Mutex::new(Vec::new()));
		registry.register_reducer(Box::new(CreateUser {
			seen: Arc::clone(&seen),
		}))
		.unwrap();

		let mut args = Writer::new();
		args.write_u64(1);
		args.write_str("bob");
		args.write_u8(0xAA);
		let err = registry.call_reducer(0, &ctx(), &args.into_bytes()).unwrap_err();
		assert_eq!(
			err,
			ModuleError::Decode(DecodeError::TrailingBytes {
				trailing: 1
			})
		);

		// the failed call does not poison dispatch
		let mut args = Writer::new();
		args.write_u64(2);
		args.write_str("carol");
		registry.call_reducer(0, &ctx(), &args.into_bytes()).unwrap();
		assert_eq!(seen.lock().unwrap().len(), 2);
	}

	#[test]
	fn unknown_reducer_id_is_a_call_error() {
		let registry = ModuleRegistry::new();
		assert_eq!(
			registry.call_reducer(7, &ctx(), &[]).unwrap_err(),
			ModuleError::UnknownReducer {
				id: 7
			}
		);
	}

	// The only test that touches the process-wide registry; everything else
	// uses local instances so tests stay independent.
	#[test]
	fn process_wide_registry_round_trip() {
		let row = register_type(user_row()).unwrap();
		register_table(TableDef {
			name: "users".into(),
			data: row,
			column_attrs: vec![ColumnAttr::Identity, ColumnAttr::Unset],
			indexes: vec![],
		})
		.unwrap();
		let seen = Arc::new(Mutex::new(Vec::new()));
		register_reducer(Box::new(CreateUser {
			seen: Arc::clone(&seen),
		}))
		.unwrap();

		let described = describe_module().unwrap();
		assert!(!described.is_empty());
		assert_eq!(describe_module().unwrap(), described);

		let mut args = Writer::new();
		args.write_u64(9);
		args.write_str("dora");
		call_reducer(0, &ctx(), &args.into_bytes()).unwrap();
		assert_eq!(*seen.lock().unwrap(), vec![(9, "dora".to_string())]);
	}
}
