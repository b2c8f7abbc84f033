// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! End-to-end: declare a table through the module layer, then compile a
//! predicate against the row type served by its typespace.

use lattice_filter::{CmpOp, PredicateExpr, compile};
use lattice_module::{ColumnAttr, ModuleRegistry, TableDef};
use lattice_type::AlgebraicType;

#[test]
fn filter_compiles_against_a_registered_table() {
	let mut registry = ModuleRegistry::new();
	let row_ref = registry
		.register_type(AlgebraicType::product([
			("id", AlgebraicType::u64()),
			("name", AlgebraicType::string()),
			("active", AlgebraicType::bool()),
		]))
		.unwrap();
	registry.register_table(TableDef {
		name: "users".into(),
		data: row_ref,
		column_attrs: vec![ColumnAttr::Identity, ColumnAttr::Unset, ColumnAttr::Unset],
		indexes: vec![],
	})
	.unwrap();

	let def = registry.def();
	let table = &def.tables[0];
	let row = def.typespace.resolve(table.data).unwrap().as_product().unwrap();

	let predicate = PredicateExpr::and(
		PredicateExpr::compare(CmpOp::GtEq, PredicateExpr::column("id"), PredicateExpr::int(100)),
		PredicateExpr::eq(PredicateExpr::column("active"), PredicateExpr::bool(true)),
	);
	let bytes = compile(row, &def.typespace, &predicate).unwrap();

	assert_eq!(
		bytes,
		vec![
			1, // logic
			0, 5, 0, 0, 100, 0, 0, 0, 0, 0, 0, 0, // id >= 100 (u64)
			0, // and
			0, 0, 2, 0, 1, // active == true
		]
	);
}

#[test]
fn schema_and_filter_round_through_the_same_wire_rules() {
	use lattice_module::ModuleDef;
	use lattice_type::Described;

	let mut registry = ModuleRegistry::new();
	let row_ref = registry
		.register_type(AlgebraicType::product([("id", AlgebraicType::u32())]))
		.unwrap();
	registry.register_table(TableDef {
		name: "items".into(),
		data: row_ref,
		column_attrs: vec![ColumnAttr::PrimaryKey],
		indexes: vec![],
	})
	.unwrap();

	let described = registry.describe().unwrap();
	let decoded = ModuleDef::codec().decode(&described).unwrap();
	assert_eq!(&decoded, registry.def());

	let row = decoded.typespace.resolve(row_ref).unwrap().as_product().unwrap().clone();
	let bytes = compile(
		&row,
		&decoded.typespace,
		&PredicateExpr::eq(PredicateExpr::column("id"), PredicateExpr::int(1)),
	)
	.unwrap();
	assert_eq!(bytes, vec![0, 0, 0, 0, 1, 0, 0, 0]);
}
