// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! The module schema document and its self-hosted serialization.
//!
//! A [`ModuleDef`] is what a host learns about a module before calling into
//! it: the typespace, the tables with their column attributes and indexes,
//! the reducers with their argument lists, and named exports. It is encoded
//! with the same codec machinery it describes.

use std::sync::Arc;

use lattice_type::{
	AlgebraicType, Codec, Described, ProductTypeElement, TypeRef, Typespace, register_codec,
};
use serde::{Deserialize, Serialize};

/// Physical shape of a declared index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
	BTree,
	Hash,
}

impl IndexKind {
	pub fn to_u8(self) -> u8 {
		match self {
			IndexKind::BTree => 0,
			IndexKind::Hash => 1,
		}
	}

	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(IndexKind::BTree),
			1 => Some(IndexKind::Hash),
			_ => None,
		}
	}
}

/// Per-column constraint marker, one per row element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnAttr {
	#[default]
	Unset,
	/// Unique and auto-incrementing.
	Identity,
	Unique,
	Indexed,
	AutoInc,
	/// The row's primary key; implies unique.
	PrimaryKey,
}

impl ColumnAttr {
	pub fn to_u8(self) -> u8 {
		match self {
			ColumnAttr::Unset => 0,
			ColumnAttr::Identity => 1,
			ColumnAttr::Unique => 2,
			ColumnAttr::Indexed => 3,
			ColumnAttr::AutoInc => 4,
			ColumnAttr::PrimaryKey => 5,
		}
	}

	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(ColumnAttr::Unset),
			1 => Some(ColumnAttr::Identity),
			2 => Some(ColumnAttr::Unique),
			3 => Some(ColumnAttr::Indexed),
			4 => Some(ColumnAttr::AutoInc),
			5 => Some(ColumnAttr::PrimaryKey),
			_ => None,
		}
	}

	pub fn is_unique(self) -> bool {
		matches!(self, ColumnAttr::Identity | ColumnAttr::Unique | ColumnAttr::PrimaryKey)
	}

	/// Attributes that generate values require an integer column.
	pub fn requires_integer(self) -> bool {
		matches!(self, ColumnAttr::Identity | ColumnAttr::AutoInc | ColumnAttr::PrimaryKey)
	}
}

/// A named index over a subset of a table's columns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
	pub name: String,
	pub kind: IndexKind,
	pub column_ids: Vec<u8>,
}

/// A table declaration: the row type lives in the typespace, addressed by
/// `data`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
	pub name: String,
	pub data: TypeRef,
	pub column_attrs: Vec<ColumnAttr>,
	pub indexes: Vec<IndexDef>,
}

/// A reducer's callable surface: its name and argument list in call order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReducerDef {
	pub name: String,
	pub args: Vec<ProductTypeElement>,
}

impl ReducerDef {
	pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = (&'static str, AlgebraicType)>) -> Self {
		Self {
			name: name.into(),
			args: args.into_iter().map(|(name, ty)| ProductTypeElement::new(name, ty)).collect(),
		}
	}
}

/// A public name for a typespace entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAlias {
	pub name: String,
	pub ty: TypeRef,
}

/// Non-table, non-reducer module surface; open for future export kinds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleExport {
	TypeAlias(TypeAlias),
	Reserved,
}

/// The complete schema document a module presents to its host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModuleDef {
	pub typespace: Typespace,
	pub tables: Vec<TableDef>,
	pub reducers: Vec<ReducerDef>,
	pub exports: Vec<ModuleExport>,
}

fn index_kind_type() -> AlgebraicType {
	AlgebraicType::sum([("btree", AlgebraicType::unit()), ("hash", AlgebraicType::unit())])
}

fn column_attr_type() -> AlgebraicType {
	AlgebraicType::sum([
		("unset", AlgebraicType::unit()),
		("identity", AlgebraicType::unit()),
		("unique", AlgebraicType::unit()),
		("indexed", AlgebraicType::unit()),
		("auto_inc", AlgebraicType::unit()),
		("primary_key", AlgebraicType::unit()),
	])
}

impl Described for IndexKind {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			Codec::new(
				index_kind_type(),
				|reader| {
					let tag = reader.read_u8()?;
					IndexKind::from_u8(tag).ok_or(lattice_type::DecodeError::UnknownTag {
						tag,
						variants: 2,
					})
				},
				|writer, kind: &IndexKind| writer.write_u8(kind.to_u8()),
			)
		})
	}
}

impl Described for ColumnAttr {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			Codec::new(
				column_attr_type(),
				|reader| {
					let tag = reader.read_u8()?;
					ColumnAttr::from_u8(tag).ok_or(lattice_type::DecodeError::UnknownTag {
						tag,
						variants: 6,
					})
				},
				|writer, attr: &ColumnAttr| writer.write_u8(attr.to_u8()),
			)
		})
	}
}

impl Described for IndexDef {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			let kind = IndexKind::codec();
			let column_ids = <Vec<u8>>::codec();
			let algebraic_type = AlgebraicType::product([
				("name", AlgebraicType::string()),
				("kind", kind.algebraic_type().clone()),
				("column_ids", column_ids.algebraic_type().clone()),
			]);
			let write_kind = Arc::clone(&kind);
			let write_column_ids = Arc::clone(&column_ids);
			Codec::new(
				algebraic_type,
				move |reader| {
					Ok(IndexDef {
						name: reader.read_str()?,
						kind: kind.read(reader)?,
						column_ids: column_ids.read(reader)?,
					})
				},
				move |writer, index: &IndexDef| {
					writer.write_str(&index.name);
					write_kind.write(writer, &index.kind);
					write_column_ids.write(writer, &index.column_ids);
				},
			)
		})
	}
}

impl Described for TableDef {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			let data = TypeRef::codec();
			let attrs = <Vec<ColumnAttr>>::codec();
			let indexes = <Vec<IndexDef>>::codec();
			let algebraic_type = AlgebraicType::product([
				("name", AlgebraicType::string()),
				("data", data.algebraic_type().clone()),
				("column_attrs", attrs.algebraic_type().clone()),
				("indexes", indexes.algebraic_type().clone()),
			]);
			let write_data = Arc::clone(&data);
			let write_attrs = Arc::clone(&attrs);
			let write_indexes = Arc::clone(&indexes);
			Codec::new(
				algebraic_type,
				move |reader| {
					Ok(TableDef {
						name: reader.read_str()?,
						data: data.read(reader)?,
						column_attrs: attrs.read(reader)?,
						indexes: indexes.read(reader)?,
					})
				},
				move |writer, table: &TableDef| {
					writer.write_str(&table.name);
					write_data.write(writer, &table.data);
					write_attrs.write(writer, &table.column_attrs);
					write_indexes.write(writer, &table.indexes);
				},
			)
		})
	}
}

impl Described for ReducerDef {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			let args = <Vec<ProductTypeElement>>::codec();
			let algebraic_type = AlgebraicType::product([
				("name", AlgebraicType::string()),
				("args", args.algebraic_type().clone()),
			]);
			let write_args = Arc::clone(&args);
			Codec::new(
				algebraic_type,
				move |reader| {
					Ok(ReducerDef {
						name: reader.read_str()?,
						args: args.read(reader)?,
					})
				},
				move |writer, reducer: &ReducerDef| {
					writer.write_str(&reducer.name);
					write_args.write(writer, &reducer.args);
				},
			)
		})
	}
}

impl Described for TypeAlias {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			let ty = TypeRef::codec();
			let algebraic_type = AlgebraicType::product([
				("name", AlgebraicType::string()),
				("ty", ty.algebraic_type().clone()),
			]);
			let write_ty = Arc::clone(&ty);
			Codec::new(
				algebraic_type,
				move |reader| {
					Ok(TypeAlias {
						name: reader.read_str()?,
						ty: ty.read(reader)?,
					})
				},
				move |writer, alias: &TypeAlias| {
					writer.write_str(&alias.name);
					write_ty.write(writer, &alias.ty);
				},
			)
		})
	}
}

impl Described for ModuleExport {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			let alias = TypeAlias::codec();
			let algebraic_type = AlgebraicType::sum([
				("type_alias", alias.algebraic_type().clone()),
				("reserved", AlgebraicType::unit()),
			]);
			let write_alias = Arc::clone(&alias);
			Codec::new(
				algebraic_type,
				move |reader| match reader.read_u8()? {
					0 => Ok(ModuleExport::TypeAlias(alias.read(reader)?)),
					1 => Ok(ModuleExport::Reserved),
					tag => Err(lattice_type::DecodeError::UnknownTag {
						tag,
						variants: 2,
					}),
				},
				move |writer, export: &ModuleExport| match export {
					ModuleExport::TypeAlias(type_alias) => {
						writer.write_u8(0);
						write_alias.write(writer, type_alias);
					}
					ModuleExport::Reserved => writer.write_u8(1),
				},
			)
		})
	}
}

impl Described for ModuleDef {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			let typespace = Typespace::codec();
			let tables = <Vec<TableDef>>::codec();
			let reducers = <Vec<ReducerDef>>::codec();
			let exports = <Vec<ModuleExport>>::codec();
			let algebraic_type = AlgebraicType::product([
				("typespace", typespace.algebraic_type().clone()),
				("tables", tables.algebraic_type().clone()),
				("reducers", reducers.algebraic_type().clone()),
				("exports", exports.algebraic_type().clone()),
			]);
			let write_typespace = Arc::clone(&typespace);
			let write_tables = Arc::clone(&tables);
			let write_reducers = Arc::clone(&reducers);
			let write_exports = Arc::clone(&exports);
			Codec::new(
				algebraic_type,
				move |reader| {
					Ok(ModuleDef {
						typespace: typespace.read(reader)?,
						tables: tables.read(reader)?,
						reducers: reducers.read(reader)?,
						exports: exports.read(reader)?,
					})
				},
				move |writer, def: &ModuleDef| {
					write_typespace.write(writer, &def.typespace);
					write_tables.write(writer, &def.tables);
					write_reducers.write(writer, &def.reducers);
					write_exports.write(writer, &def.exports);
				},
			)
		})
	}
}
