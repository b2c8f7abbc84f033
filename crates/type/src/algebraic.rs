// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// An index into a [`crate::Typespace`] slot table.
///
/// This is the only way a type may refer to itself or to a type that is not
/// fully constructed yet. Identity is purely structural: two different
/// indices are never interchangeable, even when the slots they point at
/// happen to describe the same shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef(pub i32);

impl TypeRef {
	pub fn idx(self) -> usize {
		self.0 as usize
	}
}

impl Display for TypeRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "&{}", self.0)
	}
}

/// One named alternative of a [`SumType`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SumTypeVariant {
	pub name: String,
	pub algebraic_type: Box<AlgebraicType>,
}

/// A discriminated union. The discriminant is the variant's position,
/// stored as a single byte on the wire, so a serializable sum carries at
/// most 256 variants (enforced by the declaration layer, not here).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SumType {
	pub variants: Vec<SumTypeVariant>,
}

/// One named field of a [`ProductType`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductTypeElement {
	pub name: String,
	pub algebraic_type: Box<AlgebraicType>,
}

impl ProductTypeElement {
	pub fn new(name: impl Into<String>, algebraic_type: AlgebraicType) -> Self {
		Self {
			name: name.into(),
			algebraic_type: Box::new(algebraic_type),
		}
	}
}

/// A fixed-field record; field order is the wire order.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductType {
	pub elements: Vec<ProductTypeElement>,
}

impl ProductType {
	/// Position of the element called `name`, if any.
	pub fn index_of(&self, name: &str) -> Option<usize> {
		self.elements.iter().position(|element| element.name == name)
	}
}

/// The closed set of primitive types plus the two parametric constructors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinType {
	/// A boolean: true or false.
	Bool,
	/// A 1-byte signed integer
	I8,
	/// A 1-byte unsigned integer
	U8,
	/// A 2-byte signed integer
	I16,
	/// A 2-byte unsigned integer
	U16,
	/// A 4-byte signed integer
	I32,
	/// A 4-byte unsigned integer
	U32,
	/// An 8-byte signed integer
	I64,
	/// An 8-byte unsigned integer
	U64,
	/// A 16-byte signed integer
	I128,
	/// A 16-byte unsigned integer
	U128,
	/// A 4-byte floating point
	F32,
	/// An 8-byte floating point
	F64,
	/// A length-prefixed UTF-8 text
	String,
	/// A length-prefixed sequence of one element type
	Array(Box<AlgebraicType>),
	/// A length-prefixed sequence of (key, value) pairs; iteration order
	/// after decode is undefined
	Map {
		key: Box<AlgebraicType>,
		value: Box<AlgebraicType>,
	},
}

impl BuiltinType {
	pub fn is_signed_integer(&self) -> bool {
		matches!(self, BuiltinType::I8 | BuiltinType::I16 | BuiltinType::I32 | BuiltinType::I64 | BuiltinType::I128)
	}

	pub fn is_unsigned_integer(&self) -> bool {
		matches!(self, BuiltinType::U8 | BuiltinType::U16 | BuiltinType::U32 | BuiltinType::U64 | BuiltinType::U128)
	}

	pub fn is_integer(&self) -> bool {
		self.is_signed_integer() || self.is_unsigned_integer()
	}

	pub fn is_float(&self) -> bool {
		matches!(self, BuiltinType::F32 | BuiltinType::F64)
	}
}

/// A type built from sums, products and builtins, closed under composition,
/// with [`TypeRef`] as the single escape hatch for recursion.
///
/// Construction is pure data and never fails; rules that depend on context
/// (variant count limits, integer-only index columns) are checked by the
/// declaration layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgebraicType {
	/// A structural sum type; wire tag 0.
	Sum(SumType),
	/// A structural product type; wire tag 1.
	Product(ProductType),
	/// A primitive or collection; wire tag 2.
	Builtin(BuiltinType),
	/// An indirection into the typespace; wire tag 3.
	Ref(TypeRef),
}

macro_rules! builtin_ctor {
	($($name:ident => $variant:ident),* $(,)?) => {
		$(
			pub fn $name() -> Self {
				AlgebraicType::Builtin(BuiltinType::$variant)
			}
		)*
	};
}

impl AlgebraicType {
	builtin_ctor! {
		bool => Bool,
		i8 => I8,
		u8 => U8,
		i16 => I16,
		u16 => U16,
		i32 => I32,
		u32 => U32,
		i64 => I64,
		u64 => U64,
		i128 => I128,
		u128 => U128,
		f32 => F32,
		f64 => F64,
		string => String,
	}

	pub fn array(element: AlgebraicType) -> Self {
		AlgebraicType::Builtin(BuiltinType::Array(Box::new(element)))
	}

	pub fn map(key: AlgebraicType, value: AlgebraicType) -> Self {
		AlgebraicType::Builtin(BuiltinType::Map {
			key: Box::new(key),
			value: Box::new(value),
		})
	}

	pub fn bytes() -> Self {
		Self::array(Self::u8())
	}

	pub fn product<N: Into<String>>(elements: impl IntoIterator<Item = (N, AlgebraicType)>) -> Self {
		AlgebraicType::Product(ProductType {
			elements: elements
				.into_iter()
				.map(|(name, ty)| ProductTypeElement::new(name, ty))
				.collect(),
		})
	}

	pub fn sum<N: Into<String>>(variants: impl IntoIterator<Item = (N, AlgebraicType)>) -> Self {
		AlgebraicType::Sum(SumType {
			variants: variants
				.into_iter()
				.map(|(name, ty)| SumTypeVariant {
					name: name.into(),
					algebraic_type: Box::new(ty),
				})
				.collect(),
		})
	}

	/// The product with zero elements; carries no bytes on the wire.
	pub fn unit() -> Self {
		AlgebraicType::Product(ProductType {
			elements: Vec::new(),
		})
	}

	/// The sum with zero variants; no value of this type exists. Used as
	/// the placeholder for allocated-but-unfilled typespace slots.
	pub fn never() -> Self {
		AlgebraicType::Sum(SumType {
			variants: Vec::new(),
		})
	}

	/// `(some: T | none: ())`, the descriptor produced by
	/// [`crate::optional`].
	pub fn option(some: AlgebraicType) -> Self {
		Self::sum([("some", some), ("none", Self::unit())])
	}

	pub fn as_product(&self) -> Option<&ProductType> {
		match self {
			AlgebraicType::Product(product) => Some(product),
			_ => None,
		}
	}

	pub fn as_sum(&self) -> Option<&SumType> {
		match self {
			AlgebraicType::Sum(sum) => Some(sum),
			_ => None,
		}
	}

	pub fn as_builtin(&self) -> Option<&BuiltinType> {
		match self {
			AlgebraicType::Builtin(builtin) => Some(builtin),
			_ => None,
		}
	}

	pub fn as_type_ref(&self) -> Option<TypeRef> {
		match self {
			AlgebraicType::Ref(type_ref) => Some(*type_ref),
			_ => None,
		}
	}

	pub fn is_integer(&self) -> bool {
		self.as_builtin().is_some_and(BuiltinType::is_integer)
	}

	/// The descriptor of `AlgebraicType` itself, used when a schema
	/// document embeds type descriptors (self-hosting). Recursive
	/// positions are expressed as a reference to slot 0 by convention.
	pub fn meta_type() -> Self {
		let self_ref = || AlgebraicType::Ref(TypeRef(0));
		let variant = || {
			AlgebraicType::product([("name", AlgebraicType::string()), ("algebraic_type", self_ref())])
		};
		let sum_meta = AlgebraicType::product([("variants", AlgebraicType::array(variant()))]);
		let product_meta = AlgebraicType::product([("elements", AlgebraicType::array(variant()))]);
		let builtin_meta = AlgebraicType::sum([
			("bool", AlgebraicType::unit()),
			("i8", AlgebraicType::unit()),
			("u8", AlgebraicType::unit()),
			("i16", AlgebraicType::unit()),
			("u16", AlgebraicType::unit()),
			("i32", AlgebraicType::unit()),
			("u32", AlgebraicType::unit()),
			("i64", AlgebraicType::unit()),
			("u64", AlgebraicType::unit()),
			("i128", AlgebraicType::unit()),
			("u128", AlgebraicType::unit()),
			("f32", AlgebraicType::unit()),
			("f64", AlgebraicType::unit()),
			("string", AlgebraicType::unit()),
			("array", self_ref()),
			("map", AlgebraicType::product([("key", self_ref()), ("value", self_ref())])),
		]);
		AlgebraicType::sum([
			("sum", sum_meta),
			("product", product_meta),
			("builtin", builtin_meta),
			("ref", AlgebraicType::i32()),
		])
	}
}
