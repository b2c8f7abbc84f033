// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! Pairs an [`AlgebraicType`] descriptor with matching encode/decode logic.
//!
//! A [`Codec`] is the unit of (de)serialization: the byte layout its writer
//! produces always structurally matches what its descriptor declares, and
//! `decode(encode(v)) == v` for every reachable `v`.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use crate::{
	algebraic::{AlgebraicType, BuiltinType, ProductTypeElement, SumType, SumTypeVariant, TypeRef},
	buf::{Reader, Writer},
	error::DecodeError,
	registry::register_codec,
};

type ReadFn<T> = Box<dyn Fn(&mut Reader<'_>) -> Result<T, DecodeError> + Send + Sync>;
type WriteFn<T> = Box<dyn Fn(&mut Writer, &T) + Send + Sync>;

/// One concrete value type's descriptor and its paired encode/decode pair.
pub struct Codec<T> {
	algebraic_type: AlgebraicType,
	read: ReadFn<T>,
	write: WriteFn<T>,
}

impl<T> Codec<T> {
	pub fn new(
		algebraic_type: AlgebraicType,
		read: impl Fn(&mut Reader<'_>) -> Result<T, DecodeError> + Send + Sync + 'static,
		write: impl Fn(&mut Writer, &T) + Send + Sync + 'static,
	) -> Self {
		Self {
			algebraic_type,
			read: Box::new(read),
			write: Box::new(write),
		}
	}

	pub fn algebraic_type(&self) -> &AlgebraicType {
		&self.algebraic_type
	}

	pub fn read(&self, reader: &mut Reader<'_>) -> Result<T, DecodeError> {
		(self.read)(reader)
	}

	pub fn write(&self, writer: &mut Writer, value: &T) {
		(self.write)(writer, value)
	}

	/// Decodes one value from the whole buffer; leftover bytes fail the
	/// call.
	pub fn decode(&self, bytes: &[u8]) -> Result<T, DecodeError> {
		let mut reader = Reader::new(bytes);
		let value = self.read(&mut reader)?;
		reader.expect_end()?;
		Ok(value)
	}

	pub fn encode(&self, value: &T) -> Vec<u8> {
		let mut writer = Writer::new();
		self.write(&mut writer, value);
		writer.into_bytes()
	}
}

impl<T> std::fmt::Debug for Codec<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Codec").field("algebraic_type", &self.algebraic_type).finish_non_exhaustive()
	}
}

macro_rules! primitive_codec {
	($($name:ident: $ty:ty => $read:ident, $write:ident);* $(;)?) => {
		$(
			impl Codec<$ty> {
				pub fn $name() -> Codec<$ty> {
					Codec::new(
						AlgebraicType::$name(),
						|reader| reader.$read(),
						|writer, value| writer.$write(*value),
					)
				}
			}
		)*
	};
}

primitive_codec! {
	bool: bool => read_bool, write_bool;
	i8: i8 => read_i8, write_i8;
	u8: u8 => read_u8, write_u8;
	i16: i16 => read_i16, write_i16;
	u16: u16 => read_u16, write_u16;
	i32: i32 => read_i32, write_i32;
	u32: u32 => read_u32, write_u32;
	i64: i64 => read_i64, write_i64;
	u64: u64 => read_u64, write_u64;
	i128: i128 => read_i128, write_i128;
	u128: u128 => read_u128, write_u128;
	f32: f32 => read_f32, write_f32;
	f64: f64 => read_f64, write_f64;
}

impl Codec<String> {
	pub fn string() -> Codec<String> {
		Codec::new(
			AlgebraicType::string(),
			|reader| reader.read_str(),
			|writer, value| writer.write_str(value),
		)
	}
}

/// `Vec<u8>` as `Array(U8)`, byte-for-byte identical to the elementwise
/// encoding but without the per-element dispatch.
pub fn bytes() -> Codec<Vec<u8>> {
	Codec::new(
		AlgebraicType::bytes(),
		|reader| {
			let count = reader.read_count()?;
			Ok(reader.take(count)?.to_vec())
		},
		|writer, value| {
			writer.write_count(value.len());
			writer.write_raw(value);
		},
	)
}

/// Composes an element codec into a length-prefixed sequence codec.
pub fn array_of<T: 'static>(element: Arc<Codec<T>>) -> Codec<Vec<T>> {
	let algebraic_type = AlgebraicType::array(element.algebraic_type().clone());
	let read_element = Arc::clone(&element);
	Codec::new(
		algebraic_type,
		move |reader| {
			let count = reader.read_count()?;
			let mut items = Vec::new();
			for _ in 0..count {
				items.push(read_element.read(reader)?);
			}
			Ok(items)
		},
		move |writer, items: &Vec<T>| {
			writer.write_count(items.len());
			for item in items {
				element.write(writer, item);
			}
		},
	)
}

/// Composes key and value codecs into a pair-sequence codec. Decoding
/// reconstructs an unordered mapping; re-encoding it is equivalent but not
/// guaranteed byte-identical.
pub fn map_of<K, V>(key: Arc<Codec<K>>, value: Arc<Codec<V>>) -> Codec<HashMap<K, V>>
where
	K: Eq + Hash + 'static,
	V: 'static,
{
	let algebraic_type = AlgebraicType::map(key.algebraic_type().clone(), value.algebraic_type().clone());
	let read_key = Arc::clone(&key);
	let read_value = Arc::clone(&value);
	Codec::new(
		algebraic_type,
		move |reader| {
			let count = reader.read_count()?;
			let mut map = HashMap::new();
			for _ in 0..count {
				let k = read_key.read(reader)?;
				let v = read_value.read(reader)?;
				map.insert(k, v);
			}
			Ok(map)
		},
		move |writer, map: &HashMap<K, V>| {
			writer.write_count(map.len());
			for (k, v) in map {
				key.write(writer, k);
				value.write(writer, v);
			}
		},
	)
}

/// `Option<T>` as a two-variant sum: tag 0 carries the payload, tag 1 is
/// the unit "absent" variant.
pub fn optional<T: 'static>(inner: Arc<Codec<T>>) -> Codec<Option<T>> {
	let algebraic_type = AlgebraicType::option(inner.algebraic_type().clone());
	let read_inner = Arc::clone(&inner);
	Codec::new(
		algebraic_type,
		move |reader| match reader.read_u8()? {
			0 => Ok(Some(read_inner.read(reader)?)),
			1 => Ok(None),
			tag => Err(DecodeError::UnknownTag {
				tag,
				variants: 2,
			}),
		},
		move |writer, value: &Option<T>| match value {
			Some(some) => {
				writer.write_u8(0);
				inner.write(writer, some);
			}
			None => writer.write_u8(1),
		},
	)
}

/// The one capability the generic machinery dispatches over: produce an
/// algebraic-type descriptor and a matching encode/decode pair.
///
/// Implementations go through [`register_codec`], so the codec for any
/// concrete type is built once per process and shared.
pub trait Described: Sized + 'static {
	fn codec() -> Arc<Codec<Self>>;

	fn algebraic_type() -> AlgebraicType {
		Self::codec().algebraic_type().clone()
	}
}

macro_rules! described_primitive {
	($($ty:ty => $ctor:ident),* $(,)?) => {
		$(
			impl Described for $ty {
				fn codec() -> Arc<Codec<Self>> {
					register_codec(Codec::<$ty>::$ctor)
				}
			}
		)*
	};
}

described_primitive! {
	bool => bool,
	i8 => i8,
	u8 => u8,
	i16 => i16,
	u16 => u16,
	i32 => i32,
	u32 => u32,
	i64 => i64,
	u64 => u64,
	i128 => i128,
	u128 => u128,
	f32 => f32,
	f64 => f64,
	String => string,
}

impl<T: Described> Described for Vec<T> {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| array_of(T::codec()))
	}
}

impl<T: Described> Described for Option<T> {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| optional(T::codec()))
	}
}

impl<K: Described + Eq + Hash, V: Described> Described for HashMap<K, V> {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| map_of(K::codec(), V::codec()))
	}
}

impl Described for TypeRef {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			Codec::new(
				AlgebraicType::i32(),
				|reader| Ok(TypeRef(reader.read_i32()?)),
				|writer, type_ref: &TypeRef| writer.write_i32(type_ref.0),
			)
		})
	}
}

/// Named-field descriptors embedded in schema documents; the type position
/// follows the slot-0 self-reference convention of
/// [`AlgebraicType::meta_type`].
impl Described for ProductTypeElement {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			let algebraic_type = AlgebraicType::product([
				("name", AlgebraicType::string()),
				("algebraic_type", AlgebraicType::Ref(TypeRef(0))),
			]);
			Codec::new(
				algebraic_type,
				|reader| {
					Ok(ProductTypeElement {
						name: reader.read_str()?,
						algebraic_type: Box::new(read_algebraic_type(reader)?),
					})
				},
				|writer, element: &ProductTypeElement| {
					writer.write_str(&element.name);
					write_algebraic_type(writer, &element.algebraic_type);
				},
			)
		})
	}
}

/// Self-hosting: the descriptor language can describe and serialize itself.
/// Descriptor values are finite trees (recursion lives behind [`TypeRef`]),
/// so plain recursive descent terminates.
impl Described for AlgebraicType {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			Codec::new(AlgebraicType::meta_type(), read_algebraic_type, |writer, ty| {
				write_algebraic_type(writer, ty)
			})
		})
	}
}

pub(crate) fn write_algebraic_type(writer: &mut Writer, ty: &AlgebraicType) {
	match ty {
		AlgebraicType::Sum(sum) => {
			writer.write_u8(0);
			writer.write_count(sum.variants.len());
			for variant in &sum.variants {
				writer.write_str(&variant.name);
				write_algebraic_type(writer, &variant.algebraic_type);
			}
		}
		AlgebraicType::Product(product) => {
			writer.write_u8(1);
			writer.write_count(product.elements.len());
			for element in &product.elements {
				writer.write_str(&element.name);
				write_algebraic_type(writer, &element.algebraic_type);
			}
		}
		AlgebraicType::Builtin(builtin) => {
			writer.write_u8(2);
			write_builtin_type(writer, builtin);
		}
		AlgebraicType::Ref(type_ref) => {
			writer.write_u8(3);
			writer.write_i32(type_ref.0);
		}
	}
}

fn write_builtin_type(writer: &mut Writer, builtin: &BuiltinType) {
	let tag = match builtin {
		BuiltinType::Bool => 0,
		BuiltinType::I8 => 1,
		BuiltinType::U8 => 2,
		BuiltinType::I16 => 3,
		BuiltinType::U16 => 4,
		BuiltinType::I32 => 5,
		BuiltinType::U32 => 6,
		BuiltinType::I64 => 7,
		BuiltinType::U64 => 8,
		BuiltinType::I128 => 9,
		BuiltinType::U128 => 10,
		BuiltinType::F32 => 11,
		BuiltinType::F64 => 12,
		BuiltinType::String => 13,
		BuiltinType::Array(_) => 14,
		BuiltinType::Map {
			..
		} => 15,
	};
	writer.write_u8(tag);
	match builtin {
		BuiltinType::Array(element) => write_algebraic_type(writer, element),
		BuiltinType::Map {
			key,
			value,
		} => {
			write_algebraic_type(writer, key);
			write_algebraic_type(writer, value);
		}
		_ => {}
	}
}

pub(crate) fn read_algebraic_type(reader: &mut Reader<'_>) -> Result<AlgebraicType, DecodeError> {
	match reader.read_u8()? {
		0 => {
			let count = reader.read_count()?;
			let mut variants = Vec::new();
			for _ in 0..count {
				variants.push(SumTypeVariant {
					name: reader.read_str()?,
					algebraic_type: Box::new(read_algebraic_type(reader)?),
				});
			}
			Ok(AlgebraicType::Sum(SumType {
				variants,
			}))
		}
		1 => {
			let count = reader.read_count()?;
			let mut elements = Vec::new();
			for _ in 0..count {
				elements.push(ProductTypeElement {
					name: reader.read_str()?,
					algebraic_type: Box::new(read_algebraic_type(reader)?),
				});
			}
			Ok(AlgebraicType::Product(crate::algebraic::ProductType {
				elements,
			}))
		}
		2 => Ok(AlgebraicType::Builtin(read_builtin_type(reader)?)),
		3 => Ok(AlgebraicType::Ref(TypeRef(reader.read_i32()?))),
		tag => Err(DecodeError::UnknownTag {
			tag,
			variants: 4,
		}),
	}
}

fn read_builtin_type(reader: &mut Reader<'_>) -> Result<BuiltinType, DecodeError> {
	Ok(match reader.read_u8()? {
		0 => BuiltinType::Bool,
		1 => BuiltinType::I8,
		2 => BuiltinType::U8,
		3 => BuiltinType::I16,
		4 => BuiltinType::U16,
		5 => BuiltinType::I32,
		6 => BuiltinType::U32,
		7 => BuiltinType::I64,
		8 => BuiltinType::U64,
		9 => BuiltinType::I128,
		10 => BuiltinType::U128,
		11 => BuiltinType::F32,
		12 => BuiltinType::F64,
		13 => BuiltinType::String,
		14 => BuiltinType::Array(Box::new(read_algebraic_type(reader)?)),
		15 => BuiltinType::Map {
			key: Box::new(read_algebraic_type(reader)?),
			value: Box::new(read_algebraic_type(reader)?),
		},
		tag => {
			return Err(DecodeError::UnknownTag {
				tag,
				variants: 16,
			});
		}
	})
}
