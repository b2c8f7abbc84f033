// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! Slot table giving [`AlgebraicType`]s stable indices.
//!
//! Recursion is handled by splitting registration in two: [`Typespace::alloc`]
//! hands out a [`TypeRef`] backed by a placeholder, so the definition under
//! construction can already mention itself, and [`Typespace::fill`] installs
//! the real definition afterwards.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
	algebraic::{AlgebraicType, TypeRef},
	codec::{Codec, Described},
	registry::register_codec,
};

/// An ordered collection of type slots addressed by [`TypeRef`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Typespace {
	slots: Vec<AlgebraicType>,
}

impl Typespace {
	pub fn new() -> Self {
		Self {
			slots: Vec::new(),
		}
	}

	/// Reserves the next slot and returns its reference. The slot holds the
	/// zero-variant sum as a placeholder until [`fill`](Self::fill) runs.
	pub fn alloc(&mut self) -> TypeRef {
		let type_ref = TypeRef(self.slots.len() as i32);
		self.slots.push(AlgebraicType::never());
		type_ref
	}

	/// Installs the definitive type into a previously allocated slot.
	///
	/// # Panics
	///
	/// Panics when the slot does not exist or was already filled; both are
	/// programmer errors in the declaration sequence.
	pub fn fill(&mut self, type_ref: TypeRef, algebraic_type: AlgebraicType) {
		let slot = self.slots.get_mut(type_ref.idx()).unwrap_or_else(|| {
			panic!("fill of unallocated typespace slot {type_ref}")
		});
		if *slot != AlgebraicType::never() {
			panic!("typespace slot {type_ref} filled twice");
		}
		*slot = algebraic_type;
	}

	/// Alloc and fill in one step, for non-recursive definitions.
	pub fn add(&mut self, algebraic_type: AlgebraicType) -> TypeRef {
		let type_ref = self.alloc();
		self.fill(type_ref, algebraic_type);
		type_ref
	}

	pub fn resolve(&self, type_ref: TypeRef) -> Option<&AlgebraicType> {
		self.slots.get(type_ref.idx())
	}

	/// Whether the slot exists and no longer holds the placeholder.
	pub fn is_filled(&self, type_ref: TypeRef) -> bool {
		self.resolve(type_ref).is_some_and(|ty| *ty != AlgebraicType::never())
	}

	/// References of every slot still holding the placeholder.
	pub fn unfilled(&self) -> Vec<TypeRef> {
		self.slots
			.iter()
			.enumerate()
			.filter(|(_, ty)| **ty == AlgebraicType::never())
			.map(|(idx, _)| TypeRef(idx as i32))
			.collect()
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	pub fn types(&self) -> impl Iterator<Item = &AlgebraicType> {
		self.slots.iter()
	}
}

/// On the wire a typespace is a one-field product holding the slot array;
/// embedded descriptors follow the slot-0 self-reference convention of
/// [`AlgebraicType::meta_type`].
impl Described for Typespace {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			let ty = AlgebraicType::codec();
			let write_ty = Arc::clone(&ty);
			let algebraic_type = AlgebraicType::product([(
				"types",
				AlgebraicType::array(AlgebraicType::Ref(TypeRef(0))),
			)]);
			Codec::new(
				algebraic_type,
				move |reader| {
					let count = reader.read_count()?;
					let mut slots = Vec::new();
					for _ in 0..count {
						slots.push(ty.read(reader)?);
					}
					Ok(Typespace {
						slots,
					})
				},
				move |writer, typespace: &Typespace| {
					writer.write_count(typespace.slots.len());
					for slot in &typespace.slots {
						write_ty.write(writer, slot);
					}
				},
			)
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn add_assigns_sequential_refs() {
		let mut typespace = Typespace::new();
		assert_eq!(typespace.add(AlgebraicType::u32()), TypeRef(0));
		assert_eq!(typespace.add(AlgebraicType::string()), TypeRef(1));
		assert_eq!(typespace.resolve(TypeRef(0)), Some(&AlgebraicType::u32()));
		assert_eq!(typespace.resolve(TypeRef(1)), Some(&AlgebraicType::string()));
		assert_eq!(typespace.resolve(TypeRef(2)), None);
	}

	#[test]
	fn alloc_then_fill_supports_self_reference() {
		let mut typespace = Typespace::new();
		let slot = typespace.alloc();
		assert!(!typespace.is_filled(slot));
		assert_eq!(typespace.unfilled(), vec![slot]);

		let node = AlgebraicType::product([
			("value", AlgebraicType::u64()),
			("next", AlgebraicType::option(AlgebraicType::Ref(slot))),
		]);
		typespace.fill(slot, node.clone());
		assert!(typespace.is_filled(slot));
		assert!(typespace.unfilled().is_empty());
		assert_eq!(typespace.resolve(slot), Some(&node));
	}

	#[test]
	#[should_panic(expected = "filled twice")]
	fn double_fill_panics() {
		let mut typespace = Typespace::new();
		let slot = typespace.alloc();
		typespace.fill(slot, AlgebraicType::bool());
		typespace.fill(slot, AlgebraicType::bool());
	}

	#[test]
	#[should_panic(expected = "unallocated")]
	fn fill_of_unallocated_slot_panics() {
		let mut typespace = Typespace::new();
		typespace.fill(TypeRef(0), AlgebraicType::bool());
	}

	#[test]
	fn typespace_codec_round_trips() {
		let mut typespace = Typespace::new();
		let slot = typespace.alloc();
		typespace.fill(
			slot,
			AlgebraicType::product([
				("value", AlgebraicType::u64()),
				("next", AlgebraicType::option(AlgebraicType::Ref(slot))),
			]),
		);
		typespace.add(AlgebraicType::string());

		let codec = Typespace::codec();
		let bytes = codec.encode(&typespace);
		assert_eq!(codec.decode(&bytes).unwrap(), typespace);
	}

	#[test]
	fn structural_duplicates_get_distinct_refs() {
		let mut typespace = Typespace::new();
		let first = typespace.add(AlgebraicType::u32());
		let second = typespace.add(AlgebraicType::u32());
		assert_ne!(first, second);
	}
}
