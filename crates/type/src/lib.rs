// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! Self-describing algebraic type system and binary codecs for Lattice
//! modules.
//!
//! This crate provides:
//! - [`AlgebraicType`]: a structural type language of sums, products and
//!   builtins, closed under composition, with [`TypeRef`] indirection for
//!   recursion
//! - [`Typespace`]: a slot table giving types stable indices, with two-phase
//!   alloc/fill registration for self-referential definitions
//! - [`Codec`]: a descriptor paired with matching encode/decode logic over
//!   the little-endian, positional wire format
//! - [`Described`]: the trait mapping a concrete Rust type to its shared,
//!   process-wide codec
//!
//! The type language can describe itself: [`AlgebraicType::meta_type`] is
//! the descriptor of `AlgebraicType`, which is what lets schema documents be
//! serialized with the same machinery they describe.

#![cfg_attr(not(debug_assertions), deny(warnings))]

mod algebraic;
mod buf;
mod codec;
mod error;
mod registry;
mod typespace;

pub use algebraic::{
	AlgebraicType, BuiltinType, ProductType, ProductTypeElement, SumType, SumTypeVariant, TypeRef,
};
pub use buf::{Reader, Writer};
pub use codec::{Codec, Described, array_of, bytes, map_of, optional};
pub use error::DecodeError;
pub use registry::{register_codec, registered_codec, recursive_codec};
pub use typespace::Typespace;
