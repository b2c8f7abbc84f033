// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

/// Errors raised while decoding a binary buffer into a typed value.
///
/// A decode error is fatal for the single call being processed but never
/// corrupts any registry; the caller may keep issuing calls afterwards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
	#[error("unexpected end of input: needed {needed} more bytes, {remaining} available")]
	UnexpectedEof {
		needed: usize,
		remaining: usize,
	},

	#[error("{trailing} extra bytes in the input after the decoded value")]
	TrailingBytes {
		trailing: usize,
	},

	#[error("unknown discriminant {tag} for sum type with {variants} variants")]
	UnknownTag {
		tag: u8,
		variants: usize,
	},

	#[error("negative element count {count}")]
	NegativeCount {
		count: i32,
	},

	#[error("invalid boolean byte {byte:#04x}")]
	InvalidBool {
		byte: u8,
	},

	#[error("string payload is not valid utf-8")]
	InvalidUtf8,

	#[error("type-erased value cannot be decoded")]
	TypeErased,
}
