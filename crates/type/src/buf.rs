// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! Cursor-style reader and append-only writer for the module wire format.
//!
//! Everything is little-endian and fixed-width; strings carry a 4-byte
//! length, sequences a 4-byte signed element count. The format is not
//! self-describing: the caller must know the [`crate::AlgebraicType`] of the
//! buffer to make sense of it.

use crate::error::DecodeError;

/// Appends encoded values to an owned byte buffer.
#[derive(Debug, Default)]
pub struct Writer {
	buf: Vec<u8>,
}

macro_rules! write_le {
	($($name:ident: $ty:ty),* $(,)?) => {
		$(
			pub fn $name(&mut self, value: $ty) {
				self.buf.extend_from_slice(&value.to_le_bytes());
			}
		)*
	};
}

impl Writer {
	pub fn new() -> Self {
		Self {
			buf: Vec::new(),
		}
	}

	write_le! {
		write_u8: u8,
		write_u16: u16,
		write_u32: u32,
		write_u64: u64,
		write_u128: u128,
		write_i8: i8,
		write_i16: i16,
		write_i32: i32,
		write_i64: i64,
		write_i128: i128,
		write_f32: f32,
		write_f64: f64,
	}

	pub fn write_bool(&mut self, value: bool) {
		self.write_u8(value as u8);
	}

	/// 4-byte length followed by the UTF-8 bytes, no terminator.
	pub fn write_str(&mut self, value: &str) {
		self.write_count(value.len());
		self.buf.extend_from_slice(value.as_bytes());
	}

	/// Raw bytes with no length prefix; used for pre-encoded payloads.
	pub fn write_raw(&mut self, bytes: &[u8]) {
		self.buf.extend_from_slice(bytes);
	}

	/// Signed 4-byte element count. Counts beyond `i32::MAX` are a
	/// programmer error, the declaration layer never admits them.
	pub fn write_count(&mut self, count: usize) {
		let count = i32::try_from(count).expect("element count exceeds i32::MAX");
		self.write_i32(count);
	}

	pub fn len(&self) -> usize {
		self.buf.len()
	}

	pub fn is_empty(&self) -> bool {
		self.buf.is_empty()
	}

	pub fn into_bytes(self) -> Vec<u8> {
		self.buf
	}
}

/// Borrowing cursor over an encoded buffer.
#[derive(Debug)]
pub struct Reader<'a> {
	input: &'a [u8],
}

macro_rules! read_le {
	($($name:ident: $ty:ty),* $(,)?) => {
		$(
			pub fn $name(&mut self) -> Result<$ty, DecodeError> {
				let bytes = self.take(std::mem::size_of::<$ty>())?;
				Ok(<$ty>::from_le_bytes(bytes.try_into().expect("take returned wrong length")))
			}
		)*
	};
}

impl<'a> Reader<'a> {
	pub fn new(input: &'a [u8]) -> Self {
		Self {
			input,
		}
	}

	/// Consumes the next `len` bytes, failing on a truncated buffer.
	pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
		if self.input.len() < len {
			return Err(DecodeError::UnexpectedEof {
				needed: len - self.input.len(),
				remaining: self.input.len(),
			});
		}
		let (taken, rest) = self.input.split_at(len);
		self.input = rest;
		Ok(taken)
	}

	read_le! {
		read_u8: u8,
		read_u16: u16,
		read_u32: u32,
		read_u64: u64,
		read_u128: u128,
		read_i8: i8,
		read_i16: i16,
		read_i32: i32,
		read_i64: i64,
		read_i128: i128,
		read_f32: f32,
		read_f64: f64,
	}

	pub fn read_bool(&mut self) -> Result<bool, DecodeError> {
		match self.read_u8()? {
			0 => Ok(false),
			1 => Ok(true),
			byte => Err(DecodeError::InvalidBool {
				byte,
			}),
		}
	}

	pub fn read_str(&mut self) -> Result<String, DecodeError> {
		let len = self.read_count()?;
		let bytes = self.take(len)?;
		String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
	}

	pub fn read_count(&mut self) -> Result<usize, DecodeError> {
		let count = self.read_i32()?;
		usize::try_from(count).map_err(|_| DecodeError::NegativeCount {
			count,
		})
	}

	pub fn remaining(&self) -> usize {
		self.input.len()
	}

	pub fn is_empty(&self) -> bool {
		self.input.is_empty()
	}

	/// Strict-length contract: leftover bytes after the last decoded value
	/// are an error, not a warning.
	pub fn expect_end(&self) -> Result<(), DecodeError> {
		if self.input.is_empty() {
			Ok(())
		} else {
			Err(DecodeError::TrailingBytes {
				trailing: self.input.len(),
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn primitives_are_little_endian() {
		let mut w = Writer::new();
		w.write_u32(0x0403_0201);
		w.write_i16(-2);
		w.write_bool(true);
		assert_eq!(w.into_bytes(), vec![0x01, 0x02, 0x03, 0x04, 0xFE, 0xFF, 0x01]);
	}

	#[test]
	fn string_is_length_prefixed_utf8() {
		let mut w = Writer::new();
		w.write_str("hi");
		assert_eq!(w.into_bytes(), vec![2, 0, 0, 0, b'h', b'i']);

		let mut r = Reader::new(&[2, 0, 0, 0, b'h', b'i']);
		assert_eq!(r.read_str().unwrap(), "hi");
		assert!(r.expect_end().is_ok());
	}

	#[test]
	fn truncated_buffer_reports_eof() {
		let mut r = Reader::new(&[0x01, 0x02]);
		let err = r.read_u32().unwrap_err();
		assert_eq!(
			err,
			DecodeError::UnexpectedEof {
				needed: 2,
				remaining: 2
			}
		);
	}

	#[test]
	fn negative_count_is_rejected() {
		let mut w = Writer::new();
		w.write_i32(-1);
		let bytes = w.into_bytes();
		let mut r = Reader::new(&bytes);
		assert_eq!(
			r.read_count().unwrap_err(),
			DecodeError::NegativeCount {
				count: -1
			}
		);
	}

	#[test]
	fn trailing_bytes_are_an_error() {
		let mut r = Reader::new(&[1, 0]);
		r.read_u8().unwrap();
		assert_eq!(
			r.expect_end().unwrap_err(),
			DecodeError::TrailingBytes {
				trailing: 1
			}
		);
	}

	#[test]
	fn invalid_bool_byte() {
		let mut r = Reader::new(&[7]);
		assert_eq!(
			r.read_bool().unwrap_err(),
			DecodeError::InvalidBool {
				byte: 7
			}
		);
	}
}
