// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! The compiled filter AST and its wire codec.
//!
//! This is the shape a host consumes: comparisons against erased,
//! pre-encoded constants, combined with boolean connectives. Constants are
//! write-only — their bytes were produced against the row type during
//! compilation and carry no descriptor, so decoding one back out is a
//! [`DecodeError::TypeErased`].

use std::sync::Arc;

use lattice_type::{
	AlgebraicType, Codec, DecodeError, Described, Reader, TypeRef, Writer, recursive_codec, register_codec,
};

/// Comparison operator; the tag order is the wire order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
	Eq,
	NotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
}

impl CmpOp {
	pub fn to_u8(self) -> u8 {
		match self {
			CmpOp::Eq => 0,
			CmpOp::NotEq => 1,
			CmpOp::Lt => 2,
			CmpOp::LtEq => 3,
			CmpOp::Gt => 4,
			CmpOp::GtEq => 5,
		}
	}

	pub fn from_u8(value: u8) -> Option<Self> {
		match value {
			0 => Some(CmpOp::Eq),
			1 => Some(CmpOp::NotEq),
			2 => Some(CmpOp::Lt),
			3 => Some(CmpOp::LtEq),
			4 => Some(CmpOp::Gt),
			5 => Some(CmpOp::GtEq),
			_ => None,
		}
	}

	/// The operator that yields the same truth value with the operands
	/// swapped.
	pub fn mirror(self) -> Self {
		match self {
			CmpOp::Eq => CmpOp::Eq,
			CmpOp::NotEq => CmpOp::NotEq,
			CmpOp::Lt => CmpOp::Gt,
			CmpOp::LtEq => CmpOp::GtEq,
			CmpOp::Gt => CmpOp::Lt,
			CmpOp::GtEq => CmpOp::LtEq,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogicOp {
	And,
	Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
	Not,
}

/// Right-hand side of a comparison: an erased constant or another field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rhs {
	/// Constant bytes, already encoded with the compared column's type.
	Value(Vec<u8>),
	Field(u8),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CmpArgs {
	pub lhs_field: u8,
	pub rhs: Rhs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmp {
	pub op: CmpOp,
	pub args: CmpArgs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Logic {
	pub lhs: Box<Expr>,
	pub op: LogicOp,
	pub rhs: Box<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unary {
	pub op: UnaryOp,
	pub arg: Box<Expr>,
}

/// A compiled predicate over one table's rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
	Cmp(Cmp),
	Logic(Logic),
	Unary(Unary),
}

fn cmp_op_type() -> AlgebraicType {
	AlgebraicType::sum([
		("eq", AlgebraicType::unit()),
		("not_eq", AlgebraicType::unit()),
		("lt", AlgebraicType::unit()),
		("lt_eq", AlgebraicType::unit()),
		("gt", AlgebraicType::unit()),
		("gt_eq", AlgebraicType::unit()),
	])
}

/// Descriptor of [`Expr`]; self-referential positions point at slot 0, the
/// same convention as [`AlgebraicType::meta_type`]. The erased-constant
/// variant is described as the zero-variant sum: no decodable value of it
/// exists.
pub fn expr_type() -> AlgebraicType {
	let expr_ref = || AlgebraicType::Ref(TypeRef(0));
	let rhs = AlgebraicType::sum([("value", AlgebraicType::never()), ("field", AlgebraicType::u8())]);
	let cmp = AlgebraicType::product([
		("op", cmp_op_type()),
		("args", AlgebraicType::product([("lhs_field", AlgebraicType::u8()), ("rhs", rhs)])),
	]);
	let logic = AlgebraicType::product([
		("lhs", expr_ref()),
		(
			"op",
			AlgebraicType::sum([("and", AlgebraicType::unit()), ("or", AlgebraicType::unit())]),
		),
		("rhs", expr_ref()),
	]);
	let unary = AlgebraicType::product([
		("op", AlgebraicType::sum([("not", AlgebraicType::unit())])),
		("arg", expr_ref()),
	]);
	AlgebraicType::sum([("cmp", cmp), ("logic", logic), ("unary", unary)])
}

fn write_expr(writer: &mut Writer, expr: &Expr, child: &Codec<Expr>) {
	match expr {
		Expr::Cmp(cmp) => {
			writer.write_u8(0);
			writer.write_u8(cmp.op.to_u8());
			writer.write_u8(cmp.args.lhs_field);
			match &cmp.args.rhs {
				Rhs::Value(bytes) => {
					writer.write_u8(0);
					writer.write_raw(bytes);
				}
				Rhs::Field(field) => {
					writer.write_u8(1);
					writer.write_u8(*field);
				}
			}
		}
		Expr::Logic(logic) => {
			writer.write_u8(1);
			child.write(writer, &logic.lhs);
			writer.write_u8(match logic.op {
				LogicOp::And => 0,
				LogicOp::Or => 1,
			});
			child.write(writer, &logic.rhs);
		}
		Expr::Unary(unary) => {
			writer.write_u8(2);
			writer.write_u8(match unary.op {
				UnaryOp::Not => 0,
			});
			child.write(writer, &unary.arg);
		}
	}
}

fn read_expr(reader: &mut Reader<'_>, child: &Codec<Expr>) -> Result<Expr, DecodeError> {
	match reader.read_u8()? {
		0 => {
			let op_tag = reader.read_u8()?;
			let op = CmpOp::from_u8(op_tag).ok_or(DecodeError::UnknownTag {
				tag: op_tag,
				variants: 6,
			})?;
			let lhs_field = reader.read_u8()?;
			let rhs = match reader.read_u8()? {
				// constant bytes carry no descriptor to decode with
				0 => return Err(DecodeError::TypeErased),
				1 => Rhs::Field(reader.read_u8()?),
				tag => {
					return Err(DecodeError::UnknownTag {
						tag,
						variants: 2,
					});
				}
			};
			Ok(Expr::Cmp(Cmp {
				op,
				args: CmpArgs {
					lhs_field,
					rhs,
				},
			}))
		}
		1 => {
			let lhs = Box::new(child.read(reader)?);
			let op = match reader.read_u8()? {
				0 => LogicOp::And,
				1 => LogicOp::Or,
				tag => {
					return Err(DecodeError::UnknownTag {
						tag,
						variants: 2,
					});
				}
			};
			let rhs = Box::new(child.read(reader)?);
			Ok(Expr::Logic(Logic {
				lhs,
				op,
				rhs,
			}))
		}
		2 => {
			let op = match reader.read_u8()? {
				0 => UnaryOp::Not,
				tag => {
					return Err(DecodeError::UnknownTag {
						tag,
						variants: 1,
					});
				}
			};
			Ok(Expr::Unary(Unary {
				op,
				arg: Box::new(child.read(reader)?),
			}))
		}
		tag => Err(DecodeError::UnknownTag {
			tag,
			variants: 3,
		}),
	}
}

impl Described for Expr {
	fn codec() -> Arc<Codec<Self>> {
		register_codec(|| {
			// children go through the lazy self-reference; it resolves to
			// this codec once registration completes
			let child = Arc::new(recursive_codec::<Expr>(AlgebraicType::Ref(TypeRef(0))));
			let read_child = Arc::clone(&child);
			Codec::new(
				expr_type(),
				move |reader| read_expr(reader, &read_child),
				move |writer, expr| write_expr(writer, expr, &child),
			)
		})
	}
}
