// Copyright (c) lattice-db.dev 2025
// This file is licensed under the MIT, see license.md file

//! Lowers a [`PredicateExpr`] against a concrete row type into encoded
//! filter bytes.
//!
//! Constants are typed and encoded at compile time with the column they are
//! compared against; what leaves this module is the erased wire form, so a
//! host can evaluate the filter without knowing the module's types.

use lattice_type::{AlgebraicType, BuiltinType, Described, ProductType, Typespace, Writer};

use crate::{
	ast::{Cmp, CmpArgs, CmpOp, Expr, Logic, Rhs, Unary, UnaryOp},
	error::FilterError,
	expr::{Literal, PredicateExpr},
};

/// Compiles `expr` over rows of type `row` into the encoded filter AST.
///
/// Column types may be one `Ref` level away; they are resolved through
/// `typespace`. On error nothing is emitted.
pub fn compile(row: &ProductType, typespace: &Typespace, expr: &PredicateExpr) -> Result<Vec<u8>, FilterError> {
	if row.elements.len() > 256 {
		return Err(FilterError::RowTooWide {
			columns: row.elements.len(),
		});
	}
	let lowered = lower(row, typespace, expr)?;
	tracing::debug!(columns = row.elements.len(), "compiled filter");
	Ok(Expr::codec().encode(&lowered))
}

fn lower(row: &ProductType, typespace: &Typespace, expr: &PredicateExpr) -> Result<Expr, FilterError> {
	match expr {
		PredicateExpr::Compare {
			op,
			left,
			right,
		} => match (left.as_ref(), right.as_ref()) {
			(PredicateExpr::Column(column), PredicateExpr::Literal(literal)) => {
				cmp(row, typespace, *op, column, literal)
			}
			(PredicateExpr::Literal(literal), PredicateExpr::Column(column)) => {
				cmp(row, typespace, op.mirror(), column, literal)
			}
			(PredicateExpr::Column(column), PredicateExpr::Column(_)) => Err(FilterError::FieldComparison {
				column: column.clone(),
			}),
			(PredicateExpr::Literal(_), PredicateExpr::Literal(_)) => Err(FilterError::ConstantComparison),
			(
				PredicateExpr::Call {
					name, ..
				},
				_,
			)
			| (
				_,
				PredicateExpr::Call {
					name, ..
				},
			) => Err(FilterError::UnsupportedCall {
				name: name.clone(),
			}),
			_ => Err(FilterError::UnsupportedExpression),
		},
		PredicateExpr::Logic {
			op,
			left,
			right,
		} => Ok(Expr::Logic(Logic {
			lhs: Box::new(lower(row, typespace, left)?),
			op: *op,
			rhs: Box::new(lower(row, typespace, right)?),
		})),
		PredicateExpr::Not(arg) => Ok(Expr::Unary(Unary {
			op: UnaryOp::Not,
			arg: Box::new(lower(row, typespace, arg)?),
		})),
		PredicateExpr::Call {
			name, ..
		} => Err(FilterError::UnsupportedCall {
			name: name.clone(),
		}),
		PredicateExpr::Column(_) | PredicateExpr::Literal(_) => Err(FilterError::UnsupportedExpression),
	}
}

fn cmp(
	row: &ProductType,
	typespace: &Typespace,
	op: CmpOp,
	column: &str,
	literal: &Literal,
) -> Result<Expr, FilterError> {
	let index = row.index_of(column).ok_or_else(|| FilterError::UnknownColumn {
		column: column.to_string(),
	})?;
	let lhs_field = u8::try_from(index).map_err(|_| FilterError::RowTooWide {
		columns: row.elements.len(),
	})?;

	let element = row.elements[index].algebraic_type.as_ref();
	let column_type = match element {
		AlgebraicType::Ref(type_ref) => typespace.resolve(*type_ref).unwrap_or(element),
		_ => element,
	};
	let builtin = column_type.as_builtin().ok_or_else(|| FilterError::UnfilterableColumn {
		column: column.to_string(),
	})?;

	let bytes = encode_literal(column, builtin, literal)?;
	Ok(Expr::Cmp(Cmp {
		op,
		args: CmpArgs {
			lhs_field,
			rhs: Rhs::Value(bytes),
		},
	}))
}

fn encode_literal(column: &str, builtin: &BuiltinType, literal: &Literal) -> Result<Vec<u8>, FilterError> {
	let mut writer = Writer::new();
	match (builtin, literal) {
		(BuiltinType::Bool, Literal::Bool(value)) => writer.write_bool(*value),
		(BuiltinType::I8, Literal::Int(value)) => writer.write_i8(int(*value, column, builtin)?),
		(BuiltinType::U8, Literal::Int(value)) => writer.write_u8(int(*value, column, builtin)?),
		(BuiltinType::I16, Literal::Int(value)) => writer.write_i16(int(*value, column, builtin)?),
		(BuiltinType::U16, Literal::Int(value)) => writer.write_u16(int(*value, column, builtin)?),
		(BuiltinType::I32, Literal::Int(value)) => writer.write_i32(int(*value, column, builtin)?),
		(BuiltinType::U32, Literal::Int(value)) => writer.write_u32(int(*value, column, builtin)?),
		(BuiltinType::I64, Literal::Int(value)) => writer.write_i64(int(*value, column, builtin)?),
		(BuiltinType::U64, Literal::Int(value)) => writer.write_u64(int(*value, column, builtin)?),
		(BuiltinType::I128, Literal::Int(value)) => writer.write_i128(*value),
		(BuiltinType::U128, Literal::Int(value)) => writer.write_u128(int(*value, column, builtin)?),
		(BuiltinType::F32, Literal::Float(value)) => writer.write_f32(*value as f32),
		(BuiltinType::F64, Literal::Float(value)) => writer.write_f64(*value),
		(BuiltinType::String, Literal::String(value)) => writer.write_str(value),
		(
			BuiltinType::Array(_)
			| BuiltinType::Map {
				..
			},
			_,
		) => {
			return Err(FilterError::UnfilterableColumn {
				column: column.to_string(),
			});
		}
		(expected, _) => {
			return Err(FilterError::TypeMismatch {
				column: column.to_string(),
				expected: expected.clone(),
			});
		}
	}
	Ok(writer.into_bytes())
}

fn int<T: TryFrom<i128>>(value: i128, column: &str, expected: &BuiltinType) -> Result<T, FilterError> {
	T::try_from(value).map_err(|_| FilterError::OutOfRange {
		column: column.to_string(),
		value,
		expected: expected.clone(),
	})
}

#[cfg(test)]
mod tests {
	use lattice_type::ProductTypeElement;

	use super::*;

	fn user_row() -> ProductType {
		AlgebraicType::product([
			("id", AlgebraicType::u32()),
			("name", AlgebraicType::string()),
			("age", AlgebraicType::u8()),
			("tags", AlgebraicType::array(AlgebraicType::string())),
		])
		.as_product()
		.unwrap()
		.clone()
	}

	#[test]
	fn equality_against_int_column() {
		let bytes = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::column("id"), PredicateExpr::int(5)),
		)
		.unwrap();
		// cmp tag, Eq, field 0, value tag, u32 LE constant
		assert_eq!(bytes, vec![0, 0, 0, 0, 5, 0, 0, 0]);
	}

	#[test]
	fn constant_on_the_left_mirrors_the_operator() {
		let bytes = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::compare(CmpOp::Lt, PredicateExpr::int(5), PredicateExpr::column("id")),
		)
		.unwrap();
		assert_eq!(bytes, vec![0, CmpOp::Gt.to_u8(), 0, 0, 5, 0, 0, 0]);
	}

	#[test]
	fn string_constants_are_length_prefixed() {
		let bytes = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::column("name"), PredicateExpr::string("bob")),
		)
		.unwrap();
		assert_eq!(bytes, vec![0, 0, 1, 0, 3, 0, 0, 0, b'b', b'o', b'b']);
	}

	#[test]
	fn conjunction_concatenates_compiled_children() {
		let bytes = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::and(
				PredicateExpr::eq(PredicateExpr::column("id"), PredicateExpr::int(5)),
				PredicateExpr::not(PredicateExpr::eq(
					PredicateExpr::column("age"),
					PredicateExpr::int(30),
				)),
			),
		)
		.unwrap();
		assert_eq!(
			bytes,
			vec![
				1, // logic
				0, 0, 0, 0, 5, 0, 0, 0, // id == 5
				0, // and
				2, 0, // not
				0, 0, 2, 0, 30, // age == 30
			]
		);
	}

	#[test]
	fn column_type_resolves_one_ref_level() {
		let mut typespace = Typespace::new();
		let id_ty = typespace.add(AlgebraicType::u32());
		let row = ProductType {
			elements: vec![ProductTypeElement::new("id", AlgebraicType::Ref(id_ty))],
		};
		let bytes = compile(
			&row,
			&typespace,
			&PredicateExpr::eq(PredicateExpr::column("id"), PredicateExpr::int(7)),
		)
		.unwrap();
		assert_eq!(bytes, vec![0, 0, 0, 0, 7, 0, 0, 0]);
	}

	#[test]
	fn unknown_column_is_rejected() {
		let err = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::column("missing"), PredicateExpr::int(1)),
		)
		.unwrap_err();
		assert_eq!(
			err,
			FilterError::UnknownColumn {
				column: "missing".into()
			}
		);
	}

	#[test]
	fn field_to_field_comparison_is_rejected() {
		let err = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::column("id"), PredicateExpr::column("age")),
		)
		.unwrap_err();
		assert_eq!(
			err,
			FilterError::FieldComparison {
				column: "id".into()
			}
		);
	}

	#[test]
	fn constant_to_constant_comparison_is_rejected() {
		let err = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::int(1), PredicateExpr::int(2)),
		)
		.unwrap_err();
		assert_eq!(err, FilterError::ConstantComparison);
	}

	#[test]
	fn calls_are_rejected_by_name() {
		let err = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::Call {
				name: "lower".into(),
				args: vec![PredicateExpr::column("name")],
			},
		)
		.unwrap_err();
		assert_eq!(
			err,
			FilterError::UnsupportedCall {
				name: "lower".into()
			}
		);
	}

	#[test]
	fn out_of_range_literal_is_rejected() {
		let err = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::column("age"), PredicateExpr::int(300)),
		)
		.unwrap_err();
		assert_eq!(
			err,
			FilterError::OutOfRange {
				column: "age".into(),
				value: 300,
				expected: BuiltinType::U8,
			}
		);

		let err = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::column("id"), PredicateExpr::int(-1)),
		)
		.unwrap_err();
		assert_eq!(
			err,
			FilterError::OutOfRange {
				column: "id".into(),
				value: -1,
				expected: BuiltinType::U32,
			}
		);
	}

	#[test]
	fn bool_literal_against_int_column_is_a_type_mismatch() {
		let err = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::column("id"), PredicateExpr::bool(true)),
		)
		.unwrap_err();
		assert_eq!(
			err,
			FilterError::TypeMismatch {
				column: "id".into(),
				expected: BuiltinType::U32,
			}
		);
	}

	#[test]
	fn collection_columns_are_unfilterable() {
		let err = compile(
			&user_row(),
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::column("tags"), PredicateExpr::string("a")),
		)
		.unwrap_err();
		assert_eq!(
			err,
			FilterError::UnfilterableColumn {
				column: "tags".into()
			}
		);
	}

	#[test]
	fn bare_operands_are_not_predicates() {
		let err = compile(&user_row(), &Typespace::new(), &PredicateExpr::column("id")).unwrap_err();
		assert_eq!(err, FilterError::UnsupportedExpression);
	}

	#[test]
	fn overly_wide_rows_are_rejected() {
		let wide = AlgebraicType::product((0..257).map(|i| (format!("c{i}"), AlgebraicType::u8())))
			.as_product()
			.unwrap()
			.clone();
		let err = compile(
			&wide,
			&Typespace::new(),
			&PredicateExpr::eq(PredicateExpr::column("c0"), PredicateExpr::int(1)),
		)
		.unwrap_err();
		assert_eq!(
			err,
			FilterError::RowTooWide {
				columns: 257
			}
		);
	}
}
