// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Expression builders
//!
//! Ergonomic constructors for operands and conditions.
//!
//! ## Coercion
//!
//! Every builder accepts `impl IntoOperand`, so plain Rust values coerce to
//! AST nodes without ceremony: integers and floats become numeric literals,
//! `&str`/`String` become string literals (never parsed as SQL), booleans
//! become boolean literals whose SQL spelling is decided by the dialect at
//! compile time, and `Option<T>` maps `None` to the NULL literal.
//!
//! ## Variadic combinators
//!
//! [`and`] and [`or`] fold a list of conditions left-to-right. They require
//! at least one condition and return `InvalidArgument` on an empty list; a
//! single condition is returned unchanged.
//!
//! ```
//! use sqlmason_ast::{and, column, eq, gt, literal};
//!
//! let cond = and(vec![
//!     eq(column("u", "active"), literal(true)),
//!     gt(column("u", "age"), literal(18)),
//! ])
//! .unwrap();
//! # let _ = cond;
//! ```

use crate::error::{AstError, AstResult};
use crate::expr::{
    BinaryOp, ColumnExpr, Expression, FunctionCall, Literal, LogicalOp, Operand,
};
use crate::query::SelectQuery;

/// Conversion of plain values into operand nodes.
///
/// This is the single coercion seam of the crate: everything the builders
/// accept goes through it.
pub trait IntoOperand {
    fn into_operand(self) -> Operand;
}

impl IntoOperand for Operand {
    fn into_operand(self) -> Operand {
        self
    }
}

impl IntoOperand for Literal {
    fn into_operand(self) -> Operand {
        Operand::Literal(self)
    }
}

impl IntoOperand for ColumnExpr {
    fn into_operand(self) -> Operand {
        Operand::Column(self)
    }
}

impl IntoOperand for FunctionCall {
    fn into_operand(self) -> Operand {
        Operand::Function(Box::new(self))
    }
}

impl IntoOperand for SelectQuery {
    fn into_operand(self) -> Operand {
        Operand::Subquery(Box::new(self))
    }
}

impl IntoOperand for bool {
    fn into_operand(self) -> Operand {
        Operand::Literal(Literal::Boolean(self))
    }
}

impl IntoOperand for i32 {
    fn into_operand(self) -> Operand {
        Operand::Literal(Literal::Integer(self as i64))
    }
}

impl IntoOperand for i64 {
    fn into_operand(self) -> Operand {
        Operand::Literal(Literal::Integer(self))
    }
}

impl IntoOperand for u32 {
    fn into_operand(self) -> Operand {
        Operand::Literal(Literal::Integer(self as i64))
    }
}

impl IntoOperand for f64 {
    fn into_operand(self) -> Operand {
        Operand::Literal(Literal::Float(self))
    }
}

impl IntoOperand for &str {
    fn into_operand(self) -> Operand {
        Operand::Literal(Literal::String(self.to_string()))
    }
}

impl IntoOperand for String {
    fn into_operand(self) -> Operand {
        Operand::Literal(Literal::String(self))
    }
}

impl IntoOperand for Vec<u8> {
    fn into_operand(self) -> Operand {
        Operand::Literal(Literal::Bytes(self))
    }
}

impl<T: IntoOperand> IntoOperand for Option<T> {
    fn into_operand(self) -> Operand {
        match self {
            Some(v) => v.into_operand(),
            None => Operand::Literal(Literal::Null),
        }
    }
}

/// Coerce any supported value into an operand (`valueToOperand`).
pub fn value(v: impl IntoOperand) -> Operand {
    v.into_operand()
}

/// Qualified column reference operand.
pub fn column(table: impl Into<String>, name: impl Into<String>) -> Operand {
    Operand::Column(ColumnExpr::scoped(table, name))
}

/// Unqualified column reference operand.
pub fn bare_column(name: impl Into<String>) -> Operand {
    Operand::Column(ColumnExpr::bare(name))
}

/// Literal operand. Strings stay data; they are never parsed as SQL.
pub fn literal(v: impl IntoOperand) -> Operand {
    v.into_operand()
}

/// Raw SQL fragment, inlined verbatim by every dialect.
pub fn raw(text: impl Into<String>) -> Operand {
    Operand::Raw(text.into())
}

/// Explicit positional parameter (1-based).
pub fn param(position: usize) -> Operand {
    Operand::Parameter(position)
}

/// Scalar subquery operand.
pub fn subquery(query: SelectQuery) -> Operand {
    Operand::Subquery(Box::new(query))
}

/// Function call by canonical registry key.
pub fn func(key: impl Into<String>, args: Vec<Operand>) -> FunctionCall {
    FunctionCall::new(key, args)
}

fn binary(left: impl IntoOperand, op: BinaryOp, right: impl IntoOperand) -> Expression {
    Expression::Binary {
        left: left.into_operand(),
        op,
        right: right.into_operand(),
    }
}

pub fn eq(left: impl IntoOperand, right: impl IntoOperand) -> Expression {
    binary(left, BinaryOp::Eq, right)
}

pub fn neq(left: impl IntoOperand, right: impl IntoOperand) -> Expression {
    binary(left, BinaryOp::NotEq, right)
}

pub fn lt(left: impl IntoOperand, right: impl IntoOperand) -> Expression {
    binary(left, BinaryOp::Lt, right)
}

pub fn lte(left: impl IntoOperand, right: impl IntoOperand) -> Expression {
    binary(left, BinaryOp::LtEq, right)
}

pub fn gt(left: impl IntoOperand, right: impl IntoOperand) -> Expression {
    binary(left, BinaryOp::Gt, right)
}

pub fn gte(left: impl IntoOperand, right: impl IntoOperand) -> Expression {
    binary(left, BinaryOp::GtEq, right)
}

fn fold_logical(op: LogicalOp, conditions: Vec<Expression>, name: &str) -> AstResult<Expression> {
    let mut iter = conditions.into_iter();
    let first = iter.next().ok_or_else(|| {
        AstError::InvalidArgument(format!("{name} requires at least one condition"))
    })?;
    Ok(iter.fold(first, |acc, next| Expression::Logical {
        op,
        left: Box::new(acc),
        right: Box::new(next),
    }))
}

/// Conjunction of conditions. Fails on an empty list.
pub fn and(conditions: Vec<Expression>) -> AstResult<Expression> {
    fold_logical(LogicalOp::And, conditions, "and")
}

/// Disjunction of conditions. Fails on an empty list.
pub fn or(conditions: Vec<Expression>) -> AstResult<Expression> {
    fold_logical(LogicalOp::Or, conditions, "or")
}

pub fn not(condition: Expression) -> Expression {
    Expression::Not(Box::new(condition))
}

pub fn is_null(operand: impl IntoOperand) -> Expression {
    Expression::IsNull {
        operand: operand.into_operand(),
        negated: false,
    }
}

pub fn is_not_null(operand: impl IntoOperand) -> Expression {
    Expression::IsNull {
        operand: operand.into_operand(),
        negated: true,
    }
}

/// `x IN (values)`. An empty list is accepted and compiles to a
/// constant-false comparison.
pub fn in_list(operand: impl IntoOperand, values: Vec<Operand>) -> Expression {
    Expression::InList {
        operand: operand.into_operand(),
        values,
    }
}

pub fn like(operand: impl IntoOperand, pattern: impl IntoOperand) -> Expression {
    Expression::Like {
        operand: operand.into_operand(),
        pattern: pattern.into_operand(),
        negated: false,
        case_insensitive: false,
    }
}

pub fn not_like(operand: impl IntoOperand, pattern: impl IntoOperand) -> Expression {
    Expression::Like {
        operand: operand.into_operand(),
        pattern: pattern.into_operand(),
        negated: true,
        case_insensitive: false,
    }
}

/// Case-insensitive `LIKE` (`ILIKE` on PostgreSQL, `LOWER()` rewrite
/// elsewhere).
pub fn like_insensitive(operand: impl IntoOperand, pattern: impl IntoOperand) -> Expression {
    Expression::Like {
        operand: operand.into_operand(),
        pattern: pattern.into_operand(),
        negated: false,
        case_insensitive: true,
    }
}

pub fn between(
    operand: impl IntoOperand,
    low: impl IntoOperand,
    high: impl IntoOperand,
) -> Expression {
    Expression::Between {
        operand: operand.into_operand(),
        low: low.into_operand(),
        high: high.into_operand(),
    }
}

fn variadic_func(key: &str, args: Vec<Operand>) -> AstResult<FunctionCall> {
    if args.is_empty() {
        return Err(AstError::InvalidArgument(format!(
            "{key} requires at least one argument"
        )));
    }
    Ok(FunctionCall::new(key, args))
}

/// `CONCAT(...)` registry call. Fails on an empty argument list.
pub fn concat(args: Vec<Operand>) -> AstResult<FunctionCall> {
    variadic_func("CONCAT", args)
}

/// `GREATEST(...)` registry call. Fails on an empty argument list.
pub fn greatest(args: Vec<Operand>) -> AstResult<FunctionCall> {
    variadic_func("GREATEST", args)
}

/// `LEAST(...)` registry call. Fails on an empty argument list.
pub fn least(args: Vec<Operand>) -> AstResult<FunctionCall> {
    variadic_func("LEAST", args)
}

pub fn exists(subquery: SelectQuery) -> Expression {
    Expression::Exists {
        subquery: Box::new(subquery),
        negated: false,
    }
}

pub fn not_exists(subquery: SelectQuery) -> Expression {
    Expression::Exists {
        subquery: Box::new(subquery),
        negated: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercions() {
        assert_eq!(value(5), Operand::Literal(Literal::Integer(5)));
        assert_eq!(value(true), Operand::Literal(Literal::Boolean(true)));
        assert_eq!(
            value("abc"),
            Operand::Literal(Literal::String("abc".into()))
        );
        assert_eq!(value(None::<i64>), Operand::Literal(Literal::Null));
        assert_eq!(value(1.5), Operand::Literal(Literal::Float(1.5)));
    }

    #[test]
    fn test_and_requires_conditions() {
        assert!(and(vec![]).is_err());
        assert!(or(vec![]).is_err());
    }

    #[test]
    fn test_and_single_passthrough() {
        let cond = eq(column("u", "id"), literal(1));
        assert_eq!(and(vec![cond.clone()]).unwrap(), cond);
    }

    #[test]
    fn test_and_folds_left_to_right() {
        let a = eq(column("u", "a"), literal(1));
        let b = eq(column("u", "b"), literal(2));
        let c = eq(column("u", "c"), literal(3));
        let folded = and(vec![a.clone(), b.clone(), c.clone()]).unwrap();
        match folded {
            Expression::Logical { op, left, right } => {
                assert_eq!(op, LogicalOp::And);
                assert_eq!(*right, c);
                match *left {
                    Expression::Logical { left, right, .. } => {
                        assert_eq!(*left, a);
                        assert_eq!(*right, b);
                    }
                    other => panic!("expected nested logical, got {other:?}"),
                }
            }
            other => panic!("expected logical, got {other:?}"),
        }
    }

    #[test]
    fn test_in_list_empty_is_value() {
        let cond = in_list(column("u", "id"), vec![]);
        match cond {
            Expression::InList { values, .. } => assert!(values.is_empty()),
            other => panic!("expected in-list, got {other:?}"),
        }
    }
}
