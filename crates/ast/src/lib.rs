// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlmason-ast
//!
//! Typed, value-like AST for SQL statements.
//!
//! This crate is the input language of the whole toolkit: callers describe
//! `SELECT` / `INSERT` / `UPDATE` / `DELETE` / `CALL` statements as plain
//! Rust values and hand them to a dialect compiler. Nodes carry no identity
//! and no back-pointers; every child is owned by exactly one parent, and all
//! builders are value-style (`fn with_x(mut self, ..) -> Self`), so a built
//! query can be cloned, serialized, and compiled for several dialects
//! without ever being mutated.
//!
//! ## Modules
//!
//! - [`dialect`]: the [`DialectName`] selector shared by every layer
//! - [`expr`]: operands, expressions, literals, function calls
//! - [`query`]: statement nodes (select/insert/update/delete/call)
//! - [`builder`]: ergonomic constructors (`eq`, `and`, `in_list`, ...)
//!   with typed operand coercion

pub mod builder;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod query;

pub use builder::{
    IntoOperand, and, bare_column, between, column, concat, eq, exists, func, greatest, gt, gte,
    in_list, is_not_null, is_null, least, like, like_insensitive, literal, lt, lte, neq, not,
    not_exists, not_like, or, param, raw, subquery, value,
};
pub use dialect::DialectName;
pub use error::{AstError, AstResult};
pub use expr::{
    BinaryOp, CaseBranch, CaseExpr, ColumnExpr, Expression, FunctionCall, Literal, LogicalOp,
    Operand, WindowSpec,
};
pub use query::{
    Assignment, Cte, CteMaterialization, DeleteQuery, FunctionTable, InsertQuery, InsertSource,
    Join, JoinKind, NullsOrder, OrderBy, ParamDirection, ProcedureCall, ProcedureParam,
    SelectColumn, SelectQuery, SetOpBranch, SetOperator, SortDirection, TableRef, TableSource,
    UpdateQuery,
};
