// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlmason-compiler
//!
//! Dialect-aware compilation of the sqlmason AST into SQL text plus a
//! positional parameter vector.
//!
//! ## Design
//!
//! A single [`Dialect`] capability with four implementations replaces any
//! inheritance hierarchy: the per-dialect modules only answer questions
//! (quoting, placeholders, pagination style, feature support) while all
//! statement rendering lives in [`dialect::shared`] as free functions
//! parameterized by the capability.
//!
//! Compilation is synchronous, deterministic, and never mutates its input;
//! the only state is a per-call [`CompilerContext`] threading the growing
//! parameter vector and the stack of CTE names in scope.
//!
//! ```
//! use sqlmason_ast::{SelectQuery, TableRef, column, eq, literal};
//! use sqlmason_compiler::{Dialect, PostgresDialect};
//!
//! let query = SelectQuery::from(TableRef::new("users").with_alias("u"))
//!     .select(vec![column("u", "id")])
//!     .with_where(eq(column("u", "active"), literal(true)));
//!
//! let statement = PostgresDialect::new().compile_select(&query).unwrap();
//! assert_eq!(
//!     statement.sql,
//!     r#"SELECT "u"."id" FROM "users" AS "u" WHERE "u"."active" = $1"#
//! );
//! ```

pub mod context;
pub mod dialect;
pub mod error;
pub mod functions;
pub mod statement;

pub use context::CompilerContext;
pub use dialect::{
    Dialect, DmlJoinStyle, LimitStyle, MySqlDialect, PostgresDialect, ProcedureStyle,
    ReturningStyle, SqlServerDialect, SqliteDialect, dialect_for,
};
pub use error::{CompileError, CompileResult};
pub use functions::{
    FunctionContext, FunctionDef, FunctionRegistry, FunctionVariant, RenderFn, TableFunctionDef,
    TableFunctionVariant, TableRenderFn,
};
pub use statement::Statement;
