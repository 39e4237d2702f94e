// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect capability
//!
//! One [`Dialect`] trait, four implementations. The trait carries the small
//! per-dialect decisions (quoting, placeholders, pagination style, feature
//! support); all statement rendering lives in [`shared`] as free functions
//! parameterized by the capability, so the dialect modules stay thin and the
//! rendering logic exists exactly once.
//!
//! ## Strategy hooks
//!
//! | Hook | Postgres | MySQL | SQL Server | SQLite |
//! |---|---|---|---|---|
//! | identifier quote | `"x"` | `` `x` `` | `[x]` | `"x"` |
//! | placeholder | `$n` | `?` | `@pN` | `?` |
//! | pagination | LIMIT/OFFSET | LIMIT/OFFSET | OFFSET/FETCH | LIMIT/OFFSET |
//! | returning | appended | unsupported | OUTPUT clause | appended |
//! | FULL/RIGHT join | yes | yes | yes | no |

pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod shared;
pub mod sqlite;

pub use mssql::SqlServerDialect;
pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use sqlmason_ast::{
    DeleteQuery, DialectName, InsertQuery, JoinKind, Literal, ProcedureCall, SelectQuery,
    UpdateQuery,
};

use crate::error::CompileResult;
use crate::functions::FunctionRegistry;
use crate::statement::Statement;

/// How LIMIT/OFFSET is spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitStyle {
    /// `LIMIT n [OFFSET m]`
    LimitOffset,
    /// `OFFSET m ROWS [FETCH NEXT n ROWS ONLY]`, requires ORDER BY
    OffsetFetch,
}

/// How `RETURNING` is realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturningStyle {
    /// `... RETURNING a, b` appended to the statement
    Appended,
    /// `OUTPUT INSERTED.a` / `OUTPUT DELETED.a` between target and source
    OutputClause,
    /// Compilation fails when a returning list is present
    Unsupported,
}

/// How UPDATE/DELETE express additional row sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmlJoinStyle {
    /// `UPDATE t SET ... FROM src JOIN ...` / `DELETE FROM t USING src ...`
    FromClause,
    /// `UPDATE t, src JOIN ... SET ...` / `DELETE t FROM t, src JOIN ...`
    Inline,
    /// `UPDATE a SET ... FROM t AS a JOIN ...` (target named by alias)
    TargetAlias,
    /// Joined DML is rejected for the dialect
    Unsupported,
}

/// How procedure invocations are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureStyle {
    /// `CALL proc(args)`
    Call,
    /// `EXEC proc @p = value [OUTPUT]` with DECLAREd output variables
    Exec,
    /// No stored procedures
    Unsupported,
}

/// A target SQL flavor.
///
/// Compile entry points have shared default bodies; implementations only
/// provide the hooks. All methods are `&self` and the four implementations
/// are stateless apart from their function registry, so a dialect value is
/// freely shareable across threads.
pub trait Dialect: Send + Sync {
    fn name(&self) -> DialectName;

    /// The function registry consulted for `FunctionCall` nodes.
    fn registry(&self) -> &FunctionRegistry;

    /// Quote an identifier, doubling embedded closing delimiters. Fails for
    /// identifiers the dialect cannot represent.
    fn quote_identifier(&self, ident: &str) -> CompileResult<String>;

    /// Placeholder token for the 1-based parameter position.
    fn placeholder(&self, position: usize) -> String;

    /// SQL spelling of a boolean literal.
    fn boolean_literal(&self, value: bool) -> &'static str {
        if value { "1" } else { "0" }
    }

    /// SQL spelling of a bytes literal.
    fn format_bytes(&self, bytes: &[u8]) -> String {
        format!("X'{}'", shared::hex_encode(bytes))
    }

    /// Inline literal text, used where parameters are not allowed (DDL
    /// defaults, aggregate separators).
    fn format_literal(&self, literal: &Literal) -> String {
        shared::format_literal(self, literal)
    }

    fn limit_style(&self) -> LimitStyle {
        LimitStyle::LimitOffset
    }

    /// LIMIT/OFFSET clause for [`LimitStyle::LimitOffset`] dialects; `None`
    /// when no pagination was requested.
    fn pagination_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(n), None) => Some(format!("LIMIT {n}")),
            (Some(n), Some(m)) => Some(format!("LIMIT {n} OFFSET {m}")),
            (None, Some(m)) => Some(format!("OFFSET {m}")),
        }
    }

    fn returning_style(&self) -> ReturningStyle;

    fn supports_join(&self, _kind: JoinKind) -> bool {
        true
    }

    /// Native `NULLS FIRST/LAST` support; emulated with a CASE key when
    /// absent.
    fn supports_nulls_ordering(&self) -> bool {
        false
    }

    fn supports_cte_materialization(&self) -> bool {
        false
    }

    /// Whether recursive CTEs need the `RECURSIVE` keyword.
    fn recursive_cte_requires_keyword(&self) -> bool {
        true
    }

    /// SQL Server rejects duplicate exposed names in one FROM list; when
    /// true, colliding unaliased join tables are re-aliased automatically.
    fn requires_unique_exposed_names(&self) -> bool {
        false
    }

    fn supports_lateral(&self) -> bool {
        false
    }

    fn supports_with_ordinality(&self) -> bool {
        false
    }

    /// Native case-insensitive LIKE (`ILIKE`); `LOWER()` rewrite when false.
    fn supports_ilike(&self) -> bool {
        false
    }

    /// Whether UPDATE SET targets may carry a table qualifier.
    fn qualified_set_targets(&self) -> bool {
        false
    }

    fn update_join_style(&self) -> DmlJoinStyle;

    fn delete_join_style(&self) -> DmlJoinStyle;

    fn procedure_style(&self) -> ProcedureStyle;

    // The compile entry points delegate to the shared renderers; each
    // implementation provides the one-line delegation so the shared code can
    // work with `&dyn Dialect`.
    fn compile_select(&self, query: &SelectQuery) -> CompileResult<Statement>;

    fn compile_insert(&self, query: &InsertQuery) -> CompileResult<Statement>;

    fn compile_update(&self, query: &UpdateQuery) -> CompileResult<Statement>;

    fn compile_delete(&self, query: &DeleteQuery) -> CompileResult<Statement>;

    fn compile_procedure_call(&self, call: &ProcedureCall) -> CompileResult<Statement>;
}

/// Construct the dialect implementation for a name, with builtin functions
/// registered.
pub fn dialect_for(name: DialectName) -> Box<dyn Dialect> {
    match name {
        DialectName::Postgres => Box::new(PostgresDialect::new()),
        DialectName::MySql => Box::new(MySqlDialect::new()),
        DialectName::SqlServer => Box::new(SqlServerDialect::new()),
        DialectName::Sqlite => Box::new(SqliteDialect::new()),
        _ => unreachable!("unknown DialectName variant"),
    }
}
