// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Executor capability
//!
//! The narrow async boundary between this crate and a concrete database
//! driver. The core never opens connections: callers inject an [`Executor`]
//! and the core borrows it for the duration of one operation.
//!
//! Values cross the boundary as [`Literal`]s in both directions: positional
//! parameters out, result cells back: so no driver-specific binding types
//! leak into the core.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use sqlmason_ast::Literal;

use crate::error::CatalogResult;

/// What the injected executor can do.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExecutorCapabilities {
    pub transactions: bool,
    pub returning_clause: bool,
}

/// One result set: column names plus rows of literal cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Literal>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, values: Vec<Vec<Literal>>) -> Self {
        Self { columns, values }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.values.iter().map(|cells| Row {
            result: self,
            cells,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Typed access to one result row by column name.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    result: &'a QueryResult,
    cells: &'a [Literal],
}

impl Row<'_> {
    pub fn get(&self, column: &str) -> Option<&Literal> {
        let cell = self.result.column_index(column).and_then(|i| self.cells.get(i))?;
        if cell.is_null() { None } else { Some(cell) }
    }

    /// String cell; numeric cells are not coerced.
    pub fn str(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            Literal::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn int(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            Literal::Integer(i) => Some(*i),
            Literal::Float(f) => Some(*f as i64),
            Literal::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean cell, tolerating the spellings catalogs use: native booleans,
    /// 0/1 integers, and `t/f`, `yes/no`, `true/false` strings.
    pub fn bool(&self, column: &str) -> Option<bool> {
        match self.get(column)? {
            Literal::Boolean(b) => Some(*b),
            Literal::Integer(i) => Some(*i != 0),
            Literal::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "t" | "true" | "yes" | "y" | "1" => Some(true),
                "f" | "false" | "no" | "n" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Injected database capability.
///
/// Owned by the caller; the core borrows it per call and never stores it.
/// Cancellation and timeouts are the executor's concern: the core
/// propagates its errors without retry.
#[async_trait]
pub trait Executor: Send + Sync {
    fn capabilities(&self) -> ExecutorCapabilities;

    /// Execute one statement with positional parameters matching the
    /// dialect's placeholder syntax, returning zero or more result sets.
    async fn execute_sql(&self, sql: &str, params: &[Literal]) -> CatalogResult<Vec<QueryResult>>;

    async fn begin_transaction(&self) -> CatalogResult<()>;

    async fn commit_transaction(&self) -> CatalogResult<()>;

    async fn rollback_transaction(&self) -> CatalogResult<()>;

    /// Release driver resources. Default is a no-op.
    async fn dispose(&self) -> CatalogResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> QueryResult {
        QueryResult::new(
            vec!["name".into(), "n".into(), "flag".into()],
            vec![vec![
                Literal::String("users".into()),
                Literal::Integer(3),
                Literal::String("t".into()),
            ]],
        )
    }

    #[test]
    fn test_row_access_by_name_case_insensitive() {
        let result = result();
        let row = result.rows().next().unwrap();
        assert_eq!(row.str("NAME").as_deref(), Some("users"));
        assert_eq!(row.int("n"), Some(3));
    }

    #[test]
    fn test_bool_spellings() {
        let result = QueryResult::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![vec![
                Literal::String("YES".into()),
                Literal::Integer(0),
                Literal::Boolean(true),
            ]],
        );
        let row = result.rows().next().unwrap();
        assert_eq!(row.bool("a"), Some(true));
        assert_eq!(row.bool("b"), Some(false));
        assert_eq!(row.bool("c"), Some(true));
    }

    #[test]
    fn test_null_cells_read_as_none() {
        let result = QueryResult::new(vec!["x".into()], vec![vec![Literal::Null]]);
        let row = result.rows().next().unwrap();
        assert!(row.get("x").is_none());
        assert!(row.str("x").is_none());
    }
}
