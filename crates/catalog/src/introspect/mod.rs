// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Catalog introspection
//!
//! Per-dialect readers that reconstruct a [`DatabaseSchema`] from a running
//! database.
//!
//! Every catalog query is built through the query AST and compiled by the
//! same dialect compiler user statements go through, so identifier quoting
//! and parameterization stay consistent: and the queries themselves are
//! testable against a mock executor.
//!
//! Executor failures are surfaced unchanged, tagged with the catalog that
//! was being read (`IntrospectionFailed { catalog, .. }`).

pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

use sqlmason_ast::{DialectName, SelectQuery};
use sqlmason_compiler::Dialect;
use sqlmason_schema::DatabaseSchema;

use crate::error::{CatalogError, CatalogResult};
use crate::executor::{Executor, QueryResult};

/// What to read from the catalog.
#[derive(Debug, Clone, Default)]
pub struct IntrospectOptions {
    /// Schema to read; dialect default when absent (`public`, `dbo`, the
    /// connected database)
    pub schema: Option<String>,
    /// Table-name allowlist; empty means all tables
    pub table_filter: Vec<String>,
    pub include_views: bool,
}

impl IntrospectOptions {
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_table_filter(mut self, tables: Vec<String>) -> Self {
        self.table_filter = tables;
        self
    }

    pub fn with_views(mut self) -> Self {
        self.include_views = true;
        self
    }
}

pub(crate) fn should_include_table(name: &str, options: &IntrospectOptions) -> bool {
    options.table_filter.is_empty()
        || options
            .table_filter
            .iter()
            .any(|f| f.eq_ignore_ascii_case(name))
}

/// Compile an AST catalog query and run it, expecting one result set.
pub(crate) async fn run_catalog_query(
    executor: &dyn Executor,
    dialect: &dyn Dialect,
    catalog: &str,
    query: &SelectQuery,
) -> CatalogResult<QueryResult> {
    let statement = dialect.compile_select(query)?;
    tracing::debug!(%catalog, sql = %statement.sql, "catalog query");
    let mut results = executor
        .execute_sql(&statement.sql, &statement.params)
        .await
        .map_err(|err| CatalogError::IntrospectionFailed {
            catalog: catalog.to_string(),
            message: err.to_string(),
        })?;
    if results.is_empty() {
        return Err(CatalogError::IntrospectionFailed {
            catalog: catalog.to_string(),
            message: "no result set returned".to_string(),
        });
    }
    Ok(results.remove(0))
}

/// Read a [`DatabaseSchema`] from the database behind `executor`.
pub async fn introspect(
    dialect: DialectName,
    executor: &dyn Executor,
    options: &IntrospectOptions,
) -> CatalogResult<DatabaseSchema> {
    match dialect {
        DialectName::Postgres => postgres::introspect(executor, options).await,
        DialectName::MySql => mysql::introspect(executor, options).await,
        DialectName::SqlServer => mssql::introspect(executor, options).await,
        DialectName::Sqlite => sqlite::introspect(executor, options).await,
        _ => unreachable!("unknown DialectName variant"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_include_table_empty_filter() {
        let options = IntrospectOptions::default();
        assert!(should_include_table("anything", &options));
    }

    #[test]
    fn test_should_include_table_allowlist() {
        let options = IntrospectOptions::default().with_table_filter(vec!["Users".to_string()]);
        assert!(should_include_table("users", &options));
        assert!(!should_include_table("orders", &options));
    }
}
