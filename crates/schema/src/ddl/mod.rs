// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # DDL rendering
//!
//! A [`SchemaDialect`] capability per target database maps semantic column
//! types to concrete SQL types and renders `CREATE` / `ALTER` / `DROP`
//! statements. Identifier quoting and literal formatting are delegated to
//! the query compiler's [`Dialect`], so DDL and DML agree on spelling.
//!
//! Column alteration is deliberately lossy and dialect-specific: MySQL
//! redefines the column atomically (`MODIFY COLUMN`), PostgreSQL emits one
//! `ALTER COLUMN` statement per changed aspect, SQL Server alters type and
//! nullability together and surfaces default/identity changes as warnings,
//! and SQLite cannot alter columns at all and only warns.

pub mod mssql;
pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mssql::SqlServerSchemaDialect;
pub use mysql::MySqlSchemaDialect;
pub use postgres::PostgresSchemaDialect;
pub use sqlite::SqliteSchemaDialect;

use sqlmason_ast::DialectName;
use sqlmason_compiler::Dialect;

use crate::database::DatabaseTable;
use crate::def::{ColumnDef, DefaultValue, IndexDef, TableDef};
use crate::diff::ColumnDiff;
use crate::error::{SchemaError, SchemaResult};

/// Result of rendering one column alteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlterColumn {
    pub statements: Vec<String>,
    pub warnings: Vec<String>,
}

/// Per-dialect schema adapter.
pub trait SchemaDialect: Send + Sync {
    fn name(&self) -> DialectName;

    /// The query compiler used for quoting and literal formatting.
    fn compiler(&self) -> &dyn Dialect;

    /// Concrete SQL type for a column, honoring `dialect_types` overrides.
    fn column_type_sql(&self, column: &ColumnDef) -> SchemaResult<String>;

    /// `CREATE TABLE` plus any trailing statements (indexes are rendered
    /// separately; PostgreSQL appends `COMMENT ON` statements here).
    fn render_create_table(&self, table: &TableDef) -> SchemaResult<Vec<String>>;

    fn render_create_index(&self, table: &TableDef, index: &IndexDef) -> SchemaResult<String>;

    fn render_drop_table(&self, table: &DatabaseTable) -> SchemaResult<String>;

    fn render_add_column(&self, table: &TableDef, column: &ColumnDef) -> SchemaResult<String>;

    fn render_drop_column(&self, table: &TableDef, column_name: &str) -> SchemaResult<String>;

    fn render_alter_column(
        &self,
        table: &TableDef,
        column: &ColumnDef,
        diff: &ColumnDiff,
    ) -> SchemaResult<AlterColumn>;

    fn render_drop_index(&self, table: &TableDef, index_name: &str) -> SchemaResult<String>;

    /// Dialect-aware type equivalence: case and known synonyms are
    /// normalized before comparing.
    fn type_equivalent(&self, column: &ColumnDef, observed_type: &str) -> bool;

    fn supports_partial_indexes(&self) -> bool {
        true
    }
}

/// Construct the schema adapter for a dialect name.
pub fn schema_dialect_for(name: DialectName) -> Box<dyn SchemaDialect> {
    match name {
        DialectName::Postgres => Box::new(PostgresSchemaDialect::new()),
        DialectName::MySql => Box::new(MySqlSchemaDialect::new()),
        DialectName::SqlServer => Box::new(SqlServerSchemaDialect::new()),
        DialectName::Sqlite => Box::new(SqliteSchemaDialect::new()),
        _ => unreachable!("unknown DialectName variant"),
    }
}

/// Table-definition invariants checked before rendering.
pub(crate) fn validate_table(table: &TableDef) -> SchemaResult<()> {
    if table.columns.is_empty() {
        return Err(SchemaError::InvalidDefinition(format!(
            "table {} has no columns",
            table.name
        )));
    }
    for key in &table.primary_key {
        if table.column_by_key(key).is_none() {
            return Err(SchemaError::InvalidDefinition(format!(
                "primary key column {key} does not exist in table {}",
                table.name
            )));
        }
    }
    for column in &table.columns {
        if column.auto_increment && !column.column_type.is_integer_family() {
            return Err(SchemaError::InvalidDefinition(format!(
                "auto-increment column {} must be an integer type",
                column.key
            )));
        }
    }
    Ok(())
}

pub(crate) fn quote(dialect: &dyn SchemaDialect, ident: &str) -> SchemaResult<String> {
    Ok(dialect.compiler().quote_identifier(ident)?)
}

pub(crate) fn qualified_table(
    dialect: &dyn SchemaDialect,
    schema: Option<&str>,
    name: &str,
) -> SchemaResult<String> {
    match schema {
        Some(schema) => Ok(format!(
            "{}.{}",
            quote(dialect, schema)?,
            quote(dialect, name)?
        )),
        None => quote(dialect, name),
    }
}

pub(crate) fn table_name(dialect: &dyn SchemaDialect, table: &TableDef) -> SchemaResult<String> {
    qualified_table(dialect, table.schema.as_deref(), &table.name)
}

pub(crate) fn render_default(dialect: &dyn SchemaDialect, default: &DefaultValue) -> String {
    match default {
        DefaultValue::Value(literal) => dialect.compiler().format_literal(literal),
        DefaultValue::Expression(expression) => expression.clone(),
    }
}

/// Column-level `REFERENCES` clause shared by the dialects that inline it.
pub(crate) fn render_references(
    dialect: &dyn SchemaDialect,
    column: &ColumnDef,
) -> SchemaResult<Option<String>> {
    let Some(reference) = &column.references else {
        return Ok(None);
    };
    let mut sql = format!(
        "REFERENCES {}({})",
        quote(dialect, &reference.table)?,
        quote(dialect, &reference.column)?
    );
    if let Some(action) = reference.on_delete {
        sql.push_str(" ON DELETE ");
        sql.push_str(action.sql_keyword());
    }
    if let Some(action) = reference.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(action.sql_keyword());
    }
    Ok(Some(sql))
}

/// `CREATE [UNIQUE] INDEX name ON table (cols) [WHERE ...]`, shared by every
/// dialect; partial-index support is checked by the caller.
pub(crate) fn render_index_statement(
    dialect: &dyn SchemaDialect,
    table: &TableDef,
    index: &IndexDef,
) -> SchemaResult<String> {
    if index.columns.is_empty() {
        return Err(SchemaError::InvalidDefinition(format!(
            "index on table {} has no columns",
            table.name
        )));
    }
    if index.where_clause.is_some() && !dialect.supports_partial_indexes() {
        return Err(SchemaError::UnsupportedFeature {
            dialect: dialect.name(),
            feature: "partial indexes".to_string(),
        });
    }
    let unique = if index.unique { "UNIQUE " } else { "" };
    let name = quote(dialect, &index.effective_name(&table.name))?;
    let columns = index
        .columns
        .iter()
        .map(|c| {
            let mut sql = quote(dialect, &c.column)?;
            if let Some(direction) = c.direction {
                sql.push(' ');
                sql.push_str(direction.sql_keyword());
            }
            Ok(sql)
        })
        .collect::<SchemaResult<Vec<_>>>()?
        .join(", ");
    let mut sql = format!(
        "CREATE {unique}INDEX {name} ON {} ({columns})",
        table_name(dialect, table)?
    );
    if let Some(predicate) = &index.where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(predicate);
    }
    Ok(sql)
}

/// Lowercase, collapse interior whitespace, and apply cross-dialect type
/// synonyms, so `INTEGER` ≡ `int4` and `character varying(255)` ≡
/// `varchar(255)`.
pub(crate) fn canonical_type(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");

    let (base, args) = match collapsed.find('(') {
        Some(at) => (collapsed[..at].trim_end().to_string(), collapsed[at..].to_string()),
        None => (collapsed.clone(), String::new()),
    };
    let base = match base.as_str() {
        "int" | "int4" => "integer",
        "int8" => "bigint",
        "int2" => "smallint",
        "bool" => "boolean",
        "character varying" => "varchar",
        "character" => "char",
        "decimal" => "numeric",
        "double precision" | "float8" => "double",
        "timestamp without time zone" => "timestamp",
        "timestamp with time zone" => "timestamptz",
        other => other,
    };
    format!("{base}{args}")
}
