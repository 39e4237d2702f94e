// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQLite introspector
//!
//! Reads `sqlite_master` for the table list and the `pragma_table_info` /
//! `pragma_foreign_key_list` / `pragma_index_list` / `pragma_index_info`
//! table functions for details. Comments come from the optional
//! `schema_comments` side table; its absence is not an error.

use sqlmason_ast::{
    FunctionTable, OrderBy, SelectQuery, TableRef, and, column, eq, in_list, literal, not_like,
};
use sqlmason_compiler::{CompileError, SqliteDialect};
use sqlmason_schema::{
    DatabaseColumn, DatabaseIndex, DatabaseSchema, DatabaseTable, DatabaseView,
    ObservedForeignKey, ReferentialAction,
};

use crate::error::CatalogResult;
use crate::executor::Executor;
use crate::introspect::{IntrospectOptions, run_catalog_query, should_include_table};

fn pragma_source(function: &str, argument: &str, alias: &str) -> FunctionTable {
    FunctionTable::new(function, vec![literal(argument)]).with_alias(alias)
}

pub async fn introspect(
    executor: &dyn Executor,
    options: &IntrospectOptions,
) -> CatalogResult<DatabaseSchema> {
    let dialect = SqliteDialect::new();

    let mut kinds = vec![literal("table")];
    if options.include_views {
        kinds.push(literal("view"));
    }
    let master = SelectQuery::from(TableRef::new("sqlite_master").with_alias("m"))
        .select(vec![
            column("m", "name"),
            column("m", "type"),
            column("m", "sql"),
        ])
        .with_where(
            and(vec![
                in_list(column("m", "type"), kinds),
                not_like(column("m", "name"), literal("sqlite_%")),
            ])
            .map_err(CompileError::from)?,
        )
        .order_by(OrderBy::asc(column("m", "name")));
    let master_rows = run_catalog_query(executor, &dialect, "sqlite_master", &master).await?;

    let mut schema = DatabaseSchema::default();
    for row in master_rows.rows() {
        let Some(name) = row.str("name") else { continue };
        let kind = row.str("type").unwrap_or_default();
        let create_sql = row.str("sql").unwrap_or_default();

        if kind == "view" {
            schema.views.push(DatabaseView {
                name,
                schema: None,
                definition: Some(create_sql),
            });
            continue;
        }
        if !should_include_table(&name, options) {
            continue;
        }
        let table = read_table(executor, &dialect, &name, &create_sql).await?;
        schema.tables.push(table);
    }
    Ok(schema)
}

async fn read_table(
    executor: &dyn Executor,
    dialect: &SqliteDialect,
    name: &str,
    create_sql: &str,
) -> CatalogResult<DatabaseTable> {
    let info = SelectQuery::from(pragma_source("pragma_table_info", name, "ti"))
        .select(vec![
            column("ti", "cid"),
            column("ti", "name"),
            column("ti", "type"),
            column("ti", "notnull"),
            column("ti", "dflt_value"),
            column("ti", "pk"),
        ])
        .order_by(OrderBy::asc(column("ti", "cid")));
    let info_rows = run_catalog_query(executor, dialect, "pragma_table_info", &info).await?;

    let mut columns = Vec::new();
    let mut primary: Vec<(i64, String)> = Vec::new();
    for row in info_rows.rows() {
        let Some(column_name) = row.str("name") else { continue };
        let mut col = DatabaseColumn::new(
            column_name.clone(),
            row.str("type").unwrap_or_else(|| "TEXT".to_string()),
        );
        if row.bool("notnull").unwrap_or(false) {
            col = col.not_null();
        }
        if let Some(default) = row.str("dflt_value") {
            col = col.with_default(default);
        }
        let pk_position = row.int("pk").unwrap_or(0);
        if pk_position > 0 {
            col = col.not_null();
            primary.push((pk_position, column_name));
        }
        columns.push(col);
    }
    primary.sort_by_key(|(position, _)| *position);
    let primary_key: Vec<String> = primary.into_iter().map(|(_, name)| name).collect();

    // The rowid alias is the only auto-increment SQLite has.
    if primary_key.len() == 1 && create_sql.to_ascii_uppercase().contains("AUTOINCREMENT") {
        if let Some(col) = columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&primary_key[0]))
        {
            col.auto_increment = true;
        }
    }

    apply_foreign_keys(executor, dialect, name, &mut columns).await?;
    let indexes = read_indexes(executor, dialect, name).await?;
    apply_comments(executor, dialect, name, &mut columns).await;

    Ok(DatabaseTable::new(name)
        .with_columns(columns)
        .with_primary_key(primary_key)
        .with_indexes(indexes))
}

async fn apply_foreign_keys(
    executor: &dyn Executor,
    dialect: &SqliteDialect,
    table: &str,
    columns: &mut [DatabaseColumn],
) -> CatalogResult<()> {
    let query = SelectQuery::from(pragma_source("pragma_foreign_key_list", table, "fk"))
        .select(vec![
            column("fk", "table"),
            column("fk", "from"),
            column("fk", "to"),
            column("fk", "on_update"),
            column("fk", "on_delete"),
        ])
        .order_by(OrderBy::asc(column("fk", "id")));
    let rows = run_catalog_query(executor, dialect, "pragma_foreign_key_list", &query).await?;

    for row in rows.rows() {
        let (Some(local), Some(target)) = (row.str("from"), row.str("table")) else {
            continue;
        };
        if let Some(col) = columns.iter_mut().find(|c| c.name.eq_ignore_ascii_case(&local)) {
            col.references = Some(ObservedForeignKey {
                table: target,
                column: row.str("to").unwrap_or_else(|| "id".to_string()),
                on_delete: row
                    .str("on_delete")
                    .as_deref()
                    .and_then(ReferentialAction::parse),
                on_update: row
                    .str("on_update")
                    .as_deref()
                    .and_then(ReferentialAction::parse),
            });
        }
    }
    Ok(())
}

async fn read_indexes(
    executor: &dyn Executor,
    dialect: &SqliteDialect,
    table: &str,
) -> CatalogResult<Vec<DatabaseIndex>> {
    let list = SelectQuery::from(pragma_source("pragma_index_list", table, "il"))
        .select(vec![
            column("il", "name"),
            column("il", "unique"),
            column("il", "origin"),
        ])
        .order_by(OrderBy::asc(column("il", "seq")));
    let rows = run_catalog_query(executor, dialect, "pragma_index_list", &list).await?;

    let mut indexes = Vec::new();
    for row in rows.rows() {
        let Some(index_name) = row.str("name") else { continue };
        let origin = row.str("origin").unwrap_or_default();

        let info = SelectQuery::from(pragma_source("pragma_index_info", &index_name, "ii"))
            .select(vec![column("ii", "seqno"), column("ii", "name")])
            .order_by(OrderBy::asc(column("ii", "seqno")));
        let info_rows = run_catalog_query(executor, dialect, "pragma_index_info", &info).await?;
        let columns: Vec<String> = info_rows.rows().filter_map(|r| r.str("name")).collect();

        let mut index = DatabaseIndex::new(index_name, columns);
        if row.bool("unique").unwrap_or(false) {
            index = index.unique();
        }
        if origin == "pk" {
            index = index.primary();
        }
        indexes.push(index);
    }
    Ok(indexes)
}

/// Best effort: the `schema_comments` side table is optional and silently
/// skipped when missing.
async fn apply_comments(
    executor: &dyn Executor,
    dialect: &SqliteDialect,
    table: &str,
    columns: &mut [DatabaseColumn],
) {
    let query = SelectQuery::from(TableRef::new("schema_comments").with_alias("sc"))
        .select(vec![column("sc", "column_name"), column("sc", "comment")])
        .with_where(eq(column("sc", "table_name"), literal(table)));
    let Ok(rows) = run_catalog_query(executor, dialect, "schema_comments", &query).await else {
        return;
    };
    for row in rows.rows() {
        let (Some(column_name), Some(comment)) = (row.str("column_name"), row.str("comment"))
        else {
            continue;
        };
        if let Some(col) = columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&column_name))
        {
            col.comment = Some(comment);
        }
    }
}
