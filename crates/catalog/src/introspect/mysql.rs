// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! MySQL introspector
//!
//! Reads `information_schema.tables` / `columns` / `statistics` /
//! `key_column_usage` + `referential_constraints`. Index columns are
//! grouped server-side with `GROUP_CONCAT(... ORDER BY seq_in_index)`;
//! the connected database is used when no schema is given.

use std::collections::BTreeMap;

use sqlmason_ast::{
    Join, JoinKind, Operand, OrderBy, SelectColumn, SelectQuery, TableRef, and, column, eq, func,
    in_list, is_not_null, literal, raw,
};
use sqlmason_compiler::{CompileError, MySqlDialect};
use sqlmason_schema::{
    DatabaseColumn, DatabaseIndex, DatabaseSchema, DatabaseTable, DatabaseView,
    ObservedForeignKey, ReferentialAction,
};

use crate::error::CatalogResult;
use crate::executor::Executor;
use crate::introspect::{IntrospectOptions, run_catalog_query, should_include_table};

fn info_table(name: &str, alias: &str) -> TableRef {
    TableRef::new(name)
        .with_schema("information_schema")
        .with_alias(alias)
}

fn schema_operand(options: &IntrospectOptions) -> Operand {
    match &options.schema {
        Some(schema) => literal(schema.clone()),
        None => raw("DATABASE()"),
    }
}

pub async fn introspect(
    executor: &dyn Executor,
    options: &IntrospectOptions,
) -> CatalogResult<DatabaseSchema> {
    let dialect = MySqlDialect::new();

    let mut kinds = vec![literal("BASE TABLE")];
    if options.include_views {
        kinds.push(literal("VIEW"));
    }
    let tables_query = SelectQuery::from(info_table("tables", "t"))
        .select(vec![
            column("t", "table_name"),
            column("t", "table_type"),
            column("t", "table_comment"),
        ])
        .with_where(
            and(vec![
                eq(column("t", "table_schema"), schema_operand(options)),
                in_list(column("t", "table_type"), kinds),
            ])
            .map_err(CompileError::from)?,
        )
        .order_by(OrderBy::asc(column("t", "table_name")));
    let table_rows =
        run_catalog_query(executor, &dialect, "information_schema.tables", &tables_query).await?;

    let mut schema = DatabaseSchema::default();
    let mut tables: BTreeMap<String, DatabaseTable> = BTreeMap::new();
    for row in table_rows.rows() {
        let Some(name) = row.str("table_name") else { continue };
        if row.str("table_type").as_deref() == Some("VIEW") {
            schema.views.push(DatabaseView {
                name,
                schema: options.schema.clone(),
                definition: None,
            });
            continue;
        }
        if !should_include_table(&name, options) {
            continue;
        }
        let mut table = DatabaseTable::new(name.clone());
        if let Some(schema_name) = &options.schema {
            table = table.with_schema(schema_name.clone());
        }
        if let Some(comment) = row.str("table_comment").filter(|c| !c.is_empty()) {
            table = table.with_comment(comment);
        }
        tables.insert(name.to_lowercase(), table);
    }

    read_columns(executor, &dialect, options, &mut tables).await?;
    read_indexes(executor, &dialect, options, &mut tables).await?;
    read_foreign_keys(executor, &dialect, options, &mut tables).await?;

    schema.tables.extend(tables.into_values());
    Ok(schema)
}

async fn read_columns(
    executor: &dyn Executor,
    dialect: &MySqlDialect,
    options: &IntrospectOptions,
    tables: &mut BTreeMap<String, DatabaseTable>,
) -> CatalogResult<()> {
    let query = SelectQuery::from(info_table("columns", "c"))
        .select(vec![
            column("c", "table_name"),
            column("c", "column_name"),
            column("c", "column_type"),
            column("c", "is_nullable"),
            column("c", "column_default"),
            column("c", "column_key"),
            column("c", "extra"),
            column("c", "column_comment"),
        ])
        .with_where(eq(column("c", "table_schema"), schema_operand(options)))
        .with_order_by(vec![
            OrderBy::asc(column("c", "table_name")),
            OrderBy::asc(column("c", "ordinal_position")),
        ]);
    let rows =
        run_catalog_query(executor, dialect, "information_schema.columns", &query).await?;

    for row in rows.rows() {
        let (Some(table_name), Some(column_name)) =
            (row.str("table_name"), row.str("column_name"))
        else {
            continue;
        };
        let Some(table) = tables.get_mut(&table_name.to_lowercase()) else {
            continue;
        };
        let mut col = DatabaseColumn::new(
            column_name.clone(),
            row.str("column_type").unwrap_or_default(),
        );
        if row.str("is_nullable").as_deref() == Some("NO") {
            col = col.not_null();
        }
        if let Some(default) = row.str("column_default") {
            col = col.with_default(default);
        }
        if row
            .str("extra")
            .is_some_and(|e| e.to_ascii_lowercase().contains("auto_increment"))
        {
            col = col.auto_increment();
        }
        if let Some(comment) = row.str("column_comment").filter(|c| !c.is_empty()) {
            col = col.with_comment(comment);
        }
        if row.str("column_key").as_deref() == Some("PRI") {
            table.primary_key.push(column_name);
        }
        table.columns.push(col);
    }
    Ok(())
}

async fn read_indexes(
    executor: &dyn Executor,
    dialect: &MySqlDialect,
    options: &IntrospectOptions,
    tables: &mut BTreeMap<String, DatabaseTable>,
) -> CatalogResult<()> {
    let query = SelectQuery::from(info_table("statistics", "s"))
        .select_as(vec![
            SelectColumn::new(column("s", "table_name")),
            SelectColumn::new(column("s", "index_name")),
            SelectColumn::new(Operand::from(func("MAX", vec![column("s", "non_unique")])))
                .with_alias("non_unique"),
            SelectColumn::new(Operand::from(
                func("GROUP_CONCAT", vec![column("s", "column_name")])
                    .with_order_by(vec![OrderBy::asc(column("s", "seq_in_index"))]),
            ))
            .with_alias("column_list"),
        ])
        .with_where(eq(column("s", "table_schema"), schema_operand(options)))
        .with_group_by(vec![column("s", "table_name"), column("s", "index_name")])
        .with_order_by(vec![
            OrderBy::asc(column("s", "table_name")),
            OrderBy::asc(column("s", "index_name")),
        ]);
    let rows =
        run_catalog_query(executor, dialect, "information_schema.statistics", &query).await?;

    for row in rows.rows() {
        let (Some(table_name), Some(index_name)) =
            (row.str("table_name"), row.str("index_name"))
        else {
            continue;
        };
        let Some(table) = tables.get_mut(&table_name.to_lowercase()) else {
            continue;
        };
        let columns: Vec<String> = row
            .str("column_list")
            .unwrap_or_default()
            .split(',')
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        let mut index = DatabaseIndex::new(index_name.clone(), columns);
        if row.int("non_unique") == Some(0) {
            index = index.unique();
        }
        if index_name == "PRIMARY" {
            index = index.primary();
        }
        table.indexes.push(index);
    }
    Ok(())
}

async fn read_foreign_keys(
    executor: &dyn Executor,
    dialect: &MySqlDialect,
    options: &IntrospectOptions,
    tables: &mut BTreeMap<String, DatabaseTable>,
) -> CatalogResult<()> {
    let join_condition = and(vec![
        eq(column("r", "constraint_name"), column("k", "constraint_name")),
        eq(
            column("r", "constraint_schema"),
            column("k", "constraint_schema"),
        ),
    ])
    .map_err(CompileError::from)?;
    let query = SelectQuery::from(info_table("key_column_usage", "k"))
        .join(Join::new(
            JoinKind::Inner,
            info_table("referential_constraints", "r"),
            join_condition,
        ))
        .select(vec![
            column("k", "table_name"),
            column("k", "column_name"),
            column("k", "referenced_table_name"),
            column("k", "referenced_column_name"),
            column("r", "update_rule"),
            column("r", "delete_rule"),
        ])
        .with_where(
            and(vec![
                eq(column("k", "table_schema"), schema_operand(options)),
                is_not_null(column("k", "referenced_table_name")),
            ])
            .map_err(CompileError::from)?,
        );
    let rows = run_catalog_query(
        executor,
        dialect,
        "information_schema.key_column_usage",
        &query,
    )
    .await?;

    for row in rows.rows() {
        let (Some(table_name), Some(column_name), Some(ref_table)) = (
            row.str("table_name"),
            row.str("column_name"),
            row.str("referenced_table_name"),
        ) else {
            continue;
        };
        let Some(table) = tables.get_mut(&table_name.to_lowercase()) else {
            continue;
        };
        if let Some(col) = table
            .columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&column_name))
        {
            col.references = Some(ObservedForeignKey {
                table: ref_table,
                column: row
                    .str("referenced_column_name")
                    .unwrap_or_else(|| "id".to_string()),
                on_delete: row
                    .str("delete_rule")
                    .as_deref()
                    .and_then(ReferentialAction::parse),
                on_update: row
                    .str("update_rule")
                    .as_deref()
                    .and_then(ReferentialAction::parse),
            });
        }
    }
    Ok(())
}
