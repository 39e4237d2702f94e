// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! PostgreSQL introspector
//!
//! Reads the `pg_catalog` relations directly: `pg_class` / `pg_namespace`
//! for the table list, `pg_attribute` + `pg_attrdef` + `pg_description` for
//! columns, `pg_index` for primary keys and indexes, and `pg_constraint`
//! for foreign keys. Formatted types (`format_type`), default expressions
//! (`pg_get_expr`) and constraint definitions (`pg_get_constraintdef`) are
//! rendered server-side.

use std::collections::BTreeMap;

use sqlmason_ast::{
    Join, JoinKind, Operand, OrderBy, SelectColumn, SelectQuery, TableRef, and, column, eq, func,
    gt, in_list, literal,
};
use sqlmason_compiler::{CompileError, PostgresDialect};
use sqlmason_schema::{
    DatabaseColumn, DatabaseIndex, DatabaseSchema, DatabaseTable, DatabaseView,
    ObservedForeignKey, ReferentialAction,
};

use crate::error::CatalogResult;
use crate::executor::Executor;
use crate::introspect::{IntrospectOptions, run_catalog_query, should_include_table};

fn pg_table(name: &str, alias: &str) -> TableRef {
    TableRef::new(name).with_schema("pg_catalog").with_alias(alias)
}

fn schema_name(options: &IntrospectOptions) -> String {
    options.schema.clone().unwrap_or_else(|| "public".to_string())
}

fn call(name: &str, args: Vec<Operand>) -> Operand {
    Operand::from(func(name, args))
}

pub async fn introspect(
    executor: &dyn Executor,
    options: &IntrospectOptions,
) -> CatalogResult<DatabaseSchema> {
    let dialect = PostgresDialect::new();
    let schema = schema_name(options);

    let mut kinds = vec![literal("r")];
    if options.include_views {
        kinds.push(literal("v"));
    }
    let tables_query = SelectQuery::from(pg_table("pg_class", "c"))
        .inner_join(
            pg_table("pg_namespace", "n"),
            eq(column("n", "oid"), column("c", "relnamespace")),
        )
        .select_as(vec![
            SelectColumn::new(column("c", "relname")),
            SelectColumn::new(column("c", "relkind")),
            SelectColumn::new(call(
                "obj_description",
                vec![column("c", "oid"), literal("pg_class")],
            ))
            .with_alias("table_comment"),
        ])
        .with_where(
            and(vec![
                eq(column("n", "nspname"), literal(schema.clone())),
                in_list(column("c", "relkind"), kinds),
            ])
            .map_err(CompileError::from)?,
        )
        .order_by(OrderBy::asc(column("c", "relname")));
    let table_rows = run_catalog_query(executor, &dialect, "pg_class", &tables_query).await?;

    let mut result = DatabaseSchema::default();
    let mut tables: BTreeMap<String, DatabaseTable> = BTreeMap::new();
    for row in table_rows.rows() {
        let Some(name) = row.str("relname") else { continue };
        if row.str("relkind").as_deref() == Some("v") {
            result.views.push(DatabaseView {
                name,
                schema: Some(schema.clone()),
                definition: None,
            });
            continue;
        }
        if !should_include_table(&name, options) {
            continue;
        }
        let mut table = DatabaseTable::new(name.clone()).with_schema(schema.clone());
        if let Some(comment) = row.str("table_comment") {
            table = table.with_comment(comment);
        }
        tables.insert(name.to_lowercase(), table);
    }

    read_columns(executor, &dialect, &schema, &mut tables).await?;
    read_indexes(executor, &dialect, &schema, &mut tables).await?;
    read_foreign_keys(executor, &dialect, &schema, &mut tables).await?;

    result.tables.extend(tables.into_values());
    Ok(result)
}

async fn read_columns(
    executor: &dyn Executor,
    dialect: &PostgresDialect,
    schema: &str,
    tables: &mut BTreeMap<String, DatabaseTable>,
) -> CatalogResult<()> {
    let default_join = and(vec![
        eq(column("d", "adrelid"), column("a", "attrelid")),
        eq(column("d", "adnum"), column("a", "attnum")),
    ])
    .map_err(CompileError::from)?;
    let description_join = and(vec![
        eq(column("ds", "objoid"), column("a", "attrelid")),
        eq(column("ds", "objsubid"), column("a", "attnum")),
    ])
    .map_err(CompileError::from)?;

    let query = SelectQuery::from(pg_table("pg_attribute", "a"))
        .inner_join(
            pg_table("pg_class", "c"),
            eq(column("c", "oid"), column("a", "attrelid")),
        )
        .inner_join(
            pg_table("pg_namespace", "n"),
            eq(column("n", "oid"), column("c", "relnamespace")),
        )
        .join(Join::new(JoinKind::Left, pg_table("pg_attrdef", "d"), default_join))
        .join(Join::new(
            JoinKind::Left,
            pg_table("pg_description", "ds"),
            description_join,
        ))
        .select_as(vec![
            SelectColumn::new(column("c", "relname")).with_alias("table_name"),
            SelectColumn::new(column("a", "attname")).with_alias("column_name"),
            SelectColumn::new(call(
                "format_type",
                vec![column("a", "atttypid"), column("a", "atttypmod")],
            ))
            .with_alias("data_type"),
            SelectColumn::new(column("a", "attnotnull")).with_alias("not_null"),
            SelectColumn::new(column("a", "attidentity")).with_alias("identity"),
            SelectColumn::new(call(
                "pg_get_expr",
                vec![column("d", "adbin"), column("d", "adrelid")],
            ))
            .with_alias("default_value"),
            SelectColumn::new(column("ds", "description")).with_alias("comment"),
        ])
        .with_where(
            and(vec![
                eq(column("n", "nspname"), literal(schema)),
                gt(column("a", "attnum"), literal(0)),
                eq(column("a", "attisdropped"), literal(false)),
            ])
            .map_err(CompileError::from)?,
        )
        .with_order_by(vec![
            OrderBy::asc(column("c", "relname")),
            OrderBy::asc(column("a", "attnum")),
        ]);
    let rows = run_catalog_query(executor, dialect, "pg_attribute", &query).await?;

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
            column_name,
            row.str("data_type").unwrap_or_else(|| "text".to_string()),
        );
        if row.bool("not_null").unwrap_or(false) {
            col = col.not_null();
        }
        if let Some(default) = row.str("default_value") {
            // Serial columns surface as nextval() defaults.
            if default.starts_with("nextval(") {
                col = col.auto_increment();
            } else {
                col = col.with_default(default);
            }
        }
        if matches!(row.str("identity").as_deref(), Some("a") | Some("d")) {
            col = col.auto_increment();
        }
        if let Some(comment) = row.str("comment") {
            col = col.with_comment(comment);
        }
        table.columns.push(col);
    }
    Ok(())
}

async fn read_indexes(
    executor: &dyn Executor,
    dialect: &PostgresDialect,
    schema: &str,
    tables: &mut BTreeMap<String, DatabaseTable>,
) -> CatalogResult<()> {
    let query = SelectQuery::from(pg_table("pg_index", "i"))
        .inner_join(
            pg_table("pg_class", "ic"),
            eq(column("ic", "oid"), column("i", "indexrelid")),
        )
        .inner_join(
            pg_table("pg_class", "tc"),
            eq(column("tc", "oid"), column("i", "indrelid")),
        )
        .inner_join(
            pg_table("pg_namespace", "n"),
            eq(column("n", "oid"), column("tc", "relnamespace")),
        )
        .inner_join(
            pg_table("pg_attribute", "a"),
            eq(column("a", "attrelid"), column("i", "indexrelid")),
        )
        .select_as(vec![
            SelectColumn::new(column("tc", "relname")).with_alias("table_name"),
            SelectColumn::new(column("ic", "relname")).with_alias("index_name"),
            SelectColumn::new(column("i", "indisunique")).with_alias("is_unique"),
            SelectColumn::new(column("i", "indisprimary")).with_alias("is_primary"),
            SelectColumn::new(column("a", "attname")).with_alias("column_name"),
            SelectColumn::new(call(
                "pg_get_expr",
                vec![column("i", "indpred"), column("i", "indrelid")],
            ))
            .with_alias("predicate"),
        ])
        .with_where(eq(column("n", "nspname"), literal(schema)))
        .with_order_by(vec![
            OrderBy::asc(column("tc", "relname")),
            OrderBy::asc(column("ic", "relname")),
            OrderBy::asc(column("a", "attnum")),
        ]);
    let rows = run_catalog_query(executor, dialect, "pg_index", &query).await?;

    // Rows arrive one per index column; fold them into indexes.
    let mut grouped: BTreeMap<(String, String), DatabaseIndex> = BTreeMap::new();
    let mut primaries: Vec<(String, String)> = Vec::new();
    for row in rows.rows() {
        let (Some(table_name), Some(index_name), Some(column_name)) = (
            row.str("table_name"),
            row.str("index_name"),
            row.str("column_name"),
        ) else {
            continue;
        };
        let is_primary = row.bool("is_primary").unwrap_or(false);
        if is_primary {
            primaries.push((table_name.to_lowercase(), column_name.clone()));
        }
        let entry = grouped
            .entry((table_name.to_lowercase(), index_name.clone()))
            .or_insert_with(|| {
                let mut index = DatabaseIndex::new(index_name.clone(), Vec::new());
                if row.bool("is_unique").unwrap_or(false) {
                    index = index.unique();
                }
                if is_primary {
                    index = index.primary();
                }
                if let Some(predicate) = row.str("predicate") {
                    index = index.with_where(predicate);
                }
                index
            });
        entry.columns.push(column_name);
    }

    for ((table_name, _), index) in grouped {
        if let Some(table) = tables.get_mut(&table_name) {
            table.indexes.push(index);
        }
    }
    for (table_name, column_name) in primaries {
        if let Some(table) = tables.get_mut(&table_name) {
            table.primary_key.push(column_name);
        }
    }
    Ok(())
}

/// Pull the local and referenced column names out of a
/// `pg_get_constraintdef` rendering like
/// `FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE`.
fn parse_fk_definition(definition: &str) -> Option<(String, String)> {
    let open = definition.find('(')?;
    let close = definition[open + 1..].find(')')? + open + 1;
    let local = definition[open + 1..close].split(',').next()?.trim().to_string();

    let references_at = definition.find("REFERENCES")?;
    let ref_open = definition[references_at..].find('(')? + references_at;
    let ref_close = definition[ref_open + 1..].find(')')? + ref_open + 1;
    let referenced = definition[ref_open + 1..ref_close]
        .split(',')
        .next()?
        .trim()
        .to_string();
    Some((local, referenced))
}

fn action_from_char(code: &str) -> Option<ReferentialAction> {
    match code {
        "a" => Some(ReferentialAction::NoAction),
        "r" => Some(ReferentialAction::Restrict),
        "c" => Some(ReferentialAction::Cascade),
        "n" => Some(ReferentialAction::SetNull),
        "d" => Some(ReferentialAction::SetDefault),
        _ => None,
    }
}

async fn read_foreign_keys(
    executor: &dyn Executor,
    dialect: &PostgresDialect,
    schema: &str,
    tables: &mut BTreeMap<String, DatabaseTable>,
) -> CatalogResult<()> {
    let query = SelectQuery::from(pg_table("pg_constraint", "con"))
        .inner_join(
            pg_table("pg_class", "c"),
            eq(column("c", "oid"), column("con", "conrelid")),
        )
        .inner_join(
            pg_table("pg_class", "rc"),
            eq(column("rc", "oid"), column("con", "confrelid")),
        )
        .inner_join(
            pg_table("pg_namespace", "n"),
            eq(column("n", "oid"), column("con", "connamespace")),
        )
        .select_as(vec![
            SelectColumn::new(column("c", "relname")).with_alias("table_name"),
            SelectColumn::new(column("rc", "relname")).with_alias("referenced_table"),
            SelectColumn::new(column("con", "confdeltype")).with_alias("on_delete"),
            SelectColumn::new(column("con", "confupdtype")).with_alias("on_update"),
            SelectColumn::new(call("pg_get_constraintdef", vec![column("con", "oid")]))
                .with_alias("definition"),
        ])
        .with_where(
            and(vec![
                eq(column("con", "contype"), literal("f")),
                eq(column("n", "nspname"), literal(schema)),
            ])
            .map_err(CompileError::from)?,
        );
    let rows = run_catalog_query(executor, dialect, "pg_constraint", &query).await?;

    for row in rows.rows() {
        let (Some(table_name), Some(referenced_table), Some(definition)) = (
            row.str("table_name"),
            row.str("referenced_table"),
            row.str("definition"),
        ) else {
            continue;
        };
        let Some((local, referenced)) = parse_fk_definition(&definition) else {
            continue;
        };
        let Some(table) = tables.get_mut(&table_name.to_lowercase()) else {
            continue;
        };
        if let Some(col) = table
            .columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(&local))
        {
            col.references = Some(ObservedForeignKey {
                table: referenced_table,
                column: referenced,
                on_delete: row.str("on_delete").as_deref().and_then(action_from_char),
                on_update: row.str("on_update").as_deref().and_then(action_from_char),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fk_definition() {
        let (local, referenced) = parse_fk_definition(
            "FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE",
        )
        .unwrap();
        assert_eq!(local, "user_id");
        assert_eq!(referenced, "id");
    }

    #[test]
    fn test_parse_fk_definition_malformed() {
        assert!(parse_fk_definition("CHECK (x > 0)").is_none());
    }

    #[test]
    fn test_action_codes() {
        assert_eq!(action_from_char("c"), Some(ReferentialAction::Cascade));
        assert_eq!(action_from_char("n"), Some(ReferentialAction::SetNull));
        assert_eq!(action_from_char("x"), None);
    }
}
