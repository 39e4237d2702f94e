// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQL Server introspector
//!
//! Reads `sys.schemas` / `tables` / `columns` / `types` / `indexes` /
//! `index_columns` / `foreign_keys` / `foreign_key_columns` /
//! `extended_properties`. The textual `data_type` is assembled
//! server-side from the type name plus length/precision/scale through
//! expression builders, so the observed side matches what the DDL
//! renderer would emit.

use std::collections::BTreeMap;

use sqlmason_ast::{
    BinaryOp, CaseBranch, CaseExpr, Join, JoinKind, Operand, OrderBy, SelectColumn, SelectQuery,
    TableRef, and, column, eq, func, in_list, literal,
};
use sqlmason_compiler::{CompileError, SqlServerDialect};
use sqlmason_schema::{
    DatabaseColumn, DatabaseIndex, DatabaseSchema, DatabaseTable, DatabaseView,
    ObservedForeignKey, ReferentialAction,
};

use crate::error::CatalogResult;
use crate::executor::Executor;
use crate::introspect::{IntrospectOptions, run_catalog_query, should_include_table};

fn sys_table(name: &str, alias: &str) -> TableRef {
    TableRef::new(name).with_schema("sys").with_alias(alias)
}

fn schema_name(options: &IntrospectOptions) -> String {
    options.schema.clone().unwrap_or_else(|| "dbo".to_string())
}

fn cast_varchar(operand: Operand) -> Operand {
    Operand::Cast {
        expr: Box::new(operand),
        type_name: "VARCHAR(10)".to_string(),
    }
}

/// `CASE` + `CONCAT` expression producing `nvarchar(50)`, `decimal(10,2)`,
/// `nvarchar(MAX)`, or the bare type name.
fn data_type_operand() -> Operand {
    let type_name = column("ty", "name");
    let max_length = column("c", "max_length");
    let wide_length = Operand::Arithmetic {
        left: Box::new(column("c", "max_length")),
        op: BinaryOp::Div,
        right: Box::new(literal(2)),
    };

    let length_or_max = |length: Operand| Operand::Case(Box::new(CaseExpr {
        branches: vec![CaseBranch {
            when: eq(column("c", "max_length"), literal(-1)),
            then: literal("MAX"),
        }],
        else_value: Some(cast_varchar(length)),
    }));

    let concat_with_length = |length: Operand| {
        Operand::from(func(
            "CONCAT",
            vec![
                type_name.clone(),
                literal("("),
                length_or_max(length),
                literal(")"),
            ],
        ))
    };

    Operand::Case(Box::new(CaseExpr {
        branches: vec![
            CaseBranch {
                // National types report byte length; divide by two.
                when: in_list(
                    column("ty", "name"),
                    vec![literal("nvarchar"), literal("nchar")],
                ),
                then: concat_with_length(wide_length),
            },
            CaseBranch {
                when: in_list(
                    column("ty", "name"),
                    vec![
                        literal("varchar"),
                        literal("char"),
                        literal("varbinary"),
                        literal("binary"),
                    ],
                ),
                then: concat_with_length(max_length),
            },
            CaseBranch {
                when: in_list(
                    column("ty", "name"),
                    vec![literal("decimal"), literal("numeric")],
                ),
                then: Operand::from(func(
                    "CONCAT",
                    vec![
                        type_name.clone(),
                        literal("("),
                        cast_varchar(column("c", "precision")),
                        literal(","),
                        cast_varchar(column("c", "scale")),
                        literal(")"),
                    ],
                )),
            },
        ],
        else_value: Some(type_name),
    }))
}

pub async fn introspect(
    executor: &dyn Executor,
    options: &IntrospectOptions,
) -> CatalogResult<DatabaseSchema> {
    let dialect = SqlServerDialect::new();
    let schema = schema_name(options);

    let tables_query = SelectQuery::from(sys_table("tables", "t"))
        .inner_join(
            sys_table("schemas", "s"),
            eq(column("s", "schema_id"), column("t", "schema_id")),
        )
        .select_as(vec![
            SelectColumn::new(column("t", "name")).with_alias("table_name"),
        ])
        .with_where(eq(column("s", "name"), literal(schema.clone())))
        .order_by(OrderBy::asc(column("t", "name")));
    let table_rows = run_catalog_query(executor, &dialect, "sys.tables", &tables_query).await?;

    let mut result = DatabaseSchema::default();
    let mut tables: BTreeMap<String, DatabaseTable> = BTreeMap::new();
    for row in table_rows.rows() {
        let Some(name) = row.str("table_name") else { continue };
        if !should_include_table(&name, options) {
            continue;
        }
        tables.insert(
            name.to_lowercase(),
            DatabaseTable::new(name).with_schema(schema.clone()),
        );
    }

    if options.include_views {
        let views_query = SelectQuery::from(sys_table("views", "v"))
            .inner_join(
                sys_table("schemas", "s"),
                eq(column("s", "schema_id"), column("v", "schema_id")),
            )
            .select_as(vec![
                SelectColumn::new(column("v", "name")).with_alias("view_name"),
            ])
            .with_where(eq(column("s", "name"), literal(schema.clone())))
            .order_by(OrderBy::asc(column("v", "name")));
        let view_rows = run_catalog_query(executor, &dialect, "sys.views", &views_query).await?;
        for row in view_rows.rows() {
            if let Some(name) = row.str("view_name") {
                result.views.push(DatabaseView {
                    name,
                    schema: Some(schema.clone()),
                    definition: None,
                });
            }
        }
    }

    read_columns(executor, &dialect, &schema, &mut tables).await?;
    read_indexes(executor, &dialect, &schema, &mut tables).await?;
    read_foreign_keys(executor, &dialect, &schema, &mut tables).await?;

    result.tables.extend(tables.into_values());
    Ok(result)
}

async fn read_columns(
    executor: &dyn Executor,
    dialect: &SqlServerDialect,
    schema: &str,
    tables: &mut BTreeMap<String, DatabaseTable>,
) -> CatalogResult<()> {
    let default_join = and(vec![
        eq(column("dc", "parent_object_id"), column("c", "object_id")),
        eq(column("dc", "parent_column_id"), column("c", "column_id")),
    ])
    .map_err(CompileError::from)?;
    let comment_join = and(vec![
        eq(column("ep", "major_id"), column("c", "object_id")),
        eq(column("ep", "minor_id"), column("c", "column_id")),
        eq(column("ep", "name"), literal("MS_Description")),
    ])
    .map_err(CompileError::from)?;

    let query = SelectQuery::from(sys_table("columns", "c"))
        .inner_join(
            sys_table("tables", "t"),
            eq(column("t", "object_id"), column("c", "object_id")),
        )
        .inner_join(
            sys_table("schemas", "s"),
            eq(column("s", "schema_id"), column("t", "schema_id")),
        )
        .inner_join(
            sys_table("types", "ty"),
            eq(column("ty", "user_type_id"), column("c", "user_type_id")),
        )
        .join(Join::new(
            JoinKind::Left,
            sys_table("default_constraints", "dc"),
            default_join,
        ))
        .join(Join::new(
            JoinKind::Left,
            sys_table("extended_properties", "ep"),
            comment_join,
        ))
        .select_as(vec![
            SelectColumn::new(column("t", "name")).with_alias("table_name"),
            SelectColumn::new(column("c", "name")).with_alias("column_name"),
            SelectColumn::new(data_type_operand()).with_alias("data_type"),
            SelectColumn::new(column("c", "is_nullable")).with_alias("is_nullable"),
            SelectColumn::new(column("c", "is_identity")).with_alias("is_identity"),
            SelectColumn::new(column("dc", "definition")).with_alias("default_value"),
            SelectColumn::new(column("ep", "value")).with_alias("comment"),
        ])
        .with_where(eq(column("s", "name"), literal(schema)))
        .with_order_by(vec![
            OrderBy::asc(column("t", "name")),
            OrderBy::asc(column("c", "column_id")),
        ]);
    let rows = run_catalog_query(executor, dialect, "sys.columns", &query).await?;

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
            row.str("data_type").unwrap_or_else(|| "nvarchar".to_string()),
        );
        if !row.bool("is_nullable").unwrap_or(true) {
            col = col.not_null();
        }
        if row.bool("is_identity").unwrap_or(false) {
            col = col.auto_increment();
        }
        if let Some(default) = row.str("default_value") {
            col = col.with_default(default);
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
    dialect: &SqlServerDialect,
    schema: &str,
    tables: &mut BTreeMap<String, DatabaseTable>,
) -> CatalogResult<()> {
    let index_columns_join = and(vec![
        eq(column("icol", "object_id"), column("i", "object_id")),
        eq(column("icol", "index_id"), column("i", "index_id")),
    ])
    .map_err(CompileError::from)?;
    let columns_join = and(vec![
        eq(column("col", "object_id"), column("icol", "object_id")),
        eq(column("col", "column_id"), column("icol", "column_id")),
    ])
    .map_err(CompileError::from)?;

    let query = SelectQuery::from(sys_table("indexes", "i"))
        .inner_join(
            sys_table("tables", "t"),
            eq(column("t", "object_id"), column("i", "object_id")),
        )
        .inner_join(
            sys_table("schemas", "s"),
            eq(column("s", "schema_id"), column("t", "schema_id")),
        )
        .join(Join::new(
            JoinKind::Inner,
            sys_table("index_columns", "icol"),
            index_columns_join,
        ))
        .join(Join::new(JoinKind::Inner, sys_table("columns", "col"), columns_join))
        .select_as(vec![
            SelectColumn::new(column("t", "name")).with_alias("table_name"),
            SelectColumn::new(column("i", "name")).with_alias("index_name"),
            SelectColumn::new(column("i", "is_unique")).with_alias("is_unique"),
            SelectColumn::new(column("i", "is_primary_key")).with_alias("is_primary"),
            SelectColumn::new(column("i", "filter_definition")).with_alias("predicate"),
            SelectColumn::new(column("col", "name")).with_alias("column_name"),
        ])
        .with_where(
            and(vec![
                eq(column("s", "name"), literal(schema)),
                sqlmason_ast::is_not_null(column("i", "name")),
            ])
            .map_err(CompileError::from)?,
        )
        .with_order_by(vec![
            OrderBy::asc(column("t", "name")),
            OrderBy::asc(column("i", "name")),
            OrderBy::asc(column("icol", "key_ordinal")),
        ]);
    let rows = run_catalog_query(executor, dialect, "sys.indexes", &query).await?;

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

fn normalize_action(description: &str) -> Option<ReferentialAction> {
    ReferentialAction::parse(&description.replace('_', " "))
}

async fn read_foreign_keys(
    executor: &dyn Executor,
    dialect: &SqlServerDialect,
    schema: &str,
    tables: &mut BTreeMap<String, DatabaseTable>,
) -> CatalogResult<()> {
    let parent_column_join = and(vec![
        eq(column("pc", "object_id"), column("fkc", "parent_object_id")),
        eq(column("pc", "column_id"), column("fkc", "parent_column_id")),
    ])
    .map_err(CompileError::from)?;
    let referenced_column_join = and(vec![
        eq(
            column("rcol", "object_id"),
            column("fkc", "referenced_object_id"),
        ),
        eq(
            column("rcol", "column_id"),
            column("fkc", "referenced_column_id"),
        ),
    ])
    .map_err(CompileError::from)?;

    let query = SelectQuery::from(sys_table("foreign_keys", "fk"))
        .inner_join(
            sys_table("tables", "pt"),
            eq(column("pt", "object_id"), column("fk", "parent_object_id")),
        )
        .inner_join(
            sys_table("schemas", "s"),
            eq(column("s", "schema_id"), column("pt", "schema_id")),
        )
        .inner_join(
            sys_table("tables", "rt"),
            eq(column("rt", "object_id"), column("fk", "referenced_object_id")),
        )
        .inner_join(
            sys_table("foreign_key_columns", "fkc"),
            eq(column("fkc", "constraint_object_id"), column("fk", "object_id")),
        )
        .join(Join::new(JoinKind::Inner, sys_table("columns", "pc"), parent_column_join))
        .join(Join::new(
            JoinKind::Inner,
            sys_table("columns", "rcol"),
            referenced_column_join,
        ))
        .select_as(vec![
            SelectColumn::new(column("pt", "name")).with_alias("table_name"),
            SelectColumn::new(column("pc", "name")).with_alias("column_name"),
            SelectColumn::new(column("rt", "name")).with_alias("referenced_table"),
            SelectColumn::new(column("rcol", "name")).with_alias("referenced_column"),
            SelectColumn::new(column("fk", "delete_referential_action_desc"))
                .with_alias("on_delete"),
            SelectColumn::new(column("fk", "update_referential_action_desc"))
                .with_alias("on_update"),
        ])
        .with_where(eq(column("s", "name"), literal(schema)));
    let rows = run_catalog_query(executor, dialect, "sys.foreign_keys", &query).await?;

    for row in rows.rows() {
        let (Some(table_name), Some(column_name), Some(referenced_table)) = (
            row.str("table_name"),
            row.str("column_name"),
            row.str("referenced_table"),
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
                table: referenced_table,
                column: row
                    .str("referenced_column")
                    .unwrap_or_else(|| "id".to_string()),
                on_delete: row.str("on_delete").as_deref().and_then(normalize_action),
                on_update: row.str("on_update").as_deref().and_then(normalize_action),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlmason_compiler::Dialect;

    #[test]
    fn test_normalize_action_descriptions() {
        assert_eq!(normalize_action("CASCADE"), Some(ReferentialAction::Cascade));
        assert_eq!(
            normalize_action("NO_ACTION"),
            Some(ReferentialAction::NoAction)
        );
        assert_eq!(normalize_action("SET_NULL"), Some(ReferentialAction::SetNull));
    }

    #[test]
    fn test_data_type_operand_compiles() {
        let query = SelectQuery::from(sys_table("columns", "c"))
            .inner_join(
                sys_table("types", "ty"),
                eq(column("ty", "user_type_id"), column("c", "user_type_id")),
            )
            .select_as(vec![
                SelectColumn::new(data_type_operand()).with_alias("data_type"),
            ]);
        let statement = SqlServerDialect::new().compile_select(&query).unwrap();
        assert!(statement.sql.contains("CASE WHEN [ty].[name] IN ("), "{}", statement.sql);
        assert!(statement.sql.contains("CONCAT("), "{}", statement.sql);
        assert!(statement.sql.contains("ELSE [ty].[name] END"), "{}", statement.sql);
    }
}
