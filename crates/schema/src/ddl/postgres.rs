// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! PostgreSQL schema adapter

use sqlmason_ast::DialectName;
use sqlmason_compiler::{Dialect, PostgresDialect};

use crate::database::DatabaseTable;
use crate::ddl::{
    AlterColumn, SchemaDialect, canonical_type, qualified_table, quote, render_default,
    render_index_statement, render_references, table_name, validate_table,
};
use crate::def::{ColumnDef, ColumnType, GeneratedKind, TableDef, TypeArg};
use crate::diff::ColumnDiff;
use crate::error::SchemaResult;

pub struct PostgresSchemaDialect {
    compiler: PostgresDialect,
}

impl PostgresSchemaDialect {
    pub fn new() -> Self {
        Self {
            compiler: PostgresDialect::new(),
        }
    }

    fn identity_clause(column: &ColumnDef) -> &'static str {
        match column.generated {
            Some(GeneratedKind::Always) => "GENERATED ALWAYS AS IDENTITY",
            _ => "GENERATED BY DEFAULT AS IDENTITY",
        }
    }

    fn render_column(&self, column: &ColumnDef) -> SchemaResult<String> {
        let name = quote(self, &column.name)?;
        let mut sql = format!("{name} {}", self.column_type_sql(column)?);
        if column.column_type == ColumnType::Enum && column.dialect_type_override(self.name()).is_none() {
            let values = column
                .args
                .iter()
                .filter_map(TypeArg::as_str)
                .map(|v| format!("'{}'", v.replace('\'', "''")))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" CHECK ({name} IN ({values}))"));
        }
        if let Some(collation) = &column.collation {
            sql.push_str(" COLLATE ");
            sql.push_str(&quote(self, collation)?);
        }
        if column.effective_not_null() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&render_default(self, default));
        }
        if column.auto_increment {
            sql.push(' ');
            sql.push_str(Self::identity_clause(column));
        }
        if let Some(references) = render_references(self, column)? {
            sql.push(' ');
            sql.push_str(&references);
        }
        Ok(sql)
    }
}

impl Default for PostgresSchemaDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDialect for PostgresSchemaDialect {
    fn name(&self) -> DialectName {
        DialectName::Postgres
    }

    fn compiler(&self) -> &dyn Dialect {
        &self.compiler
    }

    fn column_type_sql(&self, column: &ColumnDef) -> SchemaResult<String> {
        if let Some(override_type) = column.dialect_type_override(self.name()) {
            return Ok(override_type.to_string());
        }
        let sql = match column.column_type {
            ColumnType::Int => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Uuid => "UUID".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Json => "JSONB".to_string(),
            ColumnType::Varchar => match column.args.first().and_then(TypeArg::as_int) {
                Some(length) => format!("VARCHAR({length})"),
                None => "VARCHAR".to_string(),
            },
            ColumnType::Text | ColumnType::Enum => "TEXT".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::TimestampTz => "TIMESTAMPTZ".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Decimal => match (
                column.args.first().and_then(TypeArg::as_int),
                column.args.get(1).and_then(TypeArg::as_int),
            ) {
                (Some(precision), Some(scale)) => format!("NUMERIC({precision},{scale})"),
                (Some(precision), None) => format!("NUMERIC({precision})"),
                _ => "NUMERIC".to_string(),
            },
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "DOUBLE PRECISION".to_string(),
            ColumnType::Blob => "BYTEA".to_string(),
        };
        Ok(sql)
    }

    fn render_create_table(&self, table: &TableDef) -> SchemaResult<Vec<String>> {
        validate_table(table)?;
        let name = table_name(self, table)?;
        let mut parts = Vec::with_capacity(table.columns.len() + 1);
        for column in &table.columns {
            parts.push(self.render_column(column)?);
        }
        let pk = table.primary_key_columns();
        if !pk.is_empty() {
            let cols = pk
                .iter()
                .map(|c| quote(self, &c.name))
                .collect::<SchemaResult<Vec<_>>>()?
                .join(", ");
            parts.push(format!("PRIMARY KEY ({cols})"));
        }
        let mut statements = vec![format!("CREATE TABLE {name} ({})", parts.join(", "))];

        if let Some(comment) = &table.comment {
            statements.push(format!(
                "COMMENT ON TABLE {name} IS '{}'",
                comment.replace('\'', "''")
            ));
        }
        for column in &table.columns {
            if let Some(comment) = &column.comment {
                statements.push(format!(
                    "COMMENT ON COLUMN {name}.{} IS '{}'",
                    quote(self, &column.name)?,
                    comment.replace('\'', "''")
                ));
            }
        }
        Ok(statements)
    }

    fn render_create_index(&self, table: &TableDef, index: &crate::def::IndexDef) -> SchemaResult<String> {
        render_index_statement(self, table, index)
    }

    fn render_drop_table(&self, table: &DatabaseTable) -> SchemaResult<String> {
        Ok(format!(
            "DROP TABLE {}",
            qualified_table(self, table.schema.as_deref(), &table.name)?
        ))
    }

    fn render_add_column(&self, table: &TableDef, column: &ColumnDef) -> SchemaResult<String> {
        Ok(format!(
            "ALTER TABLE {} ADD COLUMN {}",
            table_name(self, table)?,
            self.render_column(column)?
        ))
    }

    fn render_drop_column(&self, table: &TableDef, column_name: &str) -> SchemaResult<String> {
        Ok(format!(
            "ALTER TABLE {} DROP COLUMN {}",
            table_name(self, table)?,
            quote(self, column_name)?
        ))
    }

    fn render_alter_column(
        &self,
        table: &TableDef,
        column: &ColumnDef,
        diff: &ColumnDiff,
    ) -> SchemaResult<AlterColumn> {
        let table_sql = table_name(self, table)?;
        let column_sql = quote(self, &column.name)?;
        let mut result = AlterColumn::default();

        if diff.type_changed {
            result.statements.push(format!(
                "ALTER TABLE {table_sql} ALTER COLUMN {column_sql} TYPE {}",
                self.column_type_sql(column)?
            ));
        }
        if diff.default_changed {
            match &column.default {
                Some(default) => result.statements.push(format!(
                    "ALTER TABLE {table_sql} ALTER COLUMN {column_sql} SET DEFAULT {}",
                    render_default(self, default)
                )),
                None => result.statements.push(format!(
                    "ALTER TABLE {table_sql} ALTER COLUMN {column_sql} DROP DEFAULT"
                )),
            }
        }
        if diff.nullability_changed {
            if column.effective_not_null() {
                result.statements.push(format!(
                    "ALTER TABLE {table_sql} ALTER COLUMN {column_sql} SET NOT NULL"
                ));
            } else {
                result.statements.push(format!(
                    "ALTER TABLE {table_sql} ALTER COLUMN {column_sql} DROP NOT NULL"
                ));
            }
        }
        if diff.auto_increment_changed {
            result.warnings.push(format!(
                "column {}.{} identity change requires a manual migration on postgres",
                table.name, column.name
            ));
        }
        Ok(result)
    }

    fn render_drop_index(&self, table: &TableDef, index_name: &str) -> SchemaResult<String> {
        let name = match &table.schema {
            Some(schema) => format!("{}.{}", quote(self, schema)?, quote(self, index_name)?),
            None => quote(self, index_name)?,
        };
        Ok(format!("DROP INDEX {name}"))
    }

    fn type_equivalent(&self, column: &ColumnDef, observed_type: &str) -> bool {
        let Ok(expected) = self.column_type_sql(column) else {
            return false;
        };
        canonical_type(&expected) == canonical_type(observed_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::col;

    #[test]
    fn test_create_table_shape() {
        let table = TableDef::new("users")
            .column(col::big_int("id").primary_key().auto_increment())
            .column(col::varchar("name", 255).not_null());
        let statements = PostgresSchemaDialect::new()
            .render_create_table(&table)
            .unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0],
            "CREATE TABLE \"users\" (\
             \"id\" BIGINT NOT NULL GENERATED BY DEFAULT AS IDENTITY, \
             \"name\" VARCHAR(255) NOT NULL, \
             PRIMARY KEY (\"id\"))"
        );
    }

    #[test]
    fn test_enum_renders_check_constraint() {
        let dialect = PostgresSchemaDialect::new();
        let table = TableDef::new("jobs")
            .column(col::enumeration("status", vec!["queued", "done"]).not_null());
        let statements = dialect.render_create_table(&table).unwrap();
        assert!(
            statements[0].contains("\"status\" TEXT CHECK (\"status\" IN ('queued', 'done'))"),
            "{}",
            statements[0]
        );
    }

    #[test]
    fn test_comments_emitted_as_statements() {
        let table = TableDef::new("users")
            .column(col::int("id").primary_key().with_comment("surrogate key"))
            .with_comment("application users");
        let statements = PostgresSchemaDialect::new()
            .render_create_table(&table)
            .unwrap();
        assert_eq!(statements.len(), 3);
        assert_eq!(
            statements[1],
            "COMMENT ON TABLE \"users\" IS 'application users'"
        );
        assert_eq!(
            statements[2],
            "COMMENT ON COLUMN \"users\".\"id\" IS 'surrogate key'"
        );
    }

    #[test]
    fn test_type_equivalence_synonyms() {
        let dialect = PostgresSchemaDialect::new();
        assert!(dialect.type_equivalent(&col::int("a"), "int4"));
        assert!(dialect.type_equivalent(&col::varchar("a", 255), "character varying(255)"));
        assert!(dialect.type_equivalent(&col::decimal("a", 10, 2), "numeric(10,2)"));
        assert!(!dialect.type_equivalent(&col::int("a"), "bigint"));
    }

    #[test]
    fn test_alter_column_emits_separate_statements() {
        let dialect = PostgresSchemaDialect::new();
        let table = TableDef::new("t").column(col::big_int("n").not_null());
        let column = table.column_by_key("n").unwrap();
        let alter = dialect
            .render_alter_column(
                &table,
                column,
                &ColumnDiff {
                    type_changed: true,
                    nullability_changed: true,
                    default_changed: false,
                    auto_increment_changed: false,
                },
            )
            .unwrap();
        assert_eq!(
            alter.statements,
            vec![
                "ALTER TABLE \"t\" ALTER COLUMN \"n\" TYPE BIGINT",
                "ALTER TABLE \"t\" ALTER COLUMN \"n\" SET NOT NULL",
            ]
        );
        assert!(alter.warnings.is_empty());
    }
}
