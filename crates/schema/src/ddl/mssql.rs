// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQL Server schema adapter

use sqlmason_ast::DialectName;
use sqlmason_compiler::{Dialect, SqlServerDialect};

use crate::database::DatabaseTable;
use crate::ddl::{
    AlterColumn, SchemaDialect, canonical_type, qualified_table, quote, render_default,
    render_index_statement, render_references, table_name, validate_table,
};
use crate::def::{ColumnDef, ColumnType, TableDef, TypeArg};
use crate::diff::ColumnDiff;
use crate::error::SchemaResult;

pub struct SqlServerSchemaDialect {
    compiler: SqlServerDialect,
}

impl SqlServerSchemaDialect {
    pub fn new() -> Self {
        Self {
            compiler: SqlServerDialect::new(),
        }
    }

    fn render_column(&self, column: &ColumnDef) -> SchemaResult<String> {
        let mut sql = format!(
            "{} {}",
            quote(self, &column.name)?,
            self.column_type_sql(column)?
        );
        if let Some(collation) = &column.collation {
            sql.push_str(" COLLATE ");
            sql.push_str(collation);
        }
        if column.effective_not_null() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&render_default(self, default));
        }
        if column.auto_increment {
            sql.push_str(" IDENTITY(1,1)");
        }
        if let Some(references) = render_references(self, column)? {
            sql.push(' ');
            sql.push_str(&references);
        }
        Ok(sql)
    }
}

impl Default for SqlServerSchemaDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDialect for SqlServerSchemaDialect {
    fn name(&self) -> DialectName {
        DialectName::SqlServer
    }

    fn compiler(&self) -> &dyn Dialect {
        &self.compiler
    }

    fn column_type_sql(&self, column: &ColumnDef) -> SchemaResult<String> {
        if let Some(override_type) = column.dialect_type_override(self.name()) {
            return Ok(override_type.to_string());
        }
        let sql = match column.column_type {
            ColumnType::Int => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::Uuid => "UNIQUEIDENTIFIER".to_string(),
            ColumnType::Boolean => "BIT".to_string(),
            ColumnType::Json | ColumnType::Text => "NVARCHAR(MAX)".to_string(),
            ColumnType::Varchar => match column.args.first().and_then(TypeArg::as_int) {
                Some(length) => format!("NVARCHAR({length})"),
                None => "NVARCHAR(255)".to_string(),
            },
            ColumnType::Timestamp | ColumnType::TimestampTz => "DATETIME2".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Decimal => match (
                column.args.first().and_then(TypeArg::as_int),
                column.args.get(1).and_then(TypeArg::as_int),
            ) {
                (Some(precision), Some(scale)) => format!("DECIMAL({precision},{scale})"),
                (Some(precision), None) => format!("DECIMAL({precision})"),
                _ => "DECIMAL".to_string(),
            },
            ColumnType::Float => "REAL".to_string(),
            ColumnType::Double => "FLOAT".to_string(),
            ColumnType::Blob => "VARBINARY(MAX)".to_string(),
            ColumnType::Enum => "NVARCHAR(255)".to_string(),
        };
        Ok(sql)
    }

    fn render_create_table(&self, table: &TableDef) -> SchemaResult<Vec<String>> {
        validate_table(table)?;
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
        Ok(vec![format!(
            "CREATE TABLE {} ({})",
            table_name(self, table)?,
            parts.join(", ")
        )])
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
            "ALTER TABLE {} ADD {}",
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
        let mut result = AlterColumn::default();
        if diff.type_changed || diff.nullability_changed {
            // Type and nullability are redefined together.
            let nullability = if column.effective_not_null() {
                "NOT NULL"
            } else {
                "NULL"
            };
            result.statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} {} {nullability}",
                table_name(self, table)?,
                quote(self, &column.name)?,
                self.column_type_sql(column)?
            ));
        }
        if diff.default_changed {
            result.warnings.push(format!(
                "column {}.{} default change requires dropping and re-adding the default constraint on mssql",
                table.name, column.name
            ));
        }
        if diff.auto_increment_changed {
            result.warnings.push(format!(
                "column {}.{} identity change requires a table rebuild on mssql",
                table.name, column.name
            ));
        }
        Ok(result)
    }

    fn render_drop_index(&self, table: &TableDef, index_name: &str) -> SchemaResult<String> {
        Ok(format!(
            "DROP INDEX {} ON {}",
            quote(self, index_name)?,
            table_name(self, table)?
        ))
    }

    fn type_equivalent(&self, column: &ColumnDef, observed_type: &str) -> bool {
        let Ok(expected) = self.column_type_sql(column) else {
            return false;
        };
        // NVARCHAR(MAX) and TEXT are interchangeable in catalogs.
        let normalize = |s: &str| {
            let canon = canonical_type(s);
            if canon == "nvarchar(max)" { "text".to_string() } else { canon }
        };
        normalize(&expected) == normalize(observed_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::col;

    #[test]
    fn test_create_table_identity() {
        let table = TableDef::new("users")
            .column(col::int("id").primary_key().auto_increment())
            .column(col::text("bio"));
        let statements = SqlServerSchemaDialect::new()
            .render_create_table(&table)
            .unwrap();
        assert_eq!(
            statements[0],
            "CREATE TABLE [users] (\
             [id] INT NOT NULL IDENTITY(1,1), \
             [bio] NVARCHAR(MAX), \
             PRIMARY KEY ([id]))"
        );
    }

    #[test]
    fn test_nvarchar_max_equivalent_to_text() {
        let dialect = SqlServerSchemaDialect::new();
        assert!(dialect.type_equivalent(&col::text("a"), "text"));
        assert!(dialect.type_equivalent(&col::text("a"), "NVARCHAR(MAX)"));
    }

    #[test]
    fn test_alter_column_combines_type_and_nullability() {
        let dialect = SqlServerSchemaDialect::new();
        let table = TableDef::new("t").column(col::varchar("name", 100).not_null());
        let column = table.column_by_key("name").unwrap();
        let alter = dialect
            .render_alter_column(
                &table,
                column,
                &ColumnDiff {
                    type_changed: true,
                    nullability_changed: false,
                    default_changed: true,
                    auto_increment_changed: false,
                },
            )
            .unwrap();
        assert_eq!(
            alter.statements,
            vec!["ALTER TABLE [t] ALTER COLUMN [name] NVARCHAR(100) NOT NULL"]
        );
        assert_eq!(alter.warnings.len(), 1);
    }
}
