// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQLite schema adapter

use sqlmason_ast::DialectName;
use sqlmason_compiler::{Dialect, SqliteDialect};

use crate::database::DatabaseTable;
use crate::ddl::{
    AlterColumn, SchemaDialect, canonical_type, qualified_table, quote, render_default,
    render_index_statement, render_references, table_name, validate_table,
};
use crate::def::{ColumnDef, ColumnType, TableDef};
use crate::diff::ColumnDiff;
use crate::error::SchemaResult;

pub struct SqliteSchemaDialect {
    compiler: SqliteDialect,
}

impl SqliteSchemaDialect {
    pub fn new() -> Self {
        Self {
            compiler: SqliteDialect::new(),
        }
    }

    /// Whether a column is the table's rowid alias
    /// (`INTEGER PRIMARY KEY AUTOINCREMENT`).
    fn is_rowid_column(table: &TableDef, column: &ColumnDef) -> bool {
        let pk = table.primary_key_columns();
        column.auto_increment && pk.len() == 1 && pk[0].key == column.key
    }

    fn render_column(&self, table: &TableDef, column: &ColumnDef) -> SchemaResult<String> {
        let name = quote(self, &column.name)?;
        if Self::is_rowid_column(table, column) {
            return Ok(format!("{name} INTEGER PRIMARY KEY AUTOINCREMENT"));
        }
        let mut sql = format!("{name} {}", self.column_type_sql(column)?);
        if column.effective_not_null() {
            sql.push_str(" NOT NULL");
        }
        if let Some(default) = &column.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&render_default(self, default));
        }
        if let Some(collation) = &column.collation {
            sql.push_str(" COLLATE ");
            sql.push_str(collation);
        }
        if let Some(references) = render_references(self, column)? {
            sql.push(' ');
            sql.push_str(&references);
        }
        Ok(sql)
    }
}

impl Default for SqliteSchemaDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDialect for SqliteSchemaDialect {
    fn name(&self) -> DialectName {
        DialectName::Sqlite
    }

    fn compiler(&self) -> &dyn Dialect {
        &self.compiler
    }

    fn column_type_sql(&self, column: &ColumnDef) -> SchemaResult<String> {
        if let Some(override_type) = column.dialect_type_override(self.name()) {
            return Ok(override_type.to_string());
        }
        let sql = match column.column_type {
            ColumnType::Int
            | ColumnType::BigInt
            | ColumnType::SmallInt
            | ColumnType::Boolean => "INTEGER",
            ColumnType::Uuid
            | ColumnType::Json
            | ColumnType::Varchar
            | ColumnType::Text
            | ColumnType::Timestamp
            | ColumnType::TimestampTz
            | ColumnType::Date
            | ColumnType::Time
            | ColumnType::Enum => "TEXT",
            ColumnType::Decimal => "NUMERIC",
            ColumnType::Float | ColumnType::Double => "REAL",
            ColumnType::Blob => "BLOB",
        };
        Ok(sql.to_string())
    }

    fn render_create_table(&self, table: &TableDef) -> SchemaResult<Vec<String>> {
        validate_table(table)?;
        let mut parts = Vec::with_capacity(table.columns.len() + 1);
        let mut rowid_pk = false;
        for column in &table.columns {
            if Self::is_rowid_column(table, column) {
                rowid_pk = true;
            }
            parts.push(self.render_column(table, column)?);
        }
        let pk = table.primary_key_columns();
        if !pk.is_empty() && !rowid_pk {
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
            "ALTER TABLE {} ADD COLUMN {}",
            table_name(self, table)?,
            self.render_column(table, column)?
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
        _diff: &ColumnDiff,
    ) -> SchemaResult<AlterColumn> {
        // SQLite cannot alter columns in place; the change needs a manual
        // table rebuild.
        Ok(AlterColumn {
            statements: Vec::new(),
            warnings: vec![format!(
                "column {}.{} cannot be altered on sqlite; rebuild the table to apply the change",
                table.name, column.name
            )],
        })
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
    fn test_rowid_primary_key_inline() {
        let table = TableDef::new("users")
            .column(col::big_int("id").primary_key().auto_increment())
            .column(col::varchar("name", 255).not_null());
        let statements = SqliteSchemaDialect::new().render_create_table(&table).unwrap();
        assert_eq!(
            statements[0],
            "CREATE TABLE \"users\" (\
             \"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"name\" TEXT NOT NULL)"
        );
    }

    #[test]
    fn test_composite_primary_key_table_level() {
        let table = TableDef::new("m2m")
            .column(col::int("a"))
            .column(col::int("b"))
            .with_primary_key(vec!["a".into(), "b".into()]);
        let statements = SqliteSchemaDialect::new().render_create_table(&table).unwrap();
        assert!(
            statements[0].ends_with("PRIMARY KEY (\"a\", \"b\"))"),
            "{}",
            statements[0]
        );
    }

    #[test]
    fn test_alter_column_warns_instead_of_rendering() {
        let dialect = SqliteSchemaDialect::new();
        let table = TableDef::new("t").column(col::int("n"));
        let column = table.column_by_key("n").unwrap();
        let alter = dialect
            .render_alter_column(
                &table,
                column,
                &ColumnDiff {
                    type_changed: true,
                    nullability_changed: false,
                    default_changed: false,
                    auto_increment_changed: false,
                },
            )
            .unwrap();
        assert!(alter.statements.is_empty());
        assert_eq!(alter.warnings.len(), 1);
    }

    #[test]
    fn test_everything_maps_to_affinities() {
        let dialect = SqliteSchemaDialect::new();
        assert_eq!(dialect.column_type_sql(&col::uuid("u")).unwrap(), "TEXT");
        assert_eq!(dialect.column_type_sql(&col::boolean("b")).unwrap(), "INTEGER");
        assert_eq!(
            dialect.column_type_sql(&col::decimal("d", 10, 2)).unwrap(),
            "NUMERIC"
        );
    }
}
