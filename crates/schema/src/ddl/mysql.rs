// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! MySQL schema adapter

use sqlmason_ast::DialectName;
use sqlmason_compiler::{Dialect, MySqlDialect};

use crate::database::DatabaseTable;
use crate::ddl::{
    AlterColumn, SchemaDialect, canonical_type, qualified_table, quote, render_default,
    render_index_statement, table_name, validate_table,
};
use crate::def::{ColumnDef, ColumnType, TableDef, TypeArg};
use crate::diff::ColumnDiff;
use crate::error::SchemaResult;

pub struct MySqlSchemaDialect {
    compiler: MySqlDialect,
}

impl MySqlSchemaDialect {
    pub fn new() -> Self {
        Self {
            compiler: MySqlDialect::new(),
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
            sql.push_str(" AUTO_INCREMENT");
        }
        if let Some(on_update) = &column.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(on_update);
        }
        if let Some(comment) = &column.comment {
            sql.push_str(&format!(" COMMENT '{}'", comment.replace('\'', "''")));
        }
        Ok(sql)
    }
}

impl Default for MySqlSchemaDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaDialect for MySqlSchemaDialect {
    fn name(&self) -> DialectName {
        DialectName::MySql
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
            ColumnType::Uuid => "CHAR(36)".to_string(),
            ColumnType::Boolean => "TINYINT(1)".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Varchar => match column.args.first().and_then(TypeArg::as_int) {
                Some(length) => format!("VARCHAR({length})"),
                None => "VARCHAR(255)".to_string(),
            },
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::Timestamp | ColumnType::TimestampTz => "TIMESTAMP".to_string(),
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
            ColumnType::Float => "FLOAT".to_string(),
            ColumnType::Double => "DOUBLE".to_string(),
            ColumnType::Blob => "BLOB".to_string(),
            ColumnType::Enum => {
                let values = column
                    .args
                    .iter()
                    .filter_map(TypeArg::as_str)
                    .map(|v| format!("'{}'", v.replace('\'', "''")))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("ENUM({values})")
            }
        };
        Ok(sql)
    }

    fn render_create_table(&self, table: &TableDef) -> SchemaResult<Vec<String>> {
        validate_table(table)?;
        let mut parts = Vec::with_capacity(table.columns.len() + 2);
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
        // Foreign keys are table-level constraints on MySQL.
        for column in &table.columns {
            if let Some(reference) = &column.references {
                let mut fk = format!(
                    "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({})",
                    quote(self, &format!("fk_{}_{}", table.name, column.name))?,
                    quote(self, &column.name)?,
                    quote(self, &reference.table)?,
                    quote(self, &reference.column)?
                );
                if let Some(action) = reference.on_delete {
                    fk.push_str(" ON DELETE ");
                    fk.push_str(action.sql_keyword());
                }
                if let Some(action) = reference.on_update {
                    fk.push_str(" ON UPDATE ");
                    fk.push_str(action.sql_keyword());
                }
                parts.push(fk);
            }
        }

        let mut sql = format!(
            "CREATE TABLE {} ({})",
            table_name(self, table)?,
            parts.join(", ")
        );
        if let Some(engine) = &table.engine {
            sql.push_str(&format!(" ENGINE={engine}"));
        }
        if let Some(charset) = &table.charset {
            sql.push_str(&format!(" DEFAULT CHARSET={charset}"));
        }
        if let Some(collation) = &table.collation {
            sql.push_str(&format!(" COLLATE={collation}"));
        }
        if let Some(comment) = &table.comment {
            sql.push_str(&format!(" COMMENT='{}'", comment.replace('\'', "''")));
        }
        Ok(vec![sql])
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
        _diff: &ColumnDiff,
    ) -> SchemaResult<AlterColumn> {
        // MODIFY COLUMN redefines the column atomically, so one statement
        // covers every changed aspect.
        Ok(AlterColumn {
            statements: vec![format!(
                "ALTER TABLE {} MODIFY COLUMN {}",
                table_name(self, table)?,
                self.render_column(column)?
            )],
            warnings: Vec::new(),
        })
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
        canonical_type(&expected) == canonical_type(observed_type)
    }

    fn supports_partial_indexes(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::def::{ForeignKeyRef, IndexColumn, IndexDef, ReferentialAction, col};
    use crate::error::SchemaError;

    #[test]
    fn test_create_table_with_options_and_fk() {
        let table = TableDef::new("orders")
            .column(col::big_int("id").primary_key().auto_increment())
            .column(col::big_int("user_id").not_null().references(
                ForeignKeyRef::new("users", "id").on_delete(ReferentialAction::Cascade),
            ))
            .with_engine("InnoDB")
            .with_charset("utf8mb4");
        let statements = MySqlSchemaDialect::new().render_create_table(&table).unwrap();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0],
            "CREATE TABLE `orders` (\
             `id` BIGINT NOT NULL AUTO_INCREMENT, \
             `user_id` BIGINT NOT NULL, \
             PRIMARY KEY (`id`), \
             CONSTRAINT `fk_orders_user_id` FOREIGN KEY (`user_id`) \
             REFERENCES `users`(`id`) ON DELETE CASCADE) \
             ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
    }

    #[test]
    fn test_enum_column_type() {
        let dialect = MySqlSchemaDialect::new();
        let column = col::enumeration("status", vec!["queued", "done"]);
        assert_eq!(
            dialect.column_type_sql(&column).unwrap(),
            "ENUM('queued','done')"
        );
    }

    #[test]
    fn test_partial_index_rejected() {
        let dialect = MySqlSchemaDialect::new();
        let table = TableDef::new("t").column(col::int("a"));
        let index = IndexDef::on(vec![IndexColumn::new("a")]).with_where("a > 0");
        assert!(matches!(
            dialect.render_create_index(&table, &index),
            Err(SchemaError::UnsupportedFeature { .. })
        ));
    }

    #[test]
    fn test_modify_column_is_atomic() {
        let dialect = MySqlSchemaDialect::new();
        let table = TableDef::new("t").column(col::varchar("name", 500).not_null());
        let column = table.column_by_key("name").unwrap();
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
            vec!["ALTER TABLE `t` MODIFY COLUMN `name` VARCHAR(500) NOT NULL"]
        );
    }
}
