// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Schema diffing
//!
//! Compares a desired `TableDef` list against an observed
//! [`DatabaseSchema`] and produces an ordered, safety-classified
//! [`DiffPlan`].
//!
//! ## Ordering
//!
//! Additive changes come first, then drops, then column alterations, then
//! index changes. Within the additive bucket, tables are created in
//! dependency order (referenced tables first); observed-only tables are
//! dropped in reverse dependency order.
//!
//! ## Safety
//!
//! A change is `safe` when applying it cannot lose data: `CREATE TABLE`,
//! `ADD COLUMN`, `ADD INDEX`, and alterations whose type transition widens.
//! Drops and narrowing type changes are destructive and left to the sync
//! layer to gate behind `allow_destructive`.
//!
//! The diff itself never fails on mismatched input: where the dialect lacks
//! a capability (SQLite column alteration, MySQL partial indexes) it
//! records a warning instead of a change.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::database::{DatabaseColumn, DatabaseIndex, DatabaseSchema, DatabaseTable};
use crate::ddl::{SchemaDialect, canonical_type, render_default};
use crate::def::{ColumnDef, ColumnType, IndexDef, TableDef, TypeArg};
use crate::error::{SchemaError, SchemaResult};

/// Per-column comparison result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDiff {
    pub type_changed: bool,
    pub nullability_changed: bool,
    pub default_changed: bool,
    pub auto_increment_changed: bool,
}

impl ColumnDiff {
    pub fn any(&self) -> bool {
        self.type_changed
            || self.nullability_changed
            || self.default_changed
            || self.auto_increment_changed
    }
}

/// Kind of a planned change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    CreateTable,
    DropTable,
    AddColumn,
    DropColumn,
    AlterColumn,
    AddIndex,
    DropIndex,
}

/// One planned change: target object, ordered statements, safety class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub kind: ChangeKind,
    pub target: String,
    pub statements: Vec<String>,
    pub safe: bool,
}

/// Ordered plan plus human-readable warnings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiffPlan {
    pub changes: Vec<Change>,
    pub warnings: Vec<String>,
}

impl DiffPlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn has_destructive(&self) -> bool {
        self.changes.iter().any(|c| !c.safe)
    }
}

fn target(table: &TableDef, column: Option<&str>) -> String {
    match column {
        Some(column) => format!("{}.{column}", table.name),
        None => table.name.clone(),
    }
}

/// Expected tables in dependency order: referenced tables first.
fn creation_order(expected: &[TableDef]) -> Vec<&TableDef> {
    let known: HashSet<String> = expected.iter().map(|t| t.name.to_lowercase()).collect();
    let mut placed: HashSet<String> = HashSet::new();
    let mut ordered = Vec::with_capacity(expected.len());
    let mut remaining: Vec<&TableDef> = expected.iter().collect();

    while !remaining.is_empty() {
        let before = ordered.len();
        remaining.retain(|table| {
            let blocked = table.referenced_tables().iter().any(|dep| {
                let dep = dep.to_lowercase();
                dep != table.name.to_lowercase() && known.contains(&dep) && !placed.contains(&dep)
            });
            if blocked {
                true
            } else {
                placed.insert(table.name.to_lowercase());
                ordered.push(*table);
                false
            }
        });
        // Cycles keep declaration order.
        if ordered.len() == before {
            ordered.extend(remaining.iter().copied());
            break;
        }
    }
    ordered
}

/// Observed-only tables in drop order: dependents first.
fn drop_order<'a>(observed: &[&'a DatabaseTable]) -> Vec<&'a DatabaseTable> {
    let mut ordered: Vec<&DatabaseTable> = Vec::with_capacity(observed.len());
    let mut remaining: Vec<&DatabaseTable> = observed.to_vec();

    while !remaining.is_empty() {
        let before = ordered.len();
        let mut i = 0;
        while i < remaining.len() {
            let table = remaining[i];
            // A table is droppable once no remaining table references it.
            let blocked = remaining.iter().enumerate().any(|(j, other)| {
                j != i
                    && other.columns.iter().any(|c| {
                        c.references
                            .as_ref()
                            .is_some_and(|r| r.table.eq_ignore_ascii_case(&table.name))
                    })
            });
            if blocked {
                i += 1;
            } else {
                ordered.push(remaining.remove(i));
            }
        }
        // Reference cycles keep catalog order.
        if ordered.len() == before {
            ordered.append(&mut remaining);
            break;
        }
    }
    ordered
}

/// Strip wrapping parentheses and quotes catalogs love to add around
/// default expressions, then compare case-insensitively.
fn normalize_default(raw: Option<&str>) -> Option<String> {
    let mut text = raw?.trim().to_string();
    loop {
        let stripped = text
            .strip_prefix('(')
            .and_then(|t| t.strip_suffix(')'))
            .map(str::trim);
        match stripped {
            Some(inner) if !inner.is_empty() => text = inner.to_string(),
            _ => break,
        }
    }
    let lowered = text.to_lowercase();
    if lowered == "null" {
        return None;
    }
    Some(lowered)
}

fn column_diff(
    dialect: &dyn SchemaDialect,
    expected: &ColumnDef,
    observed: &DatabaseColumn,
) -> ColumnDiff {
    let expected_default = expected
        .default
        .as_ref()
        .map(|d| render_default(dialect, d));
    ColumnDiff {
        type_changed: !dialect.type_equivalent(expected, &observed.data_type),
        nullability_changed: expected.effective_not_null() != observed.not_null,
        default_changed: normalize_default(expected_default.as_deref())
            != normalize_default(observed.default.as_deref()),
        auto_increment_changed: expected.auto_increment != observed.auto_increment,
    }
}

/// Whether a type transition cannot lose data.
fn is_widening(expected: &ColumnDef, observed_type: &str) -> bool {
    let canon = canonical_type(observed_type);
    let base: String = canon.chars().take_while(|c| *c != '(').collect();
    let observed_len = canon.find('(').and_then(|at| {
        canon[at + 1..]
            .split([',', ')'])
            .next()
            .and_then(|s| s.parse::<i64>().ok())
    });

    match expected.column_type {
        ColumnType::BigInt => matches!(base.as_str(), "integer" | "smallint"),
        ColumnType::Int => base == "smallint",
        ColumnType::Text => matches!(base.as_str(), "varchar" | "char" | "nvarchar" | "nchar"),
        ColumnType::Varchar => {
            let expected_len = expected.args.first().and_then(TypeArg::as_int);
            matches!(base.as_str(), "varchar" | "char" | "nvarchar" | "nchar")
                && match (expected_len, observed_len) {
                    (Some(e), Some(o)) => o <= e,
                    _ => false,
                }
        }
        _ => false,
    }
}

fn normalized_index_columns(columns: &[String]) -> String {
    columns
        .iter()
        .map(|c| c.to_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

fn expected_index_columns(index: &IndexDef) -> String {
    index
        .columns
        .iter()
        .map(|c| c.column.to_lowercase())
        .collect::<Vec<_>>()
        .join(",")
}

fn indexes_match(expected: &IndexDef, observed: &DatabaseIndex) -> bool {
    expected.unique == observed.unique
        && expected_index_columns(expected) == normalized_index_columns(&observed.columns)
        && normalize_default(expected.where_clause.as_deref())
            == normalize_default(observed.where_clause.as_deref())
}

/// Run a render step that may be unsupported on the dialect; capability
/// gaps become warnings instead of failing the whole diff.
fn render_or_warn(
    result: SchemaResult<String>,
    warnings: &mut Vec<String>,
) -> SchemaResult<Option<String>> {
    match result {
        Ok(sql) => Ok(Some(sql)),
        Err(SchemaError::UnsupportedFeature { dialect, feature }) => {
            warnings.push(format!("{feature} is not supported on {dialect}; skipped"));
            Ok(None)
        }
        Err(other) => Err(other),
    }
}

fn diff_indexes(
    dialect: &dyn SchemaDialect,
    table: &TableDef,
    observed: &DatabaseTable,
    index_changes: &mut Vec<Change>,
    warnings: &mut Vec<String>,
) -> SchemaResult<()> {
    let observed_indexes: Vec<&DatabaseIndex> =
        observed.indexes.iter().filter(|i| !i.primary).collect();
    let mut matched: HashSet<String> = HashSet::new();

    for index in &table.indexes {
        let name = index.effective_name(&table.name);
        let found = observed_indexes.iter().find(|oi| {
            if index.name.is_some() {
                oi.name.eq_ignore_ascii_case(&name)
            } else {
                normalized_index_columns(&oi.columns) == expected_index_columns(index)
            }
        });
        match found {
            None => {
                if let Some(sql) =
                    render_or_warn(dialect.render_create_index(table, index), warnings)?
                {
                    index_changes.push(Change {
                        kind: ChangeKind::AddIndex,
                        target: format!("{}.{name}", table.name),
                        statements: vec![sql],
                        safe: true,
                    });
                }
            }
            Some(oi) => {
                matched.insert(oi.name.to_lowercase());
                if !indexes_match(index, oi) {
                    index_changes.push(Change {
                        kind: ChangeKind::DropIndex,
                        target: format!("{}.{}", table.name, oi.name),
                        statements: vec![dialect.render_drop_index(table, &oi.name)?],
                        safe: false,
                    });
                    if let Some(sql) =
                        render_or_warn(dialect.render_create_index(table, index), warnings)?
                    {
                        index_changes.push(Change {
                            kind: ChangeKind::AddIndex,
                            target: format!("{}.{name}", table.name),
                            statements: vec![sql],
                            safe: true,
                        });
                    }
                }
            }
        }
    }

    for oi in observed_indexes {
        if !matched.contains(&oi.name.to_lowercase()) {
            let known = table.indexes.iter().any(|i| {
                i.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(&oi.name))
                    || expected_index_columns(i) == normalized_index_columns(&oi.columns)
            });
            if !known {
                index_changes.push(Change {
                    kind: ChangeKind::DropIndex,
                    target: format!("{}.{}", table.name, oi.name),
                    statements: vec![dialect.render_drop_index(table, &oi.name)?],
                    safe: false,
                });
            }
        }
    }
    Ok(())
}

/// Compute the ordered diff plan between desired and observed schema.
pub fn diff_schema(
    expected: &[TableDef],
    observed: &DatabaseSchema,
    dialect: &dyn SchemaDialect,
) -> SchemaResult<DiffPlan> {
    let mut adds: Vec<Change> = Vec::new();
    let mut drops: Vec<Change> = Vec::new();
    let mut alters: Vec<Change> = Vec::new();
    let mut index_changes: Vec<Change> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for table in creation_order(expected) {
        match observed.table(table.schema.as_deref(), &table.name) {
            None => {
                let mut statements = dialect.render_create_table(table)?;
                for index in &table.indexes {
                    if let Some(sql) =
                        render_or_warn(dialect.render_create_index(table, index), &mut warnings)?
                    {
                        statements.push(sql);
                    }
                }
                adds.push(Change {
                    kind: ChangeKind::CreateTable,
                    target: target(table, None),
                    statements,
                    safe: true,
                });
            }
            Some(observed_table) => {
                for column in &table.columns {
                    match observed_table.column(&column.name) {
                        None => adds.push(Change {
                            kind: ChangeKind::AddColumn,
                            target: target(table, Some(&column.name)),
                            statements: vec![dialect.render_add_column(table, column)?],
                            safe: true,
                        }),
                        Some(observed_column) => {
                            let diff = column_diff(dialect, column, observed_column);
                            if !diff.any() {
                                continue;
                            }
                            tracing::debug!(
                                table = %table.name,
                                column = %column.name,
                                ?diff,
                                "column drifted"
                            );
                            let alter = dialect.render_alter_column(table, column, &diff)?;
                            warnings.extend(alter.warnings);
                            if !alter.statements.is_empty() {
                                let safe = !diff.type_changed
                                    || is_widening(column, &observed_column.data_type);
                                alters.push(Change {
                                    kind: ChangeKind::AlterColumn,
                                    target: target(table, Some(&column.name)),
                                    statements: alter.statements,
                                    safe,
                                });
                            }
                        }
                    }
                }
                for observed_column in &observed_table.columns {
                    let kept = table
                        .columns
                        .iter()
                        .any(|c| c.name.eq_ignore_ascii_case(&observed_column.name));
                    if !kept {
                        drops.push(Change {
                            kind: ChangeKind::DropColumn,
                            target: target(table, Some(&observed_column.name)),
                            statements: vec![
                                dialect.render_drop_column(table, &observed_column.name)?,
                            ],
                            safe: false,
                        });
                    }
                }
                diff_indexes(dialect, table, observed_table, &mut index_changes, &mut warnings)?;
            }
        }
    }

    let observed_only: Vec<&DatabaseTable> = observed
        .tables
        .iter()
        .filter(|ot| {
            !expected
                .iter()
                .any(|t| t.name.eq_ignore_ascii_case(&ot.name))
        })
        .collect();
    for table in drop_order(&observed_only) {
        drops.push(Change {
            kind: ChangeKind::DropTable,
            target: table.name.clone(),
            statements: vec![dialect.render_drop_table(table)?],
            safe: false,
        });
    }

    let mut changes = adds;
    changes.append(&mut drops);
    changes.append(&mut alters);
    changes.append(&mut index_changes);
    Ok(DiffPlan { changes, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseColumn;
    use crate::ddl::{PostgresSchemaDialect, SqliteSchemaDialect, schema_dialect_for};
    use crate::def::{ForeignKeyRef, col};
    use sqlmason_ast::DialectName;

    fn users_def() -> TableDef {
        TableDef::new("users")
            .column(col::int("id").primary_key())
            .column(col::varchar("name", 255).not_null())
    }

    fn observed_users() -> DatabaseTable {
        DatabaseTable::new("users")
            .with_columns(vec![
                DatabaseColumn::new("id", "integer").not_null(),
                DatabaseColumn::new("name", "character varying(255)").not_null(),
            ])
            .with_primary_key(vec!["id".into()])
    }

    #[test]
    fn test_diff_from_empty_creates_table() {
        let dialect = PostgresSchemaDialect::new();
        let plan = diff_schema(&[users_def()], &DatabaseSchema::default(), &dialect).unwrap();
        assert_eq!(plan.changes.len(), 1);
        let change = &plan.changes[0];
        assert_eq!(change.kind, ChangeKind::CreateTable);
        assert!(change.safe);
        assert!(change.statements[0].starts_with("CREATE TABLE \"users\""));
    }

    #[test]
    fn test_diff_converged_schema_is_empty() {
        let dialect = PostgresSchemaDialect::new();
        let observed = DatabaseSchema {
            tables: vec![observed_users()],
            views: Vec::new(),
        };
        let plan = diff_schema(&[users_def()], &observed, &dialect).unwrap();
        assert!(plan.is_empty(), "{:?}", plan.changes);
    }

    #[test]
    fn test_missing_column_is_safe_add() {
        let dialect = PostgresSchemaDialect::new();
        let expected = users_def().column(col::boolean("active").not_null());
        let observed = DatabaseSchema {
            tables: vec![observed_users()],
            views: Vec::new(),
        };
        let plan = diff_schema(&[expected], &observed, &dialect).unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].kind, ChangeKind::AddColumn);
        assert!(plan.changes[0].safe);
    }

    #[test]
    fn test_observed_extra_column_is_destructive_drop() {
        let dialect = PostgresSchemaDialect::new();
        let observed_table = observed_users().with_columns(vec![
            DatabaseColumn::new("id", "integer").not_null(),
            DatabaseColumn::new("name", "character varying(255)").not_null(),
            DatabaseColumn::new("legacy", "text"),
        ]);
        let observed = DatabaseSchema {
            tables: vec![observed_table],
            views: Vec::new(),
        };
        let plan = diff_schema(&[users_def()], &observed, &dialect).unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].kind, ChangeKind::DropColumn);
        assert!(!plan.changes[0].safe);
    }

    #[test]
    fn test_widening_type_change_is_safe() {
        let dialect = PostgresSchemaDialect::new();
        let expected = TableDef::new("users").column(col::big_int("id").primary_key());
        let observed = DatabaseSchema {
            tables: vec![
                DatabaseTable::new("users")
                    .with_columns(vec![DatabaseColumn::new("id", "integer").not_null()]),
            ],
            views: Vec::new(),
        };
        let plan = diff_schema(&[expected], &observed, &dialect).unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].kind, ChangeKind::AlterColumn);
        assert!(plan.changes[0].safe);
    }

    #[test]
    fn test_narrowing_type_change_is_destructive() {
        let dialect = PostgresSchemaDialect::new();
        let expected = TableDef::new("users").column(col::int("id").primary_key());
        let observed = DatabaseSchema {
            tables: vec![
                DatabaseTable::new("users")
                    .with_columns(vec![DatabaseColumn::new("id", "bigint").not_null()]),
            ],
            views: Vec::new(),
        };
        let plan = diff_schema(&[expected], &observed, &dialect).unwrap();
        assert_eq!(plan.changes.len(), 1);
        assert!(!plan.changes[0].safe);
    }

    #[test]
    fn test_sqlite_alter_becomes_warning() {
        let dialect = SqliteSchemaDialect::new();
        let expected = TableDef::new("users").column(col::int("n").not_null());
        let observed = DatabaseSchema {
            tables: vec![DatabaseTable::new("users").with_columns(vec![DatabaseColumn::new(
                "n", "TEXT",
            )])],
            views: Vec::new(),
        };
        let plan = diff_schema(&[expected], &observed, &dialect).unwrap();
        assert!(plan.changes.is_empty());
        assert_eq!(plan.warnings.len(), 1);
    }

    #[test]
    fn test_creation_respects_foreign_key_order() {
        let orders = TableDef::new("orders")
            .column(col::int("id").primary_key())
            .column(col::int("user_id").references(ForeignKeyRef::new("users", "id")));
        let users = TableDef::new("users").column(col::int("id").primary_key());
        let dialect = PostgresSchemaDialect::new();
        // `orders` listed first, but `users` must be created first.
        let plan =
            diff_schema(&[orders, users], &DatabaseSchema::default(), &dialect).unwrap();
        assert_eq!(plan.changes[0].target, "users");
        assert_eq!(plan.changes[1].target, "orders");
    }

    #[test]
    fn test_index_mismatch_drops_and_recreates() {
        let dialect = PostgresSchemaDialect::new();
        let expected = users_def().index(
            crate::def::IndexDef::on(vec![crate::def::IndexColumn::new("name")])
                .named("idx_users_name")
                .unique(),
        );
        let observed_table = observed_users().with_indexes(vec![DatabaseIndex::new(
            "idx_users_name",
            vec!["name".into()],
        )]);
        let observed = DatabaseSchema {
            tables: vec![observed_table],
            views: Vec::new(),
        };
        let plan = diff_schema(&[expected], &observed, &dialect).unwrap();
        let kinds: Vec<ChangeKind> = plan.changes.iter().map(|c| c.kind).collect();
        assert_eq!(kinds, vec![ChangeKind::DropIndex, ChangeKind::AddIndex]);
        assert!(!plan.changes[0].safe);
        assert!(plan.changes[1].safe);
    }

    #[test]
    fn test_plan_shape_is_stable_across_dialects() {
        for name in DialectName::ALL {
            let dialect = schema_dialect_for(name);
            let plan =
                diff_schema(&[users_def()], &DatabaseSchema::default(), dialect.as_ref()).unwrap();
            assert_eq!(plan.changes.len(), 1, "{name}");
            assert_eq!(plan.changes[0].kind, ChangeKind::CreateTable, "{name}");
        }
    }
}
