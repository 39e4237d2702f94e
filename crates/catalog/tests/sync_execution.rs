// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Synchronization policy: dry-run, destructive gating, rollback

use sqlmason_catalog::{CatalogError, SyncOptions, synchronize_schema};
use sqlmason_schema::{
    ChangeKind, DatabaseColumn, DatabaseSchema, DatabaseTable, PostgresSchemaDialect, TableDef, col,
};
use sqlmason_test_utils::MockExecutor;

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

#[tokio::test]
async fn test_dry_run_never_touches_the_executor() {
    let executor = MockExecutor::new();
    let dialect = PostgresSchemaDialect::new();
    let plan = synchronize_schema(
        &[users_def()],
        &DatabaseSchema::default(),
        &dialect,
        &executor,
        &SyncOptions {
            dry_run: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(plan.changes.len(), 1);
    assert_eq!(plan.changes[0].kind, ChangeKind::CreateTable);
    assert_eq!(executor.execute_count(), 0);
    assert_eq!(executor.begin_count(), 0);
}

#[tokio::test]
async fn test_create_from_empty_issues_ddl_once() {
    let executor = MockExecutor::new();
    let dialect = PostgresSchemaDialect::new();
    let plan = synchronize_schema(
        &[users_def()],
        &DatabaseSchema::default(),
        &dialect,
        &executor,
        &SyncOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(plan.changes.len(), 1);
    let executed = executor.executed_sql();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].starts_with("CREATE TABLE \"users\""), "{}", executed[0]);
}

#[tokio::test]
async fn test_converged_schema_executes_nothing() {
    let executor = MockExecutor::new();
    let dialect = PostgresSchemaDialect::new();
    let observed = DatabaseSchema {
        tables: vec![observed_users()],
        views: Vec::new(),
    };
    let plan = synchronize_schema(
        &[users_def()],
        &observed,
        &dialect,
        &executor,
        &SyncOptions::default(),
    )
    .await
    .unwrap();

    assert!(plan.is_empty());
    assert_eq!(executor.execute_count(), 0);
}

#[tokio::test]
async fn test_destructive_drop_skipped_without_allow() {
    let executor = MockExecutor::new();
    let dialect = PostgresSchemaDialect::new();
    // Expected lost the `name` column; observed still has it.
    let expected = TableDef::new("users").column(col::int("id").primary_key());
    let observed = DatabaseSchema {
        tables: vec![observed_users()],
        views: Vec::new(),
    };
    let plan = synchronize_schema(
        &[expected],
        &observed,
        &dialect,
        &executor,
        &SyncOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(plan.changes.len(), 1);
    assert_eq!(plan.changes[0].kind, ChangeKind::DropColumn);
    assert!(!plan.changes[0].safe);
    assert_eq!(executor.execute_count(), 0);
    assert_eq!(plan.warnings.len(), 1);
    assert!(plan.warnings[0].contains("users.name"), "{}", plan.warnings[0]);
}

#[tokio::test]
async fn test_destructive_drop_executes_with_allow() {
    let executor = MockExecutor::new();
    let dialect = PostgresSchemaDialect::new();
    let expected = TableDef::new("users").column(col::int("id").primary_key());
    let observed = DatabaseSchema {
        tables: vec![observed_users()],
        views: Vec::new(),
    };
    synchronize_schema(
        &[expected],
        &observed,
        &dialect,
        &executor,
        &SyncOptions {
            allow_destructive: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap();

    let executed = executor.executed_sql();
    assert_eq!(executed.len(), 1);
    assert!(executed[0].contains("DROP COLUMN"), "{}", executed[0]);
}

#[tokio::test]
async fn test_strict_mode_aborts_on_destructive_change() {
    let executor = MockExecutor::new();
    let dialect = PostgresSchemaDialect::new();
    let expected = TableDef::new("users").column(col::int("id").primary_key());
    let observed = DatabaseSchema {
        tables: vec![observed_users()],
        views: Vec::new(),
    };
    let err = synchronize_schema(
        &[expected],
        &observed,
        &dialect,
        &executor,
        &SyncOptions {
            strict: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CatalogError::DiffAborted { target } if target == "users.name"));
    assert_eq!(executor.execute_count(), 0);
}

#[tokio::test]
async fn test_execution_failure_rolls_back_transaction() {
    let executor = MockExecutor::new();
    executor.fail_matching("CREATE TABLE \"orders\"");
    let dialect = PostgresSchemaDialect::new();
    let expected = vec![
        users_def(),
        TableDef::new("orders").column(col::int("id").primary_key()),
    ];
    let err = synchronize_schema(
        &expected,
        &DatabaseSchema::default(),
        &dialect,
        &executor,
        &SyncOptions {
            in_transaction: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap_err();

    match err {
        CatalogError::SyncFailed {
            failed_index,
            rolled_back,
            ..
        } => {
            assert_eq!(failed_index, 1);
            assert!(rolled_back);
        }
        other => panic!("expected SyncFailed, got {other:?}"),
    }
    assert_eq!(executor.begin_count(), 1);
    assert_eq!(executor.rollback_count(), 1);
    assert_eq!(executor.commit_count(), 0);
}

#[tokio::test]
async fn test_transaction_commit_on_success() {
    let executor = MockExecutor::new();
    let dialect = PostgresSchemaDialect::new();
    synchronize_schema(
        &[users_def()],
        &DatabaseSchema::default(),
        &dialect,
        &executor,
        &SyncOptions {
            in_transaction: true,
            ..SyncOptions::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(executor.begin_count(), 1);
    assert_eq!(executor.commit_count(), 1);
    assert_eq!(executor.rollback_count(), 0);
}
