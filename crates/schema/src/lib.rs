// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlmason-schema
//!
//! Schema definitions, per-dialect DDL rendering, and schema diffing.
//!
//! The crate covers the static half of schema management: describe tables
//! with [`TableDef`] builders, render them to DDL through a
//! [`SchemaDialect`], and compare them against an observed
//! [`DatabaseSchema`] with [`diff_schema`] to get an ordered,
//! safety-classified [`DiffPlan`]. Applying a plan against a live database
//! (and producing the observed schema in the first place) lives in the
//! catalog crate, which owns the async executor boundary.

pub mod database;
pub mod ddl;
pub mod def;
pub mod diff;
pub mod error;

pub use database::{
    DatabaseColumn, DatabaseIndex, DatabaseSchema, DatabaseTable, DatabaseView, ObservedForeignKey,
};
pub use ddl::{
    AlterColumn, MySqlSchemaDialect, PostgresSchemaDialect, SchemaDialect, SqlServerSchemaDialect,
    SqliteSchemaDialect, schema_dialect_for,
};
pub use def::{
    ColumnDef, ColumnType, DefaultValue, ForeignKeyRef, GeneratedKind, IndexColumn, IndexDef,
    ReferentialAction, RelationDef, RelationKind, TableDef, TypeArg, col,
};
pub use diff::{Change, ChangeKind, ColumnDiff, DiffPlan, diff_schema};
pub use error::{SchemaError, SchemaResult};
