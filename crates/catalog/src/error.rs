// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for executor, introspection and synchronization

use sqlmason_compiler::CompileError;
use sqlmason_schema::SchemaError;
use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors crossing the executor boundary or raised by the catalog layer
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Failure reported by the injected executor, surfaced unchanged
    #[error("executor failure: {0}")]
    Execution(String),

    /// A catalog query failed or returned an unexpected shape, tagged with
    /// the catalog that was being read
    #[error("introspection of {catalog} failed: {message}")]
    IntrospectionFailed { catalog: String, message: String },

    /// A destructive change was encountered under `strict` with
    /// `allow_destructive = false`
    #[error("destructive change rejected: {target}")]
    DiffAborted { target: String },

    /// Execution failure during synchronize, with the failed change index
    /// and whether rollback completed
    #[error(
        "synchronization failed at change {failed_index} (rolled back: {rolled_back}): {message}"
    )]
    SyncFailed {
        failed_index: usize,
        rolled_back: bool,
        message: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}
