// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for schema definition and DDL rendering

use sqlmason_ast::DialectName;
use sqlmason_compiler::CompileError;
use thiserror::Error;

/// Result type alias for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while validating definitions or rendering DDL
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// A table definition violates an invariant: unknown primary-key column,
    /// auto-increment on a non-integer type, ...
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    /// The dialect cannot express the requested DDL feature
    #[error("{feature} is not supported on {dialect}")]
    UnsupportedFeature {
        dialect: DialectName,
        feature: String,
    },

    /// Identifier quoting or literal formatting failed
    #[error(transparent)]
    Compile(#[from] CompileError),
}
