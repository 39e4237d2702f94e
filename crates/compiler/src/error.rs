// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for SQL compilation

use serde::Serialize;
use sqlmason_ast::DialectName;
use thiserror::Error;

/// Result type alias for compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// Errors raised while compiling an AST to SQL text
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum CompileError {
    /// Malformed AST: empty INSERT column list, UPDATE joins without FROM,
    /// identifier the dialect cannot represent, ...
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The selected dialect cannot express the requested feature
    #[error("{feature} is not supported on {dialect}")]
    UnsupportedFeature {
        dialect: DialectName,
        feature: String,
    },

    /// A registered function key is marked unavailable for the dialect
    #[error("function {key} is not available on {dialect}")]
    UnsupportedFunction { dialect: DialectName, key: String },

    /// An explicit table-function key resolved to no renderer
    #[error("table function {key} is not registered for {dialect}")]
    UnsupportedTableFunction { dialect: DialectName, key: String },

    /// Duplicate canonical key during registry construction
    #[error("function key {key} is already registered")]
    AlreadyRegistered { key: String },
}

impl CompileError {
    pub(crate) fn unsupported(dialect: DialectName, feature: impl Into<String>) -> Self {
        CompileError::UnsupportedFeature {
            dialect,
            feature: feature.into(),
        }
    }
}

impl From<sqlmason_ast::AstError> for CompileError {
    fn from(err: sqlmason_ast::AstError) -> Self {
        match err {
            sqlmason_ast::AstError::InvalidArgument(msg) => CompileError::InvalidArgument(msg),
        }
    }
}
