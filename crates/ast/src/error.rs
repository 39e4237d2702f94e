// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Error types for AST construction

use serde::Serialize;
use thiserror::Error;

/// Result type alias for AST construction
pub type AstResult<T> = Result<T, AstError>;

/// Errors raised while building AST values
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
pub enum AstError {
    /// Malformed input to a builder, e.g. a variadic combinator called with
    /// too few operands
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
