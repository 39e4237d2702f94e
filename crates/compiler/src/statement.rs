// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Compiled statement output

use serde::{Deserialize, Serialize};
use sqlmason_ast::Literal;

/// A compiled SQL statement: dialect-specific text plus the positional
/// parameter vector, in placeholder order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Literal>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Literal>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}
