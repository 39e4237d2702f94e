// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Dialect selection
//!
//! This module defines the dialect identifier shared by the compiler, the
//! DDL renderers, and the introspectors.
//!
//! A [`DialectName`] only names a target flavor; all behavioral differences
//! (identifier quoting, placeholder syntax, pagination, feature support)
//! live behind the compiler's `Dialect` capability. Keeping the name as a
//! plain `Copy` enum lets schema definitions carry per-dialect overrides
//! (`dialect_types`) and lets the function registry key its variants without
//! dragging the whole capability around.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AstError;

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum DialectName {
    /// PostgreSQL
    Postgres,
    /// MySQL
    MySql,
    /// Microsoft SQL Server
    SqlServer,
    /// SQLite
    Sqlite,
}

impl DialectName {
    /// All dialects known to the toolkit, in a stable order.
    pub const ALL: [DialectName; 4] = [
        DialectName::Postgres,
        DialectName::MySql,
        DialectName::SqlServer,
        DialectName::Sqlite,
    ];

    /// Canonical lowercase name, as used in `dialect_types` override maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectName::Postgres => "postgres",
            DialectName::MySql => "mysql",
            DialectName::SqlServer => "mssql",
            DialectName::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for DialectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectName {
    type Err = AstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DialectName::Postgres),
            "mysql" | "mariadb" => Ok(DialectName::MySql),
            "mssql" | "sqlserver" => Ok(DialectName::SqlServer),
            "sqlite" | "sqlite3" => Ok(DialectName::Sqlite),
            other => Err(AstError::InvalidArgument(format!(
                "unknown dialect name: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_round_trip() {
        for dialect in DialectName::ALL {
            assert_eq!(dialect.as_str().parse::<DialectName>().unwrap(), dialect);
        }
    }

    #[test]
    fn test_parse_aliases() {
        assert_eq!(
            "postgresql".parse::<DialectName>().unwrap(),
            DialectName::Postgres
        );
        assert_eq!(
            "sqlserver".parse::<DialectName>().unwrap(),
            DialectName::SqlServer
        );
    }

    #[test]
    fn test_parse_unknown() {
        assert!("oracle".parse::<DialectName>().is_err());
    }
}
