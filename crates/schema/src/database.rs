// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Observed schema model
//!
//! What introspection reports back from a live database. Types here mirror
//! the desired-state definitions but carry the dialect's raw type text
//! (`"character varying(255)"`, `"NVARCHAR(MAX)"`) instead of semantic
//! types; the diff compares the two sides through a dialect-aware type
//! equivalence predicate.

use serde::{Deserialize, Serialize};

use crate::def::ReferentialAction;

/// Foreign key observed on a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedForeignKey {
    pub table: String,
    pub column: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

/// One observed column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseColumn {
    pub name: String,
    /// Raw dialect type text as reported by the catalog
    pub data_type: String,
    pub not_null: bool,
    /// Default expression text, if any
    pub default: Option<String>,
    pub auto_increment: bool,
    pub comment: Option<String>,
    pub references: Option<ObservedForeignKey>,
}

impl DatabaseColumn {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            not_null: false,
            default: None,
            auto_increment: false,
            comment: None,
            references: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_references(mut self, references: ObservedForeignKey) -> Self {
        self.references = Some(references);
        self
    }
}

/// One observed index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseIndex {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    /// Whether this index backs the primary key; such indexes are ignored
    /// by the diff
    pub primary: bool,
    pub where_clause: Option<String>,
}

impl DatabaseIndex {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            unique: false,
            primary: false,
            where_clause: None,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn with_where(mut self, predicate: impl Into<String>) -> Self {
        self.where_clause = Some(predicate.into());
        self
    }
}

/// One observed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseTable {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Vec<DatabaseColumn>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<DatabaseIndex>,
    pub comment: Option<String>,
}

impl DatabaseTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            comment: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_columns(mut self, columns: Vec<DatabaseColumn>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    pub fn with_indexes(mut self, indexes: Vec<DatabaseIndex>) -> Self {
        self.indexes = indexes;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn column(&self, name: &str) -> Option<&DatabaseColumn> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// One observed view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseView {
    pub name: String,
    pub schema: Option<String>,
    pub definition: Option<String>,
}

/// Everything introspection reports.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub tables: Vec<DatabaseTable>,
    pub views: Vec<DatabaseView>,
}

impl DatabaseSchema {
    /// Look up a table by `(schema, name)`.
    ///
    /// A qualified lookup matches only a table recorded under exactly that
    /// schema. An unqualified lookup (`schema: None`) resolves against
    /// whatever schema the introspector reported for the name, in catalog
    /// order; this is the one-direction fallback that lets schema-less
    /// `TableDef`s diff against a single-schema introspection, where every
    /// observed table carries the search-path schema (`public`, `dbo`). A
    /// recorded `None` never satisfies a qualified lookup.
    pub fn table(&self, schema: Option<&str>, name: &str) -> Option<&DatabaseTable> {
        self.tables.iter().find(|t| {
            if !t.name.eq_ignore_ascii_case(name) {
                return false;
            }
            match (schema, t.schema.as_deref()) {
                (Some(wanted), Some(recorded)) => recorded.eq_ignore_ascii_case(wanted),
                (Some(_), None) => false,
                (None, _) => true,
            }
        })
    }
}
