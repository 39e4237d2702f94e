// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Desired-state schema definitions
//!
//! [`TableDef`] and friends describe the schema a caller *wants*. They are
//! the input to DDL rendering and the expected side of the diff; the
//! observed side ([`crate::database`]) comes back from introspection.
//!
//! ## Keys versus wire names
//!
//! A column carries two identifiers: `key`, the logical name used by AST
//! builders and lookups, and `name`, the SQL identifier actually emitted.
//! They are usually equal; `named()` overrides the wire name for mapped
//! columns.
//!
//! ## Builders
//!
//! Definitions are assembled with value-style builders and the `col::*`
//! constructors:
//!
//! ```
//! use sqlmason_schema::{TableDef, col};
//!
//! let users = TableDef::new("users")
//!     .column(col::big_int("id").primary_key().auto_increment())
//!     .column(col::varchar("name", 255).not_null())
//!     .column(col::timestamp_tz("created_at").default_expression("CURRENT_TIMESTAMP"));
//! # let _ = users;
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use sqlmason_ast::{ColumnExpr, DialectName, Literal, Operand, SortDirection};

/// Semantic column types, mapped to concrete SQL types per dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ColumnType {
    Int,
    BigInt,
    SmallInt,
    Uuid,
    Boolean,
    Json,
    Varchar,
    Text,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    Decimal,
    Float,
    Double,
    Blob,
    Enum,
}

impl ColumnType {
    /// Whether auto-increment is meaningful for the type.
    pub fn is_integer_family(&self) -> bool {
        matches!(
            self,
            ColumnType::Int | ColumnType::BigInt | ColumnType::SmallInt
        )
    }
}

/// Type argument: length, precision/scale, or enum member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeArg {
    Int(i64),
    Str(String),
}

impl TypeArg {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            TypeArg::Int(i) => Some(*i),
            TypeArg::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TypeArg::Str(s) => Some(s),
            TypeArg::Int(_) => None,
        }
    }
}

/// Identity generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratedKind {
    Always,
    ByDefault,
}

/// Column default: a typed literal or a raw SQL expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    Value(Literal),
    Expression(String),
}

/// Normalized foreign-key referential actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferentialAction {
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    /// Parse a catalog-reported action. Unrecognized values normalize to
    /// `None` rather than failing introspection.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "NO ACTION" => Some(ReferentialAction::NoAction),
            "RESTRICT" => Some(ReferentialAction::Restrict),
            "CASCADE" => Some(ReferentialAction::Cascade),
            "SET NULL" => Some(ReferentialAction::SetNull),
            "SET DEFAULT" => Some(ReferentialAction::SetDefault),
            _ => None,
        }
    }

    pub fn sql_keyword(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// Foreign-key reference carried by a column definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKeyRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// One column of a desired table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Logical identifier used by AST builders and diffing
    pub key: String,
    /// Wire-level SQL identifier, usually equal to `key`
    pub name: String,
    pub column_type: ColumnType,
    pub args: Vec<TypeArg>,
    pub not_null: bool,
    pub primary: bool,
    pub auto_increment: bool,
    pub default: Option<DefaultValue>,
    pub generated: Option<GeneratedKind>,
    /// Per-dialect concrete type overrides, keyed by dialect name or
    /// `"default"`
    pub dialect_types: BTreeMap<String, String>,
    pub references: Option<ForeignKeyRef>,
    pub comment: Option<String>,
    pub collation: Option<String>,
    /// MySQL `ON UPDATE` clause (e.g. `CURRENT_TIMESTAMP`)
    pub on_update: Option<String>,
}

impl ColumnDef {
    pub fn new(key: impl Into<String>, column_type: ColumnType) -> Self {
        let key = key.into();
        Self {
            name: key.clone(),
            key,
            column_type,
            args: Vec::new(),
            not_null: false,
            primary: false,
            auto_increment: false,
            default: None,
            generated: None,
            dialect_types: BTreeMap::new(),
            references: None,
            comment: None,
            collation: None,
            on_update: None,
        }
    }

    /// Override the wire-level SQL identifier.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_args(mut self, args: Vec<TypeArg>) -> Self {
        self.args = args;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary = true;
        self.not_null = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn generated(mut self, kind: GeneratedKind) -> Self {
        self.generated = Some(kind);
        self
    }

    pub fn default_value(mut self, value: Literal) -> Self {
        self.default = Some(DefaultValue::Value(value));
        self
    }

    /// Raw default expression, inlined verbatim into DDL.
    pub fn default_expression(mut self, expression: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Expression(expression.into()));
        self
    }

    pub fn dialect_type(mut self, dialect: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.dialect_types.insert(dialect.into(), sql_type.into());
        self
    }

    pub fn references(mut self, reference: ForeignKeyRef) -> Self {
        self.references = Some(reference);
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn on_update(mut self, expression: impl Into<String>) -> Self {
        self.on_update = Some(expression.into());
        self
    }

    /// Dialect override lookup: exact dialect name first, then `"default"`.
    pub fn dialect_type_override(&self, dialect: DialectName) -> Option<&str> {
        self.dialect_types
            .get(dialect.as_str())
            .or_else(|| self.dialect_types.get("default"))
            .map(String::as_str)
    }

    /// Whether the column must be rendered NOT NULL (explicitly or because
    /// it participates in the primary key).
    pub fn effective_not_null(&self) -> bool {
        self.not_null || self.primary
    }
}

/// One column of an index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub column: String,
    pub direction: Option<SortDirection>,
}

impl IndexColumn {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: None,
        }
    }

    pub fn desc(mut self) -> Self {
        self.direction = Some(SortDirection::Desc);
        self
    }
}

/// A desired index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDef {
    pub name: Option<String>,
    pub columns: Vec<IndexColumn>,
    pub unique: bool,
    /// Partial-index predicate, raw SQL
    pub where_clause: Option<String>,
}

impl IndexDef {
    pub fn on(columns: Vec<IndexColumn>) -> Self {
        Self {
            name: None,
            columns,
            unique: false,
            where_clause: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_where(mut self, predicate: impl Into<String>) -> Self {
        self.where_clause = Some(predicate.into());
        self
    }

    /// Index name, defaulting to `idx_<table>_<columns>`.
    pub fn effective_name(&self, table: &str) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => {
                let cols: Vec<&str> = self.columns.iter().map(|c| c.column.as_str()).collect();
                format!("idx_{table}_{}", cols.join("_"))
            }
        }
    }
}

/// Relation cardinality, carried for ORM consumers; the core does not
/// render relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationKind {
    HasOne,
    HasMany,
    BelongsTo,
}

/// A named relation between tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDef {
    pub name: String,
    pub kind: RelationKind,
    pub target_table: String,
    pub local_columns: Vec<String>,
    pub foreign_columns: Vec<String>,
}

/// A desired table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    pub name: String,
    pub schema: Option<String>,
    pub columns: Vec<ColumnDef>,
    /// Composite primary key, by column key; single-column keys may instead
    /// use [`ColumnDef::primary`]
    pub primary_key: Vec<String>,
    pub indexes: Vec<IndexDef>,
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
    pub relations: Vec<RelationDef>,
}

impl TableDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            engine: None,
            charset: None,
            collation: None,
            comment: None,
            relations: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_primary_key(mut self, keys: Vec<String>) -> Self {
        self.primary_key = keys;
        self
    }

    pub fn index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn column_by_key(&self, key: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Column keys forming the primary key: the explicit list, or the
    /// columns flagged primary.
    pub fn primary_key_columns(&self) -> Vec<&ColumnDef> {
        if !self.primary_key.is_empty() {
            self.primary_key
                .iter()
                .filter_map(|k| self.column_by_key(k))
                .collect()
        } else {
            self.columns.iter().filter(|c| c.primary).collect()
        }
    }

    /// Bridge into the AST: a qualified `Column` operand for a column key,
    /// using the wire-level name.
    pub fn column_operand(&self, key: &str) -> Option<Operand> {
        self.column_by_key(key)
            .map(|c| Operand::Column(ColumnExpr::scoped(self.name.clone(), c.name.clone())))
    }

    /// Tables this table references through column-level foreign keys.
    pub fn referenced_tables(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref())
            .map(|r| r.table.as_str())
            .collect()
    }
}

/// Shorthand constructors for [`ColumnDef`].
pub mod col {
    use super::{ColumnDef, ColumnType, TypeArg};

    pub fn int(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Int)
    }

    pub fn big_int(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::BigInt)
    }

    pub fn small_int(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::SmallInt)
    }

    pub fn uuid(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Uuid)
    }

    pub fn boolean(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Boolean)
    }

    pub fn json(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Json)
    }

    pub fn varchar(key: impl Into<String>, length: i64) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Varchar).with_args(vec![TypeArg::Int(length)])
    }

    pub fn text(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Text)
    }

    pub fn timestamp(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Timestamp)
    }

    pub fn timestamp_tz(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::TimestampTz)
    }

    pub fn date(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Date)
    }

    pub fn time(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Time)
    }

    pub fn decimal(key: impl Into<String>, precision: i64, scale: i64) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Decimal)
            .with_args(vec![TypeArg::Int(precision), TypeArg::Int(scale)])
    }

    pub fn float(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Float)
    }

    pub fn double(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Double)
    }

    pub fn blob(key: impl Into<String>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Blob)
    }

    pub fn enumeration(key: impl Into<String>, values: Vec<&str>) -> ColumnDef {
        ColumnDef::new(key, ColumnType::Enum)
            .with_args(values.into_iter().map(|v| TypeArg::Str(v.to_string())).collect())
    }
}
