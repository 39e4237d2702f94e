// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Operands and expressions
//!
//! This module defines the value level of the AST.
//!
//! ## Design
//!
//! An [`Operand`] is a single value slot: a column reference, a literal, an
//! explicit positional parameter, a function call, a raw SQL fragment, a
//! scalar subquery, a `CASE`, or a `CAST`. An [`Expression`] is a boolean
//! condition built from operands: comparisons, `AND`/`OR` trees, `IN` lists,
//! `LIKE`, `IS NULL`, `BETWEEN`, `EXISTS`.
//!
//! The split matters to the compiler: literal operands are extracted into
//! the positional parameter vector in left-to-right appearance order, while
//! [`Operand::Raw`] fragments are inlined verbatim and never scanned for
//! literals.
//!
//! ## Function calls
//!
//! [`FunctionCall`] names a function by *canonical key* (`"GROUP_CONCAT"`,
//! `"LOG_BASE"`, ...). The key is resolved against the dialect's function
//! registry at compile time, which may rename the function, rewrite it
//! completely, or reject it for the dialect. Aggregate calls can carry an
//! ordering and a separator (`GROUP_CONCAT(x ORDER BY y SEPARATOR ', ')`),
//! and any call can carry a window specification rendered as `OVER (...)`.

use serde::{Deserialize, Serialize};

use crate::query::{OrderBy, SelectQuery};

/// A literal SQL value.
///
/// This is also the wire value exchanged with the executor: compiled
/// statements carry their parameters as a `Vec<Literal>`, and result rows
/// come back as `Literal` cells. No driver-specific binding types exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Literal {
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// String content, if this literal is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Literal::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// A column expression, resolved against the exposed name of a table
/// source.
///
/// `qualifier` names the FROM entry, join, or CTE the column belongs to; it
/// is the alias when the source is aliased, the raw table name otherwise. A
/// bare column leaves resolution to the database. The compiler quotes
/// qualifier and name independently, so neither part may smuggle dots or
/// quoting into the output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnExpr {
    /// Exposed source name the column resolves against
    pub qualifier: Option<String>,
    /// Column identifier
    pub name: String,
}

impl ColumnExpr {
    /// Unqualified column.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    /// Column scoped to a table source's exposed name.
    pub fn scoped(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ColumnExpr {
    /// Dotted, unquoted path; diagnostics only.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(qualifier) = &self.qualifier {
            write!(f, "{qualifier}.")?;
        }
        f.write_str(&self.name)
    }
}

/// Window specification attached to a function call, rendered as
/// `OVER (PARTITION BY ... ORDER BY ...)`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowSpec {
    pub partition_by: Vec<Operand>,
    pub order_by: Vec<OrderBy>,
}

/// A scalar or aggregate function call, named by canonical registry key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Canonical key, resolved against the dialect's function registry.
    /// Unregistered keys fall through to identifier-based rendering.
    pub key: String,
    pub args: Vec<Operand>,
    /// `COUNT(DISTINCT x)`-style modifier
    pub distinct: bool,
    /// Aggregate ordering (`GROUP_CONCAT(x ORDER BY y)`)
    pub order_by: Vec<OrderBy>,
    /// Aggregate separator (`GROUP_CONCAT(x SEPARATOR ', ')`)
    pub separator: Option<Box<Operand>>,
    /// Window specification (`OVER (...)`)
    pub over: Option<WindowSpec>,
}

impl FunctionCall {
    pub fn new(key: impl Into<String>, args: Vec<Operand>) -> Self {
        Self {
            key: key.into(),
            args,
            distinct: false,
            order_by: Vec::new(),
            separator: None,
            over: None,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn with_separator(mut self, separator: Operand) -> Self {
        self.separator = Some(Box::new(separator));
        self
    }

    pub fn with_over(mut self, over: WindowSpec) -> Self {
        self.over = Some(over);
        self
    }
}

/// One `WHEN ... THEN ...` arm of a `CASE` expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseBranch {
    pub when: Expression,
    pub then: Operand,
}

/// A searched `CASE` expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseExpr {
    pub branches: Vec<CaseBranch>,
    pub else_value: Option<Operand>,
}

/// A single value slot in an expression or projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Operand {
    /// Column reference
    Column(ColumnExpr),

    /// Literal value, extracted into the parameter vector at compile time
    Literal(Literal),

    /// Explicit positional parameter (1-based)
    Parameter(usize),

    /// Function call resolved through the registry
    Function(Box<FunctionCall>),

    /// Raw SQL text, inlined verbatim. The caller is responsible for
    /// dialect correctness and escaping.
    Raw(String),

    /// Scalar subquery
    Subquery(Box<SelectQuery>),

    /// Searched CASE
    Case(Box<CaseExpr>),

    /// `CAST(expr AS type_name)`
    Cast {
        expr: Box<Operand>,
        type_name: String,
    },

    /// Arithmetic over two operands (`a + b`, `a % b`, ...)
    Arithmetic {
        left: Box<Operand>,
        op: BinaryOp,
        right: Box<Operand>,
    },
}

impl From<ColumnExpr> for Operand {
    fn from(value: ColumnExpr) -> Self {
        Operand::Column(value)
    }
}

impl From<Literal> for Operand {
    fn from(value: Literal) -> Self {
        Operand::Literal(value)
    }
}

impl From<FunctionCall> for Operand {
    fn from(value: FunctionCall) -> Self {
        Operand::Function(Box::new(value))
    }
}

/// Binary operators over operands.
///
/// Comparison operators produce boolean expressions; arithmetic operators
/// appear inside [`Operand::Arithmetic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum BinaryOp {
    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    /// The SQL token for this operator. Identical across the four dialects.
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// A boolean condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Expression {
    /// Comparison of two operands
    Binary {
        left: Operand,
        op: BinaryOp,
        right: Operand,
    },

    /// `AND` / `OR` of two conditions
    Logical {
        op: LogicalOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Negated condition
    Not(Box<Expression>),

    /// `x IN (a, b, c)`. An empty value list compiles to a constant-false
    /// comparison rather than invalid SQL.
    InList {
        operand: Operand,
        values: Vec<Operand>,
    },

    /// `x [NOT] LIKE pattern`, optionally case-insensitive
    Like {
        operand: Operand,
        pattern: Operand,
        negated: bool,
        case_insensitive: bool,
    },

    /// `x IS [NOT] NULL`
    IsNull { operand: Operand, negated: bool },

    /// `x BETWEEN low AND high`
    Between {
        operand: Operand,
        low: Operand,
        high: Operand,
    },

    /// `[NOT] EXISTS (subquery)`
    Exists {
        subquery: Box<SelectQuery>,
        negated: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_expr_scoping() {
        let bare = ColumnExpr::bare("id");
        assert!(bare.qualifier.is_none());
        assert_eq!(bare.to_string(), "id");

        let scoped = ColumnExpr::scoped("u", "id");
        assert_eq!(scoped.qualifier.as_deref(), Some("u"));
        assert_eq!(scoped.to_string(), "u.id");
        assert_ne!(bare, scoped);
    }

    #[test]
    fn test_function_call_builders() {
        let call = FunctionCall::new("COUNT", vec![Operand::Column(ColumnExpr::bare("id"))])
            .distinct()
            .with_separator(Operand::Literal(Literal::String(", ".into())));
        assert!(call.distinct);
        assert!(call.separator.is_some());
        assert_eq!(call.key, "COUNT");
    }

    #[test]
    fn test_literal_accessors() {
        assert!(Literal::Null.is_null());
        assert_eq!(Literal::Integer(7).as_integer(), Some(7));
        assert_eq!(Literal::String("x".into()).as_str(), Some("x"));
        assert_eq!(Literal::Boolean(true).as_bool(), Some(true));
    }

    #[test]
    fn test_serde_round_trip() {
        let expr = Expression::Binary {
            left: Operand::Column(ColumnExpr::scoped("u", "id")),
            op: BinaryOp::Eq,
            right: Operand::Literal(Literal::Integer(1)),
        };
        let json = serde_json::to_string(&expr).unwrap();
        let back: Expression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}
