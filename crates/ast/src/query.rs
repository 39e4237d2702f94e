// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Statement nodes
//!
//! This module defines the statement level of the AST: [`SelectQuery`],
//! [`InsertQuery`], [`UpdateQuery`], [`DeleteQuery`], and [`ProcedureCall`],
//! together with their supporting nodes (table sources, joins, ordering,
//! CTEs, set operations).
//!
//! ## Structure
//!
//! A [`SelectQuery`] owns its `FROM` source, projection, joins, filters,
//! grouping, ordering, pagination, CTEs, and set-operation tail. When
//! `set_ops` is non-empty, the query's own `order_by` / `limit` / `offset`
//! apply to the *combined* result; each [`SetOpBranch::query`] carries only
//! a plain `SELECT` without tail modifiers.
//!
//! ## Table sources
//!
//! [`TableSource`] unifies the three things that can appear in `FROM` or in
//! a join: a named table, a derived table (parenthesized subquery with an
//! alias), and a table-valued function (`pragma_table_info('t')`,
//! `generate_series(1, 10)`), optionally `LATERAL` and `WITH ORDINALITY`.
//!
//! ## Builders
//!
//! Every node offers value-style builders, so query construction reads
//! top-down:
//!
//! ```
//! use sqlmason_ast::{SelectQuery, TableRef, column, eq, literal};
//!
//! let query = SelectQuery::from(TableRef::new("users").with_alias("u"))
//!     .select(vec![column("u", "id"), column("u", "name")])
//!     .with_where(eq(column("u", "active"), literal(true)))
//!     .with_limit(10);
//! # let _ = query;
//! ```

use serde::{Deserialize, Serialize};

use crate::expr::{ColumnExpr, Expression, Operand};

/// A named table, optionally schema-qualified and aliased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub name: String,
    pub schema: Option<String>,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            alias: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name this table is exposed under inside the query.
    pub fn exposed_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// A table-valued function in `FROM` position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionTable {
    pub schema: Option<String>,
    /// SQL identifier used when no registered renderer applies
    pub name: String,
    pub args: Vec<Operand>,
    pub lateral: bool,
    pub with_ordinality: bool,
    pub alias: Option<String>,
    pub column_aliases: Vec<String>,
    /// Canonical registry key. When set, an unregistered key is an error
    /// rather than falling through to identifier rendering.
    pub key: Option<String>,
}

impl FunctionTable {
    pub fn new(name: impl Into<String>, args: Vec<Operand>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            args,
            lateral: false,
            with_ordinality: false,
            alias: None,
            column_aliases: Vec::new(),
            key: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn lateral(mut self) -> Self {
        self.lateral = true;
        self
    }

    pub fn with_ordinality(mut self) -> Self {
        self.with_ordinality = true;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_column_aliases(mut self, aliases: Vec<String>) -> Self {
        self.column_aliases = aliases;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Anything that can appear in `FROM` or be joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum TableSource {
    /// Named table
    Table(TableRef),

    /// Derived table: `(SELECT ...) AS alias(col, ...)`
    Derived {
        query: Box<SelectQuery>,
        alias: String,
        column_aliases: Vec<String>,
    },

    /// Table-valued function
    Function(FunctionTable),
}

impl TableSource {
    /// The name the source is exposed under, if it has one.
    pub fn exposed_name(&self) -> Option<&str> {
        match self {
            TableSource::Table(t) => Some(t.exposed_name()),
            TableSource::Derived { alias, .. } => Some(alias),
            TableSource::Function(f) => f.alias.as_deref(),
        }
    }

    /// The underlying raw table name, ignoring aliases.
    pub fn raw_name(&self) -> Option<&str> {
        match self {
            TableSource::Table(t) => Some(&t.name),
            _ => None,
        }
    }
}

impl From<TableRef> for TableSource {
    fn from(value: TableRef) -> Self {
        TableSource::Table(value)
    }
}

impl From<FunctionTable> for TableSource {
    fn from(value: FunctionTable) -> Self {
        TableSource::Function(value)
    }
}

/// Join flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
            JoinKind::Cross => "CROSS JOIN",
        }
    }
}

/// A join clause. `CROSS` joins carry no condition; every other kind must.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableSource,
    pub condition: Option<Expression>,
    /// Caller-side bookkeeping (relation name in an ORM); ignored by the
    /// compiler.
    pub relation_alias: Option<String>,
}

impl Join {
    pub fn new(kind: JoinKind, table: impl Into<TableSource>, condition: Expression) -> Self {
        Self {
            kind,
            table: table.into(),
            condition: Some(condition),
            relation_alias: None,
        }
    }

    pub fn cross(table: impl Into<TableSource>) -> Self {
        Self {
            kind: JoinKind::Cross,
            table: table.into(),
            condition: None,
            relation_alias: None,
        }
    }

    pub fn with_relation_alias(mut self, alias: impl Into<String>) -> Self {
        self.relation_alias = Some(alias.into());
        self
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Placement of NULL rows in an ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullsOrder {
    First,
    Last,
}

/// One `ORDER BY` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub term: Operand,
    pub direction: SortDirection,
    pub nulls: Option<NullsOrder>,
    pub collation: Option<String>,
}

impl OrderBy {
    pub fn asc(term: impl Into<Operand>) -> Self {
        Self {
            term: term.into(),
            direction: SortDirection::Asc,
            nulls: None,
            collation: None,
        }
    }

    pub fn desc(term: impl Into<Operand>) -> Self {
        Self {
            term: term.into(),
            direction: SortDirection::Desc,
            nulls: None,
            collation: None,
        }
    }

    pub fn with_nulls(mut self, nulls: NullsOrder) -> Self {
        self.nulls = Some(nulls);
        self
    }

    pub fn with_collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }
}

/// Set operator joining two selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetOperator {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl SetOperator {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SetOperator::Union => "UNION",
            SetOperator::UnionAll => "UNION ALL",
            SetOperator::Intersect => "INTERSECT",
            SetOperator::Except => "EXCEPT",
        }
    }
}

/// One branch of a set-operation tail. The branch query carries only the
/// local `SELECT`; tail modifiers belong to the outermost query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOpBranch {
    pub operator: SetOperator,
    pub query: SelectQuery,
}

/// CTE materialization hint (PostgreSQL, SQLite).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CteMaterialization {
    Materialized,
    NotMaterialized,
}

/// Common table expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cte {
    pub name: String,
    pub column_aliases: Vec<String>,
    pub query: Box<SelectQuery>,
    pub recursive: bool,
    pub materialized: Option<CteMaterialization>,
}

impl Cte {
    pub fn new(name: impl Into<String>, query: SelectQuery) -> Self {
        Self {
            name: name.into(),
            column_aliases: Vec::new(),
            query: Box::new(query),
            recursive: false,
            materialized: None,
        }
    }

    pub fn with_column_aliases(mut self, aliases: Vec<String>) -> Self {
        self.column_aliases = aliases;
        self
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    pub fn with_materialized(mut self, hint: CteMaterialization) -> Self {
        self.materialized = Some(hint);
        self
    }
}

/// One projected column: an operand plus an optional alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectColumn {
    pub expr: Operand,
    pub alias: Option<String>,
}

impl SelectColumn {
    pub fn new(expr: impl Into<Operand>) -> Self {
        Self {
            expr: expr.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl From<Operand> for SelectColumn {
    fn from(expr: Operand) -> Self {
        SelectColumn { expr, alias: None }
    }
}

/// A `SELECT` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub from: TableSource,
    pub columns: Vec<SelectColumn>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expression>,
    pub group_by: Vec<Operand>,
    pub having: Option<Expression>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub distinct: bool,
    pub ctes: Vec<Cte>,
    pub set_ops: Vec<SetOpBranch>,
}

impl SelectQuery {
    pub fn from(source: impl Into<TableSource>) -> Self {
        Self {
            from: source.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            where_clause: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            ctes: Vec::new(),
            set_ops: Vec::new(),
        }
    }

    /// Project a list of bare operands.
    pub fn select(mut self, columns: Vec<Operand>) -> Self {
        self.columns = columns.into_iter().map(SelectColumn::from).collect();
        self
    }

    /// Project aliased columns.
    pub fn select_as(mut self, columns: Vec<SelectColumn>) -> Self {
        self.columns = columns;
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn inner_join(self, table: impl Into<TableSource>, on: Expression) -> Self {
        self.join(Join::new(JoinKind::Inner, table, on))
    }

    pub fn left_join(self, table: impl Into<TableSource>, on: Expression) -> Self {
        self.join(Join::new(JoinKind::Left, table, on))
    }

    pub fn with_where(mut self, condition: Expression) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn with_group_by(mut self, terms: Vec<Operand>) -> Self {
        self.group_by = terms;
        self
    }

    pub fn with_having(mut self, condition: Expression) -> Self {
        self.having = Some(condition);
        self
    }

    pub fn with_order_by(mut self, order_by: Vec<OrderBy>) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn order_by(mut self, item: OrderBy) -> Self {
        self.order_by.push(item);
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn with_ctes(mut self, ctes: Vec<Cte>) -> Self {
        self.ctes = ctes;
        self
    }

    pub fn set_op(mut self, operator: SetOperator, query: SelectQuery) -> Self {
        self.set_ops.push(SetOpBranch { operator, query });
        self
    }

    pub fn union(self, query: SelectQuery) -> Self {
        self.set_op(SetOperator::Union, query)
    }

    pub fn union_all(self, query: SelectQuery) -> Self {
        self.set_op(SetOperator::UnionAll, query)
    }
}

/// Row source of an `INSERT`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InsertSource {
    /// `VALUES (..), (..)`; every row must match the column count
    Values(Vec<Vec<Operand>>),
    /// `INSERT ... SELECT`
    Select(Box<SelectQuery>),
}

/// An `INSERT` statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertQuery {
    pub into: TableRef,
    /// Target column names; must be non-empty
    pub columns: Vec<String>,
    pub source: InsertSource,
    pub returning: Vec<ColumnExpr>,
}

impl InsertQuery {
    pub fn new(into: TableRef, columns: Vec<String>) -> Self {
        Self {
            into,
            columns,
            source: InsertSource::Values(Vec::new()),
            returning: Vec::new(),
        }
    }

    pub fn values(mut self, rows: Vec<Vec<Operand>>) -> Self {
        self.source = InsertSource::Values(rows);
        self
    }

    pub fn from_select(mut self, query: SelectQuery) -> Self {
        self.source = InsertSource::Select(Box::new(query));
        self
    }

    pub fn with_returning(mut self, columns: Vec<ColumnExpr>) -> Self {
        self.returning = columns;
        self
    }
}

/// One `SET column = value` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub column: ColumnExpr,
    pub value: Operand,
}

/// An `UPDATE` statement. A non-empty `joins` list requires `from`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateQuery {
    pub table: TableRef,
    pub set: Vec<Assignment>,
    pub from: Option<TableSource>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expression>,
    pub returning: Vec<ColumnExpr>,
}

impl UpdateQuery {
    pub fn new(table: TableRef) -> Self {
        Self {
            table,
            set: Vec::new(),
            from: None,
            joins: Vec::new(),
            where_clause: None,
            returning: Vec::new(),
        }
    }

    pub fn set(mut self, column: ColumnExpr, value: impl Into<Operand>) -> Self {
        self.set.push(Assignment {
            column,
            value: value.into(),
        });
        self
    }

    pub fn with_from(mut self, from: impl Into<TableSource>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn with_where(mut self, condition: Expression) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn with_returning(mut self, columns: Vec<ColumnExpr>) -> Self {
        self.returning = columns;
        self
    }
}

/// A `DELETE` statement. A non-empty `joins` list requires `using`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteQuery {
    pub from: TableRef,
    pub using: Option<TableSource>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expression>,
    pub returning: Vec<ColumnExpr>,
}

impl DeleteQuery {
    pub fn new(from: TableRef) -> Self {
        Self {
            from,
            using: None,
            joins: Vec::new(),
            where_clause: None,
            returning: Vec::new(),
        }
    }

    pub fn with_using(mut self, using: impl Into<TableSource>) -> Self {
        self.using = Some(using.into());
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn with_where(mut self, condition: Expression) -> Self {
        self.where_clause = Some(condition);
        self
    }

    pub fn with_returning(mut self, columns: Vec<ColumnExpr>) -> Self {
        self.returning = columns;
        self
    }
}

/// Direction of a procedure parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamDirection {
    In,
    Out,
    InOut,
}

/// One procedure parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureParam {
    pub name: String,
    pub direction: ParamDirection,
    pub value: Option<Operand>,
    /// Declared SQL type, required by dialects that must `DECLARE` output
    /// variables (SQL Server).
    pub db_type: Option<String>,
}

impl ProcedureParam {
    pub fn input(name: impl Into<String>, value: impl Into<Operand>) -> Self {
        Self {
            name: name.into(),
            direction: ParamDirection::In,
            value: Some(value.into()),
            db_type: None,
        }
    }

    pub fn output(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: ParamDirection::Out,
            value: None,
            db_type: None,
        }
    }

    pub fn with_db_type(mut self, db_type: impl Into<String>) -> Self {
        self.db_type = Some(db_type.into());
        self
    }
}

/// A stored-procedure invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureCall {
    pub name: String,
    pub schema: Option<String>,
    pub params: Vec<ProcedureParam>,
}

impl ProcedureCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            params: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn param(mut self, param: ProcedureParam) -> Self {
        self.params.push(param);
        self
    }
}
