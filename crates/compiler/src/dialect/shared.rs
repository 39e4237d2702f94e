// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Shared rendering logic for all dialects
//!
//! Every statement renderer lives here as a free function parameterized by
//! the [`Dialect`] capability; the dialect modules only answer questions.
//! All functions thread one [`CompilerContext`] so placeholder numbering is
//! monotonic across nested subqueries within a single statement.

use sqlmason_ast::{
    Cte, DeleteQuery, Expression, FunctionCall, FunctionTable, InsertQuery, InsertSource, Join,
    JoinKind, Literal, LogicalOp, Operand, OrderBy, NullsOrder, ParamDirection, ProcedureCall,
    SelectQuery, TableRef, TableSource, UpdateQuery, WindowSpec,
};

use crate::context::CompilerContext;
use crate::dialect::{Dialect, DmlJoinStyle, LimitStyle, ProcedureStyle, ReturningStyle};
use crate::error::{CompileError, CompileResult};
use crate::functions::FunctionContext;
use crate::statement::Statement;

pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

fn escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Inline literal text. Used for DDL defaults and grammar positions where a
/// parameter is not allowed; query compilation parameterizes instead.
pub fn format_literal<D: Dialect + ?Sized>(dialect: &D, literal: &Literal) -> String {
    match literal {
        Literal::Null => "NULL".to_string(),
        Literal::Boolean(b) => dialect.boolean_literal(*b).to_string(),
        Literal::Integer(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::String(s) => format!("'{}'", escape_string(s)),
        Literal::Bytes(b) => dialect.format_bytes(b),
        _ => unreachable!("unknown Literal variant"),
    }
}

fn quote_qualified(
    dialect: &dyn Dialect,
    schema: Option<&str>,
    name: &str,
) -> CompileResult<String> {
    match schema {
        Some(schema) => Ok(format!(
            "{}.{}",
            dialect.quote_identifier(schema)?,
            dialect.quote_identifier(name)?
        )),
        None => dialect.quote_identifier(name),
    }
}

fn render_table_name(dialect: &dyn Dialect, table: &TableRef) -> CompileResult<String> {
    quote_qualified(dialect, table.schema.as_deref(), &table.name)
}

fn render_table_with_alias(dialect: &dyn Dialect, table: &TableRef) -> CompileResult<String> {
    let mut sql = render_table_name(dialect, table)?;
    if let Some(alias) = &table.alias {
        sql.push_str(" AS ");
        sql.push_str(&dialect.quote_identifier(alias)?);
    }
    Ok(sql)
}

fn render_column_ref(
    dialect: &dyn Dialect,
    table: Option<&str>,
    column: &str,
) -> CompileResult<String> {
    match table {
        Some(table) => Ok(format!(
            "{}.{}",
            dialect.quote_identifier(table)?,
            dialect.quote_identifier(column)?
        )),
        None => dialect.quote_identifier(column),
    }
}

/// Compile a single operand. Literals are extracted into the parameter
/// vector; `Raw` text is inlined verbatim.
pub fn render_operand(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    operand: &Operand,
) -> CompileResult<String> {
    match operand {
        Operand::Column(col) => render_column_ref(dialect, col.qualifier.as_deref(), &col.name),
        Operand::Literal(lit) => Ok(ctx.bind(dialect, lit.clone())),
        Operand::Parameter(position) => Ok(dialect.placeholder(*position)),
        Operand::Function(call) => render_function(dialect, ctx, call),
        Operand::Raw(text) => Ok(text.clone()),
        Operand::Subquery(query) => Ok(format!("({})", render_select(dialect, ctx, query)?)),
        Operand::Case(case) => {
            if case.branches.is_empty() {
                return Err(CompileError::InvalidArgument(
                    "CASE requires at least one WHEN branch".to_string(),
                ));
            }
            let mut sql = String::from("CASE");
            for branch in &case.branches {
                sql.push_str(" WHEN ");
                sql.push_str(&render_expression(dialect, ctx, &branch.when)?);
                sql.push_str(" THEN ");
                sql.push_str(&render_operand(dialect, ctx, &branch.then)?);
            }
            if let Some(else_value) = &case.else_value {
                sql.push_str(" ELSE ");
                sql.push_str(&render_operand(dialect, ctx, else_value)?);
            }
            sql.push_str(" END");
            Ok(sql)
        }
        Operand::Cast { expr, type_name } => Ok(format!(
            "CAST({} AS {type_name})",
            render_operand(dialect, ctx, expr)?
        )),
        Operand::Arithmetic { left, op, right } => Ok(format!(
            "({} {} {})",
            render_operand(dialect, ctx, left)?,
            op.sql_symbol(),
            render_operand(dialect, ctx, right)?
        )),
        _ => unreachable!("unknown Operand variant"),
    }
}

/// Resolve and render a function call through the dialect's registry.
///
/// Resolution order: unregistered key → identifier fallback; unavailable
/// variant → `UnsupportedFunction`; variant renderer → definition renderer →
/// name-based rendering. A window specification applies to every path.
pub fn render_function(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    call: &FunctionCall,
) -> CompileResult<String> {
    let name = dialect.name();
    let base = match dialect.registry().get(&call.key) {
        None => render_function_generic(dialect, ctx, call, &call.key)?,
        Some(def) => {
            let variant = def.variants.get(&name);
            if variant.is_some_and(|v| v.unavailable) {
                return Err(CompileError::UnsupportedFunction {
                    dialect: name,
                    key: def.key.clone(),
                });
            }
            let render = variant
                .and_then(|v| v.render.clone())
                .or_else(|| def.render.clone());
            let resolved = def.resolved_name(name).to_string();
            match render {
                Some(render) => {
                    let mut fn_ctx = FunctionContext {
                        dialect,
                        ctx: &mut *ctx,
                    };
                    render(&mut fn_ctx, call, &resolved)?
                }
                None => render_function_generic(dialect, ctx, call, &resolved)?,
            }
        }
    };
    match &call.over {
        Some(window) => Ok(format!(
            "{base} OVER ({})",
            render_window(dialect, ctx, window)?
        )),
        None => Ok(base),
    }
}

fn render_function_generic(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    call: &FunctionCall,
    name: &str,
) -> CompileResult<String> {
    let args = call
        .args
        .iter()
        .map(|a| render_operand(dialect, ctx, a))
        .collect::<CompileResult<Vec<_>>>()?
        .join(", ");
    let distinct = if call.distinct { "DISTINCT " } else { "" };
    Ok(format!("{name}({distinct}{args})"))
}

fn render_window(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    window: &WindowSpec,
) -> CompileResult<String> {
    let mut parts = Vec::new();
    if !window.partition_by.is_empty() {
        let terms = window
            .partition_by
            .iter()
            .map(|t| render_operand(dialect, ctx, t))
            .collect::<CompileResult<Vec<_>>>()?
            .join(", ");
        parts.push(format!("PARTITION BY {terms}"));
    }
    if !window.order_by.is_empty() {
        parts.push(format!(
            "ORDER BY {}",
            render_order_by_terms(dialect, ctx, &window.order_by)?
        ));
    }
    Ok(parts.join(" "))
}

fn render_logical_side(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    side: &Expression,
    parent: LogicalOp,
) -> CompileResult<String> {
    let sql = render_expression(dialect, ctx, side)?;
    match side {
        Expression::Logical { op, .. } if *op != parent => Ok(format!("({sql})")),
        _ => Ok(sql),
    }
}

/// Compile a boolean condition tree.
pub fn render_expression(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    expression: &Expression,
) -> CompileResult<String> {
    match expression {
        Expression::Binary { left, op, right } => Ok(format!(
            "{} {} {}",
            render_operand(dialect, ctx, left)?,
            op.sql_symbol(),
            render_operand(dialect, ctx, right)?
        )),
        Expression::Logical { op, left, right } => {
            let keyword = match op {
                LogicalOp::And => "AND",
                LogicalOp::Or => "OR",
            };
            Ok(format!(
                "{} {keyword} {}",
                render_logical_side(dialect, ctx, left, *op)?,
                render_logical_side(dialect, ctx, right, *op)?
            ))
        }
        Expression::Not(inner) => Ok(format!(
            "NOT ({})",
            render_expression(dialect, ctx, inner)?
        )),
        Expression::InList { operand, values } => {
            // Empty IN lists are a documented rewrite, not an error.
            if values.is_empty() {
                return Ok("1 = 0".to_string());
            }
            let target = render_operand(dialect, ctx, operand)?;
            let list = values
                .iter()
                .map(|v| render_operand(dialect, ctx, v))
                .collect::<CompileResult<Vec<_>>>()?
                .join(", ");
            Ok(format!("{target} IN ({list})"))
        }
        Expression::Like {
            operand,
            pattern,
            negated,
            case_insensitive,
        } => {
            let not = if *negated { "NOT " } else { "" };
            if *case_insensitive && dialect.supports_ilike() {
                Ok(format!(
                    "{} {not}ILIKE {}",
                    render_operand(dialect, ctx, operand)?,
                    render_operand(dialect, ctx, pattern)?
                ))
            } else if *case_insensitive {
                Ok(format!(
                    "LOWER({}) {not}LIKE LOWER({})",
                    render_operand(dialect, ctx, operand)?,
                    render_operand(dialect, ctx, pattern)?
                ))
            } else {
                Ok(format!(
                    "{} {not}LIKE {}",
                    render_operand(dialect, ctx, operand)?,
                    render_operand(dialect, ctx, pattern)?
                ))
            }
        }
        Expression::IsNull { operand, negated } => Ok(format!(
            "{} IS {}NULL",
            render_operand(dialect, ctx, operand)?,
            if *negated { "NOT " } else { "" }
        )),
        Expression::Between { operand, low, high } => Ok(format!(
            "{} BETWEEN {} AND {}",
            render_operand(dialect, ctx, operand)?,
            render_operand(dialect, ctx, low)?,
            render_operand(dialect, ctx, high)?
        )),
        Expression::Exists { subquery, negated } => Ok(format!(
            "{}EXISTS ({})",
            if *negated { "NOT " } else { "" },
            render_select(dialect, ctx, subquery)?
        )),
        _ => unreachable!("unknown Expression variant"),
    }
}

fn render_order_by_item(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    item: &OrderBy,
) -> CompileResult<String> {
    let term = render_operand(dialect, ctx, &item.term)?;
    let mut sql = term.clone();
    if let Some(collation) = &item.collation {
        sql.push_str(" COLLATE ");
        sql.push_str(collation);
    }
    sql.push(' ');
    sql.push_str(item.direction.sql_keyword());
    match item.nulls {
        None => Ok(sql),
        Some(nulls) if dialect.supports_nulls_ordering() => {
            sql.push_str(match nulls {
                NullsOrder::First => " NULLS FIRST",
                NullsOrder::Last => " NULLS LAST",
            });
            Ok(sql)
        }
        // Emulated with a leading CASE sort key where NULLS FIRST/LAST is
        // not in the grammar.
        Some(nulls) => {
            let (null_key, other_key) = match nulls {
                NullsOrder::First => (0, 1),
                NullsOrder::Last => (1, 0),
            };
            Ok(format!(
                "CASE WHEN {term} IS NULL THEN {null_key} ELSE {other_key} END, {sql}"
            ))
        }
    }
}

/// Render an `ORDER BY` item list, without the keyword.
pub fn render_order_by_terms(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    items: &[OrderBy],
) -> CompileResult<String> {
    Ok(items
        .iter()
        .map(|i| render_order_by_item(dialect, ctx, i))
        .collect::<CompileResult<Vec<_>>>()?
        .join(", "))
}

fn render_function_table(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    table: &FunctionTable,
) -> CompileResult<String> {
    if let Some(key) = &table.key {
        let def = dialect.registry().get_table(key).ok_or_else(|| {
            CompileError::UnsupportedTableFunction {
                dialect: dialect.name(),
                key: key.clone(),
            }
        })?;
        match def.variants.get(&dialect.name()) {
            Some(variant) if variant.unavailable => {
                return Err(CompileError::UnsupportedTableFunction {
                    dialect: dialect.name(),
                    key: def.key.clone(),
                });
            }
            Some(variant) => {
                if let Some(render) = variant.render.clone() {
                    let mut fn_ctx = FunctionContext {
                        dialect,
                        ctx: &mut *ctx,
                    };
                    return render(&mut fn_ctx, table);
                }
            }
            None => {}
        }
    }

    if table.lateral && !dialect.supports_lateral() {
        return Err(CompileError::unsupported(dialect.name(), "LATERAL"));
    }
    if table.with_ordinality && !dialect.supports_with_ordinality() {
        return Err(CompileError::unsupported(dialect.name(), "WITH ORDINALITY"));
    }

    let args = table
        .args
        .iter()
        .map(|a| render_operand(dialect, ctx, a))
        .collect::<CompileResult<Vec<_>>>()?
        .join(", ");
    let mut sql = String::new();
    if table.lateral {
        sql.push_str("LATERAL ");
    }
    if let Some(schema) = &table.schema {
        sql.push_str(&dialect.quote_identifier(schema)?);
        sql.push('.');
    }
    // Function names are identifiers chosen by the caller; they are emitted
    // unquoted so `pragma_table_info('t')` stays callable.
    sql.push_str(&table.name);
    sql.push('(');
    sql.push_str(&args);
    sql.push(')');
    if table.with_ordinality {
        sql.push_str(" WITH ORDINALITY");
    }
    if let Some(alias) = &table.alias {
        sql.push_str(" AS ");
        sql.push_str(&dialect.quote_identifier(alias)?);
        if !table.column_aliases.is_empty() {
            let cols = table
                .column_aliases
                .iter()
                .map(|c| dialect.quote_identifier(c))
                .collect::<CompileResult<Vec<_>>>()?
                .join(", ");
            sql.push('(');
            sql.push_str(&cols);
            sql.push(')');
        }
    }
    Ok(sql)
}

fn render_table_source(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    source: &TableSource,
    alias_override: Option<&str>,
) -> CompileResult<String> {
    match source {
        TableSource::Table(table) => {
            let mut sql = render_table_name(dialect, table)?;
            let alias = alias_override.or(table.alias.as_deref());
            if let Some(alias) = alias {
                sql.push_str(" AS ");
                sql.push_str(&dialect.quote_identifier(alias)?);
            }
            Ok(sql)
        }
        TableSource::Derived {
            query,
            alias,
            column_aliases,
        } => {
            let mut sql = format!(
                "({}) AS {}",
                render_select(dialect, ctx, query)?,
                dialect.quote_identifier(alias)?
            );
            if !column_aliases.is_empty() {
                let cols = column_aliases
                    .iter()
                    .map(|c| dialect.quote_identifier(c))
                    .collect::<CompileResult<Vec<_>>>()?
                    .join(", ");
                sql.push('(');
                sql.push_str(&cols);
                sql.push(')');
            }
            Ok(sql)
        }
        TableSource::Function(table) => render_function_table(dialect, ctx, table),
        _ => unreachable!("unknown TableSource variant"),
    }
}

/// Render `FROM ... [joins]`, re-aliasing colliding unaliased join tables on
/// dialects that reject duplicate exposed names.
fn render_from_and_joins(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    from: &TableSource,
    joins: &[Join],
) -> CompileResult<String> {
    let mut seen: Vec<String> = Vec::new();
    if let Some(name) = from.exposed_name() {
        seen.push(name.to_lowercase());
    }
    let mut sql = format!("FROM {}", render_table_source(dialect, ctx, from, None)?);

    for join in joins {
        if !dialect.supports_join(join.kind) {
            return Err(CompileError::unsupported(
                dialect.name(),
                join.kind.sql_keyword(),
            ));
        }
        let alias_override = if dialect.requires_unique_exposed_names() {
            synthesize_alias(&seen, &join.table)
        } else {
            None
        };
        let exposed = alias_override
            .clone()
            .or_else(|| join.table.exposed_name().map(str::to_string));
        if let Some(exposed) = exposed {
            seen.push(exposed.to_lowercase());
        }

        sql.push(' ');
        sql.push_str(join.kind.sql_keyword());
        sql.push(' ');
        sql.push_str(&render_table_source(
            dialect,
            ctx,
            &join.table,
            alias_override.as_deref(),
        )?);
        match (join.kind, &join.condition) {
            (JoinKind::Cross, None) => {}
            (JoinKind::Cross, Some(_)) => {
                return Err(CompileError::InvalidArgument(
                    "CROSS JOIN cannot carry a condition".to_string(),
                ));
            }
            (_, Some(condition)) => {
                sql.push_str(" ON ");
                sql.push_str(&render_expression(dialect, ctx, condition)?);
            }
            (_, None) => {
                return Err(CompileError::InvalidArgument(format!(
                    "{} requires a condition",
                    join.kind.sql_keyword()
                )));
            }
        }
    }
    Ok(sql)
}

/// An unaliased table whose name is already exposed gets `name_2`,
/// `name_3`, ... Explicit aliases are never rewritten.
fn synthesize_alias(seen: &[String], table: &TableSource) -> Option<String> {
    let TableSource::Table(t) = table else {
        return None;
    };
    if t.alias.is_some() || !seen.contains(&t.name.to_lowercase()) {
        return None;
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{}_{counter}", t.name);
        if !seen.contains(&candidate.to_lowercase()) {
            return Some(candidate);
        }
        counter += 1;
    }
}

fn render_ctes(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    ctes: &[Cte],
) -> CompileResult<(String, usize)> {
    let names: Vec<String> = ctes.iter().map(|c| c.name.clone()).collect();
    let count = ctx.enter_ctes(&names)?;

    let mut sql = String::from("WITH ");
    if ctes.iter().any(|c| c.recursive) && dialect.recursive_cte_requires_keyword() {
        sql.push_str("RECURSIVE ");
    }
    let mut items = Vec::with_capacity(ctes.len());
    for cte in ctes {
        let mut item = dialect.quote_identifier(&cte.name)?;
        if !cte.column_aliases.is_empty() {
            let cols = cte
                .column_aliases
                .iter()
                .map(|c| dialect.quote_identifier(c))
                .collect::<CompileResult<Vec<_>>>()?
                .join(", ");
            item.push('(');
            item.push_str(&cols);
            item.push(')');
        }
        item.push_str(" AS ");
        if let Some(hint) = cte.materialized {
            if dialect.supports_cte_materialization() {
                item.push_str(match hint {
                    sqlmason_ast::CteMaterialization::Materialized => "MATERIALIZED ",
                    sqlmason_ast::CteMaterialization::NotMaterialized => "NOT MATERIALIZED ",
                });
            } else {
                tracing::warn!(
                    dialect = %dialect.name(),
                    cte = %cte.name,
                    "materialization hint dropped"
                );
            }
        }
        item.push('(');
        item.push_str(&render_select(dialect, ctx, &cte.query)?);
        item.push(')');
        items.push(item);
    }
    sql.push_str(&items.join(", "));
    Ok((sql, count))
}

fn render_select_core(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    query: &SelectQuery,
) -> CompileResult<String> {
    if query.columns.is_empty() {
        return Err(CompileError::InvalidArgument(
            "SELECT requires at least one projected column".to_string(),
        ));
    }
    let mut sql = String::from("SELECT ");
    if query.distinct {
        sql.push_str("DISTINCT ");
    }
    let columns = query
        .columns
        .iter()
        .map(|col| {
            let mut item = render_operand(dialect, ctx, &col.expr)?;
            if let Some(alias) = &col.alias {
                item.push_str(" AS ");
                item.push_str(&dialect.quote_identifier(alias)?);
            }
            Ok(item)
        })
        .collect::<CompileResult<Vec<_>>>()?
        .join(", ");
    sql.push_str(&columns);
    sql.push(' ');
    sql.push_str(&render_from_and_joins(dialect, ctx, &query.from, &query.joins)?);

    if let Some(condition) = &query.where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(&render_expression(dialect, ctx, condition)?);
    }
    if !query.group_by.is_empty() {
        let terms = query
            .group_by
            .iter()
            .map(|t| render_operand(dialect, ctx, t))
            .collect::<CompileResult<Vec<_>>>()?
            .join(", ");
        sql.push_str(" GROUP BY ");
        sql.push_str(&terms);
    }
    if let Some(having) = &query.having {
        sql.push_str(" HAVING ");
        sql.push_str(&render_expression(dialect, ctx, having)?);
    }
    Ok(sql)
}

fn validate_set_op_branch(branch: &SelectQuery) -> CompileResult<()> {
    if !branch.set_ops.is_empty() {
        return Err(CompileError::InvalidArgument(
            "set-operation branches cannot nest further set operations".to_string(),
        ));
    }
    if !branch.order_by.is_empty() || branch.limit.is_some() || branch.offset.is_some() {
        return Err(CompileError::InvalidArgument(
            "set-operation branches carry a plain SELECT without tail modifiers".to_string(),
        ));
    }
    Ok(())
}

/// Render a complete `SELECT`, including CTEs, set operations, ordering and
/// pagination, into the given context.
pub fn render_select(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    query: &SelectQuery,
) -> CompileResult<String> {
    let mut sql = String::new();
    let mut cte_count = 0;
    if !query.ctes.is_empty() {
        let (cte_sql, count) = render_ctes(dialect, ctx, &query.ctes)?;
        sql.push_str(&cte_sql);
        sql.push(' ');
        cte_count = count;
    }

    if query.set_ops.is_empty() {
        sql.push_str(&render_select_core(dialect, ctx, query)?);
    } else {
        sql.push('(');
        sql.push_str(&render_select_core(dialect, ctx, query)?);
        sql.push(')');
        for branch in &query.set_ops {
            validate_set_op_branch(&branch.query)?;
            sql.push(' ');
            sql.push_str(branch.operator.sql_keyword());
            sql.push_str(" (");
            sql.push_str(&render_select_core(dialect, ctx, &branch.query)?);
            sql.push(')');
        }
    }

    let paginated = query.limit.is_some() || query.offset.is_some();
    match dialect.limit_style() {
        LimitStyle::LimitOffset => {
            if !query.order_by.is_empty() {
                sql.push_str(" ORDER BY ");
                sql.push_str(&render_order_by_terms(dialect, ctx, &query.order_by)?);
            }
            if let Some(clause) = dialect.pagination_clause(query.limit, query.offset) {
                sql.push(' ');
                sql.push_str(&clause);
            }
        }
        LimitStyle::OffsetFetch => {
            if !query.order_by.is_empty() {
                sql.push_str(" ORDER BY ");
                sql.push_str(&render_order_by_terms(dialect, ctx, &query.order_by)?);
            } else if paginated {
                // OFFSET/FETCH is only valid after an ORDER BY.
                sql.push_str(" ORDER BY (SELECT NULL)");
            }
            if paginated {
                sql.push_str(&format!(" OFFSET {} ROWS", query.offset.unwrap_or(0)));
                if let Some(limit) = query.limit {
                    sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
                }
            }
        }
    }

    ctx.exit_ctes(cte_count);
    Ok(sql)
}

pub fn compile_select(dialect: &dyn Dialect, query: &SelectQuery) -> CompileResult<Statement> {
    let mut ctx = CompilerContext::new();
    let sql = render_select(dialect, &mut ctx, query)?;
    tracing::debug!(dialect = %dialect.name(), %sql, "compiled SELECT");
    Ok(Statement::new(sql, ctx.into_params()))
}

fn render_returning_columns(
    dialect: &dyn Dialect,
    columns: &[sqlmason_ast::ColumnExpr],
) -> CompileResult<String> {
    Ok(columns
        .iter()
        .map(|c| render_column_ref(dialect, c.qualifier.as_deref(), &c.name))
        .collect::<CompileResult<Vec<_>>>()?
        .join(", "))
}

fn render_output_columns(
    dialect: &dyn Dialect,
    columns: &[sqlmason_ast::ColumnExpr],
    source: &str,
) -> CompileResult<String> {
    Ok(columns
        .iter()
        .map(|c| Ok(format!("{source}.{}", dialect.quote_identifier(&c.name)?)))
        .collect::<CompileResult<Vec<_>>>()?
        .join(", "))
}

fn reject_returning_if_unsupported(
    dialect: &dyn Dialect,
    returning: &[sqlmason_ast::ColumnExpr],
) -> CompileResult<()> {
    if !returning.is_empty() && dialect.returning_style() == ReturningStyle::Unsupported {
        return Err(CompileError::unsupported(dialect.name(), "RETURNING"));
    }
    Ok(())
}

pub fn compile_insert(dialect: &dyn Dialect, query: &InsertQuery) -> CompileResult<Statement> {
    if query.columns.is_empty() {
        return Err(CompileError::InvalidArgument(
            "INSERT requires a non-empty column list".to_string(),
        ));
    }
    reject_returning_if_unsupported(dialect, &query.returning)?;

    let mut ctx = CompilerContext::new();
    let columns = query
        .columns
        .iter()
        .map(|c| dialect.quote_identifier(c))
        .collect::<CompileResult<Vec<_>>>()?
        .join(", ");
    let mut sql = format!(
        "INSERT INTO {} ({columns})",
        render_table_name(dialect, &query.into)?
    );

    if !query.returning.is_empty() && dialect.returning_style() == ReturningStyle::OutputClause {
        sql.push_str(" OUTPUT ");
        sql.push_str(&render_output_columns(dialect, &query.returning, "INSERTED")?);
    }

    match &query.source {
        InsertSource::Values(rows) => {
            if rows.is_empty() {
                return Err(CompileError::InvalidArgument(
                    "INSERT requires at least one row of values".to_string(),
                ));
            }
            let mut rendered = Vec::with_capacity(rows.len());
            for row in rows {
                if row.len() != query.columns.len() {
                    return Err(CompileError::InvalidArgument(format!(
                        "INSERT row has {} values for {} columns",
                        row.len(),
                        query.columns.len()
                    )));
                }
                let values = row
                    .iter()
                    .map(|v| render_operand(dialect, &mut ctx, v))
                    .collect::<CompileResult<Vec<_>>>()?
                    .join(", ");
                rendered.push(format!("({values})"));
            }
            sql.push_str(" VALUES ");
            sql.push_str(&rendered.join(", "));
        }
        InsertSource::Select(select) => {
            sql.push(' ');
            sql.push_str(&render_select(dialect, &mut ctx, select)?);
        }
    }

    if !query.returning.is_empty() && dialect.returning_style() == ReturningStyle::Appended {
        sql.push_str(" RETURNING ");
        sql.push_str(&render_returning_columns(dialect, &query.returning)?);
    }

    tracing::debug!(dialect = %dialect.name(), %sql, "compiled INSERT");
    Ok(Statement::new(sql, ctx.into_params()))
}

/// SET-target qualification: a column declared against the table's raw name
/// follows the table's alias; dialects that require bare targets drop the
/// qualifier entirely.
fn set_target(
    dialect: &dyn Dialect,
    table: &TableRef,
    column: &sqlmason_ast::ColumnExpr,
) -> CompileResult<String> {
    if !dialect.qualified_set_targets() {
        return dialect.quote_identifier(&column.name);
    }
    let qualifier = match &column.qualifier {
        Some(q) if table.alias.is_some() && q == &table.name => table.alias.as_deref(),
        Some(q) => Some(q.as_str()),
        None => None,
    };
    render_column_ref(dialect, qualifier, &column.name)
}

pub fn compile_update(dialect: &dyn Dialect, query: &UpdateQuery) -> CompileResult<Statement> {
    if query.set.is_empty() {
        return Err(CompileError::InvalidArgument(
            "UPDATE requires at least one assignment".to_string(),
        ));
    }
    if !query.joins.is_empty() && query.from.is_none() {
        return Err(CompileError::InvalidArgument(
            "UPDATE with joins requires a FROM source".to_string(),
        ));
    }
    reject_returning_if_unsupported(dialect, &query.returning)?;

    let style = dialect.update_join_style();
    let has_sources = query.from.is_some() || !query.joins.is_empty();
    if style == DmlJoinStyle::Unsupported && has_sources {
        return Err(CompileError::unsupported(
            dialect.name(),
            "UPDATE with additional row sources",
        ));
    }

    // Clauses are compiled in their textual order per style, so parameter
    // extraction matches placeholder order.
    let mut ctx = CompilerContext::new();
    let mut sql = match style {
        DmlJoinStyle::Inline => {
            // MySQL: row sources come before SET.
            let mut sql = format!("UPDATE {}", render_table_with_alias(dialect, &query.table)?);
            if let Some(from) = &query.from {
                sql.push_str(", ");
                sql.push_str(&render_table_source(dialect, &mut ctx, from, None)?);
            }
            sql.push_str(&render_joins_only(dialect, &mut ctx, &query.joins)?);
            sql.push_str(" SET ");
            sql.push_str(&render_assignments(dialect, &mut ctx, query)?);
            sql
        }
        DmlJoinStyle::TargetAlias => {
            // SQL Server: UPDATE names the exposed alias, sources follow SET.
            let target = match &query.table.alias {
                Some(alias) => dialect.quote_identifier(alias)?,
                None => render_table_name(dialect, &query.table)?,
            };
            let mut sql = format!(
                "UPDATE {target} SET {}",
                render_assignments(dialect, &mut ctx, query)?
            );
            if !query.returning.is_empty() {
                sql.push_str(" OUTPUT ");
                sql.push_str(&render_output_columns(dialect, &query.returning, "INSERTED")?);
            }
            if has_sources || query.table.alias.is_some() {
                sql.push_str(" FROM ");
                sql.push_str(&render_table_with_alias(dialect, &query.table)?);
                if let Some(from) = &query.from {
                    sql.push_str(", ");
                    sql.push_str(&render_table_source(dialect, &mut ctx, from, None)?);
                }
                sql.push_str(&render_joins_only(dialect, &mut ctx, &query.joins)?);
            }
            sql
        }
        _ => {
            let mut sql = format!(
                "UPDATE {} SET {}",
                render_table_with_alias(dialect, &query.table)?,
                render_assignments(dialect, &mut ctx, query)?
            );
            if let Some(from) = &query.from {
                sql.push_str(" FROM ");
                sql.push_str(&render_table_source(dialect, &mut ctx, from, None)?);
                sql.push_str(&render_joins_only(dialect, &mut ctx, &query.joins)?);
            }
            sql
        }
    };

    if let Some(condition) = &query.where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(&render_expression(dialect, &mut ctx, condition)?);
    }
    if !query.returning.is_empty() && dialect.returning_style() == ReturningStyle::Appended {
        sql.push_str(" RETURNING ");
        sql.push_str(&render_returning_columns(dialect, &query.returning)?);
    }

    tracing::debug!(dialect = %dialect.name(), %sql, "compiled UPDATE");
    Ok(Statement::new(sql, ctx.into_params()))
}

fn render_assignments(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    query: &UpdateQuery,
) -> CompileResult<String> {
    let mut assignments = Vec::with_capacity(query.set.len());
    for assignment in &query.set {
        assignments.push(format!(
            "{} = {}",
            set_target(dialect, &query.table, &assignment.column)?,
            render_operand(dialect, ctx, &assignment.value)?
        ));
    }
    Ok(assignments.join(", "))
}

fn render_joins_only(
    dialect: &dyn Dialect,
    ctx: &mut CompilerContext,
    joins: &[Join],
) -> CompileResult<String> {
    let mut sql = String::new();
    for join in joins {
        if !dialect.supports_join(join.kind) {
            return Err(CompileError::unsupported(
                dialect.name(),
                join.kind.sql_keyword(),
            ));
        }
        sql.push(' ');
        sql.push_str(join.kind.sql_keyword());
        sql.push(' ');
        sql.push_str(&render_table_source(dialect, ctx, &join.table, None)?);
        match (join.kind, &join.condition) {
            (JoinKind::Cross, None) => {}
            (_, Some(condition)) => {
                sql.push_str(" ON ");
                sql.push_str(&render_expression(dialect, ctx, condition)?);
            }
            (JoinKind::Cross, Some(_)) | (_, None) => {
                return Err(CompileError::InvalidArgument(format!(
                    "{} condition mismatch",
                    join.kind.sql_keyword()
                )));
            }
        }
    }
    Ok(sql)
}

pub fn compile_delete(dialect: &dyn Dialect, query: &DeleteQuery) -> CompileResult<Statement> {
    if !query.joins.is_empty() && query.using.is_none() {
        return Err(CompileError::InvalidArgument(
            "DELETE with joins requires a USING source".to_string(),
        ));
    }
    reject_returning_if_unsupported(dialect, &query.returning)?;

    let style = dialect.delete_join_style();
    let has_sources = query.using.is_some() || !query.joins.is_empty();
    if style == DmlJoinStyle::Unsupported && has_sources {
        return Err(CompileError::unsupported(
            dialect.name(),
            "DELETE with USING",
        ));
    }

    let mut ctx = CompilerContext::new();
    let mut sql = match style {
        DmlJoinStyle::Inline if has_sources => {
            let exposed = dialect.quote_identifier(query.from.exposed_name())?;
            let mut sql = format!(
                "DELETE {exposed} FROM {}",
                render_table_with_alias(dialect, &query.from)?
            );
            if let Some(using) = &query.using {
                sql.push_str(", ");
                sql.push_str(&render_table_source(dialect, &mut ctx, using, None)?);
            }
            sql.push_str(&render_joins_only(dialect, &mut ctx, &query.joins)?);
            sql
        }
        DmlJoinStyle::TargetAlias => {
            if has_sources || query.from.alias.is_some() {
                let target = match &query.from.alias {
                    Some(alias) => dialect.quote_identifier(alias)?,
                    None => render_table_name(dialect, &query.from)?,
                };
                let mut sql = format!("DELETE {target}");
                if !query.returning.is_empty() {
                    sql.push_str(" OUTPUT ");
                    sql.push_str(&render_output_columns(dialect, &query.returning, "DELETED")?);
                }
                sql.push_str(" FROM ");
                sql.push_str(&render_table_with_alias(dialect, &query.from)?);
                if let Some(using) = &query.using {
                    sql.push_str(", ");
                    sql.push_str(&render_table_source(dialect, &mut ctx, using, None)?);
                }
                sql.push_str(&render_joins_only(dialect, &mut ctx, &query.joins)?);
                sql
            } else {
                let mut sql = format!("DELETE FROM {}", render_table_name(dialect, &query.from)?);
                if !query.returning.is_empty() {
                    sql.push_str(" OUTPUT ");
                    sql.push_str(&render_output_columns(dialect, &query.returning, "DELETED")?);
                }
                sql
            }
        }
        DmlJoinStyle::FromClause => {
            let mut sql = format!(
                "DELETE FROM {}",
                render_table_with_alias(dialect, &query.from)?
            );
            if let Some(using) = &query.using {
                sql.push_str(" USING ");
                sql.push_str(&render_table_source(dialect, &mut ctx, using, None)?);
                sql.push_str(&render_joins_only(dialect, &mut ctx, &query.joins)?);
            }
            sql
        }
        _ => format!(
            "DELETE FROM {}",
            render_table_with_alias(dialect, &query.from)?
        ),
    };

    if let Some(condition) = &query.where_clause {
        sql.push_str(" WHERE ");
        sql.push_str(&render_expression(dialect, &mut ctx, condition)?);
    }
    if !query.returning.is_empty() && dialect.returning_style() == ReturningStyle::Appended {
        sql.push_str(" RETURNING ");
        sql.push_str(&render_returning_columns(dialect, &query.returning)?);
    }

    tracing::debug!(dialect = %dialect.name(), %sql, "compiled DELETE");
    Ok(Statement::new(sql, ctx.into_params()))
}

fn validate_param_name(name: &str) -> CompileResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(CompileError::InvalidArgument(format!(
            "invalid procedure parameter name: {name}"
        )))
    }
}

pub fn compile_procedure_call(
    dialect: &dyn Dialect,
    call: &ProcedureCall,
) -> CompileResult<Statement> {
    let mut ctx = CompilerContext::new();
    let name = quote_qualified(dialect, call.schema.as_deref(), &call.name)?;

    let sql = match dialect.procedure_style() {
        ProcedureStyle::Unsupported => {
            return Err(CompileError::unsupported(
                dialect.name(),
                "stored procedures",
            ));
        }
        ProcedureStyle::Call => {
            let args = call
                .params
                .iter()
                .map(|p| match &p.value {
                    Some(value) => render_operand(dialect, &mut ctx, value),
                    None => Ok("NULL".to_string()),
                })
                .collect::<CompileResult<Vec<_>>>()?
                .join(", ");
            format!("CALL {name}({args})")
        }
        ProcedureStyle::Exec => {
            let mut declares = Vec::new();
            let mut args = Vec::new();
            let mut selects = Vec::new();
            for param in &call.params {
                validate_param_name(&param.name)?;
                match param.direction {
                    ParamDirection::In => {
                        let value = match &param.value {
                            Some(value) => render_operand(dialect, &mut ctx, value)?,
                            None => "NULL".to_string(),
                        };
                        args.push(format!("@{} = {value}", param.name));
                    }
                    ParamDirection::Out | ParamDirection::InOut => {
                        let db_type = param.db_type.as_deref().ok_or_else(|| {
                            CompileError::unsupported(
                                dialect.name(),
                                format!("OUT parameter {} without db_type", param.name),
                            )
                        })?;
                        let mut declare = format!("DECLARE @{} {db_type}", param.name);
                        if param.direction == ParamDirection::InOut {
                            if let Some(value) = &param.value {
                                declare.push_str(" = ");
                                declare.push_str(&render_operand(dialect, &mut ctx, value)?);
                            }
                        }
                        declare.push(';');
                        declares.push(declare);
                        args.push(format!("@{0} = @{0} OUTPUT", param.name));
                        selects.push(format!(
                            "@{} AS {}",
                            param.name,
                            dialect.quote_identifier(&param.name)?
                        ));
                    }
                }
            }
            let mut sql = String::new();
            for declare in &declares {
                sql.push_str(declare);
                sql.push(' ');
            }
            sql.push_str("EXEC ");
            sql.push_str(&name);
            if !args.is_empty() {
                sql.push(' ');
                sql.push_str(&args.join(", "));
            }
            if !selects.is_empty() {
                sql.push_str("; SELECT ");
                sql.push_str(&selects.join(", "));
            }
            sql
        }
    };

    tracing::debug!(dialect = %dialect.name(), %sql, "compiled procedure call");
    Ok(Statement::new(sql, ctx.into_params()))
}
