// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Builtin function definitions
//!
//! The default registry every dialect is constructed with. Most entries are
//! name overrides; the interesting ones are complete rewrites:
//!
//! - `GROUP_CONCAT`: four different aggregate grammars
//! - `LOG_BASE`: argument reorder on SQL Server, `LN` rewrite on SQLite
//! - `DATE_TRUNC`: `DATE_FORMAT` emulation on MySQL, `strftime`-family
//!   emulation on SQLite
//! - `CONCAT`: `||` chain on SQLite
//! - `IIF`: `CASE` rewrite on PostgreSQL and MySQL

use std::sync::Arc;

use sqlmason_ast::{DialectName, FunctionCall, Operand};

use crate::error::{CompileError, CompileResult};
use crate::functions::{
    FunctionDef, FunctionRegistry, FunctionVariant, RenderFn, TableFunctionDef,
};

fn arg<'a>(call: &'a FunctionCall, index: usize, key: &str) -> CompileResult<&'a Operand> {
    call.args.get(index).ok_or_else(|| {
        CompileError::InvalidArgument(format!(
            "{key} expects at least {} argument(s)",
            index + 1
        ))
    })
}

fn group_concat_mysql() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let value = cx.operand(arg(call, 0, "GROUP_CONCAT")?)?;
        let mut sql = String::from("GROUP_CONCAT(");
        if call.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&value);
        if !call.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&cx.order_by_list(&call.order_by)?);
        }
        if let Some(separator) = &call.separator {
            sql.push_str(" SEPARATOR ");
            sql.push_str(&cx.literal_text(separator)?);
        }
        sql.push(')');
        Ok(sql)
    })
}

fn group_concat_postgres() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let value = cx.operand(arg(call, 0, "GROUP_CONCAT")?)?;
        let separator = match &call.separator {
            Some(sep) => cx.literal_text(sep)?,
            None => "','".to_string(),
        };
        let mut sql = String::from("STRING_AGG(");
        if call.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(&value);
        sql.push_str(", ");
        sql.push_str(&separator);
        if !call.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&cx.order_by_list(&call.order_by)?);
        }
        sql.push(')');
        Ok(sql)
    })
}

fn group_concat_mssql() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let value = cx.operand(arg(call, 0, "GROUP_CONCAT")?)?;
        let separator = match &call.separator {
            Some(sep) => cx.literal_text(sep)?,
            None => "','".to_string(),
        };
        let mut sql = format!("STRING_AGG({value}, {separator})");
        if !call.order_by.is_empty() {
            sql.push_str(" WITHIN GROUP (ORDER BY ");
            sql.push_str(&cx.order_by_list(&call.order_by)?);
            sql.push(')');
        }
        Ok(sql)
    })
}

fn group_concat_sqlite() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let value = cx.operand(arg(call, 0, "GROUP_CONCAT")?)?;
        if !call.order_by.is_empty() {
            tracing::warn!("sqlite GROUP_CONCAT does not support ORDER BY; ordering dropped");
        }
        let sql = match &call.separator {
            Some(sep) => format!("GROUP_CONCAT({value}, {})", cx.literal_text(sep)?),
            None => format!("GROUP_CONCAT({value})"),
        };
        Ok(sql)
    })
}

/// `LOG_BASE(base, x)` as `LOG(base, x)`: PostgreSQL and MySQL order.
fn log_base_default() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let base = cx.operand(arg(call, 0, "LOG_BASE")?)?;
        let x = cx.operand(arg(call, 1, "LOG_BASE")?)?;
        Ok(format!("LOG({base}, {x})"))
    })
}

/// SQL Server spells it `LOG(x, base)`. The value argument is compiled
/// first so placeholder numbering matches the emitted order.
fn log_base_mssql() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let x = cx.operand(arg(call, 1, "LOG_BASE")?)?;
        let base = cx.operand(arg(call, 0, "LOG_BASE")?)?;
        Ok(format!("LOG({x}, {base})"))
    })
}

/// SQLite has no two-argument logarithm; rewrite via natural logs.
fn log_base_sqlite() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let x = cx.operand(arg(call, 1, "LOG_BASE")?)?;
        let base = cx.operand(arg(call, 0, "LOG_BASE")?)?;
        Ok(format!("(LN({x}) / LN({base}))"))
    })
}

fn date_trunc_mysql() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let unit = cx.literal_str(arg(call, 0, "DATE_TRUNC")?)?;
        let value = cx.operand(arg(call, 1, "DATE_TRUNC")?)?;
        let format = match unit.to_ascii_lowercase().as_str() {
            "year" => "%Y-01-01 00:00:00",
            "month" => "%Y-%m-01 00:00:00",
            "day" => "%Y-%m-%d 00:00:00",
            "hour" => "%Y-%m-%d %H:00:00",
            "minute" => "%Y-%m-%d %H:%i:00",
            other => {
                return Err(CompileError::InvalidArgument(format!(
                    "DATE_TRUNC unit not supported on mysql: {other}"
                )));
            }
        };
        Ok(format!("DATE_FORMAT({value}, '{format}')"))
    })
}

fn date_trunc_sqlite() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let unit = cx.literal_str(arg(call, 0, "DATE_TRUNC")?)?;
        let value = cx.operand(arg(call, 1, "DATE_TRUNC")?)?;
        let sql = match unit.to_ascii_lowercase().as_str() {
            "year" => format!("DATE({value}, 'start of year')"),
            "month" => format!("DATE({value}, 'start of month')"),
            "day" => format!("DATE({value})"),
            "hour" => format!("STRFTIME('%Y-%m-%d %H:00:00', {value})"),
            "minute" => format!("STRFTIME('%Y-%m-%d %H:%M:00', {value})"),
            other => {
                return Err(CompileError::InvalidArgument(format!(
                    "DATE_TRUNC unit not supported on sqlite: {other}"
                )));
            }
        };
        Ok(sql)
    })
}

/// SQL Server 2022 `DATETRUNC` takes the unit as a bare keyword.
fn date_trunc_mssql() -> RenderFn {
    Arc::new(|cx, call, _name| {
        let unit = cx.literal_str(arg(call, 0, "DATE_TRUNC")?)?;
        if !unit.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CompileError::InvalidArgument(format!(
                "DATE_TRUNC unit must be alphabetic: {unit}"
            )));
        }
        let value = cx.operand(arg(call, 1, "DATE_TRUNC")?)?;
        Ok(format!("DATETRUNC({unit}, {value})"))
    })
}

fn concat_sqlite() -> RenderFn {
    Arc::new(|cx, call, _name| {
        if call.args.is_empty() {
            return Err(CompileError::InvalidArgument(
                "CONCAT expects at least 1 argument(s)".to_string(),
            ));
        }
        let parts = call
            .args
            .iter()
            .map(|a| cx.operand(a))
            .collect::<CompileResult<Vec<_>>>()?;
        Ok(format!("({})", parts.join(" || ")))
    })
}

fn iif_as_case() -> RenderFn {
    Arc::new(|cx, call, _name| {
        if call.args.len() != 3 {
            return Err(CompileError::InvalidArgument(
                "IIF expects exactly 3 arguments".to_string(),
            ));
        }
        let condition = cx.operand(&call.args[0])?;
        let then = cx.operand(&call.args[1])?;
        let otherwise = cx.operand(&call.args[2])?;
        Ok(format!(
            "CASE WHEN {condition} THEN {then} ELSE {otherwise} END"
        ))
    })
}

fn now_sqlite() -> RenderFn {
    Arc::new(|_cx, _call, _name| Ok("CURRENT_TIMESTAMP".to_string()))
}

/// Build the default registry shared by all dialect constructors.
pub fn registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::empty();

    let defs = vec![
        FunctionDef::new("GROUP_CONCAT")
            .variant(DialectName::MySql, FunctionVariant::rendered(group_concat_mysql()))
            .variant(
                DialectName::Postgres,
                FunctionVariant::rendered(group_concat_postgres()),
            )
            .variant(
                DialectName::SqlServer,
                FunctionVariant::rendered(group_concat_mssql()),
            )
            .variant(
                DialectName::Sqlite,
                FunctionVariant::rendered(group_concat_sqlite()),
            ),
        FunctionDef::new("LOG_BASE")
            .with_render(log_base_default())
            .variant(DialectName::SqlServer, FunctionVariant::rendered(log_base_mssql()))
            .variant(DialectName::Sqlite, FunctionVariant::rendered(log_base_sqlite())),
        FunctionDef::new("DATE_TRUNC")
            .with_default_name("DATE_TRUNC")
            .variant(DialectName::MySql, FunctionVariant::rendered(date_trunc_mysql()))
            .variant(DialectName::Sqlite, FunctionVariant::rendered(date_trunc_sqlite()))
            .variant(
                DialectName::SqlServer,
                FunctionVariant::rendered(date_trunc_mssql()),
            ),
        FunctionDef::new("CONCAT")
            .with_default_name("CONCAT")
            .variant(DialectName::Sqlite, FunctionVariant::rendered(concat_sqlite())),
        FunctionDef::new("COALESCE").with_default_name("COALESCE"),
        FunctionDef::new("GREATEST")
            .with_default_name("GREATEST")
            .variant(DialectName::Sqlite, FunctionVariant::named("MAX")),
        FunctionDef::new("LEAST")
            .with_default_name("LEAST")
            .variant(DialectName::Sqlite, FunctionVariant::named("MIN")),
        FunctionDef::new("NOW")
            .with_default_name("NOW")
            .variant(DialectName::SqlServer, FunctionVariant::named("GETDATE"))
            .variant(DialectName::Sqlite, FunctionVariant::rendered(now_sqlite())),
        FunctionDef::new("RANDOM")
            .with_default_name("RANDOM")
            .variant(DialectName::MySql, FunctionVariant::named("RAND"))
            .variant(DialectName::SqlServer, FunctionVariant::named("RAND")),
        FunctionDef::new("LENGTH")
            .with_default_name("LENGTH")
            .variant(DialectName::SqlServer, FunctionVariant::named("LEN")),
        FunctionDef::new("IIF")
            .with_default_name("IIF")
            .variant(DialectName::Postgres, FunctionVariant::rendered(iif_as_case()))
            .variant(DialectName::MySql, FunctionVariant::rendered(iif_as_case())),
        FunctionDef::new("UPPER").with_default_name("UPPER"),
        FunctionDef::new("LOWER").with_default_name("LOWER"),
        FunctionDef::new("ABS").with_default_name("ABS"),
        FunctionDef::new("ROUND").with_default_name("ROUND"),
        FunctionDef::new("COUNT").with_default_name("COUNT"),
        FunctionDef::new("SUM").with_default_name("SUM"),
        FunctionDef::new("AVG").with_default_name("AVG"),
        FunctionDef::new("MIN").with_default_name("MIN"),
        FunctionDef::new("MAX").with_default_name("MAX"),
        FunctionDef::new("ROW_NUMBER").with_default_name("ROW_NUMBER"),
        FunctionDef::new("RANK").with_default_name("RANK"),
    ];

    for def in defs {
        registry
            .register(def)
            .expect("builtin keys are unique by construction");
    }

    registry
        .register_table(
            TableFunctionDef::new("GENERATE_SERIES")
                .available(DialectName::Postgres)
                .available(DialectName::Sqlite)
                .unavailable(DialectName::MySql)
                .unavailable(DialectName::SqlServer),
        )
        .expect("builtin table keys are unique by construction");

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_builds() {
        let registry = registry();
        assert!(registry.get("GROUP_CONCAT").is_some());
        assert!(registry.get("log_base").is_some());
        assert!(registry.get_table("generate_series").is_some());
    }

    #[test]
    fn test_sqlite_greatest_renamed() {
        let registry = registry();
        let def = registry.get("GREATEST").unwrap();
        assert_eq!(def.resolved_name(DialectName::Sqlite), "MAX");
        assert_eq!(def.resolved_name(DialectName::Postgres), "GREATEST");
    }
}
