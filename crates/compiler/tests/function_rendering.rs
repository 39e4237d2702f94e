// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Function registry resolution and dialect rewrites

use pretty_assertions::assert_eq;
use sqlmason_ast::{
    FunctionTable, Literal, OrderBy, SelectQuery, TableRef, WindowSpec, bare_column, column, func,
    literal,
};
use sqlmason_compiler::{
    CompileError, Dialect, FunctionDef, FunctionRegistry, FunctionVariant, MySqlDialect,
    PostgresDialect, SqlServerDialect, SqliteDialect,
};

fn select_expr(call: sqlmason_ast::FunctionCall) -> SelectQuery {
    SelectQuery::from(TableRef::new("t")).select(vec![call.into()])
}

fn group_concat_call() -> sqlmason_ast::FunctionCall {
    func("GROUP_CONCAT", vec![bare_column("name")])
        .with_order_by(vec![OrderBy::desc(bare_column("name"))])
        .with_separator(literal("; "))
}

#[test]
fn test_group_concat_mysql() {
    let statement = MySqlDialect::new()
        .compile_select(&select_expr(group_concat_call()))
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT GROUP_CONCAT(`name` ORDER BY `name` DESC SEPARATOR '; ') FROM `t`"
    );
    assert!(statement.params.is_empty());
}

#[test]
fn test_group_concat_postgres() {
    let statement = PostgresDialect::new()
        .compile_select(&select_expr(group_concat_call()))
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT STRING_AGG(\"name\", '; ' ORDER BY \"name\" DESC) FROM \"t\""
    );
}

#[test]
fn test_group_concat_mssql() {
    let statement = SqlServerDialect::new()
        .compile_select(&select_expr(group_concat_call()))
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT STRING_AGG([name], '; ') WITHIN GROUP (ORDER BY [name] DESC) FROM [t]"
    );
}

#[test]
fn test_group_concat_sqlite_drops_ordering() {
    let statement = SqliteDialect::new()
        .compile_select(&select_expr(group_concat_call()))
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT GROUP_CONCAT(\"name\", '; ') FROM \"t\""
    );
}

#[test]
fn test_log_base_rewrite_sqlite() {
    let call = func("LOG_BASE", vec![literal(10), literal(100)]);
    let statement = SqliteDialect::new()
        .compile_select(&select_expr(call))
        .unwrap();
    assert_eq!(statement.sql, "SELECT (LN(?) / LN(?)) FROM \"t\"");
    assert_eq!(
        statement.params,
        vec![Literal::Integer(100), Literal::Integer(10)]
    );
}

#[test]
fn test_log_base_argument_order_mssql() {
    let call = func("LOG_BASE", vec![literal(10), literal(100)]);
    let statement = SqlServerDialect::new()
        .compile_select(&select_expr(call))
        .unwrap();
    assert_eq!(statement.sql, "SELECT LOG(@p1, @p2) FROM [t]");
    assert_eq!(
        statement.params,
        vec![Literal::Integer(100), Literal::Integer(10)]
    );
}

#[test]
fn test_log_base_default_order_postgres() {
    let call = func("LOG_BASE", vec![literal(10), literal(100)]);
    let statement = PostgresDialect::new()
        .compile_select(&select_expr(call))
        .unwrap();
    assert_eq!(statement.sql, "SELECT LOG($1, $2) FROM \"t\"");
    assert_eq!(
        statement.params,
        vec![Literal::Integer(10), Literal::Integer(100)]
    );
}

#[test]
fn test_unregistered_key_falls_through_to_identifier() {
    let call = func("my_custom_fn", vec![column("t", "v")]);
    let statement = PostgresDialect::new()
        .compile_select(&select_expr(call))
        .unwrap();
    assert_eq!(statement.sql, "SELECT my_custom_fn(\"t\".\"v\") FROM \"t\"");
}

#[test]
fn test_unavailable_variant_rejected() {
    let mut registry = FunctionRegistry::with_builtins();
    registry
        .register(
            FunctionDef::new("JSON_TABLE")
                .variant(sqlmason_ast::DialectName::Sqlite, FunctionVariant::unavailable()),
        )
        .unwrap();
    let dialect = SqliteDialect::with_registry(registry);
    let err = dialect
        .compile_select(&select_expr(func("JSON_TABLE", vec![])))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedFunction { .. }));
}

#[test]
fn test_name_override_length() {
    let call = func("LENGTH", vec![column("t", "name")]);
    let mssql = SqlServerDialect::new()
        .compile_select(&select_expr(call.clone()))
        .unwrap();
    assert_eq!(mssql.sql, "SELECT LEN([t].[name]) FROM [t]");

    let pg = PostgresDialect::new()
        .compile_select(&select_expr(call))
        .unwrap();
    assert_eq!(pg.sql, "SELECT LENGTH(\"t\".\"name\") FROM \"t\"");
}

#[test]
fn test_date_trunc_emulations() {
    let call = func("DATE_TRUNC", vec![literal("month"), column("t", "at")]);

    let pg = PostgresDialect::new()
        .compile_select(&select_expr(call.clone()))
        .unwrap();
    assert_eq!(pg.sql, "SELECT DATE_TRUNC($1, \"t\".\"at\") FROM \"t\"");

    let mysql = MySqlDialect::new()
        .compile_select(&select_expr(call.clone()))
        .unwrap();
    assert_eq!(
        mysql.sql,
        "SELECT DATE_FORMAT(`t`.`at`, '%Y-%m-01 00:00:00') FROM `t`"
    );

    let sqlite = SqliteDialect::new()
        .compile_select(&select_expr(call.clone()))
        .unwrap();
    assert_eq!(
        sqlite.sql,
        "SELECT DATE(\"t\".\"at\", 'start of month') FROM \"t\""
    );

    let mssql = SqlServerDialect::new()
        .compile_select(&select_expr(call))
        .unwrap();
    assert_eq!(mssql.sql, "SELECT DATETRUNC(month, [t].[at]) FROM [t]");
}

#[test]
fn test_concat_pipe_chain_sqlite() {
    let call = func("CONCAT", vec![column("t", "a"), literal("-"), column("t", "b")]);
    let statement = SqliteDialect::new()
        .compile_select(&select_expr(call))
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT (\"t\".\"a\" || ? || \"t\".\"b\") FROM \"t\""
    );
}

#[test]
fn test_window_specification() {
    let call = func("ROW_NUMBER", vec![]).with_over(WindowSpec {
        partition_by: vec![column("t", "dept")],
        order_by: vec![OrderBy::desc(column("t", "salary"))],
    });
    let statement = PostgresDialect::new()
        .compile_select(&select_expr(call))
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT ROW_NUMBER() OVER (PARTITION BY \"t\".\"dept\" \
         ORDER BY \"t\".\"salary\" DESC) FROM \"t\""
    );
}

#[test]
fn test_rendering_independent_of_registration_order() {
    // Two registries with the same definitions registered in opposite
    // orders must produce identical SQL.
    let def_a = || FunctionDef::new("FN_A").with_default_name("ALPHA");
    let def_b = || FunctionDef::new("FN_B").with_default_name("BETA");

    let mut first = FunctionRegistry::empty();
    first.register(def_a()).unwrap();
    first.register(def_b()).unwrap();

    let mut second = FunctionRegistry::empty();
    second.register(def_b()).unwrap();
    second.register(def_a()).unwrap();

    let query = select_expr(func("FN_A", vec![literal(1)]));
    let sql_first = PostgresDialect::with_registry(first)
        .compile_select(&query)
        .unwrap();
    let sql_second = PostgresDialect::with_registry(second)
        .compile_select(&query)
        .unwrap();
    assert_eq!(sql_first, sql_second);
}

#[test]
fn test_table_function_identifier_fallback() {
    let source = FunctionTable::new("pragma_table_info", vec![literal("users")])
        .with_alias("ti");
    let query = SelectQuery::from(source).select(vec![column("ti", "name")]);
    let statement = SqliteDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        statement.sql,
        "SELECT \"ti\".\"name\" FROM pragma_table_info(?) AS \"ti\""
    );
    assert_eq!(statement.params, vec![Literal::String("users".into())]);
}

#[test]
fn test_table_function_explicit_key_unregistered() {
    let source = FunctionTable::new("mystery_rows", vec![]).with_key("MYSTERY_ROWS");
    let query = SelectQuery::from(source).select(vec![bare_column("x")]);
    let err = PostgresDialect::new().compile_select(&query).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedTableFunction { .. }));
}

#[test]
fn test_table_function_unavailable_for_dialect() {
    let source = FunctionTable::new("generate_series", vec![literal(1), literal(10)])
        .with_key("GENERATE_SERIES")
        .with_alias("gs");
    let query = SelectQuery::from(source).select(vec![bare_column("value")]);

    let err = MySqlDialect::new().compile_select(&query).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedTableFunction { .. }));

    let ok = PostgresDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        ok.sql,
        "SELECT \"value\" FROM generate_series($1, $2) AS \"gs\""
    );
}

#[test]
fn test_lateral_function_table_postgres_only() {
    let source = FunctionTable::new("unnest", vec![column("u", "tags")])
        .lateral()
        .with_alias("tag");
    let query = SelectQuery::from(TableRef::new("users").with_alias("u"))
        .select(vec![column("u", "id")])
        .join(sqlmason_ast::Join::cross(source));

    let pg = PostgresDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        pg.sql,
        "SELECT \"u\".\"id\" FROM \"users\" AS \"u\" \
         CROSS JOIN LATERAL unnest(\"u\".\"tags\") AS \"tag\""
    );

    let err = SqlServerDialect::new().compile_select(&query).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedFeature { .. }));
}
