// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! End-to-end SELECT compilation across dialects

use pretty_assertions::assert_eq;
use sqlmason_ast::{
    Cte, CteMaterialization, DialectName, Join, JoinKind, Literal, OrderBy, SelectColumn,
    SelectQuery, TableRef, between, column, eq, in_list, like_insensitive, literal, subquery,
};
use sqlmason_compiler::{
    CompileError, Dialect, MySqlDialect, PostgresDialect, SqlServerDialect, SqliteDialect,
    dialect_for,
};

fn users_orders_query() -> SelectQuery {
    SelectQuery::from(TableRef::new("users").with_alias("u"))
        .select(vec![column("u", "id"), column("u", "name")])
        .inner_join(
            TableRef::new("orders").with_alias("o"),
            eq(column("o", "user_id"), column("u", "id")),
        )
        .with_where(eq(column("u", "active"), literal(true)))
        .order_by(OrderBy::asc(column("u", "id")))
        .with_limit(10)
}

#[test]
fn test_select_join_where_order_limit_postgres() {
    let statement = PostgresDialect::new()
        .compile_select(&users_orders_query())
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT \"u\".\"id\", \"u\".\"name\" FROM \"users\" AS \"u\" \
         INNER JOIN \"orders\" AS \"o\" ON \"o\".\"user_id\" = \"u\".\"id\" \
         WHERE \"u\".\"active\" = $1 ORDER BY \"u\".\"id\" ASC LIMIT 10"
    );
    assert_eq!(statement.params, vec![Literal::Boolean(true)]);
}

#[test]
fn test_select_join_where_order_limit_mssql() {
    let statement = SqlServerDialect::new()
        .compile_select(&users_orders_query())
        .unwrap();
    assert_eq!(
        statement.sql,
        "SELECT [u].[id], [u].[name] FROM [users] AS [u] \
         INNER JOIN [orders] AS [o] ON [o].[user_id] = [u].[id] \
         WHERE [u].[active] = @p1 \
         ORDER BY [u].[id] ASC OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY"
    );
    assert_eq!(statement.params, vec![Literal::Boolean(true)]);
}

#[test]
fn test_empty_in_list_is_constant_false_everywhere() {
    for name in DialectName::ALL {
        let query = SelectQuery::from(TableRef::new("users"))
            .select(vec![column("users", "id")])
            .with_where(in_list(column("users", "id"), vec![]));
        let statement = dialect_for(name).compile_select(&query).unwrap();
        assert!(
            statement.sql.contains("WHERE 1 = 0"),
            "{name}: {}",
            statement.sql
        );
        assert!(statement.params.is_empty());
    }
}

#[test]
fn test_limit_zero_is_not_elided() {
    let query = SelectQuery::from(TableRef::new("t"))
        .select(vec![column("t", "id")])
        .with_limit(0);
    let statement = PostgresDialect::new().compile_select(&query).unwrap();
    assert!(statement.sql.ends_with("LIMIT 0"), "{}", statement.sql);

    let statement = SqlServerDialect::new().compile_select(&query).unwrap();
    assert!(
        statement
            .sql
            .ends_with("ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 0 ROWS ONLY"),
        "{}",
        statement.sql
    );
}

#[test]
fn test_mssql_offset_without_limit() {
    let query = SelectQuery::from(TableRef::new("t"))
        .select(vec![column("t", "id")])
        .order_by(OrderBy::asc(column("t", "id")))
        .with_offset(20);
    let statement = SqlServerDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        statement.sql,
        "SELECT [t].[id] FROM [t] ORDER BY [t].[id] ASC OFFSET 20 ROWS"
    );
}

#[test]
fn test_mssql_same_exposed_names_are_realiased() {
    let query = SelectQuery::from(TableRef::new("users"))
        .select(vec![column("users", "id")])
        .inner_join(
            TableRef::new("users"),
            eq(column("users_2", "manager_id"), column("users", "id")),
        );
    let statement = SqlServerDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        statement.sql,
        "SELECT [users].[id] FROM [users] \
         INNER JOIN [users] AS [users_2] ON [users_2].[manager_id] = [users].[id]"
    );
}

#[test]
fn test_explicit_aliases_are_preserved() {
    let query = SelectQuery::from(TableRef::new("users").with_alias("u"))
        .select(vec![column("u", "id")])
        .inner_join(
            TableRef::new("users").with_alias("m"),
            eq(column("m", "id"), column("u", "manager_id")),
        );
    let statement = SqlServerDialect::new().compile_select(&query).unwrap();
    assert!(statement.sql.contains("[users] AS [m]"), "{}", statement.sql);
}

#[test]
fn test_sqlite_rejects_full_join() {
    let query = SelectQuery::from(TableRef::new("a"))
        .select(vec![column("a", "id")])
        .join(Join::new(
            JoinKind::Full,
            TableRef::new("b"),
            eq(column("b", "a_id"), column("a", "id")),
        ));
    let err = SqliteDialect::new().compile_select(&query).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedFeature { .. }));
}

#[test]
fn test_set_operation_tail_applies_to_combined_result() {
    let query = SelectQuery::from(TableRef::new("a"))
        .select(vec![column("a", "id")])
        .union_all(SelectQuery::from(TableRef::new("b")).select(vec![column("b", "id")]))
        .order_by(OrderBy::asc(sqlmason_ast::bare_column("id")))
        .with_limit(5);
    let statement = PostgresDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        statement.sql,
        "(SELECT \"a\".\"id\" FROM \"a\") UNION ALL (SELECT \"b\".\"id\" FROM \"b\") \
         ORDER BY \"id\" ASC LIMIT 5"
    );
}

#[test]
fn test_set_operation_branch_with_tail_rejected() {
    let branch = SelectQuery::from(TableRef::new("b"))
        .select(vec![column("b", "id")])
        .with_limit(1);
    let query = SelectQuery::from(TableRef::new("a"))
        .select(vec![column("a", "id")])
        .union(branch);
    let err = PostgresDialect::new().compile_select(&query).unwrap_err();
    assert!(matches!(err, CompileError::InvalidArgument(_)));
}

#[test]
fn test_cte_rendering_with_materialization() {
    let recent = SelectQuery::from(TableRef::new("orders"))
        .select(vec![column("orders", "user_id")])
        .with_where(eq(column("orders", "status"), literal("open")));
    let query = SelectQuery::from(TableRef::new("recent"))
        .select(vec![column("recent", "user_id")])
        .with_ctes(vec![
            Cte::new("recent", recent).with_materialized(CteMaterialization::Materialized),
        ]);
    let statement = PostgresDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        statement.sql,
        "WITH \"recent\" AS MATERIALIZED (SELECT \"orders\".\"user_id\" FROM \"orders\" \
         WHERE \"orders\".\"status\" = $1) \
         SELECT \"recent\".\"user_id\" FROM \"recent\""
    );
    assert_eq!(statement.params, vec![Literal::String("open".into())]);
}

#[test]
fn test_recursive_cte_keyword_omitted_on_mssql() {
    let seed = SelectQuery::from(TableRef::new("categories"))
        .select(vec![column("categories", "id")]);
    let query = SelectQuery::from(TableRef::new("tree"))
        .select(vec![column("tree", "id")])
        .with_ctes(vec![Cte::new("tree", seed.clone()).recursive()]);

    let pg = PostgresDialect::new().compile_select(&query).unwrap();
    assert!(pg.sql.starts_with("WITH RECURSIVE \"tree\""), "{}", pg.sql);

    let mssql = SqlServerDialect::new().compile_select(&query).unwrap();
    assert!(mssql.sql.starts_with("WITH [tree]"), "{}", mssql.sql);
}

#[test]
fn test_duplicate_cte_names_rejected() {
    let inner = SelectQuery::from(TableRef::new("t")).select(vec![column("t", "id")]);
    let query = SelectQuery::from(TableRef::new("x"))
        .select(vec![column("x", "id")])
        .with_ctes(vec![
            Cte::new("x", inner.clone()),
            Cte::new("X", inner),
        ]);
    let err = PostgresDialect::new().compile_select(&query).unwrap_err();
    assert!(matches!(err, CompileError::InvalidArgument(_)));
}

#[test]
fn test_params_follow_textual_order() {
    // Literals appear in projection, join condition, WHERE and BETWEEN;
    // the parameter vector must follow their textual order.
    let query = SelectQuery::from(TableRef::new("users").with_alias("u"))
        .select_as(vec![
            SelectColumn::new(literal(1)).with_alias("one"),
            SelectColumn::new(column("u", "id")),
        ])
        .inner_join(
            TableRef::new("orders").with_alias("o"),
            eq(column("o", "kind"), literal("sale")),
        )
        .with_where(between(column("u", "age"), literal(18), literal(65)));
    let statement = PostgresDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        statement.params,
        vec![
            Literal::Integer(1),
            Literal::String("sale".into()),
            Literal::Integer(18),
            Literal::Integer(65),
        ]
    );
    assert_eq!(
        statement.sql,
        "SELECT $1 AS \"one\", \"u\".\"id\" FROM \"users\" AS \"u\" \
         INNER JOIN \"orders\" AS \"o\" ON \"o\".\"kind\" = $2 \
         WHERE \"u\".\"age\" BETWEEN $3 AND $4"
    );
}

#[test]
fn test_raw_operands_are_not_parameterized() {
    let query = SelectQuery::from(TableRef::new("t"))
        .select(vec![sqlmason_ast::raw("COUNT(*)")])
        .with_where(eq(column("t", "kind"), sqlmason_ast::raw("'inline'")));
    let statement = PostgresDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        statement.sql,
        "SELECT COUNT(*) FROM \"t\" WHERE \"t\".\"kind\" = 'inline'"
    );
    assert!(statement.params.is_empty());
}

#[test]
fn test_subquery_placeholders_share_numbering() {
    let inner = SelectQuery::from(TableRef::new("orders").with_alias("o"))
        .select(vec![column("o", "user_id")])
        .with_where(eq(column("o", "status"), literal("open")));
    let query = SelectQuery::from(TableRef::new("users").with_alias("u"))
        .select(vec![column("u", "id")])
        .with_where(sqlmason_ast::and(vec![
            eq(column("u", "active"), literal(true)),
            in_list(column("u", "id"), vec![subquery(inner)]),
        ])
        .unwrap());
    let statement = PostgresDialect::new().compile_select(&query).unwrap();
    assert_eq!(
        statement.sql,
        "SELECT \"u\".\"id\" FROM \"users\" AS \"u\" \
         WHERE \"u\".\"active\" = $1 AND \"u\".\"id\" IN \
         ((SELECT \"o\".\"user_id\" FROM \"orders\" AS \"o\" WHERE \"o\".\"status\" = $2))"
    );
    assert_eq!(
        statement.params,
        vec![Literal::Boolean(true), Literal::String("open".into())]
    );
}

#[test]
fn test_case_insensitive_like() {
    let query = SelectQuery::from(TableRef::new("users").with_alias("u"))
        .select(vec![column("u", "id")])
        .with_where(like_insensitive(column("u", "name"), literal("a%")));

    let pg = PostgresDialect::new().compile_select(&query).unwrap();
    assert!(pg.sql.contains("\"u\".\"name\" ILIKE $1"), "{}", pg.sql);

    let mysql = MySqlDialect::new().compile_select(&query).unwrap();
    assert!(
        mysql.sql.contains("LOWER(`u`.`name`) LIKE LOWER(?)"),
        "{}",
        mysql.sql
    );
}

#[test]
fn test_identifier_quoting_round_trips_delimiters() {
    let pg = PostgresDialect::new();
    assert_eq!(pg.quote_identifier("a\"b").unwrap(), "\"a\"\"b\"");

    let mssql = SqlServerDialect::new();
    assert_eq!(mssql.quote_identifier("a]b").unwrap(), "[a]]b]");

    let mysql = MySqlDialect::new();
    assert!(mysql.quote_identifier("a`b").is_err());
}
