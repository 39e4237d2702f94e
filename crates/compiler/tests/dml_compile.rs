// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! INSERT / UPDATE / DELETE / CALL compilation across dialects

use pretty_assertions::assert_eq;
use sqlmason_ast::{
    ColumnExpr, DeleteQuery, InsertQuery, Join, JoinKind, Literal, ProcedureCall, ProcedureParam,
    TableRef, UpdateQuery, column, eq, literal,
};
use sqlmason_compiler::{
    CompileError, Dialect, MySqlDialect, PostgresDialect, SqlServerDialect, SqliteDialect,
};

#[test]
fn test_insert_values_postgres_with_returning() {
    let insert = InsertQuery::new(TableRef::new("users"), vec!["name".into(), "age".into()])
        .values(vec![vec![literal("a"), literal(30)]])
        .with_returning(vec![ColumnExpr::bare("id")]);
    let statement = PostgresDialect::new().compile_insert(&insert).unwrap();
    assert_eq!(
        statement.sql,
        "INSERT INTO \"users\" (\"name\", \"age\") VALUES ($1, $2) RETURNING \"id\""
    );
    assert_eq!(
        statement.params,
        vec![Literal::String("a".into()), Literal::Integer(30)]
    );
}

#[test]
fn test_insert_output_rewrite_mssql() {
    let insert = InsertQuery::new(TableRef::new("users"), vec!["name".into()])
        .values(vec![vec![literal("a")]])
        .with_returning(vec![ColumnExpr::bare("id")]);
    let statement = SqlServerDialect::new().compile_insert(&insert).unwrap();
    assert_eq!(
        statement.sql,
        "INSERT INTO [users] ([name]) OUTPUT INSERTED.[id] VALUES (@p1)"
    );
    assert_eq!(statement.params, vec![Literal::String("a".into())]);
}

#[test]
fn test_insert_returning_rejected_on_mysql() {
    let insert = InsertQuery::new(TableRef::new("users"), vec!["name".into()])
        .values(vec![vec![literal("a")]])
        .with_returning(vec![ColumnExpr::bare("id")]);
    let err = MySqlDialect::new().compile_insert(&insert).unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedFeature { .. }));
}

#[test]
fn test_insert_empty_column_list_rejected() {
    let insert = InsertQuery::new(TableRef::new("users"), vec![]);
    let err = PostgresDialect::new().compile_insert(&insert).unwrap_err();
    assert!(matches!(err, CompileError::InvalidArgument(_)));
}

#[test]
fn test_insert_row_arity_checked() {
    let insert = InsertQuery::new(TableRef::new("users"), vec!["a".into(), "b".into()])
        .values(vec![vec![literal(1)]]);
    let err = PostgresDialect::new().compile_insert(&insert).unwrap_err();
    assert!(matches!(err, CompileError::InvalidArgument(_)));
}

#[test]
fn test_insert_multi_row_values() {
    let insert = InsertQuery::new(TableRef::new("t"), vec!["v".into()])
        .values(vec![vec![literal(1)], vec![literal(2)]]);
    let statement = SqliteDialect::new().compile_insert(&insert).unwrap();
    assert_eq!(statement.sql, "INSERT INTO \"t\" (\"v\") VALUES (?), (?)");
    assert_eq!(
        statement.params,
        vec![Literal::Integer(1), Literal::Integer(2)]
    );
}

#[test]
fn test_insert_from_select() {
    let select = sqlmason_ast::SelectQuery::from(TableRef::new("staging"))
        .select(vec![column("staging", "name")]);
    let insert = InsertQuery::new(TableRef::new("users"), vec!["name".into()]).from_select(select);
    let statement = PostgresDialect::new().compile_insert(&insert).unwrap();
    assert_eq!(
        statement.sql,
        "INSERT INTO \"users\" (\"name\") SELECT \"staging\".\"name\" FROM \"staging\""
    );
}

#[test]
fn test_update_set_alias_rewrite() {
    // Assignments declared against the raw table name follow the alias on
    // dialects with qualified SET targets, and drop the qualifier elsewhere.
    let update = UpdateQuery::new(TableRef::new("users").with_alias("u"))
        .set(
            ColumnExpr::scoped("users", "name"),
            literal("renamed"),
        )
        .with_where(eq(column("u", "id"), literal(5)));

    let mysql = MySqlDialect::new().compile_update(&update).unwrap();
    assert_eq!(
        mysql.sql,
        "UPDATE `users` AS `u` SET `u`.`name` = ? WHERE `u`.`id` = ?"
    );

    let pg = PostgresDialect::new().compile_update(&update).unwrap();
    assert_eq!(
        pg.sql,
        "UPDATE \"users\" AS \"u\" SET \"name\" = $1 WHERE \"u\".\"id\" = $2"
    );
}

#[test]
fn test_update_with_from_postgres() {
    let update = UpdateQuery::new(TableRef::new("users").with_alias("u"))
        .set(ColumnExpr::bare("total"), column("o", "total"))
        .with_from(TableRef::new("order_totals").with_alias("o"))
        .with_where(eq(column("o", "user_id"), column("u", "id")));
    let statement = PostgresDialect::new().compile_update(&update).unwrap();
    assert_eq!(
        statement.sql,
        "UPDATE \"users\" AS \"u\" SET \"total\" = \"o\".\"total\" \
         FROM \"order_totals\" AS \"o\" WHERE \"o\".\"user_id\" = \"u\".\"id\""
    );
}

#[test]
fn test_update_joins_without_from_rejected() {
    let update = UpdateQuery::new(TableRef::new("users"))
        .set(ColumnExpr::bare("x"), literal(1))
        .join(Join::new(
            JoinKind::Inner,
            TableRef::new("orders"),
            eq(column("orders", "user_id"), column("users", "id")),
        ));
    let err = PostgresDialect::new().compile_update(&update).unwrap_err();
    assert!(matches!(err, CompileError::InvalidArgument(_)));
}

#[test]
fn test_update_target_alias_mssql() {
    let update = UpdateQuery::new(TableRef::new("users").with_alias("u"))
        .set(ColumnExpr::scoped("users", "name"), literal("x"))
        .with_where(eq(column("u", "id"), literal(1)));
    let statement = SqlServerDialect::new().compile_update(&update).unwrap();
    assert_eq!(
        statement.sql,
        "UPDATE [u] SET [u].[name] = @p1 FROM [users] AS [u] WHERE [u].[id] = @p2"
    );
}

#[test]
fn test_update_inline_join_param_order_mysql() {
    // Join sources render before SET on MySQL; `?` binding must follow the
    // textual order.
    let update = UpdateQuery::new(TableRef::new("users").with_alias("u"))
        .set(ColumnExpr::scoped("users", "flag"), literal(9))
        .with_from(TableRef::new("orders").with_alias("o"))
        .join(Join::new(
            JoinKind::Inner,
            TableRef::new("items").with_alias("i"),
            eq(column("i", "kind"), literal("sale")),
        ))
        .with_where(eq(column("o", "user_id"), column("u", "id")));
    let statement = MySqlDialect::new().compile_update(&update).unwrap();
    assert_eq!(
        statement.sql,
        "UPDATE `users` AS `u`, `orders` AS `o` \
         INNER JOIN `items` AS `i` ON `i`.`kind` = ? \
         SET `u`.`flag` = ? WHERE `o`.`user_id` = `u`.`id`"
    );
    assert_eq!(
        statement.params,
        vec![Literal::String("sale".into()), Literal::Integer(9)]
    );
}

#[test]
fn test_delete_plain_with_returning_sqlite() {
    let delete = DeleteQuery::new(TableRef::new("users"))
        .with_where(eq(column("users", "id"), literal(3)))
        .with_returning(vec![ColumnExpr::bare("id")]);
    let statement = SqliteDialect::new().compile_delete(&delete).unwrap();
    assert_eq!(
        statement.sql,
        "DELETE FROM \"users\" WHERE \"users\".\"id\" = ? RETURNING \"id\""
    );
}

#[test]
fn test_delete_using_postgres() {
    let delete = DeleteQuery::new(TableRef::new("users").with_alias("u"))
        .with_using(TableRef::new("bans").with_alias("b"))
        .with_where(eq(column("b", "user_id"), column("u", "id")));
    let statement = PostgresDialect::new().compile_delete(&delete).unwrap();
    assert_eq!(
        statement.sql,
        "DELETE FROM \"users\" AS \"u\" USING \"bans\" AS \"b\" \
         WHERE \"b\".\"user_id\" = \"u\".\"id\""
    );
}

#[test]
fn test_delete_multi_table_mysql() {
    let delete = DeleteQuery::new(TableRef::new("users").with_alias("u"))
        .with_using(TableRef::new("bans").with_alias("b"))
        .with_where(eq(column("b", "user_id"), column("u", "id")));
    let statement = MySqlDialect::new().compile_delete(&delete).unwrap();
    assert_eq!(
        statement.sql,
        "DELETE `u` FROM `users` AS `u`, `bans` AS `b` \
         WHERE `b`.`user_id` = `u`.`id`"
    );
}

#[test]
fn test_delete_output_mssql() {
    let delete = DeleteQuery::new(TableRef::new("users"))
        .with_where(eq(column("users", "id"), literal(1)))
        .with_returning(vec![ColumnExpr::bare("id")]);
    let statement = SqlServerDialect::new().compile_delete(&delete).unwrap();
    assert_eq!(
        statement.sql,
        "DELETE FROM [users] OUTPUT DELETED.[id] WHERE [users].[id] = @p1"
    );
}

#[test]
fn test_delete_joins_without_using_rejected() {
    let delete = DeleteQuery::new(TableRef::new("users")).join(Join::new(
        JoinKind::Inner,
        TableRef::new("orders"),
        eq(column("orders", "user_id"), column("users", "id")),
    ));
    let err = PostgresDialect::new().compile_delete(&delete).unwrap_err();
    assert!(matches!(err, CompileError::InvalidArgument(_)));
}

#[test]
fn test_procedure_call_postgres() {
    let call = ProcedureCall::new("refresh_totals")
        .with_schema("app")
        .param(ProcedureParam::input("user_id", literal(5)));
    let statement = PostgresDialect::new().compile_procedure_call(&call).unwrap();
    assert_eq!(statement.sql, "CALL \"app\".\"refresh_totals\"($1)");
    assert_eq!(statement.params, vec![Literal::Integer(5)]);
}

#[test]
fn test_procedure_call_mysql_placeholders() {
    let call = ProcedureCall::new("refresh_totals")
        .param(ProcedureParam::input("user_id", literal(5)))
        .param(ProcedureParam::input("since", literal("2024-01-01")));
    let statement = MySqlDialect::new().compile_procedure_call(&call).unwrap();
    assert_eq!(statement.sql, "CALL `refresh_totals`(?, ?)");
    assert_eq!(statement.params.len(), 2);
}

#[test]
fn test_procedure_exec_mssql_with_output() {
    let call = ProcedureCall::new("refresh_totals")
        .with_schema("app")
        .param(ProcedureParam::input("user_id", literal(5)))
        .param(ProcedureParam::output("total").with_db_type("INT"));
    let statement = SqlServerDialect::new()
        .compile_procedure_call(&call)
        .unwrap();
    assert_eq!(
        statement.sql,
        "DECLARE @total INT; EXEC [app].[refresh_totals] \
         @user_id = @p1, @total = @total OUTPUT; SELECT @total AS [total]"
    );
    assert_eq!(statement.params, vec![Literal::Integer(5)]);
}

#[test]
fn test_procedure_output_without_db_type_rejected_mssql() {
    let call = ProcedureCall::new("p").param(ProcedureParam::output("total"));
    let err = SqlServerDialect::new()
        .compile_procedure_call(&call)
        .unwrap_err();
    assert!(matches!(err, CompileError::UnsupportedFeature { .. }));
}
