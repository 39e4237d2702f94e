// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! PostgreSQL dialect

use sqlmason_ast::{
    DeleteQuery, DialectName, InsertQuery, ProcedureCall, SelectQuery, UpdateQuery,
};

use crate::dialect::{Dialect, DmlJoinStyle, ProcedureStyle, ReturningStyle, shared};
use crate::error::CompileResult;
use crate::functions::FunctionRegistry;
use crate::statement::Statement;

/// PostgreSQL: `"ident"` quoting, `$n` placeholders, `LIMIT/OFFSET`,
/// appended `RETURNING`, native `ILIKE`, `LATERAL` and `WITH ORDINALITY`.
pub struct PostgresDialect {
    registry: FunctionRegistry,
}

impl PostgresDialect {
    pub fn new() -> Self {
        Self {
            registry: FunctionRegistry::with_builtins(),
        }
    }

    /// Use a caller-built registry instead of the builtins.
    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }
}

impl Default for PostgresDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> DialectName {
        DialectName::Postgres
    }

    fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    fn quote_identifier(&self, ident: &str) -> CompileResult<String> {
        Ok(format!("\"{}\"", ident.replace('"', "\"\"")))
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${position}")
    }

    fn boolean_literal(&self, value: bool) -> &'static str {
        if value { "TRUE" } else { "FALSE" }
    }

    fn format_bytes(&self, bytes: &[u8]) -> String {
        format!("'\\x{}'", shared::hex_encode(bytes))
    }

    fn returning_style(&self) -> ReturningStyle {
        ReturningStyle::Appended
    }

    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    fn supports_cte_materialization(&self) -> bool {
        true
    }

    fn supports_lateral(&self) -> bool {
        true
    }

    fn supports_with_ordinality(&self) -> bool {
        true
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn update_join_style(&self) -> DmlJoinStyle {
        DmlJoinStyle::FromClause
    }

    fn delete_join_style(&self) -> DmlJoinStyle {
        DmlJoinStyle::FromClause
    }

    fn procedure_style(&self) -> ProcedureStyle {
        ProcedureStyle::Call
    }

    fn compile_select(&self, query: &SelectQuery) -> CompileResult<Statement> {
        shared::compile_select(self, query)
    }

    fn compile_insert(&self, query: &InsertQuery) -> CompileResult<Statement> {
        shared::compile_insert(self, query)
    }

    fn compile_update(&self, query: &UpdateQuery) -> CompileResult<Statement> {
        shared::compile_update(self, query)
    }

    fn compile_delete(&self, query: &DeleteQuery) -> CompileResult<Statement> {
        shared::compile_delete(self, query)
    }

    fn compile_procedure_call(&self, call: &ProcedureCall) -> CompileResult<Statement> {
        shared::compile_procedure_call(self, call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlmason_ast::Literal;

    #[test]
    fn test_quote_identifier_doubles_quotes() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.quote_identifier("users").unwrap(), "\"users\"");
        assert_eq!(dialect.quote_identifier("we\"ird").unwrap(), "\"we\"\"ird\"");
    }

    #[test]
    fn test_boolean_literals() {
        let dialect = PostgresDialect::new();
        assert_eq!(dialect.format_literal(&Literal::Boolean(true)), "TRUE");
        assert_eq!(dialect.format_literal(&Literal::Boolean(false)), "FALSE");
    }

    #[test]
    fn test_bytes_literal() {
        let dialect = PostgresDialect::new();
        assert_eq!(
            dialect.format_literal(&Literal::Bytes(vec![0xDE, 0xAD])),
            "'\\xDEAD'"
        );
    }
}
