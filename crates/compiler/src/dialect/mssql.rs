// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQL Server dialect

use sqlmason_ast::{
    DeleteQuery, DialectName, InsertQuery, ProcedureCall, SelectQuery, UpdateQuery,
};

use crate::dialect::{Dialect, DmlJoinStyle, LimitStyle, ProcedureStyle, ReturningStyle, shared};
use crate::error::CompileResult;
use crate::functions::FunctionRegistry;
use crate::statement::Statement;

/// SQL Server: `[ident]` quoting, `@pN` placeholders, `OFFSET/FETCH`
/// pagination, `OUTPUT` clause instead of `RETURNING`, unique exposed names
/// in FROM lists.
pub struct SqlServerDialect {
    registry: FunctionRegistry,
}

impl SqlServerDialect {
    pub fn new() -> Self {
        Self {
            registry: FunctionRegistry::with_builtins(),
        }
    }

    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }
}

impl Default for SqlServerDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> DialectName {
        DialectName::SqlServer
    }

    fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    fn quote_identifier(&self, ident: &str) -> CompileResult<String> {
        Ok(format!("[{}]", ident.replace(']', "]]")))
    }

    fn placeholder(&self, position: usize) -> String {
        format!("@p{position}")
    }

    fn format_bytes(&self, bytes: &[u8]) -> String {
        format!("0x{}", shared::hex_encode(bytes))
    }

    fn limit_style(&self) -> LimitStyle {
        LimitStyle::OffsetFetch
    }

    fn returning_style(&self) -> ReturningStyle {
        ReturningStyle::OutputClause
    }

    fn recursive_cte_requires_keyword(&self) -> bool {
        false
    }

    fn requires_unique_exposed_names(&self) -> bool {
        true
    }

    fn qualified_set_targets(&self) -> bool {
        true
    }

    fn update_join_style(&self) -> DmlJoinStyle {
        DmlJoinStyle::TargetAlias
    }

    fn delete_join_style(&self) -> DmlJoinStyle {
        DmlJoinStyle::TargetAlias
    }

    fn procedure_style(&self) -> ProcedureStyle {
        ProcedureStyle::Exec
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
    fn test_quote_identifier_doubles_closing_bracket() {
        let dialect = SqlServerDialect::new();
        assert_eq!(dialect.quote_identifier("users").unwrap(), "[users]");
        assert_eq!(dialect.quote_identifier("we]ird").unwrap(), "[we]]ird]");
    }

    #[test]
    fn test_placeholders_are_named() {
        let dialect = SqlServerDialect::new();
        assert_eq!(dialect.placeholder(1), "@p1");
        assert_eq!(dialect.placeholder(12), "@p12");
    }

    #[test]
    fn test_bytes_literal() {
        let dialect = SqlServerDialect::new();
        assert_eq!(
            dialect.format_literal(&Literal::Bytes(vec![0x01, 0xFF])),
            "0x01FF"
        );
    }
}
