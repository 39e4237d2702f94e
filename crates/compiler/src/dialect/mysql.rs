// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! MySQL dialect

use sqlmason_ast::{
    DeleteQuery, DialectName, InsertQuery, ProcedureCall, SelectQuery, UpdateQuery,
};

use crate::dialect::{Dialect, DmlJoinStyle, ProcedureStyle, ReturningStyle, shared};
use crate::error::{CompileError, CompileResult};
use crate::functions::FunctionRegistry;
use crate::statement::Statement;

/// MySQL: backtick quoting, `?` placeholders, `LIMIT/OFFSET`, no
/// `RETURNING`, inline join sources in UPDATE/DELETE.
pub struct MySqlDialect {
    registry: FunctionRegistry,
}

impl MySqlDialect {
    pub fn new() -> Self {
        Self {
            registry: FunctionRegistry::with_builtins(),
        }
    }

    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }
}

impl Default for MySqlDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for MySqlDialect {
    fn name(&self) -> DialectName {
        DialectName::MySql
    }

    fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    fn quote_identifier(&self, ident: &str) -> CompileResult<String> {
        // Backtick escapes are rejected rather than doubled.
        if ident.contains('`') {
            return Err(CompileError::InvalidArgument(format!(
                "identifier contains a backtick: {ident}"
            )));
        }
        Ok(format!("`{ident}`"))
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn pagination_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(n), None) => Some(format!("LIMIT {n}")),
            (Some(n), Some(m)) => Some(format!("LIMIT {n} OFFSET {m}")),
            // MySQL has no bare OFFSET; the documented huge-limit form.
            (None, Some(m)) => Some(format!("LIMIT 18446744073709551615 OFFSET {m}")),
        }
    }

    fn returning_style(&self) -> ReturningStyle {
        ReturningStyle::Unsupported
    }

    fn supports_lateral(&self) -> bool {
        true
    }

    fn qualified_set_targets(&self) -> bool {
        true
    }

    fn update_join_style(&self) -> DmlJoinStyle {
        DmlJoinStyle::Inline
    }

    fn delete_join_style(&self) -> DmlJoinStyle {
        DmlJoinStyle::Inline
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
    fn test_quote_identifier() {
        let dialect = MySqlDialect::new();
        assert_eq!(dialect.quote_identifier("users").unwrap(), "`users`");
    }

    #[test]
    fn test_quote_identifier_rejects_backtick() {
        let dialect = MySqlDialect::new();
        assert!(matches!(
            dialect.quote_identifier("us`ers"),
            Err(CompileError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_boolean_literals_numeric() {
        let dialect = MySqlDialect::new();
        assert_eq!(dialect.format_literal(&Literal::Boolean(true)), "1");
        assert_eq!(dialect.format_literal(&Literal::Boolean(false)), "0");
    }

    #[test]
    fn test_offset_without_limit() {
        let dialect = MySqlDialect::new();
        assert_eq!(
            dialect.pagination_clause(None, Some(40)).unwrap(),
            "LIMIT 18446744073709551615 OFFSET 40"
        );
    }
}
