// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! SQLite dialect

use sqlmason_ast::{
    DeleteQuery, DialectName, InsertQuery, JoinKind, ProcedureCall, SelectQuery, UpdateQuery,
};

use crate::dialect::{Dialect, DmlJoinStyle, ProcedureStyle, ReturningStyle, shared};
use crate::error::CompileResult;
use crate::functions::FunctionRegistry;
use crate::statement::Statement;

/// SQLite: `"ident"` quoting, `?` placeholders, `LIMIT/OFFSET`, appended
/// `RETURNING`, no RIGHT/FULL joins, no stored procedures.
pub struct SqliteDialect {
    registry: FunctionRegistry,
}

impl SqliteDialect {
    pub fn new() -> Self {
        Self {
            registry: FunctionRegistry::with_builtins(),
        }
    }

    pub fn with_registry(registry: FunctionRegistry) -> Self {
        Self { registry }
    }
}

impl Default for SqliteDialect {
    fn default() -> Self {
        Self::new()
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> DialectName {
        DialectName::Sqlite
    }

    fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    fn quote_identifier(&self, ident: &str) -> CompileResult<String> {
        Ok(format!("\"{}\"", ident.replace('"', "\"\"")))
    }

    fn placeholder(&self, _position: usize) -> String {
        "?".to_string()
    }

    fn pagination_clause(&self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match (limit, offset) {
            (None, None) => None,
            (Some(n), None) => Some(format!("LIMIT {n}")),
            (Some(n), Some(m)) => Some(format!("LIMIT {n} OFFSET {m}")),
            // OFFSET needs a LIMIT in the grammar; -1 means unbounded.
            (None, Some(m)) => Some(format!("LIMIT -1 OFFSET {m}")),
        }
    }

    fn returning_style(&self) -> ReturningStyle {
        ReturningStyle::Appended
    }

    fn supports_join(&self, kind: JoinKind) -> bool {
        !matches!(kind, JoinKind::Right | JoinKind::Full)
    }

    fn supports_nulls_ordering(&self) -> bool {
        true
    }

    fn supports_cte_materialization(&self) -> bool {
        true
    }

    fn update_join_style(&self) -> DmlJoinStyle {
        DmlJoinStyle::FromClause
    }

    fn delete_join_style(&self) -> DmlJoinStyle {
        DmlJoinStyle::Unsupported
    }

    fn procedure_style(&self) -> ProcedureStyle {
        ProcedureStyle::Unsupported
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
    use crate::error::CompileError;
    use sqlmason_ast::{ProcedureCall, TableRef};

    #[test]
    fn test_right_and_full_joins_rejected() {
        let dialect = SqliteDialect::new();
        assert!(!dialect.supports_join(JoinKind::Right));
        assert!(!dialect.supports_join(JoinKind::Full));
        assert!(dialect.supports_join(JoinKind::Left));
    }

    #[test]
    fn test_procedures_unsupported() {
        let dialect = SqliteDialect::new();
        let err = dialect
            .compile_procedure_call(&ProcedureCall::new("p"))
            .unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedFeature { .. }));
    }

    #[test]
    fn test_offset_without_limit() {
        let dialect = SqliteDialect::new();
        assert_eq!(
            dialect.pagination_clause(None, Some(7)).unwrap(),
            "LIMIT -1 OFFSET 7"
        );
    }

    #[test]
    fn test_delete_with_using_rejected() {
        let dialect = SqliteDialect::new();
        let query = sqlmason_ast::DeleteQuery::new(TableRef::new("a"))
            .with_using(TableRef::new("b"));
        assert!(matches!(
            dialect.compile_delete(&query),
            Err(CompileError::UnsupportedFeature { .. })
        ));
    }
}
