// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Per-statement compiler state
//!
//! A [`CompilerContext`] is created at the top of each `compile_*` call and
//! threaded through every nested rendering step, so placeholder numbering is
//! globally monotonic within one statement: a subquery's literals land in the
//! same parameter vector as the outer query's, in left-to-right appearance
//! order.

use sqlmason_ast::Literal;

use crate::dialect::Dialect;
use crate::error::{CompileError, CompileResult};

/// Mutable state for one top-level compilation.
#[derive(Debug, Default)]
pub struct CompilerContext {
    params: Vec<Literal>,
    cte_names: Vec<String>,
}

impl CompilerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract a literal into the parameter vector and return the dialect's
    /// placeholder token for it.
    pub fn bind(&mut self, dialect: &(impl Dialect + ?Sized), literal: Literal) -> String {
        self.params.push(literal);
        dialect.placeholder(self.params.len())
    }

    /// Number of parameters bound so far.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Consume the context, yielding the parameter vector.
    pub fn into_params(self) -> Vec<Literal> {
        self.params
    }

    /// Bring a `WITH` list's names into scope. Duplicate names within one
    /// list are ambiguous and rejected; shadowing an outer name is fine.
    pub fn enter_ctes(&mut self, names: &[String]) -> CompileResult<usize> {
        for (i, name) in names.iter().enumerate() {
            if names[..i]
                .iter()
                .any(|n| n.eq_ignore_ascii_case(name))
            {
                return Err(CompileError::InvalidArgument(format!(
                    "duplicate CTE name: {name}"
                )));
            }
        }
        self.cte_names.extend(names.iter().cloned());
        Ok(names.len())
    }

    /// Drop `count` names pushed by the matching [`enter_ctes`] call.
    ///
    /// [`enter_ctes`]: CompilerContext::enter_ctes
    pub fn exit_ctes(&mut self, count: usize) {
        let keep = self.cte_names.len().saturating_sub(count);
        self.cte_names.truncate(keep);
    }

    /// Whether `name` refers to a CTE currently in scope.
    pub fn is_cte_in_scope(&self, name: &str) -> bool {
        self.cte_names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::PostgresDialect;

    #[test]
    fn test_bind_numbers_monotonically() {
        let dialect = PostgresDialect::new();
        let mut ctx = CompilerContext::new();
        assert_eq!(ctx.bind(&dialect, Literal::Integer(1)), "$1");
        assert_eq!(ctx.bind(&dialect, Literal::Integer(2)), "$2");
        assert_eq!(ctx.into_params().len(), 2);
    }

    #[test]
    fn test_cte_scope() {
        let mut ctx = CompilerContext::new();
        let count = ctx
            .enter_ctes(&["recent".to_string(), "totals".to_string()])
            .unwrap();
        assert!(ctx.is_cte_in_scope("RECENT"));
        ctx.exit_ctes(count);
        assert!(!ctx.is_cte_in_scope("recent"));
    }

    #[test]
    fn test_duplicate_cte_rejected() {
        let mut ctx = CompilerContext::new();
        let result = ctx.enter_ctes(&["x".to_string(), "X".to_string()]);
        assert!(matches!(result, Err(CompileError::InvalidArgument(_))));
    }
}
