// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # sqlmason-test-utils
//!
//! Shared test support: a scripted [`MockExecutor`] that records every
//! statement it is handed and replays canned result sets, plus transaction
//! counters for asserting rollback behavior.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use sqlmason_ast::Literal;
use sqlmason_catalog::{CatalogError, CatalogResult, Executor, ExecutorCapabilities, QueryResult};

/// Scripted executor for tests.
///
/// Results are replayed in FIFO order, one entry per `execute_sql` call;
/// when the script is exhausted an empty result set is returned. A
/// substring trigger can force a failure to exercise rollback paths.
pub struct MockExecutor {
    capabilities: ExecutorCapabilities,
    scripted: Mutex<VecDeque<Vec<QueryResult>>>,
    executed: Mutex<Vec<(String, Vec<Literal>)>>,
    fail_matching: Mutex<Option<String>>,
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            capabilities: ExecutorCapabilities {
                transactions: true,
                returning_clause: true,
            },
            scripted: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
            fail_matching: Mutex::new(None),
            begins: AtomicUsize::new(0),
            commits: AtomicUsize::new(0),
            rollbacks: AtomicUsize::new(0),
        }
    }

    pub fn with_capabilities(mut self, capabilities: ExecutorCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Queue the result sets for the next `execute_sql` call.
    pub fn enqueue(&self, results: Vec<QueryResult>) {
        self.scripted.lock().unwrap().push_back(results);
    }

    /// Queue a single-result-set response.
    pub fn enqueue_result(&self, result: QueryResult) {
        self.enqueue(vec![result]);
    }

    /// Fail any statement containing `needle`.
    pub fn fail_matching(&self, needle: impl Into<String>) {
        *self.fail_matching.lock().unwrap() = Some(needle.into());
    }

    /// Every statement executed so far, in order.
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    /// Statements with their bound parameters.
    pub fn executed(&self) -> Vec<(String, Vec<Literal>)> {
        self.executed.lock().unwrap().clone()
    }

    pub fn execute_count(&self) -> usize {
        self.executed.lock().unwrap().len()
    }

    pub fn begin_count(&self) -> usize {
        self.begins.load(Ordering::SeqCst)
    }

    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn rollback_count(&self) -> usize {
        self.rollbacks.load(Ordering::SeqCst)
    }
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for MockExecutor {
    fn capabilities(&self) -> ExecutorCapabilities {
        self.capabilities
    }

    async fn execute_sql(&self, sql: &str, params: &[Literal]) -> CatalogResult<Vec<QueryResult>> {
        self.executed
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        if let Some(needle) = self.fail_matching.lock().unwrap().as_deref() {
            if sql.contains(needle) {
                return Err(CatalogError::Execution(format!(
                    "scripted failure on: {needle}"
                )));
            }
        }
        let scripted = self.scripted.lock().unwrap().pop_front();
        Ok(scripted.unwrap_or_else(|| vec![QueryResult::default()]))
    }

    async fn begin_transaction(&self) -> CatalogResult<()> {
        self.begins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit_transaction(&self) -> CatalogResult<()> {
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback_transaction(&self) -> CatalogResult<()> {
        self.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Build a one-row-per-entry result set from column names and rows.
pub fn rows(columns: &[&str], values: Vec<Vec<Literal>>) -> QueryResult {
    QueryResult::new(columns.iter().map(|c| c.to_string()).collect(), values)
}

/// String literal cell.
pub fn s(value: &str) -> Literal {
    Literal::String(value.to_string())
}

/// Integer literal cell.
pub fn i(value: i64) -> Literal {
    Literal::Integer(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_and_replays() {
        let executor = MockExecutor::new();
        executor.enqueue_result(rows(&["n"], vec![vec![i(1)]]));

        let first = executor.execute_sql("SELECT 1", &[]).await.unwrap();
        assert_eq!(first[0].values, vec![vec![i(1)]]);

        let second = executor.execute_sql("SELECT 2", &[]).await.unwrap();
        assert!(second[0].is_empty());

        assert_eq!(executor.executed_sql(), vec!["SELECT 1", "SELECT 2"]);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let executor = MockExecutor::new();
        executor.fail_matching("DROP");
        assert!(executor.execute_sql("DROP TABLE x", &[]).await.is_err());
        assert!(executor.execute_sql("SELECT 1", &[]).await.is_ok());
    }
}
