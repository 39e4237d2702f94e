// Copyright (c) 2025 the sqlmason authors
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Schema synchronization
//!
//! Applies a diff plan against a live database through the injected
//! executor. The pure comparison lives in `sqlmason_schema::diff`; this
//! module owns the execution policy: dry-run, destructive gating, and
//! transactional rollback.

use sqlmason_schema::{DatabaseSchema, DiffPlan, SchemaDialect, TableDef, diff_schema};

use crate::error::{CatalogError, CatalogResult};
use crate::executor::Executor;

/// Execution policy for [`synchronize_schema`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Compute and return the plan without touching the database
    pub dry_run: bool,
    /// Execute changes classified unsafe; skipped with a warning otherwise
    pub allow_destructive: bool,
    /// Wrap execution in a transaction when the executor supports one
    pub in_transaction: bool,
    /// Fail with `DiffAborted` on the first skipped destructive change
    pub strict: bool,
}

/// Diff `expected` against `observed` and execute the plan.
///
/// Returns the plan (with any skip warnings appended) on success. On an
/// execution failure the active transaction is rolled back and
/// [`CatalogError::SyncFailed`] reports the failed change index and whether
/// rollback completed.
pub async fn synchronize_schema(
    expected: &[TableDef],
    observed: &DatabaseSchema,
    dialect: &dyn SchemaDialect,
    executor: &dyn Executor,
    options: &SyncOptions,
) -> CatalogResult<DiffPlan> {
    let mut plan = diff_schema(expected, observed, dialect)?;
    if options.dry_run {
        return Ok(plan);
    }

    let in_transaction = options.in_transaction && executor.capabilities().transactions;
    if in_transaction {
        executor.begin_transaction().await?;
    }

    let mut skip_warnings = Vec::new();
    for (index, change) in plan.changes.iter().enumerate() {
        if !change.safe && !options.allow_destructive {
            if options.strict {
                if in_transaction {
                    executor.rollback_transaction().await?;
                }
                return Err(CatalogError::DiffAborted {
                    target: change.target.clone(),
                });
            }
            tracing::warn!(target = %change.target, "destructive change skipped");
            skip_warnings.push(format!(
                "destructive change on {} skipped; pass allow_destructive to apply",
                change.target
            ));
            continue;
        }

        for sql in &change.statements {
            if let Err(err) = executor.execute_sql(sql, &[]).await {
                let rolled_back = if in_transaction {
                    executor.rollback_transaction().await.is_ok()
                } else {
                    false
                };
                return Err(CatalogError::SyncFailed {
                    failed_index: index,
                    rolled_back,
                    message: err.to_string(),
                });
            }
        }
        tracing::info!(target = %change.target, kind = ?change.kind, "change applied");
    }

    if in_transaction {
        executor.commit_transaction().await?;
    }
    plan.warnings.extend(skip_warnings);
    Ok(plan)
}
