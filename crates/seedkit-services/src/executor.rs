//! Level-ordered concurrent batch execution
//!
//! Buckets run strictly one after another. Inside a bucket every table is one
//! task on a [`JoinSet`]; the bucket is only done once every task has been
//! joined. The first failing task cancels the bucket's token so siblings that
//! have not started yet skip their work.

use futures::FutureExt;
use seedkit_core::{CancellationToken, Deleter, Inserter, NativeRow, SeedError};
use seedkit_dependencies::{DeleteBatch, InsertBatch};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;

/// The mutation a batch performs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Delete,
    Insert,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Delete => write!(f, "delete"),
            Operation::Insert => write!(f, "insert"),
        }
    }
}

/// One table's failure within a bucket
#[derive(Debug)]
pub struct TableFailure {
    pub table: String,
    pub error: SeedError,
}

impl fmt::Display for TableFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.table, self.error)
    }
}

#[derive(Debug, Error)]
pub enum BatchError {
    /// At least one table of the bucket failed. Every failure is listed;
    /// `skipped` names the siblings that stopped because of them.
    #[error(
        "{operation} batch {batch} failed for {} table(s): {}",
        failures.len(),
        join(failures)
    )]
    Failed {
        operation: Operation,
        batch: usize,
        failures: Vec<TableFailure>,
        skipped: Vec<String>,
    },

    #[error("{operation} cancelled at batch {batch}")]
    Cancelled { operation: Operation, batch: usize },
}

impl BatchError {
    /// Names of the tables that failed, empty for a cancellation
    pub fn failed_tables(&self) -> Vec<&str> {
        match self {
            BatchError::Failed { failures, .. } => {
                failures.iter().map(|f| f.table.as_str()).collect()
            }
            BatchError::Cancelled { .. } => Vec::new(),
        }
    }
}

fn join(failures: &[TableFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Totals of a successful run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub batches: usize,
    pub tables: usize,
    /// Rows reported by the inserter; deletes report none
    pub rows: u64,
}

/// Executes ordered buckets against a backend collaborator
#[derive(Debug, Clone, Default)]
pub struct BatchExecutor {
    cancel: CancellationToken,
}

impl BatchExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `cancel` as the top-level signal for every call on this executor
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Clear every table of every batch, one batch at a time
    #[tracing::instrument(skip(self, batches, deleter), fields(batches = batches.len()))]
    pub async fn execute_delete(
        &self,
        batches: &[DeleteBatch],
        deleter: Arc<dyn Deleter>,
    ) -> Result<ExecutionSummary, BatchError> {
        let mut summary = ExecutionSummary::default();

        for (index, batch) in batches.iter().enumerate() {
            let units: Vec<_> = batch
                .tables
                .iter()
                .map(|table| {
                    let deleter = Arc::clone(&deleter);
                    let name = table.clone();
                    let unit = move |cancel: CancellationToken| async move {
                        deleter.delete(&name, &cancel).await.map(|()| 0)
                    };
                    (table.clone(), unit)
                })
                .collect();

            tracing::debug!(
                batch = index,
                level = batch.level,
                tables = ?batch.tables,
                "deleting batch"
            );
            let rows = self.run_bucket(Operation::Delete, index, units).await?;
            summary.batches += 1;
            summary.tables += batch.tables.len();
            summary.rows += rows;
        }

        Ok(summary)
    }

    /// Insert the rows of every batch, one batch at a time
    #[tracing::instrument(skip(self, batches, inserter), fields(batches = batches.len()))]
    pub async fn execute_insert(
        &self,
        batches: Vec<InsertBatch<NativeRow>>,
        inserter: Arc<dyn Inserter>,
    ) -> Result<ExecutionSummary, BatchError> {
        let mut summary = ExecutionSummary::default();

        for (index, batch) in batches.into_iter().enumerate() {
            let level = batch.level;
            let tables = batch.tables.len();
            tracing::debug!(
                batch = index,
                level,
                tables = ?batch.table_names(),
                rows = batch.row_count(),
                "inserting batch"
            );

            let units: Vec<_> = batch
                .tables
                .into_iter()
                .map(|(table, rows)| {
                    let inserter = Arc::clone(&inserter);
                    let name = table.clone();
                    let unit = move |cancel: CancellationToken| async move {
                        inserter.insert(&name, &rows, &cancel).await
                    };
                    (table, unit)
                })
                .collect();

            let rows = self.run_bucket(Operation::Insert, index, units).await?;
            summary.batches += 1;
            summary.tables += tables;
            summary.rows += rows;
        }

        Ok(summary)
    }

    /// Run one bucket to completion.
    ///
    /// Every unit gets a child of the top-level token. A unit that finds the
    /// token already cancelled is skipped without calling the collaborator.
    /// The set is always drained before returning.
    async fn run_bucket<F, Fut>(
        &self,
        operation: Operation,
        batch: usize,
        units: Vec<(String, F)>,
    ) -> Result<u64, BatchError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = seedkit_core::Result<u64>> + Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(BatchError::Cancelled { operation, batch });
        }

        let bucket = self.cancel.child_token();
        let mut set = JoinSet::new();

        for (table, unit) in units {
            let cancel = bucket.clone();
            set.spawn(async move {
                if cancel.is_cancelled() {
                    return (table, Err(SeedError::Cancelled));
                }

                let result = match AssertUnwindSafe(unit(cancel.clone())).catch_unwind().await {
                    Ok(result) => result,
                    Err(panic) => Err(SeedError::Other(format!(
                        "task panicked: {}",
                        panic_message(panic.as_ref())
                    ))),
                };

                if result.is_err() {
                    cancel.cancel();
                }
                (table, result)
            });
        }

        let mut rows = 0;
        let mut failures = Vec::new();
        let mut skipped = Vec::new();

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((table, Ok(count))) => {
                    tracing::debug!(%operation, table = %table, rows = count, "table done");
                    rows += count;
                }
                Ok((table, Err(SeedError::Cancelled))) => {
                    tracing::debug!(%operation, table = %table, "table skipped");
                    skipped.push(table);
                }
                Ok((table, Err(error))) => {
                    tracing::warn!(%operation, table = %table, error = %error, "table failed");
                    failures.push(TableFailure { table, error });
                }
                // Tasks are never aborted and panics are caught inside the task
                Err(join_error) => {
                    bucket.cancel();
                    failures.push(TableFailure {
                        table: "<unknown>".to_string(),
                        error: SeedError::Other(join_error.to_string()),
                    });
                }
            }
        }

        if !failures.is_empty() {
            failures.sort_by(|a, b| a.table.cmp(&b.table));
            skipped.sort();
            return Err(BatchError::Failed {
                operation,
                batch,
                failures,
                skipped,
            });
        }
        if !skipped.is_empty() || self.cancel.is_cancelled() {
            return Err(BatchError::Cancelled { operation, batch });
        }

        Ok(rows)
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
