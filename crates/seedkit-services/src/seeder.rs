//! Fixture seeding
//!
//! A [`Seeder`] plans against a fetched [`Schema`], coerces every fixture row
//! and only then touches the backend. Unknown tables, reference cycles and
//! values that do not fit their column are all reported before the first
//! delete runs.

use crate::{
    BatchExecutor, ExecutionSummary, FixtureDocument, FixtureTable, SeederOptions, ServiceError,
    ServiceResult,
};
use seedkit_coerce::coerce_rows;
use seedkit_core::{CancellationToken, Deleter, Dumper, FixtureRow, Inserter, NativeRow, Schema};
use seedkit_dependencies::{BatchPlanner, DeleteBatch, InsertBatch, InsertOrder};
use serde::Serialize;
use std::sync::Arc;

/// One bucket of a dry run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedBatch {
    pub level: usize,
    pub tables: Vec<String>,
    /// Rows to insert; always 0 for deletes
    pub rows: usize,
}

/// What `reset` would do, bucket by bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedPlan {
    pub delete: Vec<PlannedBatch>,
    pub insert: Vec<PlannedBatch>,
}

/// Outcome of a `reset`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub deleted: ExecutionSummary,
    pub inserted: ExecutionSummary,
}

/// Runs fixture operations against one backend
pub struct Seeder {
    deleter: Arc<dyn Deleter>,
    inserter: Arc<dyn Inserter>,
    options: SeederOptions,
    executor: BatchExecutor,
}

impl Seeder {
    pub fn new(deleter: Arc<dyn Deleter>, inserter: Arc<dyn Inserter>) -> Self {
        Self {
            deleter,
            inserter,
            options: SeederOptions::default(),
            executor: BatchExecutor::new(),
        }
    }

    pub fn with_options(mut self, options: SeederOptions) -> Self {
        self.options = options;
        self
    }

    /// Cancel in-flight and pending work when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.executor = BatchExecutor::with_cancellation(cancel);
        self
    }

    pub fn options(&self) -> &SeederOptions {
        &self.options
    }

    /// Clear every fixture table plus everything that references them, then
    /// insert the fixture rows.
    #[tracing::instrument(skip(self, schema, fixture), fields(tables = fixture.len()))]
    pub async fn reset(
        &self,
        schema: &Schema,
        fixture: &FixtureDocument,
    ) -> ServiceResult<SeedReport> {
        let planner = BatchPlanner::new(schema)?;
        let deletes = if self.options.delete_before_insert {
            planner.plan_delete(&fixture.table_names())?
        } else {
            Vec::new()
        };
        let inserts = self.prepare_inserts(&planner, schema, fixture)?;

        let deleted = self
            .executor
            .execute_delete(&deletes, Arc::clone(&self.deleter))
            .await?;
        let inserted = self
            .executor
            .execute_insert(inserts, Arc::clone(&self.inserter))
            .await?;

        tracing::info!(
            deleted_tables = deleted.tables,
            inserted_tables = inserted.tables,
            rows = inserted.rows,
            "reset complete"
        );
        Ok(SeedReport { deleted, inserted })
    }

    /// Clear `names` and every table that transitively references them
    #[tracing::instrument(skip(self, schema, names), fields(targets = names.len()))]
    pub async fn delete<S: AsRef<str>>(
        &self,
        schema: &Schema,
        names: &[S],
    ) -> ServiceResult<ExecutionSummary> {
        let planner = BatchPlanner::new(schema)?;
        let batches = planner.plan_delete(names)?;
        Ok(self
            .executor
            .execute_delete(&batches, Arc::clone(&self.deleter))
            .await?)
    }

    /// Insert the fixture rows without deleting anything
    #[tracing::instrument(skip(self, schema, fixture), fields(tables = fixture.len()))]
    pub async fn insert(
        &self,
        schema: &Schema,
        fixture: &FixtureDocument,
    ) -> ServiceResult<ExecutionSummary> {
        let planner = BatchPlanner::new(schema)?;
        let inserts = self.prepare_inserts(&planner, schema, fixture)?;
        Ok(self
            .executor
            .execute_insert(inserts, Arc::clone(&self.inserter))
            .await?)
    }

    /// Everything `reset` validates, without touching the backend
    pub fn plan(&self, schema: &Schema, fixture: &FixtureDocument) -> ServiceResult<SeedPlan> {
        let planner = BatchPlanner::new(schema)?;
        let delete = if self.options.delete_before_insert {
            planner
                .plan_delete(&fixture.table_names())?
                .into_iter()
                .map(|DeleteBatch { level, tables }| PlannedBatch {
                    level,
                    tables,
                    rows: 0,
                })
                .collect()
        } else {
            Vec::new()
        };

        let insert = self
            .prepare_inserts(&planner, schema, fixture)?
            .iter()
            .map(|batch| PlannedBatch {
                level: batch.level,
                tables: batch.tables.keys().cloned().collect(),
                rows: batch.row_count(),
            })
            .collect();

        Ok(SeedPlan { delete, insert })
    }

    /// Read `names` back as a fixture document, parents first so the result
    /// can be fed straight back into `reset`. No names means every table.
    #[tracing::instrument(skip(self, schema, dumper, names), fields(targets = names.len()))]
    pub async fn dump<S: AsRef<str>>(
        &self,
        schema: &Schema,
        dumper: &dyn Dumper,
        names: &[S],
    ) -> ServiceResult<FixtureDocument> {
        let planner = BatchPlanner::new(schema)?;
        let targets: Vec<String> = if names.is_empty() {
            schema.tables().iter().map(|t| t.name.clone()).collect()
        } else {
            names.iter().map(|n| n.as_ref().to_string()).collect()
        };

        let ordered = planner.plan_insert(
            targets.into_iter().map(|name| (name, Vec::<()>::new())),
            InsertOrder::ParentsFirst,
        )?;

        let mut tables = Vec::new();
        for batch in ordered {
            for name in batch.tables.keys() {
                let table = schema
                    .table_by_name(name)
                    .ok_or_else(|| ServiceError::InvalidFixture(format!("unknown table {name}")))?;
                let rows = dumper.dump(table).await?;
                tracing::debug!(table = %name, rows = rows.len(), "dumped table");
                tables.push(FixtureTable::new(name.clone(), rows));
            }
        }

        Ok(FixtureDocument::new(tables))
    }

    /// Plan the insert buckets and coerce every row
    fn prepare_inserts(
        &self,
        planner: &BatchPlanner<'_>,
        schema: &Schema,
        fixture: &FixtureDocument,
    ) -> ServiceResult<Vec<InsertBatch<NativeRow>>> {
        let targets = fixture
            .tables
            .iter()
            .map(|table| (table.name.clone(), table.fixture_rows()));
        let planned: Vec<InsertBatch<FixtureRow>> =
            planner.plan_insert(targets, self.options.insert_order)?;

        planned
            .into_iter()
            .map(|batch| -> ServiceResult<InsertBatch<NativeRow>> {
                let tables = batch
                    .tables
                    .into_iter()
                    .map(|(name, rows)| -> ServiceResult<(String, Vec<NativeRow>)> {
                        let table = schema.table_by_name(&name).ok_or_else(|| {
                            ServiceError::InvalidFixture(format!("unknown table {name}"))
                        })?;
                        Ok((name, coerce_rows(table, &rows)?))
                    })
                    .collect::<ServiceResult<_>>()?;
                Ok(InsertBatch {
                    level: batch.level,
                    tables,
                })
            })
            .collect()
    }
}
