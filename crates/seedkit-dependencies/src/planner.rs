//! Batch planning
//!
//! Groups tables into buckets by level and orders the buckets so that each
//! one can be processed concurrently once the buckets before it are done.

use crate::{PlanError, ReferenceGraph, collect_dependents};
use indexmap::IndexMap;
use seedkit_core::{Schema, TableIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One bucket of tables to clear concurrently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteBatch {
    pub level: usize,
    /// Table names, sorted
    pub tables: Vec<String>,
}

/// One bucket of tables to fill concurrently
#[derive(Debug, Clone, PartialEq)]
pub struct InsertBatch<R> {
    pub level: usize,
    pub tables: IndexMap<String, Vec<R>>,
}

impl<R> InsertBatch<R> {
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }
}

/// Order in which insert buckets are emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertOrder {
    /// Descending level: referenced tables are filled before the tables
    /// that reference them
    #[default]
    ParentsFirst,
    /// Ascending level, the same order deletes use
    LevelAscending,
}

/// Bucket `members` by level, ascending. Empty levels are skipped.
pub fn bucket_by_level(
    levels: &[usize],
    members: impl IntoIterator<Item = TableIndex>,
) -> Vec<(usize, Vec<TableIndex>)> {
    let mut buckets: BTreeMap<usize, BTreeSet<TableIndex>> = BTreeMap::new();
    for member in members {
        if let Some(&level) = levels.get(member) {
            buckets.entry(level).or_default().insert(member);
        }
    }
    buckets
        .into_iter()
        .map(|(level, members)| (level, members.into_iter().collect()))
        .collect()
}

/// Plans delete and insert batches over one schema
#[derive(Debug, Clone)]
pub struct BatchPlanner<'a> {
    schema: &'a Schema,
    graph: ReferenceGraph,
    levels: Vec<usize>,
}

impl<'a> BatchPlanner<'a> {
    /// Level the schema's reference graph.
    ///
    /// Fails with [`PlanError::CyclicReferences`] if the graph has a cycle.
    pub fn new(schema: &'a Schema) -> Result<Self, PlanError> {
        let graph = ReferenceGraph::from_schema(schema);
        let Some(levels) = graph.levels() else {
            let tables = graph
                .unleveled()
                .into_iter()
                .filter_map(|index| schema.table(index).map(|t| t.name.clone()))
                .collect();
            return Err(PlanError::CyclicReferences { tables });
        };

        tracing::debug!(
            tables = schema.len(),
            levels = levels.iter().max().map_or(0, |max| max + 1),
            "leveled reference graph"
        );

        Ok(Self {
            schema,
            graph,
            levels,
        })
    }

    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    /// Resolve table names to indices, failing on the first unknown name
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<TableIndex>, PlanError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.schema
                    .table_index(name)
                    .ok_or_else(|| PlanError::UnknownTable(name.to_string()))
            })
            .collect()
    }

    /// The targets plus every table that transitively references them
    pub fn cascade<S: AsRef<str>>(&self, names: &[S]) -> Result<BTreeSet<TableIndex>, PlanError> {
        let targets = self.resolve(names)?;
        Ok(collect_dependents(&self.graph.dependents(), &targets))
    }

    /// Delete batches for the cascade set of `names`, ascending by level
    pub fn plan_delete<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<DeleteBatch>, PlanError> {
        let cascade = self.cascade(names)?;

        let batches: Vec<DeleteBatch> = bucket_by_level(&self.levels, cascade)
            .into_iter()
            .map(|(level, members)| {
                let mut tables: Vec<String> =
                    members.into_iter().map(|index| self.name(index)).collect();
                tables.sort();
                DeleteBatch { level, tables }
            })
            .collect();

        tracing::debug!(
            targets = names.len(),
            batches = batches.len(),
            "planned delete batches"
        );
        Ok(batches)
    }

    /// Insert batches for exactly the named tables.
    ///
    /// Rows given for the same table more than once are concatenated in
    /// request order. Every name is resolved before any batch is built.
    pub fn plan_insert<R>(
        &self,
        targets: impl IntoIterator<Item = (String, Vec<R>)>,
        order: InsertOrder,
    ) -> Result<Vec<InsertBatch<R>>, PlanError> {
        let mut by_index: IndexMap<TableIndex, (String, Vec<R>)> = IndexMap::new();
        for (name, rows) in targets {
            let index = self
                .schema
                .table_index(&name)
                .ok_or_else(|| PlanError::UnknownTable(name.clone()))?;
            by_index
                .entry(index)
                .or_insert_with(|| (name, Vec::new()))
                .1
                .extend(rows);
        }

        let mut buckets = bucket_by_level(&self.levels, by_index.keys().copied().collect::<Vec<_>>());
        if order == InsertOrder::ParentsFirst {
            buckets.reverse();
        }

        let batches: Vec<InsertBatch<R>> = buckets
            .into_iter()
            .map(|(level, members)| {
                let tables = members
                    .into_iter()
                    .filter_map(|index| by_index.swap_remove(&index))
                    .collect();
                InsertBatch { level, tables }
            })
            .collect();

        tracing::debug!(
            batches = batches.len(),
            order = ?order,
            "planned insert batches"
        );
        Ok(batches)
    }

    fn name(&self, index: TableIndex) -> String {
        self.schema
            .table(index)
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }
}
