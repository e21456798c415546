//! Reference graph and leveling
//!
//! `references[i]` lists the tables that table `i` references. The transpose
//! lists, for every table, the tables that reference it.

use seedkit_core::{Schema, TableIndex};
use std::collections::VecDeque;

/// Adjacency list over table indices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceGraph {
    references: Vec<Vec<TableIndex>>,
}

impl ReferenceGraph {
    pub fn new(references: Vec<Vec<TableIndex>>) -> Self {
        Self { references }
    }

    pub fn from_schema(schema: &Schema) -> Self {
        Self::new(schema.references().to_vec())
    }

    pub fn references(&self) -> &[Vec<TableIndex>] {
        &self.references
    }

    /// For every table, the tables that reference it
    pub fn dependents(&self) -> Vec<Vec<TableIndex>> {
        transpose(&self.references)
    }

    /// Level of every table, or `None` if the graph has a cycle
    pub fn levels(&self) -> Option<Vec<usize>> {
        level(&self.references)
    }

    /// Tables that never receive a level: cycle members and every table
    /// only reachable through a cycle
    pub fn unleveled(&self) -> Vec<TableIndex> {
        assign_levels(&self.references)
            .iter()
            .enumerate()
            .filter(|(_, level)| level.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// Every edge as `(from, to)`
    pub fn edges(&self) -> impl Iterator<Item = (TableIndex, TableIndex)> + '_ {
        self.references
            .iter()
            .enumerate()
            .flat_map(|(from, edges)| edges.iter().map(move |&to| (from, to)))
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

/// Reverse every edge of `references`
pub fn transpose(references: &[Vec<TableIndex>]) -> Vec<Vec<TableIndex>> {
    let mut transposed = vec![Vec::new(); references.len()];
    for (from, edges) in references.iter().enumerate() {
        for &to in edges {
            if let Some(dependents) = transposed.get_mut(to) {
                dependents.push(from);
            }
        }
    }
    transposed
}

/// Assign every table a level.
///
/// Round-synchronous Kahn's algorithm. Tables nothing references start at
/// round 0. A round dequeues exactly the tables enqueued for it; tables whose
/// in-degree drops to zero during the round are enqueued together at the
/// next round. For every edge `u -> v` this gives `level[u] < level[v]`, so
/// ascending levels visit referencing tables before the tables they
/// reference.
///
/// Returns `None` if any table is left without a level (the graph has a
/// cycle). Order within a level is unspecified. Edges pointing past the end
/// of `references` are ignored, as in [`transpose`].
pub fn level(references: &[Vec<TableIndex>]) -> Option<Vec<usize>> {
    assign_levels(references).into_iter().collect()
}

fn assign_levels(references: &[Vec<TableIndex>]) -> Vec<Option<usize>> {
    let mut in_degree = vec![0usize; references.len()];
    for edges in references {
        for &to in edges {
            if let Some(degree) = in_degree.get_mut(to) {
                *degree += 1;
            }
        }
    }

    let mut levels: Vec<Option<usize>> = vec![None; references.len()];
    let mut queue: VecDeque<TableIndex> = (0..references.len())
        .filter(|&index| in_degree[index] == 0)
        .collect();
    for &index in &queue {
        levels[index] = Some(0);
    }

    let mut round = 0;
    while !queue.is_empty() {
        let mut zeroed = Vec::new();
        for _ in 0..queue.len() {
            let Some(current) = queue.pop_front() else {
                break;
            };
            for &next in &references[current] {
                let Some(degree) = in_degree.get_mut(next) else {
                    continue;
                };
                *degree -= 1;
                if *degree == 0 {
                    zeroed.push(next);
                }
            }
        }

        if !zeroed.is_empty() {
            round += 1;
            for next in zeroed {
                levels[next] = Some(round);
                queue.push_back(next);
            }
        }
    }

    levels
}
