use seedkit_core::TableIndex;
use std::collections::BTreeSet;

/// Collect every table that must be cleared before `targets` can be.
///
/// Walks the transposed graph (table -> tables referencing it) depth-first
/// from each target. The result contains the targets themselves. Tables
/// reached through more than one target are visited once.
pub fn collect_dependents(
    transposed: &[Vec<TableIndex>],
    targets: &[TableIndex],
) -> BTreeSet<TableIndex> {
    let mut visited = BTreeSet::new();

    for &target in targets {
        let mut stack = vec![target];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }

            if let Some(dependents) = transposed.get(current) {
                stack.extend(dependents.iter().filter(|d| !visited.contains(*d)));
            }
        }
    }

    visited
}
