use thiserror::Error;

/// Schema-level planning errors.
///
/// These are detected before any mutation starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("Reference cycle detected, tables without a level: {}", tables.join(", "))]
    CyclicReferences { tables: Vec<String> },

    #[error("Unknown table: {0}")]
    UnknownTable(String),
}
