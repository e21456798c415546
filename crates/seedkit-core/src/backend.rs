//! Backend collaborator traits
//!
//! The core never talks to a database itself. Deleting, inserting, schema
//! discovery and dumping are delegated to backend implementations of these
//! traits, which own their connection and transaction state.

use crate::{CancellationToken, DumpRow, NativeRow, Result, Schema, Table};
use async_trait::async_trait;

/// Deletes every row of one table
#[async_trait]
pub trait Deleter: Send + Sync {
    /// Delete all rows of `table`.
    ///
    /// Deleting from an already empty table succeeds. Implementations should
    /// return [`SeedError::Cancelled`](crate::SeedError::Cancelled) without
    /// doing work when `cancel` is already triggered.
    async fn delete(&self, table: &str, cancel: &CancellationToken) -> Result<()>;
}

/// Inserts a batch of coerced rows into one table
#[async_trait]
pub trait Inserter: Send + Sync {
    /// Insert `rows` into `table`, returning the number of rows written.
    ///
    /// `cancel` may be checked between rows so a failing sibling can stop
    /// work that has not started yet.
    async fn insert(&self, table: &str, rows: &[NativeRow], cancel: &CancellationToken)
    -> Result<u64>;
}

/// Fetches the schema view for one invocation
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    async fn fetch_schema(&self) -> Result<Schema>;
}

/// Reads the current rows of a table back in fixture form
#[async_trait]
pub trait Dumper: Send + Sync {
    /// All rows of `table`, ordered by its primary key
    async fn dump(&self, table: &Table) -> Result<Vec<DumpRow>>;
}
