//! Seedkit Core - Core abstractions shared by every seedkit crate
//!
//! This crate provides the fundamental types and traits that the planning,
//! coercion and execution layers depend on. It defines:
//!
//! - `Schema`, `Table`, `Column` - The immutable schema view
//! - `ColumnKind` - Closed set of column kinds parsed from type descriptors
//! - `InputValue` / `NativeValue` - Loosely typed fixture values and their
//!   null-aware backend form
//! - `Deleter`, `Inserter`, `SchemaFetcher`, `Dumper` - Backend collaborator traits

mod backend;
mod column_kind;
mod error;
mod schema;
mod types;

pub use backend::*;
pub use column_kind::*;
pub use error::*;
pub use schema::*;
pub use types::*;

/// Re-exported so collaborators and callers share one cancellation type.
pub use tokio_util::sync::CancellationToken;
