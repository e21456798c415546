//! Seedkit Services Layer
//!
//! This crate ties planning, coercion and execution together into the
//! operations a caller actually runs against a backend.
//!
//! # Architecture
//!
//! ```text
//! CLI (seedkit-cli)
//!     ↓
//! Service Layer (seedkit-services) ← This crate
//!     ↓
//! Domain Layer (seedkit-dependencies, seedkit-coerce)
//!     ↓
//! Infrastructure Layer (seedkit-core, seedkit-drivers)
//! ```
//!
//! # Services
//!
//! - [`BatchExecutor`] - Runs ordered buckets, one concurrent task per table
//! - [`Seeder`] - Reset, delete, insert, plan and dump over a fixture document
//! - [`FixtureDocument`] - The `[{ "name": ..., "rows": [...] }]` fixture format

mod error;
mod executor;
mod fixture;
mod options;
mod seeder;

pub use error::{ServiceError, ServiceResult};
pub use executor::{BatchError, BatchExecutor, ExecutionSummary, Operation, TableFailure};
pub use fixture::{FixtureDocument, FixtureTable};
pub use options::SeederOptions;
pub use seeder::{PlannedBatch, SeedPlan, SeedReport, Seeder};
