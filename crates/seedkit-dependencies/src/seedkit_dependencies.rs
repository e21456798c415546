//! Table Dependency Planning
//!
//! This crate turns a schema's table reference graph into an ordered plan of
//! batches that can be mutated safely:
//!
//! - [`level`] assigns every table a level; tables sharing a level never
//!   reference each other, so they can be processed concurrently.
//! - [`collect_dependents`] expands a set of target tables into every table
//!   that transitively references them (the cascade set).
//! - [`BatchPlanner`] buckets tables by level into ordered delete and insert
//!   batches.

mod cascade;
mod error;
mod graph;
mod planner;

#[cfg(test)]
mod tests;

pub use cascade::collect_dependents;
pub use error::PlanError;
pub use graph::{ReferenceGraph, level, transpose};
pub use planner::{BatchPlanner, DeleteBatch, InsertBatch, InsertOrder, bucket_by_level};
