use crate::BatchError;
use seedkit_coerce::CoercionError;
use seedkit_core::SeedError;
use seedkit_dependencies::PlanError;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level errors
///
/// Planning and coercion errors are raised before anything is mutated.
/// Batch errors mean some buckets may already have been applied.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Planning failed: {0}")]
    Plan(#[from] PlanError),

    #[error("Invalid fixture value: {0}")]
    Coercion(#[from] CoercionError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Backend error: {0}")]
    Backend(#[from] SeedError),

    #[error("Invalid fixture: {0}")]
    InvalidFixture(String),
}
