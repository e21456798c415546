//! Seedkit Drivers - Backend implementations
//!
//! This crate bundles the concrete implementations of the collaborator
//! traits defined in `seedkit-core` and picks one from a database locator.

#[cfg(feature = "sqlite")]
pub use seedkit_driver_sqlite as sqlite;

use seedkit_core::{Deleter, Dumper, Inserter, Result, SchemaFetcher, SeedError};
use std::sync::Arc;

/// Every collaborator role of one opened database
#[derive(Clone)]
pub struct Backend {
    pub driver: &'static str,
    pub deleter: Arc<dyn Deleter>,
    pub inserter: Arc<dyn Inserter>,
    pub schema: Arc<dyn SchemaFetcher>,
    pub dumper: Arc<dyn Dumper>,
}

impl Backend {
    /// Use one value for every role
    pub fn from_shared<B>(driver: &'static str, backend: Arc<B>) -> Self
    where
        B: Deleter + Inserter + SchemaFetcher + Dumper + 'static,
    {
        Self {
            driver,
            deleter: backend.clone(),
            inserter: backend.clone(),
            schema: backend.clone(),
            dumper: backend,
        }
    }
}

/// Open the database a locator names.
///
/// Accepted forms are `sqlite://<path>`, `sqlite:<path>`, `:memory:` and a
/// bare file path, which is opened as SQLite.
pub fn open(locator: &str) -> Result<Backend> {
    let (scheme, target) = split_locator(locator);
    tracing::debug!(driver = %scheme, target = %target, "opening backend");

    match scheme {
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let backend = sqlite::SqliteBackend::open(target)?;
            Ok(Backend::from_shared("sqlite", Arc::new(backend)))
        }
        other => {
            tracing::warn!(driver = %other, "driver not available");
            Err(SeedError::Configuration(format!(
                "No driver available for '{}'",
                locator
            )))
        }
    }
}

/// Split `scheme://target` or `scheme:target`; anything else is a SQLite path
fn split_locator(locator: &str) -> (&str, &str) {
    if locator == ":memory:" {
        return ("sqlite", locator);
    }
    match locator.split_once(':') {
        Some((scheme, rest))
            if scheme.len() > 1 && scheme.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (scheme, rest.strip_prefix("//").unwrap_or(rest))
        }
        _ => ("sqlite", locator),
    }
}
