//! Logging setup for the seedkit binary
//!
//! Logs go to stderr so `plan` and `dump` output on stdout stays clean.
//! `RUST_LOG` takes precedence over the configured filter.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// `[logging]` section of `seedkit.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directives, e.g. `warn,seedkit_services=debug`
    pub filter: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn,seedkit_cli=info,seedkit_services=info,seedkit_drivers=info,seedkit_driver_sqlite=info".to_string(),
            json: false,
        }
    }
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));

    let layer = if config.json {
        fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter)
            .boxed()
    };

    tracing_subscriber::registry().with(layer).try_init()?;

    tracing::debug!(json = config.json, "logging initialized");
    Ok(())
}
