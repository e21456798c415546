//! `seedkit.toml` configuration
//!
//! ```toml
//! [logging]
//! filter = "warn,seedkit_services=debug"
//! json = false
//!
//! [seeder]
//! insert_order = "parents_first"   # or "level_ascending"
//! delete_before_insert = true
//! ```

use crate::logging::LoggingConfig;
use anyhow::Context;
use seedkit_services::SeederOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedkitConfig {
    pub logging: LoggingConfig,
    pub seeder: SeederOptions,
}

impl SeedkitConfig {
    /// Load from an explicit path, else from the user config directory.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        match default_path() {
            Some(path) if path.is_file() => Self::from_path(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// `<config dir>/seedkit/seedkit.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("seedkit").join("seedkit.toml"))
}
