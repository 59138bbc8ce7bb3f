//! Configuration for mockpoint hosts and the CLI.

use crate::matcher::EmptyResponsePolicy;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Store file used when no configuration names one
pub const DEFAULT_STORE_PATH: &str = "mocks.json";

fn default_store_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORE_PATH)
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MockpointConfig {
    /// Persisted rule set (JSON records)
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// What to do when the matching entry has no response body
    #[serde(default)]
    pub empty_response: EmptyResponsePolicy,

    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for MockpointConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            empty_response: EmptyResponsePolicy::default(),
            log_level: default_log_level(),
        }
    }
}

impl MockpointConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, anyhow::Error> {
        let config: MockpointConfig = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.store_path.as_os_str().is_empty() {
            anyhow::bail!("'store_path' must not be empty");
        }

        const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];
        if !LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            anyhow::bail!(
                "Unsupported log_level: '{}'. Expected one of: {}",
                self.log_level,
                LEVELS.join(", ")
            );
        }

        Ok(())
    }
}
