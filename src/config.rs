//! Store configuration
//!
//! A JSON file or an in-code value describing one collection's backing file:
//!
//! ```json
//! { "path": "users.json", "base_dir": "/var/lib/app", "fsync": true,
//!   "pretty": true, "log_level": "warn" }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::persist::PersistOptions;

/// Result type for configuration handling
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Error code string
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "DOCSTORE_CONFIG_READ_FAILED",
            ConfigError::Parse(_) => "DOCSTORE_CONFIG_PARSE_FAILED",
            ConfigError::Invalid(_) => "DOCSTORE_CONFIG_INVALID",
        }
    }
}

/// Configuration for one collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backing file (required)
    pub path: PathBuf,

    /// Directory a relative `path` is resolved against
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// fsync before rename (default true)
    #[serde(default = "default_fsync")]
    pub fsync: bool,

    /// Indent the backing file (default true)
    #[serde(default = "default_pretty")]
    pub pretty: bool,

    /// Minimum log severity (default "warn")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_fsync() -> bool {
    true
}
fn default_pretty() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl StoreConfig {
    /// Defaults for `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            base_dir: None,
            fsync: default_fsync(),
            pretty: default_pretty(),
            log_level: default_log_level(),
        }
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config: StoreConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;

        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("config", &path.display().to_string()),
                ("path", &config.resolved_path().display().to_string()),
            ],
        );

        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("path must not be empty".into()));
        }

        if self.path.file_name().is_none() {
            return Err(ConfigError::Invalid(format!(
                "path '{}' does not name a file",
                self.path.display()
            )));
        }

        self.severity()?;

        Ok(())
    }

    /// `path`, joined onto `base_dir` when relative
    pub fn resolved_path(&self) -> PathBuf {
        match &self.base_dir {
            Some(base) if self.path.is_relative() => base.join(&self.path),
            _ => self.path.clone(),
        }
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level.parse().map_err(ConfigError::Invalid)
    }

    /// Engine options derived from this config
    pub fn persist_options(&self) -> PersistOptions {
        PersistOptions { fsync: self.fsync }
    }

    /// Install `log_level` as the process-wide minimum severity
    pub fn apply_logging(&self) -> ConfigResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }
}
