//! Configuration types
//!
//! Field names map to single-word keys so that environment variables split
//! on `_` (`BEAVER_API_TIMEOUT`, `BEAVER_LOGGING_JSON`) reach them.

use crate::constants::{
    DEFAULT_API_ENDPOINT, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STORAGE_DIR,
};
use beaver_domain::di::Service;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// GraphQL endpoint settings
    pub api: ApiConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Persistence of auto-saved state
    pub storage: StorageConfig,
}

impl Service for AppConfig {}

/// GraphQL endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// URL receiving GraphQL POST requests
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_API_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON output format
    #[serde(rename = "json")]
    pub json_format: bool,

    /// Log to a daily rolling file in addition to stdout
    #[serde(rename = "file")]
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

/// Where auto-saved state is kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Lost on exit
    #[default]
    Memory,
    /// One JSON file per key
    File,
}

/// Storage configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,

    /// Directory of the file backend; defaults to the user data directory
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Directory used by the file backend
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(DEFAULT_STORAGE_DIR)))
    }
}
