//! Configuration
//!
//! Layered application configuration: defaults, then a TOML file, then
//! `BEAVER_*` environment variables.

pub mod loader;
pub mod types;

pub use loader::ConfigLoader;
pub use types::{ApiConfig, AppConfig, LoggingConfig, StorageBackend, StorageConfig};
