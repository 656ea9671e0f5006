//! Infrastructure layer constants
//!
//! Domain-specific constants are defined in `beaver_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "beaver.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "beaver";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "BEAVER";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Environment variable overriding the log filter
pub const LOG_FILTER_ENV: &str = "BEAVER_LOG";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File name stem of the rolling log file
pub const DEFAULT_LOG_FILE_STEM: &str = "beaver";

// ============================================================================
// TRANSPORT CONSTANTS
// ============================================================================

/// Default GraphQL endpoint of a local server
pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:8978/api/gql";

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// STORAGE CONSTANTS
// ============================================================================

/// Directory of the file storage backend, relative to the data dir
pub const DEFAULT_STORAGE_DIR: &str = "beaver/state";

/// Extension of files written by the file storage backend
pub const STORAGE_FILE_EXTENSION: &str = "json";

// ============================================================================
// PLUGIN CONSTANTS
// ============================================================================

/// Name of the core plugin manifest
pub const CORE_MANIFEST_NAME: &str = "core";
