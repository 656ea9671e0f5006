//! Error handling types

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Beaver Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Container (fatal at startup)
    // ========================================================================
    /// A token was resolved but never declared by any manifest
    #[error("Unregistered token: {token}")]
    UnregisteredToken {
        /// Name of the requested token
        token: String,
    },

    /// Resolution re-entered a token before its construction completed
    #[error("Cyclic dependency: {}", chain.join(" -> "))]
    CyclicDependency {
        /// Token names from the first occurrence back to the repeated one
        chain: Vec<String>,
    },

    /// The same token was declared twice
    #[error("Token already registered: {token}")]
    DuplicateToken {
        /// Name of the duplicated token
        token: String,
    },

    /// A factory asked for a dependency it did not declare
    #[error("Dependency {dependency} was not declared by {service}")]
    UndeclaredDependency {
        /// Service being constructed
        service: String,
        /// Dependency that was requested
        dependency: String,
    },

    // ========================================================================
    // Manifest registry (fatal at startup)
    // ========================================================================
    /// A manifest depends on a manifest that was never added
    #[error("Manifest '{manifest}' depends on unknown manifest '{dependency}'")]
    MissingManifestDependency {
        /// Manifest declaring the dependency
        manifest: String,
        /// Name of the missing manifest
        dependency: String,
    },

    /// Manifest dependencies form a cycle
    #[error("Cyclic manifest dependency between: {}", manifests.join(", "))]
    CyclicManifestDependency {
        /// Manifests that could not be ordered
        manifests: Vec<String>,
    },

    /// Two manifests share a name
    #[error("Manifest already registered: {name}")]
    DuplicateManifest {
        /// Duplicated manifest name
        name: String,
    },

    /// `bootstrap()` was called more than once
    #[error("Bootstrap already started")]
    AlreadyBootstrapped,

    /// A provider failed during the register phase
    #[error("Bootstrap error: {message}")]
    Bootstrap {
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // ========================================================================
    // Runtime (recoverable)
    // ========================================================================
    /// A resource loader failed; shared by every coalesced caller
    #[error("Failed to load {resource} [{key}]: {source}")]
    ResourceLoad {
        /// Resource name
        resource: String,
        /// Debug rendering of the requested key
        key: String,
        /// Loader error
        #[source]
        source: Arc<Error>,
    },

    /// A blocking executor handler failed
    #[error("Handler '{handler}' failed: {source}")]
    Handler {
        /// Handler name
        handler: String,
        /// Handler error
        #[source]
        source: Box<Error>,
    },

    /// Transport-level request error
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The remote endpoint answered with GraphQL errors
    #[error("GraphQL operation '{operation}' failed: {}", messages.join("; "))]
    GraphQl {
        /// Operation name
        operation: String,
        /// Error messages returned by the server
        messages: Vec<String>,
    },

    /// Persistence error
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Resource not found error
    #[error("Not found: {resource}")]
    NotFound {
        /// The resource that was not found
        resource: String,
    },

    /// Invalid argument provided to a function
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument
        message: String,
    },

    /// I/O operation error
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error
    #[error("JSON parsing error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
    },
}

// Basic error creation methods
impl Error {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a bootstrap error wrapping the failure of a provider
    pub fn bootstrap<S: Into<String>>(message: S, source: Error) -> Self {
        Self::Bootstrap {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

// Classification
impl Error {
    /// Structural errors that must halt application boot
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnregisteredToken { .. }
                | Self::CyclicDependency { .. }
                | Self::DuplicateToken { .. }
                | Self::UndeclaredDependency { .. }
                | Self::MissingManifestDependency { .. }
                | Self::CyclicManifestDependency { .. }
                | Self::DuplicateManifest { .. }
                | Self::AlreadyBootstrapped
                | Self::Bootstrap { .. }
        )
    }
}
