//! State Storage Port
//!
//! Key-value persistence for auto-saved service state, keyed by string
//! namespaces. Values are serialized JSON documents.

use crate::error::Result;

/// Synchronous key-value persistence
///
/// Writes happen on every state mutation, from non-async code paths.
pub trait StateStorage: Send + Sync {
    /// Raw JSON stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the JSON stored under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the value stored under `key`
    fn remove(&self, key: &str) -> Result<()>;
}
