//! GraphQL Transport Port
//!
//! Opaque request/response transport used by resource loaders.
//! Timeouts and retries are the concern of the implementation.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Remote procedure transport
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    /// Execute `operation` with `variables` and return the `data` document
    async fn request(&self, operation: &str, variables: Value) -> Result<Value>;

    /// Short name used in logs
    fn transport_name(&self) -> &str;
}
