//! Resource change notifications

use beaver_domain::error::Error;
use std::sync::Arc;

/// Change of a resource entry, broadcast to subscribers
#[derive(Debug, Clone)]
pub enum ResourceEvent<K> {
    /// A fetch committed new data
    Loaded(K),
    /// A fetch failed; previous data was kept
    Failed { key: K, error: Arc<Error> },
    /// The entry will be fetched again on next access
    Outdated(K),
    /// Data was replaced locally
    Updated(K),
    /// Data was removed locally
    Deleted(K),
}

impl<K> ResourceEvent<K> {
    pub fn key(&self) -> &K {
        match self {
            Self::Loaded(key)
            | Self::Outdated(key)
            | Self::Updated(key)
            | Self::Deleted(key)
            | Self::Failed { key, .. } => key,
        }
    }
}
