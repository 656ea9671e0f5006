//! Singleton resource: one implicit entry

use crate::resource::cache::EntryStatus;
use crate::resource::data::CachedDataResource;
use crate::resource::events::ResourceEvent;
use crate::resource::{ResourceLoader, loader_fn};
use beaver_domain::error::Result;
use std::future::Future;
use tokio::sync::broadcast;

/// Resource without a key
pub struct SingletonResource<V: Send + 'static> {
    resource: CachedDataResource<(), V>,
}

impl<V> SingletonResource<V>
where
    V: Clone + Send + 'static,
{
    pub fn new<L>(name: impl Into<String>, loader: L) -> Self
    where
        L: ResourceLoader<(), V> + 'static,
    {
        Self {
            resource: CachedDataResource::new(name, loader),
        }
    }

    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        Self::new(name, loader_fn(move |()| f()))
    }

    pub fn name(&self) -> &str {
        self.resource.name()
    }

    pub async fn load(&self) -> Result<V> {
        self.resource.load(()).await
    }

    pub async fn refresh(&self) -> Result<V> {
        self.resource.refresh(()).await
    }

    /// Cached value without fetching
    pub fn data(&self) -> Option<V> {
        self.resource.get(&())
    }

    pub fn is_loaded(&self) -> bool {
        self.resource.has(&())
    }

    pub fn status(&self) -> EntryStatus {
        self.resource.status(&())
    }

    pub fn mark_outdated(&self) {
        self.resource.mark_outdated(&());
    }

    pub fn set(&self, value: V) {
        self.resource.set((), value);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent<()>> {
        self.resource.subscribe()
    }
}
