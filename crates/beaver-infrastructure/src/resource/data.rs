//! Keyed data resource: one value per key

use crate::resource::cache::{CacheKey, Coverage, EntryStatus, ResourceCache, ResourceStore};
use crate::resource::events::ResourceEvent;
use crate::resource::{ResourceLoader, loader_fn};
use beaver_domain::error::{Error, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

pub struct DataStore<K, V> {
    data: HashMap<K, V>,
}

impl<K, V> ResourceStore<K> for DataStore<K, V>
where
    K: CacheKey,
    V: Send + 'static,
{
    type Output = V;

    fn commit(&mut self, key: &K, output: V) -> Coverage {
        self.data.insert(key.clone(), output);
        Coverage::Key
    }
}

/// Resource holding a value per key
pub struct CachedDataResource<K, V>
where
    K: CacheKey,
    V: Send + 'static,
{
    cache: ResourceCache<K, DataStore<K, V>>,
}

impl<K, V> CachedDataResource<K, V>
where
    K: CacheKey,
    V: Clone + Send + 'static,
{
    pub fn new<L>(name: impl Into<String>, loader: L) -> Self
    where
        L: ResourceLoader<K, V> + 'static,
    {
        Self {
            cache: ResourceCache::new(
                name,
                DataStore {
                    data: HashMap::new(),
                },
                Arc::new(loader),
            ),
        }
    }

    /// Resource fetched by an async closure
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        Self::new(name, loader_fn(f))
    }

    pub fn name(&self) -> &str {
        self.cache.name()
    }

    /// Cached value, fetched when missing or outdated
    pub async fn load(&self, key: K) -> Result<V> {
        self.cache.load(&key, false).await?;
        self.value(&key)
    }

    /// Fetch again regardless of freshness
    pub async fn refresh(&self, key: K) -> Result<V> {
        self.cache.load(&key, true).await?;
        self.value(&key)
    }

    /// Cached value without fetching
    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.read(|store| store.data.get(key).cloned())
    }

    pub fn has(&self, key: &K) -> bool {
        self.cache.read(|store| store.data.contains_key(key))
    }

    pub fn status(&self, key: &K) -> EntryStatus {
        self.cache.status(key)
    }

    pub fn mark_outdated(&self, key: &K) {
        self.cache.mark_outdated(key);
    }

    pub fn mark_all_outdated(&self) {
        self.cache.mark_all_outdated();
    }

    /// Replace the cached value locally
    pub fn set(&self, key: K, value: V) {
        self.cache.update(&key, |store| {
            store.data.insert(key.clone(), value);
        });
    }

    /// Drop the cached value
    pub fn delete(&self, key: &K) -> Option<V> {
        self.cache.remove(key, |store| store.data.remove(key))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent<K>> {
        self.cache.subscribe()
    }

    fn value(&self, key: &K) -> Result<V> {
        self.get(key)
            .ok_or_else(|| Error::not_found(format!("{} [{key:?}]", self.cache.name())))
    }
}
