//! Keyed map resource
//!
//! Entries live in one shared map. The loader either refreshes a single key
//! or every entry at once (`MapKey::All`). A full reload replaces the map:
//! entries missing from the new response are evicted. A keyed reload merges
//! its entries and evicts the requested key when the response lacks it.
//!
//! Presence metadata separates "loaded and absent" from "never requested",
//! see [`KeyState`].

use crate::resource::cache::{CacheKey, Coverage, EntryStatus, ResourceCache, ResourceStore};
use crate::resource::events::ResourceEvent;
use crate::resource::{ResourceLoader, loader_fn};
use beaver_domain::error::Result;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Request key of a map resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey<K> {
    /// Every entry
    All,
    /// One entry
    Key(K),
}

/// Lookup result distinguishing absent from unknown keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Present,
    /// A fetch covering the key completed without it
    Absent,
    /// No fetch covered the key yet
    NotLoaded,
}

pub struct MapStore<K, V> {
    data: HashMap<K, V>,
    all_loaded: bool,
    loaded_keys: HashSet<K>,
    /// Deleted locally; unknown until fetched again
    forgotten: HashSet<K>,
}

impl<K, V> ResourceStore<MapKey<K>> for MapStore<K, V>
where
    K: CacheKey,
    V: Send + 'static,
{
    type Output = Vec<(K, V)>;

    fn commit(&mut self, key: &MapKey<K>, entries: Vec<(K, V)>) -> Coverage {
        match key {
            MapKey::All => {
                self.data = entries.into_iter().collect();
                self.all_loaded = true;
                self.loaded_keys.clear();
                self.forgotten.clear();
                Coverage::All
            }
            MapKey::Key(requested) => {
                let mut found = false;
                for (key, value) in entries {
                    found |= key == *requested;
                    self.data.insert(key, value);
                }
                if !found {
                    self.data.remove(requested);
                }
                self.forgotten.remove(requested);
                self.loaded_keys.insert(requested.clone());
                Coverage::Key
            }
        }
    }

    fn covering_key(key: &MapKey<K>) -> Option<MapKey<K>> {
        match key {
            MapKey::All => None,
            MapKey::Key(_) => Some(MapKey::All),
        }
    }
}

impl<K: CacheKey, V> MapStore<K, V> {
    fn lookup(&self, key: &K) -> KeyState {
        if self.data.contains_key(key) {
            KeyState::Present
        } else if self.forgotten.contains(key) {
            KeyState::NotLoaded
        } else if self.all_loaded || self.loaded_keys.contains(key) {
            KeyState::Absent
        } else {
            KeyState::NotLoaded
        }
    }
}

/// Resource merging loaded entries into a shared map
pub struct CachedMapResource<K, V>
where
    K: CacheKey,
    V: Send + 'static,
{
    cache: ResourceCache<MapKey<K>, MapStore<K, V>>,
}

impl<K, V> CachedMapResource<K, V>
where
    K: CacheKey,
    V: Clone + Send + 'static,
{
    pub fn new<L>(name: impl Into<String>, loader: L) -> Self
    where
        L: ResourceLoader<MapKey<K>, Vec<(K, V)>> + 'static,
    {
        Self {
            cache: ResourceCache::new(
                name,
                MapStore {
                    data: HashMap::new(),
                    all_loaded: false,
                    loaded_keys: HashSet::new(),
                    forgotten: HashSet::new(),
                },
                Arc::new(loader),
            ),
        }
    }

    /// Resource fetched by an async closure
    pub fn from_fn<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(MapKey<K>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<(K, V)>>> + Send + 'static,
    {
        Self::new(name, loader_fn(f))
    }

    pub fn name(&self) -> &str {
        self.cache.name()
    }

    /// Entry of `key`, fetched unless fresh
    pub async fn load(&self, key: K) -> Result<Option<V>> {
        let request = MapKey::Key(key);
        self.cache.load(&request, false).await?;
        Ok(self.lookup_value(&request))
    }

    /// Every entry, fetched unless fresh
    pub async fn load_all(&self) -> Result<HashMap<K, V>> {
        self.cache.load(&MapKey::All, false).await?;
        Ok(self.snapshot())
    }

    pub async fn refresh(&self, key: K) -> Result<Option<V>> {
        let request = MapKey::Key(key);
        self.cache.load(&request, true).await?;
        Ok(self.lookup_value(&request))
    }

    pub async fn refresh_all(&self) -> Result<HashMap<K, V>> {
        self.cache.load(&MapKey::All, true).await?;
        Ok(self.snapshot())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.read(|store| store.data.get(key).cloned())
    }

    /// Cached entries without fetching
    pub fn values(&self) -> Vec<V> {
        self.cache.read(|store| store.data.values().cloned().collect())
    }

    pub fn keys(&self) -> Vec<K> {
        self.cache.read(|store| store.data.keys().cloned().collect())
    }

    pub fn snapshot(&self) -> HashMap<K, V> {
        self.cache.read(|store| store.data.clone())
    }

    pub fn len(&self) -> usize {
        self.cache.read(|store| store.data.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the entry holds data
    pub fn has(&self, key: &K) -> bool {
        self.lookup(key) == KeyState::Present
    }

    pub fn lookup(&self, key: &K) -> KeyState {
        self.cache.read(|store| store.lookup(key))
    }

    /// True once a full load completed
    pub fn is_all_loaded(&self) -> bool {
        self.cache.read(|store| store.all_loaded)
    }

    pub fn status(&self, key: &MapKey<K>) -> EntryStatus {
        self.cache.status(key)
    }

    pub fn mark_outdated(&self, key: K) {
        self.cache.mark_outdated(&MapKey::Key(key));
    }

    /// Every entry, including the full-load entry, is fetched again on next access
    pub fn mark_all_outdated(&self) {
        self.cache.mark_all_outdated();
    }

    /// Replace an entry locally
    pub fn set(&self, key: K, value: V) {
        let request = MapKey::Key(key.clone());
        self.cache.update(&request, |store| {
            store.forgotten.remove(&key);
            store.loaded_keys.insert(key.clone());
            store.data.insert(key, value);
        });
    }

    /// Remove an entry locally; the key reads as not loaded until refetched
    pub fn delete(&self, key: &K) -> Option<V> {
        self.cache.remove(&MapKey::Key(key.clone()), |store| {
            store.loaded_keys.remove(key);
            store.forgotten.insert(key.clone());
            store.data.remove(key)
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent<MapKey<K>>> {
        self.cache.subscribe()
    }

    fn lookup_value(&self, request: &MapKey<K>) -> Option<V> {
        match request {
            MapKey::All => None,
            MapKey::Key(key) => self.get(key),
        }
    }
}
