//! Single-flight cache core shared by every resource shape
//!
//! [`ResourceCache`] owns the per-key entry metadata, the in-flight fetch
//! registry and a [`ResourceStore`] holding the data itself. The shared
//! future of a running fetch doubles as the exclusion token for its key.

use crate::resource::ResourceLoader;
use crate::resource::events::ResourceEvent;
use beaver_domain::constants::RESOURCE_EVENT_CHANNEL_CAPACITY;
use beaver_domain::error::{Error, Result};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Key usable by a [`ResourceCache`]
pub trait CacheKey: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

impl<T> CacheKey for T where T: Eq + Hash + Clone + Debug + Send + Sync + 'static {}

/// Which entries a committed fetch refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// Only the requested key
    Key,
    /// Every entry of the resource
    All,
}

/// Data side of a resource
pub trait ResourceStore<K>: Send + 'static {
    /// What the loader produces for one key
    type Output: Send + 'static;

    /// Store the loader output for `key`
    fn commit(&mut self, key: &K, output: Self::Output) -> Coverage;

    /// Key whose fresh data also covers `key`
    fn covering_key(_key: &K) -> Option<K> {
        None
    }
}

#[derive(Debug, Clone, Default)]
struct EntryMeta {
    loaded: bool,
    loading: bool,
    outdated: bool,
    /// Fetches numbered below this started before the last outdated mark
    marked_before: u64,
    last_error: Option<Arc<Error>>,
}

impl EntryMeta {
    fn is_fresh(&self) -> bool {
        self.loaded && !self.outdated
    }
}

/// Read-only snapshot of an entry
#[derive(Debug, Clone, Default)]
pub struct EntryStatus {
    /// Data was fetched or set at least once
    pub loaded: bool,
    /// A fetch is in flight
    pub loading: bool,
    /// Data will be fetched again on next access
    pub outdated: bool,
    /// Error of the last failed fetch, cleared by the next success
    pub last_error: Option<Arc<Error>>,
}

impl From<&EntryMeta> for EntryStatus {
    fn from(meta: &EntryMeta) -> Self {
        Self {
            loaded: meta.loaded,
            loading: meta.loading,
            outdated: meta.outdated,
            last_error: meta.last_error.clone(),
        }
    }
}

type SharedLoad = Shared<BoxFuture<'static, std::result::Result<(), Arc<Error>>>>;

struct InFlight {
    id: u64,
    load: SharedLoad,
}

struct CacheState<K, S> {
    store: S,
    meta: HashMap<K, EntryMeta>,
    in_flight: HashMap<K, InFlight>,
}

struct CacheInner<K, S: ResourceStore<K>> {
    name: String,
    state: Mutex<CacheState<K, S>>,
    loader: Arc<dyn ResourceLoader<K, S::Output>>,
    events: broadcast::Sender<ResourceEvent<K>>,
    next_fetch: AtomicU64,
}

enum Plan {
    Hit,
    Wait(SharedLoad),
}

/// Per-key cache with coalesced fetches
pub struct ResourceCache<K, S: ResourceStore<K>> {
    inner: Arc<CacheInner<K, S>>,
}

impl<K, S> ResourceCache<K, S>
where
    K: CacheKey,
    S: ResourceStore<K>,
{
    pub fn new(
        name: impl Into<String>,
        store: S,
        loader: Arc<dyn ResourceLoader<K, S::Output>>,
    ) -> Self {
        let (events, _) = broadcast::channel(RESOURCE_EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(CacheInner {
                name: name.into(),
                state: Mutex::new(CacheState {
                    store,
                    meta: HashMap::new(),
                    in_flight: HashMap::new(),
                }),
                loader,
                events,
                next_fetch: AtomicU64::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Make sure `key` holds fresh data
    ///
    /// `force` skips the freshness check but still joins a running fetch.
    /// A loader error is returned to every caller waiting on that fetch.
    pub async fn load(&self, key: &K, force: bool) -> Result<()> {
        let plan = self.plan(key, force);
        match plan {
            Plan::Hit => Ok(()),
            Plan::Wait(load) => load.await.map_err(|source| Error::ResourceLoad {
                resource: self.inner.name.clone(),
                key: format!("{key:?}"),
                source,
            }),
        }
    }

    /// Flag `key` for refetch on next access, keeping its data readable
    pub fn mark_outdated(&self, key: &K) {
        {
            let mut state = self.inner.lock();
            let loading = state.in_flight.contains_key(key);
            let covering = S::covering_key(key).and_then(|c| state.meta.get(&c).cloned());
            let mark = self.inner.next_fetch.load(Ordering::Relaxed);
            let meta = state.meta.entry(key.clone()).or_insert_with(|| EntryMeta {
                loading,
                ..covering
                    .map(|covering| EntryMeta {
                        loaded: covering.loaded,
                        last_error: covering.last_error,
                        ..EntryMeta::default()
                    })
                    .unwrap_or_default()
            });
            meta.outdated = true;
            meta.marked_before = mark;
        }
        debug!(resource = %self.inner.name, key = ?key, "Marked outdated");
        self.inner.emit(ResourceEvent::Outdated(key.clone()));
    }

    /// Flag every known entry for refetch
    pub fn mark_all_outdated(&self) {
        let keys: Vec<K> = {
            let mut state = self.inner.lock();
            let mark = self.inner.next_fetch.load(Ordering::Relaxed);
            state
                .meta
                .iter_mut()
                .map(|(key, meta)| {
                    meta.outdated = true;
                    meta.marked_before = mark;
                    key.clone()
                })
                .collect()
        };
        debug!(resource = %self.inner.name, entries = keys.len(), "Marked all outdated");
        for key in keys {
            self.inner.emit(ResourceEvent::Outdated(key));
        }
    }

    /// Entry snapshot; falls back to the covering entry
    pub fn status(&self, key: &K) -> EntryStatus {
        let state = self.inner.lock();
        state
            .meta
            .get(key)
            .or_else(|| S::covering_key(key).and_then(|c| state.meta.get(&c)))
            .map(EntryStatus::from)
            .unwrap_or_default()
    }

    /// Read the store
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.lock().store)
    }

    /// Replace data of `key` locally; the entry becomes fresh
    pub fn update<R>(&self, key: &K, f: impl FnOnce(&mut S) -> R) -> R {
        let result = {
            let mut state = self.inner.lock();
            let result = f(&mut state.store);
            let meta = state.meta.entry(key.clone()).or_default();
            meta.loaded = true;
            meta.outdated = false;
            meta.last_error = None;
            result
        };
        self.inner.emit(ResourceEvent::Updated(key.clone()));
        result
    }

    /// Remove data of `key` locally; the next load fetches it again
    pub fn remove<R>(&self, key: &K, f: impl FnOnce(&mut S) -> R) -> R {
        let result = {
            let mut state = self.inner.lock();
            let result = f(&mut state.store);
            let loading = state.meta.get(key).is_some_and(|meta| meta.loading);
            state.meta.insert(
                key.clone(),
                EntryMeta {
                    loading,
                    ..EntryMeta::default()
                },
            );
            result
        };
        self.inner.emit(ResourceEvent::Deleted(key.clone()));
        result
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent<K>> {
        self.inner.events.subscribe()
    }

    fn plan(&self, key: &K, force: bool) -> Plan {
        let mut state = self.inner.lock();

        if !force && state.is_fresh(key) {
            return Plan::Hit;
        }
        if let Some(in_flight) = state.in_flight.get(key) {
            debug!(resource = %self.inner.name, key = ?key, "Joining in-flight fetch");
            return Plan::Wait(in_flight.load.clone());
        }

        let id = self.inner.next_fetch.fetch_add(1, Ordering::Relaxed);
        state.meta.entry(key.clone()).or_default().loading = true;

        let inner = Arc::clone(&self.inner);
        let fetch_key = key.clone();
        let task = tokio::spawn(async move { inner.fetch(fetch_key, id).await });
        let load = task
            .map(|joined| {
                joined.unwrap_or_else(|err| {
                    Err(Arc::new(Error::internal(format!(
                        "Resource fetch task failed: {err}"
                    ))))
                })
            })
            .boxed()
            .shared();

        state.in_flight.insert(
            key.clone(),
            InFlight {
                id,
                load: load.clone(),
            },
        );
        Plan::Wait(load)
    }
}

impl<K, S> Clone for ResourceCache<K, S>
where
    S: ResourceStore<K>,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, S> CacheState<K, S>
where
    K: CacheKey,
    S: ResourceStore<K>,
{
    /// Own metadata wins over the covering entry
    fn is_fresh(&self, key: &K) -> bool {
        match self.meta.get(key) {
            Some(meta) => meta.is_fresh(),
            None => S::covering_key(key)
                .and_then(|covering| self.meta.get(&covering))
                .is_some_and(EntryMeta::is_fresh),
        }
    }
}

impl<K, S> CacheInner<K, S>
where
    K: CacheKey,
    S: ResourceStore<K>,
{
    async fn fetch(&self, key: K, id: u64) -> std::result::Result<(), Arc<Error>> {
        debug!(resource = %self.name, key = ?key, "Fetching");
        let outcome = AssertUnwindSafe(self.loader.load(&key))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(Error::internal(format!(
                    "Loader panicked: {}",
                    panic_message(panic.as_ref())
                )))
            });

        let result = {
            let mut state = self.lock();
            if state.in_flight.get(&key).is_some_and(|f| f.id == id) {
                state.in_flight.remove(&key);
            }

            match outcome {
                Ok(output) => {
                    let coverage = state.store.commit(&key, output);
                    if coverage == Coverage::All {
                        let CacheState { meta, in_flight, .. } = &mut *state;
                        meta.retain(|entry, meta| {
                            meta.loading = in_flight.contains_key(entry);
                            meta.loading || meta.marked_before > id
                        });
                        for meta in meta.values_mut().filter(|meta| !meta.loading) {
                            meta.loaded = true;
                            meta.last_error = None;
                        }
                    }
                    let meta = state.meta.entry(key.clone()).or_default();
                    // a mark made while this fetch ran still stands
                    let outdated = meta.marked_before > id;
                    *meta = EntryMeta {
                        loaded: true,
                        outdated,
                        marked_before: meta.marked_before,
                        ..EntryMeta::default()
                    };
                    Ok(())
                }
                Err(err) => {
                    let err = Arc::new(err);
                    let meta = state.meta.entry(key.clone()).or_default();
                    meta.loading = false;
                    meta.last_error = Some(Arc::clone(&err));
                    Err(err)
                }
            }
        };

        match &result {
            Ok(()) => {
                debug!(resource = %self.name, key = ?key, "Loaded");
                self.emit(ResourceEvent::Loaded(key));
            }
            Err(err) => {
                warn!(resource = %self.name, key = ?key, error = %err, "Load failed");
                self.emit(ResourceEvent::Failed {
                    key,
                    error: Arc::clone(err),
                });
            }
        }
        result
    }

    fn emit(&self, event: ResourceEvent<K>) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<K, S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
