//! Cached Resources
//!
//! Remote state fetched through a loader and cached per key, with at most
//! one fetch in flight per key.
//!
//! | Shape | Key | Loader output |
//! |-------|-----|---------------|
//! | [`SingletonResource`] | none | one value |
//! | [`CachedDataResource`] | `K` | one value per key |
//! | [`CachedMapResource`] | [`MapKey`] | entries merged into a shared map |
//!
//! ```text
//! load(key)
//!   ├── present, fresh, not forced ──────────► cached data
//!   ├── fetch in flight for key ─────────────► await the same fetch
//!   └── otherwise: loading = true, spawn loader
//!          ├── Ok  → commit data, outdated = false
//!          └── Err → keep data, record error (retry on next load)
//! ```
//!
//! A dispatched fetch runs as its own task: it completes and commits even
//! when every caller stopped waiting for it.

pub mod cache;
pub mod data;
pub mod events;
pub mod map;
pub mod singleton;

pub use cache::{CacheKey, Coverage, EntryStatus, ResourceCache, ResourceStore};
pub use data::CachedDataResource;
pub use events::ResourceEvent;
pub use map::{CachedMapResource, KeyState, MapKey};
pub use singleton::SingletonResource;

use async_trait::async_trait;
use beaver_domain::error::Result;
use std::future::Future;
use std::marker::PhantomData;

/// Fetches the data of one resource key
#[async_trait]
pub trait ResourceLoader<K, O>: Send + Sync {
    async fn load(&self, key: &K) -> Result<O>;
}

/// Adapter turning an async closure into a [`ResourceLoader`]
pub struct LoaderFn<F, Fut> {
    f: F,
    _future: PhantomData<fn() -> Fut>,
}

/// Loader calling `f` with an owned copy of the key
pub fn loader_fn<K, O, F, Fut>(f: F) -> LoaderFn<F, Fut>
where
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O>> + Send,
{
    LoaderFn {
        f,
        _future: PhantomData,
    }
}

#[async_trait]
impl<K, O, F, Fut> ResourceLoader<K, O> for LoaderFn<F, Fut>
where
    K: Clone + Send + Sync + 'static,
    O: Send + 'static,
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O>> + Send,
{
    async fn load(&self, key: &K) -> Result<O> {
        (self.f)(key.clone()).await
    }
}
