//! Auto-saved state
//!
//! `with_auto_save(container, key, sanitizer)`: the stored JSON is passed
//! through the sanitizer on load, and the state is written back after every
//! mutation made through [`AutoSave::update`].

use beaver_domain::di::{Dependencies, Injectable, Service, Token};
use beaver_domain::error::Result;
use beaver_domain::ports::StateStorage;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// State mirrored into a [`StateStorage`] namespace
pub struct AutoSave<T> {
    key: String,
    storage: Arc<dyn StateStorage>,
    state: Mutex<T>,
}

impl<T> AutoSave<T>
where
    T: Serialize + Default + Send,
{
    /// Restore the state stored under `key`
    ///
    /// Missing or unreadable JSON yields `T::default()`; readable JSON is
    /// validated and repaired by `sanitizer`.
    pub fn new<S>(storage: Arc<dyn StateStorage>, key: impl Into<String>, sanitizer: S) -> Self
    where
        S: FnOnce(Value) -> T,
    {
        let key = key.into();
        let state = match storage.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(json) => sanitizer(json),
                Err(err) => {
                    warn!(key = %key, error = %err, "Discarding unreadable saved state");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(err) => {
                warn!(key = %key, error = %err, "Failed to read saved state");
                T::default()
            }
        };

        Self {
            key,
            storage,
            state: Mutex::new(state),
        }
    }

    /// Storage namespace
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the current state
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.lock())
    }

    /// Mutate the state and persist it
    ///
    /// A failed write is logged; the in-memory state keeps the mutation.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut state = self.lock();
        let result = f(&mut state);
        if let Err(err) = self.persist(&state) {
            warn!(key = %self.key, error = %err, "Failed to save state");
        }
        result
    }

    /// Write the current state to storage
    pub fn save(&self) -> Result<()> {
        let state = self.lock();
        self.persist(&state)
    }

    fn persist(&self, state: &T) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.storage.set(&self.key, &json)?;
        debug!(key = %self.key, bytes = json.len(), "State saved");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Serialize + Default + Send> AutoSave<T> {
    /// Copy of the current state
    pub fn snapshot(&self) -> T {
        self.read(Clone::clone)
    }
}

impl<T> fmt::Debug for AutoSave<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoSave").field("key", &self.key).finish()
    }
}

/// Injectable entry point to the state storage
pub struct LocalStorageSaveService {
    storage: Arc<dyn StateStorage>,
}

impl LocalStorageSaveService {
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        Self { storage }
    }

    /// Bind `T` to the storage namespace `key`
    pub fn with_auto_save<T, S>(&self, key: impl Into<String>, sanitizer: S) -> AutoSave<T>
    where
        T: Serialize + Default + Send,
        S: FnOnce(Value) -> T,
    {
        AutoSave::new(Arc::clone(&self.storage), key, sanitizer)
    }

    /// Underlying storage
    pub fn storage(&self) -> Arc<dyn StateStorage> {
        Arc::clone(&self.storage)
    }
}

impl Service for LocalStorageSaveService {}

impl fmt::Debug for LocalStorageSaveService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStorageSaveService").finish_non_exhaustive()
    }
}

/// Storage port registered as a service of its own
///
/// Lets tests and alternative manifests swap the backend with a single
/// `register_value`.
pub struct StorageBinding(pub Arc<dyn StateStorage>);

impl Service for StorageBinding {}

impl Injectable for LocalStorageSaveService {
    fn dependencies() -> Vec<Token> {
        vec![Token::of::<StorageBinding>()]
    }

    fn inject(deps: &Dependencies) -> Result<Self> {
        let binding = deps.get::<StorageBinding>()?;
        Ok(Self::new(Arc::clone(&binding.0)))
    }
}
