//! Per-execution context store

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Default)]
struct ContextInner {
    contexts: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    prevented: AtomicBool,
}

/// State shared by the handlers of one `execute()` call
///
/// Cloning is cheap; every clone refers to the same execution.
#[derive(Clone, Default)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context of type `C`, created by `factory` on first request
    ///
    /// Later handlers of the same execution receive the same instance.
    pub fn get_context<C, F>(&self, factory: F) -> Arc<C>
    where
        C: Any + Send + Sync,
        F: FnOnce() -> C,
    {
        let mut contexts = self
            .inner
            .contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = contexts
            .get(&TypeId::of::<C>())
            .and_then(|c| Arc::clone(c).downcast::<C>().ok())
        {
            return existing;
        }

        let context = Arc::new(factory());
        contexts.insert(TypeId::of::<C>(), context.clone());
        context
    }

    /// Context of type `C` if a handler already created it
    pub fn find_context<C: Any + Send + Sync>(&self) -> Option<Arc<C>> {
        let contexts = self
            .inner
            .contexts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        contexts
            .get(&TypeId::of::<C>())
            .and_then(|c| Arc::clone(c).downcast::<C>().ok())
    }

    /// Skip the remaining regular handlers; post handlers still run
    pub fn prevent_default(&self) {
        self.inner.prevented.store(true, Ordering::SeqCst);
    }

    pub fn is_prevented(&self) -> bool {
        self.inner.prevented.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("prevented", &self.is_prevented())
            .finish_non_exhaustive()
    }
}
