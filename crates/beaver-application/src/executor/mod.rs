//! Action Pipeline
//!
//! A minimal named-handler dispatcher for cross-cutting actions such as
//! tab navigation.
//!
//! ```text
//! execute(action)
//!   ├── comparator: same action already running? → skipped
//!   ├── handler 1  (awaited)
//!   ├── handler 2  (awaited, runs only after handler 1 finished)
//!   ├── ...        (ExecutionContext::prevent_default stops here)
//!   └── post handlers (always run)
//! ```
//!
//! A failing handler is logged and the pipeline continues with the next
//! one. Handlers registered with [`Executor::add_blocking_handler`] stop the
//! execution and return their error instead.

mod context;

pub use context::ExecutionContext;

use async_trait::async_trait;
use beaver_domain::error::{Error, Result};
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, error};

/// A step of the pipeline
#[async_trait]
pub trait ExecutorHandler<T>: Send + Sync {
    async fn handle(&self, data: &T, context: &ExecutionContext) -> Result<()>;
}

/// Adapter turning an async closure into an [`ExecutorHandler`]
///
/// The closure receives owned clones of the action and the context.
pub struct FnHandler<F, Fut> {
    f: F,
    _future: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnHandler<F, Fut> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _future: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F, Fut> ExecutorHandler<T> for FnHandler<F, Fut>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(T, ExecutionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send,
{
    async fn handle(&self, data: &T, context: &ExecutionContext) -> Result<()> {
        (self.f)(data.clone(), context.clone()).await
    }
}

type ActiveComparator<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

struct HandlerEntry<T> {
    name: String,
    handler: Arc<dyn ExecutorHandler<T>>,
    blocking: bool,
}

impl<T> Clone for HandlerEntry<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            handler: Arc::clone(&self.handler),
            blocking: self.blocking,
        }
    }
}

/// Outcome of one `execute()` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// An equal action was already running
    pub skipped: bool,
    /// A handler called `prevent_default`
    pub prevented: bool,
    /// Handlers (regular and post) that completed successfully
    pub handled: usize,
    /// Names of the handlers that failed and were skipped over
    pub failed: Vec<String>,
}

/// Sequential action dispatcher
pub struct Executor<T> {
    handlers: RwLock<Vec<HandlerEntry<T>>>,
    post_handlers: RwLock<Vec<HandlerEntry<T>>>,
    is_active: Option<ActiveComparator<T>>,
    active: Mutex<Vec<(u64, T)>>,
    next_execution: AtomicU64,
}

impl<T> Default for Executor<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Executor<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            post_handlers: RwLock::new(Vec::new()),
            is_active: None,
            active: Mutex::new(Vec::new()),
            next_execution: AtomicU64::new(0),
        }
    }

    /// Skip `execute(candidate)` while an `active` action comparing equal runs
    pub fn with_active_comparator<C>(mut self, comparator: C) -> Self
    where
        C: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.is_active = Some(Arc::new(comparator));
        self
    }

    /// Append an async closure handler
    pub fn add_handler<F, Fut>(&self, f: F) -> &Self
    where
        F: Fn(T, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let name = format!("handler#{}", self.read_handlers().len());
        self.push(&self.handlers, name, Arc::new(FnHandler::new(f)), false)
    }

    /// Append a named handler implementation
    pub fn add_named_handler(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn ExecutorHandler<T>>,
    ) -> &Self {
        self.push(&self.handlers, name.into(), handler, false)
    }

    /// Append a handler whose failure aborts the execution
    pub fn add_blocking_handler(
        &self,
        name: impl Into<String>,
        handler: Arc<dyn ExecutorHandler<T>>,
    ) -> &Self {
        self.push(&self.handlers, name.into(), handler, true)
    }

    /// Append a handler run after every regular handler
    pub fn add_post_handler<F, Fut>(&self, f: F) -> &Self
    where
        F: Fn(T, ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let name = format!(
            "post-handler#{}",
            self.post_handlers
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        );
        self.push(&self.post_handlers, name, Arc::new(FnHandler::new(f)), false)
    }

    /// Number of regular handlers
    pub fn handler_count(&self) -> usize {
        self.read_handlers().len()
    }

    /// True while at least one execution is in progress
    pub fn is_executing(&self) -> bool {
        !self.lock_active().is_empty()
    }

    /// Run every handler in registration order, one at a time
    pub async fn execute(&self, data: T) -> Result<ExecutionReport> {
        let Some(_guard) = self.activate(&data) else {
            debug!("Skipping execution, an equal action is already active");
            return Ok(ExecutionReport {
                skipped: true,
                ..ExecutionReport::default()
            });
        };

        let handlers = self.read_handlers().clone();
        let post_handlers = self
            .post_handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let context = ExecutionContext::new();
        let mut report = ExecutionReport::default();

        for entry in &handlers {
            if context.is_prevented() {
                report.prevented = true;
                debug!(handler = %entry.name, "Execution prevented, skipping remaining handlers");
                break;
            }
            Self::run(entry, &data, &context, &mut report).await?;
        }
        report.prevented = context.is_prevented();

        for entry in &post_handlers {
            Self::run(entry, &data, &context, &mut report).await?;
        }

        Ok(report)
    }

    async fn run(
        entry: &HandlerEntry<T>,
        data: &T,
        context: &ExecutionContext,
        report: &mut ExecutionReport,
    ) -> Result<()> {
        match entry.handler.handle(data, context).await {
            Ok(()) => {
                report.handled += 1;
                Ok(())
            }
            Err(err) if entry.blocking => Err(Error::Handler {
                handler: entry.name.clone(),
                source: Box::new(err),
            }),
            Err(err) => {
                error!(handler = %entry.name, error = %err, "Executor handler failed");
                report.failed.push(entry.name.clone());
                Ok(())
            }
        }
    }

    fn push(
        &self,
        list: &RwLock<Vec<HandlerEntry<T>>>,
        name: String,
        handler: Arc<dyn ExecutorHandler<T>>,
        blocking: bool,
    ) -> &Self {
        list.write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(HandlerEntry {
                name,
                handler,
                blocking,
            });
        self
    }

    fn activate(&self, data: &T) -> Option<ActiveGuard<'_, T>> {
        let mut active = self.lock_active();
        if let Some(is_active) = &self.is_active {
            if active.iter().any(|(_, running)| is_active(running, data)) {
                return None;
            }
        }

        let id = self.next_execution.fetch_add(1, Ordering::Relaxed);
        active.push((id, data.clone()));
        Some(ActiveGuard { executor: self, id })
    }

    fn read_handlers(&self) -> std::sync::RwLockReadGuard<'_, Vec<HandlerEntry<T>>> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Vec<(u64, T)>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes the execution from the active list, also when the future is dropped
struct ActiveGuard<'a, T> {
    executor: &'a Executor<T>,
    id: u64,
}

impl<T> Drop for ActiveGuard<'_, T> {
    fn drop(&mut self) {
        self.executor
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(id, _)| *id != self.id);
    }
}
