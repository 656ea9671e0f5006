//! Singleton service container
//!
//! Every token maps to one provider and, once resolved, to one instance
//! owned by the container. Resolution is synchronous and recursive; a token
//! re-entered before its construction completed is reported as a
//! [`Error::CyclicDependency`] carrying the token chain.
//!
//! Factories receive already resolved [`Dependencies`] and must not call
//! back into the container.

use beaver_domain::di::{Dependencies, Injectable, Service, Token};
use beaver_domain::error::{Error, Result};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// A constructed service, kept both as `Any` for typed access and as
/// `Service` for capability discovery
#[derive(Clone)]
struct Instance {
    any: Arc<dyn Any + Send + Sync>,
    service: Arc<dyn Service>,
}

impl Instance {
    fn new<T: Service>(value: Arc<T>) -> Self {
        Self {
            any: value.clone(),
            service: value,
        }
    }
}

type Factory = Arc<dyn Fn(&Dependencies) -> Result<Instance> + Send + Sync>;

/// Declares how the container builds a service
#[derive(Clone)]
pub struct ProviderDescriptor {
    token: Token,
    dependencies: Vec<Token>,
    factory: Factory,
}

impl ProviderDescriptor {
    /// Provider of an [`Injectable`] type
    pub fn of<T: Injectable>() -> Self {
        Self {
            token: Token::of::<T>(),
            dependencies: T::dependencies(),
            factory: Arc::new(|deps: &Dependencies| {
                T::inject(deps).map(|service| Instance::new(Arc::new(service)))
            }),
        }
    }

    /// Provider handing out a pre-built instance
    pub fn value<T: Service>(value: Arc<T>) -> Self {
        Self {
            token: Token::of::<T>(),
            dependencies: Vec::new(),
            factory: Arc::new(move |_: &Dependencies| Ok(Instance::new(Arc::clone(&value)))),
        }
    }

    /// Provider built by a closure from explicitly listed dependencies
    pub fn factory<T, F>(dependencies: Vec<Token>, factory: F) -> Self
    where
        T: Service,
        F: Fn(&Dependencies) -> Result<T> + Send + Sync + 'static,
    {
        Self {
            token: Token::of::<T>(),
            dependencies,
            factory: Arc::new(move |deps: &Dependencies| {
                factory(deps).map(|service| Instance::new(Arc::new(service)))
            }),
        }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn dependencies(&self) -> &[Token] {
        &self.dependencies
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("token", &self.token)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
struct ContainerState {
    providers: HashMap<Token, ProviderDescriptor>,
    instances: HashMap<Token, Instance>,
    /// Creation order of `instances`
    order: Vec<Token>,
    /// Tokens whose construction is in progress
    resolving: Vec<Token>,
}

/// Service container holding singleton instances
#[derive(Default)]
pub struct Container {
    state: Mutex<ContainerState>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a constructible service
    pub fn register(&self, provider: ProviderDescriptor) -> Result<()> {
        let mut state = self.lock();
        let token = provider.token;
        if state.providers.contains_key(&token) {
            return Err(Error::DuplicateToken {
                token: token.to_string(),
            });
        }

        debug!(token = %token, dependencies = provider.dependencies.len(), "Provider registered");
        state.providers.insert(token, provider);
        Ok(())
    }

    /// Declare an [`Injectable`] type
    pub fn register_type<T: Injectable>(&self) -> Result<()> {
        self.register(ProviderDescriptor::of::<T>())
    }

    /// Bind a pre-built instance
    pub fn register_value<T: Service>(&self, value: T) -> Result<Arc<T>> {
        let value = Arc::new(value);
        self.register_instance(Arc::clone(&value))?;
        Ok(value)
    }

    /// Bind a shared pre-built instance
    pub fn register_instance<T: Service>(&self, value: Arc<T>) -> Result<()> {
        let token = Token::of::<T>();
        self.register(ProviderDescriptor::value(Arc::clone(&value)))?;

        let mut state = self.lock();
        state.instances.insert(token, Instance::new(value));
        state.order.push(token);
        Ok(())
    }

    /// Singleton of type `T`, constructed on first request
    pub fn resolve<T: Service>(&self) -> Result<Arc<T>> {
        let token = Token::of::<T>();
        let instance = self.resolve_instance(token)?;
        instance
            .any
            .downcast::<T>()
            .map_err(|_| Error::internal(format!("Instance registered as {token} has another type")))
    }

    /// Singleton registered under `token`
    pub fn resolve_token(&self, token: Token) -> Result<Arc<dyn Service>> {
        self.resolve_instance(token).map(|instance| instance.service)
    }

    /// True when a provider was declared for `token`
    pub fn contains(&self, token: Token) -> bool {
        self.lock().providers.contains_key(&token)
    }

    /// True when a provider was declared for `T`
    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.contains(Token::of::<T>())
    }

    /// Constructed instances in creation order
    pub fn instances(&self) -> Vec<(Token, Arc<dyn Service>)> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|token| {
                state
                    .instances
                    .get(token)
                    .map(|instance| (*token, Arc::clone(&instance.service)))
            })
            .collect()
    }

    /// Number of declared providers
    pub fn provider_count(&self) -> usize {
        self.lock().providers.len()
    }

    fn resolve_instance(&self, token: Token) -> Result<Instance> {
        let mut state = self.lock();
        Self::resolve_in(&mut state, token)
    }

    fn resolve_in(state: &mut ContainerState, token: Token) -> Result<Instance> {
        if let Some(instance) = state.instances.get(&token) {
            return Ok(instance.clone());
        }

        if let Some(first) = state.resolving.iter().position(|t| *t == token) {
            let chain = state.resolving[first..]
                .iter()
                .chain(std::iter::once(&token))
                .map(ToString::to_string)
                .collect();
            return Err(Error::CyclicDependency { chain });
        }

        let Some(provider) = state.providers.get(&token) else {
            return Err(Error::UnregisteredToken {
                token: token.to_string(),
            });
        };
        let dependencies = provider.dependencies.clone();
        let factory = Arc::clone(&provider.factory);

        state.resolving.push(token);
        let constructed = Self::construct(state, token, &dependencies, &factory);
        state.resolving.pop();
        let instance = constructed?;

        debug!(token = %token, "Service constructed");
        state.instances.insert(token, instance.clone());
        state.order.push(token);
        Ok(instance)
    }

    fn construct(
        state: &mut ContainerState,
        token: Token,
        dependencies: &[Token],
        factory: &Factory,
    ) -> Result<Instance> {
        let mut resolved = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let instance = Self::resolve_in(state, *dependency)?;
            resolved.push((*dependency, instance.any));
        }

        factory(&Dependencies::new(token, resolved))
    }

    fn lock(&self) -> MutexGuard<'_, ContainerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Container")
            .field("providers", &state.providers.len())
            .field("instances", &state.order)
            .finish()
    }
}
