//! Dependency Injection Primitives
//!
//! Types shared by the container (infrastructure) and the services that are
//! constructed by it (application and infrastructure).
//!
//! Dependencies are declared explicitly: a provider lists the ordered tokens
//! it needs, the container resolves them first and hands them to the factory
//! as [`Dependencies`].
//!
//! ```text
//! Injectable::dependencies()  →  [Token, Token]
//!                                      │ resolved by the container
//!                                      ▼
//! Injectable::inject(&Dependencies)  →  Service instance
//! ```

use crate::error::{Error, Result};
use crate::ports::lifecycle::{Loadable, Registrable};
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identifies a service type inside a container
#[derive(Clone, Copy)]
pub struct Token {
    id: TypeId,
    name: &'static str,
}

impl Token {
    /// Token of the service type `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Fully qualified type name, for diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without the module path
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({})", self.short_name())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A singleton unit of logic owned by the container
///
/// Lifecycle hooks are optional capabilities: a service that participates in
/// the bootstrap `register` or `load` phase returns itself from the matching
/// accessor.
///
/// ```ignore
/// impl Service for ServerConfigResource {
///     fn as_loadable(self: Arc<Self>) -> Option<Arc<dyn Loadable>> {
///         Some(self)
///     }
/// }
/// ```
pub trait Service: Any + Send + Sync {
    /// `register()` capability
    fn as_registrable(self: Arc<Self>) -> Option<Arc<dyn Registrable>> {
        None
    }

    /// `load()` capability
    fn as_loadable(self: Arc<Self>) -> Option<Arc<dyn Loadable>> {
        None
    }
}

/// A service the container can construct from declared dependencies
pub trait Injectable: Service + Sized {
    /// Ordered dependency tokens, resolved before [`Injectable::inject`]
    fn dependencies() -> Vec<Token>;

    /// Build the service from its resolved dependencies
    fn inject(deps: &Dependencies) -> Result<Self>;
}

/// Dependencies resolved for a single construction
pub struct Dependencies {
    service: Token,
    resolved: Vec<(Token, Arc<dyn Any + Send + Sync>)>,
}

impl Dependencies {
    /// Wrap the instances resolved for `service`
    pub fn new(service: Token, resolved: Vec<(Token, Arc<dyn Any + Send + Sync>)>) -> Self {
        Self { service, resolved }
    }

    /// Dependency of type `T`
    ///
    /// Fails with [`Error::UndeclaredDependency`] when `T` is not among the
    /// declared tokens.
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let token = Token::of::<T>();
        let instance = self
            .resolved
            .iter()
            .find(|(declared, _)| *declared == token)
            .map(|(_, instance)| Arc::clone(instance))
            .ok_or_else(|| Error::UndeclaredDependency {
                service: self.service.to_string(),
                dependency: token.to_string(),
            })?;

        instance
            .downcast::<T>()
            .map_err(|_| Error::internal(format!("Instance registered as {token} has another type")))
    }

    /// Number of resolved dependencies
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// True when the service declared no dependencies
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("service", &self.service)
            .field(
                "resolved",
                &self.resolved.iter().map(|(t, _)| *t).collect::<Vec<_>>(),
            )
            .finish()
    }
}
