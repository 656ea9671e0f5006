//! Bootstrap sequencer
//!
//! ```text
//! Uninitialized ──bootstrap()──► Registering ──► Loading ──► Ready
//!                                     │
//!                                     └── resolve/register error ──► Failed
//! ```
//!
//! Registering covers provider registration, instance resolution and the
//! `register()` hooks; any error there is fatal. `load()` hooks run one at a
//! time in manifest order and their failures are collected in the
//! [`BootstrapReport`].

use crate::di::container::Container;
use crate::di::manifest::{ManifestRegistry, PluginManifest};
use beaver_domain::di::{Service, Token};
use beaver_domain::error::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info};

/// Lifecycle state of a [`PluginBootstrap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    Registering,
    Loading,
    Ready,
    /// A fatal error stopped the boot
    Failed,
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Registering => "registering",
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A `load()` hook that failed
#[derive(Debug)]
pub struct LoadFailure {
    /// Short name of the service
    pub service: String,
    pub error: Error,
}

/// Summary of a completed bootstrap
#[derive(Debug, Default)]
pub struct BootstrapReport {
    /// Manifest names in load order
    pub manifests: Vec<String>,
    /// Number of provider instances resolved
    pub services: usize,
    /// Services whose `register()` ran
    pub registered: usize,
    /// Services whose `load()` succeeded
    pub loaded: usize,
    pub load_failures: Vec<LoadFailure>,
}

impl BootstrapReport {
    pub fn is_clean(&self) -> bool {
        self.load_failures.is_empty()
    }
}

/// Orders plugin manifests and runs their services through the lifecycle
pub struct PluginBootstrap {
    container: Arc<Container>,
    registry: Mutex<ManifestRegistry>,
    state: Mutex<BootstrapState>,
}

impl Default for PluginBootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginBootstrap {
    pub fn new() -> Self {
        Self::with_container(Arc::new(Container::new()))
    }

    /// Bootstrap into an existing container
    pub fn with_container(container: Arc<Container>) -> Self {
        Self {
            container,
            registry: Mutex::new(ManifestRegistry::new()),
            state: Mutex::new(BootstrapState::Uninitialized),
        }
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn state(&self) -> BootstrapState {
        *self.lock_state()
    }

    pub fn add_manifest(&self, manifest: PluginManifest) -> Result<()> {
        self.ensure_uninitialized()?;
        debug!(manifest = manifest.name(), "Adding plugin manifest");
        self.lock_registry().add(manifest)
    }

    /// Add manifests that may depend on each other
    pub fn add_manifests(&self, manifests: Vec<PluginManifest>) -> Result<()> {
        self.ensure_uninitialized()?;
        self.lock_registry().add_batch(manifests)
    }

    /// Run the lifecycle once; later calls fail with `AlreadyBootstrapped`
    pub async fn bootstrap(&self) -> Result<BootstrapReport> {
        {
            let mut state = self.lock_state();
            if *state != BootstrapState::Uninitialized {
                return Err(Error::AlreadyBootstrapped);
            }
            *state = BootstrapState::Registering;
        }

        let started = Instant::now();
        match self.run().await {
            Ok(report) => {
                self.set_state(BootstrapState::Ready);
                info!(
                    manifests = report.manifests.len(),
                    services = report.services,
                    load_failures = report.load_failures.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Bootstrap completed"
                );
                Ok(report)
            }
            Err(err) => {
                self.set_state(BootstrapState::Failed);
                error!(error = %err, "Bootstrap failed");
                Err(err)
            }
        }
    }

    async fn run(&self) -> Result<BootstrapReport> {
        let mut report = BootstrapReport::default();

        let tokens = self.register_providers(&mut report)?;
        let services = self.resolve_services(&tokens)?;
        report.services = services.len();

        info!(services = services.len(), "Running register phase");
        for (token, service) in &services {
            if let Some(registrable) = Arc::clone(service).as_registrable() {
                debug!(service = %token, "register()");
                registrable.register().await.map_err(|err| {
                    Error::bootstrap(format!("Service {token} failed to register"), err)
                })?;
                report.registered += 1;
            }
        }

        self.set_state(BootstrapState::Loading);
        info!("Running load phase");
        for (token, service) in &services {
            let Some(loadable) = Arc::clone(service).as_loadable() else {
                continue;
            };
            debug!(service = %token, "load()");
            match loadable.load().await {
                Ok(()) => report.loaded += 1,
                Err(err) => {
                    error!(service = %token, error = %err, "Service failed to load");
                    report.load_failures.push(LoadFailure {
                        service: token.to_string(),
                        error: err,
                    });
                }
            }
        }

        Ok(report)
    }

    /// Declare every provider in manifest load order
    fn register_providers(&self, report: &mut BootstrapReport) -> Result<Vec<Token>> {
        let registry = self.lock_registry();
        let order = registry.load_order()?;

        let mut tokens = Vec::new();
        for manifest in order {
            debug!(
                manifest = manifest.name(),
                providers = manifest.providers().len(),
                "Registering manifest providers"
            );
            for provider in manifest.providers() {
                self.container.register(provider.clone())?;
                tokens.push(provider.token());
            }
            report.manifests.push(manifest.name().to_string());
        }
        Ok(tokens)
    }

    fn resolve_services(&self, tokens: &[Token]) -> Result<Vec<(Token, Arc<dyn Service>)>> {
        let mut seen = HashSet::with_capacity(tokens.len());
        let mut services = Vec::with_capacity(tokens.len());
        for token in tokens {
            if seen.insert(*token) {
                services.push((*token, self.container.resolve_token(*token)?));
            }
        }
        Ok(services)
    }

    fn ensure_uninitialized(&self) -> Result<()> {
        if self.state() == BootstrapState::Uninitialized {
            Ok(())
        } else {
            Err(Error::AlreadyBootstrapped)
        }
    }

    fn set_state(&self, state: BootstrapState) {
        debug!(state = %state, "Bootstrap state changed");
        *self.lock_state() = state;
    }

    fn lock_state(&self) -> MutexGuard<'_, BootstrapState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_registry(&self) -> MutexGuard<'_, ManifestRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for PluginBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginBootstrap")
            .field("state", &self.state())
            .field("manifests", &self.lock_registry().len())
            .finish_non_exhaustive()
    }
}
