//! Core plugin and application wiring
//!
//! ```text
//! core manifest
//! ├── AppConfig            (value)
//! ├── TransportBinding     (value: HTTP GraphQL transport)
//! ├── StorageBinding       (value: configured state storage)
//! ├── GraphQlService
//! ├── LocalStorageSaveService
//! ├── ServerConfigResource (load phase)
//! ├── DbDriverResource
//! ├── NavigationTabsService (load phase: restores tabs)
//! └── TabNavigator
//! ```

use crate::config::AppConfig;
use crate::constants::CORE_MANIFEST_NAME;
use crate::di::{BootstrapReport, BootstrapState, Container, PluginBootstrap, PluginManifest};
use crate::persistence::create_storage;
use crate::resources::{DbDriverResource, ServerConfigResource};
use crate::sdk::{GraphQlService, HttpGraphQlTransport, TransportBinding};
use beaver_application::services::{
    LocalStorageSaveService, NavigationTabsService, StorageBinding, TabNavigator,
};
use beaver_domain::di::Service;
use beaver_domain::error::Result;
use beaver_domain::ports::{GraphQlTransport, StateStorage};
use std::sync::Arc;
use tracing::info;

/// Core manifest using the transport and storage selected by `config`
pub fn core_manifest(config: &AppConfig) -> Result<PluginManifest> {
    let transport: Arc<dyn GraphQlTransport> = Arc::new(HttpGraphQlTransport::new(&config.api)?);
    let storage = create_storage(&config.storage)?;
    Ok(core_manifest_with(config, transport, storage))
}

/// Core manifest over explicit transport and storage
pub fn core_manifest_with(
    config: &AppConfig,
    transport: Arc<dyn GraphQlTransport>,
    storage: Arc<dyn StateStorage>,
) -> PluginManifest {
    PluginManifest::new(CORE_MANIFEST_NAME)
        .value(Arc::new(config.clone()))
        .value(Arc::new(TransportBinding(transport)))
        .value(Arc::new(StorageBinding(storage)))
        .provider::<GraphQlService>()
        .provider::<LocalStorageSaveService>()
        .provider::<ServerConfigResource>()
        .provider::<DbDriverResource>()
        .provider::<NavigationTabsService>()
        .provider::<TabNavigator>()
}

/// A bootstrapped application
pub struct AppContext {
    bootstrap: PluginBootstrap,
    report: BootstrapReport,
}

impl AppContext {
    pub fn container(&self) -> &Arc<Container> {
        self.bootstrap.container()
    }

    /// Configuration registered by the core manifest
    pub fn config(&self) -> Result<Arc<AppConfig>> {
        self.resolve::<AppConfig>()
    }

    /// Service of type `T` from the container
    pub fn resolve<T: Service>(&self) -> Result<Arc<T>> {
        self.container().resolve::<T>()
    }

    pub fn state(&self) -> BootstrapState {
        self.bootstrap.state()
    }

    pub fn report(&self) -> &BootstrapReport {
        &self.report
    }
}

/// Bootstrap the core manifest followed by `plugins`
pub async fn init_app(config: AppConfig, plugins: Vec<PluginManifest>) -> Result<AppContext> {
    info!(endpoint = %config.api.endpoint, plugins = plugins.len(), "Initializing application");
    let core = core_manifest(&config)?;
    init_app_with(core, plugins).await
}

/// Bootstrap an explicit core manifest followed by `plugins`
pub async fn init_app_with(
    core: PluginManifest,
    plugins: Vec<PluginManifest>,
) -> Result<AppContext> {
    let bootstrap = PluginBootstrap::new();
    bootstrap.add_manifest(core)?;
    bootstrap.add_manifests(plugins)?;
    let report = bootstrap.bootstrap().await?;

    Ok(AppContext {
        bootstrap,
        report,
    })
}
