//! Server configuration resource
//!
//! Loaded once during the bootstrap load phase; other services read the
//! cached value.

use crate::resource::{ResourceEvent, ResourceLoader, SingletonResource};
use crate::sdk::GraphQlService;
use crate::sdk::operations::{SERVER_CONFIG_QUERY, ServerConfigData};
use async_trait::async_trait;
use beaver_domain::di::{Dependencies, Injectable, Service, Token};
use beaver_domain::error::Result;
use beaver_domain::ports::Loadable;
use beaver_domain::value_objects::ServerConfig;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

struct ServerConfigLoader {
    graphql: Arc<GraphQlService>,
}

#[async_trait]
impl ResourceLoader<(), ServerConfig> for ServerConfigLoader {
    async fn load(&self, _key: &()) -> Result<ServerConfig> {
        let data: ServerConfigData = self.graphql.query(SERVER_CONFIG_QUERY, json!({})).await?;
        Ok(data.server_config)
    }
}

pub struct ServerConfigResource {
    resource: SingletonResource<ServerConfig>,
}

impl ServerConfigResource {
    pub fn new(graphql: Arc<GraphQlService>) -> Self {
        Self {
            resource: SingletonResource::new("serverConfig", ServerConfigLoader { graphql }),
        }
    }

    pub async fn load(&self) -> Result<ServerConfig> {
        self.resource.load().await
    }

    pub async fn refresh(&self) -> Result<ServerConfig> {
        self.resource.refresh().await
    }

    /// Cached configuration, `None` before the first load
    pub fn data(&self) -> Option<ServerConfig> {
        self.resource.data()
    }

    /// `None` until the configuration is known
    pub fn is_configuration_mode(&self) -> Option<bool> {
        self.data().map(|config| config.is_configuration_mode())
    }

    pub fn mark_outdated(&self) {
        self.resource.mark_outdated();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent<()>> {
        self.resource.subscribe()
    }
}

impl Service for ServerConfigResource {
    fn as_loadable(self: Arc<Self>) -> Option<Arc<dyn Loadable>> {
        Some(self)
    }
}

#[async_trait]
impl Loadable for ServerConfigResource {
    async fn load(&self) -> Result<()> {
        let config = self.resource.load().await?;
        info!(
            server = %config.name,
            version = %config.version,
            configuration_mode = config.configuration_mode,
            "Server configuration loaded"
        );
        Ok(())
    }
}

impl Injectable for ServerConfigResource {
    fn dependencies() -> Vec<Token> {
        vec![Token::of::<GraphQlService>()]
    }

    fn inject(deps: &Dependencies) -> Result<Self> {
        Ok(Self::new(deps.get::<GraphQlService>()?))
    }
}
