//! Database driver resource
//!
//! `driverList` returns every driver, or a single one when `driverId` is
//! given. A full reload replaces the cached drivers.

use crate::resource::{CachedMapResource, KeyState, MapKey, ResourceEvent, ResourceLoader};
use crate::sdk::GraphQlService;
use crate::sdk::operations::{DRIVER_LIST_QUERY, DriverListData};
use async_trait::async_trait;
use beaver_domain::di::{Dependencies, Injectable, Service, Token};
use beaver_domain::error::Result;
use beaver_domain::value_objects::DbDriver;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;

struct DriverListLoader {
    graphql: Arc<GraphQlService>,
}

#[async_trait]
impl ResourceLoader<MapKey<String>, Vec<(String, DbDriver)>> for DriverListLoader {
    async fn load(&self, key: &MapKey<String>) -> Result<Vec<(String, DbDriver)>> {
        let variables = match key {
            MapKey::All => json!({}),
            MapKey::Key(id) => json!({ "driverId": id }),
        };
        let data: DriverListData = self.graphql.query(DRIVER_LIST_QUERY, variables).await?;

        Ok(data
            .driver_list
            .into_iter()
            .map(|driver| (driver.id.clone(), driver))
            .collect())
    }
}

pub struct DbDriverResource {
    resource: CachedMapResource<String, DbDriver>,
}

impl DbDriverResource {
    pub fn new(graphql: Arc<GraphQlService>) -> Self {
        Self {
            resource: CachedMapResource::new("driverList", DriverListLoader { graphql }),
        }
    }

    pub async fn load(&self, id: impl Into<String>) -> Result<Option<DbDriver>> {
        self.resource.load(id.into()).await
    }

    /// Every driver in display order
    pub async fn load_all(&self) -> Result<Vec<DbDriver>> {
        self.resource.load_all().await?;
        Ok(self.drivers())
    }

    pub async fn refresh_all(&self) -> Result<Vec<DbDriver>> {
        self.resource.refresh_all().await?;
        Ok(self.drivers())
    }

    /// Cached drivers in display order
    pub fn drivers(&self) -> Vec<DbDriver> {
        let mut drivers = self.resource.values();
        drivers.sort_by(DbDriver::compare);
        drivers
    }

    pub fn get(&self, id: &str) -> Option<DbDriver> {
        self.resource.get(&id.to_string())
    }

    pub fn has(&self, id: &str) -> bool {
        self.resource.has(&id.to_string())
    }

    pub fn lookup(&self, id: &str) -> KeyState {
        self.resource.lookup(&id.to_string())
    }

    pub fn mark_outdated(&self, id: impl Into<String>) {
        self.resource.mark_outdated(id.into());
    }

    pub fn mark_all_outdated(&self) {
        self.resource.mark_all_outdated();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ResourceEvent<MapKey<String>>> {
        self.resource.subscribe()
    }
}

impl Service for DbDriverResource {}

impl Injectable for DbDriverResource {
    fn dependencies() -> Vec<Token> {
        vec![Token::of::<GraphQlService>()]
    }

    fn inject(deps: &Dependencies) -> Result<Self> {
        Ok(Self::new(deps.get::<GraphQlService>()?))
    }
}
