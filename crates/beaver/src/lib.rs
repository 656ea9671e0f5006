//! # Beaver Core
//!
//! Client core of a CloudBeaver-style database web tool: a dependency
//! injection container, plugin manifests booted in dependency order,
//! cached server resources with coalesced fetches, and an action pipeline
//! driving tab navigation.
//!
//! ## Example
//!
//! ```ignore
//! use beaver::infrastructure::config::ConfigLoader;
//! use beaver::infrastructure::plugins::init_app;
//! use beaver::infrastructure::resources::ServerConfigResource;
//!
//! let config = ConfigLoader::new().load()?;
//! let app = init_app(config, Vec::new()).await?;
//! let server = app.resolve::<ServerConfigResource>()?;
//! println!("{:?}", server.data());
//! ```
//!
//! ## Architecture
//!
//! - `domain` - container contracts, ports, value objects and errors
//! - `application` - auto-saved state, navigation tabs and the executor
//! - `infrastructure` - container, bootstrap, resources, GraphQL, config, logging

use anyhow::Context;
use beaver_infrastructure::config::ConfigLoader;
use beaver_infrastructure::config::loader::validate_app_config;
use beaver_infrastructure::logging::init_logging;
use beaver_infrastructure::resources::{DbDriverResource, ServerConfigResource};
use std::path::Path;

/// Domain layer
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use beaver_domain::*;
}

/// Application layer
///
/// Re-exports from the application crate for convenience
pub mod application {
    pub use beaver_application::*;
}

/// Infrastructure layer
///
/// Re-exports from the infrastructure crate for convenience
pub mod infrastructure {
    pub use beaver_infrastructure::*;
}

pub use beaver_domain::error::{Error, Result};
pub use beaver_infrastructure::di::{Container, PluginBootstrap, PluginManifest};
pub use beaver_infrastructure::plugins::{AppContext, init_app};

/// Command line options applied on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct RunOptions<'a> {
    pub config_path: Option<&'a Path>,
    pub endpoint: Option<String>,
    pub list_drivers: bool,
}

/// Boot the core manifest and print a summary of the connected server
pub async fn run(options: RunOptions<'_>) -> anyhow::Result<()> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = options.config_path {
        loader = loader.with_config_path(path);
    }
    let mut config = loader.load().context("Failed to load configuration")?;
    if let Some(endpoint) = options.endpoint {
        config.api.endpoint = endpoint;
        validate_app_config(&config).context("Invalid endpoint override")?;
    }

    init_logging(&config.logging).context("Failed to initialize logging")?;

    let app = init_app(config, Vec::new())
        .await
        .context("Failed to bootstrap application")?;

    print_summary(&app);

    if options.list_drivers {
        let drivers = app.resolve::<DbDriverResource>()?;
        let drivers = drivers.load_all().await.context("Failed to load drivers")?;
        for driver in drivers {
            println!(
                "  {:<24} {}",
                driver.id,
                driver.name.as_deref().unwrap_or_default()
            );
        }
    }

    Ok(())
}

fn print_summary(app: &AppContext) {
    let report = app.report();
    if let Ok(config) = app.config() {
        println!("endpoint:  {}", config.api.endpoint);
    }
    println!("manifests: {}", report.manifests.join(", "));
    println!("services:  {}", report.services);

    match app
        .resolve::<ServerConfigResource>()
        .ok()
        .and_then(|resource| resource.data())
    {
        Some(server) => println!("server:    {} {}", server.name, server.version),
        None => println!("server:    unavailable"),
    }

    for failure in &report.load_failures {
        println!("failed:    {} ({})", failure.service, failure.error);
    }
}
