//! # Infrastructure Layer
//!
//! Runtime machinery of Beaver Core: the service container and plugin
//! bootstrap, cached resources, the GraphQL transport and the ambient
//! configuration and logging stack.
//!
//! ## Module Categories
//!
//! ### Plugins & DI
//! | Module | Description |
//! |--------|-------------|
//! | [`di`] | Service container, plugin manifests and the bootstrap sequencer |
//! | [`plugins`] | The core plugin manifest and application wiring |
//!
//! ### Data
//! | Module | Description |
//! |--------|-------------|
//! | [`resource`] | Single-flight cached resources (singleton, keyed, map) |
//! | [`resources`] | Server configuration and database driver resources |
//! | [`persistence`] | In-memory and file-backed state storage |
//! | [`sdk`] | GraphQL transport and service |
//!
//! ### Configuration & Observability
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Layered TOML / environment configuration |
//! | [`logging`] | Structured logging with tracing |
//! | [`constants`] | Infrastructure constants |

pub mod config;
pub mod constants;
pub mod di;
pub mod error_ext;
pub mod logging;
pub mod persistence;
pub mod plugins;
pub mod resource;
pub mod resources;
pub mod sdk;

pub use error_ext::ErrorContext;
