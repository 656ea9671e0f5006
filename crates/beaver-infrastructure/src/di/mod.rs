//! Service Container and Plugin Bootstrap
//!
//! Plugins contribute [`PluginManifest`]s listing their providers. The
//! [`PluginBootstrap`] orders manifests by their dependencies, registers
//! their providers in a [`Container`] and drives the lifecycle phases:
//!
//! ```text
//! add_manifest(core) ─┐
//! add_manifest(sql)  ─┼─► load order ─► resolve ─► register() ─► load() ─► Ready
//! add_manifest(ui)   ─┘   (topological,  (every     (fatal on    (failures
//!                          stable)        provider)  error)       logged)
//! ```

pub mod bootstrap;
pub mod container;
pub mod manifest;

pub use bootstrap::{BootstrapReport, BootstrapState, LoadFailure, PluginBootstrap};
pub use container::{Container, ProviderDescriptor};
pub use manifest::{ManifestRegistry, PluginManifest};
