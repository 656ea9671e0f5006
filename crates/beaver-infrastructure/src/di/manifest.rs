//! Plugin manifests and their registry
//!
//! A manifest is a named bundle of providers plus the names of the manifests
//! it depends on. The registry validates names and dependencies on insertion
//! and yields a stable topological load order.

use crate::di::container::ProviderDescriptor;
use beaver_domain::di::{Injectable, Service, Token};
use beaver_domain::error::{Error, Result};
use std::collections::HashSet;
use std::sync::Arc;

/// Named bundle of providers contributed by a plugin
#[derive(Debug, Clone)]
pub struct PluginManifest {
    name: String,
    depends: Vec<String>,
    providers: Vec<ProviderDescriptor>,
}

impl PluginManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            depends: Vec::new(),
            providers: Vec::new(),
        }
    }

    /// Require the manifest `name` to bootstrap first
    #[must_use]
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends.push(name.into());
        self
    }

    /// Add an [`Injectable`] provider
    #[must_use]
    pub fn provider<T: Injectable>(self) -> Self {
        self.with_provider(ProviderDescriptor::of::<T>())
    }

    /// Add a pre-built instance
    #[must_use]
    pub fn value<T: Service>(self, value: Arc<T>) -> Self {
        self.with_provider(ProviderDescriptor::value(value))
    }

    /// Add an arbitrary provider descriptor
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderDescriptor) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends
    }

    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    /// Tokens of the providers, in declaration order
    pub fn provider_tokens(&self) -> Vec<Token> {
        self.providers.iter().map(ProviderDescriptor::token).collect()
    }
}

/// Manifests in declaration order
#[derive(Debug, Default)]
pub struct ManifestRegistry {
    manifests: Vec<PluginManifest>,
}

impl ManifestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a manifest whose dependencies are already registered
    ///
    /// A manifest depending on itself is accepted here and rejected as a
    /// cycle by [`ManifestRegistry::load_order`].
    pub fn add(&mut self, manifest: PluginManifest) -> Result<()> {
        self.add_batch(vec![manifest])
    }

    /// Store several manifests that may reference each other
    ///
    /// Nothing is stored when any manifest of the batch is invalid.
    pub fn add_batch(&mut self, batch: Vec<PluginManifest>) -> Result<()> {
        let mut known: HashSet<&str> = self.manifests.iter().map(|m| m.name.as_str()).collect();
        for manifest in &batch {
            if !known.insert(manifest.name.as_str()) {
                return Err(Error::DuplicateManifest {
                    name: manifest.name.clone(),
                });
            }
        }

        for manifest in &batch {
            if let Some(missing) = manifest
                .depends
                .iter()
                .find(|dependency| !known.contains(dependency.as_str()))
            {
                return Err(Error::MissingManifestDependency {
                    manifest: manifest.name.clone(),
                    dependency: missing.clone(),
                });
            }
        }

        self.manifests.extend(batch);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.manifests.iter().any(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.manifests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifests.is_empty()
    }

    /// Dependencies first; independent manifests keep declaration order
    pub fn load_order(&self) -> Result<Vec<&PluginManifest>> {
        let mut ordered: Vec<&PluginManifest> = Vec::with_capacity(self.manifests.len());
        let mut placed: HashSet<&str> = HashSet::with_capacity(self.manifests.len());
        let mut pending: Vec<&PluginManifest> = self.manifests.iter().collect();

        while !pending.is_empty() {
            let Some(next) = pending.iter().position(|manifest| {
                manifest
                    .depends
                    .iter()
                    .all(|dependency| placed.contains(dependency.as_str()))
            }) else {
                return Err(Error::CyclicManifestDependency {
                    manifests: pending.iter().map(|m| m.name.clone()).collect(),
                });
            };

            let manifest = pending.remove(next);
            placed.insert(manifest.name.as_str());
            ordered.push(manifest);
        }

        Ok(ordered)
    }
}
