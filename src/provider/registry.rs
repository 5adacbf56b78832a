//! Provider registry: model routes and the provider capability table
//!
//! The registry is built once at startup and never mutated afterwards, so it
//! is shared behind an `Arc` and read without locking.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::CatalogConfig;
use crate::error::{AppError, DispatchError, Result};
use crate::gateway::types::{ModelId, ProviderId};
use crate::provider::create_provider;
use crate::provider::traits::CompletionProvider;

/// Immutable mapping from models to providers and from providers to capabilities
pub struct ProviderRegistry {
    routes: BTreeMap<ModelId, Vec<ProviderId>>,
    capabilities: HashMap<ProviderId, Arc<dyn CompletionProvider>>,
    fallback_provider: Option<ProviderId>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    /// Build the registry from the provider catalog
    pub fn from_catalog(catalog: &CatalogConfig) -> Result<Self> {
        let mut builder = Self::builder();

        for config in &catalog.providers {
            if !config.enabled {
                info!(name = %config.name, "Skipping disabled provider");
                continue;
            }

            match create_provider(config) {
                Ok(provider) => {
                    info!(name = %config.name, protocol = %config.protocol, "Registered provider");
                    builder = builder.provider(config.name.clone(), provider);
                }
                Err(e) => {
                    warn!(name = %config.name, error = %e, "Failed to create provider");
                }
            }
        }

        for route in &catalog.models {
            builder = builder.model(route.id.clone(), route.providers.iter().cloned());
        }

        if let Some(fallback) = &catalog.fallback_provider {
            builder = builder.fallback(fallback.clone());
        }

        builder.build()
    }

    /// Resolve the provider that should serve `model`.
    ///
    /// An explicit provider must be one of the model's registered providers;
    /// without one the first (preferred) provider is used.
    pub fn resolve(&self, model: &str, explicit: Option<&str>) -> std::result::Result<ProviderId, DispatchError> {
        let providers = self
            .routes
            .get(model)
            .ok_or_else(|| DispatchError::UnknownModel(model.to_string()))?;

        match explicit {
            Some(provider) if providers.iter().any(|p| p == provider) => Ok(provider.to_string()),
            Some(provider) => Err(DispatchError::UnsupportedProvider {
                model: model.to_string(),
                provider: provider.to_string(),
            }),
            // Lists are validated non-empty at build time
            None => providers
                .first()
                .cloned()
                .ok_or_else(|| DispatchError::UnknownModel(model.to_string())),
        }
    }

    /// Look up the capability registered under `provider`, falling back to the
    /// configured fallback provider when the name has no capability
    pub fn capability(&self, provider: &str) -> Option<Arc<dyn CompletionProvider>> {
        if let Some(capability) = self.capabilities.get(provider) {
            return Some(capability.clone());
        }

        let fallback = self.fallback_provider.as_deref()?;
        warn!(provider = %provider, fallback = %fallback, "No capability for provider, using fallback");
        self.capabilities.get(fallback).cloned()
    }

    /// Registered providers for `model`, in preference order
    pub fn providers_for(&self, model: &str) -> Option<&[ProviderId]> {
        self.routes.get(model).map(Vec::as_slice)
    }

    pub fn contains_model(&self, model: &str) -> bool {
        self.routes.contains_key(model)
    }

    /// All routes, ordered by model id
    pub fn routes(&self) -> &BTreeMap<ModelId, Vec<ProviderId>> {
        &self.routes
    }

    /// Distinct provider ids referenced by any route, sorted
    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.routes
            .values()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn fallback_provider(&self) -> Option<&str> {
        self.fallback_provider.as_deref()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Builder collecting routes and capabilities before the registry is frozen
#[derive(Default)]
pub struct ProviderRegistryBuilder {
    routes: BTreeMap<ModelId, Vec<ProviderId>>,
    capabilities: HashMap<ProviderId, Arc<dyn CompletionProvider>>,
    fallback_provider: Option<ProviderId>,
}

impl ProviderRegistryBuilder {
    pub fn provider(mut self, name: impl Into<ProviderId>, capability: Arc<dyn CompletionProvider>) -> Self {
        self.capabilities.insert(name.into(), capability);
        self
    }

    pub fn model<I, S>(mut self, model: impl Into<ModelId>, providers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ProviderId>,
    {
        self.routes
            .insert(model.into(), providers.into_iter().map(Into::into).collect());
        self
    }

    pub fn fallback(mut self, provider: impl Into<ProviderId>) -> Self {
        self.fallback_provider = Some(provider.into());
        self
    }

    pub fn build(self) -> Result<ProviderRegistry> {
        if let Some((model, _)) = self.routes.iter().find(|(_, providers)| providers.is_empty()) {
            return Err(AppError::InvalidRequest(format!(
                "Model '{}' must list at least one provider",
                model
            )));
        }

        if let Some(fallback) = &self.fallback_provider {
            if !self.capabilities.contains_key(fallback) {
                return Err(AppError::InvalidRequest(format!(
                    "Fallback provider '{}' has no registered capability",
                    fallback
                )));
            }
        }

        Ok(ProviderRegistry {
            routes: self.routes,
            capabilities: self.capabilities,
            fallback_provider: self.fallback_provider,
        })
    }
}
