//! Image generation dispatch

use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::error::DispatchError;
use crate::gateway::invoker::run_with_deadline;
use crate::gateway::types::ModelId;
use crate::provider::{ImageProvider, ImageRequest};

/// Provider name reported when no image provider is configured
pub const NO_IMAGE_PROVIDER: &str = "none";

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub image_url: String,
    pub provider: String,
}

/// Validates image requests against the image model list and calls the
/// configured image provider under a deadline
pub struct ImageGenerator {
    models: Vec<ModelId>,
    provider: Option<Arc<dyn ImageProvider>>,
    timeout: Duration,
}

impl ImageGenerator {
    pub fn new(models: Vec<ModelId>, provider: Option<Arc<dyn ImageProvider>>, timeout: Duration) -> Self {
        Self {
            models,
            provider,
            timeout,
        }
    }

    pub fn models(&self) -> &[ModelId] {
        &self.models
    }

    pub fn provider_name(&self) -> &str {
        self.provider
            .as_ref()
            .map(|p| p.name())
            .unwrap_or(NO_IMAGE_PROVIDER)
    }

    /// An explicit provider must name the configured image provider
    pub async fn generate(
        &self,
        request: ImageRequest,
        explicit_provider: Option<&str>,
    ) -> Result<GeneratedImage, DispatchError> {
        if !self.models.iter().any(|m| m == &request.model) {
            return Err(DispatchError::UnknownImageModel(request.model));
        }

        if let Some(explicit) = explicit_provider {
            if explicit != self.provider_name() {
                return Err(DispatchError::UnsupportedProvider {
                    model: request.model,
                    provider: explicit.to_string(),
                });
            }
        }

        let provider = self.provider.clone().ok_or_else(|| DispatchError::ProviderFailure {
            message: "no image provider configured".to_string(),
        })?;
        let provider_name = provider.name().to_string();
        let model = request.model.clone();

        let image_url = run_with_deadline(self.timeout, async move { provider.generate(request).await })
            .await
            .map_err(DispatchError::from)?;

        info!(model = %model, provider = %provider_name, "Image generated");

        Ok(GeneratedImage {
            image_url,
            provider: provider_name,
        })
    }
}
