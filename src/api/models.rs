//! API request and response models

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::gateway::types::Message;

/// Chat completion request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<Message>,

    pub model: String,

    /// Provider to use; the model's preferred provider when omitted
    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct Usage {
    /// Whitespace-separated word count of the reply
    pub tokens: usize,
}

/// Chat completion response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ChatResponse {
    pub message: String,
    pub model: String,
    pub provider: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Image generation request
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ImageGenerationRequest {
    pub prompt: String,

    pub model: String,

    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default = "default_dimension")]
    pub width: u32,

    #[serde(default = "default_dimension")]
    pub height: u32,

    #[serde(default = "default_quality")]
    pub quality: String,

    #[serde(default = "default_style")]
    pub style: String,
}

fn default_dimension() -> u32 {
    1024
}

fn default_quality() -> String {
    "standard".to_string()
}

fn default_style() -> String {
    "vivid".to_string()
}

/// Image generation response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ImageGenerationResponse {
    pub image_url: String,
    pub model: String,
    pub provider: String,
    pub timestamp: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct StatusResponse {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CapabilitiesResponse {
    pub chat: bool,
    pub image_generation: bool,
}

/// Model catalog
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ModelsResponse {
    /// Model id to providers, in preference order
    pub models: BTreeMap<String, Vec<String>>,
    pub image_models: Vec<String>,
    pub total_models: usize,
    pub total_image_models: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ProvidersResponse {
    pub providers: Vec<String>,
    pub total_providers: usize,
}

/// Health probe request body
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct HealthProbeRequest {
    #[serde(default)]
    pub models: Option<Vec<String>>,
    /// Seconds allowed for each model
    #[serde(default)]
    pub per_model_timeout: Option<f64>,
}

/// Health probe query string
#[derive(Debug, Clone, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HealthProbeQuery {
    /// Model ids; the key may repeat and each value may be comma-separated
    #[serde(default)]
    pub models: Vec<String>,
    /// Seconds allowed for each model
    #[serde(default)]
    pub per_model_timeout: Option<f64>,
}

impl From<HealthProbeQuery> for HealthProbeRequest {
    fn from(query: HealthProbeQuery) -> Self {
        let models: Vec<String> = query
            .models
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();

        Self {
            models: (!models.is_empty()).then_some(models),
            per_model_timeout: query.per_model_timeout,
        }
    }
}

/// Gateway health response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub models: ModelHealthSummary,
    pub active_connections: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct ModelHealthSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateSessionRequest {
    pub title: String,
    pub model: String,
    pub provider: String,
}

/// Generic message response
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
