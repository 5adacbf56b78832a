//! Core request and result types shared by dispatch, probing and streaming

use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// Identifier of a requestable model
pub type ModelId = String;

/// Identifier of a backend provider
pub type ProviderId = String;

/// Maximum number of characters kept from a probe reply
pub const PROBE_SAMPLE_CHARS: usize = 80;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// ISO-8601 timestamp, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// Sampling parameters forwarded to the provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Build parameters from optional request fields, applying defaults
    pub fn from_options(temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        let defaults = Self::default();
        Self {
            temperature: temperature.unwrap_or(defaults.temperature),
            max_tokens: max_tokens.unwrap_or(defaults.max_tokens),
        }
    }

    /// Deterministic, tiny budget used by health probes
    pub fn probe() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 10,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Successful dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub text: String,
    pub provider_used: ProviderId,
    pub elapsed: Duration,
}

/// Outcome of probing one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProbeResult {
    pub model: ModelId,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeResult {
    pub fn unknown_model(model: impl Into<ModelId>) -> Self {
        Self {
            model: model.into(),
            ok: false,
            provider: None,
            sample: None,
            error: Some("unknown model".to_string()),
        }
    }

    pub fn passed(model: impl Into<ModelId>, provider: impl Into<ProviderId>, reply: &str) -> Self {
        Self {
            model: model.into(),
            ok: true,
            provider: Some(provider.into()),
            sample: Some(reply.chars().take(PROBE_SAMPLE_CHARS).collect()),
            error: None,
        }
    }

    pub fn failed(
        model: impl Into<ModelId>,
        provider: impl Into<ProviderId>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            ok: false,
            provider: Some(provider.into()),
            sample: None,
            error: Some(error.into()),
        }
    }
}

/// Aggregate of one probe batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProbeReport {
    pub results: Vec<ProbeResult>,
    pub working: Vec<ModelId>,
    pub count_working: usize,
}

impl From<Vec<ProbeResult>> for ProbeReport {
    fn from(results: Vec<ProbeResult>) -> Self {
        let working: Vec<ModelId> = results
            .iter()
            .filter(|r| r.ok)
            .map(|r| r.model.clone())
            .collect();
        let count_working = working.len();

        Self {
            results,
            working,
            count_working,
        }
    }
}
