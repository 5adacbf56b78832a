//! Anthropic Messages API provider

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::gateway::types::Role;
use crate::provider::http::HttpTransport;
use crate::provider::traits::{CompletionProvider, CompletionRequest, ProviderError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnthropicMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    pub messages: Vec<AnthropicMessage>,
}

impl From<&CompletionRequest> for MessagesRequest {
    /// System turns are lifted into the top-level `system` field
    fn from(request: &CompletionRequest) -> Self {
        let system: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        Self {
            model: request.model.clone(),
            max_tokens: request.params.max_tokens,
            temperature: request.params.temperature,
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n\n"))
            },
            messages: request
                .messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| AnthropicMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Anthropic-specific provider (Claude API)
pub struct AnthropicProvider {
    transport: HttpTransport,
}

impl AnthropicProvider {
    /// Expects `auth.header_name: x-api-key` in the provider config
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> &str {
        self.transport.name()
    }

    fn protocol(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<String, ProviderError> {
        let body = MessagesRequest::from(&request);
        let response: MessagesResponse = self
            .transport
            .post_json("/messages", &body, &[("anthropic-version", ANTHROPIC_VERSION)])
            .await?;

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text)
            .collect();

        Ok(text)
    }
}
