//! OpenAI API compatible providers
//! Covers DeepInfra, Groq, OpenRouter, DeepSeek and any other endpoint speaking
//! the `/chat/completions` and `/images/generations` wire format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::provider::http::HttpTransport;
use crate::provider::traits::{
    CompletionProvider, CompletionRequest, ImageProvider, ImageRequest, ProviderError,
};

/// Chat message in OpenAI wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completion request (OpenAI compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stream: bool,
}

impl From<&CompletionRequest> for ChatCompletionRequest {
    fn from(request: &CompletionRequest) -> Self {
        Self {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            temperature: request.params.temperature,
            max_tokens: request.params.max_tokens,
            stream: false,
        }
    }
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    pub choices: Vec<ChatChoice>,
}

/// Chat choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Image generation request (OpenAI compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationRequest {
    pub model: String,
    pub prompt: String,
    pub n: u32,
    pub size: String,
    pub quality: String,
    pub style: String,
    pub response_format: String,
}

/// Image data in the response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub b64_json: Option<String>,
}

/// Image generation response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageGenerationResponse {
    #[serde(default)]
    pub created: Option<i64>,
    pub data: Vec<ImageData>,
}

/// OpenAI API compatible chat provider
pub struct OpenAICompatibleProvider {
    transport: HttpTransport,
}

impl OpenAICompatibleProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        self.transport.name()
    }

    fn protocol(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> std::result::Result<String, ProviderError> {
        let body = ChatCompletionRequest::from(&request);
        let response: ChatCompletionResponse = self
            .transport
            .post_json("/chat/completions", &body, &[])
            .await?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            ProviderError::InvalidResponse("response contained no choices".to_string())
        })?;

        debug!(
            provider = %self.name(),
            model = %request.model,
            finish_reason = ?choice.finish_reason,
            "Chat completion received"
        );

        Ok(choice.message.content.unwrap_or_default())
    }
}

/// OpenAI API compatible image provider
pub struct OpenAIImageProvider {
    transport: HttpTransport,
}

impl OpenAIImageProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }
}

#[async_trait]
impl ImageProvider for OpenAIImageProvider {
    fn name(&self) -> &str {
        self.transport.name()
    }

    async fn generate(&self, request: ImageRequest) -> std::result::Result<String, ProviderError> {
        let body = ImageGenerationRequest {
            model: request.model,
            prompt: request.prompt,
            n: 1,
            size: format!("{}x{}", request.width, request.height),
            quality: request.quality,
            style: request.style,
            response_format: "url".to_string(),
        };

        let response: ImageGenerationResponse = self
            .transport
            .post_json("/images/generations", &body, &[])
            .await?;

        let image = response.data.into_iter().next().ok_or_else(|| {
            ProviderError::InvalidResponse("response contained no images".to_string())
        })?;

        match (image.url, image.b64_json) {
            (Some(url), _) => Ok(url),
            (None, Some(b64)) => Ok(format!("data:image/png;base64,{}", b64)),
            (None, None) => Err(ProviderError::InvalidResponse(
                "image entry had neither url nor b64_json".to_string(),
            )),
        }
    }
}
