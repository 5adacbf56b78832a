//! Provider capability traits
//!
//! A provider is anything that can turn a model id, a conversation and
//! generation parameters into text (or, for image providers, an image URL).
//! Everything above this module only sees these traits.

use async_trait::async_trait;
use thiserror::Error;

use crate::gateway::types::{GenerationParams, Message};

/// Errors raised by provider implementations
///
/// These never leave the invoker: they are flattened into a message string.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse provider response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Other(String),
}

/// A completion call handed to a provider
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub params: GenerationParams,
}

/// An image generation call handed to an image provider
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    pub quality: String,
    pub style: String,
}

/// Trait for chat completion providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Get the wire protocol name
    fn protocol(&self) -> &str;

    /// Produce a complete reply for the conversation
    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}

/// Trait for image generation providers
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Generate one image and return a URL (or data URL) pointing at it
    async fn generate(&self, request: ImageRequest) -> Result<String, ProviderError>;
}
