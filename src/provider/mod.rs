//! Provider module - capability traits, HTTP providers and the registry

pub mod anthropic;
pub mod http;
pub mod openai;
pub mod registry;
pub mod traits;

use std::sync::Arc;

use crate::config::{ProtocolType, ProviderConfig};
use crate::error::Result;

pub use anthropic::AnthropicProvider;
pub use openai::{OpenAICompatibleProvider, OpenAIImageProvider};
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};
pub use traits::{
    CompletionProvider, CompletionRequest, ImageProvider, ImageRequest, ProviderError,
};

/// Create the chat provider matching the configured protocol
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn CompletionProvider>> {
    match config.protocol {
        ProtocolType::OpenAI => Ok(Arc::new(OpenAICompatibleProvider::new(config)?)),
        ProtocolType::Anthropic => Ok(Arc::new(AnthropicProvider::new(config)?)),
    }
}

/// Create an image provider; only the OpenAI image API is supported
pub fn create_image_provider(config: &ProviderConfig) -> Result<Arc<dyn ImageProvider>> {
    match config.protocol {
        ProtocolType::OpenAI => Ok(Arc::new(OpenAIImageProvider::new(config)?)),
        ProtocolType::Anthropic => Err(crate::error::AppError::InvalidRequest(format!(
            "Provider '{}': anthropic does not support image generation",
            config.name
        ))),
    }
}
