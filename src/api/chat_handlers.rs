//! Chat and image generation handlers

use crate::api::models::{
    ChatRequest, ChatResponse, ImageGenerationRequest, ImageGenerationResponse, Usage,
};
use crate::error::AppError;
use crate::gateway::types::GenerationParams;
use crate::provider::ImageRequest;
use crate::AppState;
use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Chat completion
#[utoipa::path(
    post,
    path = "/api/chat",
    tag = "Chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Completed reply", body = ChatResponse),
        (status = 400, description = "Unknown model or unsupported provider"),
        (status = 408, description = "Provider timed out"),
        (status = 500, description = "Provider failure")
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    info!(
        model = %request.model,
        provider = ?request.provider,
        messages = request.messages.len(),
        "Received chat request"
    );

    let params = GenerationParams::from_options(request.temperature, request.max_tokens);
    let result = state
        .dispatcher
        .dispatch(
            &request.model,
            request.provider.as_deref(),
            &request.messages,
            &params,
        )
        .await?;

    let tokens = result.text.split_whitespace().count();

    Ok(Json(ChatResponse {
        message: result.text,
        model: request.model,
        provider: result.provider_used,
        timestamp: Utc::now().to_rfc3339(),
        usage: Some(Usage { tokens }),
    }))
}

/// Image generation
#[utoipa::path(
    post,
    path = "/api/generate-image",
    tag = "Images",
    request_body = ImageGenerationRequest,
    responses(
        (status = 200, description = "Generated image", body = ImageGenerationResponse),
        (status = 400, description = "Unknown image model or unsupported provider"),
        (status = 408, description = "Image generation timed out"),
        (status = 500, description = "Provider failure")
    )
)]
pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImageGenerationRequest>,
) -> Result<Json<ImageGenerationResponse>, AppError> {
    info!(model = %request.model, prompt_len = request.prompt.len(), "Received image generation request");

    let image_request = ImageRequest {
        model: request.model.clone(),
        prompt: request.prompt.clone(),
        width: request.width,
        height: request.height,
        quality: request.quality,
        style: request.style,
    };

    let image = state
        .images
        .generate(image_request, request.provider.as_deref())
        .await?;

    Ok(Json(ImageGenerationResponse {
        image_url: image.image_url,
        model: request.model,
        provider: image.provider,
        timestamp: Utc::now().to_rfc3339(),
        prompt: request.prompt,
    }))
}
