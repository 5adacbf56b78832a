//! Error types for the gateway
//!
//! Three layers: provider errors stay inside the provider module, the
//! invoker/dispatch taxonomy is what the core exposes, and [`AppError`] is the
//! HTTP-facing error that renders a status code and JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Result type used throughout the service layer
pub type Result<T> = std::result::Result<T, AppError>;

/// Failure of a single deadline-bounded provider call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokerError {
    #[error("provider call exceeded its deadline of {0:?}")]
    Timeout(Duration),

    #[error("{message}")]
    ProviderFailure { message: String },
}

/// Uniform error taxonomy for dispatch, image generation and probing
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Model {0} not available")]
    UnknownModel(String),

    #[error("Image model {0} not available")]
    UnknownImageModel(String),

    #[error("Provider {provider} not available for model {model}")]
    UnsupportedProvider { model: String, provider: String },

    #[error("Request timeout - the AI model took too long to respond")]
    Timeout(Duration),

    #[error("Error generating response: {message}")]
    ProviderFailure { message: String },
}

impl DispatchError {
    /// Short machine-readable kind, used in logs and error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::UnknownModel(_) | DispatchError::UnknownImageModel(_) => "unknown_model",
            DispatchError::UnsupportedProvider { .. } => "unsupported_provider",
            DispatchError::Timeout(_) => "timeout",
            DispatchError::ProviderFailure { .. } => "provider_failure",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            DispatchError::UnknownModel(_)
            | DispatchError::UnknownImageModel(_)
            | DispatchError::UnsupportedProvider { .. } => {
                StatusCode::BAD_REQUEST
            }
            DispatchError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            DispatchError::ProviderFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InvokerError> for DispatchError {
    fn from(err: InvokerError) -> Self {
        match err {
            InvokerError::Timeout(limit) => DispatchError::Timeout(limit),
            InvokerError::ProviderFailure { message } => DispatchError::ProviderFailure { message },
        }
    }
}

/// Service-level error returned by HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Dispatch(err) => (err.status_code(), err.kind()),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, "http_client_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();

        if status.is_server_error() {
            tracing::error!(kind = kind, error = %self, "Request failed");
        } else {
            tracing::debug!(kind = kind, error = %self, "Request rejected");
        }

        let body = Json(json!({
            "detail": self.to_string(),
            "type": kind,
        }));

        (status, body).into_response()
    }
}
