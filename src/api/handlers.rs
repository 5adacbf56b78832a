//! HTTP request handlers for the catalog, health and session endpoints

use crate::api::models::{
    CapabilitiesResponse, CreateSessionRequest, HealthProbeQuery, HealthProbeRequest,
    HealthResponse, MessageResponse, ModelHealthSummary, ModelsResponse, ProvidersResponse,
    StatusResponse,
};
use crate::config::secs_to_duration;
use crate::error::AppError;
use crate::gateway::types::{Message, ProbeReport};
use crate::session::ChatSession;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::Query;
use std::sync::Arc;
use tracing::info;

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    tag = "Health",
    responses((status = 200, description = "Service is running", body = StatusResponse))
)]
pub async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        message: "Nexus Gateway API".to_string(),
        status: "running".to_string(),
    })
}

/// Supported request kinds
#[utoipa::path(
    get,
    path = "/api/capabilities",
    tag = "Models",
    responses((status = 200, description = "Capabilities", body = CapabilitiesResponse))
)]
pub async fn capabilities(State(state): State<Arc<AppState>>) -> Json<CapabilitiesResponse> {
    Json(CapabilitiesResponse {
        chat: !state.registry.is_empty(),
        image_generation: !state.images.models().is_empty(),
    })
}

/// List chat models with their providers, and image models
#[utoipa::path(
    get,
    path = "/api/models",
    tag = "Models",
    responses((status = 200, description = "Model catalog", body = ModelsResponse))
)]
pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let models = state.registry.routes().clone();
    let image_models = state.images.models().to_vec();

    Json(ModelsResponse {
        total_models: models.len(),
        total_image_models: image_models.len(),
        models,
        image_models,
    })
}

/// List every provider referenced by a model route
#[utoipa::path(
    get,
    path = "/api/providers",
    tag = "Models",
    responses((status = 200, description = "Providers", body = ProvidersResponse))
)]
pub async fn list_providers(State(state): State<Arc<AppState>>) -> Json<ProvidersResponse> {
    let providers = state.registry.provider_ids();
    Json(ProvidersResponse {
        total_providers: providers.len(),
        providers,
    })
}

/// Probe models via query string (`models=a,b` or `models=a&models=b`, plus `per_model_timeout=8`)
#[utoipa::path(
    get,
    path = "/api/models/health",
    tag = "Health",
    params(HealthProbeQuery),
    responses(
        (status = 200, description = "Probe report", body = ProbeReport),
        (status = 400, description = "Invalid timeout")
    )
)]
pub async fn probe_models_query(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HealthProbeQuery>,
) -> Result<Json<ProbeReport>, AppError> {
    run_probe(&state, query.into()).await.map(Json)
}

/// Probe models via JSON body
#[utoipa::path(
    post,
    path = "/api/models/health",
    tag = "Health",
    request_body = HealthProbeRequest,
    responses(
        (status = 200, description = "Probe report", body = ProbeReport),
        (status = 400, description = "Invalid timeout")
    )
)]
pub async fn probe_models(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HealthProbeRequest>,
) -> Result<Json<ProbeReport>, AppError> {
    run_probe(&state, request).await.map(Json)
}

async fn run_probe(state: &AppState, request: HealthProbeRequest) -> Result<ProbeReport, AppError> {
    let manager = &state.health_manager;

    let timeout = match request.per_model_timeout {
        Some(secs) => secs_to_duration(secs).ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "per_model_timeout must be a positive number of seconds, got {}",
                secs
            ))
        })?,
        None => manager.default_timeout(),
    };

    let models = request
        .models
        .unwrap_or_else(|| manager.default_models().to_vec());

    info!(models = models.len(), timeout_ms = timeout.as_millis() as u64, "Received health probe request");

    Ok(manager.prober().report(&models, timeout).await)
}

/// Gateway health
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Gateway health", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let summary = state.health_manager.get_health_summary();

    let status = if summary.total == 0 || summary.healthy > 0 {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models: ModelHealthSummary {
            total: summary.total,
            healthy: summary.healthy,
            unhealthy: summary.unhealthy,
        },
        active_connections: state.connections.active_count(),
    })
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "Sessions",
    request_body = CreateSessionRequest,
    responses((status = 200, description = "Created session", body = ChatSession))
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSessionRequest>,
) -> Json<ChatSession> {
    let session = state
        .sessions
        .create(request.title, request.model, request.provider);
    info!(session = %session.id, "Session created");
    Json(session)
}

#[utoipa::path(
    get,
    path = "/api/sessions",
    tag = "Sessions",
    responses((status = 200, description = "All sessions", body = [ChatSession]))
)]
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<ChatSession>> {
    Json(state.sessions.list())
}

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}",
    tag = "Sessions",
    params(("session_id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session", body = ChatSession),
        (status = 404, description = "Session not found")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ChatSession>, AppError> {
    state.sessions.get(&session_id).map(Json)
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/messages",
    tag = "Sessions",
    params(("session_id" = String, Path, description = "Session id")),
    request_body = Message,
    responses(
        (status = 200, description = "Message added", body = MessageResponse),
        (status = 404, description = "Session not found")
    )
)]
pub async fn add_session_message(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(message): Json<Message>,
) -> Result<Json<MessageResponse>, AppError> {
    state.sessions.add_message(&session_id, message)?;
    Ok(Json(MessageResponse {
        message: "Message added successfully".to_string(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{session_id}",
    tag = "Sessions",
    params(("session_id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session deleted", body = MessageResponse),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.sessions.delete(&session_id)?;
    info!(session = %session_id, "Session deleted");
    Ok(Json(MessageResponse {
        message: "Session deleted successfully".to_string(),
    }))
}
