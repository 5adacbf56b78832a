//! HTTP route definitions

use crate::api::models::*;
use crate::api::{chat_handlers, handlers, ws};
use crate::gateway::types::{Message, ProbeReport, ProbeResult, Role};
use crate::session::ChatSession;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Nexus Gateway API",
        version = "0.1.0",
        description = "Routes chat and image generation requests to interchangeable model providers.",
        license(name = "MIT"),
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        handlers::root,
        handlers::capabilities,
        handlers::list_models,
        handlers::list_providers,
        handlers::probe_models_query,
        handlers::probe_models,
        handlers::health_check,
        handlers::create_session,
        handlers::list_sessions,
        handlers::get_session,
        handlers::add_session_message,
        handlers::delete_session,
        chat_handlers::chat,
        chat_handlers::generate_image,
    ),
    components(schemas(
        ChatRequest,
        ChatResponse,
        Usage,
        ImageGenerationRequest,
        ImageGenerationResponse,
        StatusResponse,
        CapabilitiesResponse,
        ModelsResponse,
        ProvidersResponse,
        HealthProbeRequest,
        HealthResponse,
        ModelHealthSummary,
        CreateSessionRequest,
        MessageResponse,
        Message,
        Role,
        ProbeResult,
        ProbeReport,
        ChatSession,
    )),
    tags(
        (name = "Chat", description = "Chat completion endpoints"),
        (name = "Images", description = "Image generation endpoints"),
        (name = "Models", description = "Model and provider catalog"),
        (name = "Sessions", description = "Chat session storage"),
        (name = "Health", description = "Health and probing endpoints"),
    )
)]
pub struct ApiDoc;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
}

/// Create the main application router
pub fn create_router(state: Arc<crate::AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.settings.server.request_timeout_secs);
    let cors = cors_layer(&state.settings.cors.allowed_origins);

    // Plain request/response routes get an outer deadline; the socket route does not
    let api_routes = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/api/capabilities", get(handlers::capabilities))
        .route("/api/models", get(handlers::list_models))
        .route(
            "/api/models/health",
            get(handlers::probe_models_query).post(handlers::probe_models),
        )
        .route("/api/providers", get(handlers::list_providers))
        .route("/api/chat", post(chat_handlers::chat))
        .route("/api/generate-image", post(chat_handlers::generate_image))
        .route(
            "/api/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/api/sessions/:session_id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route(
            "/api/sessions/:session_id/messages",
            post(handlers::add_session_message),
        )
        .layer(TimeoutLayer::new(request_timeout));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes)
        .route("/ws/:client_id", get(ws::websocket))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
