//! Main entry point for the Nexus Gateway

use nexus_gateway::{api, config::Settings, AppState};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments set variables directly
    let _ = dotenvy::dotenv();

    let settings = Settings::load()?;
    settings.validate()?;

    // Initialize logging; RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    if settings.logging.format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    }

    info!(
        host = %settings.server.host,
        port = settings.server.port,
        models = settings.catalog.models.len(),
        providers = settings.get_enabled_providers().len(),
        "Starting Nexus Gateway"
    );

    let probe_interval = settings.dispatch.probe_interval_secs;
    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let app_state = Arc::new(AppState::from_settings(settings)?);
    info!(
        models = app_state.registry.len(),
        image_models = app_state.images.models().len(),
        "Provider registry ready"
    );

    let _health_task = (probe_interval > 0).then(|| {
        app_state
            .health_manager
            .start(Duration::from_secs(probe_interval))
    });

    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
