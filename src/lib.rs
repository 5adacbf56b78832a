//! Nexus Gateway
//!
//! Routes chat completion and image generation requests to interchangeable
//! model providers, with per-request provider resolution, bounded latency,
//! concurrent health probing and persistent WebSocket sessions.

pub mod api;
pub mod config;
pub mod connection;
pub mod error;
pub mod gateway;
pub mod provider;
pub mod session;

pub use error::{AppError, DispatchError, InvokerError, Result};

use std::sync::Arc;
use tracing::warn;

use config::Settings;
use connection::ConnectionManager;
use gateway::{CompletionInvoker, Dispatcher, HealthCheckManager, HealthProber, ImageGenerator};
use provider::{create_image_provider, ImageProvider, ProviderRegistry};
use session::SessionStore;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<Settings>,
    pub registry: Arc<ProviderRegistry>,
    pub dispatcher: Arc<Dispatcher>,
    pub health_manager: Arc<HealthCheckManager>,
    pub images: Arc<ImageGenerator>,
    pub sessions: Arc<SessionStore>,
    pub connections: Arc<ConnectionManager>,
}

impl AppState {
    /// Build every component from the loaded settings
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let registry = Arc::new(ProviderRegistry::from_catalog(&settings.catalog)?);

        let image_provider = match &settings.catalog.image.provider {
            Some(config) => match create_image_provider(config) {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!(name = %config.name, error = %e, "Failed to create image provider");
                    None
                }
            },
            None => None,
        };

        Ok(Self::new(settings, registry, image_provider))
    }

    /// Wire components around an existing registry and image provider
    pub fn new(
        settings: Settings,
        registry: Arc<ProviderRegistry>,
        image_provider: Option<Arc<dyn ImageProvider>>,
    ) -> Self {
        let dispatch_timeout = settings.dispatch.timeout();

        let dispatcher = Arc::new(Dispatcher::with_timeout(registry.clone(), dispatch_timeout));
        let prober = Arc::new(HealthProber::new(
            CompletionInvoker::new(registry.clone()),
            dispatch_timeout,
        ));
        let health_manager = Arc::new(HealthCheckManager::new(
            prober,
            settings.dispatch.probe_models.clone(),
            settings.dispatch.probe_timeout(),
        ));
        let images = Arc::new(ImageGenerator::new(
            settings.catalog.image.models.clone(),
            image_provider,
            settings.catalog.image.timeout(),
        ));
        let connections = Arc::new(ConnectionManager::new(
            dispatcher.clone(),
            settings.dispatch.default_stream_model.clone(),
        ));

        Self {
            settings: Arc::new(settings),
            registry,
            dispatcher,
            health_manager,
            images,
            sessions: Arc::new(SessionStore::new()),
            connections,
        }
    }
}
