//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub logging: LoggingConfig,
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole HTTP request, above the dispatch ceiling
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    180
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "json" or "pretty"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Dispatch and health probe timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Ceiling for a single chat dispatch, in seconds
    #[serde(default = "default_dispatch_timeout")]
    pub timeout_secs: f64,

    /// Default per-model probe timeout, in seconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: f64,

    /// Models probed when a health request names none
    #[serde(default = "default_probe_models")]
    pub probe_models: Vec<String>,

    /// Background probe interval in seconds; 0 disables the background task
    #[serde(default)]
    pub probe_interval_secs: u64,

    /// Model used by streaming requests that do not name one
    #[serde(default = "default_stream_model")]
    pub default_stream_model: String,
}

fn default_dispatch_timeout() -> f64 {
    60.0
}

fn default_probe_timeout() -> f64 {
    8.0
}

pub fn default_probe_models() -> Vec<String> {
    vec![
        "microsoft/phi-4".to_string(),
        "google/gemma-3-4b-it".to_string(),
        "anthropic/claude-4-sonnet".to_string(),
        "deepseek-ai/DeepSeek-V3.1".to_string(),
    ]
}

fn default_stream_model() -> String {
    "gpt-4o-mini".to_string()
}

impl DispatchConfig {
    pub fn timeout(&self) -> Duration {
        secs_to_duration(self.timeout_secs).unwrap_or(Duration::from_secs(60))
    }

    pub fn probe_timeout(&self) -> Duration {
        secs_to_duration(self.probe_timeout_secs).unwrap_or(Duration::from_secs(8))
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_dispatch_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            probe_models: default_probe_models(),
            probe_interval_secs: 0,
            default_stream_model: default_stream_model(),
        }
    }
}

/// Convert a user-supplied number of seconds into a positive `Duration`
pub fn secs_to_duration(secs: f64) -> Option<Duration> {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).ok()
    } else {
        None
    }
}

/// Wire protocol spoken by a provider
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolType {
    #[default]
    OpenAI,
    Anthropic,
}

impl std::fmt::Display for ProtocolType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolType::OpenAI => write!(f, "openai"),
            ProtocolType::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Authentication for a provider
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProviderAuth {
    /// Environment variable holding the API key
    #[serde(default)]
    pub token_env: Option<String>,
    /// Custom header name; bearer authorization when unset
    #[serde(default)]
    pub header_name: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// A provider definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    pub name: String,

    #[serde(default)]
    pub protocol: ProtocolType,

    pub endpoints: Vec<String>,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub auth: ProviderAuth,

    /// Transport-level timeout for the HTTP client
    #[serde(default = "default_provider_timeout")]
    pub timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_provider_timeout() -> u64 {
    120_000
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            protocol: ProtocolType::default(),
            endpoints: vec![],
            enabled: true,
            auth: ProviderAuth::default(),
            timeout_ms: default_provider_timeout(),
        }
    }
}

/// A model and the providers able to serve it, in preference order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelRoute {
    pub id: String,
    pub providers: Vec<String>,
}

/// Image generation catalog
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub provider: Option<ProviderConfig>,
    #[serde(default = "default_image_timeout")]
    pub timeout_secs: f64,
}

fn default_image_timeout() -> f64 {
    120.0
}

impl ImageConfig {
    pub fn timeout(&self) -> Duration {
        secs_to_duration(self.timeout_secs).unwrap_or(Duration::from_secs(120))
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            models: vec![],
            provider: None,
            timeout_secs: default_image_timeout(),
        }
    }
}

/// YAML provider catalog file structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub version: String,

    /// Provider used when a routed provider name has no definition
    #[serde(default)]
    pub fallback_provider: Option<String>,

    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub models: Vec<ModelRoute>,

    #[serde(default)]
    pub image: ImageConfig,
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_paths("config/gateway.yaml", Some("config/providers.yaml"))
    }

    /// Load settings from a gateway config file and an optional provider catalog
    pub fn load_from_paths<P: AsRef<Path>>(
        gateway_config: P,
        catalog_config: Option<P>,
    ) -> Result<Self> {
        let gateway_path = gateway_config.as_ref();

        let format = if gateway_path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml")
        {
            FileFormat::Yaml
        } else {
            FileFormat::Toml
        };

        let mut config_builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", 8000)?
            .set_default("server.request_timeout_secs", 180)?
            .set_default("cors.allowed_origins", default_allowed_origins())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.format", default_log_format())?
            .set_default("dispatch.timeout_secs", default_dispatch_timeout())?
            .set_default("dispatch.probe_timeout_secs", default_probe_timeout())?
            .set_default("dispatch.probe_interval_secs", 0)?
            .set_default("dispatch.default_stream_model", default_stream_model())?;

        if gateway_path.exists() {
            config_builder = config_builder.add_source(File::from(gateway_path).format(format));
        }

        config_builder = config_builder.add_source(
            Environment::with_prefix("NEXUS_GATEWAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = config_builder.build()?;
        let mut settings: Settings = config.try_deserialize()?;

        if let Some(catalog_path) = catalog_config {
            let catalog_path = catalog_path.as_ref();
            if catalog_path.exists() {
                settings.catalog = Self::load_catalog_config(catalog_path)?;
            }
        }

        Ok(settings)
    }

    /// Load the provider catalog from a YAML file
    pub fn load_catalog_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "Failed to read provider catalog: {}",
                e
            )))
        })?;

        let catalog: CatalogConfig = serde_yaml::from_str(&content).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "Failed to parse provider catalog: {}",
                e
            )))
        })?;

        Ok(catalog)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(config_error("Server port cannot be 0"));
        }

        let dispatch = &self.dispatch;
        if secs_to_duration(dispatch.timeout_secs).is_none() {
            return Err(config_error("Dispatch timeout must be a positive number of seconds"));
        }
        if secs_to_duration(dispatch.probe_timeout_secs).is_none() {
            return Err(config_error("Probe timeout must be a positive number of seconds"));
        }
        if dispatch.probe_timeout_secs > dispatch.timeout_secs {
            return Err(config_error(format!(
                "Probe timeout ({}s) cannot exceed the dispatch timeout ({}s)",
                dispatch.probe_timeout_secs, dispatch.timeout_secs
            )));
        }

        if secs_to_duration(self.catalog.image.timeout_secs).is_none() {
            return Err(config_error("Image timeout must be a positive number of seconds"));
        }

        // The outer HTTP deadline must leave room for the inner ones to fire first
        let request_timeout = self.server.request_timeout_secs as f64;
        let inner_ceiling = dispatch.timeout_secs.max(self.catalog.image.timeout_secs);
        if request_timeout <= inner_ceiling {
            return Err(config_error(format!(
                "Request timeout ({}s) must exceed the dispatch and image timeouts ({}s)",
                self.server.request_timeout_secs, inner_ceiling
            )));
        }

        let mut declared = HashSet::new();
        for provider in &self.catalog.providers {
            validate_provider(provider)?;
            if !declared.insert(provider.name.as_str()) {
                return Err(config_error(format!(
                    "Provider '{}' is declared more than once",
                    provider.name
                )));
            }
        }

        if let Some(fallback) = &self.catalog.fallback_provider {
            if !declared.contains(fallback.as_str()) {
                return Err(config_error(format!(
                    "Fallback provider '{}' is not declared",
                    fallback
                )));
            }
        }

        for route in &self.catalog.models {
            if route.providers.is_empty() {
                return Err(config_error(format!(
                    "Model '{}' must list at least one provider",
                    route.id
                )));
            }
            if self.catalog.fallback_provider.is_none() {
                if let Some(missing) = route
                    .providers
                    .iter()
                    .find(|p| !declared.contains(p.as_str()))
                {
                    return Err(config_error(format!(
                        "Model '{}' routes to undeclared provider '{}' and no fallback provider is set",
                        route.id, missing
                    )));
                }
            }
        }

        if let Some(image_provider) = &self.catalog.image.provider {
            validate_provider(image_provider)?;
        }

        Ok(())
    }

    /// Get enabled providers
    pub fn get_enabled_providers(&self) -> Vec<&ProviderConfig> {
        self.catalog.providers.iter().filter(|p| p.enabled).collect()
    }
}

fn validate_provider(provider: &ProviderConfig) -> Result<()> {
    if provider.name.is_empty() {
        return Err(config_error("Provider name cannot be empty"));
    }
    if provider.endpoints.is_empty() {
        return Err(config_error(format!(
            "Provider '{}' must have at least one endpoint",
            provider.name
        )));
    }
    Ok(())
}

fn config_error(message: impl Into<String>) -> AppError {
    AppError::Config(config::ConfigError::Message(message.into()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                request_timeout_secs: default_request_timeout(),
            },
            cors: CorsConfig {
                allowed_origins: default_allowed_origins(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            dispatch: DispatchConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}
