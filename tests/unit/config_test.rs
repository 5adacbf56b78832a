//! Unit tests for configuration module

use nexus_gateway::config::{ModelRoute, ProtocolType, ProviderConfig, Settings};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn provider(name: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        endpoints: vec!["http://localhost:8001/v1".to_string()],
        ..Default::default()
    }
}

#[test]
fn test_default_settings() {
    let settings = Settings::default();

    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.server.port, 8000);
    assert_eq!(settings.dispatch.timeout(), Duration::from_secs(60));
    assert_eq!(settings.dispatch.probe_timeout(), Duration::from_secs(8));
    assert_eq!(settings.dispatch.default_stream_model, "gpt-4o-mini");
    assert_eq!(
        settings.dispatch.probe_models,
        vec![
            "microsoft/phi-4",
            "google/gemma-3-4b-it",
            "anthropic/claude-4-sonnet",
            "deepseek-ai/DeepSeek-V3.1",
        ]
    );
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_validation_invalid_port() {
    let mut settings = Settings::default();
    settings.server.port = 0;
    assert!(settings.validate().is_err());
}

#[test]
fn test_probe_timeout_cannot_exceed_dispatch_timeout() {
    let mut settings = Settings::default();
    settings.dispatch.timeout_secs = 5.0;
    settings.dispatch.probe_timeout_secs = 8.0;
    assert!(settings.validate().is_err());

    settings.dispatch.probe_timeout_secs = 0.0;
    assert!(settings.validate().is_err());
}

#[test]
fn test_request_timeout_must_exceed_inner_timeouts() {
    let mut settings = Settings::default();
    settings.server.request_timeout_secs = 0;
    assert!(settings.validate().is_err());

    // Below the dispatch ceiling
    settings.server.request_timeout_secs = 1;
    settings.dispatch.timeout_secs = 2.0;
    settings.dispatch.probe_timeout_secs = 1.0;
    settings.catalog.image.timeout_secs = 1.0;
    assert!(settings.validate().is_err());

    // Equal is not enough either
    settings.server.request_timeout_secs = 2;
    assert!(settings.validate().is_err());

    settings.server.request_timeout_secs = 3;
    assert!(settings.validate().is_ok());

    // Below the image timeout
    settings.catalog.image.timeout_secs = 5.0;
    assert!(settings.validate().is_err());
}

#[test]
fn test_image_timeout_must_be_positive() {
    let mut settings = Settings::default();
    settings.catalog.image.timeout_secs = 0.0;
    assert!(settings.validate().is_err());

    settings.catalog.image.timeout_secs = -3.0;
    assert!(settings.validate().is_err());
}

#[test]
fn test_route_to_undeclared_provider_requires_fallback() {
    let mut settings = Settings::default();
    settings.catalog.providers = vec![provider("deepinfra")];
    settings.catalog.models = vec![ModelRoute {
        id: "gpt-4".to_string(),
        providers: vec!["openai".to_string()],
    }];
    assert!(settings.validate().is_err());

    settings.catalog.fallback_provider = Some("deepinfra".to_string());
    assert!(settings.validate().is_ok());

    settings.catalog.fallback_provider = Some("missing".to_string());
    assert!(settings.validate().is_err());
}

#[test]
fn test_duplicate_and_empty_providers_rejected() {
    let mut settings = Settings::default();
    settings.catalog.providers = vec![provider("groq"), provider("groq")];
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    let mut empty = provider("groq");
    empty.endpoints.clear();
    settings.catalog.providers = vec![empty];
    assert!(settings.validate().is_err());

    let mut settings = Settings::default();
    settings.catalog.providers = vec![provider("groq")];
    settings.catalog.models = vec![ModelRoute {
        id: "llama-3.1-8b".to_string(),
        providers: vec![],
    }];
    assert!(settings.validate().is_err());
}

#[test]
fn test_load_from_files() {
    let gateway = yaml_file(
        r#"
server:
  port: 9100
logging:
  level: debug
  format: pretty
dispatch:
  timeout_secs: 30
  probe_timeout_secs: 2.5
  probe_models:
    - "gpt-4o"
"#,
    );
    let catalog = yaml_file(
        r#"
version: "1.0"
fallback_provider: deepinfra
providers:
  - name: deepinfra
    endpoints: ["https://api.deepinfra.com/v1/openai"]
    auth:
      token_env: DEEPINFRA_API_KEY
  - name: anthropic
    protocol: anthropic
    endpoints: ["https://api.anthropic.com/v1"]
    auth:
      header_name: x-api-key
models:
  - id: "meta-llama/Llama-3.3-70B-Instruct"
    providers: ["deepinfra"]
  - id: "claude-3-haiku"
    providers: ["anthropic", "deepinfra"]
image:
  models: ["flux", "sdxl"]
"#,
    );

    let settings = Settings::load_from_paths(gateway.path(), Some(catalog.path())).unwrap();

    assert_eq!(settings.server.port, 9100);
    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.logging.format, "pretty");
    assert_eq!(settings.dispatch.timeout(), Duration::from_secs(30));
    assert_eq!(settings.dispatch.probe_timeout(), Duration::from_millis(2500));
    assert_eq!(settings.dispatch.probe_models, vec!["gpt-4o"]);

    let catalog = &settings.catalog;
    assert_eq!(catalog.fallback_provider.as_deref(), Some("deepinfra"));
    assert_eq!(catalog.providers.len(), 2);
    assert_eq!(catalog.providers[1].protocol, ProtocolType::Anthropic);
    assert_eq!(catalog.providers[0].timeout_ms, 120_000);
    assert!(catalog.providers[0].enabled);
    // Model ids keep their dots and slashes
    assert_eq!(catalog.models[0].id, "meta-llama/Llama-3.3-70B-Instruct");
    assert_eq!(catalog.models[1].providers, vec!["anthropic", "deepinfra"]);
    assert_eq!(catalog.image.models, vec!["flux", "sdxl"]);
    assert_eq!(catalog.image.timeout(), Duration::from_secs(120));

    assert!(settings.validate().is_ok());
    assert_eq!(settings.get_enabled_providers().len(), 2);
}

#[test]
fn test_missing_files_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let gateway = dir.path().join("gateway.yaml");
    let catalog = dir.path().join("providers.yaml");

    let settings = Settings::load_from_paths(gateway, Some(catalog)).unwrap();
    assert_eq!(settings.server.port, 8000);
    assert!(settings.catalog.models.is_empty());
}

#[test]
fn test_malformed_catalog_is_an_error() {
    let catalog = yaml_file("providers: [this is: not valid");
    assert!(Settings::load_catalog_config(catalog.path()).is_err());
}
