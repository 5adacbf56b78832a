//! Functional tests for the dispatch engine and image generation

#[path = "../common/mod.rs"]
mod common;

use common::{two_provider_registry, StubImageProvider, StubProvider};
use nexus_gateway::gateway::types::{GenerationParams, Message};
use nexus_gateway::gateway::{Dispatcher, ImageGenerator, DEFAULT_DISPATCH_TIMEOUT};
use nexus_gateway::provider::ImageRequest;
use nexus_gateway::DispatchError;
use std::sync::Arc;
use std::time::Duration;

fn hi() -> Vec<Message> {
    vec![Message::user("hi")]
}

#[tokio::test]
async fn test_dispatch_uses_default_provider() {
    let p1 = StubProvider::new("p1").reply("hello").shared();
    let p2 = StubProvider::new("p2").reply("other").shared();
    let dispatcher = Dispatcher::new(two_provider_registry(p1.clone(), p2.clone()));

    let result = dispatcher
        .dispatch("modelA", None, &hi(), &GenerationParams::default())
        .await
        .unwrap();

    assert_eq!(result.text, "hello");
    assert_eq!(result.provider_used, "p1");
    assert_eq!(p1.calls(), 1);
    assert_eq!(p2.calls(), 0);
    assert_eq!(dispatcher.timeout(), DEFAULT_DISPATCH_TIMEOUT);
}

#[tokio::test]
async fn test_dispatch_explicit_provider() {
    let p1 = StubProvider::new("p1").shared();
    let p2 = StubProvider::new("p2").reply("from p2").shared();
    let dispatcher = Dispatcher::new(two_provider_registry(p1.clone(), p2.clone()));

    let result = dispatcher
        .dispatch("modelA", Some("p2"), &hi(), &GenerationParams::default())
        .await
        .unwrap();

    assert_eq!(result.text, "from p2");
    assert_eq!(result.provider_used, "p2");
    assert_eq!(p1.calls(), 0);
}

#[tokio::test]
async fn test_dispatch_unknown_model_makes_no_calls() {
    let p1 = StubProvider::new("p1").shared();
    let p2 = StubProvider::new("p2").shared();
    let dispatcher = Dispatcher::new(two_provider_registry(p1.clone(), p2.clone()));

    for model in ["modelX", "", "MODELA"] {
        let err = dispatcher
            .dispatch(model, None, &hi(), &GenerationParams::default())
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::UnknownModel(model.to_string()));
    }

    assert_eq!(p1.calls() + p2.calls(), 0);
}

#[tokio::test]
async fn test_dispatch_unsupported_provider() {
    let p1 = StubProvider::new("p1").shared();
    let p2 = StubProvider::new("p2").shared();
    let dispatcher = Dispatcher::new(two_provider_registry(p1.clone(), p2.clone()));

    let err = dispatcher
        .dispatch("modelA", Some("p3"), &hi(), &GenerationParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::UnsupportedProvider { .. }));
    assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(p1.calls() + p2.calls(), 0);
}

#[tokio::test]
async fn test_dispatch_failure_is_not_retried() {
    let p1 = StubProvider::new("p1").failing("rate limited").shared();
    let p2 = StubProvider::new("p2").shared();
    let dispatcher = Dispatcher::new(two_provider_registry(p1.clone(), p2.clone()));

    let err = dispatcher
        .dispatch("modelA", None, &hi(), &GenerationParams::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DispatchError::ProviderFailure {
            message: "rate limited".to_string()
        }
    );
    assert_eq!(err.to_string(), "Error generating response: rate limited");
    assert_eq!(p1.calls(), 1);
    assert_eq!(p2.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_timeout() {
    let p1 = StubProvider::new("p1").delay(Duration::from_secs(120)).shared();
    let p2 = StubProvider::new("p2").shared();
    let dispatcher = Dispatcher::with_timeout(two_provider_registry(p1.clone(), p2), Duration::from_secs(2));

    let err = dispatcher
        .dispatch("modelA", None, &hi(), &GenerationParams::default())
        .await
        .unwrap_err();

    assert_eq!(err, DispatchError::Timeout(Duration::from_secs(2)));
    assert_eq!(err.status_code(), axum::http::StatusCode::REQUEST_TIMEOUT);

    tokio::time::sleep(Duration::from_secs(200)).await;
    assert_eq!(p1.completed(), 0);
}

#[tokio::test]
async fn test_dispatch_forwards_params() {
    let p1 = StubProvider::new("p1").shared();
    let dispatcher = Dispatcher::new(two_provider_registry(p1.clone(), StubProvider::new("p2").shared()));

    let params = GenerationParams::from_options(Some(0.2), Some(64));
    dispatcher.dispatch("modelA", None, &hi(), &params).await.unwrap();

    let request = p1.last_request().unwrap();
    assert_eq!(request.params, params);
    assert_eq!(request.messages, hi());
}

fn image_request(model: &str) -> ImageRequest {
    ImageRequest {
        model: model.to_string(),
        prompt: "a lighthouse at dusk".to_string(),
        width: 1024,
        height: 1024,
        quality: "standard".to_string(),
        style: "vivid".to_string(),
    }
}

fn image_generator(delay: Duration, timeout: Duration) -> ImageGenerator {
    let mut provider = StubImageProvider::new("images", "https://cdn.example/1.png");
    provider.delay = delay;
    ImageGenerator::new(
        vec!["flux".to_string(), "sdxl".to_string()],
        Some(Arc::new(provider)),
        timeout,
    )
}

#[tokio::test]
async fn test_image_generation() {
    let generator = image_generator(Duration::ZERO, Duration::from_secs(1));

    let image = generator.generate(image_request("flux"), None).await.unwrap();
    assert_eq!(image.image_url, "https://cdn.example/1.png");
    assert_eq!(image.provider, "images");

    let image = generator
        .generate(image_request("sdxl"), Some("images"))
        .await
        .unwrap();
    assert_eq!(image.provider, "images");
}

#[tokio::test]
async fn test_image_generation_validation() {
    let generator = image_generator(Duration::ZERO, Duration::from_secs(1));

    let err = generator.generate(image_request("dall-e"), None).await.unwrap_err();
    assert_eq!(err, DispatchError::UnknownImageModel("dall-e".to_string()));
    assert_eq!(err.to_string(), "Image model dall-e not available");

    let err = generator
        .generate(image_request("flux"), Some("other"))
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::UnsupportedProvider { .. }));

    let unconfigured = ImageGenerator::new(vec!["flux".to_string()], None, Duration::from_secs(1));
    assert_eq!(unconfigured.provider_name(), "none");
    let err = unconfigured.generate(image_request("flux"), None).await.unwrap_err();
    assert!(matches!(err, DispatchError::ProviderFailure { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_image_generation_timeout() {
    let generator = image_generator(Duration::from_secs(300), Duration::from_secs(120));

    let err = generator.generate(image_request("flux"), None).await.unwrap_err();
    assert_eq!(err, DispatchError::Timeout(Duration::from_secs(120)));
}
