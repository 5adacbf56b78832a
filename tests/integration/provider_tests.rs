//! HTTP provider integration tests against a mock upstream

use nexus_gateway::config::{ProtocolType, ProviderAuth, ProviderConfig};
use nexus_gateway::gateway::types::{GenerationParams, Message, Role};
use nexus_gateway::provider::{
    create_image_provider, create_provider, CompletionRequest, ImageRequest, ProviderError,
    ProviderRegistry,
};
use nexus_gateway::gateway::Dispatcher;
use nexus_gateway::DispatchError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider_config(name: &str, protocol: ProtocolType, endpoints: Vec<String>) -> ProviderConfig {
    ProviderConfig {
        name: name.to_string(),
        protocol,
        endpoints,
        auth: ProviderAuth {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        },
        timeout_ms: 5_000,
        ..Default::default()
    }
}

fn chat_request(model: &str) -> CompletionRequest {
    CompletionRequest {
        model: model.to_string(),
        messages: vec![
            Message::new(Role::System, "be brief"),
            Message::user("hi"),
        ],
        params: GenerationParams::from_options(Some(0.0), Some(10)),
    }
}

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_openai_compatible_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 10,
            "stream": false,
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hi"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let config = provider_config("openai", ProtocolType::OpenAI, vec![format!("{}/v1", server.uri())]);
    let provider = create_provider(&config).unwrap();
    assert_eq!(provider.name(), "openai");
    assert_eq!(provider.protocol(), "openai");

    let reply = provider.complete(chat_request("gpt-4o-mini")).await.unwrap();
    assert_eq!(reply, "hello");
}

#[tokio::test]
async fn test_anthropic_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({
            "model": "claude-3-haiku",
            "system": "be brief",
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                {"type": "text", "text": "hel"},
                {"type": "text", "text": "lo"}
            ],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = provider_config("anthropic", ProtocolType::Anthropic, vec![format!("{}/v1", server.uri())]);
    config.auth.header_name = Some("x-api-key".to_string());

    let provider = create_provider(&config).unwrap();
    let reply = provider.complete(chat_request("claude-3-haiku")).await.unwrap();
    assert_eq!(reply, "hello");
}

#[tokio::test]
async fn test_upstream_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let provider = create_provider(&provider_config("groq", ProtocolType::OpenAI, vec![server.uri()])).unwrap();
    let err = provider.complete(chat_request("llama-3.1-8b")).await.unwrap_err();

    match err {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_choices_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let provider = create_provider(&provider_config("groq", ProtocolType::OpenAI, vec![server.uri()])).unwrap();
    let err = provider.complete(chat_request("llama-3.1-8b")).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_requests_rotate_across_endpoints() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for (server, reply) in [(&first, "one"), (&second, "two")] {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(reply)))
            .expect(2)
            .mount(server)
            .await;
    }

    let config = provider_config("deepinfra", ProtocolType::OpenAI, vec![first.uri(), second.uri()]);
    let provider = create_provider(&config).unwrap();

    let mut replies = Vec::new();
    for _ in 0..4 {
        replies.push(provider.complete(chat_request("microsoft/phi-4")).await.unwrap());
    }
    assert_eq!(replies, vec!["one", "two", "one", "two"]);
}

#[tokio::test]
async fn test_dispatch_timeout_against_slow_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("too late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let provider = create_provider(&provider_config("deepinfra", ProtocolType::OpenAI, vec![server.uri()])).unwrap();
    let registry = Arc::new(
        ProviderRegistry::builder()
            .provider("deepinfra", provider)
            .model("microsoft/phi-4", ["deepinfra"])
            .build()
            .unwrap(),
    );
    let dispatcher = Dispatcher::with_timeout(registry, Duration::from_millis(200));

    let err = dispatcher
        .dispatch(
            "microsoft/phi-4",
            None,
            &[Message::user("hi")],
            &GenerationParams::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err, DispatchError::Timeout(Duration::from_millis(200)));
}

#[tokio::test]
async fn test_image_generation_returns_url_or_data_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({"model": "flux", "prompt": "a red fox"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1,
            "data": [{"url": "https://images.example/fox.png"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/images/generations"))
        .and(body_partial_json(json!({"model": "sdxl"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1,
            "data": [{"b64_json": "aGVsbG8="}]
        })))
        .mount(&server)
        .await;

    let provider =
        create_image_provider(&provider_config("images", ProtocolType::OpenAI, vec![server.uri()])).unwrap();

    let request = |model: &str| ImageRequest {
        model: model.to_string(),
        prompt: "a red fox".to_string(),
        width: 512,
        height: 512,
        quality: "standard".to_string(),
        style: "vivid".to_string(),
    };

    let url = provider.generate(request("flux")).await.unwrap();
    assert_eq!(url, "https://images.example/fox.png");

    let url = provider.generate(request("sdxl")).await.unwrap();
    assert_eq!(url, "data:image/png;base64,aGVsbG8=");
}

#[test]
fn test_anthropic_cannot_generate_images() {
    let config = provider_config("anthropic", ProtocolType::Anthropic, vec!["http://localhost:1".to_string()]);
    assert!(create_image_provider(&config).is_err());
}
