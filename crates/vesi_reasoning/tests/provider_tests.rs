//! OpenAI-compatible client against a mock HTTP server.

use serde_json::json;
use vesi_core::config::LlmConfig;
use vesi_core::Message;
use vesi_reasoning::api_types::{SamplingParams, StreamEvent};
use vesi_reasoning::providers::OpenAiCompatClient;
use vesi_reasoning::ChatModel;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> LlmConfig {
    LlmConfig {
        base_url: format!("{}/v1", server.uri()),
        retry_attempts: 2,
        ..LlmConfig::default()
    }
}

fn sse_body(parts: &[&str]) -> String {
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!(
            "data: {}\n\n",
            json!({"choices": [{"delta": {"content": part}, "finish_reason": null}]})
        ));
    }
    body.push_str(&format!(
        "data: {}\n\ndata: [DONE]\n\n",
        json!({"choices": [{"delta": {}, "finish_reason": "stop"}]})
    ));
    body
}

#[tokio::test]
async fn test_stream_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({"stream": true, "model": "ana-v1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(sse_body(&["Hmph", ", fine."]), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::new(&config(&server)).unwrap();
    let messages = vec![Message::system("You are Vesi."), Message::user("hi")];
    let mut rx = client
        .stream(&messages, &SamplingParams::default())
        .await
        .unwrap();

    let mut text = String::new();
    let mut stop = None;
    while let Some(event) = rx.recv().await {
        match event {
            StreamEvent::TextDelta(d) => text.push_str(&d),
            StreamEvent::Done { stop_reason } => stop = stop_reason,
            StreamEvent::Error(e) => panic!("unexpected stream error: {}", e),
        }
    }
    assert_eq!(text, "Hmph, fine.");
    assert_eq!(stop.as_deref(), Some("stop"));
}

#[tokio::test]
async fn test_complete_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-local"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Baka."}, "finish_reason": "stop"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cfg = LlmConfig {
        api_key: Some("sk-local".into()),
        ..config(&server)
    };
    let client = OpenAiCompatClient::new(&cfg).unwrap();
    let reply = client
        .complete(&[Message::user("hi")], &SamplingParams::default())
        .await
        .unwrap();
    assert_eq!(reply.text, "Baka.");
}

#[tokio::test]
async fn test_retries_once_on_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "Tch."}, "finish_reason": "stop"}]
        })))
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::new(&config(&server)).unwrap();
    let reply = client
        .complete(&[Message::user("hi")], &SamplingParams::default())
        .await
        .unwrap();
    assert_eq!(reply.text, "Tch.");
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiCompatClient::new(&config(&server)).unwrap();
    let err = client
        .complete(&[Message::user("hi")], &SamplingParams::default())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("400"), "got: {}", err);
}
