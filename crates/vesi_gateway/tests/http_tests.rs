//! End-to-end HTTP tests: router + dispatcher + a real session loop driven
//! by a scripted model.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tower::ServiceExt;
use vesi_core::VesiConfig;
use vesi_gateway::{GatewayServer, VoiceServices};
use vesi_memory::InMemoryStore;
use vesi_reasoning::providers::{Script, ScriptedModel};
use vesi_reasoning::session::{inbox, SessionLoop};
use vesi_reasoning::TurnController;
use vesi_voice::{
    encode_wav, AudioClip, SpeakOptions, SpeechToText, TextToSpeech, TranscribeOptions, VoiceError,
};

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeStt {
    prompt_seen: Mutex<Option<String>>,
}

#[async_trait]
impl SpeechToText for FakeStt {
    async fn transcribe(
        &self,
        clip: &AudioClip,
        options: &TranscribeOptions,
    ) -> Result<String, VoiceError> {
        *self.prompt_seen.lock().unwrap() = options.initial_prompt.clone();
        Ok(format!("heard {} samples", clip.samples.len()))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

struct FakeTts;

#[async_trait]
impl TextToSpeech for FakeTts {
    async fn synthesize(&self, _text: &str, _options: &SpeakOptions) -> Result<AudioClip, VoiceError> {
        Ok(AudioClip::new(vec![0.0; 240], 24_000))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn app(model: ScriptedModel, voice: VoiceServices) -> Router {
    app_with_config(model, voice, VesiConfig::default())
}

fn app_with_config(model: ScriptedModel, voice: VoiceServices, config: VesiConfig) -> Router {
    let ctl = Arc::new(TurnController::new(
        Arc::new(model),
        Arc::new(InMemoryStore::new()),
        &config,
    ));
    let session = ctl.open_session(&config);
    let session_loop = SessionLoop::new(ctl);
    let replies = session_loop.subscribe();
    let (tx, rx) = inbox();
    tokio::spawn(async move {
        session_loop.run(session, rx).await;
    });
    GatewayServer::new(tx, replies, &config)
        .with_voice(voice)
        .into_router()
}

fn chat_request(message: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::json!({ "message": message }).to_string()))
        .unwrap()
}

fn multipart_request(file: &[u8]) -> Request<Body> {
    let boundary = "vesi-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"speech.wav\"\r\nContent-Type: audio/wav\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/transcribe")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = app(ScriptedModel::echo(), VoiceServices::default());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chat_runs_a_turn() {
    let model = ScriptedModel::new(vec![Script::fragments(["Hmph", ", fine."])]);
    let app = app(model, VoiceServices::default());

    let response = app.oneshot(chat_request("hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["text"], "Hmph, fine.");
    assert_eq!(json["mood"], 70);
    assert!(json["audio_url"].is_null());
}

#[tokio::test]
async fn test_chat_rejects_empty_message() {
    let app = app(ScriptedModel::echo(), VoiceServices::default());
    let response = app.oneshot(chat_request("   ")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_surfaces_inference_failure() {
    let model = ScriptedModel::new(vec![Script::Fail("model offline".into())]);
    let app = app(model, VoiceServices::default());

    let response = app.oneshot(chat_request("hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_body(response).await;
    assert!(json["error"].as_str().unwrap().contains("model offline"));
}

#[tokio::test]
async fn test_chat_audio_link_serves_latest_clip_only() {
    let voice = VoiceServices {
        tts: Some(Arc::new(FakeTts)),
        ..Default::default()
    };
    let app = app(ScriptedModel::echo(), voice);

    let first = json_body(app.clone().oneshot(chat_request("one")).await.unwrap()).await;
    let first_url = first["audio_url"].as_str().unwrap().to_string();
    assert!(first_url.starts_with("http://localhost:8000/audio/"));

    let second = json_body(app.clone().oneshot(chat_request("two")).await.unwrap()).await;
    let second_url = second["audio_url"].as_str().unwrap().to_string();
    assert_ne!(first_url, second_url);

    let path_of = |url: &str| url.trim_start_matches("http://localhost:8000").to_string();

    let response = app
        .clone()
        .oneshot(Request::builder().uri(path_of(&second_url)).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "audio/wav");
    let bytes = axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    assert_eq!(&bytes[..4], b"RIFF");

    let stale = app
        .oneshot(Request::builder().uri(path_of(&first_url)).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(stale.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transcribe_without_stt_is_unavailable() {
    let app = app(ScriptedModel::echo(), VoiceServices::default());
    let wav = encode_wav(&AudioClip::new(vec![0.0; 100], 16_000)).unwrap();
    let response = app.oneshot(multipart_request(&wav)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_transcribe_decodes_upload() {
    let stt = Arc::new(FakeStt::default());
    let voice = VoiceServices {
        stt: Some(stt.clone()),
        transcribe: TranscribeOptions {
            language: Some("en".into()),
            initial_prompt: Some("Vesi is a girl's name.".into()),
        },
        ..Default::default()
    };
    let app = app(ScriptedModel::echo(), voice);

    let wav = encode_wav(&AudioClip::new(vec![0.0; 100], 16_000)).unwrap();
    let response = app.oneshot(multipart_request(&wav)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["text"], "heard 100 samples");
    assert_eq!(
        stt.prompt_seen.lock().unwrap().as_deref(),
        Some("Vesi is a girl's name.")
    );
}

#[tokio::test]
async fn test_transcribe_rejects_non_wav() {
    let voice = VoiceServices {
        stt: Some(Arc::new(FakeStt::default())),
        ..Default::default()
    };
    let app = app(ScriptedModel::echo(), voice);
    let response = app.oneshot(multipart_request(b"not audio")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_exit_word_does_not_end_session() {
    let model = ScriptedModel::new(vec![
        Script::fragments(["Hmph."]),
        Script::fragments(["Baka!"]),
    ]);
    let app = app(model, VoiceServices::default());

    let response = app.clone().oneshot(chat_request("exit")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["text"], "Hmph.");

    let response = app.oneshot(chat_request("hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["text"], "Baka!");
}

#[tokio::test]
async fn test_transcribe_accepts_long_recording() {
    let voice = VoiceServices {
        stt: Some(Arc::new(FakeStt::default())),
        ..Default::default()
    };
    let app = app(ScriptedModel::echo(), voice);

    // 30 s at 48 kHz mono, well past axum's 2 MB default
    let wav = encode_wav(&AudioClip::new(vec![0.0; 48_000 * 30], 48_000)).unwrap();
    assert!(wav.len() > 2 * 1024 * 1024);
    let response = app.oneshot(multipart_request(&wav)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["text"], "heard 1440000 samples");
}

#[tokio::test]
async fn test_transcribe_enforces_configured_limit() {
    let mut config = VesiConfig::default();
    config.gateway.max_upload_bytes = 1024;
    let voice = VoiceServices {
        stt: Some(Arc::new(FakeStt::default())),
        ..Default::default()
    };
    let app = app_with_config(ScriptedModel::echo(), voice, config);

    let wav = encode_wav(&AudioClip::new(vec![0.0; 4_000], 16_000)).unwrap();
    let response = app.oneshot(multipart_request(&wav)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test(start_paused = true)]
async fn test_chat_times_out_with_configured_wait() {
    let mut config = VesiConfig::default();
    config.gateway.reply_timeout_secs = Some(5);

    // Nobody drains the inbox, so the turn never finishes
    let (tx, _rx) = inbox();
    let (_replies_tx, replies) = broadcast::channel(4);
    let app = GatewayServer::new(tx, replies, &config).into_router();

    let response = app.oneshot(chat_request("hello")).await.unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}
