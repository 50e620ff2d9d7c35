use crate::types::{ApiError, ChatRequest, ChatResponse, TranscribeResponse};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tower_http::cors::CorsLayer;
use uuid::Uuid;
use vesi_core::{InputOrigin, Utterance, VesiConfig};
use vesi_reasoning::TurnReply;
use vesi_voice::{
    decode_wav, encode_wav, SpeakOptions, SpeechToText, TextToSpeech, TranscribeOptions,
};

type PendingMap = Arc<RwLock<HashMap<Uuid, oneshot::Sender<TurnReply>>>>;

/// Speech collaborators. Either side may be missing; the matching
/// endpoint then answers 503 (transcribe) or omits the audio link (chat).
#[derive(Clone, Default)]
pub struct VoiceServices {
    pub stt: Option<Arc<dyn SpeechToText>>,
    pub tts: Option<Arc<dyn TextToSpeech>>,
    pub transcribe: TranscribeOptions,
    pub speak: SpeakOptions,
}

/// Most recent synthesized reply. Older clips are dropped when a new one lands.
#[derive(Clone)]
struct StoredClip {
    id: Uuid,
    wav: Bytes,
}

#[derive(Clone)]
struct AppState {
    /// Session inbox shared with the other input sources.
    inbox: mpsc::Sender<Utterance>,
    /// Requests waiting for their turn to finish.
    pending: PendingMap,
    voice: VoiceServices,
    latest_audio: Arc<RwLock<Option<StoredClip>>>,
    public_base: String,
    reply_timeout: Duration,
}

/// HTTP front end for the session.
///
/// - `GET /health`
/// - `POST /transcribe` multipart audio file → `{text}`
/// - `POST /chat` `{message}` → `{text, mood, audio_url}`
/// - `GET /audio/:id` latest synthesized reply as WAV
pub struct GatewayServer {
    inbox: mpsc::Sender<Utterance>,
    replies: broadcast::Receiver<TurnReply>,
    voice: VoiceServices,
    public_base: String,
    host: String,
    port: u16,
    max_upload_bytes: usize,
    reply_timeout: Duration,
}

impl GatewayServer {
    /// `replies` must be subscribed before the session loop starts.
    pub fn new(
        inbox: mpsc::Sender<Utterance>,
        replies: broadcast::Receiver<TurnReply>,
        config: &VesiConfig,
    ) -> Self {
        Self {
            inbox,
            replies,
            voice: VoiceServices::default(),
            public_base: config.gateway.public_base(),
            host: config.gateway.host.clone(),
            port: config.gateway.port,
            max_upload_bytes: config.gateway.max_upload_bytes,
            reply_timeout: config.reply_timeout(),
        }
    }

    pub fn with_voice(mut self, voice: VoiceServices) -> Self {
        self.voice = voice;
        self
    }

    /// Spawn the reply dispatcher and build the router.
    pub fn into_router(self) -> Router {
        let pending: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        tokio::spawn(dispatch_replies(self.replies, pending.clone()));

        let state = AppState {
            inbox: self.inbox,
            pending,
            voice: self.voice,
            latest_audio: Arc::new(RwLock::new(None)),
            public_base: self.public_base,
            reply_timeout: self.reply_timeout,
        };

        Router::new()
            .route("/health", get(health))
            .route(
                "/transcribe",
                post(transcribe).layer(DefaultBodyLimit::max(self.max_upload_bytes)),
            )
            .route("/chat", post(chat))
            .route("/audio/:id", get(audio))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let app = self.into_router();

        tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Gateway failed to bind {}: {}", addr, e);
                    return;
                }
            };
            tracing::info!("Gateway listening on {}", addr);
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Gateway server error: {}", e);
            }
        })
    }
}

/// Route HTTP-origin replies to the request waiting for them.
async fn dispatch_replies(mut replies: broadcast::Receiver<TurnReply>, pending: PendingMap) {
    loop {
        match replies.recv().await {
            Ok(reply) => {
                if reply.origin != InputOrigin::Http {
                    continue;
                }
                if let Some(tx) = pending.write().await.remove(&reply.request_id) {
                    let _ = tx.send(reply);
                } else {
                    tracing::debug!("Reply for unknown request_id {}", reply.request_id);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!("Gateway dispatcher lagged, {} replies dropped", n);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    // Session is gone: fail whatever is still waiting
    pending.write().await.clear();
}

// ============================================================================
// Route handlers
// ============================================================================

async fn health() -> &'static str {
    "ok"
}

/// POST /transcribe: first file field is decoded as WAV and transcribed
/// with the persona's bias prompt.
async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let stt = state
        .voice
        .stt
        .clone()
        .ok_or_else(|| ApiError::unavailable("transcription is not configured"))?;

    let mut upload: Option<Bytes> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(e.status(), format!("bad multipart body: {}", e)))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::new(e.status(), format!("bad upload: {}", e)))?;
            upload = Some(data);
            break;
        }
    }
    let upload = upload.ok_or_else(|| ApiError::bad_request("missing audio file"))?;

    let clip = decode_wav(&upload).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let text = stt
        .transcribe(&clip, &state.voice.transcribe)
        .await
        .map_err(|e| {
            tracing::warn!("Transcription failed: {}", e);
            ApiError::upstream(e.to_string())
        })?;

    tracing::info!("Transcribed upload: {}", text);
    Ok(Json(TranscribeResponse { text }))
}

/// POST /chat: queue the message as a turn, wait for its reply, then
/// optionally voice it.
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("message is empty"));
    }

    let utterance = Utterance::new(InputOrigin::Http, message);
    let request_id = utterance.id;

    let (tx, rx) = oneshot::channel();
    state.pending.write().await.insert(request_id, tx);

    if state.inbox.send(utterance).await.is_err() {
        state.pending.write().await.remove(&request_id);
        return Err(ApiError::unavailable("session is not running"));
    }

    let reply = match tokio::time::timeout(state.reply_timeout, rx).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(_)) => return Err(ApiError::unavailable("session ended")),
        Err(_) => {
            state.pending.write().await.remove(&request_id);
            tracing::warn!(
                "Turn {} still running after {:?}; its reply will be dropped",
                request_id,
                state.reply_timeout
            );
            return Err(ApiError::new(StatusCode::GATEWAY_TIMEOUT, "turn timed out"));
        }
    };

    if reply.closing {
        return Err(ApiError::unavailable("session ended"));
    }
    if let Some(err) = reply.error {
        return Err(ApiError::upstream(err));
    }

    let audio_url = speak(&state, &reply.text).await;
    Ok(Json(ChatResponse {
        text: reply.text,
        mood: reply.mood,
        audio_url,
    }))
}

/// Synthesize and store the reply; any failure just means no audio link.
async fn speak(state: &AppState, text: &str) -> Option<String> {
    let tts = state.voice.tts.as_ref()?;
    if text.is_empty() {
        return None;
    }
    let clip = match tts.synthesize(text, &state.voice.speak).await {
        Ok(clip) => clip,
        Err(e) => {
            tracing::warn!("Speech synthesis failed: {}", e);
            return None;
        }
    };
    let wav = match encode_wav(&clip) {
        Ok(wav) => wav,
        Err(e) => {
            tracing::warn!("Failed to encode reply audio: {}", e);
            return None;
        }
    };

    // Fresh id per reply so browsers never replay a cached clip
    let id = Uuid::new_v4();
    *state.latest_audio.write().await = Some(StoredClip {
        id,
        wav: Bytes::from(wav),
    });
    Some(format!("{}/audio/{}", state.public_base, id))
}

/// GET /audio/:id: only the latest clip is kept.
async fn audio(State(state): State<AppState>, Path(id): Path<Uuid>) -> Response {
    let latest = state.latest_audio.read().await.clone();
    match latest {
        Some(clip) if clip.id == id => (
            [
                (header::CONTENT_TYPE, "audio/wav"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            clip.wav,
        )
            .into_response(),
        _ => ApiError::new(StatusCode::NOT_FOUND, "audio not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn test_dispatcher_ignores_other_origins_and_clears_on_close() {
        let (tx, rx) = broadcast::channel(4);
        let pending: PendingMap = Arc::new(RwLock::new(HashMap::new()));
        let (wait_tx, _wait_rx) = oneshot::channel();
        pending.write().await.insert(Uuid::new_v4(), wait_tx);

        let handle = tokio::spawn(dispatch_replies(rx, pending.clone()));
        drop(tx);
        handle.await.unwrap();
        assert!(pending.read().await.is_empty());
    }
}
