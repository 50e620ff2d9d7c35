//! OpenAI-compatible chat completions (llama.cpp server, Ollama, vLLM).
//!
//! Streams `/chat/completions` with `stream: true` and turns each SSE
//! chunk's `choices[0].delta.content` into a [`StreamEvent::TextDelta`].

use super::sse::SseBuffer;
use crate::api_types::{CompletionResponse, SamplingParams, StreamEvent};
use crate::llm::ChatModel;
use crate::retry::{send_with_retry, RetryPolicy};
use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::mpsc;
use vesi_core::config::LlmConfig;
use vesi_core::Message;

#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl OpenAiCompatClient {
    pub fn new(cfg: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(cfg.timeout_secs))
                .build()
                .context("Failed to build HTTP client")?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone().filter(|k| !k.is_empty()),
            retry: RetryPolicy::attempts(cfg.retry_attempts),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, payload: &Value) -> Result<reqwest::Response> {
        let url = self.endpoint();
        send_with_retry(&self.retry, "Model server", || {
            let mut req = self.client.post(&url).json(payload);
            if let Some(ref key) = self.api_key {
                req = req.bearer_auth(key);
            }
            req.send()
        })
        .await
    }
}

pub(crate) fn build_payload(
    model: &str,
    messages: &[Message],
    params: &SamplingParams,
    stream: bool,
) -> Value {
    let mut payload = json!({
        "model": model,
        "messages": messages,
        "temperature": params.temperature,
        "top_p": params.top_p,
        "frequency_penalty": params.frequency_penalty,
        "presence_penalty": params.presence_penalty,
        "max_tokens": params.max_tokens,
        "stream": stream,
    });
    if !params.stop.is_empty() {
        payload["stop"] = json!(params.stop);
    }
    payload
}

#[async_trait::async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn complete(
        &self,
        messages: &[Message],
        params: &SamplingParams,
    ) -> Result<CompletionResponse> {
        let payload = build_payload(&self.model, messages, params, false);
        let response = self.send(&payload).await?;
        let resp_json: Value = response
            .json()
            .await
            .context("Model server returned invalid JSON")?;
        parse_completion(&resp_json)
    }

    async fn stream(
        &self,
        messages: &[Message],
        params: &SamplingParams,
    ) -> Result<mpsc::Receiver<StreamEvent>> {
        let payload = build_payload(&self.model, messages, params, true);
        let response = self.send(&payload).await?;

        let (tx, rx) = mpsc::channel(64);
        let byte_stream = response.bytes_stream();
        tokio::spawn(async move {
            if let Err(e) = parse_chat_sse(byte_stream, &tx).await {
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
            }
        });
        Ok(rx)
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Parse a non-streaming `/chat/completions` body.
pub(crate) fn parse_completion(resp_json: &Value) -> Result<CompletionResponse> {
    if let Some(err) = resp_json.get("error") {
        anyhow::bail!("Model server error: {}", error_message(err));
    }
    let choice = resp_json["choices"]
        .get(0)
        .context("Model server response has no choices")?;
    Ok(CompletionResponse {
        text: choice["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        stop_reason: choice["finish_reason"].as_str().map(|s| s.to_string()),
    })
}

fn error_message(err: &Value) -> String {
    err["message"]
        .as_str()
        .map(|s| s.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[derive(Debug, Default, PartialEq)]
struct ChunkUpdate {
    delta: Option<String>,
    finish_reason: Option<String>,
    done: bool,
}

fn parse_chunk(payload: &str) -> Result<ChunkUpdate> {
    if payload == "[DONE]" {
        return Ok(ChunkUpdate {
            done: true,
            ..Default::default()
        });
    }
    let json: Value =
        serde_json::from_str(payload).with_context(|| format!("Bad SSE chunk: {}", payload))?;
    if let Some(err) = json.get("error") {
        anyhow::bail!("Model server error: {}", error_message(err));
    }
    let choice = &json["choices"][0];
    Ok(ChunkUpdate {
        delta: choice["delta"]["content"]
            .as_str()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string()),
        finish_reason: choice["finish_reason"].as_str().map(|s| s.to_string()),
        done: false,
    })
}

/// Pump an SSE byte stream into `tx`.
///
/// Returns early (without error) once the receiver is gone; dropping the
/// byte stream closes the connection, which stops generation server-side.
pub(crate) async fn parse_chat_sse<S>(byte_stream: S, tx: &mpsc::Sender<StreamEvent>) -> Result<()>
where
    S: futures_util::Stream<Item = std::result::Result<bytes::Bytes, reqwest::Error>> + Unpin,
{
    let mut stream = byte_stream;
    let mut buffer = SseBuffer::new();
    let mut stop_reason: Option<String> = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Error reading SSE chunk")?;
        buffer.push_bytes(&chunk);
        for payload in buffer.extract_data() {
            let update = parse_chunk(&payload)?;
            if update.finish_reason.is_some() {
                stop_reason = update.finish_reason;
            }
            if update.done {
                let _ = tx.send(StreamEvent::Done { stop_reason }).await;
                return Ok(());
            }
            if let Some(delta) = update.delta {
                if tx.send(StreamEvent::TextDelta(delta)).await.is_err() {
                    tracing::debug!("Stream receiver dropped, closing connection");
                    return Ok(());
                }
            }
        }
    }

    if let Some(payload) = buffer.finish() {
        let update = parse_chunk(&payload)?;
        if let Some(delta) = update.delta {
            if tx.send(StreamEvent::TextDelta(delta)).await.is_err() {
                return Ok(());
            }
        }
        if update.finish_reason.is_some() {
            stop_reason = update.finish_reason;
        }
    }

    let _ = tx.send(StreamEvent::Done { stop_reason }).await;
    Ok(())
}
