//! Speech through Kokoro-FastAPI's OpenAI-compatible `/audio/speech`.
//!
//! Requests raw PCM so no container parsing is needed on the way back.

use crate::audio::{decode_pcm16, AudioClip};
use crate::error::VoiceError;
use crate::tts::{SpeakOptions, TextToSpeech};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const SERVICE: &str = "Speech server";

#[derive(Debug, Clone)]
pub struct KokoroClient {
    client: Client,
    base_url: String,
    model: String,
    sample_rate: u32,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    speed: f32,
    response_format: &'static str,
    lang_code: &'a str,
}

impl KokoroClient {
    pub fn new(base_url: &str, model: &str, sample_rate: u32) -> Result<Self, VoiceError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            sample_rate,
        })
    }
}

/// Kokoro takes the short language code (`a` for American English).
fn lang_code(tag: &str) -> &str {
    match tag.to_ascii_lowercase().as_str() {
        "en-us" => "a",
        "en-gb" => "b",
        "es" => "e",
        "fr-fr" | "fr" => "f",
        "ja" => "j",
        "zh" => "z",
        _ => tag,
    }
}

#[async_trait]
impl TextToSpeech for KokoroClient {
    async fn synthesize(&self, text: &str, options: &SpeakOptions) -> Result<AudioClip, VoiceError> {
        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &options.voice,
            speed: options.speed,
            response_format: "pcm",
            lang_code: lang_code(&options.lang_tag),
        };
        tracing::debug!(
            "Speech request: voice={}, speed={}, text_len={}",
            options.voice,
            options.speed,
            text.len()
        );

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VoiceError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(VoiceError::InvalidResponse {
                service: SERVICE,
                detail: "empty audio body".to_string(),
            });
        }
        Ok(decode_pcm16(&bytes, self.sample_rate))
    }

    fn provider_name(&self) -> &'static str {
        "kokoro-http"
    }
}
