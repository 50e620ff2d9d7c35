//! Transcription through an OpenAI-compatible `/audio/transcriptions`
//! endpoint (faster-whisper-server, speaches, whisper.cpp server).

use crate::audio::{encode_wav, AudioClip};
use crate::error::VoiceError;
use crate::stt::{SpeechToText, TranscribeOptions};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const SERVICE: &str = "Transcription server";

#[derive(Debug, Clone)]
pub struct WhisperClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl WhisperClient {
    pub fn new(base_url: &str, model: &str) -> Result<Self, VoiceError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    fn form(&self, wav: Vec<u8>, options: &TranscribeOptions) -> Result<Form, VoiceError> {
        let file = Part::bytes(wav)
            .file_name("speech.wav")
            .mime_str("audio/wav")?;
        let mut form = Form::new()
            .part("file", file)
            .text("model", self.model.clone())
            .text("response_format", "json");
        if let Some(ref lang) = options.language {
            form = form.text("language", lang.clone());
        }
        if let Some(ref prompt) = options.initial_prompt {
            form = form.text("prompt", prompt.clone());
        }
        Ok(form)
    }
}

#[async_trait]
impl SpeechToText for WhisperClient {
    async fn transcribe(
        &self,
        clip: &AudioClip,
        options: &TranscribeOptions,
    ) -> Result<String, VoiceError> {
        let wav = encode_wav(clip)?;
        tracing::debug!(
            "Transcribing {:.1}s of audio with {}",
            clip.duration_secs(),
            self.model
        );

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .multipart(self.form(wav, options)?)
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

        let parsed: TranscriptionResponse =
            response
                .json()
                .await
                .map_err(|e| VoiceError::InvalidResponse {
                    service: SERVICE,
                    detail: e.to_string(),
                })?;
        Ok(parsed.text.trim().to_string())
    }

    fn provider_name(&self) -> &'static str {
        "whisper-http"
    }
}
