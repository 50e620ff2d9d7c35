use crate::audio::AudioClip;
use crate::error::VoiceError;
use async_trait::async_trait;

/// Hints passed with every transcription.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscribeOptions {
    /// ISO-639-1 language code, e.g. `en`.
    pub language: Option<String>,
    /// Biases the decoder toward names and jargon it would otherwise mangle.
    pub initial_prompt: Option<String>,
}

#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(
        &self,
        clip: &AudioClip,
        options: &TranscribeOptions,
    ) -> Result<String, VoiceError>;

    fn provider_name(&self) -> &'static str;
}
