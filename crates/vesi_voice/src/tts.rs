use crate::audio::AudioClip;
use crate::error::VoiceError;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq)]
pub struct SpeakOptions {
    pub voice: String,
    pub speed: f32,
    /// Phonemizer language, e.g. `en-us`.
    pub lang_tag: String,
}

impl Default for SpeakOptions {
    fn default() -> Self {
        Self {
            voice: "af_bella".to_string(),
            speed: 1.1,
            lang_tag: "en-us".to_string(),
        }
    }
}

#[async_trait]
pub trait TextToSpeech: Send + Sync {
    async fn synthesize(&self, text: &str, options: &SpeakOptions) -> Result<AudioClip, VoiceError>;

    fn provider_name(&self) -> &'static str;
}
