use serde::{Deserialize, Serialize};
use vesi_core::config::LlmConfig;

/// Per-request sampling settings. Everything but `temperature` comes
/// straight from `[llm]`; the temperature is whatever the mood loop says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

impl SamplingParams {
    pub fn from_config(cfg: &LlmConfig) -> Self {
        Self {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            frequency_penalty: cfg.frequency_penalty,
            presence_penalty: cfg.presence_penalty,
            max_tokens: cfg.max_tokens,
            stop: cfg.stop.clone(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// Full (non-streaming) reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub stop_reason: Option<String>,
}

/// Events emitted while a reply is being generated.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// One generated fragment.
    TextDelta(String),
    /// Generation finished normally.
    Done { stop_reason: Option<String> },
    /// Transport or server error mid-stream. Nothing follows it.
    Error(String),
}
