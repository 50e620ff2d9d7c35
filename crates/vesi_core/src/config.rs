use crate::history::{DEFAULT_MAX_TOTAL, DEFAULT_TAIL_SIZE};
use crate::lexicon::{
    Lexicon, DEFAULT_DRIFT_WEIGHT, DEFAULT_REINFORCE_WEIGHT, DRIFT_WORDS, PERSONA_WORDS,
};
use crate::persona::Persona;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VesiConfig {
    pub llm: LlmConfig,
    pub persona: Persona,
    pub mood: MoodConfig,
    pub history: HistoryConfig,
    pub voice: VoiceConfig,
    pub gateway: GatewayConfig,
}

impl VesiConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: VesiConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VESI_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("VESI_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("LLM_MAX_TOKENS") {
            if let Ok(n) = v.parse() {
                self.llm.max_tokens = n;
            }
        }
        if let Ok(v) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(n) = v.parse() {
                self.llm.temperature = n;
            }
        }
        if let Ok(v) = std::env::var("VESI_HISTORY_PATH") {
            self.history.path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("VESI_STT_URL") {
            self.voice.stt_url = Some(v);
        }
        if let Ok(v) = std::env::var("VESI_TTS_URL") {
            self.voice.tts_url = Some(v);
        }
        if let Ok(v) = std::env::var("VESI_GATEWAY_PORT") {
            if let Ok(n) = v.parse() {
                self.gateway.port = n;
            }
        }
    }

    /// Wait budget for one HTTP turn. Every retry attempt may use the full
    /// request timeout.
    pub fn reply_timeout(&self) -> Duration {
        let secs = self.gateway.reply_timeout_secs.unwrap_or_else(|| {
            self.llm.timeout_secs * u64::from(self.llm.retry_attempts.max(1)) + REPLY_MARGIN_SECS
        });
        Duration::from_secs(secs)
    }

    /// Reject settings that would break the prompt window or the mood zones.
    pub fn validate(&self) -> Result<()> {
        if self.history.tail_size == 0 || self.history.tail_size >= self.history.max_total {
            anyhow::bail!(
                "history.tail_size ({}) must be in 1..max_total ({})",
                self.history.tail_size,
                self.history.max_total
            );
        }
        if self.mood.drift_threshold > self.mood.locked_threshold {
            anyhow::bail!(
                "mood.drift_threshold ({}) must not exceed mood.locked_threshold ({})",
                self.mood.drift_threshold,
                self.mood.locked_threshold
            );
        }
        if self.mood.calm_temperature > self.mood.max_temperature {
            anyhow::bail!(
                "mood.calm_temperature ({}) must not exceed mood.max_temperature ({})",
                self.mood.calm_temperature,
                self.mood.max_temperature
            );
        }
        Ok(())
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible endpoint (llama.cpp server, Ollama, ...).
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    /// Starting sampling temperature; the mood loop adjusts it per turn.
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
    /// Literal strings that end generation (user impersonation, template markup).
    pub stop: Vec<String>,
    pub stream: bool,
    pub timeout_secs: u64,
    /// Attempts per request on 429/5xx/connect errors, first try included.
    pub retry_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/v1".to_string(),
            model: "ana-v1".to_string(),
            api_key: None,
            max_tokens: 300,
            temperature: 0.95,
            top_p: 0.92,
            frequency_penalty: 0.65,
            presence_penalty: 1.2,
            stop: default_stop_list(),
            stream: true,
            timeout_secs: 120,
            retry_attempts: 2,
        }
    }
}

fn default_stop_list() -> Vec<String> {
    ["</s>", "[INST]", "<<USER>>", "<<TSUNDERE>>", "John:", "User:"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    pub initial_score: u8,
    /// Temperature restored once the persona is locked in.
    pub calm_temperature: f32,
    pub max_temperature: f32,
    pub temperature_step: f32,
    pub drift_threshold: u8,
    pub locked_threshold: u8,
    pub reinforce_weight: i32,
    pub drift_weight: i32,
    pub persona_words: Vec<String>,
    pub drift_words: Vec<String>,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            initial_score: 50,
            calm_temperature: 0.85,
            max_temperature: 1.3,
            temperature_step: 0.1,
            drift_threshold: 40,
            locked_threshold: 70,
            reinforce_weight: DEFAULT_REINFORCE_WEIGHT,
            drift_weight: DEFAULT_DRIFT_WEIGHT,
            persona_words: PERSONA_WORDS.iter().map(|s| s.to_string()).collect(),
            drift_words: DRIFT_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl MoodConfig {
    pub fn lexicon(&self) -> Lexicon {
        Lexicon::new(&self.persona_words, &self.drift_words)
            .with_weights(self.reinforce_weight, self.drift_weight)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub path: PathBuf,
    pub max_total: usize,
    pub tail_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs/chat_log.json"),
            max_total: DEFAULT_MAX_TOTAL,
            tail_size: DEFAULT_TAIL_SIZE,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// OpenAI-compatible transcription endpoint (faster-whisper-server).
    pub stt_url: Option<String>,
    pub stt_model: String,
    /// OpenAI-compatible speech endpoint (Kokoro-FastAPI).
    pub tts_url: Option<String>,
    pub tts_model: String,
    pub language: String,
    pub voice: String,
    pub speed: f32,
    pub lang_tag: String,
    /// Sample rate of the raw PCM the speech endpoint returns.
    pub tts_sample_rate: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_url: None,
            stt_model: "Systran/faster-whisper-base".to_string(),
            tts_url: None,
            tts_model: "kokoro".to_string(),
            language: "en".to_string(),
            voice: "af_bella".to_string(),
            speed: 1.1,
            lang_tag: "en-us".to_string(),
            tts_sample_rate: 24_000,
        }
    }
}

/// 25 MiB, the OpenAI transcription upload limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Added on top of the model's own timeouts when sizing the `/chat` wait.
const REPLY_MARGIN_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Base URL used when handing out audio links.
    pub public_url: Option<String>,
    /// Largest accepted `/transcribe` request body.
    pub max_upload_bytes: usize,
    /// How long `/chat` waits for its turn. Unset means one worst-case
    /// model call plus a margin, see [`VesiConfig::reply_timeout`].
    pub reply_timeout_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            public_url: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            reply_timeout_secs: None,
        }
    }
}

impl GatewayConfig {
    pub fn public_base(&self) -> String {
        match self.public_url {
            Some(ref url) => url.trim_end_matches('/').to_string(),
            None => format!("http://localhost:{}", self.port),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
