use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {detail}")]
    InvalidResponse {
        service: &'static str,
        detail: String,
    },

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Capture error: {0}")]
    Capture(String),
}

impl From<hound::Error> for VoiceError {
    fn from(err: hound::Error) -> Self {
        Self::Audio(err.to_string())
    }
}

impl From<reqwest::Error> for VoiceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}
