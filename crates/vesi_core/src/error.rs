use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the persisted conversation log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read history from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse persisted history: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("persisted history is invalid: {0}")]
    Invalid(String),

    #[error("failed to write history to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
