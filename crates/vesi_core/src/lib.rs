pub mod config;
pub mod error;
pub mod history;
pub mod lexicon;
pub mod message;
pub mod persona;

pub use config::VesiConfig;
pub use error::StoreError;
pub use history::{ConversationHistory, HistoryWindow, DEFAULT_MAX_TOTAL, DEFAULT_TAIL_SIZE};
pub use lexicon::Lexicon;
pub use message::{Message, Role};
pub use persona::Persona;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a piece of user text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputOrigin {
    Typed,
    Spoken,
    Http,
}

impl InputOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Typed => "typed",
            Self::Spoken => "spoken",
            Self::Http => "http",
        }
    }

    /// Console sources belong to the host and may end the session.
    /// Remote clients never can.
    pub fn may_end_session(&self) -> bool {
        !matches!(self, Self::Http)
    }
}

/// One unit of user input queued for the session consumer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub id: Uuid,
    pub origin: InputOrigin,
    pub text: String,
    pub received_at: i64, // Unix timestamp
}

impl Utterance {
    pub fn new(origin: InputOrigin, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            text: text.into(),
            received_at: chrono::Utc::now().timestamp(),
        }
    }

    /// The text is `exit` or `quit`.
    pub fn is_exit(&self) -> bool {
        let t = self.text.trim();
        t.eq_ignore_ascii_case("exit") || t.eq_ignore_ascii_case("quit")
    }

    /// An exit word from a source allowed to stop the session. HTTP exit
    /// words run as ordinary turns.
    pub fn ends_session(&self) -> bool {
        self.is_exit() && self.origin.may_end_session()
    }
}
