//! Append-only conversation log.
//!
//! Index 0 always holds the system persona instruction. Windowing never
//! mutates the log; it returns a borrowed view of the anchor plus a recent
//! tail.

use crate::error::StoreError;
use crate::message::{Message, Role};
use serde::Serialize;

/// Histories longer than this are windowed before prompting.
pub const DEFAULT_MAX_TOTAL: usize = 13;
/// Number of recent messages kept behind the anchor when windowing.
pub const DEFAULT_TAIL_SIZE: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    messages: Vec<Message>,
}

impl ConversationHistory {
    /// Fresh history holding only the system instruction.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Rebuild from persisted messages. The first message must be a system
    /// message, otherwise the log is rejected.
    pub fn from_messages(messages: Vec<Message>) -> Result<Self, StoreError> {
        match messages.first() {
            None => Err(StoreError::Invalid("history is empty".to_string())),
            Some(first) if first.role() != Role::System => Err(StoreError::Invalid(format!(
                "first message has role '{}', expected 'system'",
                first.role().as_str()
            ))),
            Some(_) => Ok(Self { messages }),
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The persona instruction at index 0.
    pub fn system(&self) -> &Message {
        &self.messages[0]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> &Message {
        &self.messages[self.messages.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false: the system anchor is never removed.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `[h[0]] + h[-tail_size:]` when the log is longer than `max_total`,
    /// the whole log otherwise.
    pub fn window(&self, max_total: usize, tail_size: usize) -> HistoryWindow<'_> {
        let len = self.messages.len();
        let start = if len > max_total {
            len.saturating_sub(tail_size).max(1)
        } else {
            1
        };
        HistoryWindow {
            anchor: &self.messages[0],
            tail: &self.messages[start..],
        }
    }
}

/// Borrowed view produced by [`ConversationHistory::window`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow<'a> {
    anchor: &'a Message,
    tail: &'a [Message],
}

impl<'a> HistoryWindow<'a> {
    pub fn anchor(&self) -> &'a Message {
        self.anchor
    }

    /// Recent turns, without the system anchor.
    pub fn tail(&self) -> &'a [Message] {
        self.tail
    }

    pub fn len(&self) -> usize {
        self.tail.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Message> + 'a {
        std::iter::once(self.anchor).chain(self.tail.iter())
    }

    pub fn to_history(&self) -> ConversationHistory {
        ConversationHistory {
            messages: self.iter().cloned().collect(),
        }
    }
}
