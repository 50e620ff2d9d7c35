use vesi_core::{ConversationHistory, Message, Persona, StoreError};

/// Durable backing for the conversation log.
///
/// Implementations only move raw message lists in and out. Recovery policy
/// (fall back to a fresh history on any read problem) lives in the provided
/// [`HistoryStore::load`], so every backend behaves the same at startup.
pub trait HistoryStore: Send + Sync {
    /// `Ok(None)` when nothing has been persisted yet.
    fn read(&self) -> Result<Option<Vec<Message>>, StoreError>;

    /// Replace the persisted log with `messages`.
    fn write(&self, messages: &[Message]) -> Result<(), StoreError>;

    /// Human-readable location for logs.
    fn describe(&self) -> String;

    /// Load the persisted log, or a fresh history seeded with the persona's
    /// system instruction. Never fails.
    fn load(&self, persona: &Persona) -> ConversationHistory {
        let fresh = || ConversationHistory::new(persona.system_prompt.clone());
        match self.read() {
            Ok(Some(messages)) => match ConversationHistory::from_messages(messages) {
                Ok(history) => {
                    tracing::info!(
                        "Memory loaded from {} ({} messages)",
                        self.describe(),
                        history.len()
                    );
                    history
                }
                Err(e) => {
                    tracing::warn!("Error loading memory: {}. Starting fresh.", e);
                    fresh()
                }
            },
            Ok(None) => {
                tracing::info!("No memory at {}, starting fresh", self.describe());
                fresh()
            }
            Err(e) => {
                tracing::warn!("Error loading memory: {}. Starting fresh.", e);
                fresh()
            }
        }
    }

    /// Write the full, unwindowed history.
    fn persist(&self, history: &ConversationHistory) -> Result<(), StoreError> {
        self.write(history.messages())
    }
}
