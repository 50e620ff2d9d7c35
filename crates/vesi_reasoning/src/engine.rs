//! Turn controller.
//!
//! A turn records the user message, sends the sandwich prompt to the model,
//! filters the stream through the leak guard, scores the reply, moves the
//! mood (and with it the next temperature), records the reply and persists.
//!
//! Inference failures abort the turn after step one: the user message stays
//! in the history, nothing else changes and nothing is written.

use crate::api_types::SamplingParams;
use crate::leak_guard::{Guarded, LeakGuard};
use crate::llm::ChatModel;
use crate::prompts::PromptAssembler;
use std::sync::Arc;
use thiserror::Error;
use vesi_core::{ConversationHistory, Lexicon, Message, StoreError, VesiConfig};
use vesi_limbic::{MoodReading, MoodTracker};
use vesi_memory::HistoryStore;

/// Mutable state of one conversation. Owned by exactly one consumer.
#[derive(Debug, Clone)]
pub struct Session {
    pub history: ConversationHistory,
    pub mood: MoodTracker,
}

impl Session {
    pub fn new(history: ConversationHistory, mood: MoodTracker) -> Self {
        Self { history, mood }
    }
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("inference request failed: {0}")]
    Request(String),

    #[error("generation aborted mid-stream: {0}")]
    Stream(String),
}

/// Result of a completed turn.
#[derive(Debug)]
pub struct TurnOutcome {
    /// Trimmed reply, as recorded in the history.
    pub reply: String,
    pub reading: MoodReading,
    /// Stream fragments accepted before completion or cutoff.
    pub fragments: usize,
    pub leaked: bool,
    /// The turn still counts when the write fails; the caller decides what
    /// to tell the user.
    pub persist_error: Option<StoreError>,
}

pub struct TurnController {
    model: Arc<dyn ChatModel>,
    store: Arc<dyn HistoryStore>,
    assembler: PromptAssembler,
    lexicon: Lexicon,
    guard: LeakGuard,
    sampling: SamplingParams,
    streaming: bool,
}

impl TurnController {
    pub fn new(model: Arc<dyn ChatModel>, store: Arc<dyn HistoryStore>, config: &VesiConfig) -> Self {
        Self {
            model,
            store,
            assembler: PromptAssembler::new(
                config.history.max_total,
                config.history.tail_size,
                config.persona.reinforcement_message(),
            ),
            lexicon: config.mood.lexicon(),
            guard: LeakGuard::default(),
            sampling: SamplingParams::from_config(&config.llm),
            streaming: config.llm.stream,
        }
    }

    pub fn with_guard(mut self, guard: LeakGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Load the persisted history and start a fresh mood.
    pub fn open_session(&self, config: &VesiConfig) -> Session {
        Session::new(
            self.store.load(&config.persona),
            MoodTracker::from_config(&config.mood, &config.llm),
        )
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn persist(&self, session: &Session) -> Result<(), StoreError> {
        self.store.persist(&session.history)
    }

    #[tracing::instrument(skip(self, session, user_text), fields(history_len = session.history.len()))]
    pub async fn run_turn(
        &self,
        session: &mut Session,
        user_text: &str,
    ) -> Result<TurnOutcome, TurnError> {
        session.history.append(Message::user(user_text.trim()));

        let prompt = self.assembler.assemble(&session.history);
        let params = self
            .sampling
            .clone()
            .with_temperature(session.mood.temperature());
        tracing::debug!(
            "Prompting {} with {} messages at temperature {:.2}",
            self.model.name(),
            prompt.len(),
            params.temperature
        );

        let guarded = self.generate(&prompt, &params).await?;
        if guarded.leaked {
            tracing::info!("Template leak cut the reply after {} fragments", guarded.fragments);
        }
        tracing::debug!(
            "Generated {} fragments (stop reason {:?})",
            guarded.fragments,
            guarded.stop_reason
        );

        let delta = self.lexicon.classify(&guarded.text);
        let reading = session.mood.record(delta);

        let reply = guarded.text.trim().to_string();
        session.history.append(Message::assistant(reply.clone()));

        let persist_error = match self.persist(session) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to save memory: {}", e);
                Some(e)
            }
        };

        Ok(TurnOutcome {
            reply,
            reading,
            fragments: guarded.fragments,
            leaked: guarded.leaked,
            persist_error,
        })
    }

    async fn generate(
        &self,
        prompt: &[Message],
        params: &SamplingParams,
    ) -> Result<Guarded, TurnError> {
        if self.streaming {
            let rx = self
                .model
                .stream(prompt, params)
                .await
                .map_err(|e| TurnError::Request(format!("{:#}", e)))?;
            self.guard.consume(rx).await.map_err(TurnError::Stream)
        } else {
            let response = self
                .model
                .complete(prompt, params)
                .await
                .map_err(|e| TurnError::Request(format!("{:#}", e)))?;
            let mut guarded = self.guard.screen(&response.text);
            guarded.stop_reason = response.stop_reason;
            Ok(guarded)
        }
    }
}
