//! Single-consumer session loop.
//!
//! Typed, spoken and HTTP input all land in one bounded queue. One task
//! drains it and runs turns strictly in order, so the history and mood are
//! never touched concurrently. Results fan out on a broadcast channel; each
//! front end picks the replies it cares about by `origin` or `request_id`.

use crate::engine::{Session, TurnController, TurnOutcome};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;
use vesi_core::{InputOrigin, Utterance};
use vesi_limbic::{MoodTracker, MoodZone};

pub const INBOX_CAPACITY: usize = 32;
const REPLY_CAPACITY: usize = 64;

/// What every front end gets back for an utterance.
#[derive(Debug, Clone, Serialize)]
pub struct TurnReply {
    pub request_id: Uuid,
    pub origin: InputOrigin,
    pub text: String,
    pub mood: u8,
    pub temperature: f32,
    pub zone: MoodZone,
    pub fragments: usize,
    pub leaked: bool,
    /// Set when the turn failed; `text` is empty then.
    pub error: Option<String>,
    /// Set when the turn succeeded but the history could not be saved.
    pub persist_error: Option<String>,
    /// True only for the acknowledgement of an exit word.
    pub closing: bool,
}

impl TurnReply {
    fn base(utterance: &Utterance, mood: &MoodTracker) -> Self {
        Self {
            request_id: utterance.id,
            origin: utterance.origin,
            text: String::new(),
            mood: mood.score().value(),
            temperature: mood.temperature(),
            zone: mood.zone(),
            fragments: 0,
            leaked: false,
            error: None,
            persist_error: None,
            closing: false,
        }
    }

    fn completed(utterance: &Utterance, outcome: TurnOutcome, mood: &MoodTracker) -> Self {
        Self {
            text: outcome.reply,
            fragments: outcome.fragments,
            leaked: outcome.leaked,
            persist_error: outcome.persist_error.map(|e| e.to_string()),
            ..Self::base(utterance, mood)
        }
    }
}

pub fn inbox() -> (mpsc::Sender<Utterance>, mpsc::Receiver<Utterance>) {
    mpsc::channel(INBOX_CAPACITY)
}

pub struct SessionLoop {
    controller: Arc<TurnController>,
    replies: broadcast::Sender<TurnReply>,
}

impl SessionLoop {
    pub fn new(controller: Arc<TurnController>) -> Self {
        let (replies, _) = broadcast::channel(REPLY_CAPACITY);
        Self {
            controller,
            replies,
        }
    }

    /// Subscribe before calling [`SessionLoop::run`] or early replies are missed.
    pub fn subscribe(&self) -> broadcast::Receiver<TurnReply> {
        self.replies.subscribe()
    }

    /// Run until a console exit word is dequeued or every producer hangs up.
    /// The history is saved once more on the way out.
    pub async fn run(&self, mut session: Session, mut inbox: mpsc::Receiver<Utterance>) -> Session {
        tracing::info!(
            "Session started ({} messages in memory, model {})",
            session.history.len(),
            self.controller.model_name()
        );

        while let Some(utterance) = inbox.recv().await {
            if utterance.ends_session() {
                tracing::info!("Exit requested via {} input", utterance.origin.as_str());
                let _ = self.replies.send(TurnReply {
                    closing: true,
                    ..TurnReply::base(&utterance, &session.mood)
                });
                break;
            }
            let text = utterance.text.trim();
            if text.is_empty() {
                continue;
            }

            tracing::debug!("Turn {} from {} input", utterance.id, utterance.origin.as_str());
            let reply = match self.controller.run_turn(&mut session, text).await {
                Ok(outcome) => TurnReply::completed(&utterance, outcome, &session.mood),
                Err(e) => {
                    tracing::warn!("Turn failed: {}", e);
                    TurnReply {
                        error: Some(e.to_string()),
                        ..TurnReply::base(&utterance, &session.mood)
                    }
                }
            };
            // No subscribers is fine (headless runs)
            let _ = self.replies.send(reply);
        }

        match self.controller.persist(&session) {
            Ok(()) => tracing::info!("Memory saved ({} messages)", session.history.len()),
            Err(e) => tracing::warn!("Failed to save memory on exit: {}", e),
        }
        session
    }
}
