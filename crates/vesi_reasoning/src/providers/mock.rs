//! Scripted model for tests and offline runs.
//!
//! Each call pops the next [`Script`]; once the queue is empty the fallback
//! reply is used. Streamed fragments go through a capacity-1 channel so a
//! consumer that stops reading leaves the rest unsent, which is what
//! [`ScriptedModel::fragments_sent`] lets tests observe.

use crate::api_types::{CompletionResponse, SamplingParams, StreamEvent};
use crate::llm::ChatModel;
use anyhow::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use vesi_core::Message;

#[derive(Debug, Clone)]
pub enum Script {
    /// Reply in these fragments.
    Fragments(Vec<String>),
    /// The request itself fails.
    Fail(String),
    /// Some fragments, then an error event.
    BreakAfter(Vec<String>, String),
}

impl Script {
    pub fn fragments<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fragments(parts.into_iter().map(Into::into).collect())
    }
}

/// What the model was asked, for assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub params: SamplingParams,
    pub streamed: bool,
}

#[derive(Debug, Clone)]
pub struct ScriptedModel {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    sent: Arc<AtomicUsize>,
    fallback: String,
}

impl ScriptedModel {
    pub fn new<I: IntoIterator<Item = Script>>(scripts: I) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into_iter().collect())),
            calls: Arc::new(Mutex::new(Vec::new())),
            sent: Arc::new(AtomicUsize::new(0)),
            fallback: "Hmph. I'm not talking to you, baka.".to_string(),
        }
    }

    /// Always answers with the fallback reply.
    pub fn echo() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Fragments actually delivered to a stream receiver so far.
    pub fn fragments_sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    fn next_script(&self, messages: &[Message], params: &SamplingParams, streamed: bool) -> Script {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                params: params.clone(),
                streamed,
            });
        }
        self.scripts
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| Script::Fragments(vec![self.fallback.clone()]))
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(
        &self,
        messages: &[Message],
        params: &SamplingParams,
    ) -> Result<CompletionResponse> {
        match self.next_script(messages, params, false) {
            Script::Fragments(parts) => Ok(CompletionResponse {
                text: parts.concat(),
                stop_reason: Some("stop".into()),
            }),
            Script::Fail(e) | Script::BreakAfter(_, e) => anyhow::bail!(e),
        }
    }

    async fn stream(
        &self,
        messages: &[Message],
        params: &SamplingParams,
    ) -> Result<mpsc::Receiver<StreamEvent>> {
        let (parts, failure) = match self.next_script(messages, params, true) {
            Script::Fragments(parts) => (parts, None),
            Script::BreakAfter(parts, e) => (parts, Some(e)),
            Script::Fail(e) => anyhow::bail!(e),
        };

        let (tx, rx) = mpsc::channel(1);
        let sent = self.sent.clone();
        tokio::spawn(async move {
            for part in parts {
                if tx.send(StreamEvent::TextDelta(part)).await.is_err() {
                    return;
                }
                sent.fetch_add(1, Ordering::SeqCst);
            }
            let last = match failure {
                Some(e) => StreamEvent::Error(e),
                None => StreamEvent::Done {
                    stop_reason: Some("stop".into()),
                },
            };
            let _ = tx.send(last).await;
        });
        Ok(rx)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_complete() {
        let model = ScriptedModel::new(vec![Script::fragments(["Hmph", "!"])]);
        let resp = model
            .complete(&[Message::user("hi")], &SamplingParams::default())
            .await
            .unwrap();
        assert_eq!(resp.text, "Hmph!");
        // Queue drained, fallback from now on
        let resp = model.complete(&[], &SamplingParams::default()).await.unwrap();
        assert!(resp.text.contains("baka"));
        assert_eq!(model.calls().len(), 2);
        assert!(!model.calls()[0].streamed);
    }

    #[tokio::test]
    async fn test_scripted_stream_then_error() {
        let model = ScriptedModel::new(vec![Script::BreakAfter(
            vec!["Hm".into()],
            "connection reset".into(),
        )]);
        let mut rx = model.stream(&[], &SamplingParams::default()).await.unwrap();
        assert_eq!(rx.recv().await, Some(StreamEvent::TextDelta("Hm".into())));
        assert_eq!(
            rx.recv().await,
            Some(StreamEvent::Error("connection reset".into()))
        );
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_scripted_request_failure() {
        let model = ScriptedModel::new(vec![Script::Fail("refused".into())]);
        let err = model
            .stream(&[], &SamplingParams::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("refused"));
    }
}
