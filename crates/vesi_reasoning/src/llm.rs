use crate::api_types::{CompletionResponse, SamplingParams, StreamEvent};
use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::Receiver;
use vesi_core::Message;

/// Chat-completion backend.
///
/// `stream` hands back a receiver fed by a producer task; dropping the
/// receiver is how callers cancel generation.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        params: &SamplingParams,
    ) -> Result<CompletionResponse>;

    async fn stream(
        &self,
        messages: &[Message],
        params: &SamplingParams,
    ) -> Result<Receiver<StreamEvent>>;

    /// Model identifier, for logs.
    fn name(&self) -> &str;
}
