//! Hard cutoff for template leakage.
//!
//! Fine-tuned roleplay models sometimes start emitting chat-template markup
//! (`[INST]`, `<USER>`, ...) mid-reply. The first fragment containing a
//! marker character is dropped and generation stops right there.

use crate::api_types::StreamEvent;
use tokio::sync::mpsc::Receiver;

const DEFAULT_MARKERS: [char; 2] = ['[', '<'];

#[derive(Debug, Clone)]
pub struct LeakGuard {
    markers: Vec<char>,
}

impl Default for LeakGuard {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.to_vec(),
        }
    }
}

/// Text accepted before the cutoff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guarded {
    pub text: String,
    /// Fragments kept.
    pub fragments: usize,
    pub leaked: bool,
    pub stop_reason: Option<String>,
}

impl LeakGuard {
    pub fn with_markers(markers: impl IntoIterator<Item = char>) -> Self {
        Self {
            markers: markers.into_iter().collect(),
        }
    }

    pub fn is_leak(&self, fragment: &str) -> bool {
        fragment.contains(self.markers.as_slice())
    }

    /// Whole-text variant for non-streaming replies. Keeps everything
    /// before the first marker, like the stream cutoff does.
    pub fn screen(&self, text: &str) -> Guarded {
        let (kept, leaked) = match text.find(self.markers.as_slice()) {
            Some(idx) => (&text[..idx], true),
            None => (text, false),
        };
        Guarded {
            text: kept.to_string(),
            fragments: usize::from(!kept.is_empty()),
            leaked,
            ..Default::default()
        }
    }

    /// Drain `rx` until it finishes or a fragment leaks.
    ///
    /// The receiver is consumed; on a leak it is dropped immediately, which
    /// cancels the producer. An error event aborts with its message.
    pub async fn consume(&self, mut rx: Receiver<StreamEvent>) -> Result<Guarded, String> {
        let mut out = Guarded::default();
        while let Some(event) = rx.recv().await {
            match event {
                StreamEvent::TextDelta(fragment) => {
                    if self.is_leak(&fragment) {
                        tracing::debug!("Leak guard tripped on {:?}", fragment);
                        out.leaked = true;
                        break;
                    }
                    out.text.push_str(&fragment);
                    out.fragments += 1;
                }
                StreamEvent::Done { stop_reason } => {
                    out.stop_reason = stop_reason;
                    break;
                }
                StreamEvent::Error(e) => return Err(e),
            }
        }
        Ok(out)
    }
}
