//! Line buffer for OpenAI-style server-sent events.
//!
//! Raw chunks arrive at arbitrary byte boundaries; only complete
//! `data:` lines are handed out, partial lines wait for the next chunk.

pub(crate) struct SseBuffer {
    buffer: String,
}

impl SseBuffer {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Append raw bytes (lossy UTF-8).
    pub fn push_bytes(&mut self, chunk: &bytes::Bytes) {
        self.buffer.push_str(&String::from_utf8_lossy(chunk));
    }

    /// Drain every complete line and return the payloads of its `data:`
    /// lines. Comments (`:`), `event:` lines and blank separators are skipped.
    pub fn extract_data(&mut self) -> Vec<String> {
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            if let Some(payload) = data_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Whatever is left once the connection closes. Some servers omit the
    /// trailing newline on the last event.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        data_payload(&rest)
    }

    pub fn residue(&self) -> &str {
        &self.buffer
    }
}

fn data_payload(line: &str) -> Option<String> {
    let line = line.trim();
    let payload = line.strip_prefix("data:")?;
    Some(payload.trim_start().to_string())
}
