use crate::store::HistoryStore;
use std::sync::{Arc, Mutex};
use vesi_core::{Message, StoreError};

/// Volatile store for `--no-persist` sessions and tests.
///
/// Clones share the same buffer, so a test can keep a handle and inspect
/// what the controller persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    saved: Arc<Mutex<Option<Vec<Message>>>>,
    writes: Arc<Mutex<usize>>,
    fail_writes: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate as if a previous session had persisted `messages`.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        let store = Self::default();
        if let Ok(mut saved) = store.saved.lock() {
            *saved = Some(messages);
        }
        store
    }

    /// Every write fails with an I/O error (for exercising write-failure paths).
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Option<Vec<Message>> {
        self.saved.lock().ok().and_then(|s| s.clone())
    }

    pub fn write_count(&self) -> usize {
        self.writes.lock().map(|w| *w).unwrap_or(0)
    }
}

impl HistoryStore for InMemoryStore {
    fn read(&self) -> Result<Option<Vec<Message>>, StoreError> {
        Ok(self.saved())
    }

    fn write(&self, messages: &[Message]) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Write {
                path: "<memory>".into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "store is read-only"),
            });
        }
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some(messages.to_vec());
        }
        if let Ok(mut w) = self.writes.lock() {
            *w += 1;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "<memory>".to_string()
    }
}
