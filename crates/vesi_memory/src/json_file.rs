use crate::store::HistoryStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use vesi_core::{Message, StoreError};

/// Conversation log kept as a pretty-printed JSON array of `{role, content}`.
///
/// Reads are permissive (any failure becomes a fresh history upstream);
/// writes overwrite the whole file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonFileStore {
    fn read(&self) -> Result<Option<Vec<Message>>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };
        let messages: Vec<Message> = serde_json::from_str(&content)?;
        Ok(Some(messages))
    }

    fn write(&self, messages: &[Message]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(messages)?;
        std::fs::write(&self.path, json).map_err(|e| StoreError::Write {
            path: self.path.clone(),
            source: e,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
