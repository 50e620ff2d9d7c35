use crate::{HistoryStore, InMemoryStore, JsonFileStore};
use vesi_core::{ConversationHistory, Message, Persona, Role};

fn sample_history() -> ConversationHistory {
    let mut h = ConversationHistory::new(Persona::default().system_prompt);
    h.append(Message::user("hello"));
    h.append(Message::assistant("Hmph. What do you want, baka?"));
    h
}

#[test]
fn test_missing_file_loads_default() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("chat_log.json"));
    let persona = Persona::default();

    let history = store.load(&persona);
    assert_eq!(history.len(), 1);
    assert_eq!(history.system().role(), Role::System);
    assert_eq!(history.system().content(), persona.system_prompt);
}

#[test]
fn test_roundtrip_through_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("logs").join("chat_log.json"));
    let history = sample_history();

    store.persist(&history).unwrap();
    let loaded = store.load(&Persona::default());
    assert_eq!(loaded, history);
}

#[test]
fn test_file_is_pretty_printed_array() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("chat_log.json");
    let store = JsonFileStore::new(&path);
    store.persist(&sample_history()).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.starts_with("[\n"));
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 3);
    assert_eq!(value[2]["role"], "assistant");
}

#[test]
fn test_corrupt_file_falls_back() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("chat_log.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = JsonFileStore::new(&path);
    assert!(store.read().is_err());
    let history = store.load(&Persona::default());
    assert_eq!(history.len(), 1);
}

#[test]
fn test_log_without_system_anchor_falls_back() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("chat_log.json");
    std::fs::write(&path, r#"[{"role": "user", "content": "hi"}]"#).unwrap();

    let history = JsonFileStore::new(&path).load(&Persona::default());
    assert_eq!(history.len(), 1);
    assert_eq!(history.system().role(), Role::System);
}

#[test]
fn test_empty_array_falls_back() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("chat_log.json");
    std::fs::write(&path, "[]").unwrap();

    let history = JsonFileStore::new(&path).load(&Persona::default());
    assert_eq!(history.len(), 1);
}

#[test]
fn test_persist_overwrites_whole_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("chat_log.json"));
    store.persist(&sample_history()).unwrap();

    let fresh = ConversationHistory::new("You are someone else.");
    store.persist(&fresh).unwrap();
    assert_eq!(store.load(&Persona::default()), fresh);
}

#[test]
fn test_write_into_unwritable_location_errors() {
    let dir = tempfile::TempDir::new().unwrap();
    // A directory where the file should be
    let path = dir.path().join("taken");
    std::fs::create_dir(&path).unwrap();
    let err = JsonFileStore::new(&path).persist(&sample_history()).unwrap_err();
    assert!(err.to_string().contains("failed to write history"));
}

#[test]
fn test_in_memory_store_shares_state() {
    let store = InMemoryStore::new();
    let handle = store.clone();
    assert_eq!(store.load(&Persona::default()).len(), 1);

    store.persist(&sample_history()).unwrap();
    assert_eq!(handle.write_count(), 1);
    assert_eq!(handle.saved().unwrap().len(), 3);
    assert_eq!(handle.load(&Persona::default()), sample_history());
}

#[test]
fn test_failing_store_reports_error() {
    let store = InMemoryStore::failing();
    assert!(store.persist(&sample_history()).is_err());
    assert_eq!(store.write_count(), 0);
}
