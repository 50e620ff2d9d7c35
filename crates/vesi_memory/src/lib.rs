pub mod json_file;
pub mod memory_store;
pub mod store;

pub use json_file::JsonFileStore;
pub use memory_store::InMemoryStore;
pub use store::HistoryStore;

#[cfg(test)]
mod tests;
