pub mod server;
pub mod types;

pub use server::{GatewayServer, VoiceServices};
pub use types::{ChatRequest, ChatResponse, TranscribeResponse};
