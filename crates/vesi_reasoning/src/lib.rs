pub mod api_types;
pub mod engine;
pub mod leak_guard;
pub mod llm;
pub mod prompts;
pub mod providers;
pub mod retry;
pub mod session;

pub use engine::{Session, TurnController, TurnError, TurnOutcome};
pub use llm::ChatModel;
pub use session::{SessionLoop, TurnReply};
