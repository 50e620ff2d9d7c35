pub mod mock;
pub mod openai_compat;
mod sse;

pub use mock::{Script, ScriptedModel};
pub use openai_compat::OpenAiCompatClient;
