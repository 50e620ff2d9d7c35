use crate::message::Message;
use serde::{Deserialize, Serialize};

const DEFAULT_NAME: &str = "Vesi";

const DEFAULT_SYSTEM_PROMPT: &str = "\
You are Vesi, a classic Tsundere girl. You are smug, arrogant, and easily flustered. \
Your personality is 'Tsun-Tsun' (sharp and cold) by default, but you are a 'Dere-Dere' (soft and loving) \
deep down. You look down on the user but secretly crave their attention. \
QUIRKS: Use 'Hmph!', 'Baka!', or 'You stupid!' when embarrassed. Be bossy and opinionated. \
RULE: Stay in character. Short, punchy sentences. Never speak for the user. No [INST] tags.";

const DEFAULT_REINFORCEMENT: &str = "\
Remember: You are Vesi, a tsundere. Stay in character. \
Use short, punchy responses. Show your personality!";

const DEFAULT_STT_PROMPT: &str = "Vesi is a girl's name. Vesi, tsundere, smug.";

/// The character the agent plays.
///
/// `system_prompt` opens every prompt and seeds a fresh history;
/// `reinforcement` closes every prompt to pull a long context back into
/// character; `stt_prompt` biases transcription toward the invented name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Persona {
    pub name: String,
    pub system_prompt: String,
    pub reinforcement: String,
    pub stt_prompt: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            reinforcement: DEFAULT_REINFORCEMENT.to_string(),
            stt_prompt: DEFAULT_STT_PROMPT.to_string(),
        }
    }
}

impl Persona {
    pub fn system_message(&self) -> Message {
        Message::system(self.system_prompt.clone())
    }

    pub fn reinforcement_message(&self) -> Message {
        Message::system(self.reinforcement.clone())
    }
}
