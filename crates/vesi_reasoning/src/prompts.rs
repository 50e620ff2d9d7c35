use vesi_core::{ConversationHistory, Message};

/// Builds the "sandwich" sent to the model:
/// system instruction, recent turns, then a reinforcement reminder.
///
/// The reminder closes the prompt so it is the last thing the model reads
/// before generating, which is what keeps long conversations in character.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_total: usize,
    tail_size: usize,
    reinforcement: Message,
}

impl PromptAssembler {
    pub fn new(max_total: usize, tail_size: usize, reinforcement: Message) -> Self {
        Self {
            max_total,
            tail_size,
            reinforcement,
        }
    }

    pub fn tail_size(&self) -> usize {
        self.tail_size
    }

    /// At most `tail_size + 2` messages, whatever the history length.
    pub fn assemble(&self, history: &ConversationHistory) -> Vec<Message> {
        let window = history.window(self.max_total, self.tail_size);
        let tail = window.tail();
        let recent = &tail[tail.len().saturating_sub(self.tail_size)..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(window.anchor().clone());
        messages.extend(recent.iter().cloned());
        messages.push(self.reinforcement.clone());
        messages
    }
}
