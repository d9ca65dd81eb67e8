//! Transcript store — the ordered message log sent to the model each turn.
//!
//! Append-only within a run; insertion order is load-bearing because the
//! message sequence is literally the next prompt.

use reagent_core::types::{Message, Role};

pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Seed the transcript with the rendered system prompt.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// Append an observation — execution output handed back to the model.
    ///
    /// Carries the user role: the model asked for some code to be run, and
    /// the result now comes back from outside, so it must not read as the
    /// model's own words.
    pub fn push_observation(&mut self, execution_logs: &str) {
        self.messages
            .push(Message::user(format!("Observation:\n{execution_logs}")));
    }

    /// Drop everything but the system message.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    /// Full ordered message slice, system message included — the prompt.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// All messages except the system one, for display.
    pub fn export(&self) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
