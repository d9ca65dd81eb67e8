//! Model provider abstraction.
//!
//! The agent loop only needs one operation from a provider: given the ordered
//! transcript, return a single assistant reply, with generation halting at a
//! stop sequence. Streaming is deliberately absent — each step consumes the
//! whole reply before anything else happens.

use async_trait::async_trait;

use reagent_core::types::Message;

pub mod openai;

pub use openai::OpenAiProvider;

/// The model collaborator interface.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider identifier (e.g., "openai", "openrouter", "ollama").
    fn id(&self) -> &str;

    /// Request one completion for the given transcript. The returned text is
    /// the raw assistant reply, cut off at `stop_sequence`.
    async fn complete(&self, messages: &[Message], stop_sequence: &str) -> anyhow::Result<String>;
}
