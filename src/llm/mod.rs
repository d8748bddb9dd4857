//! Reply generation for engaged conversations.
//!
//! Two generators exist:
//! - **Persona**: prompts an OpenAI-compatible chat model as a believable victim
//! - **Scripted**: deterministic topic-aware canned replies, used offline
//!
//! The engine only sees the `ReplyGenerator` trait and treats every call as
//! fallible.

pub mod persona;
pub mod provider;
pub mod scripted;

pub use persona::PersonaReplyGenerator;
pub use provider::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, OpenAiCompatProvider, Role,
};
pub use scripted::ScriptedReplyGenerator;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ServiceConfig;
use crate::error::LlmError;
use crate::pipeline::types::{Message, Sender};
use crate::session::model::Session;

/// Reply used whenever generation fails or times out.
pub const FALLBACK_REPLY: &str = "Can you please explain that again? I'm a bit confused.";

/// Everything a generator may look at when producing the next reply.
#[derive(Debug, Clone)]
pub struct ReplyContext {
    pub session_id: String,
    /// Inbound messages and earlier replies, oldest first.
    pub transcript: Vec<Message>,
    pub channel: String,
    pub locale: String,
}

impl ReplyContext {
    pub fn from_session(session: &Session, channel: &str, locale: &str) -> Self {
        Self {
            session_id: session.id().to_string(),
            transcript: session.transcript(),
            channel: channel.to_string(),
            locale: locale.to_string(),
        }
    }

    /// Most recent counterpart message, if any.
    pub fn last_counterpart_text(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.sender == Sender::Counterpart)
            .map(|m| m.text.as_str())
    }

    /// All counterpart text joined with spaces.
    pub fn counterpart_text(&self) -> String {
        self.transcript
            .iter()
            .filter(|m| m.sender == Sender::Counterpart)
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Produces the agent's next message.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Generator name for logging.
    fn name(&self) -> &str;

    async fn generate(&self, ctx: &ReplyContext) -> Result<String, LlmError>;
}

/// Pick the reply generator for this configuration.
pub fn create_reply_generator(config: &ServiceConfig) -> Arc<dyn ReplyGenerator> {
    match &config.llm_api_key {
        Some(key) if !config.use_scripted_replies() => {
            let provider =
                OpenAiCompatProvider::new(&config.llm_base_url, key.clone(), &config.model);
            tracing::info!("Using persona replies (model: {})", config.model);
            Arc::new(PersonaReplyGenerator::new(Arc::new(provider)))
        }
        _ => {
            tracing::info!("Using scripted replies");
            Arc::new(ScriptedReplyGenerator)
        }
    }
}
