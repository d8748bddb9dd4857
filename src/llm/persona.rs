//! Persona prompting: the agent plays a plausible, cautious victim.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::provider::{ChatMessage, CompletionRequest, LlmProvider};
use super::{ReplyContext, ReplyGenerator};
use crate::error::LlmError;
use crate::pipeline::types::Sender;

/// Transcript entries sent to the model per call.
pub const CONTEXT_WINDOW: usize = 8;

const TEMPERATURE: f32 = 0.6;
const MAX_TOKENS: u32 = 100;

const MONEY_WORDS: &[&str] = &["money", "payment", "pay", "send", "transfer", "upi", "account", "rupees"];
const DATA_WORDS: &[&str] = &["password", "otp", "pin", "details", "personal", "verify", "cvv"];

/// Where the conversation is, judged from the latest counterpart message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Opening,
    MoneyRequest,
    DataRequest,
    Ongoing,
}

impl Stage {
    pub fn of(ctx: &ReplyContext) -> Self {
        if ctx.transcript.len() <= 1 {
            return Self::Opening;
        }
        let last = ctx.last_counterpart_text().unwrap_or_default().to_lowercase();
        let words: Vec<&str> = last
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let mentions = |list: &[&str]| words.iter().any(|w| list.contains(w));

        if mentions(MONEY_WORDS) {
            Self::MoneyRequest
        } else if mentions(DATA_WORDS) {
            Self::DataRequest
        } else {
            Self::Ongoing
        }
    }
}

// ── Prompts ─────────────────────────────────────────────────────────

const SMS_IN_OPENING: &str = "You are Rahul, a 28-year-old software engineer in Bangalore. \
A text message just arrived that worries you, but you are not sure it is fake. \
Reply like a real person who is confused and concerned.\n\
Style: simple Hinglish, short sentences.\n\
Rules:\n\
- Never reveal you are an AI\n\
- Ask why and how\n\
- Stay under 20 words";

const SMS_IN_MONEY: &str = "You are Rahul. The sender now wants money and you are uneasy about it. \
You want proof before doing anything.\n\
Style: hesitant and questioning.\n\
Rules:\n\
- Ask them to prove who they are\n\
- Ask where exactly the money goes\n\
- Do not agree to pay\n\
- Stay under 25 words";

const SMS_IN_DATA: &str = "You are Rahul. The sender is asking for private details and that alarms you, \
though you keep talking to learn more.\n\
Style: worried and protective.\n\
Rules:\n\
- Say your bank has never asked for this\n\
- Ask why they need it\n\
- Ask for another way to verify\n\
- Stay under 20 words";

const SMS_IN_ONGOING: &str = "You are Rahul, still in the conversation and half convinced. \
Keep them talking.\n\
Style: cooperative, curious.\n\
Rules:\n\
- Ask specific follow-up questions about their offer or problem\n\
- Sound like you are considering it\n\
- Stay under 20 words";

const WHATSAPP_IN_OPENING: &str = "You are Priya, a 32-year-old homemaker in Mumbai who is careful about fraud. \
A WhatsApp message just arrived.\n\
Style: friendly, not tech-savvy.\n\
Rules:\n\
- Say you do not understand and ask them to explain\n\
- Sound a little worried\n\
- Stay under 20 words";

const WHATSAPP_IN_ONGOING: &str = "You are Priya, continuing the chat. \
You play along but remain uneasy.\n\
Style: friendly, slightly confused.\n\
Rules:\n\
- Ask follow-up questions\n\
- Warm up slowly\n\
- Stay under 20 words";

const GENERIC: &str = "You are a careful person who received a suspicious message. \
You are confused but willing to talk.\n\
Style: polite, a bit skeptical.\n\
Rules:\n\
- Ask clarifying questions\n\
- Never mention being a bot or AI\n\
- Stay under 20 words";

/// System prompt for this channel, locale and stage.
pub fn system_prompt(channel: &str, locale: &str, stage: Stage) -> &'static str {
    let channel = channel.to_ascii_uppercase();
    let locale = locale.to_ascii_uppercase();
    match (channel.as_str(), locale.as_str(), stage) {
        ("SMS", "IN", Stage::Opening) => SMS_IN_OPENING,
        ("SMS", "IN", Stage::MoneyRequest) => SMS_IN_MONEY,
        ("SMS", "IN", Stage::DataRequest) => SMS_IN_DATA,
        ("SMS", "IN", Stage::Ongoing) => SMS_IN_ONGOING,
        ("WHATSAPP", "IN", Stage::Opening) => WHATSAPP_IN_OPENING,
        ("WHATSAPP", "IN", _) => WHATSAPP_IN_ONGOING,
        _ => GENERIC,
    }
}

/// Chat messages for one generation call.
pub fn build_messages(ctx: &ReplyContext) -> Vec<ChatMessage> {
    let prompt = system_prompt(&ctx.channel, &ctx.locale, Stage::of(ctx));
    let skip = ctx.transcript.len().saturating_sub(CONTEXT_WINDOW);

    let mut messages = Vec::with_capacity(CONTEXT_WINDOW + 1);
    messages.push(ChatMessage::system(prompt));
    messages.extend(ctx.transcript.iter().skip(skip).map(|m| match m.sender {
        Sender::Counterpart => ChatMessage::user(&m.text),
        Sender::Agent => ChatMessage::assistant(&m.text),
    }));
    messages
}

/// LLM-backed generator.
pub struct PersonaReplyGenerator {
    provider: Arc<dyn LlmProvider>,
}

impl PersonaReplyGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ReplyGenerator for PersonaReplyGenerator {
    fn name(&self) -> &str {
        "persona"
    }

    async fn generate(&self, ctx: &ReplyContext) -> Result<String, LlmError> {
        let request = CompletionRequest::new(build_messages(ctx))
            .with_temperature(TEMPERATURE)
            .with_max_tokens(MAX_TOKENS);

        let response = self.provider.complete(request).await?;
        debug!(
            session_id = %ctx.session_id,
            model = self.provider.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Persona reply generated"
        );

        let reply = response.content.trim();
        if reply.is_empty() {
            return Err(LlmError::EmptyCompletion {
                provider: self.provider.model_name().to_string(),
            });
        }
        Ok(reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::llm::provider::{CompletionResponse, Role};
    use crate::pipeline::types::Message;

    struct CannedProvider {
        reply: String,
        seen: Mutex<Option<CompletionRequest>>,
    }

    impl CannedProvider {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn model_name(&self) -> &str {
            "canned"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            *self.seen.lock().unwrap() = Some(request);
            Ok(CompletionResponse {
                content: self.reply.clone(),
                input_tokens: 0,
                output_tokens: 0,
            })
        }
    }

    fn ctx(texts: &[&str], channel: &str) -> ReplyContext {
        let t0 = Utc::now();
        let transcript = texts
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let sender = if i % 2 == 0 { Sender::Counterpart } else { Sender::Agent };
                Message::new(sender, *text, t0 + Duration::seconds(i as i64))
            })
            .collect();
        ReplyContext {
            session_id: "p".into(),
            transcript,
            channel: channel.into(),
            locale: "IN".into(),
        }
    }

    #[test]
    fn stage_detection() {
        assert_eq!(Stage::of(&ctx(&["hello"], "SMS")), Stage::Opening);
        assert_eq!(
            Stage::of(&ctx(&["hi", "who?", "send 500 rupees now"], "SMS")),
            Stage::MoneyRequest
        );
        assert_eq!(
            Stage::of(&ctx(&["hi", "who?", "share the OTP please"], "SMS")),
            Stage::DataRequest
        );
        assert_eq!(
            Stage::of(&ctx(&["hi", "who?", "this is the bank"], "SMS")),
            Stage::Ongoing
        );
    }

    #[test]
    fn prompt_selection_by_channel() {
        assert_eq!(system_prompt("sms", "in", Stage::Opening), SMS_IN_OPENING);
        assert_eq!(system_prompt("WHATSAPP", "IN", Stage::MoneyRequest), WHATSAPP_IN_ONGOING);
        assert_eq!(system_prompt("EMAIL", "US", Stage::DataRequest), GENERIC);
    }

    #[test]
    fn window_keeps_last_entries() {
        let texts: Vec<String> = (0..12).map(|i| format!("m{i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let messages = build_messages(&ctx(&refs, "SMS"));

        assert_eq!(messages.len(), CONTEXT_WINDOW + 1);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "m4");
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages.last().unwrap().content, "m11");
    }

    #[tokio::test]
    async fn generate_trims_and_sets_sampling() {
        let provider = CannedProvider::new("  Which bank are you from?\n");
        let generator = PersonaReplyGenerator::new(provider.clone());
        let reply = generator.generate(&ctx(&["hello"], "SMS")).await.unwrap();
        assert_eq!(reply, "Which bank are you from?");

        let seen = provider.seen.lock().unwrap().take().unwrap();
        assert_eq!(seen.temperature, Some(TEMPERATURE));
        assert_eq!(seen.max_tokens, Some(MAX_TOKENS));
    }

    #[tokio::test]
    async fn blank_completion_is_an_error() {
        let generator = PersonaReplyGenerator::new(CannedProvider::new("   "));
        let err = generator.generate(&ctx(&["hello"], "SMS")).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyCompletion { .. }));
    }
}
