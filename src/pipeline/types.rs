//! Shared types for the engagement pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::model::IndicatorSet;

/// Channel assumed when the event carries none.
pub const DEFAULT_CHANNEL: &str = "SMS";

/// Locale assumed when the event carries none.
pub const DEFAULT_LOCALE: &str = "IN";

// ── Messages ────────────────────────────────────────────────────────

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The suspected fraudster.
    #[serde(alias = "scammer")]
    Counterpart,
    /// Our side of the conversation.
    #[serde(alias = "user")]
    Agent,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Counterpart => "counterpart",
            Self::Agent => "agent",
        };
        write!(f, "{s}")
    }
}

/// One message in a conversation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            sender,
            text: text.into(),
            timestamp,
        }
    }
}

// ── Inbound event ───────────────────────────────────────────────────

/// One inbound conversation turn as seen by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEvent {
    pub session_id: String,
    pub sender: Sender,
    pub text: String,
    /// When the message was sent; the engine stamps arrival time if absent.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Passed through to the reply generator untouched.
    #[serde(default)]
    pub channel: Option<String>,
    /// Passed through to the reply generator untouched.
    #[serde(default)]
    pub locale: Option<String>,
}

impl InboundEvent {
    /// A counterpart message with no metadata.
    pub fn counterpart(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            sender: Sender::Counterpart,
            text: text.into(),
            timestamp: None,
            channel: None,
            locale: None,
        }
    }

    pub fn channel_or_default(&self) -> &str {
        self.channel.as_deref().unwrap_or(DEFAULT_CHANNEL)
    }

    pub fn locale_or_default(&self) -> &str {
        self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }
}

// ── Per-event response ──────────────────────────────────────────────

/// What the engine reports back for every inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementResponse {
    /// Whether the conversation has been engaged as a scam.
    pub scam_detected: bool,
    pub engagement_duration_seconds: i64,
    pub total_messages_exchanged: usize,
    pub extracted_intelligence: IndicatorSet,
    pub agent_notes: String,
    /// The reply to send back, present only while engaged.
    pub agent_reply: Option<String>,
    pub engagement_complete: bool,
    /// True only on the turn whose dispatch succeeded.
    pub report_delivered: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_accepts_legacy_names() {
        let s: Sender = serde_json::from_str("\"scammer\"").unwrap();
        assert_eq!(s, Sender::Counterpart);
        let s: Sender = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(s, Sender::Agent);
        let s: Sender = serde_json::from_str("\"counterpart\"").unwrap();
        assert_eq!(s, Sender::Counterpart);
        assert_eq!(serde_json::to_string(&Sender::Agent).unwrap(), "\"agent\"");
    }

    #[test]
    fn inbound_event_defaults() {
        let event: InboundEvent = serde_json::from_value(serde_json::json!({
            "sessionId": "s-1",
            "sender": "scammer",
            "text": "hello"
        }))
        .unwrap();
        assert_eq!(event.session_id, "s-1");
        assert!(event.timestamp.is_none());
        assert_eq!(event.channel_or_default(), "SMS");
        assert_eq!(event.locale_or_default(), "IN");
    }

    #[test]
    fn inbound_event_keeps_given_channel() {
        let event = InboundEvent {
            channel: Some("WHATSAPP".into()),
            ..InboundEvent::counterpart("s-2", "hi")
        };
        assert_eq!(event.sender, Sender::Counterpart);
        assert_eq!(event.channel_or_default(), "WHATSAPP");
        assert_eq!(event.locale_or_default(), "IN");
    }

    #[test]
    fn response_uses_camel_case() {
        let response = EngagementResponse {
            scam_detected: true,
            engagement_duration_seconds: 3,
            total_messages_exchanged: 2,
            extracted_intelligence: IndicatorSet::default(),
            agent_notes: String::new(),
            agent_reply: Some("who is this?".into()),
            engagement_complete: false,
            report_delivered: false,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["scamDetected"], true);
        assert_eq!(json["engagementDurationSeconds"], 3);
        assert_eq!(json["totalMessagesExchanged"], 2);
        assert_eq!(json["agentReply"], "who is this?");
        assert!(json["extractedIntelligence"]["paymentHandles"].is_array());
    }
}
