//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Fixed evaluation endpoint that receives final reports.
pub const DEFAULT_CALLBACK_URL: &str = "https://hackathon.guvi.in/api/updateHoneyPotFinalResult";

/// Default OpenAI-compatible API base.
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model for persona replies.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Which text the keyword pass scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordScope {
    /// Only the latest inbound message.
    #[default]
    LatestMessage,
    /// All counterpart text seen so far in the session.
    Conversation,
}

/// Engagement engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on messages per session before engagement stops.
    pub max_turns: usize,
    /// Minimum session depth before high-value intelligence may end engagement.
    pub min_turns_before_stop: usize,
    /// Upper bound on a single reply generation call.
    pub reply_timeout: Duration,
    /// Upper bound on a single report delivery call.
    pub delivery_timeout: Duration,
    /// Keyword extraction scope.
    pub keyword_scope: KeywordScope,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_turns: 20,
            min_turns_before_stop: 6,
            reply_timeout: Duration::from_secs(10),
            delivery_timeout: Duration::from_secs(10),
            keyword_scope: KeywordScope::LatestMessage,
        }
    }
}

/// Full service configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Shared secret expected in `x-api-key`; `None` disables the check.
    pub api_key: Option<SecretString>,
    /// Where final reports are posted.
    pub callback_url: String,
    /// Use scripted replies even when an LLM key is present.
    pub mock_replies: bool,
    /// LLM API key; scripted replies are used when absent.
    pub llm_api_key: Option<SecretString>,
    pub llm_base_url: String,
    pub model: String,
    /// Optional directory for a rolling log file.
    pub log_dir: Option<String>,
    pub engine: EngineConfig,
}

impl ServiceConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();

        let port = parse_or(&lookup, "HONEYPOT_PORT", 8000u16)?;
        let max_turns = parse_or(&lookup, "HONEYPOT_MAX_TURNS", defaults.max_turns)?;
        if max_turns == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HONEYPOT_MAX_TURNS".into(),
                message: "must be at least 1".into(),
            });
        }
        let min_turns_before_stop = parse_or(
            &lookup,
            "HONEYPOT_MIN_TURNS_BEFORE_STOP",
            defaults.min_turns_before_stop,
        )?;
        let reply_timeout_secs = parse_or(
            &lookup,
            "HONEYPOT_REPLY_TIMEOUT_SECS",
            defaults.reply_timeout.as_secs(),
        )?;
        let delivery_timeout_secs = parse_or(
            &lookup,
            "HONEYPOT_DELIVERY_TIMEOUT_SECS",
            defaults.delivery_timeout.as_secs(),
        )?;

        let keyword_scope = match lookup("HONEYPOT_KEYWORD_SCOPE").as_deref().map(str::trim) {
            None | Some("") | Some("message") => KeywordScope::LatestMessage,
            Some("conversation") => KeywordScope::Conversation,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "HONEYPOT_KEYWORD_SCOPE".into(),
                    message: format!("expected 'message' or 'conversation', got '{other}'"),
                });
            }
        };

        let mock_replies = lookup("HONEYPOT_MOCK_REPLIES")
            .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            port,
            api_key: non_empty(&lookup, "HONEYPOT_API_KEY").map(SecretString::from),
            callback_url: non_empty(&lookup, "HONEYPOT_CALLBACK_URL")
                .unwrap_or_else(|| DEFAULT_CALLBACK_URL.to_string()),
            mock_replies,
            llm_api_key: non_empty(&lookup, "OPENAI_API_KEY").map(SecretString::from),
            llm_base_url: non_empty(&lookup, "HONEYPOT_LLM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_LLM_BASE_URL.to_string()),
            model: non_empty(&lookup, "HONEYPOT_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            log_dir: non_empty(&lookup, "HONEYPOT_LOG_DIR"),
            engine: EngineConfig {
                max_turns,
                min_turns_before_stop,
                reply_timeout: Duration::from_secs(reply_timeout_secs),
                delivery_timeout: Duration::from_secs(delivery_timeout_secs),
                keyword_scope,
            },
        })
    }

    /// Whether replies should come from the scripted generator.
    pub fn use_scripted_replies(&self) -> bool {
        self.mock_replies || self.llm_api_key.is_none()
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ServiceConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.callback_url, DEFAULT_CALLBACK_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.engine.max_turns, 20);
        assert_eq!(config.engine.min_turns_before_stop, 6);
        assert_eq!(config.engine.reply_timeout, Duration::from_secs(10));
        assert_eq!(config.engine.keyword_scope, KeywordScope::LatestMessage);
        assert!(config.api_key.is_none());
        assert!(config.use_scripted_replies());
    }

    #[test]
    fn reads_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("HONEYPOT_PORT", "9001"),
            ("HONEYPOT_MAX_TURNS", "12"),
            ("HONEYPOT_KEYWORD_SCOPE", "conversation"),
            ("HONEYPOT_CALLBACK_URL", "http://localhost:9999/report"),
            ("OPENAI_API_KEY", "sk-test"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.engine.max_turns, 12);
        assert_eq!(config.engine.keyword_scope, KeywordScope::Conversation);
        assert_eq!(config.callback_url, "http://localhost:9999/report");
        assert!(!config.use_scripted_replies());
    }

    #[test]
    fn mock_flag_forces_scripted_replies() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("HONEYPOT_MOCK_REPLIES", "true"),
        ]))
        .unwrap();
        assert!(config.use_scripted_replies());
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("HONEYPOT_MAX_TURNS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "HONEYPOT_MAX_TURNS"));
    }

    #[test]
    fn rejects_zero_turn_cap() {
        let err =
            ServiceConfig::from_lookup(lookup_from(&[("HONEYPOT_MAX_TURNS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_unknown_keyword_scope() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("HONEYPOT_KEYWORD_SCOPE", "all")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
