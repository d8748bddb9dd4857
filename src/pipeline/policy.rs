//! Engagement policy: decides whether to keep the conversation going.

use crate::config::EngineConfig;
use crate::session::model::Session;

/// Turn cap used when none is configured.
pub const DEFAULT_MAX_TURNS: usize = 20;

/// Depth a session must reach before high-value intelligence can end it.
pub const DEFAULT_MIN_TURNS_BEFORE_STOP: usize = 6;

/// Why engagement stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TurnCap,
    IntelligenceGathered,
}

impl StopReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::TurnCap => "turn_cap",
            Self::IntelligenceGathered => "intelligence_gathered",
        }
    }
}

/// Stop rules, checked in order: turn cap first, then gathered intelligence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngagementPolicy {
    pub max_turns: usize,
    pub min_turns_before_stop: usize,
}

impl Default for EngagementPolicy {
    fn default() -> Self {
        Self {
            max_turns: DEFAULT_MAX_TURNS,
            min_turns_before_stop: DEFAULT_MIN_TURNS_BEFORE_STOP,
        }
    }
}

impl From<&EngineConfig> for EngagementPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_turns: config.max_turns,
            min_turns_before_stop: config.min_turns_before_stop,
        }
    }
}

impl EngagementPolicy {
    /// `Some(reason)` if engagement should stop now.
    pub fn stop_reason(&self, session: &Session) -> Option<StopReason> {
        let count = session.message_count();
        if count >= self.max_turns {
            return Some(StopReason::TurnCap);
        }
        // phones and keywords alone are too common to end on
        if session.indicators().has_high_value() && count >= self.min_turns_before_stop {
            return Some(StopReason::IntelligenceGathered);
        }
        None
    }

    pub fn should_continue(&self, session: &Session) -> bool {
        self.stop_reason(session).is_none()
    }
}

/// Policy check with the default minimum depth.
pub fn should_continue(session: &Session, max_turns: usize) -> bool {
    EngagementPolicy {
        max_turns,
        ..EngagementPolicy::default()
    }
    .should_continue(session)
}
