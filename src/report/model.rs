//! Final report sent to the evaluation endpoint.

use serde::{Deserialize, Serialize};

use crate::session::model::{IndicatorSet, Session};

/// Final engagement report. Serializes to the flat wire payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub session_id: String,
    pub scam_detected: bool,
    pub total_messages_exchanged: usize,
    pub extracted_intelligence: IndicatorSet,
    pub agent_notes: String,
}

impl Report {
    /// Build a report from the current session state.
    pub fn from_session(session: &Session) -> Self {
        Self {
            session_id: session.id().to_string(),
            scam_detected: session.is_engaged(),
            total_messages_exchanged: session.message_count(),
            extracted_intelligence: session.indicators().clone(),
            agent_notes: session.notes().to_string(),
        }
    }

    /// Serialized wire payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
