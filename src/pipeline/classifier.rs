//! Scam classifier: scores a single inbound message.
//!
//! Pure and deterministic. Each matching phrase adds 1; each structural
//! artifact (payment handle, http(s) link, long digit run) adds 2. A message
//! is a scam at score 2 or more, so one weak keyword alone never triggers
//! engagement while any single artifact does.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::keywords;

/// Score at or above which a message is treated as hostile.
pub const SCAM_THRESHOLD: u32 = 2;

/// Weight of each structural artifact.
const ARTIFACT_WEIGHT: u32 = 2;

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9.\-_]{2,}@[a-zA-Z]{2,}").unwrap());

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

static DIGIT_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{9,18}\b").unwrap());

/// How a message scored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScamScore {
    /// Phrases found in the message.
    pub phrases: Vec<&'static str>,
    pub has_payment_handle: bool,
    pub has_link: bool,
    pub has_digit_run: bool,
}

impl ScamScore {
    /// Total score.
    pub fn total(&self) -> u32 {
        let artifacts = [self.has_payment_handle, self.has_link, self.has_digit_run]
            .into_iter()
            .filter(|hit| *hit)
            .count() as u32;
        self.phrases.len() as u32 + artifacts * ARTIFACT_WEIGHT
    }

    /// Whether the score crosses the scam threshold.
    pub fn is_scam(&self) -> bool {
        self.total() >= SCAM_THRESHOLD
    }
}

/// Score a message without deciding.
pub fn score(text: &str) -> ScamScore {
    let lowered = text.to_lowercase();
    ScamScore {
        phrases: keywords::matching_phrases(&lowered).collect(),
        has_payment_handle: HANDLE_RE.is_match(&lowered),
        has_link: LINK_RE.is_match(&lowered),
        has_digit_run: DIGIT_RUN_RE.is_match(&lowered),
    }
}

/// Classify a message as scam (`true`) or benign.
pub fn classify(text: &str) -> bool {
    let score = score(text);
    let verdict = score.is_scam();
    debug!(
        score = score.total(),
        phrases = score.phrases.len(),
        handle = score.has_payment_handle,
        link = score.has_link,
        digits = score.has_digit_run,
        verdict,
        "Classified message"
    );
    verdict
}
