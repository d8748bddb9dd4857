//! Session record and indicator sets.
//!
//! Every field only moves forward: history and notes are append-only,
//! indicator sets only grow, and each lifecycle flag flips at most once.
//! Mutation goes through methods so those rules hold by construction.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::types::Message;

/// Separator between summaries appended to the notes.
pub const NOTES_SEPARATOR: &str = " | ";

/// Summary used while nothing has been extracted yet.
pub const EMPTY_SUMMARY: &str = "Gathering intelligence...";

// ── Indicators ──────────────────────────────────────────────────────

/// Deduplicated indicators gathered over a session.
///
/// Sorted sets keep serialization stable, so two reports built from the same
/// state are byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    payment_handles: BTreeSet<String>,
    bank_accounts: BTreeSet<String>,
    suspicious_links: BTreeSet<String>,
    phone_numbers: BTreeSet<String>,
    suspicious_keywords: BTreeSet<String>,
}

/// The five indicator categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorKind {
    PaymentHandle,
    BankAccount,
    SuspiciousLink,
    PhoneNumber,
    SuspiciousKeyword,
}

impl IndicatorSet {
    pub fn payment_handles(&self) -> &BTreeSet<String> {
        &self.payment_handles
    }

    pub fn bank_accounts(&self) -> &BTreeSet<String> {
        &self.bank_accounts
    }

    pub fn suspicious_links(&self) -> &BTreeSet<String> {
        &self.suspicious_links
    }

    pub fn phone_numbers(&self) -> &BTreeSet<String> {
        &self.phone_numbers
    }

    pub fn suspicious_keywords(&self) -> &BTreeSet<String> {
        &self.suspicious_keywords
    }

    fn set_mut(&mut self, kind: IndicatorKind) -> &mut BTreeSet<String> {
        match kind {
            IndicatorKind::PaymentHandle => &mut self.payment_handles,
            IndicatorKind::BankAccount => &mut self.bank_accounts,
            IndicatorKind::SuspiciousLink => &mut self.suspicious_links,
            IndicatorKind::PhoneNumber => &mut self.phone_numbers,
            IndicatorKind::SuspiciousKeyword => &mut self.suspicious_keywords,
        }
    }

    /// Union already-validated values into one category.
    /// Returns how many were new.
    pub fn merge<I, S>(&mut self, kind: IndicatorKind, values: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = self.set_mut(kind);
        let mut added = 0;
        for value in values {
            if set.insert(value.into()) {
                added += 1;
            }
        }
        added
    }

    /// Whether any handle, account or link has been captured.
    pub fn has_high_value(&self) -> bool {
        !self.payment_handles.is_empty()
            || !self.bank_accounts.is_empty()
            || !self.suspicious_links.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_high_value()
            && self.phone_numbers.is_empty()
            && self.suspicious_keywords.is_empty()
    }

    /// One-line human summary of what has been gathered.
    pub fn summary(&self) -> String {
        let sections = [
            ("Payment handles", &self.payment_handles),
            ("Bank accounts", &self.bank_accounts),
            ("Suspicious links", &self.suspicious_links),
            ("Phone numbers", &self.phone_numbers),
            ("Keywords", &self.suspicious_keywords),
        ];
        let parts: Vec<String> = sections
            .iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|(label, set)| {
                let joined: Vec<&str> = set.iter().map(String::as_str).collect();
                format!("{label}: {}", joined.join(", "))
            })
            .collect();

        if parts.is_empty() {
            EMPTY_SUMMARY.to_string()
        } else {
            parts.join(NOTES_SEPARATOR)
        }
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// Full record of one conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    id: String,
    history: Vec<Message>,
    /// Replies we produced, kept apart from `history` so it counts inbound turns only.
    replies: Vec<Message>,
    engaged: bool,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    message_count: usize,
    indicators: IndicatorSet,
    notes: String,
    report_delivered: bool,
    #[serde(skip)]
    delivery_in_flight: bool,
}

impl Session {
    /// Create an empty session starting now.
    pub fn new(id: impl Into<String>) -> Self {
        Self::started_at(id, Utc::now())
    }

    /// Create an empty session with an explicit start time.
    pub fn started_at(id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            history: Vec::new(),
            replies: Vec::new(),
            engaged: false,
            started_at,
            ended_at: None,
            message_count: 0,
            indicators: IndicatorSet::default(),
            notes: String::new(),
            report_delivered: false,
            delivery_in_flight: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn replies(&self) -> &[Message] {
        &self.replies
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged
    }

    pub fn started(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn is_complete(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn indicators(&self) -> &IndicatorSet {
        &self.indicators
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn report_delivered(&self) -> bool {
        self.report_delivered
    }

    pub fn delivery_in_flight(&self) -> bool {
        self.delivery_in_flight
    }

    /// Append an inbound message and bump the counter together.
    pub fn append(&mut self, message: Message) {
        self.history.push(message);
        self.message_count += 1;
        debug_assert_eq!(self.message_count, self.history.len());
    }

    /// Record a reply we sent.
    pub fn record_reply(&mut self, reply: Message) {
        self.replies.push(reply);
    }

    /// Flip `engaged` on. Returns true only on the first call.
    pub fn engage(&mut self) -> bool {
        if self.engaged {
            return false;
        }
        self.engaged = true;
        true
    }

    /// Set `ended_at` if unset. Returns true only on the first call.
    pub fn complete_at(&mut self, at: DateTime<Utc>) -> bool {
        if self.ended_at.is_some() {
            return false;
        }
        self.ended_at = Some(at);
        true
    }

    /// Seconds from start to end, or to `now` while still open.
    pub fn elapsed_seconds_at(&self, now: DateTime<Utc>) -> i64 {
        let end = self.ended_at.unwrap_or(now);
        end.signed_duration_since(self.started_at).num_seconds().max(0)
    }

    pub fn indicators_mut(&mut self) -> &mut IndicatorSet {
        &mut self.indicators
    }

    /// Extend the notes with another summary.
    pub fn append_note(&mut self, note: &str) {
        if note.is_empty() {
            return;
        }
        if !self.notes.is_empty() {
            self.notes.push_str(NOTES_SEPARATOR);
        }
        self.notes.push_str(note);
    }

    /// Claim the right to attempt delivery.
    ///
    /// Fails if a report is already delivered, one is being delivered, the
    /// session never engaged, or it has not ended.
    pub fn begin_delivery(&mut self) -> bool {
        if self.report_delivered || self.delivery_in_flight || !self.engaged || self.ended_at.is_none()
        {
            return false;
        }
        self.delivery_in_flight = true;
        true
    }

    /// Release the delivery claim. Marks delivered on success.
    pub fn finish_delivery(&mut self, delivered: bool) {
        self.delivery_in_flight = false;
        if delivered && self.ended_at.is_some() {
            self.report_delivered = true;
        }
    }

    /// Mark delivered outright. Idempotent; ignored until the session has ended.
    pub fn mark_report_delivered(&mut self) {
        if self.ended_at.is_some() {
            self.report_delivered = true;
        }
    }

    /// Interleaved history and replies, oldest first.
    pub fn transcript(&self) -> Vec<Message> {
        let mut all: Vec<Message> = self
            .history
            .iter()
            .chain(self.replies.iter())
            .cloned()
            .collect();
        // stable sort keeps arrival order for equal timestamps
        all.sort_by_key(|m| m.timestamp);
        all
    }
}
