//! Intelligence extractor.
//!
//! Two passes: a loose candidate pass over the latest message, then a strict
//! per-category validation before anything reaches the session. Candidates
//! that fail validation are dropped silently. Nothing here can fail; empty or
//! odd input simply yields no candidates.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::keywords;
use crate::session::model::{IndicatorKind, IndicatorSet};

// ── Candidate patterns ──────────────────────────────────────────────

static HANDLE_CANDIDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z0-9.\-_]{2,}@[a-zA-Z]{2,}\b").unwrap());

static PHONE_CANDIDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+91|91|0)?[\s-]?[6-9]\d{4}[\s-]?\d{5}").unwrap());

static SCHEME_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());

static WWW_LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"www\.\S+").unwrap());

static BARE_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-z0-9-]+\.[a-z]{2,}(?:\.[a-z]{2})?(?:/\S*)?").unwrap()
});

static ACCOUNT_CANDIDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{9,18}\b").unwrap());

// ── Validation patterns ─────────────────────────────────────────────

static HANDLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.\-_]{2,}@[a-zA-Z]{2,}$").unwrap());

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\+?91|0)?[6-9]\d{9}$").unwrap());

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^https?://\S+$").unwrap());

static WWW_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^www\.\S+$").unwrap());

static BARE_DOMAIN_FULL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9-]+\.[a-z]{2,}(?:\.[a-z]{2})?(?:/\S*)?$").unwrap()
});

static ACCOUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{9,18}$").unwrap());

/// Characters stripped from the end of a link candidate.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')', ']', '"', '\''];

/// Where a link candidate came from. Scheme links are re-validated strictly;
/// `www.` and bare-domain hits are only checked against their own shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrigin {
    Scheme,
    Www,
    BareDomain,
}

/// A link candidate and the pass that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub value: String,
    pub origin: LinkOrigin,
}

/// Unvalidated, possibly duplicated hits from one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCandidates {
    pub payment_handles: Vec<String>,
    pub bank_accounts: Vec<String>,
    pub suspicious_links: Vec<LinkCandidate>,
    pub phone_numbers: Vec<String>,
}

impl RawCandidates {
    pub fn is_empty(&self) -> bool {
        self.payment_handles.is_empty()
            && self.bank_accounts.is_empty()
            && self.suspicious_links.is_empty()
            && self.phone_numbers.is_empty()
    }
}

/// What a merge added to the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub payment_handles: usize,
    pub bank_accounts: usize,
    pub suspicious_links: usize,
    pub phone_numbers: usize,
    pub suspicious_keywords: usize,
}

impl MergeOutcome {
    pub fn total(&self) -> usize {
        self.payment_handles
            + self.bank_accounts
            + self.suspicious_links
            + self.phone_numbers
            + self.suspicious_keywords
    }
}

// ── Candidate pass ──────────────────────────────────────────────────

/// Gather raw candidates from a single message.
pub fn extract(text: &str) -> RawCandidates {
    let phones = phone_candidates(text);
    let candidates = RawCandidates {
        payment_handles: HANDLE_CANDIDATE_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect(),
        // digits already read as a phone never become an account
        bank_accounts: ACCOUNT_CANDIDATE_RE
            .find_iter(text)
            .filter(|m| !phones.iter().any(|&(s, e, _)| m.start() < e && m.end() > s))
            .map(|m| m.as_str().to_string())
            .collect(),
        suspicious_links: link_candidates(text),
        phone_numbers: phones.into_iter().map(|(_, _, value)| value).collect(),
    };

    debug!(
        handles = candidates.payment_handles.len(),
        accounts = candidates.bank_accounts.len(),
        links = candidates.suspicious_links.len(),
        phones = candidates.phone_numbers.len(),
        "Extracted raw candidates"
    );
    candidates
}

/// Phone hits with their spans, not glued to more digits on either side.
/// A match may open on the separator before the number; the leading check
/// starts at the first digit or `+`.
fn phone_candidates(text: &str) -> Vec<(usize, usize, String)> {
    PHONE_CANDIDATE_RE
        .find_iter(text)
        .filter_map(|m| {
            let value = m.as_str().trim_start_matches(|c: char| c.is_whitespace() || c == '-');
            let start = m.end() - value.len();
            let before = text[..start].chars().next_back();
            let after = text[m.end()..].chars().next();
            if before.is_some_and(|c| c.is_ascii_digit()) || after.is_some_and(|c| c.is_ascii_digit()) {
                return None;
            }
            Some((start, m.end(), value.to_string()))
        })
        .collect()
}

fn link_candidates(text: &str) -> Vec<LinkCandidate> {
    // handles like refund.desk@okaxis must not yield a bare "refund.desk" link
    let mut spans: Vec<(usize, usize)> = HANDLE_CANDIDATE_RE
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    let mut links = Vec::new();

    let passes = [
        (&*SCHEME_LINK_RE, LinkOrigin::Scheme),
        (&*WWW_LINK_RE, LinkOrigin::Www),
        (&*BARE_DOMAIN_RE, LinkOrigin::BareDomain),
    ];

    for (re, origin) in passes {
        for m in re.find_iter(text) {
            // skip pieces of a link an earlier pass already took
            if spans.iter().any(|&(s, e)| m.start() >= s && m.start() < e) {
                continue;
            }
            if origin == LinkOrigin::BareDomain {
                let before = text[..m.start()].chars().next_back();
                if before.is_some_and(|c| c == '.' || c == '@' || c == '_' || c.is_alphanumeric()) {
                    continue;
                }
            }
            spans.push((m.start(), m.end()));
            let value = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if !value.is_empty() {
                links.push(LinkCandidate {
                    value: value.to_string(),
                    origin,
                });
            }
        }
    }
    links
}

/// Scam phrases present in `text`.
pub fn extract_keywords(text: &str) -> Vec<&'static str> {
    keywords::matching_phrases(&text.to_lowercase()).collect()
}

// ── Validation ──────────────────────────────────────────────────────

/// The whole trimmed string must be a payment handle.
pub fn validate_payment_handle(value: &str) -> bool {
    HANDLE_RE.is_match(value.trim())
}

/// Strip spaces and hyphens from a phone candidate.
pub fn normalize_phone(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace() && *c != '-').collect()
}

/// After normalizing, the value must be an optional `+91`, `91` or `0` prefix
/// plus ten digits starting 6-9.
pub fn validate_phone(value: &str) -> bool {
    PHONE_RE.is_match(&normalize_phone(value))
}

/// Validate a link according to the pass that produced it.
pub fn validate_link(candidate: &LinkCandidate) -> bool {
    let value = candidate.value.trim();
    match candidate.origin {
        LinkOrigin::Scheme => URL_RE.is_match(value),
        LinkOrigin::Www => WWW_RE.is_match(value),
        LinkOrigin::BareDomain => BARE_DOMAIN_FULL_RE.is_match(value),
    }
}

/// 9-18 digits that do not also read as a phone number.
pub fn validate_bank_account(value: &str) -> bool {
    let value = value.trim();
    ACCOUNT_RE.is_match(value) && !validate_phone(value)
}

// ── Merge ───────────────────────────────────────────────────────────

/// Validate `raw` and union the survivors and `keywords` into `indicators`.
pub fn merge(indicators: &mut IndicatorSet, raw: &RawCandidates, keywords: &[&str]) -> MergeOutcome {
    let handles = raw
        .payment_handles
        .iter()
        .filter(|h| validate_payment_handle(h))
        .map(|h| h.trim().to_string());
    let accounts = raw
        .bank_accounts
        .iter()
        .filter(|a| validate_bank_account(a))
        .map(|a| a.trim().to_string());
    let links = raw
        .suspicious_links
        .iter()
        .filter(|l| validate_link(l))
        .map(|l| l.value.trim().to_string());
    let phones = raw
        .phone_numbers
        .iter()
        .filter(|p| validate_phone(p))
        .map(|p| normalize_phone(p));

    MergeOutcome {
        payment_handles: indicators.merge(IndicatorKind::PaymentHandle, handles),
        bank_accounts: indicators.merge(IndicatorKind::BankAccount, accounts),
        suspicious_links: indicators.merge(IndicatorKind::SuspiciousLink, links),
        phone_numbers: indicators.merge(IndicatorKind::PhoneNumber, phones),
        suspicious_keywords: indicators
            .merge(IndicatorKind::SuspiciousKeyword, keywords.iter().copied()),
    }
}
