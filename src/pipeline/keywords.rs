//! Scam indicator phrases shared by the classifier and the keyword extractor.
//!
//! Entries are lowercase and matched as plain substrings of the case-folded
//! message. Very short tokens that occur inside ordinary English words
//! ("now", "rs", "pin", "won") are left out.

/// Scam indicator phrases, grouped by scam family.
pub const SCAM_PHRASES: &[&str] = &[
    // Banking / KYC
    "verify",
    "verify now",
    "verify identity",
    "verify account",
    "verify immediately",
    "account",
    "account suspension",
    "account blocked",
    "account disabled",
    "suspend",
    "suspended",
    "blocking",
    "blocked",
    "disable",
    "urgent",
    "urgently",
    "immediately",
    "asap",
    "otp",
    "share otp",
    "send otp",
    "otp needed",
    "kyc",
    "kyc verification",
    "kyc incomplete",
    "kyc update",
    "kyc failed",
    "pan number",
    "aadhaar",
    "aadhaar number",
    "rbi",
    "rbi notice",
    "rbi alert",
    "sbi alert",
    "sbi notice",
    "bank alert",
    "bank notice",
    "reserve bank",
    "bank account",
    "debit card",
    "credit card",
    "card disabled",
    "card blocked",
    "card cancelled",
    "unusual activity",
    "suspicious activity",
    "unauthorized transaction",
    "click here",
    "click link",
    "download form",
    "download app",
    "attached form",
    "attached document",
    "update immediately",
    "confirm details",
    // Delivery / refund
    "parcel",
    "shipment",
    "customs duty",
    "import tax",
    "courier",
    "reschedule",
    "refund",
    "refund pending",
    "refund initiated",
    "payment required",
    "pay now",
    "payment needed",
    "incorrect address",
    "delivery failed",
    "confirm address",
    "update address",
    // Prize / job / loan
    "congratulations",
    "prize",
    "prize money",
    "contest",
    "kaun banega crorepati",
    "kbc",
    "lottery",
    "lottery winner",
    "lucky draw",
    "job offer",
    "job opening",
    "job opportunity",
    "work from home",
    "part time",
    "part-time",
    "earn money",
    "₹",
    "rupees",
    "lakh",
    "crore",
    "loan",
    "loan approved",
    "instant credit",
    "processing fee",
    "application fee",
    "fee required",
    "no skills needed",
    "no experience needed",
    "no qualification",
    // Investment / crypto
    "double money",
    "double your money",
    "multiply money",
    "crypto",
    "bitcoin",
    "ethereum",
    "blockchain",
    "investment",
    "invest now",
    "investment opportunity",
    "monthly return",
    "daily return",
    "guaranteed return",
    "fixed deposit",
    "fd scheme",
    "high interest",
    "guaranteed profit",
    "govt scheme",
    "government scheme",
    "limited slots",
    "limited time",
    "limited offer",
    // Romance / social engineering
    "stuck abroad",
    "emergency",
    "send money",
    "send funds",
    "need money",
    "paytm",
    "google pay",
    "phonepe",
    "bank transfer",
    "payment method",
    "resend money",
    "transfer back",
    "send back",
    "personal help",
    "urgent help",
    "immediate help",
    // Threats / urgency
    "sim deactivate",
    "deactivated",
    "deactivation",
    "income tax",
    "tax raid",
    "tax dues",
    "cyber cell",
    "cyber crime",
    "police complaint",
    "complaint filed",
    "case registered",
    "resolve immediately",
    "clear dues",
    "pay fine",
    "pay penalty",
    "action will be taken",
    "legal action",
    "court order",
    "arrest warrant",
    // General
    "send upi",
    "upi details",
    "upi id",
    "upi handle",
    "upi",
    "phishing",
    "bit.ly",
    "transfer money",
    "transfer funds",
    "share details",
    "provide details",
    "give details",
    "confirm",
    "confirm account",
    "update details",
    "validate",
    "validate account",
    "validate identity",
    "authenticate",
    "two-factor",
    "dm me",
    "password",
    "cvv",
    "mobile number",
    "phone number",
    "contact number",
];

/// Every phrase from [`SCAM_PHRASES`] that occurs in `lowered`.
///
/// `lowered` must already be case-folded.
pub fn matching_phrases(lowered: &str) -> impl Iterator<Item = &'static str> + '_ {
    SCAM_PHRASES
        .iter()
        .copied()
        .filter(move |phrase| lowered.contains(phrase))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn phrases_are_lowercase_and_unique() {
        let mut seen = HashSet::new();
        for phrase in SCAM_PHRASES {
            assert_eq!(*phrase, phrase.to_lowercase(), "not lowercase: {phrase}");
            assert!(seen.insert(*phrase), "duplicate phrase: {phrase}");
        }
    }

    #[test]
    fn list_covers_every_family() {
        assert!(SCAM_PHRASES.len() >= 150);
        for phrase in ["kyc", "refund", "lottery", "bitcoin", "send money", "legal action", "upi id"] {
            assert!(SCAM_PHRASES.contains(&phrase), "missing {phrase}");
        }
    }

    #[test]
    fn matching_is_substring_based() {
        let found: Vec<_> = matching_phrases("your kyc update is pending").collect();
        assert!(found.contains(&"kyc"));
        assert!(found.contains(&"kyc update"));
        assert!(!found.contains(&"refund"));
    }
}
