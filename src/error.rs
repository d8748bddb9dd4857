//! Error types for the honeypot engine.
//!
//! None of these ever abort a turn: the processor maps collaborator errors to
//! fallbacks and reflects them in the per-event response.

use std::time::Duration;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Reply generation (LLM provider) errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Provider {provider} returned an empty completion")]
    EmptyCompletion { provider: String },

    #[error("Reply generation timed out after {0:?}")]
    Timeout(Duration),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Report delivery errors.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("Endpoint {endpoint} responded with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

/// HTTP surface errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,
}
