//! Honeypot engine: engages suspected scam conversations and extracts intelligence.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod report;
pub mod session;
