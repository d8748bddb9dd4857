//! Engagement pipeline.
//!
//! Every inbound turn flows through:
//! 1. `classifier::classify()`: keyword and artifact scoring, no LLM
//! 2. `extractor`: candidate indicators, validated before merge
//! 3. `policy::EngagementPolicy`: continue or stop
//! 4. `processor::Engine`: orchestrates the above plus reply and report

pub mod classifier;
pub mod extractor;
pub mod keywords;
pub mod policy;
pub mod processor;
pub mod types;

pub use processor::Engine;
