//! Per-conversation state and the registry that owns it.

pub mod model;
pub mod registry;

pub use model::{IndicatorKind, IndicatorSet, Session};
pub use registry::SessionRegistry;
