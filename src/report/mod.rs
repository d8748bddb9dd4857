//! Final report construction and at-most-once delivery.

pub mod dispatcher;
pub mod model;
pub mod webhook;

pub use dispatcher::{ReportDispatcher, ReportTransport};
pub use model::Report;
pub use webhook::WebhookTransport;
