//! Report dispatcher: delivers at most one successful report per session.
//!
//! The session's delivery claim is taken and released under its lock, but the
//! transport call itself runs with no lock held.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::model::Report;
use crate::error::DeliveryError;
use crate::session::registry::SessionRegistry;

/// Outbound transport for final reports.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Deliver one report. `Ok` means the endpoint accepted it.
    async fn deliver(&self, report: &Report) -> Result<(), DeliveryError>;
}

/// Sends reports through a transport with a bounded wait.
pub struct ReportDispatcher {
    transport: Arc<dyn ReportTransport>,
    timeout: Duration,
}

impl ReportDispatcher {
    pub fn new(transport: Arc<dyn ReportTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Deliver a report. A timeout counts as a failure.
    pub async fn dispatch(&self, report: &Report) -> Result<(), DeliveryError> {
        match tokio::time::timeout(self.timeout, self.transport.deliver(report)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(self.timeout)),
        }
    }

    /// Deliver the session's report if it is due and not yet delivered.
    ///
    /// Returns true only when this call delivered it. A failed attempt leaves
    /// the session eligible for a retry on its next inbound event.
    pub async fn dispatch_if_due(&self, registry: &SessionRegistry, session_id: &str) -> bool {
        let report = registry
            .with_session(session_id, |s| {
                s.begin_delivery().then(|| Report::from_session(s))
            })
            .await;
        let Some(report) = report else {
            return false;
        };

        info!(
            session_id = %session_id,
            transport = self.transport.name(),
            total_messages = report.total_messages_exchanged,
            "Dispatching final report"
        );

        let delivered = match self.dispatch(&report).await {
            Ok(()) => {
                info!(session_id = %session_id, "Final report delivered");
                true
            }
            Err(DeliveryError::Timeout(after)) => {
                warn!(session_id = %session_id, timeout = ?after, "Final report timed out");
                false
            }
            Err(e) => {
                error!(session_id = %session_id, error = %e, "Final report delivery failed");
                false
            }
        };

        registry
            .with_session(session_id, |s| s.finish_delivery(delivered))
            .await;
        delivered
    }
}
