//! HTTP webhook transport: posts the report JSON to the evaluation endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::dispatcher::ReportTransport;
use super::model::Report;
use crate::error::{ConfigError, DeliveryError};

/// Posts reports to a fixed URL. Any 2xx status is success.
pub struct WebhookTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl WebhookTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReportTransport for WebhookTransport {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn deliver(&self, report: &Report) -> Result<(), DeliveryError> {
        let payload = report.to_payload()?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::RequestFailed {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(
            endpoint = %self.endpoint,
            status = status.as_u16(),
            body = %body.chars().take(200).collect::<String>(),
            "Webhook responded"
        );

        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{Json, Router, http::StatusCode, routing::post};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex;

    use super::*;
    use crate::session::model::Session;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://127.0.0.1:{port}/report")
    }

    #[tokio::test]
    async fn posts_report_json() {
        let received: Arc<Mutex<Option<serde_json::Value>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&received);
        let router = Router::new().route(
            "/report",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock().await = Some(body);
                    StatusCode::OK
                }
            }),
        );
        let url = serve(router).await;

        let transport = WebhookTransport::new(url, Duration::from_secs(2)).unwrap();
        let report = Report::from_session(&Session::new("wh-1"));
        transport.deliver(&report).await.unwrap();

        let body = received.lock().await.clone().expect("no body received");
        assert_eq!(body["sessionId"], "wh-1");
        assert_eq!(body["scamDetected"], false);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route("/report", post(|| async { StatusCode::BAD_GATEWAY }));
        let url = serve(router).await;

        let transport = WebhookTransport::new(url, Duration::from_secs(2)).unwrap();
        let err = transport
            .deliver(&Report::from_session(&Session::new("wh-2")))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Status { status: 502, .. }));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let transport =
            WebhookTransport::new("http://127.0.0.1:9/report", Duration::from_millis(500)).unwrap();
        let err = transport
            .deliver(&Report::from_session(&Session::new("wh-3")))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::RequestFailed { .. }));
    }
}
