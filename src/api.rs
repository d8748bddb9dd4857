//! HTTP surface: inbound turns and health.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, TimeZone, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::pipeline::Engine;
use crate::pipeline::types::{EngagementResponse, InboundEvent, Sender};

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Expected `x-api-key` value; `None` accepts every caller.
    pub api_key: Option<SecretString>,
}

/// Build the router.
pub fn routes(engine: Arc<Engine>, api_key: Option<SecretString>) -> Router {
    let state = AppState { engine, api_key };

    Router::new()
        .route("/inbound", post(inbound))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        };
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRequest {
    pub session_id: String,
    pub message: InboundMessage,
    /// Accepted for compatibility; the registry is the source of truth.
    #[serde(default)]
    pub conversation_history: Vec<serde_json::Value>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub sender: Sender,
    pub text: String,
    /// RFC 3339 string or epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InboundReply {
    pub status: &'static str,
    #[serde(flatten)]
    pub response: EngagementResponse,
}

impl InboundRequest {
    pub fn into_event(self) -> InboundEvent {
        let metadata = self.metadata.unwrap_or_default();
        InboundEvent {
            session_id: self.session_id,
            sender: self.message.sender,
            text: self.message.text,
            timestamp: self.message.timestamp.as_ref().and_then(parse_timestamp),
            channel: metadata.channel,
            locale: metadata.locale,
        }
    }
}

/// Unparseable timestamps are dropped and the engine stamps arrival time.
fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok(),
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

// ── Handlers ────────────────────────────────────────────────────────

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = &state.api_key else {
        return Ok(());
    };
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if provided == expected.expose_secret() {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

async fn inbound(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<InboundRequest>,
) -> Result<Json<InboundReply>, ApiError> {
    if let Err(e) = authorize(&state, &headers) {
        warn!("Rejected inbound request without a valid API key");
        return Err(e);
    }

    let event = body.into_event();
    let session_id = event.session_id.clone();
    let response = state.engine.handle(event).await;
    info!(
        session_id = %session_id,
        scam_detected = response.scam_detected,
        total_messages = response.total_messages_exchanged,
        complete = response.engagement_complete,
        "Turn processed"
    );

    Ok(Json(InboundReply {
        status: "success",
        response,
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::config::EngineConfig;
    use crate::llm::ScriptedReplyGenerator;
    use crate::report::{Report, ReportTransport};
    use crate::session::SessionRegistry;

    struct NullTransport;

    #[async_trait::async_trait]
    impl ReportTransport for NullTransport {
        fn name(&self) -> &str {
            "null"
        }

        async fn deliver(&self, _report: &Report) -> Result<(), crate::error::DeliveryError> {
            Ok(())
        }
    }

    fn app(api_key: Option<&str>) -> Router {
        let engine = Engine::new(
            EngineConfig::default(),
            SessionRegistry::new(),
            Arc::new(ScriptedReplyGenerator),
            Arc::new(NullTransport),
        );
        routes(
            Arc::new(engine),
            api_key.map(|k| SecretString::from(k.to_string())),
        )
    }

    fn inbound_request(key: Option<&str>, body: serde_json::Value) -> Request<Body> {
        let mut builder = Request::post("/inbound").header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn timestamp_formats() {
        let rfc = parse_timestamp(&serde_json::json!("2025-01-30T10:00:00Z")).unwrap();
        assert_eq!(rfc.timestamp(), 1_738_231_200);
        let ms = parse_timestamp(&serde_json::json!(1_738_231_200_000i64)).unwrap();
        assert_eq!(ms, rfc);
        assert!(parse_timestamp(&serde_json::json!("yesterday")).is_none());
        assert!(parse_timestamp(&serde_json::json!(true)).is_none());
    }

    #[test]
    fn request_maps_to_event() {
        let request: InboundRequest = serde_json::from_value(serde_json::json!({
            "sessionId": "abc",
            "message": {"sender": "scammer", "text": "hi", "timestamp": "2025-01-30T10:00:00Z"},
            "conversationHistory": [],
            "metadata": {"channel": "WHATSAPP", "language": "English", "locale": "IN"}
        }))
        .unwrap();
        let event = request.into_event();
        assert_eq!(event.session_id, "abc");
        assert_eq!(event.sender, Sender::Counterpart);
        assert_eq!(event.channel.as_deref(), Some("WHATSAPP"));
        assert!(event.timestamp.is_some());
    }

    #[tokio::test]
    async fn missing_key_is_unauthorized() {
        let response = app(Some("secret"))
            .oneshot(inbound_request(
                None,
                serde_json::json!({"sessionId": "s", "message": {"sender": "scammer", "text": "hi"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["detail"], "Unauthorized");
    }

    #[tokio::test]
    async fn scam_turn_returns_engagement_fields() {
        let response = app(Some("secret"))
            .oneshot(inbound_request(
                Some("secret"),
                serde_json::json!({
                    "sessionId": "s1",
                    "message": {"sender": "scammer", "text": "Send Rs 500 to help.desk@ybl immediately"}
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["scamDetected"], true);
        assert_eq!(body["totalMessagesExchanged"], 1);
        assert_eq!(body["engagementComplete"], false);
        assert_eq!(body["reportDelivered"], false);
        assert!(body["agentReply"].is_string());
        assert_eq!(body["extractedIntelligence"]["paymentHandles"][0], "help.desk@ybl");
    }

    #[tokio::test]
    async fn no_key_configured_accepts_all() {
        let response = app(None)
            .oneshot(inbound_request(
                None,
                serde_json::json!({"sessionId": "s", "message": {"sender": "user", "text": "hello"}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["scamDetected"], false);
        assert!(body["agentReply"].is_null());
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let response = app(Some("secret"))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "healthy");
    }
}
