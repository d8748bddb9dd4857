//! Engagement engine: runs one inbound turn end to end.
//!
//! Flow per turn:
//! 1. Under the session lock: append, classify, engage, extract, evaluate policy
//! 2. Lock released: generate a reply (bounded, falls back on failure)
//! 3. Re-lock to record the reply
//! 4. If the policy stopped the session: dispatch the final report
//!
//! No session lock is ever held across the reply or delivery call.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, KeywordScope};
use crate::error::LlmError;
use crate::llm::{FALLBACK_REPLY, ReplyContext, ReplyGenerator};
use crate::pipeline::policy::{EngagementPolicy, StopReason};
use crate::pipeline::types::{EngagementResponse, InboundEvent, Message, Sender};
use crate::pipeline::{classifier, extractor};
use crate::report::dispatcher::{ReportDispatcher, ReportTransport};
use crate::session::model::Session;
use crate::session::registry::SessionRegistry;

/// What phase 1 decided, carried across the unlocked section.
struct TurnOutcome {
    snapshot: Session,
    stop: Option<StopReason>,
    reply_ctx: Option<ReplyContext>,
}

/// Orchestrates classifier, extractor, policy, reply generation and reporting.
pub struct Engine {
    registry: Arc<SessionRegistry>,
    generator: Arc<dyn ReplyGenerator>,
    dispatcher: ReportDispatcher,
    policy: EngagementPolicy,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        registry: Arc<SessionRegistry>,
        generator: Arc<dyn ReplyGenerator>,
        transport: Arc<dyn ReportTransport>,
    ) -> Self {
        Self {
            registry,
            generator,
            dispatcher: ReportDispatcher::new(transport, config.delivery_timeout),
            policy: EngagementPolicy::from(&config),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Process one inbound event. Never fails; collaborator problems show up
    /// as a fallback reply or `report_delivered: false`.
    pub async fn handle(&self, event: InboundEvent) -> EngagementResponse {
        let session_id = event.session_id.clone();
        let scam = classifier::classify(&event.text);
        debug!(session_id = %session_id, sender = %event.sender, scam, "Inbound message");

        let outcome = self.apply_inbound(&event, scam).await;
        let mut snapshot = outcome.snapshot;

        let mut agent_reply = None;
        if let Some(ctx) = outcome.reply_ctx {
            let reply = self.generate_reply(&ctx).await;
            snapshot = self
                .registry
                .with_session(&session_id, |s| {
                    s.record_reply(Message::new(Sender::Agent, reply.clone(), Utc::now()));
                    s.clone()
                })
                .await;
            agent_reply = Some(reply);
        }

        let mut report_delivered = false;
        if let Some(reason) = outcome.stop {
            info!(
                session_id = %session_id,
                reason = reason.label(),
                messages = snapshot.message_count(),
                "Engagement complete"
            );
            report_delivered = self
                .dispatcher
                .dispatch_if_due(&self.registry, &session_id)
                .await;
        }

        EngagementResponse {
            scam_detected: snapshot.is_engaged(),
            engagement_duration_seconds: snapshot.elapsed_seconds_at(Utc::now()),
            total_messages_exchanged: snapshot.message_count(),
            extracted_intelligence: snapshot.indicators().clone(),
            agent_notes: snapshot.notes().to_string(),
            agent_reply,
            engagement_complete: outcome.stop.is_some(),
            report_delivered,
        }
    }

    // ── Phase 1: locked, pure computation ───────────────────────────

    async fn apply_inbound(&self, event: &InboundEvent, scam: bool) -> TurnOutcome {
        let now = Utc::now();
        let scope = self.config.keyword_scope;
        let policy = self.policy;

        self.registry
            .with_session(&event.session_id, |s| {
                s.append(Message::new(
                    event.sender,
                    event.text.clone(),
                    event.timestamp.unwrap_or(now),
                ));

                if scam && s.engage() {
                    info!(session_id = %event.session_id, "Session engaged");
                }

                if s.is_engaged() {
                    extract_into(s, &event.text, scope);
                }

                let stop = policy.stop_reason(s);
                if stop.is_some() {
                    s.complete_at(now);
                }

                let reply_ctx = s.is_engaged().then(|| {
                    ReplyContext::from_session(s, event.channel_or_default(), event.locale_or_default())
                });

                TurnOutcome {
                    snapshot: s.clone(),
                    stop,
                    reply_ctx,
                }
            })
            .await
    }

    // ── Phase 2: unlocked, bounded external call ────────────────────

    async fn generate_reply(&self, ctx: &ReplyContext) -> String {
        let timeout = self.config.reply_timeout;
        let result = match tokio::time::timeout(timeout, self.generator.generate(ctx)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(timeout)),
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    session_id = %ctx.session_id,
                    generator = self.generator.name(),
                    error = %e,
                    "Reply generation failed, using fallback"
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

/// Extract from the latest text and merge validated indicators into the session.
fn extract_into(session: &mut Session, text: &str, scope: KeywordScope) {
    let raw = extractor::extract(text);
    let keywords = match scope {
        KeywordScope::LatestMessage => extractor::extract_keywords(text),
        KeywordScope::Conversation => {
            let conversation: Vec<&str> = session
                .history()
                .iter()
                .filter(|m| m.sender == Sender::Counterpart)
                .map(|m| m.text.as_str())
                .collect();
            extractor::extract_keywords(&conversation.join(" "))
        }
    };

    let added = extractor::merge(session.indicators_mut(), &raw, &keywords);
    if added.total() > 0 {
        debug!(
            session_id = %session.id(),
            handles = added.payment_handles,
            accounts = added.bank_accounts,
            links = added.suspicious_links,
            phones = added.phone_numbers,
            keywords = added.suspicious_keywords,
            "New indicators"
        );
    }

    let summary = session.indicators().summary();
    session.append_note(&summary);
}
