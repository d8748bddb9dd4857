//! Session registry: process-wide map from conversation id to session.
//!
//! The map lock is held only long enough to look up or insert a handle; each
//! session then has its own mutex. Turns for different ids never wait on each
//! other, and turns for the same id are serialized per mutation.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use super::model::Session;
use crate::pipeline::types::Message;

type SessionHandle = Arc<Mutex<Session>>;

/// In-memory session store with per-key locking.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn handle(&self, id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(id) {
            return Arc::clone(handle);
        }

        let mut sessions = self.sessions.write().await;
        let handle = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!(session_id = %id, "Creating session");
            Arc::new(Mutex::new(Session::new(id)))
        });
        Arc::clone(handle)
    }

    /// Run `f` against the session under its lock, creating it if needed.
    ///
    /// Never hold this across an external call.
    pub async fn with_session<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let handle = self.handle(id).await;
        let mut session = handle.lock().await;
        f(&mut session)
    }

    /// Snapshot of the session, created lazily on first reference.
    pub async fn get_or_create(&self, id: &str) -> Session {
        self.with_session(id, |s| s.clone()).await
    }

    /// Append a message and bump the counter atomically.
    pub async fn append_message(&self, id: &str, message: Message) -> Session {
        self.with_session(id, |s| {
            s.append(message);
            s.clone()
        })
        .await
    }

    /// Returns true if this call engaged the session.
    pub async fn mark_engaged(&self, id: &str) -> bool {
        let engaged = self.with_session(id, Session::engage).await;
        if engaged {
            info!(session_id = %id, "Session engaged");
        }
        engaged
    }

    /// Set the end time if unset. Returns true if this call set it.
    pub async fn mark_complete(&self, id: &str) -> bool {
        self.with_session(id, |s| s.complete_at(Utc::now())).await
    }

    /// Seconds from start to end (or to now while open).
    pub async fn elapsed_seconds(&self, id: &str) -> i64 {
        self.with_session(id, |s| s.elapsed_seconds_at(Utc::now()))
            .await
    }

    pub async fn mark_report_delivered(&self, id: &str) {
        self.with_session(id, Session::mark_report_delivered).await;
    }

    pub async fn report_already_delivered(&self, id: &str) -> bool {
        self.with_session(id, |s| s.report_delivered()).await
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Drop sessions that started before `cutoff`. Returns how many were removed.
    ///
    /// Nothing calls this automatically; sessions otherwise live for the
    /// process lifetime.
    pub async fn evict_started_before(&self, cutoff: DateTime<Utc>) -> usize {
        let handles: Vec<(String, SessionHandle)> = self
            .sessions
            .read()
            .await
            .iter()
            .map(|(id, h)| (id.clone(), Arc::clone(h)))
            .collect();

        let mut stale = Vec::new();
        for (id, handle) in handles {
            if handle.lock().await.started() < cutoff {
                stale.push(id);
            }
        }

        let mut sessions = self.sessions.write().await;
        let removed = stale.iter().filter(|id| sessions.remove(*id).is_some()).count();
        if removed > 0 {
            info!(count = removed, "Evicted stale sessions");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::pipeline::types::Sender;

    fn msg(text: &str) -> Message {
        Message::new(Sender::Counterpart, text, Utc::now())
    }

    #[tokio::test]
    async fn sessions_are_created_lazily() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty().await);
        let session = registry.get_or_create("a").await;
        assert_eq!(session.id(), "a");
        assert_eq!(session.message_count(), 0);
        assert_eq!(registry.len().await, 1);
        registry.get_or_create("a").await;
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn append_returns_updated_snapshot() {
        let registry = SessionRegistry::new();
        registry.append_message("a", msg("one")).await;
        let session = registry.append_message("a", msg("two")).await;
        assert_eq!(session.message_count(), 2);
        assert_eq!(session.history().len(), 2);
    }

    #[tokio::test]
    async fn engage_and_complete_are_one_shot() {
        let registry = SessionRegistry::new();
        assert!(registry.mark_engaged("a").await);
        assert!(!registry.mark_engaged("a").await);

        assert!(registry.mark_complete("a").await);
        let ended = registry.get_or_create("a").await.ended();
        assert!(!registry.mark_complete("a").await);
        assert_eq!(registry.get_or_create("a").await.ended(), ended);
    }

    #[tokio::test]
    async fn report_delivered_is_idempotent() {
        let registry = SessionRegistry::new();
        registry.mark_engaged("a").await;
        registry.mark_complete("a").await;
        assert!(!registry.report_already_delivered("a").await);
        registry.mark_report_delivered("a").await;
        registry.mark_report_delivered("a").await;
        assert!(registry.report_already_delivered("a").await);
    }

    #[tokio::test]
    async fn elapsed_is_non_negative() {
        let registry = SessionRegistry::new();
        assert!(registry.elapsed_seconds("a").await >= 0);
    }

    #[tokio::test]
    async fn concurrent_appends_do_not_lose_messages() {
        let registry = SessionRegistry::new();
        let mut tasks = Vec::new();
        for i in 0..50 {
            let registry = Arc::clone(&registry);
            tasks.push(tokio::spawn(async move {
                registry.append_message("shared", msg(&format!("m{i}"))).await;
            }));
        }
        for task in futures::future::join_all(tasks).await {
            task.unwrap();
        }
        let session = registry.get_or_create("shared").await;
        assert_eq!(session.message_count(), 50);
        assert_eq!(session.history().len(), 50);
    }

    #[tokio::test]
    async fn held_session_does_not_block_other_ids() {
        let registry = SessionRegistry::new();
        registry.get_or_create("slow").await;
        let handle = registry.handle("slow").await;
        let _guard = handle.lock().await;

        let other = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            registry.append_message("fast", msg("hi")),
        )
        .await
        .expect("other session blocked");
        assert_eq!(other.message_count(), 1);
    }

    #[tokio::test]
    async fn eviction_is_keyed_by_start_time() {
        let registry = SessionRegistry::new();
        registry.get_or_create("a").await;
        registry.get_or_create("b").await;

        assert_eq!(registry.evict_started_before(Utc::now() - Duration::hours(1)).await, 0);
        assert_eq!(registry.evict_started_before(Utc::now() + Duration::seconds(1)).await, 2);
        assert!(registry.is_empty().await);
    }
}
