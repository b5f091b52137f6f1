//! Shared session state
//!
//! Readers (the query client) and the background refresher run concurrently;
//! the store therefore only ever swaps complete [`SessionSnapshot`] values.
//! A reader either sees the previous cycle's snapshot or the new one —
//! stale-but-consistent is fine, a token/session mix across cycles is not.

use std::sync::Arc;

use prospector_domain::SessionSnapshot;
use tokio::sync::RwLock;

/// Thread-safe slot for the current session credentials
///
/// Cloning the store clones the handle, not the state.
#[derive(Clone, Default)]
pub struct SessionStore {
    current: Arc<RwLock<Option<SessionSnapshot>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish the credentials from a completed login cycle, replacing any
    /// previous snapshot in one step.
    pub async fn publish(&self, snapshot: SessionSnapshot) {
        *self.current.write().await = Some(snapshot);
    }

    /// Clone out the current snapshot, or `None` when unauthenticated.
    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.current.read().await.clone()
    }

    /// Drop the current credentials.
    pub async fn clear(&self) {
        *self.current.write().await = None;
    }

    /// Check whether a login cycle has completed.
    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Seconds until the current token expires, or `None` when
    /// unauthenticated.
    pub async fn seconds_until_expiry(&self) -> Option<i64> {
        self.current.read().await.as_ref().map(SessionSnapshot::seconds_until_expiry)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::session.
    use super::*;

    #[tokio::test]
    async fn starts_unauthenticated() {
        let store = SessionStore::new();
        assert!(!store.is_authenticated().await);
        assert!(store.snapshot().await.is_none());
        assert!(store.seconds_until_expiry().await.is_none());
    }

    #[tokio::test]
    async fn publish_replaces_whole_snapshot() {
        let store = SessionStore::new();

        store.publish(SessionSnapshot::new("t1".to_string(), 3600, "s1".to_string())).await;
        store.publish(SessionSnapshot::new("t2".to_string(), 3600, "s2".to_string())).await;

        let snapshot = store.snapshot().await.unwrap();
        // Token and session id always come from the same cycle
        assert_eq!(snapshot.access_token, "t2");
        assert_eq!(snapshot.session_id, "s2");
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = SessionStore::new();
        let reader = store.clone();

        store.publish(SessionSnapshot::new("t".to_string(), 60, "s".to_string())).await;
        assert!(reader.is_authenticated().await);

        store.clear().await;
        assert!(!reader.is_authenticated().await);
    }
}
