//! MCP Session State Management
//!
//! Sessions are created on `initialize`, touched on every lookup and swept
//! once idle for longer than the configured timeout. Each sweep happens
//! inline with a validity check rather than on a timer.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use dashmap::{DashMap, DashSet};
use tracing::{debug, info};
use uuid::Uuid;

use super::tracker::{ExecutionRequestId, McpConnectionTracker};

/// Idle time after which a session expires
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(10 * 60);

// =============================================================================
// Session
// =============================================================================

/// One client session
#[derive(Debug)]
pub struct McpSession {
    id: String,
    created_at: Instant,
    last_accessed: Mutex<Instant>,
    /// Cancellable calls currently executing under this session
    active_requests: DashSet<ExecutionRequestId>,
}

impl McpSession {
    pub fn new(id: String) -> Self {
        let now = Instant::now();
        Self {
            id,
            created_at: now,
            last_accessed: Mutex::new(now),
            active_requests: DashSet::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_accessed(&self) -> Instant {
        *self
            .last_accessed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn touch(&self) {
        *self
            .last_accessed
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_accessed().elapsed() > timeout
    }

    pub fn add_active_request(&self, id: ExecutionRequestId) {
        self.active_requests.insert(id);
    }

    pub fn remove_active_request(&self, id: &ExecutionRequestId) {
        self.active_requests.remove(id);
    }

    pub fn active_request_count(&self) -> usize {
        self.active_requests.len()
    }

    /// Removes and returns every active request id
    pub fn take_active_requests(&self) -> Vec<ExecutionRequestId> {
        let ids: Vec<_> = self
            .active_requests
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for id in &ids {
            self.active_requests.remove(id);
        }
        ids
    }
}

// =============================================================================
// Session Store
// =============================================================================

/// Concurrent store of live sessions, keyed by session id
#[derive(Debug)]
pub struct McpSessionStore {
    sessions: DashMap<String, Arc<McpSession>>,
    connections: Arc<McpConnectionTracker>,
    timeout: Duration,
}

impl McpSessionStore {
    pub fn new(connections: Arc<McpConnectionTracker>) -> Self {
        Self::with_timeout(connections, DEFAULT_SESSION_TIMEOUT)
    }

    pub fn with_timeout(connections: Arc<McpConnectionTracker>, timeout: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            connections,
            timeout,
        }
    }

    /// Creates a session under a fresh random id and returns the id
    pub fn create_session(&self) -> String {
        let id = Uuid::new_v4().simple().to_string();
        self.sessions
            .insert(id.clone(), Arc::new(McpSession::new(id.clone())));
        info!("Created MCP session {}", id);
        id
    }

    /// Looks up a session and refreshes its last-access time
    pub fn get_session(&self, id: &str) -> Option<Arc<McpSession>> {
        let session = self.sessions.get(id)?.value().clone();
        session.touch();
        Some(session)
    }

    /// Sweeps expired sessions, then reports whether `id` is still live
    pub fn is_valid(&self, id: &str) -> bool {
        self.cleanup_old_sessions();
        self.sessions.contains_key(id)
    }

    /// Removes a session and cancels its outstanding calls
    pub fn delete_session(&self, id: &str) -> bool {
        match self.sessions.remove(id) {
            Some((_, session)) => {
                self.connections.cancel_session_requests(&session);
                info!("Deleted MCP session {}", id);
                true
            }
            None => false,
        }
    }

    /// Removes every session idle for longer than the timeout
    pub fn cleanup_old_sessions(&self) -> usize {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired(self.timeout))
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for id in expired {
            // Re-check under the shard lock; the session may have been touched since
            let timeout = self.timeout;
            if let Some((_, session)) = self.sessions.remove_if(&id, |_, s| s.is_expired(timeout)) {
                debug!("MCP session {} expired", id);
                self.connections.cancel_session_requests(&session);
                removed += 1;
            }
        }
        removed
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::models::RequestId;
    use crate::session::tracker::{McpRequestTracker, SESSION_CANCELLED_REASON};
    use crate::tools::Cancellation;

    fn store_with_timeout(timeout: Duration) -> (McpSessionStore, Arc<McpRequestTracker>) {
        let requests = Arc::new(McpRequestTracker::new());
        let connections = Arc::new(McpConnectionTracker::new(requests.clone(), false));
        (McpSessionStore::with_timeout(connections, timeout), requests)
    }

    #[test]
    fn test_create_and_get_session() {
        let (store, _) = store_with_timeout(DEFAULT_SESSION_TIMEOUT);
        let id = store.create_session();
        let other = store.create_session();

        assert_ne!(id, other);
        assert!(store.is_valid(&id));
        assert_eq!(store.get_session(&id).unwrap().id(), id);
        assert!(store.get_session("unknown").is_none());
        assert!(!store.is_valid("unknown"));
    }

    #[test]
    fn test_get_session_touches() {
        let (store, _) = store_with_timeout(DEFAULT_SESSION_TIMEOUT);
        let id = store.create_session();

        let before = store.get_session(&id).unwrap().last_accessed();
        std::thread::sleep(Duration::from_millis(5));
        let session = store.get_session(&id).unwrap();

        assert!(session.last_accessed() >= before);
        assert!(session.last_accessed() > session.created_at());
    }

    #[test]
    fn test_expired_sessions_are_swept_by_is_valid() {
        let (store, _) = store_with_timeout(Duration::from_millis(20));
        let stale = store.create_session();
        std::thread::sleep(Duration::from_millis(40));
        let fresh = store.create_session();

        assert!(!store.is_valid(&stale));
        assert!(store.is_valid(&fresh));
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_cleanup_cancels_outstanding_requests() {
        let (store, requests) = store_with_timeout(Duration::from_millis(20));
        let id = store.create_session();
        let session = store.get_session(&id).unwrap();

        let request = ExecutionRequestId::new(RequestId::from(1), "127.0.0.1");
        let cancellation = Cancellation::new();
        requests
            .register_ongoing_request(request.clone(), cancellation.clone())
            .unwrap();
        session.add_active_request(request.clone());

        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(store.cleanup_old_sessions(), 1);

        assert!(cancellation.is_cancelled());
        assert_eq!(cancellation.reason().as_deref(), Some(SESSION_CANCELLED_REASON));
        assert!(!requests.is_ongoing_request(&request));
    }

    #[test]
    fn test_delete_session() {
        let (store, requests) = store_with_timeout(DEFAULT_SESSION_TIMEOUT);
        let id = store.create_session();
        let session = store.get_session(&id).unwrap();

        let request = ExecutionRequestId::new(RequestId::String("a".into()), "127.0.0.1");
        let cancellation = Cancellation::new();
        requests
            .register_ongoing_request(request.clone(), cancellation.clone())
            .unwrap();
        session.add_active_request(request);

        assert!(store.delete_session(&id));
        assert!(!store.delete_session(&id));
        assert!(!store.is_valid(&id));
        assert!(cancellation.is_cancelled());
    }
}
