//! In-flight request tracking
//!
//! Cancellable tool calls are registered under an [`ExecutionRequestId`] for
//! as long as they run, so that a `notifications/cancelled` message or a
//! session teardown can reach their [`Cancellation`] handle.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::state::McpSession;
use crate::mcp::error::JsonRpcError;
use crate::mcp::models::RequestId;
use crate::tools::Cancellation;

/// Reason recorded on calls cancelled by session teardown
pub const SESSION_CANCELLED_REASON: &str = "Session cancelled";

/// Client-chosen request id scoped to the peer that sent it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecutionRequestId {
    pub id: RequestId,
    pub peer: String,
}

impl ExecutionRequestId {
    pub fn new(id: RequestId, peer: impl Into<String>) -> Self {
        Self {
            id,
            peer: peer.into(),
        }
    }
}

impl fmt::Display for ExecutionRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.peer)
    }
}

// =============================================================================
// Request Tracker
// =============================================================================

/// Registry of cancellable calls currently executing
#[derive(Debug, Default)]
pub struct McpRequestTracker {
    ongoing: DashMap<ExecutionRequestId, Cancellation>,
}

impl McpRequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `INVALID_PARAMS` if `id` is already registered; the existing
    /// registration is left untouched.
    pub fn register_ongoing_request(
        &self,
        id: ExecutionRequestId,
        cancellation: Cancellation,
    ) -> Result<(), JsonRpcError> {
        match self.ongoing.entry(id) {
            Entry::Occupied(entry) => Err(JsonRpcError::invalid_params(format!(
                "Request {} is already in progress",
                entry.key().id
            ))),
            Entry::Vacant(entry) => {
                entry.insert(cancellation);
                Ok(())
            }
        }
    }

    pub fn deregister_ongoing_request(&self, id: &ExecutionRequestId) {
        self.ongoing.remove(id);
    }

    /// Removes the registration of `id` only while it still holds
    /// `cancellation`; a later call that reused the id keeps its entry.
    pub fn release_ongoing_request(&self, id: &ExecutionRequestId, cancellation: &Cancellation) {
        self.ongoing
            .remove_if(id, |_, registered| registered.same_as(cancellation));
    }

    pub fn is_ongoing_request(&self, id: &ExecutionRequestId) -> bool {
        self.ongoing.contains_key(id)
    }

    pub fn get_ongoing_request_cancellation(&self, id: &ExecutionRequestId) -> Option<Cancellation> {
        self.ongoing.get(id).map(|entry| entry.value().clone())
    }

    pub fn ongoing_count(&self) -> usize {
        self.ongoing.len()
    }
}

// =============================================================================
// Connection Tracker
// =============================================================================

/// Session-aware view over the request tracker
#[derive(Debug)]
pub struct McpConnectionTracker {
    requests: Arc<McpRequestTracker>,
    stateless: bool,
}

impl McpConnectionTracker {
    pub fn new(requests: Arc<McpRequestTracker>, stateless: bool) -> Self {
        Self {
            requests,
            stateless,
        }
    }

    /// Cancels every call still running under `session`
    pub fn cancel_session_requests(&self, session: &McpSession) {
        if self.stateless {
            return;
        }

        for id in session.take_active_requests() {
            let cancellation = self
                .requests
                .ongoing
                .remove(&id)
                .map(|(_, cancellation)| cancellation);
            if let Some(cancellation) = cancellation {
                debug!("Cancelling request {} of session {}", id, session.id());
                cancellation.cancel(Some(SESSION_CANCELLED_REASON.to_string()));
            }
        }
    }
}
