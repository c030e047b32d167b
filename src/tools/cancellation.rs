//! Cooperative cancellation for in-flight tool calls
//!
//! A [`Cancellation`] is created per invocation and shared by exactly two
//! parties: the tool body, which observes it, and the request tracker, through
//! which a `notifications/cancelled` message or a session teardown signals it.

use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

use super::response::ToolError;

/// One-shot cancellation signal with an optional reason
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// Set exactly once; its presence is the cancelled state
    reason: OnceLock<Option<String>>,
    token: CancellationToken,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transitions to cancelled. Returns `false` if already cancelled, in which
    /// case the first reason is kept.
    pub fn cancel(&self, reason: Option<String>) -> bool {
        if self.inner.reason.set(reason).is_err() {
            return false;
        }
        self.inner.token.cancel();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.get().is_some()
    }

    pub fn reason(&self) -> Option<String> {
        self.inner.reason.get().cloned().flatten()
    }

    /// Resolves once the call has been cancelled
    pub async fn cancelled(&self) {
        self.inner.token.cancelled().await
    }

    /// Whether both handles belong to the same invocation
    pub fn same_as(&self, other: &Cancellation) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns [`ToolError::Cancelled`] if the call has been cancelled
    pub fn check(&self) -> Result<(), ToolError> {
        if self.is_cancelled() {
            Err(ToolError::Cancelled(self.reason()))
        } else {
            Ok(())
        }
    }
}
