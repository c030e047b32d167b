//! MCP Session Module
//!
//! Session lifecycle and in-flight request tracking:
//! - Session store (creation, touch-on-access, idle expiry)
//! - Request tracker (cancellable calls keyed by peer-scoped request id)
//! - Connection tracker (bulk cancellation of a session's calls)

pub mod state;
pub mod tracker;

// Re-export commonly used types for convenience
pub use state::{McpSession, McpSessionStore};
pub use tracker::{ExecutionRequestId, McpConnectionTracker, McpRequestTracker};
