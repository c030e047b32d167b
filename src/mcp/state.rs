//! MCP Application State
//!
//! Everything a request handler needs, constructed once at startup and
//! shared behind an `Arc`.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::session::{McpConnectionTracker, McpRequestTracker, McpSessionStore};
use crate::tools::ToolRegistry;

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Core application state: tool registry, sessions and in-flight requests
#[derive(Debug)]
pub struct AppState {
    pub config: ServerConfig,

    /// Frozen after startup; read without synchronization
    pub registry: Arc<ToolRegistry>,

    pub requests: Arc<McpRequestTracker>,

    /// Cancels a session's calls through `requests` on delete or expiry
    pub sessions: McpSessionStore,
}

impl AppState {
    pub fn new(config: ServerConfig, registry: ToolRegistry) -> Self {
        let requests = Arc::new(McpRequestTracker::new());
        let connections = Arc::new(McpConnectionTracker::new(
            requests.clone(),
            config.stateless,
        ));
        let sessions = McpSessionStore::with_timeout(connections, config.session_timeout);

        Self {
            config,
            registry: Arc::new(registry),
            requests,
            sessions,
        }
    }
}
