//! Server configuration

use std::time::Duration;

use crate::session::state::DEFAULT_SESSION_TIMEOUT;

/// Runtime settings of the MCP server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Name reported in `initialize` responses
    pub server_name: String,
    /// Version reported in `initialize` responses
    pub server_version: String,
    /// When set, no sessions are created and session cancellation is disabled
    pub stateless: bool,
    /// Idle time after which a session expires
    pub session_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: env!("CARGO_PKG_NAME").to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            stateless: false,
            session_timeout: DEFAULT_SESSION_TIMEOUT,
        }
    }
}
