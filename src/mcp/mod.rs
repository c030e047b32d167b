//! Model Context Protocol (MCP) Module
//!
//! This module contains all MCP protocol implementation, including:
//! - Protocol models (JSON-RPC envelope, method parameters and results)
//! - Error model (JSON-RPC and HTTP-level errors)
//! - HTTP transport (header validation, parsing, response serialization)
//! - MCP handlers (initialize, tools/list, tools/call, etc.)
//! - Shared application state

pub mod error;
pub mod handlers;
pub mod helpers;
pub mod models;
pub mod state;
pub mod transport;

// Re-export commonly used types and functions
pub use handlers::routes;
pub use state::{AppState, SharedState};
