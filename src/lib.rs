//! MCP Tool Server Library
//!
//! This library exposes registered tools to Model Context Protocol clients
//! over JSON-RPC on HTTP, with per-session tracking and cooperative
//! cancellation of in-flight tool calls.

// Domain modules
pub mod mcp;
pub mod session;
pub mod tools;

// Infrastructure
pub mod config;
pub mod router;
