//! Tool Module
//!
//! This module contains everything needed to describe and invoke tools:
//! - Tool descriptors and the registration builder
//! - The process-wide tool registry
//! - Invocation inputs, outputs and errors
//! - Cooperative cancellation handles
//! - The built-in tools served by the binary

pub mod builtin;
pub mod cancellation;
pub mod metadata;
pub mod registry;
pub mod response;

// Re-export commonly used types
pub use cancellation::Cancellation;
pub use metadata::{ArgumentType, DeploymentError, ToolBuilder, ToolMetadata};
pub use registry::ToolRegistry;
pub use response::{Content, ToolArguments, ToolError, ToolOutput, ToolResponse};
