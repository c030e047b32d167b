//! Tool Registry
//!
//! Populated once at startup, then frozen behind an `Arc` and shared
//! read-only by every request.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::metadata::{DeploymentError, ToolMetadata};
use crate::mcp::error::JsonRpcError;

/// Registry of invocable tools, keyed by tool name
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<ToolMetadata>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a set of tools, failing on the first duplicate name
    pub fn from_tools(
        tools: impl IntoIterator<Item = ToolMetadata>,
    ) -> Result<Self, DeploymentError> {
        let mut registry = Self::new();
        for tool in tools {
            registry.add_tool(tool)?;
        }
        Ok(registry)
    }

    /// Register a tool. Names are unique; a second tool with the same name is rejected.
    pub fn add_tool(&mut self, tool: ToolMetadata) -> Result<(), DeploymentError> {
        if self.tools.contains_key(&tool.name) {
            return Err(DeploymentError::DuplicateToolName(tool.name));
        }
        self.tools.insert(tool.name.clone(), Arc::new(tool));
        Ok(())
    }

    pub fn get_tool(&self, name: &str) -> Result<Arc<ToolMetadata>, JsonRpcError> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Method {} not found", name)))
    }

    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    /// All tools, ordered by name
    pub fn all_tools(&self) -> impl Iterator<Item = &Arc<ToolMetadata>> {
        self.tools.values()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::error::ErrorCode;
    use crate::tools::metadata::ToolBuilder;
    use crate::tools::response::{ToolError, ToolOutput};

    fn tool(name: &str) -> ToolMetadata {
        ToolBuilder::new(name)
            .build(|_args| async { Ok::<_, ToolError>(ToolOutput::text("ok")) })
            .unwrap()
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(!registry.has_tools());
        assert_eq!(registry.tool_count(), 0);
    }

    #[test]
    fn test_lookup() {
        let registry = ToolRegistry::from_tools([tool("b"), tool("a")]).unwrap();
        assert!(registry.has_tools());
        assert_eq!(registry.get_tool("a").unwrap().name, "a");

        let names: Vec<_> = registry.all_tools().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let err = registry.get_tool("missing").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = ToolRegistry::from_tools([tool("echo"), tool("echo")]).unwrap_err();
        assert_eq!(err, DeploymentError::DuplicateToolName("echo".into()));
    }
}
