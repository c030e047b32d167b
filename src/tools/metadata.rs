//! Tool Descriptors
//!
//! A [`ToolMetadata`] describes one invocable tool: its display information,
//! declared arguments, optional special argument, and the handler closure
//! built once at registration time.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::cancellation::Cancellation;
use super::response::{ToolArguments, ToolError, ToolOutput};
use crate::mcp::error::JsonRpcError;
use crate::mcp::models::ToolDescription;

// =============================================================================
// Handler Types
// =============================================================================

/// Result type for tool execution
pub type ToolResult = Result<ToolOutput, ToolError>;

/// Boxed future for async tool execution
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Tool handler function type
pub type ToolHandler = Arc<dyn Fn(ToolArguments) -> ToolFuture + Send + Sync>;

// =============================================================================
// Errors
// =============================================================================

/// Registration-time failures; the server refuses to start on any of these
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeploymentError {
    #[error("duplicate tool name '{0}'")]
    DuplicateToolName(String),

    #[error("tool '{tool}' declares argument '{argument}' more than once")]
    DuplicateArgumentName { tool: String, argument: String },

    #[error("tool '{0}' declares more than one special argument")]
    MultipleSpecialArguments(String),
}

// =============================================================================
// Arguments
// =============================================================================

/// Declared type of a tool argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// A type with no JSON-Schema mapping, carried by its raw name
    Other(String),
}

impl ArgumentType {
    /// JSON-Schema `type` keyword for this argument type
    pub fn schema_type(&self) -> &str {
        match self {
            ArgumentType::String => "string",
            ArgumentType::Integer => "integer",
            ArgumentType::Number => "number",
            ArgumentType::Boolean => "boolean",
            ArgumentType::Object => "object",
            ArgumentType::Array => "array",
            ArgumentType::Other(name) => name,
        }
    }

    /// Whether `value` can be bound to an argument of this type
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ArgumentType::String => value.is_string(),
            ArgumentType::Integer => value.is_i64() || value.is_u64(),
            ArgumentType::Number => value.is_number(),
            ArgumentType::Boolean => value.is_boolean(),
            ArgumentType::Object => value.is_object(),
            ArgumentType::Array => value.is_array(),
            ArgumentType::Other(_) => true,
        }
    }
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.schema_type())
    }
}

/// One declared, client-supplied argument
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentMetadata {
    pub name: String,
    pub arg_type: ArgumentType,
    /// Position in the bound argument list
    pub index: usize,
    pub description: Option<String>,
    pub required: bool,
}

/// Arguments bound by the server itself instead of from client input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialArgument {
    Cancellation,
}

/// Behavioural hints advertised to clients
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

// =============================================================================
// Tool Metadata
// =============================================================================

/// Immutable descriptor of a registered tool
#[derive(Clone)]
pub struct ToolMetadata {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub arguments: Vec<ArgumentMetadata>,
    pub special_argument: Option<SpecialArgument>,
    pub annotations: Option<ToolAnnotations>,
    /// Whether JSON values returned by the tool are surfaced as structured content
    pub structured_content: bool,
    pub handler: ToolHandler,
}

impl fmt::Debug for ToolMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolMetadata")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("special_argument", &self.special_argument)
            .field("structured_content", &self.structured_content)
            .finish_non_exhaustive()
    }
}

impl ToolMetadata {
    pub fn is_cancellable(&self) -> bool {
        self.special_argument == Some(SpecialArgument::Cancellation)
    }

    /// Synthesizes the JSON-Schema-like `inputSchema` advertised by `tools/list`
    pub fn input_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for arg in &self.arguments {
            let description = match (&arg.arg_type, &arg.description) {
                (_, Some(description)) => Some(description.clone()),
                (ArgumentType::Other(name), None) => Some(format!("Unsupported type: {}", name)),
                _ => None,
            };

            let mut property = json!({ "type": arg.arg_type.schema_type() });
            if let Some(description) = description {
                property["description"] = json!(description);
            }
            properties.insert(arg.name.clone(), property);

            if arg.required {
                required.push(json!(arg.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn to_description(&self) -> ToolDescription {
        ToolDescription {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema(),
            annotations: self.annotations.clone(),
        }
    }

    /// Binds client-supplied `arguments` into declared order, validating each
    /// value against its declared type.
    pub fn bind_arguments(
        &self,
        arguments: Option<&Value>,
        cancellation: Option<Cancellation>,
    ) -> Result<ToolArguments, JsonRpcError> {
        let supplied = match arguments {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => {
                return Err(JsonRpcError::invalid_params("arguments must be an object"));
            }
        };

        let mut declared: Vec<&ArgumentMetadata> = self.arguments.iter().collect();
        declared.sort_by_key(|arg| arg.index);

        let mut values = Vec::with_capacity(declared.len());
        for arg in declared {
            let value = supplied.and_then(|map| map.get(&arg.name));
            let value = match value {
                Some(value) if arg.arg_type.accepts(value) => value.clone(),
                Some(Value::Null) | None if !arg.required => Value::Null,
                Some(_) => {
                    return Err(JsonRpcError::invalid_params(format!(
                        "argument '{}' must be of type {}",
                        arg.name, arg.arg_type
                    )));
                }
                None => {
                    return Err(JsonRpcError::invalid_params(format!(
                        "missing required argument '{}'",
                        arg.name
                    )));
                }
            };
            values.push((arg.name.clone(), value));
        }

        Ok(ToolArguments::new(values, cancellation))
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for registering a tool
pub struct ToolBuilder {
    name: String,
    title: Option<String>,
    description: Option<String>,
    arguments: Vec<ArgumentMetadata>,
    special_arguments: Vec<SpecialArgument>,
    annotations: Option<ToolAnnotations>,
    structured_content: bool,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: None,
            arguments: Vec::new(),
            special_arguments: Vec::new(),
            annotations: None,
            structured_content: false,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Declares a required argument at the next position
    pub fn argument(
        self,
        name: impl Into<String>,
        arg_type: ArgumentType,
        description: impl Into<String>,
    ) -> Self {
        self.push_argument(name.into(), arg_type, Some(description.into()), true)
    }

    /// Declares an optional argument at the next position
    pub fn optional_argument(
        self,
        name: impl Into<String>,
        arg_type: ArgumentType,
        description: impl Into<String>,
    ) -> Self {
        self.push_argument(name.into(), arg_type, Some(description.into()), false)
    }

    fn push_argument(
        mut self,
        name: String,
        arg_type: ArgumentType,
        description: Option<String>,
        required: bool,
    ) -> Self {
        let index = self.arguments.len();
        self.arguments.push(ArgumentMetadata {
            name,
            arg_type,
            index,
            description,
            required,
        });
        self
    }

    /// Binds a [`Cancellation`] handle into the invocation
    pub fn cancellation(mut self) -> Self {
        self.special_arguments.push(SpecialArgument::Cancellation);
        self
    }

    pub fn annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }

    pub fn structured_content(mut self) -> Self {
        self.structured_content = true;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> Result<ToolMetadata, DeploymentError>
    where
        F: Fn(ToolArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        if self.special_arguments.len() > 1 {
            return Err(DeploymentError::MultipleSpecialArguments(self.name));
        }

        for (i, arg) in self.arguments.iter().enumerate() {
            if self.arguments[..i].iter().any(|other| other.name == arg.name) {
                return Err(DeploymentError::DuplicateArgumentName {
                    tool: self.name,
                    argument: arg.name.clone(),
                });
            }
        }

        Ok(ToolMetadata {
            name: self.name,
            title: self.title,
            description: self.description,
            arguments: self.arguments,
            special_argument: self.special_arguments.first().copied(),
            annotations: self.annotations,
            structured_content: self.structured_content,
            handler: Arc::new(move |args| -> ToolFuture { Box::pin(handler(args)) }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::error::ErrorCode;

    fn noop_tool(builder: ToolBuilder) -> Result<ToolMetadata, DeploymentError> {
        builder.build(|_args| async { Ok::<_, ToolError>(ToolOutput::text("ok")) })
    }

    #[test]
    fn test_multiple_special_arguments_rejected() {
        let err = noop_tool(ToolBuilder::new("dual").cancellation().cancellation()).unwrap_err();
        assert_eq!(err, DeploymentError::MultipleSpecialArguments("dual".into()));
    }

    #[test]
    fn test_duplicate_argument_name_rejected() {
        let err = noop_tool(
            ToolBuilder::new("dup")
                .argument("x", ArgumentType::String, "first")
                .argument("x", ArgumentType::Integer, "second"),
        )
        .unwrap_err();
        assert!(matches!(err, DeploymentError::DuplicateArgumentName { .. }));
    }

    #[test]
    fn test_input_schema() {
        let tool = noop_tool(
            ToolBuilder::new("schema")
                .argument("input", ArgumentType::String, "Text to echo")
                .optional_argument("count", ArgumentType::Integer, "Repeat count")
                .push_argument("widget".into(), ArgumentType::Other("Widget".into()), None, false),
        )
        .unwrap();

        let schema = tool.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["input"]["type"], "string");
        assert_eq!(schema["properties"]["input"]["description"], "Text to echo");
        assert_eq!(schema["properties"]["count"]["type"], "integer");
        assert_eq!(schema["properties"]["widget"]["type"], "Widget");
        assert_eq!(
            schema["properties"]["widget"]["description"],
            "Unsupported type: Widget"
        );
        assert_eq!(schema["required"], json!(["input"]));
    }

    #[test]
    fn test_bind_arguments_in_declared_order() {
        let tool = noop_tool(
            ToolBuilder::new("add")
                .argument("a", ArgumentType::Integer, "")
                .argument("b", ArgumentType::Integer, ""),
        )
        .unwrap();

        let args = tool
            .bind_arguments(Some(&json!({ "b": 2, "a": 1, "extra": true })), None)
            .unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args.at::<i64>(0).unwrap(), 1);
        assert_eq!(args.at::<i64>(1).unwrap(), 2);
    }

    #[test]
    fn test_bind_arguments_rejects_bad_shapes() {
        let tool = noop_tool(
            ToolBuilder::new("echo")
                .argument("input", ArgumentType::String, "")
                .optional_argument("suffix", ArgumentType::String, ""),
        )
        .unwrap();

        let err = tool.bind_arguments(Some(&json!({ "input": 5 })), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);

        let err = tool.bind_arguments(Some(&json!({})), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);

        let err = tool.bind_arguments(Some(&json!(["x"])), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);

        let args = tool
            .bind_arguments(Some(&json!({ "input": "x" })), None)
            .unwrap();
        assert_eq!(args.get::<Option<String>>("suffix").unwrap(), None);
    }

    #[test]
    fn test_integer_type_rejects_fractions() {
        assert!(ArgumentType::Integer.accepts(&json!(3)));
        assert!(!ArgumentType::Integer.accepts(&json!(3.5)));
        assert!(ArgumentType::Number.accepts(&json!(3.5)));
    }
}
