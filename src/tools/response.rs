//! Tool invocation inputs and outputs
//!
//! Tools receive their bound arguments as [`ToolArguments`] and return a
//! [`ToolOutput`], which the dispatcher shapes into the wire-level
//! [`ToolResponse`]. Failures are reported through [`ToolError`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cancellation::Cancellation;

// =============================================================================
// Content
// =============================================================================

/// A single content item of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Audio {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Content::Text { text: text.into() }
    }
}

/// The `result` member of a `tools/call` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResponse {
    pub content: Vec<Content>,
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_content: Option<Value>,
}

impl ToolResponse {
    pub fn success(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: false,
            structured_content: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: true,
            structured_content: None,
        }
    }

    /// Success carrying `value` both as rendered JSON text and as structured content
    pub fn structured(value: Value) -> Self {
        Self {
            content: vec![Content::text(value.to_string())],
            is_error: false,
            structured_content: Some(value),
        }
    }
}

// =============================================================================
// Tool Output
// =============================================================================

/// What a tool body hands back to the dispatcher
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// Passed through verbatim
    Response(ToolResponse),
    Contents(Vec<Content>),
    Content(Content),
    Text(String),
    /// Structured content when the tool opts in, stringified otherwise.
    /// A bare JSON string is always plain text.
    Value(Value),
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput::Text(text.into())
    }

    pub fn json<T: Serialize>(value: &T) -> Result<Self, ToolError> {
        serde_json::to_value(value)
            .map(ToolOutput::Value)
            .map_err(|e| ToolError::Internal(e.to_string()))
    }

    /// Shapes the output into a success response
    pub fn into_response(self, structured_content: bool) -> ToolResponse {
        match self {
            ToolOutput::Response(response) => response,
            ToolOutput::Contents(content) => ToolResponse::success(content),
            ToolOutput::Content(content) => ToolResponse::success(vec![content]),
            ToolOutput::Text(text) => ToolResponse::success(vec![Content::text(text)]),
            ToolOutput::Value(Value::String(text)) => {
                ToolResponse::success(vec![Content::text(text)])
            }
            ToolOutput::Value(value) if structured_content => ToolResponse::structured(value),
            ToolOutput::Value(value) => ToolResponse::success(vec![Content::text(value.to_string())]),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        ToolOutput::Text(text)
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        ToolOutput::Text(text.to_string())
    }
}

impl From<ToolResponse> for ToolOutput {
    fn from(response: ToolResponse) -> Self {
        ToolOutput::Response(response)
    }
}

impl From<Content> for ToolOutput {
    fn from(content: Content) -> Self {
        ToolOutput::Content(content)
    }
}

impl From<Vec<Content>> for ToolOutput {
    fn from(content: Vec<Content>) -> Self {
        ToolOutput::Contents(content)
    }
}

// =============================================================================
// Tool Errors
// =============================================================================

/// Failure raised by a tool body
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// The tool itself failed; reported as error content, not a protocol error
    #[error("{source}")]
    Execution {
        source: Box<dyn std::error::Error + Send + Sync>,
        type_name: &'static str,
    },

    /// The tool observed its cancellation and aborted
    #[error("Request cancelled")]
    Cancelled(Option<String>),

    /// Arguments did not have the expected shape
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// The tool could not be reached or its result could not be produced
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    pub fn execution<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ToolError::Execution {
            source: Box::new(error),
            type_name: std::any::type_name::<E>(),
        }
    }

    /// Convenience for tools failing with a plain message
    pub fn message(message: impl Into<String>) -> Self {
        ToolError::execution(ToolFailure(message.into()))
    }

    /// Text of the error-content response for business failures: the
    /// error's message, or its type name when the message is empty.
    pub fn business_message(&self) -> String {
        match self {
            ToolError::Execution { source, type_name } => {
                let message = source.to_string();
                if message.is_empty() {
                    type_name.to_string()
                } else {
                    message
                }
            }
            ToolError::Cancelled(Some(reason)) => format!("Request cancelled: {}", reason),
            other => other.to_string(),
        }
    }
}

/// Plain-message business failure
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ToolFailure(pub String);

// =============================================================================
// Tool Arguments
// =============================================================================

/// Arguments bound for one invocation, ordered by declared position
#[derive(Debug, Clone, Default)]
pub struct ToolArguments {
    values: Vec<(String, Value)>,
    cancellation: Option<Cancellation>,
}

impl ToolArguments {
    pub fn new(values: Vec<(String, Value)>, cancellation: Option<Cancellation>) -> Self {
        Self {
            values,
            cancellation,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Deserializes the argument declared under `name`
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, ToolError> {
        let (_, value) = self
            .values
            .iter()
            .find(|(arg, _)| arg == name)
            .ok_or_else(|| ToolError::InvalidArguments(format!("unknown argument '{}'", name)))?;
        Self::decode(name, value)
    }

    /// Deserializes the argument at declared position `index`
    pub fn at<T: DeserializeOwned>(&self, index: usize) -> Result<T, ToolError> {
        let (name, value) = self
            .values
            .get(index)
            .ok_or_else(|| ToolError::InvalidArguments(format!("no argument at position {}", index)))?;
        Self::decode(name, value)
    }

    fn decode<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, ToolError> {
        serde_json::from_value(value.clone())
            .map_err(|e| ToolError::InvalidArguments(format!("argument '{}': {}", name, e)))
    }

    /// The cancellation handle bound for tools that declare one
    pub fn cancellation(&self) -> Result<&Cancellation, ToolError> {
        self.cancellation
            .as_ref()
            .ok_or_else(|| ToolError::Internal("tool does not declare a cancellation argument".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_output_shape() {
        let response = ToolOutput::text("Hello").into_response(false);
        let value = serde_json::to_value(response).unwrap();
        assert_eq!(
            value,
            json!({ "content": [{ "type": "text", "text": "Hello" }], "isError": false })
        );
    }

    #[test]
    fn test_response_passes_through() {
        let original = ToolResponse::error("nope");
        let shaped = ToolOutput::from(original.clone()).into_response(true);
        assert_eq!(shaped, original);
    }

    #[test]
    fn test_value_with_structured_content() {
        let shaped = ToolOutput::Value(json!({ "words": 2 })).into_response(true);
        assert_eq!(shaped.structured_content, Some(json!({ "words": 2 })));
        assert_eq!(shaped.content, vec![Content::text(r#"{"words":2}"#)]);
        assert!(!shaped.is_error);
    }

    #[test]
    fn test_value_without_structured_content_is_stringified() {
        let shaped = ToolOutput::Value(json!([1, 2])).into_response(false);
        assert!(shaped.structured_content.is_none());
        assert_eq!(shaped.content, vec![Content::text("[1,2]")]);

        let shaped = ToolOutput::Value(json!("plain")).into_response(false);
        assert_eq!(shaped.content, vec![Content::text("plain")]);
    }

    #[test]
    fn test_string_value_is_plain_text_even_when_structured() {
        let shaped = ToolOutput::Value(json!("x")).into_response(true);
        assert_eq!(shaped.content, vec![Content::text("x")]);
        assert!(shaped.structured_content.is_none());
    }

    #[test]
    fn test_multiple_contents() {
        let shaped = ToolOutput::from(vec![Content::text("a"), Content::text("b")]).into_response(false);
        assert_eq!(shaped.content.len(), 2);
    }

    #[derive(Debug, thiserror::Error)]
    #[error("")]
    struct Silent;

    #[test]
    fn test_business_message_falls_back_to_type_name() {
        let err = ToolError::execution(Silent);
        assert!(err.business_message().ends_with("Silent"));

        let err = ToolError::message("disk full");
        assert_eq!(err.business_message(), "disk full");

        let err = ToolError::Cancelled(Some("user abort".into()));
        assert_eq!(err.business_message(), "Request cancelled: user abort");
        assert_eq!(ToolError::Cancelled(None).business_message(), "Request cancelled");
    }

    #[test]
    fn test_arguments_lookup() {
        let args = ToolArguments::new(
            vec![("a".into(), json!(3)), ("b".into(), json!("x"))],
            None,
        );
        assert_eq!(args.get::<i64>("a").unwrap(), 3);
        assert_eq!(args.at::<String>(1).unwrap(), "x");
        assert!(matches!(
            args.get::<String>("a"),
            Err(ToolError::InvalidArguments(_))
        ));
        assert!(matches!(args.cancellation(), Err(ToolError::Internal(_))));
    }
}
