//! MCP Protocol Models and Constants
//!
//! This module contains the JSON-RPC 2.0 envelope types and the
//! method-specific parameter and result shapes of the Model Context Protocol.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use super::error::{ErrorBody, JsonRpcError};
use crate::tools::metadata::ToolAnnotations;

// =============================================================================
// MCP Constants
// =============================================================================

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";
/// The only MCP protocol version this server speaks
pub const PROTOCOL_VERSION: &str = "2025-06-18";
/// Header carrying the negotiated protocol version on every non-initialize request
pub const PROTOCOL_VERSION_HEADER: &str = "mcp-protocol-version";
/// Header carrying the session id
pub const SESSION_ID_HEADER: &str = "mcp-session-id";
/// MIME type for JSON responses
pub const JSON_MIME_TYPE: &str = "application/json";
/// MIME type for server-sent event streams
pub const EVENT_STREAM_MIME_TYPE: &str = "text/event-stream";

// =============================================================================
// JSON-RPC Envelope
// =============================================================================

/// Request ID can be string or number; any JSON number is accepted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(Number),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id.into())
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_string())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestId::String(s) => write!(f, "{}", s),
            RequestId::Number(n) => write!(f, "{}", n),
        }
    }
}

/// The methods this server dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Initialize,
    Initialized,
    Ping,
    ToolsList,
    ToolsCall,
    Cancelled,
}

impl RequestMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestMethod::Initialize => "initialize",
            RequestMethod::Initialized => "notifications/initialized",
            RequestMethod::Ping => "ping",
            RequestMethod::ToolsList => "tools/list",
            RequestMethod::ToolsCall => "tools/call",
            RequestMethod::Cancelled => "notifications/cancelled",
        }
    }
}

impl FromStr for RequestMethod {
    type Err = JsonRpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initialize" => Ok(RequestMethod::Initialize),
            "notifications/initialized" => Ok(RequestMethod::Initialized),
            "ping" => Ok(RequestMethod::Ping),
            "tools/list" => Ok(RequestMethod::ToolsList),
            "tools/call" => Ok(RequestMethod::ToolsCall),
            "notifications/cancelled" => Ok(RequestMethod::Cancelled),
            other => Err(JsonRpcError::method_not_found(other)),
        }
    }
}

/// Standard JSON-RPC 2.0 Request envelope
#[derive(Debug, Clone, Deserialize)]
pub struct McpRequest {
    pub jsonrpc: String,

    /// Absent for notifications
    #[serde(default)]
    pub id: Option<RequestId>,

    pub method: String,

    /// Method-specific parameters, decoded on demand with [`McpRequest::params_as`]
    #[serde(default)]
    pub params: Option<Value>,
}

impl McpRequest {
    pub fn method(&self) -> Result<RequestMethod, JsonRpcError> {
        self.method.parse()
    }

    pub fn is_notification(&self) -> bool {
        self.method.starts_with("notifications/")
    }

    /// Deserializes `params` into a typed value; absent params decode from `{}`
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, JsonRpcError> {
        let params = self
            .params
            .clone()
            .unwrap_or_else(|| Value::Object(Default::default()));
        serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
    }
}

/// Response to MCP client
#[derive(Debug, Clone, Serialize)]
pub struct McpResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl McpResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: &JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error.body()),
        }
    }
}

// =============================================================================
// Initialize Messages
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub capabilities: Value,
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

// =============================================================================
// Tools Messages
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDescription>,
}

/// Wire projection of a registered tool
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescription {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelledParams {
    pub request_id: RequestId,
    #[serde(default)]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_request_id_deserialize() {
        let id: RequestId = serde_json::from_str(r#""abc""#).unwrap();
        assert_eq!(id, RequestId::String("abc".to_string()));
        let id: RequestId = serde_json::from_str("42").unwrap();
        assert_eq!(id, RequestId::from(42));

        let id: RequestId = serde_json::from_str("1.5").unwrap();
        assert_eq!(id.to_string(), "1.5");
        let id: RequestId = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(id.to_string(), "18446744073709551615");
    }

    #[test]
    fn test_request_method_parse() {
        assert_eq!("tools/call".parse::<RequestMethod>(), Ok(RequestMethod::ToolsCall));
        assert_eq!(
            "notifications/cancelled".parse::<RequestMethod>(),
            Ok(RequestMethod::Cancelled)
        );
        let err = "call/tools".parse::<RequestMethod>().unwrap_err();
        assert_eq!(err.code, ErrorCode::MethodNotFound);
        assert_eq!(err.data, vec!["call/tools not found".to_string()]);
    }

    #[test]
    fn test_params_as_reports_invalid_params() {
        let request: McpRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "arguments": {} }
        }))
        .unwrap();
        let err = request.params_as::<ToolCallParams>().unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);
    }

    #[test]
    fn test_notification_has_no_id() {
        let request: McpRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(request.id.is_none());
        assert!(request.is_notification());
    }

    #[test]
    fn test_response_success_shape() {
        let resp = McpResponse::success(json!("2"), json!({ "ok": true }));
        let value = serde_json::to_value(resp).unwrap();
        assert_eq!(value, json!({ "jsonrpc": "2.0", "id": "2", "result": { "ok": true } }));
    }
}
