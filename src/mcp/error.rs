//! MCP Error Model
//!
//! Protocol-level errors are reported as JSON-RPC error envelopes, while
//! transport-level errors bypass JSON-RPC framing and are answered with a raw
//! HTTP status and a plain-text body.

use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;

// =============================================================================
// JSON-RPC Errors
// =============================================================================

/// Standard JSON-RPC 2.0 error codes used by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
        }
    }
}

/// A JSON-RPC protocol error, carrying extra detail strings in `data`
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} ({}): {}", .code.message(), .code.code(), .data.join("; "))]
pub struct JsonRpcError {
    pub code: ErrorCode,
    pub data: Vec<String>,
}

impl JsonRpcError {
    pub fn new(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            data: vec![detail.into()],
        }
    }

    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, detail)
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, detail)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorCode::MethodNotFound, format!("{} not found", method))
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, detail)
    }

    pub fn internal_error(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, detail)
    }

    /// Wire representation placed under the envelope's `error` key
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code.code(),
            message: self.code.message().to_string(),
            data: self.data.clone(),
        }
    }
}

/// Serialized `error` member of a JSON-RPC error envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<String>,
}

// =============================================================================
// HTTP Errors
// =============================================================================

/// A transport-level failure answered directly with an HTTP status
#[derive(Debug, Clone, thiserror::Error)]
#[error("HTTP {status}: {}", .message.as_deref().unwrap_or(""))]
pub struct HttpError {
    pub status: StatusCode,
    /// Plain-text body; `None` sends an empty body
    pub message: Option<String>,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl HttpError {
    pub fn new(status: StatusCode, message: Option<String>) -> Self {
        Self {
            status,
            message,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// The client does not accept both JSON and event-stream responses
    pub fn not_acceptable() -> Self {
        Self::new(StatusCode::NOT_ACCEPTABLE, None)
    }

    pub fn unsupported_protocol_version(found: Option<&str>, expected: &str) -> Self {
        let message = match found {
            Some(version) => format!(
                "Unsupported MCP-Protocol-Version header: {}. Expected: {}",
                version, expected
            ),
            None => format!("Missing MCP-Protocol-Version header. Expected: {}", expected),
        };
        Self::new(StatusCode::BAD_REQUEST, Some(message))
    }

    /// GET is not supported; `sse` selects the server-push specific message
    pub fn method_not_allowed(sse: bool) -> Self {
        let message = if sse {
            "GET not supported: server-sent event streams are not yet implemented"
        } else {
            "GET method not allowed"
        };
        Self::new(StatusCode::METHOD_NOT_ALLOWED, Some(message.to_string()))
            .with_header(header::ALLOW, HeaderValue::from_static("POST"))
    }

    pub fn session_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, Some("Session not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::ParseError.code(), -32700);
        assert_eq!(ErrorCode::InvalidRequest.code(), -32600);
        assert_eq!(ErrorCode::MethodNotFound.code(), -32601);
        assert_eq!(ErrorCode::InvalidParams.code(), -32602);
        assert_eq!(ErrorCode::InternalError.code(), -32603);
    }

    #[test]
    fn test_method_not_found_body() {
        let body = JsonRpcError::method_not_found("call/tools").body();
        let value = serde_json::to_value(body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "code": -32601,
                "message": "Method not found",
                "data": ["call/tools not found"]
            })
        );
    }

    #[test]
    fn test_method_not_allowed_sets_allow_header() {
        let err = HttpError::method_not_allowed(true);
        assert_eq!(err.status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(err
            .headers
            .iter()
            .any(|(name, value)| name == header::ALLOW && value == "POST"));
        assert!(err.message.unwrap().contains("server-sent event"));
    }
}
