//! MCP HTTP Transport
//!
//! One [`McpTransport`] wraps one HTTP exchange. [`McpTransport::init`]
//! validates the headers and parses the JSON-RPC envelope; the `send_*`
//! methods turn results and errors into HTTP responses.

use std::fmt::Display;
use std::net::SocketAddr;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use super::error::{HttpError, JsonRpcError};
use super::helpers::{accept_contains, header_str, header_values};
use super::models::{
    McpRequest, McpResponse, RequestId, RequestMethod, EVENT_STREAM_MIME_TYPE, JSONRPC_VERSION,
    JSON_MIME_TYPE, PROTOCOL_VERSION, PROTOCOL_VERSION_HEADER, SESSION_ID_HEADER,
};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
/// Peer address used when the connection info is unavailable
const UNKNOWN_PEER: &str = "unknown";

/// Why [`McpTransport::init`] rejected a request
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error(transparent)]
    JsonRpc(#[from] JsonRpcError),
}

/// Per-request adapter between HTTP and JSON-RPC
#[derive(Debug)]
pub struct McpTransport {
    headers: HeaderMap,
    body: Bytes,
    peer: Option<SocketAddr>,
    /// Set once the envelope has been parsed
    request_id: Option<RequestId>,
}

impl McpTransport {
    pub fn new(headers: HeaderMap, body: Bytes, peer: Option<SocketAddr>) -> Self {
        Self {
            headers,
            body,
            peer,
            request_id: None,
        }
    }

    /// Validates `Accept`, parses the body and checks `MCP-Protocol-Version`
    pub fn init(&mut self) -> Result<McpRequest, TransportError> {
        if !self.accepts(JSON_MIME_TYPE) || !self.accepts(EVENT_STREAM_MIME_TYPE) {
            return Err(HttpError::not_acceptable().into());
        }

        let request = parse_request(&self.body)?;
        self.request_id = request.id.clone();

        if request.method != RequestMethod::Initialize.as_str() {
            let version = header_str(&self.headers, PROTOCOL_VERSION_HEADER);
            if version != Some(PROTOCOL_VERSION) {
                return Err(HttpError::unsupported_protocol_version(version, PROTOCOL_VERSION).into());
            }
        }

        Ok(request)
    }

    /// Whether the client's `Accept` header admits `mime`
    pub fn accepts(&self, mime: &str) -> bool {
        let accept = header_values(&self.headers, header::ACCEPT.as_str());
        accept_contains(accept.as_deref(), mime)
    }

    /// Address used to scope request ids to the sending peer
    pub fn peer_address(&self) -> String {
        self.peer
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_PEER.to_string())
    }

    pub fn session_id(&self) -> Option<&str> {
        header_str(&self.headers, SESSION_ID_HEADER)
    }

    /// The id echoed in responses; an empty string before a successful parse
    fn response_id(&self) -> Value {
        match &self.request_id {
            Some(RequestId::String(id)) => Value::String(id.clone()),
            Some(RequestId::Number(id)) => Value::Number(id.clone()),
            None => Value::String(String::new()),
        }
    }

    // =========================================================================
    // Responses
    // =========================================================================

    /// Sends a JSON-RPC success envelope carrying `result`
    pub fn send_response<T: Serialize>(&self, result: &T) -> Response {
        match serde_json::to_value(result) {
            Ok(result) => self.json(&McpResponse::success(self.response_id(), result)),
            Err(e) => self.send_error(&e),
        }
    }

    /// Sends a JSON-RPC error envelope
    pub fn send_json_rpc_exception(&self, error: &JsonRpcError) -> Response {
        debug!("JSON-RPC error for request {:?}: {}", self.request_id, error);
        self.json(&McpResponse::error(self.response_id(), error))
    }

    /// Sends a raw HTTP status with an optional plain-text body
    pub fn send_http_exception(&self, error: HttpError) -> Response {
        debug!("HTTP error: {}", error);
        let mut response = match error.message {
            Some(message) => {
                (error.status, [(header::CONTENT_TYPE, TEXT_PLAIN)], message).into_response()
            }
            None => error.status.into_response(),
        };
        for (name, value) in error.headers {
            response.headers_mut().insert(name, value);
        }
        response
    }

    pub fn send_transport_error(&self, error: TransportError) -> Response {
        match error {
            TransportError::Http(e) => self.send_http_exception(e),
            TransportError::JsonRpc(e) => self.send_json_rpc_exception(&e),
        }
    }

    /// Acknowledges a notification
    pub fn send_empty_response(&self) -> Response {
        StatusCode::ACCEPTED.into_response()
    }

    /// Logs `error` and answers with a generic 500; details never reach the client
    pub fn send_error(&self, error: &dyn Display) -> Response {
        error!(
            "Internal error while handling MCP request {:?}: {}",
            self.request_id, error
        );
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, TEXT_PLAIN)],
            "Internal server error",
        )
            .into_response()
    }

    fn json<T: Serialize>(&self, body: &T) -> Response {
        match serde_json::to_vec(body) {
            Ok(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, HeaderValue::from_static(JSON_MIME_TYPE))],
                bytes,
            )
                .into_response(),
            Err(e) => self.send_error(&e),
        }
    }
}

/// Decodes a JSON-RPC request envelope from a raw body
fn parse_request(body: &[u8]) -> Result<McpRequest, JsonRpcError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| JsonRpcError::parse_error(e.to_string()))?;

    let request: McpRequest =
        serde_json::from_value(value).map_err(|e| JsonRpcError::invalid_request(e.to_string()))?;

    if request.jsonrpc != JSONRPC_VERSION {
        return Err(JsonRpcError::invalid_request(format!(
            "jsonrpc must be \"{}\"",
            JSONRPC_VERSION
        )));
    }
    if request.id.is_none() && !request.is_notification() {
        return Err(JsonRpcError::invalid_request("id is required"));
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::error::ErrorCode;

    const BOTH: &str = "application/json, text/event-stream";

    fn headers(accept: Option<&'static str>, version: Option<&'static str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(accept) = accept {
            headers.insert(header::ACCEPT, HeaderValue::from_static(accept));
        }
        if let Some(version) = version {
            headers.insert(PROTOCOL_VERSION_HEADER, HeaderValue::from_static(version));
        }
        headers
    }

    fn transport(accept: Option<&'static str>, version: Option<&'static str>, body: &str) -> McpTransport {
        McpTransport::new(headers(accept, version), Bytes::from(body.to_string()), None)
    }

    const PING: &str = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;

    #[test]
    fn test_init_accepts_valid_request() {
        let mut t = transport(Some(BOTH), Some(PROTOCOL_VERSION), PING);
        let request = t.init().unwrap();
        assert_eq!(request.method, "ping");
        assert_eq!(t.response_id(), Value::from(1));
    }

    #[test]
    fn test_init_requires_both_mime_types() {
        let mut t = transport(Some("application/json"), Some(PROTOCOL_VERSION), PING);
        match t.init() {
            Err(TransportError::Http(e)) => {
                assert_eq!(e.status, StatusCode::NOT_ACCEPTABLE);
                assert!(e.message.is_none());
            }
            other => panic!("expected 406, got {:?}", other),
        }

        let mut t = transport(None, Some(PROTOCOL_VERSION), PING);
        assert!(matches!(t.init(), Err(TransportError::Http(_))));
    }

    #[test]
    fn test_init_parse_error() {
        let mut t = transport(Some("*/*"), Some(PROTOCOL_VERSION), "{not json");
        match t.init() {
            Err(TransportError::JsonRpc(e)) => assert_eq!(e.code, ErrorCode::ParseError),
            other => panic!("expected parse error, got {:?}", other),
        }
        assert_eq!(t.response_id(), Value::String(String::new()));
    }

    #[test]
    fn test_init_invalid_request_shapes() {
        for body in [
            r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#,
            r#"{"jsonrpc":"2.0","method":"ping"}"#,
            r#"{"jsonrpc":"2.0","id":1,"method":7}"#,
            r#"[1,2,3]"#,
        ] {
            let mut t = transport(Some(BOTH), Some(PROTOCOL_VERSION), body);
            match t.init() {
                Err(TransportError::JsonRpc(e)) => assert_eq!(e.code, ErrorCode::InvalidRequest),
                other => panic!("expected invalid request for {}, got {:?}", body, other),
            }
        }
    }

    #[test]
    fn test_init_checks_protocol_version() {
        let mut t = transport(Some(BOTH), Some("2024-11-05"), PING);
        match t.init() {
            Err(TransportError::Http(e)) => {
                assert_eq!(e.status, StatusCode::BAD_REQUEST);
                assert!(e.message.unwrap().contains("2024-11-05"));
            }
            other => panic!("expected 400, got {:?}", other),
        }

        let mut t = transport(Some(BOTH), None, PING);
        assert!(matches!(t.init(), Err(TransportError::Http(_))));
    }

    #[test]
    fn test_initialize_skips_version_check() {
        let body = r#"{"jsonrpc":"2.0","id":"init","method":"initialize","params":{}}"#;
        let mut t = transport(Some(BOTH), None, body);
        assert!(t.init().is_ok());
    }

    #[test]
    fn test_send_empty_response_is_202() {
        let t = transport(Some(BOTH), None, "");
        assert_eq!(t.send_empty_response().status(), StatusCode::ACCEPTED);
    }

    #[test]
    fn test_send_error_is_redacted() {
        let t = transport(Some(BOTH), None, "");
        let response = t.send_error(&"secret stack trace");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_peer_address_uses_ip() {
        let addr: SocketAddr = "192.168.1.5:40000".parse().unwrap();
        let t = McpTransport::new(HeaderMap::new(), Bytes::new(), Some(addr));
        assert_eq!(t.peer_address(), "192.168.1.5");
        assert_eq!(transport(None, None, "").peer_address(), UNKNOWN_PEER);
    }
}
