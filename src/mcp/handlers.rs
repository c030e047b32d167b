//! MCP (Model Context Protocol) route handlers
//!
//! This module dispatches parsed JSON-RPC requests to the method handlers
//! (initialize, tools/list, tools/call, ping and the notifications) and
//! orchestrates tool invocation, result shaping and error mapping.

use std::any::Any;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderValue},
    response::Response,
    routing::post,
    Router,
};
use futures_util::FutureExt;
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::error::{HttpError, JsonRpcError};
use super::models::*;
use super::state::{AppState, SharedState};
use super::transport::McpTransport;
use crate::session::{ExecutionRequestId, McpRequestTracker, McpSession};
use crate::tools::{Cancellation, ToolError, ToolResponse};

/// Creates routes for MCP-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/mcp", post(handle_mcp_post).get(handle_mcp_get))
        .route("/mcp/", post(handle_mcp_post).get(handle_mcp_get)) // Trailing slash safety
}

/// Endpoint: GET /mcp
/// Server-initiated streams are not supported.
async fn handle_mcp_get(headers: HeaderMap) -> Response {
    let transport = McpTransport::new(headers, Bytes::new(), None);
    let sse = transport.accepts(EVENT_STREAM_MIME_TYPE);
    transport.send_http_exception(HttpError::method_not_allowed(sse))
}

/// Endpoint: POST /mcp
/// Handles the Model Context Protocol communication for POST requests.
async fn handle_mcp_post(
    State(state): State<SharedState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let peer = connect_info.map(|ConnectInfo(addr)| addr);
    let mut transport = McpTransport::new(headers, body, peer);

    let request = match transport.init() {
        Ok(request) => request,
        Err(e) => return transport.send_transport_error(e),
    };

    let session = match resolve_session(&state, &transport, &request) {
        Ok(session) => session,
        Err(e) => return transport.send_http_exception(e),
    };

    debug!("MCP call: {} (id: {:?})", request.method, request.id);
    call_request(&state, &transport, &request, session.as_ref()).await
}

/// Finds the session named by the `Mcp-Session-Id` header, if any
fn resolve_session(
    state: &AppState,
    transport: &McpTransport,
    request: &McpRequest,
) -> Result<Option<Arc<McpSession>>, HttpError> {
    if state.config.stateless || request.method == RequestMethod::Initialize.as_str() {
        return Ok(None);
    }
    let Some(id) = transport.session_id() else {
        return Ok(None);
    };
    if !state.sessions.is_valid(id) {
        return Err(HttpError::session_not_found());
    }
    state
        .sessions
        .get_session(id)
        .map(Some)
        .ok_or_else(HttpError::session_not_found)
}

/// Dispatches a parsed request to its method handler
pub async fn call_request(
    state: &AppState,
    transport: &McpTransport,
    request: &McpRequest,
    session: Option<&Arc<McpSession>>,
) -> Response {
    let method = match request.method() {
        Ok(method) => method,
        Err(_) if request.is_notification() => {
            debug!("Ignoring unknown notification {}", request.method);
            return transport.send_empty_response();
        }
        Err(e) => {
            warn!("Unknown method: {}", request.method);
            return transport.send_json_rpc_exception(&e);
        }
    };

    match method {
        RequestMethod::ToolsCall => call_tool(state, transport, request, session).await,
        RequestMethod::ToolsList => list_tools(state, transport),
        RequestMethod::Initialize => initialize(state, transport, request),
        RequestMethod::Initialized => transport.send_empty_response(),
        RequestMethod::Ping => transport.send_response(&json!({})),
        RequestMethod::Cancelled => cancel_request(state, transport, request),
    }
}

// =============================================================================
// MCP Method Handlers
// =============================================================================

/// Handles `initialize` request (Handshake).
fn initialize(state: &AppState, transport: &McpTransport, request: &McpRequest) -> Response {
    let params: InitializeParams = match request.params_as() {
        Ok(params) => params,
        Err(e) => return transport.send_json_rpc_exception(&e),
    };

    if let Some(requested) = params.protocol_version.as_deref() {
        if requested != PROTOCOL_VERSION {
            debug!(
                "Client requested protocol {}, offering {}",
                requested, PROTOCOL_VERSION
            );
        }
    }
    if let Some(client) = &params.client_info {
        info!(
            "MCP client connected: {} {}",
            client.name,
            client.version.as_deref().unwrap_or("")
        );
    }

    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: state.config.server_name.clone(),
            version: state.config.server_version.clone(),
        },
    };

    let mut response = transport.send_response(&result);
    if !state.config.stateless && response.status().is_success() {
        let session_id = state.sessions.create_session();
        match HeaderValue::from_str(&session_id) {
            Ok(value) => {
                response.headers_mut().insert(SESSION_ID_HEADER, value);
            }
            Err(e) => return transport.send_error(&e),
        }
    }
    response
}

/// Handles `tools/list` request.
fn list_tools(state: &AppState, transport: &McpTransport) -> Response {
    let tools = state
        .registry
        .all_tools()
        .map(|tool| tool.to_description())
        .collect();
    transport.send_response(&ToolsListResult { tools })
}

/// Handles `tools/call` request.
async fn call_tool(
    state: &AppState,
    transport: &McpTransport,
    request: &McpRequest,
    session: Option<&Arc<McpSession>>,
) -> Response {
    let Some(id) = request.id.clone() else {
        return transport.send_json_rpc_exception(&JsonRpcError::invalid_request("id is required"));
    };
    let execution_id = ExecutionRequestId::new(id, transport.peer_address());

    let params: ToolCallParams = match request.params_as() {
        Ok(params) => params,
        Err(e) => return transport.send_json_rpc_exception(&e),
    };
    let tool = match state.registry.get_tool(&params.name) {
        Ok(tool) => tool,
        Err(e) => return transport.send_json_rpc_exception(&e),
    };

    let cancellation = tool.is_cancellable().then(Cancellation::new);
    let arguments = match tool.bind_arguments(params.arguments.as_ref(), cancellation.clone()) {
        Ok(arguments) => arguments,
        Err(e) => return transport.send_json_rpc_exception(&e),
    };

    // Deregisters on every exit path below, including a panicking tool
    let _ongoing = match cancellation {
        Some(cancellation) => {
            match OngoingRequest::register(&state.requests, execution_id.clone(), cancellation, session) {
                Ok(guard) => Some(guard),
                Err(e) => {
                    warn!("Rejected duplicate request {}", execution_id);
                    return transport.send_json_rpc_exception(&e);
                }
            }
        }
        None => None,
    };

    debug!("Invoking tool {} for request {}", tool.name, execution_id);
    let outcome = AssertUnwindSafe((tool.handler)(arguments))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(output)) => transport.send_response(&output.into_response(tool.structured_content)),
        Ok(Err(ToolError::InvalidArguments(detail))) => {
            transport.send_json_rpc_exception(&JsonRpcError::invalid_params(detail))
        }
        Ok(Err(ToolError::Internal(detail))) => {
            transport.send_json_rpc_exception(&JsonRpcError::internal_error(detail))
        }
        Ok(Err(e)) => {
            debug!("Tool {} failed: {}", tool.name, e);
            transport.send_response(&ToolResponse::error(e.business_message()))
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!("Tool {} panicked: {}", tool.name, message);
            transport.send_response(&ToolResponse::error(message))
        }
    }
}

/// Text of a caught panic; payloads that carry no message become `"panic"`
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic".to_string()
    }
}

/// Handles `notifications/cancelled`.
/// Unknown or already finished requests are ignored; notifications never get errors.
fn cancel_request(state: &AppState, transport: &McpTransport, request: &McpRequest) -> Response {
    match request.params_as::<CancelledParams>() {
        Ok(params) => {
            let id = ExecutionRequestId::new(params.request_id, transport.peer_address());
            match state.requests.get_ongoing_request_cancellation(&id) {
                Some(cancellation) => {
                    if cancellation.cancel(params.reason) {
                        info!("Cancelled request {}", id);
                    }
                }
                None => debug!("Ignoring cancellation of unknown request {}", id),
            }
        }
        Err(e) => debug!("Ignoring malformed cancellation: {}", e),
    }
    transport.send_empty_response()
}

// =============================================================================
// Request Registration
// =============================================================================

/// Registration of a cancellable call, undone when dropped
struct OngoingRequest {
    requests: Arc<McpRequestTracker>,
    id: ExecutionRequestId,
    cancellation: Cancellation,
    session: Option<Arc<McpSession>>,
}

impl OngoingRequest {
    fn register(
        requests: &Arc<McpRequestTracker>,
        id: ExecutionRequestId,
        cancellation: Cancellation,
        session: Option<&Arc<McpSession>>,
    ) -> Result<Self, JsonRpcError> {
        requests.register_ongoing_request(id.clone(), cancellation.clone())?;
        if let Some(session) = session {
            session.add_active_request(id.clone());
        }
        Ok(Self {
            requests: requests.clone(),
            id,
            cancellation,
            session: session.cloned(),
        })
    }
}

impl Drop for OngoingRequest {
    fn drop(&mut self) {
        self.requests
            .release_ongoing_request(&self.id, &self.cancellation);
        if let Some(session) = &self.session {
            session.remove_active_request(&self.id);
        }
    }
}
