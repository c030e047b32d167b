//! Routing module for the MCP server

use crate::mcp::models::SESSION_ID_HEADER;
use crate::mcp::state::SharedState;
use axum::{body::Body, extract::Request, http::HeaderName, middleware::Next, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

/// Creates and configures the application router with all routes and middleware
pub fn create_app_router(state: SharedState) -> Router {
    // Middleware: Log requests
    let log_layer = axum::middleware::from_fn(|req: Request<Body>, next: Next| async move {
        let method = req.method().clone();
        let uri = req.uri().clone();
        debug!("REQ: {} {}", method, uri);
        let res = next.run(req).await;
        if !res.status().is_success() {
            info!("RES: {} {} -> {}", method, uri, res.status());
        }
        res
    });

    // Middleware: CORS (Permissive; clients must be able to read the session header)
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(SESSION_ID_HEADER)]);

    // Routes
    Router::new()
        .merge(crate::mcp::routes())
        .layer(log_layer)
        .layer(cors_layer)
        .with_state(state)
}
