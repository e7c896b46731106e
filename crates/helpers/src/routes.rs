//! HTTP routes wiring the helpers together.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health     - Health check
//! GET  /customer   - Resolved customer ID (404 when none)
//! GET  /upstream   - Relay of the configured upstream URL
//! ```

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::get,
};
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::middleware::{
    CurrentCustomerId, create_session_layer, rewrite_slash, session_middleware,
};
use crate::proxy::simple_http_request;
use crate::response::{ResponseSink, respond_status, respond_success_body};
use crate::state::AppState;

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/customer", get(customer))
        .route("/upstream", get(upstream))
        .fallback(not_found)
}

/// Build the application router with its middleware stack.
///
/// Errors returned by handlers are rendered by `AppError`'s `IntoResponse`
/// impl; normal middleware is registered with `from_fn`.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());

    routes()
        .layer(from_fn(session_middleware))
        .layer(session_layer)
        // Also wraps the fallback, so unknown `/path/` URLs redirect too
        .layer(from_fn(rewrite_slash))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Nothing matched; an unwritten sink replies 404.
async fn not_found() -> ResponseSink {
    ResponseSink::new()
}

/// Reply with the resolved customer ID.
async fn customer(CurrentCustomerId(customer_id): CurrentCustomerId) -> ResponseSink {
    let mut res = ResponseSink::new();
    match customer_id {
        Some(id) => respond_success_body(&mut res, id),
        None => respond_status(&mut res, StatusCode::NOT_FOUND),
    };
    res
}

/// Relay the configured upstream URL.
async fn upstream(State(state): State<AppState>) -> Result<ResponseSink> {
    let url = state.config().upstream_url.as_ref().ok_or_else(|| {
        AppError::with_status(StatusCode::SERVICE_UNAVAILABLE, "Upstream not configured")
    })?;

    let mut res = ResponseSink::new();
    simple_http_request(state.upstream(), url.as_str(), &mut res).await?;
    Ok(res)
}
