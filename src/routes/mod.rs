//! Router assembly: HTTP endpoints, WebSocket upgrade, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
  routing::{delete, get, post},
  Router,
};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws` (snapshot push + operations)
/// - REST-ish API under `/api/v1/...`
/// - CORS (allow any origin/method/headers) for a locally served UI
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
  Router::new()
    // WebSocket
    .route("/ws", get(ws::ws_upgrade))
    // HTTP API
    .route("/api/v1/health", get(http::http_health))
    .route("/api/v1/session", get(http::http_get_session))
    .route("/api/v1/session/load", post(http::http_post_load))
    .route("/api/v1/session/select", post(http::http_post_select))
    .route("/api/v1/session/confirm", post(http::http_post_confirm))
    .route("/api/v1/session/record", post(http::http_post_record))
    .route("/api/v1/session/advance", post(http::http_post_advance))
    .route("/api/v1/session/choices", get(http::http_get_choices))
    .route("/api/v1/session/save", post(http::http_post_save))
    .route("/api/v1/history", get(http::http_get_history))
    .route("/api/v1/history/:id", delete(http::http_delete_history))
    // State + CORS + HTTP tracing
    .with_state(state)
    .layer(
      CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any),
    )
    .layer(
      TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}
