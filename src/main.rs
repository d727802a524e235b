//! Trivia quiz backend
//!
//! - Fetches multiple-choice questions from Open Trivia DB
//! - Runs one quiz session at a time and keeps a local history of attempts
//! - Axum HTTP + WebSocket API for a presentation layer to drive it
//!
//! Important env variables:
//!   PORT              : u16 (default 3000)
//!   QUIZ_CONFIG_PATH  : path to TOML config ([trivia] + [storage])
//!   TRIVIA_BASE_URL   : overrides trivia.base_url (default "https://opentdb.com")
//!   QUIZ_DATA_DIR     : overrides storage.data_dir (default "./data")
//!   LOG_LEVEL         : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT        : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use trivia_backend::config::load_config_from_env;
use trivia_backend::routes::build_router;
use trivia_backend::state::AppState;
use trivia_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let cfg = load_config_from_env();

  // Shared state: quiz manager (history loaded from disk) + trivia client.
  let state = Arc::new(AppState::new(&cfg)?);

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([127, 0, 0, 1], port)))
    .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "trivia_backend", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  info!(target: "trivia_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "trivia_backend", error = %e, "Failed to listen for shutdown signal");
  }
}
