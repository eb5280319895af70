//! Retention · spaced-repetition learning backend
//!
//! - Topic store persisted as one JSON document (file-backed)
//! - Quiz sessions over WebSocket, topic/dashboard API over HTTP
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                  : u16 (default 3000)
//!   RETENTION_CONFIG_PATH : path to TOML config (data path + authored quizzes)
//!   RETENTION_DATA_PATH   : persisted topics file (default ./data/topics.json)
//!   LOG_LEVEL             : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT            : "pretty" (default) or "json"

mod telemetry;
mod error;
mod domain;
mod config;
mod seeds;
mod storage;
mod store;
mod quiz;
mod session;
mod insights;
mod state;
mod protocol;
mod logic;
mod routes;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::routes::build_router;
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (file-backed topic store, authored quiz bank).
  let state = Arc::new(AppState::new());

  // Touch the store once so a first launch seeds and a corrupt file shows up in the logs early.
  match state.store.write().await.get_topics() {
    Ok(topics) => info!(target: "topic_store", count = topics.len(), "Topic store ready"),
    Err(e) => error!(target: "topic_store", error = %e, "Topic store unreadable; POST /api/v1/store/reset to recover"),
  }

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "retention_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
