//! MedSky · Case Study Backend
//!
//! - Axum HTTP API for generating, saving and answering clinical case studies
//! - PubMed E-utilities enrichment (condition names and explanations)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                : u16 (default 3000)
//!   PUBMED_API_KEY      : optional NCBI key (higher rate limits)
//!   PUBMED_BASE_URL     : default "https://eutils.ncbi.nlm.nih.gov/entrez/eutils"
//!   MEDSKY_CONFIG_PATH  : path to TOML config (timeouts + category overrides)
//!   LOG_LEVEL           : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT          : "pretty" (default) or "json"

mod telemetry;
mod util;
mod domain;
mod config;
mod seeds;
mod registry;
mod pubmed;
mod generator;
mod store;
mod auth;
mod board;
mod state;
mod logic;
mod protocol;
mod routes;
#[cfg(test)]
mod testing;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Config file (if any) plus env overrides, then registry + PubMed client + collaborators.
  let cfg = ServiceConfig::from_env();
  let state = Arc::new(AppState::from_config(&cfg)?);

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "medsky_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "medsky_backend", "Server stopped");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!(target: "medsky_backend", error = %e, "Ctrl-C handler unavailable; running until killed");
    std::future::pending::<()>().await;
  }
  info!(target: "medsky_backend", "Shutdown signal received");
}
