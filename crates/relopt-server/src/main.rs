//! # relopt-server: HTTP Service for the relopt Optimiser
//!
//! Exposes plan estimation and optimisation over JSON. Every request carries its own
//! catalogue of relation statistics alongside the canonical plan.
//!
//! ## Endpoints
//!
//! - `GET  /health`    - Health check
//! - `POST /estimate`  - Estimate a plan as written, returning per-node statistics
//! - `POST /optimise`  - Rewrite a plan into its cheapest left-deep equivalent
//!
//! ## Configuration
//!
//! The server listens on `0.0.0.0:3000` by default; see `state` for the environment
//! variables that override it. Logging is controlled by the `RUST_LOG` environment
//! variable (defaults to `relopt=debug`).

mod routes;
mod state;
mod wire;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relopt=debug")),
        )
        .init();

    let config = state::ServerConfig::from_env()?;
    let addr = config.bind_addr;
    let state = Arc::new(state::AppState::new(config));

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/estimate", post(routes::estimate))
        .route("/optimise", post(routes::optimise))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("relopt-server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
