//! Metrics and Monitoring Adapters
//!
//! Prometheus metrics export plus health check endpoints (/live,
//! /ready, /metrics) on one axum server.

pub mod health;
pub mod prometheus;

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::broadcast;
use tracing::{info, instrument};

pub use health::HealthState;
pub use prometheus::MetricsRegistry;

#[derive(Clone)]
struct ServerState {
    metrics: Arc<MetricsRegistry>,
    health: HealthState,
}

/// Serve /metrics, /live and /ready on the given bind address until
/// the shutdown signal fires.
#[instrument(skip_all, fields(address = %bind_address))]
pub async fn serve(
    bind_address: String,
    metrics: Arc<MetricsRegistry>,
    health: HealthState,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    let state = ServerState { metrics, health };

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Monitoring server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
        })
        .await?;

    Ok(())
}

async fn metrics_handler(State(state): State<ServerState>) -> impl IntoResponse {
    state.metrics.render()
}

/// Liveness probe: always 200 while the process runs.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: 200 only while the exchange and stores answer.
async fn readiness(State(state): State<ServerState>) -> impl IntoResponse {
    if state.health.is_ready() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}
