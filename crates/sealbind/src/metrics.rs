//! Prometheus /metrics + health check HTTP endpoints
//!
//! Endpoints:
//!   GET /metrics  — Prometheus text format
//!   GET /healthz  — Liveness probe (always 200 if process is running)

use anyhow::Result;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Router};
use prometheus_client::{
    encoding::text::encode, metrics::counter::Counter, registry::Registry,
};
use std::sync::Arc;

/// Counters for the paste API and its gates.
#[derive(Clone, Default)]
pub struct ApiMetrics {
    pub pastes_created: Counter,
    pub pastes_retrieved: Counter,
    pub pastes_deleted: Counter,
    pub pow_issued: Counter,
    pub pow_rejected: Counter,
    pub rate_limited: Counter,
}

impl ApiMetrics {
    pub fn register(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        registry.register(
            "sealbin_pastes_created",
            "Pastes accepted and persisted",
            metrics.pastes_created.clone(),
        );
        registry.register(
            "sealbin_pastes_retrieved",
            "Successful paste reads",
            metrics.pastes_retrieved.clone(),
        );
        registry.register(
            "sealbin_pastes_deleted",
            "Token-authorized deletions",
            metrics.pastes_deleted.clone(),
        );
        registry.register(
            "sealbin_pow_issued",
            "Proof-of-work challenges issued",
            metrics.pow_issued.clone(),
        );
        registry.register(
            "sealbin_pow_rejected",
            "Proof-of-work submissions rejected",
            metrics.pow_rejected.clone(),
        );
        registry.register(
            "sealbin_rate_limited",
            "Requests rejected by the rate limiter",
            metrics.rate_limited.clone(),
        );
        metrics
    }
}

/// Serve Prometheus metrics and the liveness probe on `addr`
/// (e.g. "127.0.0.1:9300")
pub async fn serve(addr: String, registry: Arc<Registry>) -> Result<()> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(registry);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("metrics bind {addr}: {e}"))?;

    tracing::info!(addr = %addr, "metrics: listening on /metrics, /healthz");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("metrics server: {e}"))
}

async fn metrics_handler(State(registry): State<Arc<Registry>>) -> impl IntoResponse {
    let mut body = String::new();
    match encode(&mut body, &registry) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!("metrics encode failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}

/// Liveness probe: returns 200 if the process is running.
async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
