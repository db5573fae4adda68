//! Daemon lifecycle: state wiring, sweep task, metrics listener, API server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sealbin_core::config::SealbinConfig;
use tracing::{error, info, warn};

use crate::api::{self, AppState};
use crate::metrics::ApiMetrics;

/// Interval between storage-reclamation sweeps. Expiry is enforced lazily on
/// every read/delete; the sweep only reclaims memory.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub async fn run(config: SealbinConfig) -> Result<()> {
    info!(
        pow_enabled = config.pow.enabled,
        pow_difficulty = config.pow.difficulty,
        max_ciphertext_bytes = config.limits.max_ciphertext_bytes,
        "daemon starting"
    );

    let mut registry = prometheus_client::registry::Registry::default();
    let metrics = ApiMetrics::register(&mut registry);
    let state = AppState::new(&config, metrics);

    // Prometheus metrics endpoint on its own listener
    if let Some(addr) = config.server.metrics_addr.clone() {
        let registry = Arc::new(registry);
        tokio::spawn(async move {
            if let Err(e) = crate::metrics::serve(addr, registry).await {
                error!("metrics server failed: {e}");
            }
        });
    }

    // Periodic reclamation: expired pastes, expired PoW challenges, idle
    // rate-limit buckets
    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                match state.service().purge_expired() {
                    Ok(0) => {}
                    Ok(swept) => info!(swept, "expired pastes purged"),
                    Err(e) => warn!("expiry sweep failed: {e}"),
                }
                state.pow().purge_expired();
                state.limiter().purge_idle();
            }
        });
    }

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .map_err(|e| anyhow::anyhow!("api bind {}: {e}", config.server.listen))?;
    info!(addr = %config.server.listen, "api: listening");

    axum::serve(
        listener,
        api::router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("api server: {e}"))
}
