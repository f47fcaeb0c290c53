//! API route handlers.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Path, State},
    Json,
};
use tracing::{debug, warn};

use glimpse_core::types::{Incident, ProfileRecord};

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
    })
}

/// GET /scrape/:username
pub async fn scrape_profile(
    State(state): State<Arc<AppState>>,
    client: Option<ConnectInfo<SocketAddr>>,
    Path(username): Path<String>,
) -> Result<Json<ProfileRecord>> {
    let ip = client
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !state.limiter.check(ip) {
        warn!(client = %ip, "Rate limit exceeded");
        state.relay.notifier().emit(Incident::RateLimited {
            client: ip.to_string(),
            path: format!("/scrape/{}", username),
        });
        return Err(ApiError::rate_limited());
    }

    let lookup = state.relay.lookup_detailed(&username).await?;
    debug!(handle = %lookup.handle, from_cache = lookup.from_cache, "Served profile");

    Ok(Json(lookup.record))
}

/// GET /cache/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsResponse> {
    let cache = state.relay.cache();
    let stats = cache.stats();

    Json(CacheStatsResponse {
        total_entries: stats.total_entries,
        valid_entries: stats.valid_entries,
        expired_entries: stats.expired_entries,
        ttl_seconds: cache.default_ttl().as_secs(),
    })
}
