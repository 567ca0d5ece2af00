//! Cache inspection and management

use axum::{extract::State, response::IntoResponse};
use serde::Serialize;

use crate::cache::{CacheKey, CacheStats};
use crate::web::{AppState, extractors::RequestContext, responses::ok};

/// Upper bound on keys listed by the stats endpoint
pub const MAX_LISTED_KEYS: usize = 100;

#[derive(Debug, Serialize)]
pub struct CacheSummary {
    pub capacity: usize,
    pub len: usize,
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
    /// Most recently used first
    pub keys: Vec<CacheKey>,
}

#[derive(Debug, Serialize)]
pub struct CacheCleared {
    pub cleared: usize,
}

/// GET /api/v1/cache
pub async fn cache_stats(State(state): State<AppState>) -> impl IntoResponse {
    let cache = state.preview_service.cache();
    let stats = cache.stats();
    let mut keys = cache.keys_by_recency();
    keys.truncate(MAX_LISTED_KEYS);

    ok(CacheSummary {
        capacity: cache.capacity(),
        len: cache.len(),
        hit_rate: stats.hit_rate(),
        stats,
        keys,
    })
}

/// DELETE /api/v1/cache
pub async fn clear_cache(State(state): State<AppState>, context: RequestContext) -> impl IntoResponse {
    tracing::info!(
        request_id = %context.request_id,
        real_ip = context.real_ip.as_deref().unwrap_or("-"),
        "Cache clear requested"
    );
    ok(CacheCleared {
        cleared: state.preview_service.clear_cache(),
    })
}
