//! Response caching for routes that reach JMA.
//!
//! Live forecast responses are cached by key until the TTL expires or a
//! refresh for the same prefecture invalidates them:
//!
//! ```text
//! let key = cache::cache_key("forecast", &[&prefecture_id, "minute"]);
//! if let Some(cached) = cache::get_cached(&state, &key).await {
//!     return cache::json_response((*cached).to_vec(), true);
//! }
//! // ... fetch and normalize ...
//! cache::cache_and_respond(&state, key, &response).await
//! ```

use axum::{
    http::{header, HeaderValue},
    response::Response,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::common::{AppState, CachedResponse};
use crate::error::{AppError, AppResult};

/// Build a cache key from a prefix and components.
///
/// Components are joined with `:`. Empty components are kept so different
/// queries never collide.
pub fn cache_key(prefix: &str, components: &[&str]) -> String {
    let mut key = prefix.to_string();
    for c in components {
        key.push(':');
        key.push_str(c);
    }
    key
}

pub async fn get_cached(state: &AppState, cache_key: &str) -> Option<Arc<Vec<u8>>> {
    let cached = state.response_cache.get(cache_key).await?;
    tracing::debug!(cache_key = %cache_key, fetched_at = %cached.fetched_at, "cache_hit");
    Some(cached.data)
}

pub async fn store_cached(state: &AppState, cache_key: String, data: Vec<u8>) {
    let size = data.len();
    state
        .response_cache
        .insert(
            cache_key.clone(),
            CachedResponse {
                data: Arc::new(data),
                fetched_at: Utc::now(),
            },
        )
        .await;

    tracing::debug!(cache_key = %cache_key, size_bytes = size, "cache_stored");
}

/// JSON response with an `X-Cache: HIT|MISS` header.
pub fn json_response(data: Vec<u8>, cache_hit: bool) -> AppResult<Response> {
    let cache_header = if cache_hit { "HIT" } else { "MISS" };
    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
        .header("X-Cache", HeaderValue::from_static(cache_header))
        .body(axum::body::Body::from(data))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Serialize, cache and return a response (always `X-Cache: MISS`).
pub async fn cache_and_respond<T: Serialize>(
    state: &AppState,
    cache_key: String,
    response: &T,
) -> AppResult<Response> {
    let json_bytes = serde_json::to_vec(response).map_err(|e| AppError::Internal(e.to_string()))?;

    store_cached(state, cache_key, json_bytes.clone()).await;

    json_response(json_bytes, false)
}

/// Drop every entry whose key starts with `prefix`.
pub async fn invalidate_prefix(state: &AppState, prefix: &str) {
    let prefix_owned = prefix.to_string();
    if let Err(e) = state
        .response_cache
        .invalidate_entries_if(move |key, _| key.starts_with(&prefix_owned))
    {
        tracing::warn!(error = %e, prefix = %prefix, "cache_prefix_invalidation_failed");
        return;
    }
    tracing::debug!(prefix = %prefix, "cache_prefix_invalidated");
}
