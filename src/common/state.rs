use chrono::{DateTime, Utc};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::jma::models::AreaCatalog;
use crate::jma::JmaClient;

/// Cached response body with the time it was produced.
#[derive(Clone)]
pub struct CachedResponse {
    pub data: Arc<Vec<u8>>,
    pub fetched_at: DateTime<Utc>,
}

/// Cache for serialized API responses, weighted by byte size.
pub type ResponseCache = Cache<String, CachedResponse>;

#[derive(Clone)]
pub struct AppState {
    /// `None` when running without a store.
    pub db: Option<DatabaseConnection>,
    pub config: Arc<Config>,
    pub jma_client: Arc<JmaClient>,
    pub response_cache: ResponseCache,
    catalog_cache: Cache<(), Arc<AreaCatalog>>,
}

impl AppState {
    pub fn new(db: Option<DatabaseConnection>, config: Config, jma_client: JmaClient) -> Self {
        let ttl = Duration::from_secs(config.cache_ttl_seconds);

        let response_cache: ResponseCache = Cache::builder()
            .weigher(|_key: &String, value: &CachedResponse| -> u32 {
                value.data.len().try_into().unwrap_or(u32::MAX)
            })
            .max_capacity(config.cache_max_bytes)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();

        let catalog_cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();

        Self {
            db,
            config: Arc::new(config),
            jma_client: Arc::new(jma_client),
            response_cache,
            catalog_cache,
        }
    }

    /// The store, or `ServiceUnavailable` when running in memory mode.
    pub fn store(&self) -> AppResult<&DatabaseConnection> {
        self.db.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable("No forecast store configured (STORAGE_MODE=memory)".to_string())
        })
    }

    /// The JMA area catalog, fetched at most once per cache TTL.
    pub async fn area_catalog(&self) -> AppResult<Arc<AreaCatalog>> {
        if let Some(catalog) = self.catalog_cache.get(&()).await {
            return Ok(catalog);
        }

        let catalog = Arc::new(self.jma_client.get_area_catalog().await?);
        self.catalog_cache.insert((), Arc::clone(&catalog)).await;
        tracing::debug!(
            centers = catalog.centers.len(),
            offices = catalog.offices.len(),
            "Area catalog cached"
        );
        Ok(catalog)
    }
}
