use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use utoipa::ToSchema;

use crate::common::AppState;
use crate::error::AppResult;
use crate::services::store::CatalogCounts;
use crate::sync::worker::{self, WeatherSyncReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncReport {
    pub catalog: CatalogCounts,
    pub weather: WeatherSyncReport,
}

/// Populate the store before serving: catalog first, then one forecast pass.
///
/// The catalog fetch is retried on transport failures; per-prefecture
/// forecast failures are logged by the worker and do not abort the run.
///
/// # Errors
///
/// Returns an error if the store is not configured, the catalog cannot be
/// fetched after all retries, or a database write fails.
pub async fn run(state: &AppState) -> AppResult<SyncReport> {
    let db = state.store()?;
    let config = &state.config;

    tracing::info!(
        max_retries = config.sync_retry_max,
        days = config.sync_forecast_days,
        "Running initializer"
    );

    let catalog = with_retry(
        config.sync_retry_max,
        Duration::from_secs(config.sync_retry_delay_seconds),
        "Catalog sync",
        || worker::sync_catalog(db, &state.jma_client),
    )
    .await?;

    let weather = worker::sync_weather(db, &state.jma_client, config.sync_forecast_days).await?;

    Ok(SyncReport { catalog, weather })
}

/// Run `op`, retrying transport failures up to `max_retries` times.
pub async fn with_retry<T, F, Fut>(
    max_retries: u32,
    delay: Duration,
    label: &str,
    mut op: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut retries = 0;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transport() && retries < max_retries => {
                retries += 1;
                tracing::warn!(
                    error = %e,
                    retry = retries,
                    max_retries,
                    delay_secs = delay.as_secs(),
                    "{label} failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                tracing::error!(error = %e, retries, "{label} failed");
                return Err(e);
            }
        }
    }
}
