use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::forecast;
use crate::hierarchy::{build_hierarchy, HierarchyDepth};
use crate::jma::JmaClient;
use crate::services::store::{self, CatalogCounts};

/// Outcome of a weather pass over every stored prefecture.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct WeatherSyncReport {
    pub prefectures_synced: usize,
    pub prefectures_failed: usize,
    pub rows_written: usize,
}

/// Fetch the JMA area catalog and store its three-level hierarchy.
///
/// # Errors
///
/// Returns an error if the JMA request or the database write fails.
pub async fn sync_catalog(db: &DatabaseConnection, jma: &JmaClient) -> AppResult<CatalogCounts> {
    tracing::info!("Fetching area catalog from JMA...");

    let catalog = jma.get_area_catalog().await?;
    let hierarchy = build_hierarchy(&catalog, HierarchyDepth::Areas);
    let counts = store::upsert_catalog(db, &hierarchy).await?;

    tracing::info!(
        regions = counts.regions,
        prefectures = counts.prefectures,
        areas = counts.areas,
        "Area catalog stored"
    );

    Ok(counts)
}

/// Fetch one prefecture's forecast and replace its stored short-term rows.
///
/// # Errors
///
/// Returns an error if the JMA request or the database write fails.
pub async fn sync_prefecture_weather(
    db: &DatabaseConnection,
    jma: &JmaClient,
    prefecture_id: &str,
    days: usize,
) -> AppResult<usize> {
    let document = jma.get_forecast(prefecture_id).await?;
    let entries = forecast::normalize_short_term(&document, days);
    let written = store::replace_weather(db, &entries).await?;

    tracing::debug!(prefecture_id, entries = entries.len(), written, "Stored forecast");
    Ok(written)
}

/// Refresh stored weather for every stored prefecture.
///
/// A prefecture whose forecast cannot be fetched or read is logged and
/// skipped; database failures abort the pass.
///
/// # Errors
///
/// Returns `AppError::Database` if the store cannot be read or written.
pub async fn sync_weather(
    db: &DatabaseConnection,
    jma: &JmaClient,
    days: usize,
) -> AppResult<WeatherSyncReport> {
    let prefectures = store::list_all_prefectures(db).await?;
    tracing::info!(count = prefectures.len(), days, "Syncing forecasts");

    let mut report = WeatherSyncReport::default();

    for prefecture in prefectures {
        match sync_prefecture_weather(db, jma, &prefecture.prefecture_id, days).await {
            Ok(written) => {
                report.prefectures_synced += 1;
                report.rows_written += written;
            }
            Err(e @ (AppError::Transport(_) | AppError::MalformedPayload(_) | AppError::BadRequest(_))) => {
                report.prefectures_failed += 1;
                tracing::warn!(
                    error = %e,
                    prefecture_id = %prefecture.prefecture_id,
                    name = %prefecture.prefecture_name,
                    "Failed to sync forecast"
                );
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        synced = report.prefectures_synced,
        failed = report.prefectures_failed,
        rows = report.rows_written,
        "Forecast sync completed"
    );

    Ok(report)
}
