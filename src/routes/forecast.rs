use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::forecast::{self, or_no_data, ForecastEntry, TimePrecision};
use crate::routes::{determine_format, resolve_prefecture};
use crate::services::cache;
use crate::sync::worker;

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ForecastQuery {
    /// Timestamp precision: minute (default) or date
    #[serde(default)]
    pub precision: TimePrecision,
    /// Response format: json (default) or csv
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastItem {
    #[serde(flatten)]
    pub entry: ForecastEntry,
    /// Weather icon, when the row carries a code
    pub icon_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastResponse {
    pub prefecture_id: String,
    pub entries: Vec<ForecastItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    pub prefecture_id: String,
    pub rows_written: usize,
}

pub(crate) fn forecast_cache_prefix(prefecture_id: &str) -> String {
    cache::cache_key("forecast", &[prefecture_id, ""])
}

/// Live JMA forecast for a prefecture, normalized.
pub async fn fetch_entries(
    state: &AppState,
    prefecture_id: &str,
    precision: TimePrecision,
) -> AppResult<Vec<ForecastEntry>> {
    let document = state.jma_client.get_forecast(prefecture_id).await?;
    Ok(forecast::normalize(&document, precision))
}

fn build_csv_response(entries: &[ForecastEntry]) -> AppResult<Response> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(["area_code", "area_name", "time", "weather_code", "weather", "wind", "wave"])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    for e in entries {
        writer
            .write_record([
                e.area_code.as_str(),
                e.area_name.as_str(),
                e.time.as_str(),
                e.weather_code.as_deref().unwrap_or_default(),
                or_no_data(e.weather_description.as_deref()),
                or_no_data(e.wind.as_deref()),
                or_no_data(e.wave.as_deref()),
            ])
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Response::builder()
        .header(header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"))
        .body(axum::body::Body::from(body))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Live forecast for a prefecture, fetched from JMA and normalized
#[utoipa::path(
    get,
    path = "/api/prefectures/{prefecture_id}/forecast",
    params(
        ("prefecture_id" = String, Path, description = "JMA office code, e.g. 130000"),
        ForecastQuery,
    ),
    responses(
        (status = 200, description = "Forecast retrieved successfully", body = ForecastResponse),
        (status = 400, description = "Invalid prefecture code"),
        (status = 502, description = "JMA unreachable or returned an unexpected document"),
    ),
    tag = "forecast"
)]
pub async fn get_forecast(
    State(state): State<AppState>,
    Path(prefecture_id): Path<String>,
    Query(query): Query<ForecastQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let format = determine_format(&query.format, &headers);
    let precision = match query.precision {
        TimePrecision::Date => "date",
        TimePrecision::Minute => "minute",
    };

    let cache_key = cache::cache_key("forecast", &[&prefecture_id, precision]);
    if format == "json"
        && let Some(cached) = cache::get_cached(&state, &cache_key).await
    {
        return cache::json_response((*cached).to_vec(), true);
    }

    let entries = fetch_entries(&state, &prefecture_id, query.precision).await?;

    tracing::debug!(
        prefecture_id = %prefecture_id,
        precision,
        entries = entries.len(),
        "Forecast normalized"
    );

    match format.as_str() {
        "csv" => build_csv_response(&entries),
        "json" => {
            let response = ForecastResponse {
                prefecture_id,
                entries: entries
                    .into_iter()
                    .map(|entry| ForecastItem {
                        icon_url: entry
                            .weather_code
                            .as_deref()
                            .map(|code| state.jma_client.icon_url(code)),
                        entry,
                    })
                    .collect(),
            };
            cache::cache_and_respond(&state, cache_key, &response).await
        }
        other => Err(AppError::BadRequest(format!("Unsupported format '{other}'"))),
    }
}

/// Re-fetch a prefecture's forecast into the store
#[utoipa::path(
    post,
    path = "/api/prefectures/{prefecture_id}/refresh",
    params(
        ("prefecture_id" = String, Path, description = "JMA office code, e.g. 130000"),
    ),
    responses(
        (status = 200, description = "Stored forecast replaced", body = RefreshResponse),
        (status = 404, description = "Prefecture not found"),
        (status = 502, description = "JMA unreachable or returned an unexpected document"),
        (status = 503, description = "No store configured"),
    ),
    tag = "forecast"
)]
pub async fn refresh_forecast(
    State(state): State<AppState>,
    Path(prefecture_id): Path<String>,
) -> AppResult<Json<RefreshResponse>> {
    let db = state.store()?;
    let prefecture = resolve_prefecture(db, &prefecture_id).await?;

    let rows_written = worker::sync_prefecture_weather(
        db,
        &state.jma_client,
        &prefecture.prefecture_id,
        state.config.sync_forecast_days,
    )
    .await?;

    cache::invalidate_prefix(&state, &forecast_cache_prefix(&prefecture.prefecture_id)).await;

    tracing::info!(prefecture_id = %prefecture.prefecture_id, rows_written, "Forecast refreshed");

    Ok(Json(RefreshResponse {
        prefecture_id: prefecture.prefecture_id,
        rows_written,
    }))
}
