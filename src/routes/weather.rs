use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::common::AppState;
use crate::entity::weather;
use crate::error::{AppError, AppResult};
use crate::forecast::or_no_data;
use crate::jma::JmaClient;
use crate::routes::{determine_format, resolve_prefecture};
use crate::services::store;

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct WeatherQuery {
    /// Forecast date (YYYY-MM-DD)
    pub date: String,
    /// Response format: json (default) or csv
    #[serde(default = "default_format")]
    pub format: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherResponse {
    pub area_id: String,
    pub area_name: String,
    pub date: String,
    pub weather_code: String,
    pub weather_description: String,
    pub wind: Option<String>,
    pub wave: Option<String>,
    pub icon_url: String,
    pub updated_at: DateTime<Utc>,
}

impl WeatherResponse {
    fn from_model(w: weather::Model, jma: &JmaClient) -> Self {
        Self {
            icon_url: jma.icon_url(&w.weather_code),
            area_id: w.area_id,
            area_name: w.area_name,
            date: w.date,
            weather_code: w.weather_code,
            weather_description: w.weather_description,
            wind: w.wind,
            wave: w.wave,
            updated_at: w.updated_at,
        }
    }
}

fn build_csv_response(rows: &[weather::Model]) -> AppResult<Response> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "area_id",
            "area_name",
            "date",
            "weather_code",
            "weather",
            "wind",
            "wave",
            "updated_at",
        ])
        .map_err(|e| AppError::Internal(e.to_string()))?;

    for w in rows {
        let updated_at = w.updated_at.to_rfc3339();
        writer
            .write_record([
                w.area_id.as_str(),
                w.area_name.as_str(),
                w.date.as_str(),
                w.weather_code.as_str(),
                w.weather_description.as_str(),
                or_no_data(w.wind.as_deref()),
                or_no_data(w.wave.as_deref()),
                updated_at.as_str(),
            ])
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8"))],
        body,
    )
        .into_response())
}

/// List dates with stored forecasts for a prefecture
#[utoipa::path(
    get,
    path = "/api/prefectures/{prefecture_id}/dates",
    params(
        ("prefecture_id" = String, Path, description = "JMA office code, e.g. 130000"),
    ),
    responses(
        (status = 200, description = "Dates retrieved successfully", body = Vec<String>),
        (status = 404, description = "Prefecture not found"),
        (status = 503, description = "No store configured"),
    ),
    tag = "weather"
)]
pub async fn list_prefecture_dates(
    State(state): State<AppState>,
    Path(prefecture_id): Path<String>,
) -> AppResult<Json<Vec<String>>> {
    let db = state.store()?;
    let prefecture = resolve_prefecture(db, &prefecture_id).await?;
    Ok(Json(store::list_dates(db, &prefecture.prefecture_id).await?))
}

/// Stored forecast rows for one area on one date
#[utoipa::path(
    get,
    path = "/api/areas/{area_id}/weather",
    params(
        ("area_id" = String, Path, description = "JMA class10 code, e.g. 130010"),
        WeatherQuery,
    ),
    responses(
        (status = 200, description = "Rows retrieved successfully", body = Vec<WeatherResponse>),
        (status = 400, description = "Invalid query parameters"),
        (status = 503, description = "No store configured"),
    ),
    tag = "weather"
)]
pub async fn get_area_weather(
    State(state): State<AppState>,
    Path(area_id): Path<String>,
    Query(query): Query<WeatherQuery>,
    headers: HeaderMap,
) -> AppResult<Response> {
    let db = state.store()?;
    let rows = store::list_weather(db, &area_id, &query.date).await?;

    match determine_format(&query.format, &headers).as_str() {
        "csv" => build_csv_response(&rows),
        "json" => {
            let response: Vec<WeatherResponse> = rows
                .into_iter()
                .map(|w| WeatherResponse::from_model(w, &state.jma_client))
                .collect();
            Ok(Json(response).into_response())
        }
        other => Err(AppError::BadRequest(format!("Unsupported format '{other}'"))),
    }
}
