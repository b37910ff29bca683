use axum::{extract::State, Json};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

use crate::common::AppState;
use crate::entity::weather;
use crate::error::{AppError, AppResult};
use crate::forecast::{ForecastEntry, TimePrecision};
use crate::hierarchy::{find_prefecture, HierarchyDepth};
use crate::routes::forecast::fetch_entries;
use crate::routes::hierarchy::{prefectures_for_region, AreaResponse, PrefectureResponse};
use crate::routes::{live_hierarchy, resolve_prefecture};
use crate::services::store;
use crate::session::{self, Fetch, NavigationEvent, NavigationState};

#[derive(Debug, Deserialize, ToSchema)]
pub struct NavigationRequest {
    /// Current selection; omitted means nothing selected yet
    #[serde(default)]
    pub state: NavigationState,
    pub event: NavigationEvent,
}

/// Data loaded for the new selection.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NavigationData {
    Prefectures {
        prefectures: Vec<PrefectureResponse>,
    },
    DatesAndAreas {
        dates: Vec<String>,
        areas: Vec<AreaResponse>,
    },
    Forecast {
        entries: Vec<ForecastEntry>,
    },
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NavigationResponse {
    pub state: NavigationState,
    pub data: NavigationData,
}

fn stored_entry(w: weather::Model) -> ForecastEntry {
    ForecastEntry {
        area_code: w.area_id,
        area_name: w.area_name,
        time: w.date,
        weather_code: Some(w.weather_code),
        weather_description: Some(w.weather_description),
        wind: w.wind,
        wave: w.wave,
    }
}

/// Dates and areas present in a normalized live forecast.
fn dates_and_areas(entries: &[ForecastEntry], prefecture_id: &str) -> NavigationData {
    let dates: BTreeSet<&str> = entries.iter().map(|e| e.time.as_str()).collect();

    let mut areas: IndexMap<&str, &str> = IndexMap::new();
    for e in entries {
        areas.entry(e.area_code.as_str()).or_insert(e.area_name.as_str());
    }

    NavigationData::DatesAndAreas {
        dates: dates.into_iter().map(str::to_owned).collect(),
        areas: areas
            .into_iter()
            .map(|(id, name)| AreaResponse {
                id: id.to_owned(),
                name: name.to_owned(),
                prefecture_id: prefecture_id.to_owned(),
            })
            .collect(),
    }
}

async fn load(state: &AppState, fetch: Fetch) -> AppResult<NavigationData> {
    match fetch {
        Fetch::PrefectureList { region_id } => Ok(NavigationData::Prefectures {
            prefectures: prefectures_for_region(state, &region_id).await?,
        }),
        Fetch::DatesAndAreas { prefecture_id } => match &state.db {
            Some(db) => {
                let prefecture = resolve_prefecture(db, &prefecture_id).await?;
                Ok(NavigationData::DatesAndAreas {
                    dates: store::list_dates(db, &prefecture.prefecture_id).await?,
                    areas: store::list_areas(db, &prefecture.prefecture_id)
                        .await?
                        .into_iter()
                        .map(AreaResponse::from)
                        .collect(),
                })
            }
            None => {
                let hierarchy = live_hierarchy(state, HierarchyDepth::Prefectures).await?;
                if find_prefecture(&hierarchy, &prefecture_id).is_none() {
                    return Err(AppError::NotFound(format!(
                        "Prefecture '{prefecture_id}' not found"
                    )));
                }
                let entries = fetch_entries(state, &prefecture_id, TimePrecision::Date).await?;
                Ok(dates_and_areas(&entries, &prefecture_id))
            }
        },
        Fetch::Forecast {
            prefecture_id,
            date,
        } => {
            let entries = match &state.db {
                Some(db) => {
                    let prefecture = resolve_prefecture(db, &prefecture_id).await?;
                    store::list_prefecture_weather(db, &prefecture.prefecture_id, &date)
                        .await?
                        .into_iter()
                        .map(stored_entry)
                        .collect()
                }
                None => fetch_entries(state, &prefecture_id, TimePrecision::Date)
                    .await?
                    .into_iter()
                    .filter(|e| e.time == date)
                    .collect(),
            };
            Ok(NavigationData::Forecast { entries })
        }
    }
}

/// Apply a drill-down event and load the data the new selection needs
#[utoipa::path(
    post,
    path = "/api/navigate",
    request_body = NavigationRequest,
    responses(
        (status = 200, description = "Selection applied", body = NavigationResponse),
        (status = 400, description = "Empty id, or a date chosen before a prefecture"),
        (status = 404, description = "Region or prefecture not found"),
        (status = 502, description = "JMA unreachable or returned an unexpected document"),
    ),
    tag = "navigation"
)]
pub async fn navigate(
    State(state): State<AppState>,
    Json(request): Json<NavigationRequest>,
) -> AppResult<Json<NavigationResponse>> {
    let (next, fetch) = session::transition(&request.state, request.event)?;
    tracing::debug!(?fetch, "Navigation transition");

    let data = load(&state, fetch).await?;
    Ok(Json(NavigationResponse { state: next, data }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(code: &str, name: &str, time: &str) -> ForecastEntry {
        ForecastEntry {
            area_code: code.into(),
            area_name: name.into(),
            time: time.into(),
            weather_code: Some("100".into()),
            weather_description: Some("晴れ".into()),
            wind: None,
            wave: None,
        }
    }

    #[test]
    fn live_dates_are_sorted_and_areas_keep_order() {
        let entries = vec![
            entry("130010", "東京地方", "2024-01-02"),
            entry("130010", "東京地方", "2024-01-01"),
            entry("130020", "伊豆諸島北部", "2024-01-01"),
        ];

        let NavigationData::DatesAndAreas { dates, areas } = dates_and_areas(&entries, "130000") else {
            panic!("expected dates and areas");
        };

        assert_eq!(dates, vec!["2024-01-01", "2024-01-02"]);
        let ids: Vec<_> = areas.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["130010", "130020"]);
        assert!(areas.iter().all(|a| a.prefecture_id == "130000"));
    }

    #[test]
    fn request_state_defaults_to_empty() {
        let request: NavigationRequest = serde_json::from_str(
            r#"{"event": {"type": "select_region", "value": "010300"}}"#,
        )
        .unwrap();
        assert_eq!(request.state, NavigationState::default());
    }
}
