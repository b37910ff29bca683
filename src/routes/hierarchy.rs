use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::AppState;
use crate::entity::{area, prefecture, region};
use crate::error::{AppError, AppResult};
use crate::hierarchy::{self, HierarchyDepth, Region};
use crate::routes::{live_hierarchy, resolve_prefecture};
use crate::services::store;

#[derive(Debug, Serialize, ToSchema)]
pub struct RegionResponse {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrefectureResponse {
    pub id: String,
    pub name: String,
    pub region_id: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AreaResponse {
    pub id: String,
    pub name: String,
    pub prefecture_id: String,
}

impl From<region::Model> for RegionResponse {
    fn from(r: region::Model) -> Self {
        Self {
            id: r.region_id,
            name: r.region_name,
        }
    }
}

impl From<prefecture::Model> for PrefectureResponse {
    fn from(p: prefecture::Model) -> Self {
        Self {
            id: p.prefecture_id,
            name: p.prefecture_name,
            region_id: p.region_id,
        }
    }
}

impl From<&hierarchy::Prefecture> for PrefectureResponse {
    fn from(p: &hierarchy::Prefecture) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            region_id: p.region_id.clone(),
        }
    }
}

impl From<area::Model> for AreaResponse {
    fn from(a: area::Model) -> Self {
        Self {
            id: a.area_id,
            name: a.area_name,
            prefecture_id: a.prefecture_id,
        }
    }
}

/// Prefectures of a region, from the store when there is one.
pub async fn prefectures_for_region(
    state: &AppState,
    region_id: &str,
) -> AppResult<Vec<PrefectureResponse>> {
    let not_found = || AppError::NotFound(format!("Region '{region_id}' not found"));

    if let Some(db) = &state.db {
        store::find_region(db, region_id).await?.ok_or_else(not_found)?;
        return Ok(store::list_prefectures(db, region_id)
            .await?
            .into_iter()
            .map(PrefectureResponse::from)
            .collect());
    }

    let hierarchy = live_hierarchy(state, HierarchyDepth::Prefectures).await?;
    let region = hierarchy.get(region_id).ok_or_else(not_found)?;
    Ok(region.prefectures.iter().map(PrefectureResponse::from).collect())
}

/// Full region tree built from the live JMA catalog
#[utoipa::path(
    get,
    path = "/api/hierarchy",
    responses(
        (status = 200, description = "Hierarchy built successfully", body = Vec<Region>),
        (status = 502, description = "JMA unreachable or returned an unexpected catalog"),
    ),
    tag = "hierarchy"
)]
pub async fn get_hierarchy(State(state): State<AppState>) -> AppResult<Json<Vec<Region>>> {
    let hierarchy = live_hierarchy(&state, HierarchyDepth::Areas).await?;
    Ok(Json(hierarchy.into_values().collect()))
}

/// List all regions
#[utoipa::path(
    get,
    path = "/api/regions",
    responses(
        (status = 200, description = "Regions retrieved successfully", body = Vec<RegionResponse>),
    ),
    tag = "hierarchy"
)]
pub async fn list_regions(State(state): State<AppState>) -> AppResult<Json<Vec<RegionResponse>>> {
    let response: Vec<RegionResponse> = match &state.db {
        Some(db) => store::list_regions(db)
            .await?
            .into_iter()
            .map(RegionResponse::from)
            .collect(),
        None => live_hierarchy(&state, HierarchyDepth::Prefectures)
            .await?
            .into_values()
            .map(|r| RegionResponse {
                id: r.id,
                name: r.name,
            })
            .collect(),
    };

    Ok(Json(response))
}

/// List prefectures belonging to a region
#[utoipa::path(
    get,
    path = "/api/regions/{region_id}/prefectures",
    params(
        ("region_id" = String, Path, description = "JMA center code, e.g. 010300"),
    ),
    responses(
        (status = 200, description = "Prefectures retrieved successfully", body = Vec<PrefectureResponse>),
        (status = 404, description = "Region not found"),
    ),
    tag = "hierarchy"
)]
pub async fn list_region_prefectures(
    State(state): State<AppState>,
    Path(region_id): Path<String>,
) -> AppResult<Json<Vec<PrefectureResponse>>> {
    Ok(Json(prefectures_for_region(&state, &region_id).await?))
}

/// List stored areas of a prefecture
#[utoipa::path(
    get,
    path = "/api/prefectures/{prefecture_id}/areas",
    params(
        ("prefecture_id" = String, Path, description = "JMA office code, e.g. 130000"),
    ),
    responses(
        (status = 200, description = "Areas retrieved successfully", body = Vec<AreaResponse>),
        (status = 404, description = "Prefecture not found"),
        (status = 503, description = "No store configured"),
    ),
    tag = "hierarchy"
)]
pub async fn list_prefecture_areas(
    State(state): State<AppState>,
    Path(prefecture_id): Path<String>,
) -> AppResult<Json<Vec<AreaResponse>>> {
    let db = state.store()?;
    let prefecture = resolve_prefecture(db, &prefecture_id).await?;

    let response = store::list_areas(db, &prefecture.prefecture_id)
        .await?
        .into_iter()
        .map(AreaResponse::from)
        .collect();

    Ok(Json(response))
}
