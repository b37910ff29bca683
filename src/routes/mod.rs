pub mod forecast;
pub mod health;
pub mod hierarchy;
pub mod navigate;
pub mod weather;

use axum::{
    http::{header, HeaderMap},
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::entity::prefecture;
use crate::error::{AppError, AppResult};
use crate::hierarchy::{build_hierarchy, Hierarchy, HierarchyDepth};
use crate::services::store;

/// Build the hierarchy from the (cached) live JMA catalog.
pub async fn live_hierarchy(state: &AppState, depth: HierarchyDepth) -> AppResult<Hierarchy> {
    let catalog = state.area_catalog().await?;
    Ok(build_hierarchy(&catalog, depth))
}

/// Look up a stored prefecture by office code.
pub async fn resolve_prefecture(
    db: &DatabaseConnection,
    prefecture_id: &str,
) -> AppResult<prefecture::Model> {
    store::find_prefecture(db, prefecture_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prefecture '{prefecture_id}' not found")))
}

/// Pick the response format: an explicit `format` query wins, then `Accept`.
pub(crate) fn determine_format(query_format: &str, headers: &HeaderMap) -> String {
    if query_format != "json" {
        return query_format.to_lowercase();
    }

    if let Some(accept) = headers.get(header::ACCEPT)
        && let Ok(accept_str) = accept.to_str()
        && accept_str.contains("text/csv")
    {
        return "csv".to_string();
    }

    "json".to_string()
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        hierarchy::get_hierarchy,
        hierarchy::list_regions,
        hierarchy::list_region_prefectures,
        hierarchy::list_prefecture_areas,
        weather::list_prefecture_dates,
        weather::get_area_weather,
        forecast::get_forecast,
        forecast::refresh_forecast,
        navigate::navigate,
    ),
    components(
        schemas(
            crate::hierarchy::Region,
            crate::hierarchy::Prefecture,
            crate::hierarchy::Area,
            hierarchy::RegionResponse,
            hierarchy::PrefectureResponse,
            hierarchy::AreaResponse,
            weather::WeatherResponse,
            crate::forecast::ForecastEntry,
            crate::forecast::TimePrecision,
            forecast::ForecastItem,
            forecast::ForecastResponse,
            forecast::RefreshResponse,
            crate::session::NavigationState,
            crate::session::NavigationEvent,
            crate::session::Fetch,
            navigate::NavigationRequest,
            navigate::NavigationResponse,
            navigate::NavigationData,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "hierarchy", description = "Regions, prefectures, and forecast areas"),
        (name = "weather", description = "Stored forecast rows"),
        (name = "forecast", description = "Live JMA forecasts"),
        (name = "navigation", description = "Region to prefecture to date drill-down"),
    ),
    info(
        title = "JMA Forecast API",
        description = "Japan Meteorological Agency area catalog and forecast data",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    // Routes answered from the store
    let store_routes = Router::new()
        .route(
            "/prefectures/{prefecture_id}/areas",
            get(hierarchy::list_prefecture_areas),
        )
        .route(
            "/prefectures/{prefecture_id}/dates",
            get(weather::list_prefecture_dates),
        )
        .route("/areas/{area_id}/weather", get(weather::get_area_weather));

    // Routes that may call JMA; regions read the live catalog without a store
    let upstream_routes = Router::new()
        .route("/hierarchy", get(hierarchy::get_hierarchy))
        .route("/regions", get(hierarchy::list_regions))
        .route(
            "/regions/{region_id}/prefectures",
            get(hierarchy::list_region_prefectures),
        )
        .route(
            "/prefectures/{prefecture_id}/forecast",
            get(forecast::get_forecast),
        )
        .route(
            "/prefectures/{prefecture_id}/refresh",
            post(forecast::refresh_forecast),
        )
        .route("/navigate", post(navigate::navigate));

    let upstream_routes = if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        upstream_routes
    } else {
        let limiter = GovernorConfigBuilder::default()
            .key_extractor(SmartIpKeyExtractor)
            .per_second(config.rate_limit_upstream_per_second)
            .burst_size(config.rate_limit_upstream_burst)
            .finish();

        match limiter {
            Some(limiter) => {
                tracing::info!(
                    upstream_rate = %format!(
                        "{}/s burst {}",
                        config.rate_limit_upstream_per_second, config.rate_limit_upstream_burst
                    ),
                    "Rate limiting configured"
                );
                upstream_routes.layer(GovernorLayer {
                    config: Arc::new(limiter),
                })
            }
            None => {
                tracing::warn!("Invalid rate limit settings, upstream routes are not rate limited");
                upstream_routes
            }
        }
    };

    let api_routes = Router::new()
        .merge(store_routes)
        .merge(upstream_routes)
        .layer(RequestBodyLimitLayer::new(64 * 1024));

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn format_from_query_then_accept() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/csv"));

        assert_eq!(determine_format("CSV", &HeaderMap::new()), "csv");
        assert_eq!(determine_format("json", &headers), "csv");
        assert_eq!(determine_format("json", &HeaderMap::new()), "json");
    }
}
