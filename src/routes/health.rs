use axum::http::StatusCode;

/// Liveness check. Touches neither JMA nor the store and is never rate limited.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "health"
)]
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
