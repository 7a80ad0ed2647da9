use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};

use crate::web::{AppState, WebResult, dto::health::HealthResponse};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(state)
}

pub async fn health(state: &AppState) -> HealthResponse {
    let database = state.pool().ping().await;
    if !database {
        tracing::warn!("database is unreachable");
    }
    HealthResponse::new(database)
}

#[utoipa::path(
    get,
    path = "/api/v1/health",
    description = "Service status and database reachability",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    ),
    tag = "health"
)]
async fn health_handler(State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    Ok((StatusCode::OK, Json(health(&state).await)))
}
