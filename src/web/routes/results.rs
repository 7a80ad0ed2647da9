use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ResourceTyped, check_access,
        entity::{Attempt, Subtopic},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::results::{ResultsRequest, ResultsResponse},
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/{attempt_id}", get(results_get_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Full report of one attempt. Only its owner or an admin may read it.
pub async fn get_results(
    state: &AppState,
    user: &AuthenticatedUser,
    req: ResultsRequest,
) -> WebResult<ResultsResponse> {
    let found = Attempt::find_by_id(state.pool(), user, req.attempt_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Attempt::get_resource_type(), e))?;

    let Some(attempt) = found else {
        return Err(WebError::resource_not_found(Attempt::get_resource_type()));
    };

    check_access(state.pool(), user, &attempt, user.user_id())
        .await
        .map_err(|e| WebError::resource_access(Attempt::get_resource_type(), e))?;

    let title = Subtopic::find_by_id(state.pool(), user, attempt.subtopic_id())
        .await
        .map_err(|e| WebError::resource_fetch_error(Subtopic::get_resource_type(), e))?
        .map(|s| s.title().to_string());

    ResultsResponse::new(&attempt, title)
        .map_err(|e| WebError::resource_fetch_error(Attempt::get_resource_type(), e))
}

#[utoipa::path(
    get,
    path = "/api/v1/results/{attempt_id}",
    params(
        ("attempt_id" = Uuid, Path, description = "Attempt id"),
    ),
    description = "Scored report of a checkpoint attempt",
    responses(
        (status = 200, description = "Attempt found", body = ResultsResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Attempt belongs to another user", body = ErrorResponse),
        (status = 404, description = "Attempt not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "results",
    security(
        ("cookie" = [])
    )
)]
async fn results_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = get_results(&state, &user, ResultsRequest { attempt_id }).await?;
    Ok((StatusCode::OK, Json(res)))
}
