use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    engine::calculate_adaptation,
    model::{
        DatabaseError, ResourceTyped,
        entity::{ExitKind, ExitPoint, UserProgress},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::content::{
            ContentRequest, ContentResponse, ProgressView, SaveContentProgressRequest,
            SaveContentProgressResponse, SubtopicContent,
        },
        error::ErrorResponse,
        middlewares,
        routes::{ensure_unlocked, find_subtopic},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/progress", post(content_save_progress_handler))
        .route("/{subtopic_id}", get(content_get_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn progress_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(UserProgress::get_resource_type(), e)
}

/// Subtopic body plus the caller's progress. Opening content marks the
/// subtopic in progress.
pub async fn get_content(
    state: &AppState,
    user: &AuthenticatedUser,
    req: ContentRequest,
) -> WebResult<ContentResponse> {
    let subtopic = find_subtopic(state, user, req.subtopic_id).await?;
    ensure_unlocked(state, user, subtopic.id()).await?;

    let progress = UserProgress::mark_in_progress(state.pool().executor(), user.user_id(), subtopic.id())
        .await
        .map_err(progress_error)?;

    Ok(ContentResponse {
        progress: ProgressView::from_row(&progress).map_err(progress_error)?,
        subtopic: SubtopicContent::from(subtopic),
    })
}

/// Stores the reading position together with the adaptation derived from
/// the reading signals.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id(), subtopic_id = %req.subtopic_id))]
pub async fn save_content_progress(
    state: &AppState,
    user: &AuthenticatedUser,
    req: SaveContentProgressRequest,
) -> WebResult<SaveContentProgressResponse> {
    let subtopic = find_subtopic(state, user, req.subtopic_id).await?;
    ensure_unlocked(state, user, subtopic.id()).await?;

    let adaptation = calculate_adaptation(&req.signals, subtopic.complexity_score())?;

    let exit_point = ExitPoint {
        kind: ExitKind::Content,
        position: req.position,
        timestamp: req.timestamp,
        signals: Some(req.signals),
        adaptation_modifier: Some(adaptation.modifier),
    };
    let (_, saved) = UserProgress::save_exit_point(state.pool(), user.user_id(), subtopic.id(), exit_point)
        .await
        .map_err(progress_error)?;

    tracing::debug!(modifier = adaptation.modifier, saved, "reading progress saved");
    Ok(SaveContentProgressResponse { saved, adaptation })
}

#[utoipa::path(
    get,
    path = "/api/v1/content/{subtopic_id}",
    params(
        ("subtopic_id" = Uuid, Path, description = "Subtopic id"),
    ),
    description = "Returns subtopic content and marks it in progress",
    responses(
        (status = 200, description = "Content found", body = ContentResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Subtopic is locked", body = ErrorResponse),
        (status = 404, description = "Subtopic not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "content",
    security(
        ("cookie" = [])
    )
)]
async fn content_get_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(subtopic_id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = get_content(&state, &user, ContentRequest { subtopic_id }).await?;
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    post,
    path = "/api/v1/content/progress",
    request_body = SaveContentProgressRequest,
    description = "Saves the reading position and reading signals, returns the computed adaptation",
    responses(
        (status = 200, description = "Progress handled", body = SaveContentProgressResponse),
        (status = 400, description = "Invalid reading signals", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Subtopic is locked", body = ErrorResponse),
        (status = 404, description = "Subtopic not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "content",
    security(
        ("cookie" = [])
    )
)]
async fn content_save_progress_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<SaveContentProgressRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = save_content_progress(&state, &user, payload).await?;
    Ok((StatusCode::OK, Json(res)))
}
