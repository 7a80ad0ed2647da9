use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    model::{
        Page, PaginatableRepository, ProgressStatus, ResourceTyped, TopicStatus,
        entity::{Attempt, ResumeRow, Subtopic, SubtopicProgressRow, Topic, UserProgress, first_unfinished},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::dashboard::{
            AttemptSummary, HistoryQuery, ResumePoint, StartTopicRequest, StartTopicResponse,
            TopicOverview,
        },
        error::ErrorResponse,
        middlewares,
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/topics", get(dashboard_topics_handler))
        .route("/topics/{id}/start", post(dashboard_start_topic_handler))
        .route("/history", get(dashboard_history_handler))
        .route("/resume", get(dashboard_resume_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

async fn load_topics(
    state: &AppState,
    user: &AuthenticatedUser,
) -> WebResult<(Vec<TopicOverview>, Vec<SubtopicProgressRow>)> {
    let (topics, rows) = tokio::try_join!(
        Topic::all(state.pool(), user),
        SubtopicProgressRow::fetch_all(state.pool(), user),
    )
    .map_err(|e| WebError::resource_fetch_error(Topic::get_resource_type(), e))?;

    let overviews = TopicOverview::build(topics, &rows)
        .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;
    Ok((overviews, rows))
}

pub async fn get_topics(state: &AppState, user: &AuthenticatedUser) -> WebResult<Vec<TopicOverview>> {
    Ok(load_topics(state, user).await?.0)
}

pub async fn get_history(
    state: &AppState,
    user: &AuthenticatedUser,
    query: HistoryQuery,
) -> WebResult<Page<AttemptSummary>> {
    let (limit, offset) = query.resolve().map_err(WebError::invalid_request)?;

    let page = Attempt::page(state.pool(), user, limit, offset)
        .await
        .map_err(|e| WebError::resource_fetch_error(Attempt::get_resource_type(), e))?;

    let ids: Vec<Uuid> = page.items.iter().map(Attempt::subtopic_id).collect();
    let titles = Subtopic::titles(state.pool(), &ids)
        .await
        .map_err(|e| WebError::resource_fetch_error(Subtopic::get_resource_type(), e))?;

    page.try_map(|attempt| AttemptSummary::new(&attempt, titles.get(&attempt.subtopic_id()).cloned()))
        .map_err(|e| WebError::resource_fetch_error(Attempt::get_resource_type(), e))
}

pub async fn get_resume_point(state: &AppState, user: &AuthenticatedUser) -> WebResult<Option<ResumePoint>> {
    let row = ResumeRow::find_latest(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;

    row.map(ResumePoint::from_row)
        .transpose()
        .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))
}

/// Opens the first unfinished subtopic of an unlocked topic. A completed
/// topic reopens its first subtopic without touching progress.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id(), topic_id = %req.topic_id))]
pub async fn start_topic(
    state: &AppState,
    user: &AuthenticatedUser,
    req: StartTopicRequest,
) -> WebResult<StartTopicResponse> {
    let (topics, rows) = load_topics(state, user).await?;
    let Some(topic) = topics.iter().find(|t| t.id == req.topic_id) else {
        return Err(WebError::resource_not_found(Topic::get_resource_type()));
    };

    if topic.status == TopicStatus::Locked {
        return Err(WebError::resource_locked(Topic::get_resource_type()));
    }

    if let Some(next) = first_unfinished(&rows, topic.id) {
        let progress = UserProgress::mark_in_progress(state.pool().executor(), user.user_id(), next.subtopic_id)
            .await
            .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;

        tracing::info!(subtopic_id = %next.subtopic_id, "topic started");
        return Ok(StartTopicResponse {
            topic_id: topic.id,
            subtopic_id: next.subtopic_id,
            subtopic_title: next.title.clone(),
            status: progress
                .status()
                .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?,
        });
    }

    let first = topic
        .subtopics
        .first()
        .ok_or_else(|| WebError::resource_not_found(Subtopic::get_resource_type()))?;
    Ok(StartTopicResponse {
        topic_id: topic.id,
        subtopic_id: first.id,
        subtopic_title: first.title.clone(),
        status: ProgressStatus::Completed,
    })
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/topics",
    description = "Topics in learning order with their status and subtopic progress",
    responses(
        (status = 200, description = "Topics found", body = Vec<TopicOverview>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "dashboard",
    security(
        ("cookie" = [])
    )
)]
async fn dashboard_topics_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = get_topics(&state, &user).await?;
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/history",
    params(HistoryQuery),
    description = "Current user's checkpoint attempts, newest first",
    responses(
        (status = 200, description = "Returns requested page", body = Page<AttemptSummary>),
        (status = 400, description = "Invalid limit or offset", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "dashboard",
    security(
        ("cookie" = [])
    )
)]
async fn dashboard_history_handler(
    ctx: RequestContext,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = get_history(&state, &user, query).await?;
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    get,
    path = "/api/v1/dashboard/resume",
    description = "Most recently touched in-progress subtopic, or null",
    responses(
        (status = 200, description = "Resume point", body = Option<ResumePoint>),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "dashboard",
    security(
        ("cookie" = [])
    )
)]
async fn dashboard_resume_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = get_resume_point(&state, &user).await?;
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    post,
    path = "/api/v1/dashboard/topics/{id}/start",
    params(
        ("id" = Uuid, Path, description = "Topic id"),
    ),
    description = "Starts or continues a topic at its first unfinished subtopic",
    responses(
        (status = 200, description = "Subtopic to open", body = StartTopicResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Topic is locked", body = ErrorResponse),
        (status = 404, description = "Topic not found or empty", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "dashboard",
    security(
        ("cookie" = [])
    )
)]
async fn dashboard_start_topic_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = start_topic(&state, &user, StartTopicRequest { topic_id: id }).await?;
    Ok((StatusCode::OK, Json(res)))
}
