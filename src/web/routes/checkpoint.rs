use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::post,
};

use crate::{
    ai::{self, FeedbackRequest},
    engine::{generate_question_set, question_gen::MAX_MODIFIER, score_checkpoint},
    model::{
        DatabaseError, ResourceTyped, ResourceType,
        entity::{Attempt, AttemptCreate, SubtopicProgressRow, UserProgress, is_unlocked},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::checkpoint::{
            GenerateCheckpointRequest, GenerateCheckpointResponse, SubmitCheckpointRequest,
            SubmitCheckpointResponse,
        },
        error::ErrorResponse,
        middlewares,
        routes::{ensure_unlocked, find_subtopic},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/generate", post(checkpoint_generate_handler))
        .route("/submit", post(checkpoint_submit_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

fn progress_error(e: DatabaseError) -> WebError {
    WebError::resource_fetch_error(UserProgress::get_resource_type(), e)
}

/// Whole-question modifier from the last saved reading signals, 0 when the
/// user never sent any.
fn stored_modifier(progress: Option<&UserProgress>) -> WebResult<i32> {
    let Some(progress) = progress else {
        return Ok(0);
    };
    let modifier = progress
        .exit_point()
        .map_err(progress_error)?
        .and_then(|e| e.adaptation_modifier)
        .unwrap_or(0.0);
    Ok((modifier.round() as i32).clamp(0, MAX_MODIFIER))
}

/// Generates a checkpoint for the subtopic, or returns the pending one.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id(), subtopic_id = %req.subtopic_id))]
pub async fn generate(
    state: &AppState,
    user: &AuthenticatedUser,
    req: GenerateCheckpointRequest,
) -> WebResult<GenerateCheckpointResponse> {
    let subtopic = find_subtopic(state, user, req.subtopic_id).await?;
    ensure_unlocked(state, user, subtopic.id()).await?;

    let progress = UserProgress::find(state.pool().executor(), user.user_id(), subtopic.id())
        .await
        .map_err(progress_error)?;
    let modifier = stored_modifier(progress.as_ref())?;

    if !req.regenerate {
        let pending = match &progress {
            Some(p) => p.checkpoint().map_err(progress_error)?,
            None => None,
        };
        if let Some(set) = pending {
            tracing::debug!("resuming pending checkpoint");
            return Ok(GenerateCheckpointResponse::new(subtopic.id(), &set, modifier, true));
        }
    }

    let set = generate_question_set(subtopic.complexity_score(), modifier, subtopic.title())?;
    UserProgress::store_checkpoint(state.pool(), user.user_id(), subtopic.id(), &set)
        .await
        .map_err(progress_error)?;

    tracing::info!(count = set.count, modifier, "checkpoint generated");
    Ok(GenerateCheckpointResponse::new(subtopic.id(), &set, modifier, false))
}

/// Scores the pending checkpoint and records the attempt. AI calls happen
/// before the recording transaction opens.
#[tracing::instrument(skip_all, fields(user_id = %user.user_id(), subtopic_id = %req.subtopic_id))]
pub async fn submit(
    state: &AppState,
    user: &AuthenticatedUser,
    req: SubmitCheckpointRequest,
) -> WebResult<SubmitCheckpointResponse> {
    let subtopic = find_subtopic(state, user, req.subtopic_id).await?;

    let progress = UserProgress::find(state.pool().executor(), user.user_id(), subtopic.id())
        .await
        .map_err(progress_error)?;
    let set = match &progress {
        Some(p) => p.checkpoint().map_err(progress_error)?,
        None => None,
    }
    .ok_or_else(|| WebError::resource_not_found(ResourceType::Checkpoint))?;

    let verdicts = ai::semantic_verdicts(state.ai(), &set, &req.answers).await;
    let report = score_checkpoint(&set, &req.answers, &verdicts);
    let feedback =
        ai::feedback_or_fallback(state.ai(), &FeedbackRequest::from_report(subtopic.title(), &report)).await;

    let attempt = Attempt::submit(
        state.pool(),
        AttemptCreate {
            user_id: user.user_id(),
            subtopic_id: subtopic.id(),
            questions: set,
            answers: req.answers,
            report: report.clone(),
            feedback: feedback.clone(),
        },
    )
    .await
    .map_err(|e| match e {
        DatabaseError::NotFound => WebError::resource_not_found(ResourceType::Checkpoint),
        // a concurrent submit or regenerate replaced the set we scored
        DatabaseError::Conflict => WebError::resource_conflict(ResourceType::Checkpoint),
        e => WebError::resource_fetch_error(Attempt::get_resource_type(), e),
    })?;

    tracing::info!(score = report.score, passed = report.passed, "checkpoint submitted");

    let next_subtopic_id = if report.passed {
        let rows = SubtopicProgressRow::fetch_all(state.pool(), user)
            .await
            .map_err(progress_error)?;
        rows.iter()
            .position(|r| r.subtopic_id == subtopic.id())
            .and_then(|pos| rows.get(pos + 1))
            .filter(|next| is_unlocked(&rows, next.subtopic_id))
            .map(|next| next.subtopic_id)
    } else {
        None
    };

    Ok(SubmitCheckpointResponse::new(attempt.id(), report, feedback, next_subtopic_id))
}

#[utoipa::path(
    post,
    path = "/api/v1/checkpoint/generate",
    request_body = GenerateCheckpointRequest,
    description = "Generates a checkpoint quiz for a subtopic, resuming a pending one unless `regenerate` is set",
    responses(
        (status = 200, description = "Checkpoint questions without answers", body = GenerateCheckpointResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Subtopic is locked", body = ErrorResponse),
        (status = 404, description = "Subtopic not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "checkpoint",
    security(
        ("cookie" = [])
    )
)]
async fn checkpoint_generate_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<GenerateCheckpointRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = generate(&state, &user, payload).await?;
    Ok((StatusCode::OK, Json(res)))
}

#[utoipa::path(
    post,
    path = "/api/v1/checkpoint/submit",
    request_body = SubmitCheckpointRequest,
    description = "Scores the pending checkpoint and records the attempt",
    responses(
        (status = 200, description = "Checkpoint scored", body = SubmitCheckpointResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 404, description = "No pending checkpoint", body = ErrorResponse),
        (status = 409, description = "Checkpoint was replaced or already submitted", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "checkpoint",
    security(
        ("cookie" = [])
    )
)]
async fn checkpoint_submit_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<SubmitCheckpointRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = submit(&state, &user, payload).await?;
    Ok((StatusCode::OK, Json(res)))
}
