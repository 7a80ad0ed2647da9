use axum::{Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse, routing::post};

use crate::{
    engine::{adaptive::MAX_MODIFIER, calculate_adaptation},
    model::{ResourceTyped, entity::UserProgress},
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        dto::progress::{SaveProgressRequest, SaveProgressResponse},
        error::ErrorResponse,
        middlewares,
        routes::{ensure_unlocked, find_subtopic},
    },
};

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/progress", post(progress_save_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Last-write-wins save of any exit point. Signals, when sent, decide the
/// stored modifier; a bare modifier must lie in 0..=2.
pub async fn save(
    state: &AppState,
    user: &AuthenticatedUser,
    req: SaveProgressRequest,
) -> WebResult<SaveProgressResponse> {
    let subtopic = find_subtopic(state, user, req.subtopic_id).await?;
    ensure_unlocked(state, user, subtopic.id()).await?;

    let mut exit_point = req.exit_point;
    if let Some(signals) = &exit_point.signals {
        let adaptation = calculate_adaptation(signals, subtopic.complexity_score())?;
        exit_point.adaptation_modifier = Some(adaptation.modifier);
    } else if let Some(modifier) = exit_point.adaptation_modifier {
        if !(0.0..=MAX_MODIFIER).contains(&modifier) {
            return Err(WebError::invalid_request(format!(
                "adaptationModifier {modifier} is out of range 0..={MAX_MODIFIER}"
            )));
        }
    }

    let (row, saved) = UserProgress::save_exit_point(state.pool(), user.user_id(), subtopic.id(), exit_point)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;

    let exit_point = row
        .exit_point()
        .map_err(|e| WebError::resource_fetch_error(UserProgress::get_resource_type(), e))?;
    Ok(SaveProgressResponse { saved, exit_point })
}

#[utoipa::path(
    post,
    path = "/api/v1/progress",
    request_body = SaveProgressRequest,
    description = "Saves where the user left a content or checkpoint screen. Older exit points never replace newer ones",
    responses(
        (status = 200, description = "Progress handled", body = SaveProgressResponse),
        (status = 400, description = "Invalid signals or adaptation modifier", body = ErrorResponse),
        (status = 401, description = "You're not authorized to do this", body = ErrorResponse),
        (status = 403, description = "Subtopic is locked", body = ErrorResponse),
        (status = 404, description = "Subtopic not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "progress",
    security(
        ("cookie" = [])
    )
)]
async fn progress_save_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<SaveProgressRequest>,
) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;
    let res = save(&state, &user, payload).await?;
    Ok((StatusCode::OK, Json(res)))
}
