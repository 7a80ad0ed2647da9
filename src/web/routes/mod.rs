use crate::{
    Config,
    model::{
        ResourceTyped,
        entity::{Subtopic, SubtopicProgressRow, is_unlocked},
    },
    web::{AppState, AuthenticatedUser, WebError, WebResult, doc::ApiDoc},
};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

pub mod checkpoint;
pub mod content;
pub mod dashboard;
pub mod health;
pub mod progress;
pub mod results;
pub mod rpc;
pub mod user;

pub fn build_app<S: Send + Sync + Clone + 'static>(state: AppState, config: &'static Config) -> Router<S> {
    let v1 = Router::new()
        .merge(health::routes(state.clone()))
        .merge(progress::routes(state.clone()))
        .merge(rpc::routes(state.clone()))
        .nest("/account", user::routes(state.clone()))
        .nest("/checkpoint", checkpoint::routes(state.clone()))
        .nest("/dashboard", dashboard::routes(state.clone()))
        .nest("/content", content::routes(state.clone()))
        .nest("/results", results::routes(state.clone()));

    let mut router = Router::new()
        .nest("/api/v1", v1)
        .layer(CookieManagerLayer::default())
        .layer(CorsLayer::very_permissive())
        .with_state(state);

    if config.app().docs() {
        let openapi = ApiDoc::openapi();

        router = router.merge(SwaggerUi::new("/api/v1/docs").url("/api-doc/openapi.json", openapi));
    }

    router
}

// Utils

pub(crate) async fn find_subtopic(
    state: &AppState,
    user: &AuthenticatedUser,
    subtopic_id: Uuid,
) -> WebResult<Subtopic> {
    Subtopic::find_by_id(state.pool(), user, subtopic_id)
        .await
        .map_err(|e| WebError::resource_fetch_error(Subtopic::get_resource_type(), e))?
        .ok_or_else(|| WebError::resource_not_found(Subtopic::get_resource_type()))
}

/// Learning-order progress rows for `user`, failing with 403 when
/// `subtopic_id` is still locked.
pub(crate) async fn ensure_unlocked(
    state: &AppState,
    user: &AuthenticatedUser,
    subtopic_id: Uuid,
) -> WebResult<Vec<SubtopicProgressRow>> {
    let rows = SubtopicProgressRow::fetch_all(state.pool(), user)
        .await
        .map_err(|e| WebError::resource_fetch_error(Subtopic::get_resource_type(), e))?;

    if !is_unlocked(&rows, subtopic_id) {
        tracing::debug!(%subtopic_id, "subtopic is locked");
        return Err(WebError::resource_locked(Subtopic::get_resource_type()));
    }
    Ok(rows)
}
