use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::errors::ErrorKind;
use tower_cookies::Cookies;

use crate::{
    Config, auth,
    model::{CrudRepository, ResourceTyped, entity::UserEntity},
    web::{AppState, RequestContext, context::AuthenticatedUser, error::WebError},
};

pub static AUTH_TOKEN: &str = "SID";

/// Resolves the `SID` cookie into a [`RequestContext`]. A missing cookie or
/// an unknown user yields an anonymous context, a forged or expired token is
/// rejected.
pub async fn extract_context_fn(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, WebError> {
    let Some(token) = cookies.get(AUTH_TOKEN) else {
        req.extensions_mut().insert(RequestContext::new(None));
        return Ok(next.run(req).await);
    };

    let claims = auth::process_token(token.value(), Config::get_or_init(false).await.app().jwt())
        .map_err(|e| WebError::auth_cookie_invalid(AUTH_TOKEN, e))?;

    let id = claims
        .claims
        .user_id()
        .ok_or_else(|| WebError::auth_cookie_invalid(AUTH_TOKEN, ErrorKind::InvalidSubject.into()))?;

    let found = UserEntity::find_by_id(state.pool(), &AuthenticatedUser::admin(), id)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    let ctx = found.map(|user| AuthenticatedUser::new(id, user.role()));
    req.extensions_mut().insert(RequestContext::new(ctx));
    Ok(next.run(req).await)
}
