use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_cookies::{Cookie, Cookies, cookie::SameSite};
use uuid::Uuid;

use crate::{
    Config,
    auth::{self, hash_password, verify_password},
    model::{
        CrudRepository, ResourceTyped,
        entity::{UserEntity, UserEntityCreateUpdate},
    },
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares::{self, AUTH_TOKEN},
    },
};

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct UserCredentialsBody {
    pub username: String,
    pub password: String,
}

impl UserCredentialsBody {
    fn validate(&self) -> WebResult<()> {
        if self.username.trim().chars().count() < MIN_USERNAME_LEN {
            return Err(WebError::invalid_request(format!(
                "username must have at least {MIN_USERNAME_LEN} characters"
            )));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(WebError::invalid_request(format!(
                "password must have at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VerifyResponse {
    pub user_id: Uuid,
    pub role: String,
    /// True when the caller is served as the shared demo account.
    pub demo: bool,
}

pub fn routes<S>(state: AppState) -> Router<S> {
    let protected = Router::new()
        .route("/verify", get(user_verify_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ));

    Router::new()
        .route("/signup", post(user_signup_handler))
        .route("/signin", post(user_signin_handler))
        .merge(protected)
        .with_state(state)
}

async fn set_session_cookie(cookies: &Cookies, user_id: Uuid) -> WebResult<()> {
    let key = Config::get_or_init(false).await.app().jwt();
    let token = auth::issue_session_token(user_id, key).map_err(|e| WebError::server_crypt_error(e.into()))?;

    let mut cookie = Cookie::new(AUTH_TOKEN, token);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_http_only(true);
    cookie.set_path("/");
    cookies.add(cookie);
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signup",
    request_body = UserCredentialsBody,
    description = "Creates new user in database",
    responses(
        (status = 200, description = "User created successfully", body = UserEntity),
        (status = 400, description = "Username or password too short", body = ErrorResponse),
        (status = 409, description = "User already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account"
)]
async fn user_signup_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<UserCredentialsBody>,
) -> WebResult<impl IntoResponse> {
    payload.validate()?;

    let admin = AuthenticatedUser::admin();
    let username = payload.username.trim();
    let found = UserEntity::find_by_username(state.pool(), &admin, username)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    if found.is_some() {
        return Err(WebError::registration_conflict());
    }

    let hash = hash_password(&payload.password).map_err(WebError::server_crypt_error)?;
    let payload = UserEntityCreateUpdate {
        username: username.to_string(),
        password_hash: hash,
        role: None,
    };

    let created = UserEntity::create(state.pool(), &admin, payload)
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    set_session_cookie(&cookies, created.id()).await?;
    tracing::info!(user_id = %created.id(), "user signed up");

    Ok((StatusCode::OK, Json(created)))
}

#[utoipa::path(
    post,
    path = "/api/v1/account/signin",
    description = "Authorizes user in the system",
    request_body = UserCredentialsBody,
    responses(
        (status = 200, description = "User signed in", body = UserEntity),
        (status = 401, description = "Credentials invalid", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "account",
)]
async fn user_signin_handler(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<UserCredentialsBody>,
) -> WebResult<impl IntoResponse> {
    let admin = AuthenticatedUser::admin();
    let found = UserEntity::find_by_username(state.pool(), &admin, payload.username.trim())
        .await
        .map_err(|e| WebError::resource_fetch_error(UserEntity::get_resource_type(), e))?;

    let Some(found) = found.filter(|u| !u.is_demo()) else {
        return Err(WebError::auth_invalid_credentials());
    };

    let is_verified = verify_password(found.hash(), &payload.password).map_err(WebError::server_crypt_error)?;

    if !is_verified {
        return Err(WebError::auth_invalid_credentials());
    }

    set_session_cookie(&cookies, found.id()).await?;

    Ok((StatusCode::OK, Json(found)))
}

#[utoipa::path(
    get,
    path = "/api/v1/account/verify",
    description = "Resolves the caller, falling back to the demo account when enabled",
    responses(
        (status = 200, description = "Caller identity", body = VerifyResponse),
        (status = 401, description = "You're not authorized", body = ErrorResponse),
    ),
    tag = "account",
    security(
        ("cookie" = [])
    )
)]
async fn user_verify_handler(ctx: RequestContext, State(state): State<AppState>) -> WebResult<impl IntoResponse> {
    let user = ctx.resolve(&state).await?;

    let res = VerifyResponse {
        user_id: user.user_id(),
        role: user.user_role().to_string(),
        demo: ctx.maybe_user().is_none(),
    };
    Ok((StatusCode::OK, Json(res)))
}
