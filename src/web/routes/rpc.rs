//! Batched JSON-RPC transport over the same procedures the REST routes use.
//!
//! A body is either one call object or an array of them. Calls run in order
//! and every call gets its own `result` or `error`, so one failing call never
//! fails the batch.

use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    error::log_error,
    web::{
        AppState, AuthenticatedUser, RequestContext, WebError, WebResult,
        error::ErrorResponse,
        middlewares,
        routes::{checkpoint, content, dashboard, health, progress, results},
    },
};

pub const MAX_BATCH_SIZE: usize = 50;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RpcCall {
    /// Echoed back in the response
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum RpcRequest {
    Batch(Vec<RpcCall>),
    Single(RpcCall),
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RpcError {
    /// HTTP status the REST route would answer with
    pub code: u16,
    pub message: String,
}

impl From<&WebError> for RpcError {
    fn from(e: &WebError) -> Self {
        Self {
            code: e.status_code().as_u16(),
            message: e.client_display(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RpcResponse {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum RpcReply {
    Batch(Vec<RpcResponse>),
    Single(RpcResponse),
}

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/rpc", post(rpc_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

/// Caller identity for one batch, resolved on first use.
struct RpcSession<'a> {
    state: &'a AppState,
    ctx: &'a RequestContext,
    user: Option<AuthenticatedUser>,
}

impl<'a> RpcSession<'a> {
    fn new(state: &'a AppState, ctx: &'a RequestContext) -> Self {
        Self { state, ctx, user: None }
    }

    async fn user(&mut self) -> WebResult<AuthenticatedUser> {
        if let Some(user) = &self.user {
            return Ok(user.clone());
        }
        let user = self.ctx.resolve(self.state).await?;
        self.user = Some(user.clone());
        Ok(user)
    }

    async fn call(&mut self, call: RpcCall) -> RpcResponse {
        match self.dispatch(&call.method, call.params).await {
            Ok(result) => RpcResponse {
                id: call.id,
                result: Some(result),
                error: None,
            },
            Err(e) => {
                log_error(&e);
                RpcResponse {
                    id: call.id,
                    result: None,
                    error: Some(RpcError::from(&e)),
                }
            }
        }
    }

    #[tracing::instrument(skip(self, params))]
    async fn dispatch(&mut self, method: &str, params: Value) -> WebResult<Value> {
        let state = self.state;
        match method {
            "health" => to_value(health::health(state).await),
            "checkpoint.generate" => {
                let user = self.user().await?;
                to_value(checkpoint::generate(state, &user, parse_params(params)?).await?)
            }
            "checkpoint.submit" => {
                let user = self.user().await?;
                to_value(checkpoint::submit(state, &user, parse_params(params)?).await?)
            }
            "dashboard.getTopics" => {
                let user = self.user().await?;
                to_value(dashboard::get_topics(state, &user).await?)
            }
            "dashboard.getHistory" => {
                let user = self.user().await?;
                to_value(dashboard::get_history(state, &user, parse_params(params)?).await?)
            }
            "dashboard.getResumePoint" => {
                let user = self.user().await?;
                to_value(dashboard::get_resume_point(state, &user).await?)
            }
            "dashboard.startTopic" => {
                let user = self.user().await?;
                to_value(dashboard::start_topic(state, &user, parse_params(params)?).await?)
            }
            "content.getContent" => {
                let user = self.user().await?;
                to_value(content::get_content(state, &user, parse_params(params)?).await?)
            }
            "content.saveProgress" => {
                let user = self.user().await?;
                to_value(content::save_content_progress(state, &user, parse_params(params)?).await?)
            }
            "progress.save" => {
                let user = self.user().await?;
                to_value(progress::save(state, &user, parse_params(params)?).await?)
            }
            "results.get" => {
                let user = self.user().await?;
                to_value(results::get_results(state, &user, parse_params(params)?).await?)
            }
            other => Err(WebError::unknown_method(other)),
        }
    }
}

/// Missing params read as an empty object.
fn parse_params<T: DeserializeOwned>(params: Value) -> WebResult<T> {
    let params = if params.is_null() {
        Value::Object(Default::default())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| WebError::invalid_request(format!("invalid params: {e}")))
}

fn to_value<T: Serialize>(value: T) -> WebResult<Value> {
    serde_json::to_value(value).map_err(WebError::server_serialize_error)
}

#[utoipa::path(
    post,
    path = "/api/v1/rpc",
    request_body = RpcRequest,
    description = "Runs one procedure call or a batch of them. Methods: health, checkpoint.generate, \
        checkpoint.submit, dashboard.getTopics, dashboard.getHistory, dashboard.getResumePoint, \
        dashboard.startTopic, content.getContent, content.saveProgress, progress.save, results.get",
    responses(
        (status = 200, description = "One response per call, in call order", body = RpcReply),
        (status = 400, description = "Empty or oversized batch", body = ErrorResponse),
    ),
    tag = "rpc",
    security(
        ("cookie" = [])
    )
)]
async fn rpc_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    Json(payload): Json<RpcRequest>,
) -> WebResult<impl IntoResponse> {
    let mut session = RpcSession::new(&state, &ctx);

    let reply = match payload {
        RpcRequest::Single(call) => RpcReply::Single(session.call(call).await),
        RpcRequest::Batch(calls) => {
            if calls.is_empty() {
                return Err(WebError::invalid_request("empty batch"));
            }
            if calls.len() > MAX_BATCH_SIZE {
                return Err(WebError::invalid_request(format!(
                    "batch holds more than {MAX_BATCH_SIZE} calls"
                )));
            }

            let mut responses = Vec::with_capacity(calls.len());
            for call in calls {
                responses.push(session.call(call).await);
            }
            RpcReply::Batch(responses)
        }
    };

    Ok(Json(reply))
}
