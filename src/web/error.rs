use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::{
    auth::CryptError,
    engine::EngineError,
    error::log_error,
    model::{DatabaseError, ResourceType},
};

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("RegistrationUserConflict")]
    RegistrationUserConflict,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("AuthenticationCookieInvalid, cookie: {cookie}. Error: {error}")]
    AuthenticationCookieInvalid {
        cookie: String,
        error: jsonwebtoken::errors::Error,
    },

    #[error("AuthenticationRequired")]
    AuthenticationRequired,

    #[error("AuthenticationInvalidCredentials")]
    AuthenticationInvalidCredentials,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("ResourceNotFound: {resource_type:?}")]
    ResourceNotFound { resource_type: ResourceType },

    #[error("ResourceForbidden: {resource_type:?}")]
    ResourceForbidden { resource_type: ResourceType },

    #[error("ResourceFetchError: {resource_type:?}. Error: {error}")]
    ResourceFetchError {
        resource_type: ResourceType,
        error: DatabaseError,
    },

    #[error("ResourceLocked: {resource_type:?}")]
    ResourceLocked { resource_type: ResourceType },

    #[error("ResourceConflict: {resource_type:?}")]
    ResourceConflict { resource_type: ResourceType },
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("RequestInvalid: {reason}")]
    RequestInvalid { reason: String },

    #[error("RequestUnknownMethod: {method}")]
    RequestUnknownMethod { method: String },
}

impl From<EngineError> for RequestError {
    fn from(e: EngineError) -> Self {
        Self::RequestInvalid {
            reason: e.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("ServerCryptError: {0}")]
    ServerCryptError(#[from] crate::auth::CryptError),
    #[error("ServerSerializeError: {0}")]
    ServerSerializeError(#[from] serde_json::Error),
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    pub fn client_display(&self) -> String {
        String::from("Internal server error.")
    }
}

impl RegistrationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RegistrationUserConflict => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RegistrationUserConflict => {
                String::from("Registration error, user already exists.")
            }
        }
    }
}

impl AuthenticationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::AuthenticationInvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::AuthenticationCookieInvalid { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::AuthenticationCookieInvalid { .. } => {
                String::from("Authentication error, cookie invalid.")
            }
            Self::AuthenticationRequired => String::from("Authentication required."),
            Self::AuthenticationInvalidCredentials => {
                String::from("Authentication error, user not found or password is invalid.")
            }
        }
    }
}

impl ResourceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            Self::ResourceForbidden { .. } => StatusCode::FORBIDDEN,
            Self::ResourceFetchError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ResourceLocked { .. } => StatusCode::FORBIDDEN,
            Self::ResourceConflict { .. } => StatusCode::CONFLICT,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceNotFound { .. } => String::from("Resource error, resource not found."),
            Self::ResourceForbidden { .. } => String::from("Resource error, resource forbidden."),
            Self::ResourceFetchError { .. } => {
                String::from("Resource error, unable to fetch resource.")
            }
            Self::ResourceLocked { .. } => {
                String::from("Resource error, finish the previous subtopics first.")
            }
            Self::ResourceConflict { .. } => {
                String::from("Resource error, resource was changed by another request.")
            }
        }
    }
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::RequestInvalid { .. } => StatusCode::BAD_REQUEST,
            Self::RequestUnknownMethod { .. } => StatusCode::NOT_FOUND,
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::RequestInvalid { reason } => format!("Request error, {reason}."),
            Self::RequestUnknownMethod { method } => format!("Request error, unknown method `{method}`."),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("ResourceError - {0}")]
    ResourceError(#[from] ResourceError),
    #[error("AuthenticationError - {0}")]
    AuthenticationError(#[from] AuthenticationError),
    #[error("RegistrationError - {0}")]
    RegistrationError(#[from] RegistrationError),
    #[error("RequestError - {0}")]
    RequestError(#[from] RequestError),
    #[error("ServerError - {0}")]
    ServerError(#[from] ServerError),
}

impl From<EngineError> for WebError {
    fn from(e: EngineError) -> Self {
        Self::RequestError(e.into())
    }
}

impl WebError {
    pub fn resource_not_found(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceNotFound {
            resource_type: r#type,
        })
    }

    pub fn resource_forbidden(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceForbidden {
            resource_type: r#type,
        })
    }

    pub fn resource_fetch_error(r#type: ResourceType, error: DatabaseError) -> Self {
        Self::ResourceError(ResourceError::ResourceFetchError {
            resource_type: r#type,
            error,
        })
    }

    pub fn resource_locked(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceLocked {
            resource_type: r#type,
        })
    }

    pub fn resource_conflict(r#type: ResourceType) -> Self {
        Self::ResourceError(ResourceError::ResourceConflict {
            resource_type: r#type,
        })
    }

    /// Maps `Forbidden` from an access check to 403, anything else to a fetch error.
    pub fn resource_access(r#type: ResourceType, error: DatabaseError) -> Self {
        match error {
            DatabaseError::Forbidden => Self::resource_forbidden(r#type),
            e => Self::resource_fetch_error(r#type, e),
        }
    }

    pub fn invalid_request<S: Into<String>>(reason: S) -> Self {
        Self::RequestError(RequestError::RequestInvalid {
            reason: reason.into(),
        })
    }

    pub fn unknown_method<S: Into<String>>(method: S) -> Self {
        Self::RequestError(RequestError::RequestUnknownMethod {
            method: method.into(),
        })
    }

    pub fn auth_cookie_invalid<S: Into<String>>(
        cookie: S,
        error: jsonwebtoken::errors::Error,
    ) -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationCookieInvalid {
            cookie: cookie.into(),
            error,
        })
    }

    pub fn auth_required() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationRequired)
    }

    pub fn auth_invalid_credentials() -> Self {
        Self::AuthenticationError(AuthenticationError::AuthenticationInvalidCredentials)
    }

    pub fn registration_conflict() -> Self {
        Self::RegistrationError(RegistrationError::RegistrationUserConflict)
    }

    pub fn server_crypt_error(e: CryptError) -> Self {
        Self::ServerError(ServerError::ServerCryptError(e))
    }

    pub fn server_serialize_error(e: serde_json::Error) -> Self {
        Self::ServerError(ServerError::ServerSerializeError(e))
    }

    pub fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::ResourceError(e) => e.status_code(),
            Self::RegistrationError(e) => e.status_code(),
            Self::AuthenticationError(e) => e.status_code(),
            Self::RequestError(e) => e.status_code(),
            Self::ServerError(e) => e.status_code(),
        }
    }

    pub fn client_display(&self) -> String {
        match self {
            Self::ResourceError(e) => e.client_display(),
            Self::RegistrationError(e) => e.client_display(),
            Self::AuthenticationError(e) => e.client_display(),
            Self::RequestError(e) => e.client_display(),
            Self::ServerError(e) => e.client_display(),
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message for the client
    pub message: String,
    /// HTTP status code (stringified)
    pub status_code: String,
    /// Optional debug details (only in debug mode)
    pub details: Option<String>,
}

impl From<&WebError> for ErrorResponse {
    fn from(e: &WebError) -> Self {
        Self {
            message: e.client_display(),
            status_code: e.status_code().as_str().to_string(),
            details: if cfg!(debug_assertions) {
                Some(e.to_string())
            } else {
                None
            },
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        log_error(&self);

        let body = ErrorResponse::from(&self);
        (self.status_code(), Json(body)).into_response()
    }
}
