use thiserror::Error;

pub type AiResult<T> = std::result::Result<T, AiError>;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("ai service is disabled")]
    Disabled,
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("ai service responded with {status}: {body}")]
    BadStatus { status: u16, body: String },
    #[error("unexpected ai response: {0}")]
    UnexpectedResponse(String),
}
