use crate::api::{ApiError, ApiErrorCode, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<ValidationError>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid time range: start {start} is after end {end}")]
    InvalidRange { start: String, end: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(errors) => ApiError::validation(errors),
            Error::Json(e) => ApiError::new(ApiErrorCode::BadRequest, e.to_string()),
            Error::InvalidRange { .. } => ApiError::new(ApiErrorCode::BadRequest, err.to_string()),
            Error::Config(_) => ApiError::internal(err.to_string()),
        }
    }
}
