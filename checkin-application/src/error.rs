use checkin_domain::{ScanError, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("too many requests")]
    RateLimited,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        AppError::BadRequest(value.to_string())
    }
}

impl From<ScanError> for AppError {
    fn from(value: ScanError) -> Self {
        match value {
            ScanError::LockBusy => AppError::Conflict(value.to_string()),
            ScanError::InvalidCode(_) => AppError::BadRequest(value.to_string()),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}
