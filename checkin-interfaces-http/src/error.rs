use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use checkin_application::AppError;

#[derive(Debug)]
pub enum HttpError {
    Unauthorized,
    Forbidden,
    BadRequest(String),
    Conflict(String),
    NotFound(String),
    TooManyRequests,
    Internal(String),
}

impl From<AppError> for HttpError {
    fn from(value: AppError) -> Self {
        match value {
            AppError::Unauthorized => HttpError::Unauthorized,
            AppError::Forbidden => HttpError::Forbidden,
            AppError::BadRequest(msg) => HttpError::BadRequest(msg),
            AppError::Conflict(msg) => HttpError::Conflict(msg),
            AppError::NotFound(msg) => HttpError::NotFound(msg),
            AppError::RateLimited => HttpError::TooManyRequests,
            AppError::Internal(err) => HttpError::Internal(err.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_string()),
            HttpError::Forbidden => (
                StatusCode::FORBIDDEN,
                "this device is not whitelisted".to_string(),
            ),
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            HttpError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            HttpError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "too many requests, try again later".to_string(),
            ),
            HttpError::Internal(msg) => {
                error!("internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
