//! API error types and conversions

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::engine::EngineError;
use crate::storage::StorageError;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Request conflicts with the current registry (capacity, duplicates)
    Conflict(String),

    /// Invalid request parameters
    InvalidRequest(String),

    /// Resource not found
    NotFound(String),

    /// Storage operation failed
    StorageError(String),

    /// Internal server error
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::StorageError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::CapacityExceeded { .. }
            | EngineError::DuplicateTarget { .. }
            | EngineError::Inactive(_) => ApiError::Conflict(message),
            EngineError::UnknownTarget(_) | EngineError::UnknownSession(_) => {
                ApiError::NotFound(message)
            }
            EngineError::InvalidName(_) => ApiError::InvalidRequest(message),
            EngineError::PersistenceFailed(_) => ApiError::StorageError(message),
            EngineError::FetchFailed(_) => ApiError::Internal(message),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::StorageError(err.to_string())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
