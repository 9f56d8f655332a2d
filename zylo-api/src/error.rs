//! Error types for zylo-api

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use zylo_common::library::RepositoryError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (403)
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Conflict (409), e.g. email already registered
    #[error("{0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl From<zylo_common::Error> for ApiError {
    fn from(err: zylo_common::Error) -> Self {
        use zylo_common::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => ApiError::NotFound("Library item not found".to_string()),
            RepositoryError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(format!("Invalid multipart body: {}", err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_errors_map_to_status() {
        let cases = [
            (zylo_common::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (zylo_common::Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (zylo_common::Error::Conflict("x".into()), StatusCode::CONFLICT),
            (zylo_common::Error::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (zylo_common::Error::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_repository_errors_map_to_status() {
        let missing = ApiError::from(RepositoryError::NotFound(uuid::Uuid::new_v4()));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let storage = ApiError::from(RepositoryError::Storage("boom".into()));
        assert_eq!(storage.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
