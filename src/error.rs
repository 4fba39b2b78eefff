//! API error taxonomy and HTTP status mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Every failure a repo or handler can surface to the boundary.
///
/// `NotFound` / `PermissionDenied` / `Validation` / `Conflict` are
/// recoverable rejections with a human-readable message; datastore and
/// other internal errors collapse to a generic 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Never leak datastore details to the caller.
            ApiError::Database(e) => {
                log::error!("database error: {e}");
                "internal server error".to_string()
            }
            ApiError::Internal(e) => {
                log::error!("internal error: {e:#}");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": message }))
    }
}
