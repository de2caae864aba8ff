/// Error types for geopost-service
///
/// Errors are converted to appropriate HTTP responses for API clients.
/// Downstream service failures are logged with their cause and surfaced to
/// the client as a generic internal error.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;

use crate::services::classifier::ClassifierError;
use crate::services::media_store::MediaStoreError;
use crate::services::post_index::IndexError;
use crate::services::user_store::UserStoreError;

/// Result type for geopost-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Bad request (malformed body, missing file, invalid field)
    BadRequest(String),

    /// Unauthorized access (bad credentials, invalid or expired token)
    Unauthorized(String),

    /// Conflict (duplicate username)
    Conflict(String),

    /// Internal server error
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // The underlying cause of an internal error goes to the log, never
        // to the client.
        let message = match self {
            AppError::Internal(msg) => {
                tracing::error!(cause = %msg, "internal error");
                "internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(json!({
            "error": message,
            "status": status.as_u16(),
        }))
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        AppError::Internal(format!("search index: {}", err))
    }
}

impl From<MediaStoreError> for AppError {
    fn from(err: MediaStoreError) -> Self {
        AppError::Internal(format!("media store: {}", err))
    }
}

impl From<ClassifierError> for AppError {
    fn from(err: ClassifierError) -> Self {
        AppError::Internal(format!("classifier: {}", err))
    }
}

impl From<UserStoreError> for AppError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::AlreadyExists => {
                AppError::Conflict("username already exists".to_string())
            }
            UserStoreError::InvalidCredentials => {
                AppError::Unauthorized("invalid username or password".to_string())
            }
            other => AppError::Internal(format!("credential store: {}", other)),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("token signing: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_username_maps_to_conflict() {
        let err: AppError = UserStoreError::AlreadyExists.into();
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_bad_credentials_map_to_unauthorized() {
        let err: AppError = UserStoreError::InvalidCredentials.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }
}
