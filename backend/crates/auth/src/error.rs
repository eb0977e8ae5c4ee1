//! Auth Error Types
//!
//! This module provides auth-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// Email, username or role name already taken
    #[error("{0}")]
    AlreadyExists(String),

    #[error("{0}")]
    NotFound(String),

    /// Wrong email or password (deliberately indistinguishable)
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Missing, malformed, expired or forged token
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Error raised by a shared component (value objects, unit of work)
    #[error(transparent)]
    Kernel(#[from] AppError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::InvalidCredentials => ErrorKind::BadRequest,
            AuthError::AlreadyExists(_) => ErrorKind::Conflict,
            AuthError::NotFound(_) => ErrorKind::NotFound,
            AuthError::Unauthorized(_) => ErrorKind::Unauthorized,
            AuthError::Forbidden(_) => ErrorKind::Forbidden,
            AuthError::Kernel(e) => e.kind(),
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Convert to AppError
    ///
    /// Kernel errors pass through untouched so their action hints survive.
    pub fn into_app_error(self) -> AppError {
        match self {
            AuthError::Kernel(e) => e,
            AuthError::Database(e) => AppError::internal("Database error").with_source(e),
            AuthError::InvalidCredentials => AppError::bad_request("Invalid email or password")
                .with_action("Check your email and password and try again"),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::Forbidden(msg) => {
                tracing::warn!(message = %msg, "Forbidden request");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.into_app_error().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AuthError::InvalidCredentials.kind(), ErrorKind::BadRequest);
        assert_eq!(
            AuthError::AlreadyExists("x".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AuthError::Unauthorized("x".into()).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            AuthError::Forbidden("x".into()).kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            AuthError::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::InternalServerError
        );
    }

    #[test]
    fn test_kernel_error_keeps_kind() {
        let err = AuthError::from(AppError::bad_request("Invalid email format"));
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.into_app_error().message(), "Invalid email format");
    }

    #[test]
    fn test_database_error_is_redacted() {
        let app = AuthError::Database(sqlx::Error::PoolTimedOut).into_app_error();
        assert!(app.is_server_error());
        assert_eq!(app.public_message(), "Internal Server Error");
    }
}
