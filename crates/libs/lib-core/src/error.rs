//! # Centralized Error Handling
//!
//! Application-wide error type [`AppError`] used consistently across all
//! backend modules, following the `thiserror` pattern. Every handler returns
//! `Result<_, AppError>`; the `IntoResponse` impl is the single place where
//! errors become HTTP responses, so redaction rules live here:
//!
//! - Development: real message, plus a `stack` field with the debug chain.
//! - Production: server errors collapse to a generic fixed string, `stack`
//!   is never emitted. Client errors (4xx) keep their message in both
//!   environments; those messages are written for the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::config::{self, Environment};

/// Fixed message for redacted server errors in production.
const GENERIC_SERVER_ERROR: &str = "Internal server error";

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type covering all error scenarios.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid user input. **400 Bad Request**
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid credentials. **401 Unauthorized**
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted. **403 Forbidden**
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Requested resource not found. **404 Not Found**
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness or state conflict. **409 Conflict**
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database-level failure. **500 Internal Server Error**
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error during startup. **500 Internal Server Error**
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected internal failure. **500 Internal Server Error**
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Resolve the response message and optional stack for an environment.
    fn render_parts(&self, env: Environment) -> (String, Option<String>) {
        let status = self.status_code();

        let message = if env.is_production() && status.is_server_error() {
            GENERIC_SERVER_ERROR.to_string()
        } else {
            self.to_string()
        };

        let stack = if env.is_production() {
            None
        } else {
            Some(format!("{self:?}"))
        };

        (message, stack)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("[ERROR] {}", self);
        }

        let (message, stack) = self.render_parts(config::current_env());

        let mut body = json!({ "error": message });
        if let Some(stack) = stack {
            body["stack"] = json!(stack);
        }

        (status, Json(body)).into_response()
    }
}

/// Convert `sqlx::Error` to `AppError`.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
            _ => AppError::Database(format!("Database error: {}", err)),
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert `serde_json::Error` to `AppError`.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::InvalidInput("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_development_keeps_message_and_stack() {
        let err = AppError::Internal("pool exhausted".into());
        let (message, stack) = err.render_parts(Environment::Development);

        assert!(message.contains("pool exhausted"));
        assert!(stack.is_some());
    }

    #[test]
    fn test_production_redacts_server_errors() {
        let err = AppError::Internal("pool exhausted".into());
        let (message, stack) = err.render_parts(Environment::Production);

        assert_eq!(message, GENERIC_SERVER_ERROR);
        assert!(stack.is_none());
    }

    #[test]
    fn test_production_keeps_client_error_message() {
        let err = AppError::InvalidInput("party_size must be between 1 and 12".into());
        let (message, stack) = err.render_parts(Environment::Production);

        assert!(message.contains("party_size"));
        assert!(stack.is_none());
    }
}
