use axum::{
    Json,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{pages, storage::StorageError};

/// Handler result type.
pub type AppResult<T> = Result<T, AppError>;

/// Repository result type.
pub type RepoResult<T> = Result<T, RepoError>;

/// AppError
///
/// Every failure a handler can surface. Not-found, CSRF and server failures render the
/// static error pages; the remaining client errors carry a small JSON body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("CSRF verification failed: {0}")]
    CsrfFailed(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("external service error: {0}")]
    ExternalService(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) | Self::CsrfFailed(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ExternalService(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable code used in JSON error bodies.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::CsrfFailed(_) => "CSRF_FAILED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request rejected");
        }

        match self {
            Self::NotFound(_) => (status, Html(pages::NOT_FOUND)).into_response(),
            Self::CsrfFailed(_) => (status, Html(pages::CSRF_FAILURE)).into_response(),
            Self::ExternalService(_) | Self::Internal(_) => {
                (status, Html(pages::SERVER_ERROR)).into_response()
            }
            other => {
                let body = Json(json!({
                    "error": {
                        "code": code,
                        "message": other.to_string(),
                    }
                }));
                (status, body).into_response()
            }
        }
    }
}

/// RepoError
///
/// Failures raised by a `Repository` implementation.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::Conflict(db_err.message().to_string());
            }
        }
        Self::Database(err)
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let errors = err.field_errors();
        let mut fields: Vec<&str> = errors.keys().map(|field| field.as_ref()).collect();
        fields.sort_unstable();
        Self::Validation(format!("invalid fields: {}", fields.join(", ")))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedContentType(content_type) => {
                Self::Validation(format!("unsupported content type: {content_type}"))
            }
            other => Self::ExternalService(other.to_string()),
        }
    }
}
