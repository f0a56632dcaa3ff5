//! HTTP-facing error type.
//!
//! Every workflow operation returns [`AppResult`]. Lower layers (store, file storage, guard) have
//! their own error enums which are folded into [`AppError`] through `From`, so handlers can use `?`
//! all the way down.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{guard::Denied, repository::RepositoryError, storage::StorageError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    /// Resource absent, or present but not owned by the caller on a job mutation path.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate email at registration, duplicate application.
    #[error("{0}")]
    Conflict(String),

    /// Bad role, bad status, missing required field, bad paging parameters.
    #[error("{0}")]
    InvalidInput(String),

    /// No credential, or an invalid one, on a protected operation.
    #[error("{0}")]
    Unauthenticated(String),

    /// Valid credential but wrong role, or not the owner with no admin override.
    #[error("{0}")]
    Forbidden(String),

    /// Database or file storage failure.
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn unauthenticated(msg: impl Into<String>) -> Self {
        Self::Unauthenticated(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Duplicate(what) => AppError::Conflict(format!("Duplicate {what}")),
            RepositoryError::MissingReference(what) => AppError::NotFound(format!("{what} not found")),
            RepositoryError::Database(e) => AppError::Upstream(e.to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<Denied> for AppError {
    fn from(denied: Denied) -> Self {
        match denied {
            Denied::Unauthenticated => AppError::unauthenticated("Not authenticated"),
            Denied::InsufficientRole => AppError::forbidden("Insufficient permissions"),
            Denied::NotOwner => AppError::forbidden("Not authorized to access this resource"),
        }
    }
}

/// Error body, `{"detail": "..."}`.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Upstream causes are logged, never echoed to the client.
        let detail = match &self {
            AppError::Upstream(cause) => {
                tracing::error!(%cause, "upstream failure");
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}
