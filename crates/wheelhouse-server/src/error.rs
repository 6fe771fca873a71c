//! HTTP error mapping
//!
//! Translates the index error taxonomy into HTTP statuses. Errors are
//! handled per request; nothing here touches server-wide state, and
//! internal details never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use wheelhouse_core::ParseError;
use wheelhouse_index::IndexError;

/// Per-request error, already classified for HTTP
#[derive(Debug, Error)]
pub enum AppError {
    /// Client sent something unparseable (400)
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Distribution, repository, release or artifact unknown (404)
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote origin failed or is unreachable (502)
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Everything else, including build failures (500)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Internal messages are logged, not returned.
        let message = match &self {
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        (status, message).into_response()
    }
}

impl From<IndexError> for AppError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DistributionNotFound { .. }
            | IndexError::RepositoryNotFound { .. }
            | IndexError::ReleaseNotFound { .. } => Self::NotFound(err.to_string()),
            IndexError::Upstream { .. }
            | IndexError::UpstreamStatus { .. }
            | IndexError::AuthFailed { .. }
            | IndexError::MissingToken { .. } => Self::Upstream(err.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
