use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::config::Environment;
use crate::users::store::StoreError;

/// Error taxonomy for the whole API. Every variant except `Internal` is
/// operational: its message is safe to show to a client as-is.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Operational(String),
    #[error("Something went very wrong")]
    Internal {
        cause: anyhow::Error,
        environment: Environment,
    },
}

impl ApiError {
    pub fn internal(cause: impl Into<anyhow::Error>, environment: Environment) -> Self {
        Self::Internal {
            cause: cause.into(),
            environment,
        }
    }

    /// Reclassify store failures: a unique-index violation on email is a
    /// client mistake, everything else is unexpected.
    pub fn from_store(err: StoreError, environment: Environment) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::Validation(
                "Duplicate field value: this email is already registered. Please use another value!"
                    .into(),
            ),
            StoreError::Other(cause) => Self::internal(cause, environment),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Operational(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // 4xx failures are the client's fault, 5xx are ours.
        let label = if status.is_client_error() { "fail" } else { "error" };
        let message = match &self {
            ApiError::Internal { cause, environment } => {
                error!(error = %format!("{cause:#}"), "unexpected error");
                if environment.is_production() {
                    "Something went very wrong".to_string()
                } else {
                    format!("{cause:#}")
                }
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "status": label, "message": message }))).into_response()
    }
}
