//! Mapping of domain errors onto HTTP responses.

use crate::clickup::ClientError;
use crate::report::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    MissingToken,

    #[error("Invalid API token: {0}")]
    LoginFailed(String),

    #[error(transparent)]
    Upstream(#[from] ClientError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("report store task failed: {0}")]
    Blocking(#[from] tokio::task::JoinError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken | ApiError::LoginFailed(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(e) if e.is_auth_failure() => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(ClientError::Build(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::InvalidName(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::Io { .. }) | ApiError::Blocking(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = %status, "Request failed: {}", self);
        } else {
            warn!(status = %status, "Request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
