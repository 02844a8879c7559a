use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use store::StoreError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Message returned whenever an identifier does not resolve to a record.
pub const MATERIAL_NOT_FOUND: &str = "Material not found";

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),

    /// Failures that escaped a handler's own error mapping, such as a body
    /// that could not be decoded or a panic.
    #[error("{0}")]
    Uncaught(String),

    #[error("Cannot {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Request timed out")]
    RequestTimeout,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

impl ServerError {
    pub fn material_not_found() -> Self {
        ServerError::NotFound(MATERIAL_NOT_FOUND.to_string())
    }

    /// Map a store failure from a read or delete path.
    pub fn read(err: StoreError) -> Self {
        ServerError::Internal(err.to_string())
    }

    /// Map a store failure from a create or update path.
    pub fn write(err: StoreError) -> Self {
        ServerError::BadRequest(err.to_string())
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::NotFound(_) | ServerError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ServerError::Internal(_) | ServerError::Uncaught(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Uncaught(err.to_string())
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::Uncaught(err.to_string())
    }
}
