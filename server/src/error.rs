//! Error types for the loglens server.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for the server.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur in the loglens server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Log store access error.
    #[error("store error: {0}")]
    Store(#[from] errors::StoreError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid request parameter.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Server startup error.
    #[error("server error: {0}")]
    Server(String),
}

/// Error response body for HTTP endpoints.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            Self::Store(e) => {
                tracing::error!(error = %e, "store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A log store error occurred".to_string(),
                )
            }
            Self::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIGURATION_ERROR",
                msg.clone(),
            ),
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone()),
            Self::Server(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR", msg.clone()),
        };

        let body = ErrorResponse {
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_request_display() {
        let err = ServerError::InvalidRequest("unknown level: CRITICAL".to_string());
        assert_eq!(err.to_string(), "invalid request: unknown level: CRITICAL");
    }

    #[test]
    fn error_response_serialization() {
        let resp = ErrorResponse {
            error: "test error".to_string(),
            code: "TEST_ERROR".to_string(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test error"));
        assert!(json.contains("TEST_ERROR"));
    }
}
