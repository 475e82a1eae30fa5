//! HTTP error handling and response types.

use crate::error::SessionError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Session-level error
    Session(SessionError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Session(err) => {
                let message = err.to_string();
                match err {
                    // A notice, not a failure: nothing was selected yet.
                    SessionError::EmptySelection => (
                        StatusCode::CONFLICT,
                        ApiError::new("EMPTY_SELECTION", message),
                    ),
                    SessionError::UnknownDimension(_) => (
                        StatusCode::BAD_REQUEST,
                        ApiError::new("UNKNOWN_DIMENSION", message),
                    ),
                    SessionError::MalformedSnapshot { .. } => (
                        StatusCode::BAD_REQUEST,
                        ApiError::new("MALFORMED_SNAPSHOT", message),
                    ),
                    SessionError::MissingProximityData { .. } => (
                        StatusCode::UNPROCESSABLE_ENTITY,
                        ApiError::new("MISSING_PROXIMITY_DATA", message),
                    ),
                }
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
