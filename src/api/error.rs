//! API error handling for consistent JSON error responses.

use crate::stream::{ControlChannelError, StreamStartError, StreamStopError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// API error type that converts to JSON responses.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": true,
            "kind": self.kind,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{err:#}"))
    }
}

impl From<StreamStartError> for ApiError {
    fn from(err: StreamStartError) -> Self {
        let status = match err {
            StreamStartError::AlreadyRunning => StatusCode::CONFLICT,
            StreamStartError::EmptyStreamKey => StatusCode::BAD_REQUEST,
            StreamStartError::EncoderNotFound { .. }
            | StreamStartError::Spawn(_)
            | StreamStartError::MissingStdin => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

impl From<StreamStopError> for ApiError {
    fn from(err: StreamStopError) -> Self {
        let status = match err {
            StreamStopError::NotRunning => StatusCode::CONFLICT,
            StreamStopError::Terminate(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

impl From<ControlChannelError> for ApiError {
    fn from(err: ControlChannelError) -> Self {
        let status = match err {
            ControlChannelError::Closed | ControlChannelError::NoMixer => StatusCode::CONFLICT,
            ControlChannelError::InvalidWeight(_) => StatusCode::BAD_REQUEST,
            ControlChannelError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.kind(), err.to_string())
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
