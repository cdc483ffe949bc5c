//! API error handling.
//!
//! The error bodies are part of the service's wire contract: validation and
//! internal failures render as `{ "error": ... }`, a failure reported by the
//! agent renders as `{ "error", "trace", "text" }` with whatever partial
//! completion had been aggregated.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// API error type with the service's wire-level bodies.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// The agent reported a terminal failure for the turn.
    #[error("{message}")]
    AgentFailure {
        message: String,
        traces: Vec<String>,
        text: String,
    },

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct AgentFailureBody {
    error: String,
    trace: Vec<String>,
    text: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody { error: message })).into_response()
            }
            Self::AgentFailure {
                message,
                traces,
                text,
            } => {
                warn!(message = %message, "agent reported failure");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(AgentFailureBody {
                        error: message,
                        trace: traces,
                        text,
                    }),
                )
                    .into_response()
            }
            Self::Internal(message) => {
                error!(message = %message, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody { error: message }),
                )
                    .into_response()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
