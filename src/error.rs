//! Error taxonomy for the rectification service.
//!
//! Validation and configuration errors are raised before any work starts and
//! never open a stream. Transformation errors come from an external capability
//! failing on a unit of work; once a stream is open they become the single
//! terminal `error` frame instead of crossing the stream boundary.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Operation names used to contextualize transformation failures.
pub const RECTIFICATION: &str = "Rectification";
pub const CONVERSION: &str = "Conversion";

/// All errors surfaced by the processing core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// A required request field is missing or unreadable.
    #[error("{0}")]
    InputValidation(String),

    /// Chunk size, model or service settings are invalid.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The rectification or extraction capability failed.
    #[error("{operation} failed: {message}")]
    Transformation { operation: String, message: String },

    /// A consumer met a frame it could not parse.
    #[error("Malformed frame: {0}")]
    Protocol(String),

    /// The consumer went away before the work finished.
    #[error("{operation} cancelled: client disconnected")]
    Cancelled { operation: String },
}

impl ServiceError {
    /// Wrap a capability failure with the operation it belongs to.
    pub fn transformation(operation: &str, source: impl std::fmt::Display) -> Self {
        Self::Transformation {
            operation: operation.to_string(),
            message: source.to_string(),
        }
    }

    pub fn cancelled(operation: &str) -> Self {
        Self::Cancelled {
            operation: operation.to_string(),
        }
    }

    /// HTTP status used when the error is returned as a structured response.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InputValidation(_) | ServiceError::Configuration(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Protocol(_) => StatusCode::BAD_REQUEST,
            ServiceError::Transformation { .. } => StatusCode::BAD_GATEWAY,
            ServiceError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Body of every non-streaming error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::InputValidation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
