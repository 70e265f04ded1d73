//! Error handling module
//!
//! Defines error types and handling logic used in the project

use crate::services::{PipelineError, Stage};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// CSV export error
    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    /// Upload or query rejected before any analysis ran
    #[error("{0}")]
    InvalidInput(String),

    /// Text generation failed; `context` names the user-facing operation
    #[error("Error generating {context}: {source}")]
    Generation {
        context: &'static str,
        #[source]
        source: PipelineError,
    },

    /// Pipeline exceeded its time budget
    #[error("Request timeout")]
    Timeout,

    /// Request was cancelled before completion
    #[error("Request cancelled")]
    Cancelled,

    /// Payload too large
    #[error("Payload too large")]
    PayloadTooLarge,
}

/// Error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human readable message
    pub detail: String,
    /// Error type
    #[serde(rename = "type")]
    pub error_type: String,
    /// Failing pipeline stage (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
    /// Failing chunk (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<usize>,
}

impl AppError {
    /// Wrap a pipeline failure for a named operation ("summary", "response")
    pub fn generation(context: &'static str, source: PipelineError) -> Self {
        match source {
            PipelineError::Cancelled => AppError::Cancelled,
            source => AppError::Generation { context, source },
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Generation { .. }
            | AppError::Serialization(_)
            | AppError::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) | AppError::PayloadTooLarge => "invalid_request_error",
            AppError::Generation { .. } => "generation_error",
            AppError::Timeout => "timeout_error",
            AppError::Cancelled => "cancelled_error",
            AppError::Serialization(_) | AppError::Csv(_) => "api_error",
        }
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        !matches!(self, AppError::InvalidInput(_) | AppError::PayloadTooLarge)
    }

    /// Convert to the JSON error body
    pub fn to_error_response(&self) -> ErrorResponse {
        let (stage, chunk_id) = match self {
            AppError::Generation {
                source: PipelineError::Generation { stage, chunk_id, .. },
                ..
            } => (Some(*stage), *chunk_id),
            _ => (None, None),
        };

        ErrorResponse {
            detail: self.to_string(),
            error_type: self.error_type().to_string(),
            stage,
            chunk_id,
        }
    }
}

/// Implement IntoResponse trait to allow errors to be returned directly as HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if self.should_log_details() {
            tracing::error!("Application error: {} - Status code: {}", self, status);
        } else {
            tracing::warn!("Client error: {} - Status code: {}", self, status);
        }

        (status, Json(self.to_error_response())).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Error handling helper functions
pub mod helpers {
    use super::*;

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> AppError {
        AppError::InvalidInput(message.into())
    }
}

/// Error context extension trait
pub trait ErrorContext<T> {
    /// Add invalid input error context
    fn invalid_input_context(self, message: &str) -> AppResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn invalid_input_context(self, message: &str) -> AppResult<T> {
        self.map_err(|e| AppError::InvalidInput(format!("{}: {}", message, e)))
    }
}
