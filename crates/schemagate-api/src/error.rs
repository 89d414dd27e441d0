//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps ingestion and validation errors from schemagate-registry to HTTP
//! status codes. Returns JSON error bodies with error code, message, and,
//! for schemas that fail to compile, the compiler's diagnostic.
//! Never exposes internal error details in responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use schemagate_registry::{IngestError, ValidateError};
use schemagate_schema::CompileError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "INVALID_SCHEMA").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Compiler diagnostic, present only for `INVALID_SCHEMA`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// No schema by that name (404).
    #[error("schema not found: {0}")]
    NotFound(String),

    /// Request body or parameters could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A schema did not compile (400).
    #[error(transparent)]
    InvalidSchema(CompileError),

    /// Uploads are disabled (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Upload exceeds the configured limit (413).
    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::InvalidSchema(_) => (StatusCode::BAD_REQUEST, "INVALID_SCHEMA"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let details = match &self {
            Self::InvalidSchema(e) => serde_json::to_value(e).ok(),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::NameRejected(e) => Self::BadRequest(e.to_string()),
            e @ IngestError::TooLarge { .. } => Self::PayloadTooLarge(e.to_string()),
            e @ IngestError::MalformedJson(_) => Self::BadRequest(e.to_string()),
            IngestError::Compile(e) => Self::InvalidSchema(e),
            e @ (IngestError::Persist { .. } | IngestError::Superseded(_)) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<ValidateError> for AppError {
    fn from(err: ValidateError) -> Self {
        match err {
            ValidateError::NotFound(name) => Self::NotFound(name),
            e @ (ValidateError::BadDocument(_) | ValidateError::MalformedSchema(_)) => {
                Self::BadRequest(e.to_string())
            }
            ValidateError::BadSchema(e) => Self::InvalidSchema(e),
        }
    }
}
