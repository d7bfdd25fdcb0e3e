//! Error types for setu-ca HTTP handlers
//!
//! Every error is request-scoped and rendered as
//! `{"error": {"code": ..., "message": ...}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::analysis::{AnalysisError, FieldErrors};
use crate::storage::StorageError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Form input failed validation (422), with per-field messages
    #[error("Validation failed")]
    Validation(FieldErrors),

    /// Malformed request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or unknown bearer token (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found, or not owned by the caller (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Document store failure (503); the client may retry
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// setu-common error
    #[error("Common error: {0}")]
    Common(#[from] setu_common::Error),
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Validation(fields) => ApiError::Validation(fields),
            AnalysisError::NotFound => ApiError::NotFound("Contract analysis not found".to_string()),
            AnalysisError::Storage(StorageError::NotFound(_)) => {
                ApiError::NotFound("Contract document not found".to_string())
            }
            AnalysisError::Storage(e) => ApiError::Storage(e),
            AnalysisError::Common(e) => ApiError::Common(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, fields) = match self {
            ApiError::Validation(fields) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_FAILED",
                "Please correct the errors below.".to_string(),
                Some(fields),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
                None,
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::Storage(ref err) => {
                warn!(error = %err, "Document storage failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "STORAGE_ERROR",
                    "Could not store or read the document. Please try again.".to_string(),
                    None,
                )
            }
            ApiError::Common(ref err) => {
                error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMMON_ERROR",
                    err.to_string(),
                    None,
                )
            }
        };

        let body = match fields {
            Some(fields) => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                    "fields": fields,
                }
            }),
            None => json!({
                "error": {
                    "code": error_code,
                    "message": message,
                }
            }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
