//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps domain errors from zkr-ceremony, zkr-proof, and zkr-encode to
//! HTTP status codes with JSON error bodies. Internal error details are
//! never exposed in responses, only logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use zkr_ceremony::CeremonyError;
use zkr_encode::EncodeError;
use zkr_proof::ProofError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Conflict with current resource state (409). Used for contribution
    /// index races — the client should recompute and retry.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// The storage backend answered outside its contract (502).
    #[error("upstream storage error: {0}")]
    Upstream(String),

    /// A storage dependency is unreachable (503). Transient; retry later.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    /// HTTP status code and machine-readable code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::ServiceUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal/upstream details to clients.
        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Upstream(_) => "An upstream storage error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) => tracing::error!(error = %self, "upstream storage error"),
            Self::ServiceUnavailable(_) => tracing::warn!(error = %self, "service unavailable"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<CeremonyError> for AppError {
    fn from(err: CeremonyError) -> Self {
        match &err {
            CeremonyError::StorageUnavailable(_) => Self::ServiceUnavailable(err.to_string()),
            CeremonyError::ArtifactMissing { .. } => Self::NotFound(err.to_string()),
            CeremonyError::IndexConflict { .. } => Self::Conflict(err.to_string()),
            CeremonyError::UploadFailed(_) => Self::Upstream(err.to_string()),
        }
    }
}

impl From<ProofError> for AppError {
    fn from(err: ProofError) -> Self {
        match &err {
            ProofError::ArtifactMissing { .. } => Self::NotFound(err.to_string()),
            ProofError::StorageUnavailable(_) => Self::ServiceUnavailable(err.to_string()),
            ProofError::ProvingFailed(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<EncodeError> for AppError {
    fn from(err: EncodeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<zkr_core::ParseCircuitError> for AppError {
    fn from(err: zkr_core::ParseCircuitError) -> Self {
        Self::Validation(err.to_string())
    }
}
