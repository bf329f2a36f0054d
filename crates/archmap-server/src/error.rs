// crates/archmap-server/src/error.rs
// ============================================================================
// Module: Archmap API Errors
// Description: Error taxonomy and HTTP response mapping.
// Purpose: Surface stable detail strings with precise status codes.
// Dependencies: archmap-core, axum, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Every failure the HTTP surface can produce is one of these variants, and
//! each variant maps to exactly one status code. Wrapping preserves the
//! original error kind so the mapping never degrades to a blanket 500.
//! Internal errors are logged with tenant and operation context and surface
//! an opaque detail only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use archmap_core::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde_json::json;
use thiserror::Error;

// ============================================================================
// SECTION: Error Taxonomy
// ============================================================================

/// API errors with a one-to-one HTTP status mapping.
///
/// # Invariants
/// - Variants are stable; `detail` strings do not embed raw payloads.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed input or violated constraint.
    #[error("{0}")]
    Validation(String),
    /// Missing or invalid credential.
    #[error("missing or invalid credential")]
    Unauthorized,
    /// Unknown resource.
    #[error("not found")]
    NotFound,
    /// Tenant ingest queue is saturated; retryable.
    #[error("ingest queue saturated, retry later")]
    QueueSaturated,
    /// Tenant read budget exhausted; retryable.
    #[error("tenant rate limit exceeded, retry later")]
    RateLimited,
    /// Backing store unavailable; retryable after backoff.
    #[error("span store unavailable")]
    StoreUnavailable(String),
    /// Caller deadline exceeded; no partial results.
    #[error("deadline exceeded")]
    DeadlineExceeded,
    /// Invariant violation; details are logged, not surfaced.
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status for the error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::QueueSaturated | Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unavailable(message) => Self::StoreUnavailable(message),
            StoreError::Rejected(message) => Self::Validation(message),
            StoreError::Corrupt(message) | StoreError::Internal(message) => {
                Self::Internal(message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            // Internal context goes to the log, not the caller.
            Self::Internal(context) => {
                tracing::error!(context = %context, "internal error");
                "internal error".to_string()
            }
            Self::StoreUnavailable(context) => {
                tracing::warn!(context = %context, "span store unavailable");
                "span store unavailable".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
