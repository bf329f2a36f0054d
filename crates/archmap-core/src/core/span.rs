// crates/archmap-core/src/core/span.rs
// ============================================================================
// Module: Archmap Span Model
// Description: Span telemetry records, validation, and discovery records.
// Purpose: Define the single input fact Archmap consumes from instrumentation.
// Dependencies: crate::core::{identifiers, time}, serde, thiserror
// ============================================================================

//! ## Overview
//! A span is the atomic telemetry record: one observed operation with start,
//! end, correlation identifiers, and an optional downstream target. Spans are
//! terminal facts; once accepted they are never mutated. All correlation
//! (parent/child, trace membership) is by explicit identifier, never by
//! arrival order.
//!
//! Security posture: span payloads are untrusted input and must pass
//! [`Span::validate`] before they reach storage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::SpanId;
use crate::core::identifiers::TraceId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Span Kind
// ============================================================================

/// Role of a span within its trace.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    /// Span observed on the serving side of a request.
    Server,
    /// Span observed on the calling side of a downstream request.
    Client,
    /// Span internal to a single service.
    Internal,
}

impl SpanKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
            Self::Internal => "internal",
        }
    }
}

// ============================================================================
// SECTION: Span Record
// ============================================================================

/// Atomic telemetry record emitted by the instrumentation agent.
///
/// # Invariants
/// - `span_id` is unique within a tenant; `(trace_id, span_id)` is the correlation key.
/// - `end_time >= start_time` and `latency_ms >= 0` after validation.
/// - Append-only: a span is never mutated after ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    /// Trace identifier, unique per end-to-end request.
    pub trace_id: TraceId,
    /// Span identifier, globally unique within the tenant.
    pub span_id: SpanId,
    /// Parent span identifier; absent for root spans.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<SpanId>,
    /// Originating service name.
    pub service_name: String,
    /// Operation label, typically method and path.
    pub operation: String,
    /// Span kind.
    pub kind: SpanKind,
    /// Start timestamp (unix-epoch milliseconds).
    pub start_time: Timestamp,
    /// End timestamp (unix-epoch milliseconds).
    pub end_time: Timestamp,
    /// Observed latency in milliseconds, stored explicitly to tolerate clock
    /// skew on the wire.
    pub latency_ms: f64,
    /// Status code reported by the operation, when any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Error description, when the operation failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Identifier of the callee: service name, database URI, or external URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downstream: Option<String>,
}

impl Span {
    /// Validates span field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SpanValidationError`] when a required field is empty, the
    /// time range is inverted, or the latency is negative or non-finite.
    pub fn validate(&self) -> Result<(), SpanValidationError> {
        if self.trace_id.as_str().is_empty() {
            return Err(SpanValidationError::MissingField("trace_id"));
        }
        if self.span_id.as_str().is_empty() {
            return Err(SpanValidationError::MissingField("span_id"));
        }
        if self.service_name.trim().is_empty() {
            return Err(SpanValidationError::MissingField("service_name"));
        }
        if self.operation.trim().is_empty() {
            return Err(SpanValidationError::MissingField("operation"));
        }
        if self.end_time < self.start_time {
            return Err(SpanValidationError::InvertedTimeRange {
                start_ms: self.start_time.as_unix_millis(),
                end_ms: self.end_time.as_unix_millis(),
            });
        }
        if !self.latency_ms.is_finite() || self.latency_ms < 0.0 {
            return Err(SpanValidationError::NegativeLatency(self.latency_ms));
        }
        Ok(())
    }

    /// Returns true when the span represents a failed operation.
    ///
    /// A span is failed when it carries an `error` or a status code of 500 or
    /// above. Client errors in `[400, 500)` do not count.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some() || self.status_code.is_some_and(|code| code >= 500)
    }
}

/// Span validation failures.
///
/// # Invariants
/// - Variants are stable for programmatic handling and wire `detail` strings.
#[derive(Debug, Error, PartialEq)]
pub enum SpanValidationError {
    /// A required field is missing or empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    /// The end timestamp precedes the start timestamp.
    #[error("end_time {end_ms} precedes start_time {start_ms}")]
    InvertedTimeRange {
        /// Start timestamp in unix-epoch milliseconds.
        start_ms: i64,
        /// End timestamp in unix-epoch milliseconds.
        end_ms: i64,
    },
    /// The latency is negative or non-finite.
    #[error("latency_ms must be a non-negative finite number, got {0}")]
    NegativeLatency(f64),
    /// The serialized span exceeds the configured byte cap.
    #[error("span payload of {actual_bytes} bytes exceeds cap of {max_bytes} bytes")]
    Oversized {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

// ============================================================================
// SECTION: Discovery Records
// ============================================================================

/// Service self-description registered by instrumented applications.
///
/// # Invariants
/// - Keyed by `(tenant, service_name)`; registration is an upsert.
/// - Consumption by the graph builder is optional; inference applies otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    /// Service name the record describes.
    pub service_name: String,
    /// Declared node kind label (`service`, `database`, or `external`).
    pub declared_kind: String,
    /// Optional free-form description of the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl DiscoveryRecord {
    /// Validates discovery record constraints.
    ///
    /// # Errors
    ///
    /// Returns [`SpanValidationError::MissingField`] when the service name or
    /// declared kind is empty.
    pub fn validate(&self) -> Result<(), SpanValidationError> {
        if self.service_name.trim().is_empty() {
            return Err(SpanValidationError::MissingField("service_name"));
        }
        if self.declared_kind.trim().is_empty() {
            return Err(SpanValidationError::MissingField("declared_kind"));
        }
        Ok(())
    }
}
