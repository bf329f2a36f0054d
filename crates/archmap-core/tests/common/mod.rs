// crates/archmap-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared span builders for archmap-core tests.
// Purpose: Provide reusable span construction helpers.
// Dependencies: archmap-core
// ============================================================================

//! ## Overview
//! Provides shared span builders used across the core test suite.

#![allow(
    dead_code,
    clippy::cast_possible_truncation,
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only helpers; not every test file uses every builder."
)]

use archmap_core::Span;
use archmap_core::SpanId;
use archmap_core::SpanKind;
use archmap_core::Timestamp;
use archmap_core::TraceId;

// ============================================================================
// SECTION: Span Builders
// ============================================================================

/// Creates a successful client span from `service` to `downstream`.
pub fn call_span(span_id: &str, service: &str, downstream: &str, latency_ms: f64) -> Span {
    Span {
        trace_id: TraceId::new("trace-1"),
        span_id: SpanId::new(span_id),
        parent_span_id: None,
        service_name: service.to_string(),
        operation: format!("GET /{downstream}"),
        kind: SpanKind::Client,
        start_time: Timestamp::from_unix_millis(1_700_000_000_000),
        end_time: Timestamp::from_unix_millis(1_700_000_000_000 + latency_ms as i64),
        latency_ms,
        status_code: Some(200),
        error: None,
        downstream: Some(downstream.to_string()),
    }
}

/// Creates a server span with no downstream target.
pub fn local_span(span_id: &str, service: &str, latency_ms: f64) -> Span {
    Span {
        trace_id: TraceId::new("trace-1"),
        span_id: SpanId::new(span_id),
        parent_span_id: None,
        service_name: service.to_string(),
        operation: "GET /".to_string(),
        kind: SpanKind::Server,
        start_time: Timestamp::from_unix_millis(1_700_000_000_000),
        end_time: Timestamp::from_unix_millis(1_700_000_000_000 + latency_ms as i64),
        latency_ms,
        status_code: Some(200),
        error: None,
        downstream: None,
    }
}

/// Marks a span as failed with the given status code.
pub fn with_status(mut span: Span, status: u16) -> Span {
    span.status_code = Some(status);
    span
}

/// Marks a span as failed with an error string.
pub fn with_error(mut span: Span, error: &str) -> Span {
    span.error = Some(error.to_string());
    span
}
