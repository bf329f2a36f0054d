// crates/archmap-server/src/telemetry.rs
// ============================================================================
// Module: Server Telemetry
// Description: Observability hooks for HTTP request handling.
// Purpose: Provide metric events and latency observations without hard deps.
// Dependencies: archmap-core
// ============================================================================

//! ## Overview
//! This module exposes a thin metrics interface for request counters and
//! latency observations. It is intentionally dependency-light so downstream
//! deployments can plug in Prometheus or OpenTelemetry without redesign.
//! Telemetry must avoid leaking span payloads and treats labels as untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use archmap_core::TenantId;

// ============================================================================
// SECTION: Metric Labels
// ============================================================================

/// Request operation classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Operation {
    /// Single span ingest.
    IngestSpan,
    /// Batched span ingest.
    IngestBatch,
    /// Discovery record registration.
    RegisterDiscovery,
    /// Current architecture read.
    ArchitectureCurrent,
    /// Issue listing read.
    ArchitectureIssues,
    /// Generated workflows read.
    WorkflowsGenerated,
    /// Workflow comparison read.
    WorkflowsComparison,
    /// Advanced graph measures read.
    GraphAnalysis,
    /// Liveness check.
    Health,
}

impl Operation {
    /// Returns a stable label for the operation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IngestSpan => "ingest_span",
            Self::IngestBatch => "ingest_batch",
            Self::RegisterDiscovery => "register_discovery",
            Self::ArchitectureCurrent => "architecture_current",
            Self::ArchitectureIssues => "architecture_issues",
            Self::WorkflowsGenerated => "workflows_generated",
            Self::WorkflowsComparison => "workflows_comparison",
            Self::GraphAnalysis => "graph_analysis",
            Self::Health => "health",
        }
    }
}

/// Request outcome classification.
///
/// # Invariants
/// - Variants are stable for telemetry labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RequestOutcome {
    /// Successful request.
    Ok,
    /// Failed request.
    Error,
}

impl RequestOutcome {
    /// Returns a stable label for the outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

/// Request metric event payload.
///
/// # Invariants
/// - `tenant` is `None` for unauthenticated requests.
#[derive(Debug, Clone)]
pub struct RequestEvent {
    /// Operation handled.
    pub operation: Operation,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// Tenant bound to the request, when authenticated.
    pub tenant: Option<TenantId>,
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Metrics sink for request counters and latencies.
pub trait ServerMetrics: Send + Sync {
    /// Records a request counter event.
    fn record_request(&self, event: RequestEvent);
    /// Records a latency observation for the request.
    fn record_latency(&self, event: RequestEvent, latency: Duration);
}

/// No-op metrics sink.
///
/// # Invariants
/// - Metrics are intentionally discarded.
pub struct NoopMetrics;

impl ServerMetrics for NoopMetrics {
    fn record_request(&self, _event: RequestEvent) {}

    fn record_latency(&self, _event: RequestEvent, _latency: Duration) {}
}
