// crates/archmap-core/src/interfaces/mod.rs
// ============================================================================
// Module: Archmap Interfaces
// Description: Backend-agnostic interface for span persistence.
// Purpose: Define the storage contract the analysis pipeline consumes.
// Dependencies: crate::core, serde, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how Archmap integrates with storage backends without
//! embedding backend-specific details. Implementations must be idempotent on
//! `span_id`, serialize concurrent writes at per-span granularity, and never
//! return data for a tenant other than the one named in the call.
//!
//! Security posture: stored spans are untrusted on load; implementations
//! fail closed on corrupt rows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::TenantId;
use crate::core::identifiers::TraceId;
use crate::core::span::DiscoveryRecord;
use crate::core::span::Span;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Span store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling; the read surface maps
///   them onto HTTP statuses without inspecting messages.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store is unreachable or not ready.
    #[error("span store unavailable: {0}")]
    Unavailable(String),
    /// The store rejected a specific span.
    #[error("span rejected: {0}")]
    Rejected(String),
    /// Stored data is corrupt or fails integrity checks.
    #[error("span store corruption: {0}")]
    Corrupt(String),
    /// The store reported an internal error.
    #[error("span store error: {0}")]
    Internal(String),
}

// ============================================================================
// SECTION: Write Outcomes
// ============================================================================

/// Outcome of a single span insertion.
///
/// # Invariants
/// - `Duplicate` is a success: the original row is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PutOutcome {
    /// The span was written.
    Inserted,
    /// A span with the same identifier already exists; nothing was written.
    Duplicate,
}

/// Per-item rejection inside a batch insertion.
///
/// # Invariants
/// - `index` refers to the caller's batch ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRejection {
    /// Position of the rejected span in the submitted batch.
    pub index: usize,
    /// Stable rejection reason.
    pub reason: String,
}

/// Outcome of a batch insertion with per-span accept/reject granularity.
///
/// # Invariants
/// - `accepted + rejected.len()` equals the submitted batch length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Number of spans accepted (including idempotent duplicates).
    pub accepted: u64,
    /// Rejected spans with their positions and reasons.
    pub rejected: Vec<BatchRejection>,
}

// ============================================================================
// SECTION: Query Filter
// ============================================================================

/// Predicates applied to a span query.
///
/// # Invariants
/// - All predicates combine conjunctively; `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanFilter {
    /// Inclusive lower bound on `start_time`.
    pub start_after: Option<Timestamp>,
    /// Inclusive upper bound on `start_time`.
    pub start_before: Option<Timestamp>,
    /// Restrict to spans originating at this service.
    pub service_name: Option<String>,
    /// Restrict to spans of this trace.
    pub trace_id: Option<TraceId>,
    /// Restrict to spans with this exact downstream identity.
    pub downstream: Option<String>,
    /// When true, only spans carrying a downstream identity match.
    pub has_downstream: bool,
}

// ============================================================================
// SECTION: Span Store
// ============================================================================

/// Durable, tenant-partitioned span store.
pub trait SpanStore: Send + Sync {
    /// Inserts one span, idempotently on `span_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails; a duplicate identifier is
    /// not an error.
    fn put(&self, tenant_id: &TenantId, span: &Span) -> Result<PutOutcome, StoreError>;

    /// Inserts a batch of spans with per-span accept/reject granularity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] only when the store as a whole is unusable;
    /// individual span failures land in the outcome's rejection list.
    fn put_batch(&self, tenant_id: &TenantId, spans: &[Span])
    -> Result<BatchOutcome, StoreError>;

    /// Queries spans matching the filter, scoped to one tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn query(&self, tenant_id: &TenantId, filter: &SpanFilter) -> Result<Vec<Span>, StoreError>;

    /// Counts stored spans for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn span_count(&self, tenant_id: &TenantId) -> Result<u64, StoreError>;

    /// Upserts a service self-description record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn register_discovery(
        &self,
        tenant_id: &TenantId,
        record: &DiscoveryRecord,
    ) -> Result<(), StoreError>;

    /// Lists discovery records for a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the read fails.
    fn discovery(&self, tenant_id: &TenantId) -> Result<Vec<DiscoveryRecord>, StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
