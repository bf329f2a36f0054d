// crates/archmap-core/src/graph/metrics.rs
// ============================================================================
// Module: Archmap Metrics Aggregation
// Description: Call count, mean latency, and error rate over span groups.
// Purpose: Compute order-independent aggregates for nodes and edges.
// Dependencies: crate::core, serde
// ============================================================================

//! ## Overview
//! Aggregation folds a group of spans into three numbers: call count, mean
//! latency, and error rate. Accumulators merge associatively, so aggregating
//! a concatenation of two disjoint groups equals the weighted combination of
//! their separate aggregates, and results are stable under span reordering.
//! Sums are `f64`, exact for group sizes up to 2^53.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::span::Span;

// ============================================================================
// SECTION: Aggregated Metrics
// ============================================================================

/// Aggregated metrics attached to a node or edge.
///
/// # Invariants
/// - `error_rate` is in `[0, 1]`; `avg_latency_ms >= 0`.
/// - `call_count` equals the number of spans contributing to the group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Number of spans in the group.
    pub call_count: u64,
    /// Arithmetic mean latency across the group, in milliseconds.
    pub avg_latency_ms: f64,
    /// Fraction of spans in the group that failed.
    pub error_rate: f64,
}

// ============================================================================
// SECTION: Accumulator
// ============================================================================

/// Order-independent accumulator for span group metrics.
///
/// # Invariants
/// - `merge` is associative and commutative.
/// - `error_count <= count` at all times.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricsAccumulator {
    /// Number of spans observed.
    count: u64,
    /// Sum of observed latencies in milliseconds.
    latency_sum_ms: f64,
    /// Number of failed spans observed.
    error_count: u64,
}

impl MetricsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: 0,
            latency_sum_ms: 0.0,
            error_count: 0,
        }
    }

    /// Folds one span into the accumulator.
    pub fn observe(&mut self, span: &Span) {
        self.count += 1;
        self.latency_sum_ms += span.latency_ms;
        if span.is_error() {
            self.error_count += 1;
        }
    }

    /// Merges another accumulator into this one.
    pub fn merge(&mut self, other: Self) {
        self.count += other.count;
        self.latency_sum_ms += other.latency_sum_ms;
        self.error_count += other.error_count;
    }

    /// Returns the number of spans observed so far.
    #[must_use]
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Finishes the accumulator into aggregated metrics.
    ///
    /// An empty accumulator yields zeroed metrics; emitted groups are
    /// non-empty by construction, so division by zero cannot occur there.
    #[must_use]
    pub fn finish(&self) -> Metrics {
        if self.count == 0 {
            return Metrics::default();
        }
        // u64 -> f64 is exact for counts below 2^53.
        #[allow(clippy::cast_precision_loss, reason = "group sizes are bounded by 2^53")]
        let count = self.count as f64;
        #[allow(clippy::cast_precision_loss, reason = "group sizes are bounded by 2^53")]
        let errors = self.error_count as f64;
        Metrics {
            call_count: self.count,
            avg_latency_ms: self.latency_sum_ms / count,
            error_rate: errors / count,
        }
    }
}
