// crates/archmap-core/src/detect/issue.rs
// ============================================================================
// Module: Archmap Issue Records
// Description: Evidence-backed findings emitted by detection rules.
// Purpose: Represent rule outcomes with stable identifiers and severities.
// Dependencies: crate::core::hashing, serde, serde_json
// ============================================================================

//! ## Overview
//! An issue is a rule-fired finding: a kind, a severity, the affected nodes,
//! the triggering metric value, and an evidence map carrying at least the
//! threshold and the actual value. Issue identifiers are derived from the
//! rule kind and the sorted affected-node list, so repeated analyses over
//! identical graphs produce identical identifiers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::hashing::HashError;
use crate::core::hashing::stable_id;

// ============================================================================
// SECTION: Severity
// ============================================================================

/// Issue severity scale.
///
/// # Invariants
/// - Ordering is ascending: `Low < Medium < High < Critical`.
/// - Variants are stable for serialization and contract matching.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// Informational finding.
    Low,
    /// Finding worth scheduling.
    Medium,
    /// Finding needing prompt attention.
    High,
    /// Finding threatening availability or correctness.
    Critical,
}

impl IssueSeverity {
    /// Returns a stable label for the severity.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

// ============================================================================
// SECTION: Issue Kind
// ============================================================================

/// Detection rule that produced an issue.
///
/// # Invariants
/// - Variants are stable for serialization and identifier derivation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// An edge whose mean latency exceeds the ceiling.
    HighLatencyEdge,
    /// A node heading a synchronous call chain deeper than the ceiling.
    DeepCallChain,
    /// A node whose error rate exceeds the ceiling.
    HighErrorRate,
    /// A node fanning out to more successors than the ceiling.
    FanOutOverload,
    /// A node with more dependents than the ceiling.
    SinglePointOfFailure,
}

impl IssueKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighLatencyEdge => "high_latency_edge",
            Self::DeepCallChain => "deep_call_chain",
            Self::HighErrorRate => "high_error_rate",
            Self::FanOutOverload => "fan_out_overload",
            Self::SinglePointOfFailure => "single_point_of_failure",
        }
    }
}

// ============================================================================
// SECTION: Issue Record
// ============================================================================

/// Rule-fired finding with evidence and severity.
///
/// # Invariants
/// - `id` is a pure function of `(kind, sorted affected_nodes)`.
/// - `evidence` carries at least `threshold` and `actual`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable issue identifier.
    pub id: String,
    /// Rule that fired.
    pub kind: IssueKind,
    /// Severity assigned by the rule.
    pub severity: IssueSeverity,
    /// Human-readable description of the finding.
    pub description: String,
    /// Identities of the affected nodes.
    pub affected_nodes: Vec<String>,
    /// The triggering metric value.
    pub metric_value: f64,
    /// Evidence map with threshold, actual value, and rule-specific context.
    pub evidence: BTreeMap<String, Value>,
}

/// Identity document hashed into an issue identifier.
#[derive(Serialize)]
struct IssueIdentity<'a> {
    /// Rule label.
    rule: &'a str,
    /// Sorted affected-node identities.
    affected: Vec<&'a str>,
}

/// Derives the stable identifier for an issue.
///
/// # Errors
///
/// Returns [`HashError`] when the identity document cannot be canonicalized.
pub fn issue_id(kind: IssueKind, affected_nodes: &[String]) -> Result<String, HashError> {
    let mut affected: Vec<&str> = affected_nodes.iter().map(String::as_str).collect();
    affected.sort_unstable();
    stable_id(&IssueIdentity {
        rule: kind.as_str(),
        affected,
    })
}
