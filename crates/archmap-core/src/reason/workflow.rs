// crates/archmap-core/src/reason/workflow.rs
// ============================================================================
// Module: Archmap Workflow Records
// Description: Remediation workflows with scored tradeoffs.
// Purpose: Represent generator output for the read surface and comparison.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A workflow is a proposed remediation bundle: a list of concrete changes,
//! argued pros and cons, complexity and risk scores on a 1-10 scale, and a
//! labeled map of expected impact deltas. Workflows are derived records,
//! recomputed per analysis and never stored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Change Kinds
// ============================================================================

/// Kind of an individual proposed change.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// Put a cache in front of a hot dependency.
    Caching,
    /// Move part of a synchronous chain behind a queue.
    AsyncDecoupling,
    /// Wrap a failing dependency in a circuit breaker.
    CircuitBreaker,
    /// Add redundancy behind a single point of failure.
    Redundancy,
    /// Collapse chatty call patterns behind a facade.
    Consolidation,
    /// Coalesce repeated calls into batched requests.
    Batching,
    /// Right-size capacity to observed load.
    Rightsizing,
}

impl ChangeKind {
    /// Returns a stable label for the change kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Caching => "caching",
            Self::AsyncDecoupling => "async_decoupling",
            Self::CircuitBreaker => "circuit_breaker",
            Self::Redundancy => "redundancy",
            Self::Consolidation => "consolidation",
            Self::Batching => "batching",
            Self::Rightsizing => "rightsizing",
        }
    }
}

// ============================================================================
// SECTION: Workflow Records
// ============================================================================

/// One concrete change inside a workflow.
///
/// # Invariants
/// - `target` names a node identity from the analyzed graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedChange {
    /// Kind of change, serialized under the `type` key.
    #[serde(rename = "type")]
    pub change: ChangeKind,
    /// Node identity the change applies to.
    pub target: String,
    /// What to do.
    pub description: String,
    /// Expected effect of this single change.
    pub impact: String,
}

/// Proposed remediation bundle with scored complexity and risk.
///
/// # Invariants
/// - `complexity_score` and `risk_score` are in `[1, 10]`.
/// - The workflow list, when non-empty, is exactly (minimal, performance,
///   cost) in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Stable workflow identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the workflow optimizes for.
    pub description: String,
    /// Ordered change list.
    pub proposed_changes: Vec<ProposedChange>,
    /// Arguments for adopting the workflow.
    pub pros: Vec<String>,
    /// Arguments against adopting the workflow.
    pub cons: Vec<String>,
    /// Implementation complexity on a 1-10 scale.
    pub complexity_score: u8,
    /// Rollout risk on a 1-10 scale.
    pub risk_score: u8,
    /// Labeled expected deltas, e.g. latency or infrastructure cost.
    pub expected_impact: BTreeMap<String, String>,
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// One row of the workflow comparison matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowScore {
    /// Workflow identifier.
    pub id: String,
    /// Workflow display name.
    pub name: String,
    /// Complexity score copied from the workflow.
    pub complexity: u8,
    /// Risk score copied from the workflow.
    pub risk: u8,
    /// Number of proposed changes.
    pub change_count: usize,
}

/// Comparison matrix across generated workflows with a recommendation.
///
/// # Invariants
/// - `recommendation` is `None` exactly when `matrix` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowComparison {
    /// Score rows, one per workflow in generation order.
    pub matrix: Vec<WorkflowScore>,
    /// Identifier of the recommended workflow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}
