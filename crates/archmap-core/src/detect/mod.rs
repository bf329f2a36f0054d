// crates/archmap-core/src/detect/mod.rs
// ============================================================================
// Module: Archmap Issue Detection
// Description: Rule engine over the reconstructed dependency graph.
// Purpose: Turn graph structure and metrics into evidence-backed issues.
// Dependencies: crate::core, crate::graph, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Detection evaluates five independent rules against the dependency graph:
//! high-latency edges, deep synchronous chains, high error-rate nodes,
//! fan-out overload, and single points of failure. Rules are deterministic
//! and share no mutable state; issue identifiers are stable across repeated
//! runs on the same graph.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod issue;
pub mod rules;
pub mod thresholds;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use issue::Issue;
pub use issue::IssueKind;
pub use issue::IssueSeverity;
pub use issue::issue_id;
pub use rules::RuleError;
pub use rules::detect_issues;
pub use thresholds::Thresholds;
