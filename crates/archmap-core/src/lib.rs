// crates/archmap-core/src/lib.rs
// ============================================================================
// Module: Archmap Core
// Description: Data model, graph reconstruction, detection, and reasoning.
// Purpose: Provide the deterministic analysis pipeline behind the read surface.
// Dependencies: serde, serde_jcs, serde_json, sha2, thiserror, time, tracing, url
// ============================================================================

//! ## Overview
//! `archmap-core` holds everything between a tenant's span snapshot and the
//! documents the read surface serves: the span data model, the dependency
//! graph builder with aggregated metrics, the rule-based issue detector, and
//! the deterministic reasoning pipeline that synthesizes remediation
//! workflows. All computation is pure over immutable snapshots; persistence
//! is reached only through the [`SpanStore`] interface.
//!
//! Invariants:
//! - For a fixed span multiset and threshold set, node/edge sets, aggregated
//!   metrics, issue identifiers, and workflows are identical across runs.
//! - An analysis for one tenant never touches another tenant's data.
//! - Empty detection output yields an empty workflow list.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod detect;
pub mod graph;
pub mod interfaces;
pub mod reason;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use crate::core::hashing;
pub use crate::core::hashing::HashError;
pub use crate::core::identifiers::SpanId;
pub use crate::core::identifiers::TenantId;
pub use crate::core::identifiers::TraceId;
pub use crate::core::span::DiscoveryRecord;
pub use crate::core::span::Span;
pub use crate::core::span::SpanKind;
pub use crate::core::span::SpanValidationError;
pub use crate::core::time::Timestamp;
pub use crate::detect::Issue;
pub use crate::detect::IssueKind;
pub use crate::detect::IssueSeverity;
pub use crate::detect::Thresholds;
pub use crate::detect::detect_issues;
pub use crate::graph::DependencyGraph;
pub use crate::graph::Edge;
pub use crate::graph::GraphMeasures;
pub use crate::graph::Metrics;
pub use crate::graph::MetricsAccumulator;
pub use crate::graph::Node;
pub use crate::graph::NodeKind;
pub use crate::graph::analyze_graph;
pub use crate::graph::build_graph;
pub use crate::graph::classify_identity;
pub use crate::interfaces::BatchOutcome;
pub use crate::interfaces::BatchRejection;
pub use crate::interfaces::PutOutcome;
pub use crate::interfaces::SpanFilter;
pub use crate::interfaces::SpanStore;
pub use crate::interfaces::StoreError;
pub use crate::reason::AnalysisState;
pub use crate::reason::ChangeKind;
pub use crate::reason::IssueCategory;
pub use crate::reason::ProposedChange;
pub use crate::reason::Strategy;
pub use crate::reason::Workflow;
pub use crate::reason::WorkflowComparison;
pub use crate::reason::WorkflowScore;
pub use crate::reason::compare_workflows;
pub use crate::reason::run_analysis;
