// crates/archmap-core/src/reason/mod.rs
// ============================================================================
// Module: Archmap Reasoning Pipeline
// Description: Deterministic state graph from detection to workflows.
// Purpose: Orchestrate detect, classify, analyze, select, generate, finalize.
// Dependencies: crate::detect, crate::graph, serde
// ============================================================================

//! ## Overview
//! The reasoning pipeline is a deterministic finite-state traversal: each
//! node is a pure function over [`AnalysisState`] and edges are ordinary
//! conditionals. No external calls, no stochastic choices. When detection
//! finds nothing, the pipeline finalizes with an empty workflow list;
//! otherwise the three generators run and their outputs are appended in the
//! fixed order (minimal, performance, cost).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod compare;
pub mod generators;
pub mod state;
pub mod workflow;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use compare::compare_workflows;
pub use generators::generate_cost;
pub use generators::generate_minimal;
pub use generators::generate_performance;
pub use state::AnalysisState;
pub use state::IssueCategory;
pub use state::Strategy;
pub use workflow::ChangeKind;
pub use workflow::ProposedChange;
pub use workflow::Workflow;
pub use workflow::WorkflowComparison;
pub use workflow::WorkflowScore;

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::detect::thresholds::Thresholds;
use crate::graph::model::DependencyGraph;

// ============================================================================
// SECTION: Pipeline
// ============================================================================

/// Runs the full reasoning pipeline over a graph.
///
/// Routing is a pure function of the state: the conditional branch after
/// strategy selection skips the generators when no issues were detected.
#[must_use]
pub fn run_analysis(graph: DependencyGraph, thresholds: Thresholds) -> AnalysisState {
    let state = state::detect(AnalysisState::new(graph, thresholds));
    let state = state::classify(state);
    let state = state::analyze(state);
    let mut state = state::select_strategies(state);

    if state.issues.is_empty() {
        return state::finalize(state);
    }

    // The generators are independent of one another; output order is fixed
    // regardless of how a host schedules them.
    let minimal = generators::generate_minimal(&state);
    let performance = generators::generate_performance(&state);
    let cost = generators::generate_cost(&state);
    state.workflows = vec![minimal, performance, cost];
    state::finalize(state)
}
