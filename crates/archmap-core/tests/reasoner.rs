// crates/archmap-core/tests/reasoner.rs
// ============================================================================
// Module: Reasoning Pipeline Tests
// Description: State-graph routing, workflow ordering, and comparison.
// Purpose: Validate the detect-to-workflows traversal end to end.
// ============================================================================

//! ## Overview
//! Unit tests for the reasoning pipeline:
//! - No issues routes straight to finalize with zero workflows
//! - Non-empty issues yield exactly (minimal, performance, cost)
//! - Scores respect the mandated ranges per workflow type
//! - Strategy selection follows the issue kinds present
//! - Comparison recommends minimum complexity + risk, ties prefer minimal

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use archmap_core::IssueCategory;
use archmap_core::Span;
use archmap_core::Strategy;
use archmap_core::Thresholds;
use archmap_core::build_graph;
use archmap_core::compare_workflows;
use archmap_core::run_analysis;

mod common;

use common::call_span;
use common::with_status;

// ============================================================================
// SECTION: Routing
// ============================================================================

#[test]
fn healthy_graph_finalizes_with_no_workflows() {
    let spans = [call_span("s1", "api", "billing", 100.0)];
    let state = run_analysis(build_graph(&spans, &[]), Thresholds::default());
    assert!(state.analysis_complete);
    assert!(state.issues.is_empty());
    assert!(state.workflows.is_empty());
    assert!(state.strategy_selection.is_empty());
}

#[test]
fn empty_graph_finalizes_with_no_workflows() {
    let state = run_analysis(build_graph(&[], &[]), Thresholds::default());
    assert!(state.analysis_complete);
    assert!(state.workflows.is_empty());
}

#[test]
fn workflows_are_generated_in_fixed_order() {
    let spans = [call_span("s1", "api", "postgres://users", 2_000.0)];
    let state = run_analysis(build_graph(&spans, &[]), Thresholds::default());
    let ids: Vec<&str> = state.workflows.iter().map(|workflow| workflow.id.as_str()).collect();
    assert_eq!(ids, vec!["workflow-minimal", "workflow-performance", "workflow-cost"]);
}

// ============================================================================
// SECTION: Classification and Strategy Selection
// ============================================================================

#[test]
fn issues_are_bucketed_by_category() {
    // Latency (performance) and error rate (reliability) findings together.
    let spans = [
        with_status(call_span("s1", "api", "billing", 1_500.0), 500),
        with_status(call_span("s2", "api", "billing", 1_500.0), 500),
    ];
    let state = run_analysis(build_graph(&spans, &[]), Thresholds::default());
    assert!(state.issue_categories.contains_key(&IssueCategory::Performance));
    assert!(state.issue_categories.contains_key(&IssueCategory::Reliability));
}

#[test]
fn caching_is_selected_only_for_database_targets() {
    let database = [call_span("s1", "api", "postgres://users", 2_000.0)];
    let state = run_analysis(build_graph(&database, &[]), Thresholds::default());
    assert!(state.strategy_selection.contains(&Strategy::Caching));

    let service = [call_span("s1", "api", "billing", 2_000.0)];
    let state = run_analysis(build_graph(&service, &[]), Thresholds::default());
    assert!(!state.strategy_selection.contains(&Strategy::Caching));
}

#[test]
fn circuit_breaker_is_selected_for_error_rate_issues() {
    let spans = [
        with_status(call_span("s1", "api", "billing", 10.0), 503),
        call_span("s2", "api", "billing", 10.0),
    ];
    let state = run_analysis(build_graph(&spans, &[]), Thresholds::default());
    assert!(state.strategy_selection.contains(&Strategy::CircuitBreaker));
}

#[test]
fn analyze_restricts_centrality_to_affected_nodes() {
    let spans = [
        call_span("s1", "api", "postgres://users", 2_000.0),
        call_span("s2", "web", "api", 100.0),
    ];
    let state = run_analysis(build_graph(&spans, &[]), Thresholds::default());
    for name in state.measures.centrality.keys() {
        assert!(
            state
                .issues
                .iter()
                .any(|issue| issue.affected_nodes.contains(name)),
            "{name} is not an affected node"
        );
    }
}

// ============================================================================
// SECTION: Score Ranges
// ============================================================================

/// Builds a graph that trips latency, error-rate, fan-out, and depth rules.
fn busy_spans() -> Vec<Span> {
    let mut spans = Vec::new();
    spans.push(call_span("lat", "api", "postgres://users", 2_000.0));
    spans.push(with_status(call_span("err1", "checkout", "api", 10.0), 500));
    spans.push(with_status(call_span("err2", "checkout", "api", 10.0), 500));
    for index in 0..12 {
        spans.push(call_span(&format!("fan{index}"), "gateway", &format!("b{index}"), 50.0));
    }
    let pairs = [("c1", "c2"), ("c2", "c3"), ("c3", "c4"), ("c4", "c5"), ("c5", "c6"), ("c6", "c7")];
    for (index, (source, target)) in pairs.iter().enumerate() {
        spans.push(call_span(&format!("chain{index}"), source, target, 100.0));
    }
    spans
}

#[test]
fn workflow_scores_respect_mandated_ranges() {
    let state = run_analysis(build_graph(&busy_spans(), &[]), Thresholds::default());
    assert_eq!(state.workflows.len(), 3);

    let minimal = &state.workflows[0];
    assert!(minimal.complexity_score >= 1 && minimal.complexity_score <= 3);
    assert!(minimal.risk_score >= 1 && minimal.risk_score <= 2);
    assert!(minimal.proposed_changes.len() <= 3);

    let performance = &state.workflows[1];
    assert!(performance.complexity_score >= 5 && performance.complexity_score <= 8);
    assert!(performance.risk_score >= 3 && performance.risk_score <= 6);

    let cost = &state.workflows[2];
    assert!(cost.complexity_score >= 3 && cost.complexity_score <= 6);
    assert!(cost.risk_score >= 2 && cost.risk_score <= 4);
    assert_eq!(cost.expected_impact["infrastructure_cost"], "-15% to -25%");
}

#[test]
fn generators_emit_non_empty_changes_for_any_issue_mix() {
    // Reliability-only findings still produce three actionable workflows.
    let spans = [
        with_status(call_span("s1", "api", "billing", 10.0), 500),
        with_status(call_span("s2", "api", "billing", 10.0), 500),
    ];
    let state = run_analysis(build_graph(&spans, &[]), Thresholds::default());
    for workflow in &state.workflows {
        assert!(!workflow.proposed_changes.is_empty(), "{} is empty", workflow.id);
    }
}

// ============================================================================
// SECTION: Comparison
// ============================================================================

#[test]
fn comparison_recommends_minimal_on_ties() {
    let state = run_analysis(build_graph(&busy_spans(), &[]), Thresholds::default());
    let comparison = compare_workflows(&state.workflows, &state.issues);
    assert_eq!(comparison.matrix.len(), 3);
    // The minimal workflow has the lowest complexity + risk by construction.
    assert_eq!(comparison.recommendation.as_deref(), Some("workflow-minimal"));
}

#[test]
fn comparison_of_no_workflows_has_no_recommendation() {
    let comparison = compare_workflows(&[], &[]);
    assert!(comparison.matrix.is_empty());
    assert!(comparison.recommendation.is_none());
}

#[test]
fn comparison_counts_changes_per_workflow() {
    let state = run_analysis(build_graph(&busy_spans(), &[]), Thresholds::default());
    let comparison = compare_workflows(&state.workflows, &state.issues);
    for (row, workflow) in comparison.matrix.iter().zip(&state.workflows) {
        assert_eq!(row.change_count, workflow.proposed_changes.len());
        assert_eq!(row.complexity, workflow.complexity_score);
        assert_eq!(row.risk, workflow.risk_score);
    }
}
