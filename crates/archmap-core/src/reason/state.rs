// crates/archmap-core/src/reason/state.rs
// ============================================================================
// Module: Archmap Analysis State
// Description: State value threaded through the reasoning state graph.
// Purpose: Carry graph, issues, categories, strategies, and workflows.
// Dependencies: crate::detect, crate::graph, crate::reason::workflow, serde
// ============================================================================

//! ## Overview
//! The reasoning pipeline is a deterministic state graph: each node is a pure
//! function taking and returning the [`AnalysisState`] value, and routing is
//! an ordinary conditional on that value. The state accumulates detection
//! output, issue categories, supporting graph measures, the selected
//! strategies, and finally the generated workflows.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::detect::issue::Issue;
use crate::detect::issue::IssueKind;
use crate::detect::rules::detect_issues;
use crate::detect::thresholds::Thresholds;
use crate::graph::analysis::GraphMeasures;
use crate::graph::analysis::analyze_graph;
use crate::graph::model::DependencyGraph;
use crate::graph::model::NodeKind;
use crate::reason::workflow::Workflow;

// ============================================================================
// SECTION: Categories and Strategies
// ============================================================================

/// Issue category buckets used by strategy selection.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Latency and call-chain findings.
    Performance,
    /// Error-rate and single-point-of-failure findings.
    Reliability,
    /// Fan-out and chattiness findings.
    Coupling,
}

impl IssueCategory {
    /// Buckets an issue kind into its category.
    #[must_use]
    pub const fn of(kind: IssueKind) -> Self {
        match kind {
            IssueKind::HighLatencyEdge | IssueKind::DeepCallChain => Self::Performance,
            IssueKind::HighErrorRate | IssueKind::SinglePointOfFailure => Self::Reliability,
            IssueKind::FanOutOverload => Self::Coupling,
        }
    }
}

/// Remediation strategies available to the generators.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Cache in front of hot database dependencies.
    Caching,
    /// Break deep synchronous chains with queues.
    AsyncDecoupling,
    /// Isolate failing dependencies behind circuit breakers.
    CircuitBreaker,
    /// Add redundancy behind heavily depended-on nodes.
    Bulkhead,
    /// Collapse excessive fan-out behind facades.
    Consolidation,
}

// ============================================================================
// SECTION: Analysis State
// ============================================================================

/// State value carried through the reasoning state graph.
///
/// # Invariants
/// - `analysis_complete` is set only by the finalize node.
/// - `workflows`, when non-empty, is (minimal, performance, cost) in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisState {
    /// Graph under analysis.
    pub graph: DependencyGraph,
    /// Thresholds used for detection.
    pub thresholds: Thresholds,
    /// Detected issues, severity-descending.
    pub issues: Vec<Issue>,
    /// Issue identifiers bucketed by category.
    pub issue_categories: BTreeMap<IssueCategory, Vec<String>>,
    /// Supporting graph measures computed by the analyze node.
    pub measures: GraphMeasures,
    /// Strategies selected for the generators.
    pub strategy_selection: BTreeSet<Strategy>,
    /// Generated workflows in fixed order.
    pub workflows: Vec<Workflow>,
    /// Whether the pipeline has finalized.
    pub analysis_complete: bool,
}

impl AnalysisState {
    /// Creates the initial state for a graph and threshold set.
    #[must_use]
    pub fn new(graph: DependencyGraph, thresholds: Thresholds) -> Self {
        Self {
            graph,
            thresholds,
            ..Self::default()
        }
    }
}

// ============================================================================
// SECTION: State Nodes
// ============================================================================

/// `detect` node: runs the rule engine over the graph.
#[must_use]
pub fn detect(mut state: AnalysisState) -> AnalysisState {
    state.issues = detect_issues(&state.graph, &state.thresholds);
    state
}

/// `classify` node: buckets detected issues by category.
#[must_use]
pub fn classify(mut state: AnalysisState) -> AnalysisState {
    let mut categories: BTreeMap<IssueCategory, Vec<String>> = BTreeMap::new();
    for issue in &state.issues {
        categories.entry(IssueCategory::of(issue.kind)).or_default().push(issue.id.clone());
    }
    state.issue_categories = categories;
    state
}

/// `analyze` node: computes supporting graph measures.
#[must_use]
pub fn analyze(mut state: AnalysisState) -> AnalysisState {
    let mut measures = analyze_graph(&state.graph);
    // Centrality is only consulted for nodes appearing in issues; restrict
    // the map so downstream consumers see exactly that slice.
    let affected: BTreeSet<&str> = state
        .issues
        .iter()
        .flat_map(|issue| issue.affected_nodes.iter().map(String::as_str))
        .collect();
    measures.centrality.retain(|name, _| affected.contains(name.as_str()));
    state.measures = measures;
    state
}

/// `select_strategies` node: chooses strategies from the detected issues.
#[must_use]
pub fn select_strategies(mut state: AnalysisState) -> AnalysisState {
    let mut selection = BTreeSet::new();
    for issue in &state.issues {
        match issue.kind {
            IssueKind::HighLatencyEdge => {
                if latency_edge_targets_database(&state.graph, issue) {
                    selection.insert(Strategy::Caching);
                }
            }
            IssueKind::DeepCallChain => {
                selection.insert(Strategy::AsyncDecoupling);
            }
            IssueKind::HighErrorRate => {
                selection.insert(Strategy::CircuitBreaker);
            }
            IssueKind::SinglePointOfFailure => {
                selection.insert(Strategy::Bulkhead);
            }
            IssueKind::FanOutOverload => {
                selection.insert(Strategy::Consolidation);
            }
        }
    }
    state.strategy_selection = selection;
    state
}

/// `finalize` node: marks the analysis complete.
#[must_use]
pub fn finalize(mut state: AnalysisState) -> AnalysisState {
    state.analysis_complete = true;
    state
}

/// Returns true when a high-latency-edge issue targets a database node.
pub(crate) fn latency_edge_targets_database(graph: &DependencyGraph, issue: &Issue) -> bool {
    issue
        .affected_nodes
        .get(1)
        .and_then(|target| graph.nodes.get(target))
        .is_some_and(|node| node.kind == NodeKind::Database)
}
