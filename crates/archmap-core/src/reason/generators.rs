// crates/archmap-core/src/reason/generators.rs
// ============================================================================
// Module: Archmap Workflow Generators
// Description: Minimal, performance, and cost workflow synthesis.
// Purpose: Turn detected issues and selected strategies into scored workflows.
// Dependencies: crate::detect, crate::graph, crate::reason
// ============================================================================

//! ## Overview
//! Three generators read the same analysis state and emit one workflow each:
//! minimal (least-invasive fixes for the top three issues), performance
//! (every performance-relevant strategy applied maximally), and cost
//! (consolidation, batching, right-sizing with a negative cost delta).
//! Generators are pure functions of the state; output order is fixed to
//! (minimal, performance, cost) regardless of how they are scheduled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::detect::issue::Issue;
use crate::detect::issue::IssueKind;
use crate::reason::state::AnalysisState;
use crate::reason::state::latency_edge_targets_database;
use crate::reason::workflow::ChangeKind;
use crate::reason::workflow::ProposedChange;
use crate::reason::workflow::Workflow;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of issues the minimal workflow addresses.
const MINIMAL_ISSUE_LIMIT: usize = 3;
/// Number of nodes the cost workflow right-sizes.
const RIGHTSIZE_NODE_LIMIT: usize = 3;

// ============================================================================
// SECTION: Minimal Workflow
// ============================================================================

/// `generate_minimal` node: least-invasive fixes for the top three issues.
///
/// Scores are capped at complexity 3 and risk 2.
#[must_use]
pub fn generate_minimal(state: &AnalysisState) -> Workflow {
    let mut changes = Vec::new();
    for issue in state.issues.iter().take(MINIMAL_ISSUE_LIMIT) {
        changes.push(least_invasive_change(state, issue));
    }

    let mut expected_impact = BTreeMap::new();
    expected_impact
        .insert("latency".to_string(), "noticeable relief on the flagged hot paths".to_string());
    expected_impact.insert(
        "delivery_effort".to_string(),
        "days, not weeks; no service rewrites".to_string(),
    );

    Workflow {
        id: "workflow-minimal".to_string(),
        name: "Minimal intervention".to_string(),
        description: "Smallest change set that addresses the top findings without restructuring \
                      the architecture."
            .to_string(),
        proposed_changes: changes.clone(),
        pros: vec![
            "small, reviewable change set".to_string(),
            "each change is independently shippable and reversible".to_string(),
        ],
        cons: vec![
            "treats the highest-ranked findings only".to_string(),
            "structural causes remain in place".to_string(),
        ],
        complexity_score: score(changes.len(), 1, 3),
        risk_score: if changes.len() <= 2 { 1 } else { 2 },
        expected_impact,
    }
}

/// Chooses the least-invasive change for one issue.
fn least_invasive_change(state: &AnalysisState, issue: &Issue) -> ProposedChange {
    match issue.kind {
        IssueKind::HighLatencyEdge => {
            let target = issue.affected_nodes.get(1).cloned().unwrap_or_default();
            if latency_edge_targets_database(&state.graph, issue) {
                ProposedChange {
                    change: ChangeKind::Caching,
                    description: format!("add a read-through cache in front of {target}"),
                    impact: format!(
                        "cuts repeated database load on {target} and lowers the mean edge latency"
                    ),
                    target,
                }
            } else {
                ProposedChange {
                    change: ChangeKind::Batching,
                    description: format!("coalesce repeated calls to {target} into batches"),
                    impact: "fewer round trips across the slow edge".to_string(),
                    target,
                }
            }
        }
        IssueKind::DeepCallChain => {
            let target = issue.affected_nodes.first().cloned().unwrap_or_default();
            ProposedChange {
                change: ChangeKind::AsyncDecoupling,
                description: format!(
                    "hand the tail of the call chain behind {target} to a message queue"
                ),
                impact: "shortens the synchronous path the caller waits on".to_string(),
                target,
            }
        }
        IssueKind::HighErrorRate => {
            let target = issue.affected_nodes.first().cloned().unwrap_or_default();
            ProposedChange {
                change: ChangeKind::CircuitBreaker,
                description: format!("wrap calls to {target} in a circuit breaker with fallback"),
                impact: "stops failure amplification while the dependency is unhealthy"
                    .to_string(),
                target,
            }
        }
        IssueKind::FanOutOverload => {
            let target = issue.affected_nodes.first().cloned().unwrap_or_default();
            ProposedChange {
                change: ChangeKind::Consolidation,
                description: format!("front the fan-out from {target} with an aggregating facade"),
                impact: "callers see one dependency instead of many".to_string(),
                target,
            }
        }
        IssueKind::SinglePointOfFailure => {
            let target = issue.affected_nodes.first().cloned().unwrap_or_default();
            ProposedChange {
                change: ChangeKind::Redundancy,
                description: format!("add a standby replica behind {target}"),
                impact: "dependents survive the loss of a single instance".to_string(),
                target,
            }
        }
    }
}

// ============================================================================
// SECTION: Performance Workflow
// ============================================================================

/// `generate_performance` node: every performance-relevant strategy, applied
/// maximally.
///
/// Scores land in complexity 5-8 and risk 3-6.
#[must_use]
pub fn generate_performance(state: &AnalysisState) -> Workflow {
    let mut changes = Vec::new();
    for issue in &state.issues {
        match issue.kind {
            IssueKind::HighLatencyEdge => {
                let target = issue.affected_nodes.get(1).cloned().unwrap_or_default();
                if latency_edge_targets_database(&state.graph, issue) {
                    changes.push(ProposedChange {
                        change: ChangeKind::Caching,
                        description: format!(
                            "add a read-through cache with write invalidation in front of {target}"
                        ),
                        impact: format!(
                            "removes repeated reads from {target}; the largest single latency win \
                             on this edge"
                        ),
                        target,
                    });
                } else {
                    changes.push(ProposedChange {
                        change: ChangeKind::Batching,
                        description: format!(
                            "batch and pipeline requests to {target} on the hot path"
                        ),
                        impact: "amortizes per-call overhead across the slow edge".to_string(),
                        target,
                    });
                }
            }
            IssueKind::DeepCallChain => {
                let target = issue.affected_nodes.first().cloned().unwrap_or_default();
                changes.push(ProposedChange {
                    change: ChangeKind::AsyncDecoupling,
                    description: format!(
                        "decouple every non-interactive hop below {target} onto queues"
                    ),
                    impact: "collapses the synchronous chain to its interactive prefix"
                        .to_string(),
                    target,
                });
            }
            IssueKind::FanOutOverload => {
                let target = issue.affected_nodes.first().cloned().unwrap_or_default();
                changes.push(ProposedChange {
                    change: ChangeKind::Batching,
                    description: format!(
                        "dispatch the fan-out from {target} concurrently and batch homogeneous \
                         requests"
                    ),
                    impact: "fan-out latency approaches the slowest single call".to_string(),
                    target,
                });
            }
            IssueKind::HighErrorRate | IssueKind::SinglePointOfFailure => {}
        }
    }
    if changes.is_empty() {
        // No performance-category findings: buy latency headroom on the nodes
        // the other rules flagged.
        for target in affected_nodes(&state.issues, RIGHTSIZE_NODE_LIMIT) {
            changes.push(ProposedChange {
                change: ChangeKind::Rightsizing,
                description: format!("scale {target} up for latency headroom under load"),
                impact: "keeps tail latency flat while the flagged issues are worked".to_string(),
                target,
            });
        }
    }

    let mut expected_impact = BTreeMap::new();
    expected_impact.insert(
        "latency".to_string(),
        "largest available mean-latency reduction on flagged edges".to_string(),
    );
    expected_impact
        .insert("throughput".to_string(), "higher ceiling on fan-out heavy paths".to_string());

    Workflow {
        id: "workflow-performance".to_string(),
        name: "Performance first".to_string(),
        description: "Applies caching, decoupling, and batching wherever the graph shows latency \
                      or throughput headroom."
            .to_string(),
        proposed_changes: changes.clone(),
        pros: vec![
            "targets the largest latency and throughput improvements".to_string(),
            "changes compound: caching and decoupling reinforce each other".to_string(),
        ],
        cons: vec![
            "touches several services in one program of work".to_string(),
            "caches and queues add operational surface".to_string(),
        ],
        complexity_score: score(4 + changes.len(), 5, 8),
        risk_score: score(2 + changes.len() / 2, 3, 6),
        expected_impact,
    }
}

// ============================================================================
// SECTION: Cost Workflow
// ============================================================================

/// `generate_cost` node: consolidation, batching, and right-sizing.
///
/// Scores land in complexity 3-6 and risk 2-4; the expected cost delta is
/// negative.
#[must_use]
pub fn generate_cost(state: &AnalysisState) -> Workflow {
    let mut changes = Vec::new();
    for issue in &state.issues {
        match issue.kind {
            IssueKind::FanOutOverload => {
                let target = issue.affected_nodes.first().cloned().unwrap_or_default();
                changes.push(ProposedChange {
                    change: ChangeKind::Consolidation,
                    description: format!(
                        "collapse the dependencies fanned out from {target} behind one facade"
                    ),
                    impact: "fewer deployables and network paths to operate".to_string(),
                    target,
                });
            }
            IssueKind::HighLatencyEdge => {
                let target = issue.affected_nodes.get(1).cloned().unwrap_or_default();
                changes.push(ProposedChange {
                    change: ChangeKind::Batching,
                    description: format!("batch calls to {target} to shrink request volume"),
                    impact: "lower call volume translates directly into capacity savings"
                        .to_string(),
                    target,
                });
            }
            IssueKind::DeepCallChain
            | IssueKind::HighErrorRate
            | IssueKind::SinglePointOfFailure => {}
        }
    }
    for target in affected_nodes(&state.issues, RIGHTSIZE_NODE_LIMIT) {
        changes.push(ProposedChange {
            change: ChangeKind::Rightsizing,
            description: format!("right-size {target} capacity to the observed call volume"),
            impact: "reclaims provisioned headroom the telemetry shows is unused".to_string(),
            target,
        });
    }

    let mut expected_impact = BTreeMap::new();
    expected_impact.insert("infrastructure_cost".to_string(), "-15% to -25%".to_string());
    expected_impact.insert(
        "operational_overhead".to_string(),
        "fewer moving parts after consolidation".to_string(),
    );

    Workflow {
        id: "workflow-cost".to_string(),
        name: "Cost optimization".to_string(),
        description: "Consolidates chatty call patterns and right-sizes capacity so the same \
                      traffic runs on less infrastructure."
            .to_string(),
        proposed_changes: changes.clone(),
        pros: vec![
            "negative cost delta with measurable capacity reclaim".to_string(),
            "simplifies the dependency graph as a side effect".to_string(),
        ],
        cons: vec![
            "less headroom for sudden traffic growth".to_string(),
            "consolidation couples previously independent call sites".to_string(),
        ],
        complexity_score: score(2 + changes.len(), 3, 6),
        risk_score: score(1 + changes.len() / 2, 2, 4),
        expected_impact,
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Clamps a change-derived score into the mandated range.
fn score(value: usize, floor: u8, ceiling: u8) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX).clamp(floor, ceiling)
}

/// Returns up to `limit` distinct affected node identities, in issue order.
fn affected_nodes(issues: &[Issue], limit: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut nodes = Vec::new();
    for issue in issues {
        for name in &issue.affected_nodes {
            if nodes.len() >= limit {
                return nodes;
            }
            if seen.insert(name.clone()) {
                nodes.push(name.clone());
            }
        }
    }
    nodes
}
