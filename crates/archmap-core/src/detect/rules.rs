// crates/archmap-core/src/detect/rules.rs
// ============================================================================
// Module: Archmap Detection Rules
// Description: The five structural and performance rules over the graph.
// Purpose: Emit evidence-backed issues with deterministic identifiers.
// Dependencies: crate::detect, crate::graph, serde_json, thiserror, tracing
// ============================================================================

//! ## Overview
//! Rules are independent pure functions over an immutable graph; none share
//! mutable state. The runner is infallible given a valid graph: a rule that
//! fails internally is logged and skipped, and the remaining rules still
//! produce output. Output ordering is severity-descending, then identifier,
//! so repeated runs over identical graphs produce identical listings.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

use crate::core::hashing::HashError;
use crate::detect::issue::Issue;
use crate::detect::issue::IssueKind;
use crate::detect::issue::IssueSeverity;
use crate::detect::issue::issue_id;
use crate::detect::thresholds::Thresholds;
use crate::graph::analysis::node_depths;
use crate::graph::model::DependencyGraph;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Internal rule evaluation failures.
///
/// # Invariants
/// - A rule failure never aborts the detection run; it is logged and skipped.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Issue identifier derivation failed.
    #[error("issue id derivation failed: {0}")]
    IdDerivation(#[from] HashError),
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Rule function signature shared by all detection rules.
type RuleFn = fn(&DependencyGraph, &Thresholds) -> Result<Vec<Issue>, RuleError>;

/// The registered rules, in documentation order.
const RULES: [(&str, RuleFn); 5] = [
    ("high_latency_edge", rule_high_latency_edges),
    ("deep_call_chain", rule_deep_call_chains),
    ("high_error_rate", rule_high_error_rates),
    ("fan_out_overload", rule_fan_out_overload),
    ("single_point_of_failure", rule_single_points_of_failure),
];

/// Runs every detection rule over the graph.
///
/// Issues are returned severity-descending, then by identifier. A rule that
/// fails internally is logged and skipped; remaining rules still contribute.
#[must_use]
pub fn detect_issues(graph: &DependencyGraph, thresholds: &Thresholds) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (name, rule) in RULES {
        match rule(graph, thresholds) {
            Ok(found) => issues.extend(found),
            Err(error) => {
                tracing::error!(rule = name, error = %error, "detection rule failed, skipping");
            }
        }
    }
    issues.sort_by(|left, right| {
        right.severity.cmp(&left.severity).then_with(|| left.id.cmp(&right.id))
    });
    issues
}

// ============================================================================
// SECTION: High-Latency Edges
// ============================================================================

/// Flags edges whose mean latency exceeds `lat_max_ms`.
fn rule_high_latency_edges(
    graph: &DependencyGraph,
    thresholds: &Thresholds,
) -> Result<Vec<Issue>, RuleError> {
    let mut issues = Vec::new();
    for edge in graph.edges.values() {
        if edge.metrics.avg_latency_ms <= thresholds.lat_max_ms {
            continue;
        }
        let affected = vec![edge.source.clone(), edge.target.clone()];
        let mut evidence = BTreeMap::new();
        evidence.insert("threshold".to_string(), Value::from(thresholds.lat_max_ms));
        evidence.insert("actual".to_string(), Value::from(edge.metrics.avg_latency_ms));
        evidence.insert("call_count".to_string(), Value::from(edge.metrics.call_count));
        issues.push(Issue {
            id: issue_id(IssueKind::HighLatencyEdge, &affected)?,
            kind: IssueKind::HighLatencyEdge,
            severity: IssueSeverity::High,
            description: format!(
                "calls from {} to {} average {:.0} ms against a {:.0} ms ceiling",
                edge.source, edge.target, edge.metrics.avg_latency_ms, thresholds.lat_max_ms
            ),
            affected_nodes: affected,
            metric_value: edge.metrics.avg_latency_ms,
            evidence,
        });
    }
    Ok(issues)
}

// ============================================================================
// SECTION: Deep Synchronous Chains
// ============================================================================

/// Flags nodes heading call chains deeper than `depth_max`.
fn rule_deep_call_chains(
    graph: &DependencyGraph,
    thresholds: &Thresholds,
) -> Result<Vec<Issue>, RuleError> {
    let mut issues = Vec::new();
    for (name, depth) in node_depths(graph) {
        if depth <= thresholds.depth_max {
            continue;
        }
        let affected = vec![name.clone()];
        let mut evidence = BTreeMap::new();
        evidence.insert("threshold".to_string(), Value::from(thresholds.depth_max));
        evidence.insert("actual".to_string(), Value::from(depth));
        #[allow(clippy::cast_precision_loss, reason = "chain depths are far below 2^53")]
        let metric_value = depth as f64;
        issues.push(Issue {
            id: issue_id(IssueKind::DeepCallChain, &affected)?,
            kind: IssueKind::DeepCallChain,
            severity: IssueSeverity::Medium,
            description: format!(
                "{name} heads a synchronous call chain {depth} hops deep (ceiling {})",
                thresholds.depth_max
            ),
            affected_nodes: affected,
            metric_value,
            evidence,
        });
    }
    Ok(issues)
}

// ============================================================================
// SECTION: High Error-Rate Nodes
// ============================================================================

/// Flags nodes whose error rate exceeds `err_max`.
fn rule_high_error_rates(
    graph: &DependencyGraph,
    thresholds: &Thresholds,
) -> Result<Vec<Issue>, RuleError> {
    let mut issues = Vec::new();
    for node in graph.nodes.values() {
        if node.metrics.error_rate <= thresholds.err_max {
            continue;
        }
        let affected = vec![node.name.clone()];
        let mut evidence = BTreeMap::new();
        evidence.insert("threshold".to_string(), Value::from(thresholds.err_max));
        evidence.insert("actual".to_string(), Value::from(node.metrics.error_rate));
        evidence.insert("call_count".to_string(), Value::from(node.metrics.call_count));
        issues.push(Issue {
            id: issue_id(IssueKind::HighErrorRate, &affected)?,
            kind: IssueKind::HighErrorRate,
            severity: IssueSeverity::Critical,
            description: format!(
                "{} fails {:.1}% of calls (ceiling {:.1}%)",
                node.name,
                node.metrics.error_rate * 100.0,
                thresholds.err_max * 100.0
            ),
            affected_nodes: affected,
            metric_value: node.metrics.error_rate,
            evidence,
        });
    }
    Ok(issues)
}

// ============================================================================
// SECTION: Fan-Out Overload
// ============================================================================

/// Flags nodes whose out-degree exceeds `fanout_max`.
fn rule_fan_out_overload(
    graph: &DependencyGraph,
    thresholds: &Thresholds,
) -> Result<Vec<Issue>, RuleError> {
    let mut issues = Vec::new();
    for name in graph.node_names() {
        let targets = graph.successors(name);
        if targets.len() <= thresholds.fanout_max {
            continue;
        }
        let affected = vec![name.to_string()];
        let mut evidence = BTreeMap::new();
        evidence.insert("threshold".to_string(), Value::from(thresholds.fanout_max));
        evidence.insert("actual".to_string(), Value::from(targets.len()));
        evidence.insert(
            "targets".to_string(),
            Value::Array(targets.iter().map(|&target| Value::from(target)).collect()),
        );
        #[allow(clippy::cast_precision_loss, reason = "degrees are far below 2^53")]
        let metric_value = targets.len() as f64;
        issues.push(Issue {
            id: issue_id(IssueKind::FanOutOverload, &affected)?,
            kind: IssueKind::FanOutOverload,
            severity: IssueSeverity::Medium,
            description: format!(
                "{name} fans out to {} downstream dependencies (ceiling {})",
                targets.len(),
                thresholds.fanout_max
            ),
            affected_nodes: affected,
            metric_value,
            evidence,
        });
    }
    Ok(issues)
}

// ============================================================================
// SECTION: Single Points of Failure
// ============================================================================

/// Flags nodes whose in-degree exceeds `in_max`.
fn rule_single_points_of_failure(
    graph: &DependencyGraph,
    thresholds: &Thresholds,
) -> Result<Vec<Issue>, RuleError> {
    let mut issues = Vec::new();
    for name in graph.node_names() {
        let dependents = graph.predecessors(name);
        if dependents.len() <= thresholds.in_max {
            continue;
        }
        let affected = vec![name.to_string()];
        let mut evidence = BTreeMap::new();
        evidence.insert("threshold".to_string(), Value::from(thresholds.in_max));
        evidence.insert("actual".to_string(), Value::from(dependents.len()));
        evidence.insert(
            "dependent_services".to_string(),
            Value::Array(dependents.iter().map(|&dependent| Value::from(dependent)).collect()),
        );
        #[allow(clippy::cast_precision_loss, reason = "degrees are far below 2^53")]
        let metric_value = dependents.len() as f64;
        issues.push(Issue {
            id: issue_id(IssueKind::SinglePointOfFailure, &affected)?,
            kind: IssueKind::SinglePointOfFailure,
            severity: IssueSeverity::High,
            description: format!(
                "{} services depend directly on {name} (ceiling {})",
                dependents.len(),
                thresholds.in_max
            ),
            affected_nodes: affected,
            metric_value,
            evidence,
        });
    }
    Ok(issues)
}
