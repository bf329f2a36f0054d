// crates/archmap-core/src/reason/compare.rs
// ============================================================================
// Module: Archmap Workflow Comparison
// Description: Comparison matrix and recommendation across workflows.
// Purpose: Rank generated workflows for the read surface.
// Dependencies: crate::detect, crate::reason::workflow
// ============================================================================

//! ## Overview
//! The comparison matrix lists complexity, risk, and change count per
//! workflow. The recommendation is the workflow with the minimum sum of
//! complexity and risk among those addressing the highest-severity
//! outstanding issue; ties prefer the minimal workflow, which the fixed
//! generation order makes the first candidate.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::detect::issue::Issue;
use crate::reason::workflow::Workflow;
use crate::reason::workflow::WorkflowComparison;
use crate::reason::workflow::WorkflowScore;

// ============================================================================
// SECTION: Comparison
// ============================================================================

/// Builds the comparison matrix and recommendation.
///
/// A workflow "addresses" an issue when any proposed change targets one of
/// the issue's affected nodes. When no workflow addresses an issue at the
/// highest outstanding severity, every workflow is eligible.
#[must_use]
pub fn compare_workflows(workflows: &[Workflow], issues: &[Issue]) -> WorkflowComparison {
    let matrix: Vec<WorkflowScore> = workflows
        .iter()
        .map(|workflow| WorkflowScore {
            id: workflow.id.clone(),
            name: workflow.name.clone(),
            complexity: workflow.complexity_score,
            risk: workflow.risk_score,
            change_count: workflow.proposed_changes.len(),
        })
        .collect();

    let recommendation = recommend(workflows, issues);
    WorkflowComparison {
        matrix,
        recommendation,
    }
}

/// Chooses the recommended workflow identifier.
fn recommend(workflows: &[Workflow], issues: &[Issue]) -> Option<String> {
    if workflows.is_empty() {
        return None;
    }
    // Issues arrive severity-descending, so the first carries the highest
    // outstanding severity.
    let top_severity = issues.first().map(|issue| issue.severity);
    let top_targets: BTreeSet<&str> = issues
        .iter()
        .filter(|issue| Some(issue.severity) == top_severity)
        .flat_map(|issue| issue.affected_nodes.iter().map(String::as_str))
        .collect();

    let addressing: Vec<&Workflow> = workflows
        .iter()
        .filter(|workflow| {
            workflow
                .proposed_changes
                .iter()
                .any(|change| top_targets.contains(change.target.as_str()))
        })
        .collect();
    let candidates: Vec<&Workflow> = if addressing.is_empty() {
        workflows.iter().collect()
    } else {
        addressing
    };

    // Strict comparison keeps the earliest candidate on ties, which is the
    // minimal workflow under the fixed generation order.
    let mut best: Option<&Workflow> = None;
    for workflow in candidates {
        let sum = u16::from(workflow.complexity_score) + u16::from(workflow.risk_score);
        let current =
            best.map(|chosen| u16::from(chosen.complexity_score) + u16::from(chosen.risk_score));
        if current.is_none_or(|current_sum| sum < current_sum) {
            best = Some(workflow);
        }
    }
    best.map(|workflow| workflow.id.clone())
}
