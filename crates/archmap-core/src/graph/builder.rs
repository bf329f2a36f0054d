// crates/archmap-core/src/graph/builder.rs
// ============================================================================
// Module: Archmap Graph Builder
// Description: Dependency-graph reconstruction from a span snapshot.
// Purpose: Partition spans into node and edge groups and aggregate metrics.
// Dependencies: crate::core, crate::graph::{metrics, model}
// ============================================================================

//! ## Overview
//! The builder consumes an in-memory span snapshot and produces the directed
//! dependency graph. Spans are partitioned by `service_name` for node metrics
//! and by `(service_name, downstream)` for edge metrics; a span without a
//! downstream contributes only to its service node. Nodes are classified by
//! discovery records first, inference second. Output is a pure function of
//! the span multiset: permutation of the input never changes a number.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::span::DiscoveryRecord;
use crate::core::span::Span;
use crate::graph::metrics::Metrics;
use crate::graph::metrics::MetricsAccumulator;
use crate::graph::model::DependencyGraph;
use crate::graph::model::Edge;
use crate::graph::model::Node;
use crate::graph::model::NodeKind;
use crate::graph::model::classify_identity;

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds the dependency graph for a span snapshot.
///
/// `discovery` records, when present for an identity, override the inferred
/// node kind. Self-loops (a span whose downstream equals its own service
/// name) are kept.
#[must_use]
pub fn build_graph(spans: &[Span], discovery: &[DiscoveryRecord]) -> DependencyGraph {
    let declared = declared_kinds(discovery);

    let mut node_groups: BTreeMap<&str, MetricsAccumulator> = BTreeMap::new();
    let mut edge_groups: BTreeMap<(&str, &str), MetricsAccumulator> = BTreeMap::new();
    for span in spans {
        node_groups.entry(span.service_name.as_str()).or_default().observe(span);
        if let Some(downstream) = &span.downstream {
            edge_groups
                .entry((span.service_name.as_str(), downstream.as_str()))
                .or_default()
                .observe(span);
        }
    }

    let mut graph = DependencyGraph::default();
    for (name, accumulator) in &node_groups {
        insert_node(&mut graph, &declared, name, accumulator.finish());
    }
    for ((source, target), accumulator) in &edge_groups {
        // Downstream-only identities still become nodes, with zeroed metrics
        // until spans originate from them.
        if !graph.nodes.contains_key(*target) {
            insert_node(&mut graph, &declared, target, Metrics::default());
        }
        graph.edges.insert(
            ((*source).to_string(), (*target).to_string()),
            Edge {
                source: (*source).to_string(),
                target: (*target).to_string(),
                metrics: accumulator.finish(),
            },
        );
    }
    graph
}

/// Indexes discovery records by service name, parsing declared kinds.
fn declared_kinds(discovery: &[DiscoveryRecord]) -> BTreeMap<&str, NodeKind> {
    discovery
        .iter()
        .filter_map(|record| {
            NodeKind::from_label(&record.declared_kind)
                .map(|kind| (record.service_name.as_str(), kind))
        })
        .collect()
}

/// Inserts a classified node into the graph.
fn insert_node(
    graph: &mut DependencyGraph,
    declared: &BTreeMap<&str, NodeKind>,
    name: &str,
    metrics: Metrics,
) {
    let kind = declared.get(name).copied().unwrap_or_else(|| classify_identity(name));
    graph.nodes.insert(
        name.to_string(),
        Node {
            name: name.to_string(),
            kind,
            metrics,
        },
    );
}
