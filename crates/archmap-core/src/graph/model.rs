// crates/archmap-core/src/graph/model.rs
// ============================================================================
// Module: Archmap Dependency Graph Model
// Description: Typed nodes, metric-carrying edges, and adjacency queries.
// Purpose: Represent the reconstructed architecture for detection and reasoning.
// Dependencies: crate::core, serde, url
// ============================================================================

//! ## Overview
//! The dependency graph is derived from a span snapshot and never stored.
//! Nodes are keyed by identity string (the service name for originating
//! services, the downstream string otherwise) and classified as service,
//! database, or external. Edges are keyed by `(source, target)`. Maps are
//! `BTreeMap`-backed so iteration order is deterministic, although only the
//! aggregated numeric outputs are part of the contract.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::graph::metrics::Metrics;

// ============================================================================
// SECTION: Node Classification
// ============================================================================

/// Substrings that classify a node identity as a database.
const DATABASE_MARKERS: [&str; 6] = ["postgres", "mysql", "mongo", "redis", "dynamodb", "cosmosdb"];

/// Substrings that classify a node identity as an external dependency.
const EXTERNAL_MARKERS: [&str; 3] = ["http://", "https://", "api."];

/// Kind of a reconstructed architecture node.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// An instrumented or referenced service.
    Service,
    /// A database dependency.
    Database,
    /// An external third-party dependency.
    External,
}

impl NodeKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Database => "database",
            Self::External => "external",
        }
    }

    /// Parses a declared kind label, case-insensitively.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "service" => Some(Self::Service),
            "database" => Some(Self::Database),
            "external" => Some(Self::External),
            _ => None,
        }
    }
}

/// Classifies a node identity string into a [`NodeKind`].
///
/// Database markers win over external markers; an identity that parses as an
/// absolute URL with a host is external even without a marker substring.
#[must_use]
pub fn classify_identity(identity: &str) -> NodeKind {
    let lowered = identity.to_ascii_lowercase();
    if DATABASE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return NodeKind::Database;
    }
    if EXTERNAL_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return NodeKind::External;
    }
    if let Ok(url) = Url::parse(identity)
        && url.host().is_some()
    {
        return NodeKind::External;
    }
    NodeKind::Service
}

// ============================================================================
// SECTION: Nodes and Edges
// ============================================================================

/// Reconstructed architecture node with aggregated metrics.
///
/// # Invariants
/// - `name` is the node identity and the key under which the node is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Node identity: service name or downstream string.
    pub name: String,
    /// Classified node kind.
    pub kind: NodeKind,
    /// Aggregated call metrics for spans originating at this node, or zeroed
    /// metrics for nodes only ever observed as a downstream target.
    pub metrics: Metrics,
}

/// Directed call relationship between two nodes.
///
/// # Invariants
/// - `(source, target)` is the edge identity; self-loops are permitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Calling service name.
    pub source: String,
    /// Callee identity.
    pub target: String,
    /// Aggregated metrics over the spans forming this edge.
    pub metrics: Metrics,
}

// ============================================================================
// SECTION: Dependency Graph
// ============================================================================

/// Directed dependency graph reconstructed from a span snapshot.
///
/// # Invariants
/// - Every edge endpoint has a corresponding node entry.
/// - Purely in-memory; graphs are recomputed, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    /// Nodes keyed by identity.
    pub nodes: BTreeMap<String, Node>,
    /// Edges keyed by `(source, target)`.
    pub edges: BTreeMap<(String, String), Edge>,
}

impl DependencyGraph {
    /// Returns true when the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the distinct successor identities of a node.
    #[must_use]
    pub fn successors(&self, name: &str) -> BTreeSet<&str> {
        self.edges
            .keys()
            .filter(|(source, _)| source.as_str() == name)
            .map(|(_, target)| target.as_str())
            .collect()
    }

    /// Returns the distinct predecessor identities of a node.
    #[must_use]
    pub fn predecessors(&self, name: &str) -> BTreeSet<&str> {
        self.edges
            .keys()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(source, _)| source.as_str())
            .collect()
    }

    /// Returns the out-degree of a node (distinct successors).
    #[must_use]
    pub fn out_degree(&self, name: &str) -> usize {
        self.successors(name).len()
    }

    /// Returns the in-degree of a node (distinct predecessors).
    #[must_use]
    pub fn in_degree(&self, name: &str) -> usize {
        self.predecessors(name).len()
    }

    /// Returns a deterministic listing of node identities.
    #[must_use]
    pub fn node_names(&self) -> Vec<&str> {
        self.nodes.keys().map(String::as_str).collect()
    }
}
