// crates/archmap-core/src/graph/analysis.rs
// ============================================================================
// Module: Archmap Graph Analysis
// Description: Depth, cycle, critical-path, and centrality measures.
// Purpose: Provide the graph algorithms behind detection rules and reasoning.
// Dependencies: crate::graph::model, serde
// ============================================================================

//! ## Overview
//! Analysis operates on the adjacency structure of a [`DependencyGraph`].
//! Call-chain depth is computed on the condensation of strongly connected
//! components, so cyclic graphs terminate: each component contributes its
//! size minus one as internal hops plus one hop per condensation edge. On an
//! acyclic graph this is exactly the longest simple path length in edges.
//! Betweenness centrality uses Brandes' accumulation over unweighted BFS.
//! All outputs are deterministic; ties resolve toward the lexicographically
//! smallest node name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;

use serde::Deserialize;
use serde::Serialize;

use crate::graph::model::DependencyGraph;

// ============================================================================
// SECTION: Measures
// ============================================================================

/// Advanced graph measures used by strategy selection and the read surface.
///
/// # Invariants
/// - `critical_path_hops` equals the maximum value in a full depth map of the
///   same graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMeasures {
    /// Betweenness centrality per node.
    pub centrality: BTreeMap<String, f64>,
    /// Whether the graph contains any cycle (including self-loops).
    pub has_cycles: bool,
    /// Longest call chain in the graph, as an ordered node listing.
    pub critical_path: Vec<String>,
    /// Length of the longest call chain, in hops.
    pub critical_path_hops: u64,
}

/// Computes the full measure set for a graph.
#[must_use]
pub fn analyze_graph(graph: &DependencyGraph) -> GraphMeasures {
    let index = NodeIndex::build(graph);
    let condensation = Condensation::build(&index);
    let (critical_path, critical_path_hops) = condensation.critical_path(&index);
    GraphMeasures {
        centrality: betweenness_centrality(graph),
        has_cycles: condensation.has_cycles,
        critical_path,
        critical_path_hops,
    }
}

/// Computes the call-chain depth of every node.
///
/// The depth of a node is the longest call chain originating at it, in hops,
/// taken over the condensation of strongly connected components.
#[must_use]
pub fn node_depths(graph: &DependencyGraph) -> BTreeMap<String, u64> {
    let index = NodeIndex::build(graph);
    let condensation = Condensation::build(&index);
    index
        .names
        .iter()
        .enumerate()
        .map(|(node, name)| {
            (name.clone(), condensation.depth[condensation.component_of[node]])
        })
        .collect()
}

/// Returns true when the graph contains a cycle, including self-loops.
#[must_use]
pub fn has_cycles(graph: &DependencyGraph) -> bool {
    let index = NodeIndex::build(graph);
    Condensation::build(&index).has_cycles
}

// ============================================================================
// SECTION: Node Indexing
// ============================================================================

/// Dense integer indexing over graph nodes with adjacency lists.
///
/// # Invariants
/// - `names` is sorted, so indices are deterministic for a given node set.
struct NodeIndex {
    /// Node names in index order.
    names: Vec<String>,
    /// Distinct successors per node, in index order.
    adjacency: Vec<Vec<usize>>,
    /// Whether the node carries a self-loop edge.
    self_loop: Vec<bool>,
}

impl NodeIndex {
    /// Builds the index from a graph.
    fn build(graph: &DependencyGraph) -> Self {
        let names: Vec<String> = graph.nodes.keys().cloned().collect();
        let positions: BTreeMap<&str, usize> =
            names.iter().enumerate().map(|(position, name)| (name.as_str(), position)).collect();
        let mut adjacency = vec![Vec::new(); names.len()];
        let mut self_loop = vec![false; names.len()];
        for (source, target) in graph.edges.keys() {
            let (Some(&from), Some(&to)) =
                (positions.get(source.as_str()), positions.get(target.as_str()))
            else {
                continue;
            };
            if from == to {
                self_loop[from] = true;
            } else {
                adjacency[from].push(to);
            }
        }
        Self {
            names,
            adjacency,
            self_loop,
        }
    }
}

// ============================================================================
// SECTION: Condensation
// ============================================================================

/// Strongly-connected-component condensation with longest-path depths.
///
/// # Invariants
/// - `components` are emitted in reverse topological order of the
///   condensation (Tarjan order), so successors precede their predecessors.
struct Condensation {
    /// Component membership, sorted within each component.
    components: Vec<Vec<usize>>,
    /// Component index per node.
    component_of: Vec<usize>,
    /// Longest-chain depth per component, in hops.
    depth: Vec<u64>,
    /// Best condensation successor per component on the longest chain.
    best_successor: Vec<Option<usize>>,
    /// Whether any component is larger than one node or carries a self-loop.
    has_cycles: bool,
}

impl Condensation {
    /// Builds the condensation for an indexed graph.
    fn build(index: &NodeIndex) -> Self {
        let components = strongly_connected_components(&index.adjacency);
        let node_count = index.names.len();
        let mut component_of = vec![0; node_count];
        for (component, members) in components.iter().enumerate() {
            for &member in members {
                component_of[member] = component;
            }
        }

        let has_cycles = components.iter().any(|members| members.len() > 1)
            || index.self_loop.iter().any(|&looped| looped);

        // Tarjan emission order is reverse topological, so every successor
        // component is finished before its predecessors are visited.
        let mut depth = vec![0_u64; components.len()];
        let mut best_successor = vec![None; components.len()];
        for (component, members) in components.iter().enumerate() {
            let internal = u64::try_from(members.len().saturating_sub(1)).unwrap_or(u64::MAX);
            let mut best: Option<(u64, usize)> = None;
            for &member in members {
                for &next in &index.adjacency[member] {
                    let successor = component_of[next];
                    if successor == component {
                        continue;
                    }
                    let candidate = 1 + depth[successor];
                    let better = match best {
                        None => true,
                        Some((best_depth, best_comp)) => {
                            candidate > best_depth
                                || (candidate == best_depth
                                    && representative(&components[successor], index)
                                        < representative(&components[best_comp], index))
                        }
                    };
                    if better {
                        best = Some((candidate, successor));
                    }
                }
            }
            match best {
                Some((chained, successor)) => {
                    depth[component] = internal + chained;
                    best_successor[component] = Some(successor);
                }
                None => depth[component] = internal,
            }
        }

        Self {
            components,
            component_of,
            depth,
            best_successor,
            has_cycles,
        }
    }

    /// Reconstructs the longest call chain as an ordered node listing.
    fn critical_path(&self, index: &NodeIndex) -> (Vec<String>, u64) {
        let Some(start) = self
            .components
            .iter()
            .enumerate()
            .max_by(|(left, left_members), (right, right_members)| {
                self.depth[*left].cmp(&self.depth[*right]).then_with(|| {
                    representative(right_members.as_slice(), index)
                        .cmp(representative(left_members.as_slice(), index))
                })
            })
            .map(|(component, _)| component)
        else {
            return (Vec::new(), 0);
        };

        let mut path = Vec::new();
        let mut cursor = Some(start);
        while let Some(component) = cursor {
            for &member in &self.components[component] {
                path.push(index.names[member].clone());
            }
            cursor = self.best_successor[component];
        }
        (path, self.depth[start])
    }
}

/// Returns the lexicographically smallest member name of a component.
fn representative<'a>(members: &[usize], index: &'a NodeIndex) -> &'a str {
    members
        .iter()
        .map(|&member| index.names[member].as_str())
        .min()
        .unwrap_or("")
}

/// Tarjan's strongly connected components, iteratively.
///
/// Components are emitted in reverse topological order of the condensation
/// and sorted internally by node index.
fn strongly_connected_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    /// Sentinel marking an unvisited node.
    const UNVISITED: usize = usize::MAX;

    let node_count = adjacency.len();
    let mut order = vec![UNVISITED; node_count];
    let mut lowlink = vec![0; node_count];
    let mut on_stack = vec![false; node_count];
    let mut stack: Vec<usize> = Vec::new();
    let mut components: Vec<Vec<usize>> = Vec::new();
    let mut counter = 0;
    let mut frames: Vec<(usize, usize)> = Vec::new();

    for root in 0..node_count {
        if order[root] != UNVISITED {
            continue;
        }
        order[root] = counter;
        lowlink[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;
        frames.push((root, 0));

        while let Some(frame) = frames.last_mut() {
            let (node, child_position) = *frame;
            if let Some(&child) = adjacency[node].get(child_position) {
                frame.1 += 1;
                if order[child] == UNVISITED {
                    order[child] = counter;
                    lowlink[child] = counter;
                    counter += 1;
                    stack.push(child);
                    on_stack[child] = true;
                    frames.push((child, 0));
                } else if on_stack[child] {
                    lowlink[node] = lowlink[node].min(order[child]);
                }
            } else {
                frames.pop();
                if let Some(&(parent, _)) = frames.last() {
                    lowlink[parent] = lowlink[parent].min(lowlink[node]);
                }
                if lowlink[node] == order[node] {
                    let mut component = Vec::new();
                    while let Some(member) = stack.pop() {
                        on_stack[member] = false;
                        component.push(member);
                        if member == node {
                            break;
                        }
                    }
                    component.sort_unstable();
                    components.push(component);
                }
            }
        }
    }
    components
}

// ============================================================================
// SECTION: Centrality
// ============================================================================

/// Brandes betweenness centrality over unweighted directed shortest paths.
#[must_use]
pub fn betweenness_centrality(graph: &DependencyGraph) -> BTreeMap<String, f64> {
    let index = NodeIndex::build(graph);
    let node_count = index.names.len();
    let mut centrality = vec![0.0_f64; node_count];

    for source in 0..node_count {
        let mut visit_order: Vec<usize> = Vec::new();
        let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
        let mut path_counts = vec![0.0_f64; node_count];
        let mut distance = vec![-1_i64; node_count];
        path_counts[source] = 1.0;
        distance[source] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(source);
        while let Some(node) = queue.pop_front() {
            visit_order.push(node);
            for &next in &index.adjacency[node] {
                if distance[next] < 0 {
                    distance[next] = distance[node] + 1;
                    queue.push_back(next);
                }
                if distance[next] == distance[node] + 1 {
                    path_counts[next] += path_counts[node];
                    predecessors[next].push(node);
                }
            }
        }

        let mut dependency = vec![0.0_f64; node_count];
        for &node in visit_order.iter().rev() {
            for &previous in &predecessors[node] {
                dependency[previous] +=
                    (path_counts[previous] / path_counts[node]) * (1.0 + dependency[node]);
            }
            if node != source {
                centrality[node] += dependency[node];
            }
        }
    }

    index.names.iter().cloned().zip(centrality).collect()
}
