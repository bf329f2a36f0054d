// crates/archmap-core/tests/graph_analysis.rs
// ============================================================================
// Module: Graph Analysis Tests
// Description: Depth, cycle, critical-path, and centrality measures.
// Purpose: Validate condensation-based depth and Brandes centrality.
// ============================================================================

//! ## Overview
//! Unit tests for the structural measures:
//! - Chain depths count hops; branches take the longer arm
//! - Cycles terminate via SCC condensation and are reported
//! - Critical path reconstruction is deterministic
//! - Betweenness centrality peaks on pass-through nodes

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

use archmap_core::Span;
use archmap_core::analyze_graph;
use archmap_core::build_graph;
use archmap_core::graph::node_depths;

mod common;

use common::call_span;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds one call span per `(source, target)` pair.
fn chain(pairs: &[(&str, &str)]) -> Vec<Span> {
    pairs
        .iter()
        .enumerate()
        .map(|(index, (source, target))| {
            call_span(&format!("s{index}"), source, target, 100.0)
        })
        .collect()
}

// ============================================================================
// SECTION: Depth
// ============================================================================

#[test]
fn chain_depth_counts_hops() {
    let spans =
        chain(&[("a", "b"), ("b", "c"), ("c", "d"), ("d", "e"), ("e", "f"), ("f", "g")]);
    let graph = build_graph(&spans, &[]);
    let depths = node_depths(&graph);
    assert_eq!(depths["a"], 6);
    assert_eq!(depths["d"], 3);
    assert_eq!(depths["g"], 0);
}

#[test]
fn branch_depth_takes_longer_arm() {
    let spans = chain(&[("a", "b"), ("a", "c"), ("c", "d"), ("d", "e")]);
    let graph = build_graph(&spans, &[]);
    let depths = node_depths(&graph);
    assert_eq!(depths["a"], 3);
    assert_eq!(depths["b"], 0);
}

#[test]
fn cycle_depth_terminates_and_counts_component_hops() {
    // a -> b -> c -> a with an exit c -> d.
    let spans = chain(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
    let graph = build_graph(&spans, &[]);
    let depths = node_depths(&graph);
    // The three-node component contributes two internal hops plus the exit.
    assert_eq!(depths["a"], 3);
    assert_eq!(depths["d"], 0);
}

// ============================================================================
// SECTION: Cycles and Critical Path
// ============================================================================

#[test]
fn acyclic_graph_reports_no_cycles() {
    let spans = chain(&[("a", "b"), ("b", "c")]);
    let measures = analyze_graph(&build_graph(&spans, &[]));
    assert!(!measures.has_cycles);
}

#[test]
fn cycle_and_self_loop_are_reported() {
    let cyclic = chain(&[("a", "b"), ("b", "a")]);
    assert!(analyze_graph(&build_graph(&cyclic, &[])).has_cycles);

    let looped = chain(&[("a", "a")]);
    assert!(analyze_graph(&build_graph(&looped, &[])).has_cycles);
}

#[test]
fn critical_path_follows_longest_chain() {
    let spans = chain(&[("a", "b"), ("b", "c"), ("x", "c")]);
    let measures = analyze_graph(&build_graph(&spans, &[]));
    assert_eq!(measures.critical_path_hops, 2);
    assert_eq!(measures.critical_path, vec!["a", "b", "c"]);
}

#[test]
fn empty_graph_has_empty_measures() {
    let measures = analyze_graph(&build_graph(&[], &[]));
    assert!(measures.critical_path.is_empty());
    assert_eq!(measures.critical_path_hops, 0);
    assert!(!measures.has_cycles);
    assert!(measures.centrality.is_empty());
}

// ============================================================================
// SECTION: Centrality
// ============================================================================

#[test]
fn pass_through_node_has_highest_centrality() {
    let spans = chain(&[("a", "b"), ("b", "c"), ("x", "b"), ("b", "y")]);
    let measures = analyze_graph(&build_graph(&spans, &[]));
    let hub = measures.centrality["b"];
    for (name, value) in &measures.centrality {
        if name != "b" {
            assert!(hub > *value, "expected b to dominate {name}");
        }
    }
}

#[test]
fn endpoints_of_a_chain_have_zero_centrality() {
    let spans = chain(&[("a", "b"), ("b", "c")]);
    let measures = analyze_graph(&build_graph(&spans, &[]));
    assert!((measures.centrality["a"] - 0.0).abs() < f64::EPSILON);
    assert!((measures.centrality["c"] - 0.0).abs() < f64::EPSILON);
    assert!(measures.centrality["b"] > 0.0);
}
