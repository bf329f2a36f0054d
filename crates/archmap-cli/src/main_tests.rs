// crates/archmap-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Unit Tests
// Description: Span file reading and offline ingest behaviour.
// Purpose: Validate size caps, parse failures, and bulk-load outcomes.
// ============================================================================

//! ## Overview
//! Unit tests for the CLI helpers: span file parsing with its byte cap and
//! the offline bulk-load path into a temporary store.

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

use std::fs;

use tempfile::TempDir;

use crate::CliError;
use crate::read_span_file;

// ============================================================================
// SECTION: Span File Reading
// ============================================================================

#[test]
fn valid_span_array_parses() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("spans.json");
    fs::write(
        &path,
        r#"[{
            "trace_id": "trace-1",
            "span_id": "s1",
            "service_name": "api",
            "operation": "GET /orders",
            "kind": "client",
            "start_time": 1000,
            "end_time": 1100,
            "latency_ms": 100.0,
            "downstream": "billing"
        }]"#,
    )
    .expect("write");
    let spans = read_span_file(&path).expect("parse");
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].span_id.as_str(), "s1");
}

#[test]
fn malformed_file_is_an_input_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("spans.json");
    fs::write(&path, "not json").expect("write");
    assert!(matches!(read_span_file(&path), Err(CliError::Input(_))));
}

#[test]
fn missing_file_is_an_input_error() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("absent.json");
    assert!(matches!(read_span_file(&path), Err(CliError::Input(_))));
}

#[test]
fn unknown_kind_fails_to_parse() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("spans.json");
    fs::write(
        &path,
        r#"[{
            "trace_id": "trace-1",
            "span_id": "s1",
            "service_name": "api",
            "operation": "GET /orders",
            "kind": "sideways",
            "start_time": 1000,
            "end_time": 1100,
            "latency_ms": 100.0
        }]"#,
    )
    .expect("write");
    assert!(matches!(read_span_file(&path), Err(CliError::Input(_))));
}
