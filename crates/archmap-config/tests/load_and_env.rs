// crates/archmap-config/tests/load_and_env.rs
// ============================================================================
// Module: Config Load and Override Tests
// Description: TOML parsing and environment override application.
// Purpose: Validate the composition order file -> env -> validate.
// ============================================================================

//! Loading and override tests for archmap-config.

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

use std::collections::BTreeMap;
use std::path::PathBuf;

use archmap_config::AppConfig;
use archmap_config::ConfigError;
use archmap_config::apply_env_overrides;
use archmap_config::env::ENV_CACHE_TTL_MS;
use archmap_config::env::ENV_DEPTH_MAX;
use archmap_config::env::ENV_ERR_MAX;
use archmap_config::env::ENV_LAT_MAX_MS;
use archmap_config::env::ENV_QUEUE_CAPACITY;
use archmap_config::env::ENV_STORE_PATH;

mod common;

// ============================================================================
// SECTION: TOML Parsing
// ============================================================================

#[test]
fn full_document_parses_and_validates() {
    let text = r#"
        [server]
        bind = "127.0.0.1:9000"
        max_span_bytes = 8192
        max_batch_len = 250
        read_deadline_ms = 5000

        [[server.auth]]
        token = "token-acme"
        tenant = "acme"

        [server.rate_limit]
        reads_per_minute = 120

        [store]
        path = "/tmp/archmap-test.db"
        busy_timeout_ms = 2500
        journal_mode = "wal"
        sync_mode = "normal"

        [ingest]
        queue_capacity = 64

        [analysis]
        cache_ttl_ms = 30000

        [analysis.thresholds]
        lat_max_ms = 750.0
        depth_max = 4
        err_max = 0.01
        fanout_max = 8
        in_max = 3

        [analysis.tenant_thresholds.globex]
        lat_max_ms = 2000.0
        depth_max = 5
        err_max = 0.05
        fanout_max = 10
        in_max = 5
    "#;
    let config = AppConfig::from_toml(text).expect("parse");
    config.validate().expect("validate");
    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.server.max_batch_len, 250);
    assert_eq!(config.store.path, PathBuf::from("/tmp/archmap-test.db"));
    assert_eq!(config.ingest.queue_capacity, 64);
    assert!((config.analysis.thresholds.lat_max_ms - 750.0).abs() < f64::EPSILON);
    assert!((config.thresholds_for("globex").lat_max_ms - 2_000.0).abs() < f64::EPSILON);
}

#[test]
fn empty_document_yields_defaults() {
    let config = AppConfig::from_toml("").expect("parse");
    config.validate().expect("validate");
    assert_eq!(config.server.bind, "127.0.0.1:8350");
    assert_eq!(config.server.max_batch_len, 500);
    assert_eq!(config.analysis.cache_ttl_ms, 60_000);
    assert!((config.analysis.thresholds.lat_max_ms - 1_000.0).abs() < f64::EPSILON);
    assert_eq!(config.analysis.thresholds.depth_max, 5);
    assert!((config.analysis.thresholds.err_max - 0.05).abs() < f64::EPSILON);
    assert_eq!(config.analysis.thresholds.fanout_max, 10);
    assert_eq!(config.analysis.thresholds.in_max, 5);
}

#[test]
fn malformed_document_is_a_parse_error() {
    let result = AppConfig::from_toml("server = \"not a table\"");
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

// ============================================================================
// SECTION: Environment Overrides
// ============================================================================

#[test]
fn overrides_replace_named_constants() {
    let mut env = BTreeMap::new();
    env.insert(ENV_LAT_MAX_MS, "400.5".to_string());
    env.insert(ENV_ERR_MAX, "0.2".to_string());
    env.insert(ENV_DEPTH_MAX, "9".to_string());
    env.insert(ENV_QUEUE_CAPACITY, "32".to_string());
    env.insert(ENV_CACHE_TTL_MS, "15000".to_string());
    env.insert(ENV_STORE_PATH, "/tmp/override.db".to_string());

    let mut config = common::minimal_config();
    apply_env_overrides(&mut config, |name| env.get(name).cloned()).expect("apply");

    assert!((config.analysis.thresholds.lat_max_ms - 400.5).abs() < f64::EPSILON);
    assert!((config.analysis.thresholds.err_max - 0.2).abs() < f64::EPSILON);
    assert_eq!(config.analysis.thresholds.depth_max, 9);
    assert_eq!(config.ingest.queue_capacity, 32);
    assert_eq!(config.analysis.cache_ttl_ms, 15_000);
    assert_eq!(config.store.path, PathBuf::from("/tmp/override.db"));
    config.validate().expect("still valid");
}

#[test]
fn absent_variables_leave_the_config_untouched() {
    let mut config = common::minimal_config();
    let before = config.clone();
    apply_env_overrides(&mut config, |_| None).expect("apply");
    assert_eq!(config.server, before.server);
    assert_eq!(config.analysis, before.analysis);
    assert_eq!(config.ingest, before.ingest);
}

#[test]
fn unparsable_override_is_an_error() {
    let mut config = common::minimal_config();
    let result = apply_env_overrides(&mut config, |name| {
        (name == ENV_DEPTH_MAX).then(|| "not-a-number".to_string())
    });
    assert!(matches!(result, Err(ConfigError::EnvOverride { name, .. }) if name == ENV_DEPTH_MAX));
}
