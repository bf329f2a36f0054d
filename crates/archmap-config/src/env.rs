// crates/archmap-config/src/env.rs
// ============================================================================
// Module: Archmap Environment Overrides
// Description: ARCHMAP_* environment variables over the loaded configuration.
// Purpose: Let deployments override named constants without editing files.
// Dependencies: crate::model
// ============================================================================

//! ## Overview
//! Named constants (rule thresholds, store path, queue capacity, cache TTL,
//! bind address) can be overridden through `ARCHMAP_*` environment variables.
//! Overrides are applied through an injected lookup so tests never touch the
//! process environment. A present-but-unparsable value is an error, not a
//! silent fallback.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;

use crate::model::AppConfig;
use crate::model::ConfigError;

// ============================================================================
// SECTION: Variable Names
// ============================================================================

/// Edge latency ceiling override (milliseconds, float).
pub const ENV_LAT_MAX_MS: &str = "ARCHMAP_LAT_MAX_MS";
/// Error-rate ceiling override (float in [0, 1]).
pub const ENV_ERR_MAX: &str = "ARCHMAP_ERR_MAX";
/// Chain depth ceiling override (integer hops).
pub const ENV_DEPTH_MAX: &str = "ARCHMAP_DEPTH_MAX";
/// Fan-out ceiling override (integer).
pub const ENV_FANOUT_MAX: &str = "ARCHMAP_FANOUT_MAX";
/// In-degree ceiling override (integer).
pub const ENV_IN_MAX: &str = "ARCHMAP_IN_MAX";
/// Store path override.
pub const ENV_STORE_PATH: &str = "ARCHMAP_STORE_PATH";
/// Ingest queue capacity override (integer).
pub const ENV_QUEUE_CAPACITY: &str = "ARCHMAP_QUEUE_CAPACITY";
/// Analysis cache TTL override (milliseconds, integer).
pub const ENV_CACHE_TTL_MS: &str = "ARCHMAP_CACHE_TTL_MS";
/// Server bind address override.
pub const ENV_BIND: &str = "ARCHMAP_BIND";

// ============================================================================
// SECTION: Override Application
// ============================================================================

/// Applies environment overrides through the provided lookup.
///
/// # Errors
///
/// Returns [`ConfigError::EnvOverride`] when a present value fails to parse.
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(ENV_LAT_MAX_MS) {
        config.analysis.thresholds.lat_max_ms = parse_f64(ENV_LAT_MAX_MS, &value)?;
    }
    if let Some(value) = lookup(ENV_ERR_MAX) {
        config.analysis.thresholds.err_max = parse_f64(ENV_ERR_MAX, &value)?;
    }
    if let Some(value) = lookup(ENV_DEPTH_MAX) {
        config.analysis.thresholds.depth_max = parse_u64(ENV_DEPTH_MAX, &value)?;
    }
    if let Some(value) = lookup(ENV_FANOUT_MAX) {
        config.analysis.thresholds.fanout_max = parse_usize(ENV_FANOUT_MAX, &value)?;
    }
    if let Some(value) = lookup(ENV_IN_MAX) {
        config.analysis.thresholds.in_max = parse_usize(ENV_IN_MAX, &value)?;
    }
    if let Some(value) = lookup(ENV_STORE_PATH) {
        config.store.path = PathBuf::from(value);
    }
    if let Some(value) = lookup(ENV_QUEUE_CAPACITY) {
        config.ingest.queue_capacity = parse_usize(ENV_QUEUE_CAPACITY, &value)?;
    }
    if let Some(value) = lookup(ENV_CACHE_TTL_MS) {
        config.analysis.cache_ttl_ms = parse_u64(ENV_CACHE_TTL_MS, &value)?;
    }
    if let Some(value) = lookup(ENV_BIND) {
        config.server.bind = value;
    }
    Ok(())
}

/// Parses a float override.
fn parse_f64(name: &'static str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvOverride {
        name,
        message: format!("expected a number, got {value:?}"),
    })
}

/// Parses an unsigned integer override.
fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvOverride {
        name,
        message: format!("expected an unsigned integer, got {value:?}"),
    })
}

/// Parses an unsigned size override.
fn parse_usize(name: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::EnvOverride {
        name,
        message: format!("expected an unsigned integer, got {value:?}"),
    })
}
