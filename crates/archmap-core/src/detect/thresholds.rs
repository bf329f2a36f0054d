// crates/archmap-core/src/detect/thresholds.rs
// ============================================================================
// Module: Archmap Detection Thresholds
// Description: Named rule thresholds with documented defaults.
// Purpose: Make rule boundaries explicit, configurable, and serializable.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every detection rule compares against a named threshold with a strict
//! greater-than test: a value exactly at the threshold does not trigger.
//! Defaults match the documented contract; deployments override them per
//! tenant through configuration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default edge latency ceiling in milliseconds.
pub const DEFAULT_LAT_MAX_MS: f64 = 1_000.0;
/// Default call-chain depth ceiling in hops.
pub const DEFAULT_DEPTH_MAX: u64 = 5;
/// Default node error-rate ceiling.
pub const DEFAULT_ERR_MAX: f64 = 0.05;
/// Default out-degree ceiling.
pub const DEFAULT_FANOUT_MAX: usize = 10;
/// Default in-degree ceiling.
pub const DEFAULT_IN_MAX: usize = 5;

// ============================================================================
// SECTION: Thresholds
// ============================================================================

/// Rule thresholds for one detection run.
///
/// # Invariants
/// - Every rule applies its threshold with strict `>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Edge mean-latency ceiling in milliseconds (`LAT_MAX`).
    pub lat_max_ms: f64,
    /// Call-chain depth ceiling in hops (`DEPTH_MAX`).
    pub depth_max: u64,
    /// Node error-rate ceiling (`ERR_MAX`).
    pub err_max: f64,
    /// Node out-degree ceiling (`FANOUT_MAX`).
    pub fanout_max: usize,
    /// Node in-degree ceiling (`IN_MAX`).
    pub in_max: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            lat_max_ms: DEFAULT_LAT_MAX_MS,
            depth_max: DEFAULT_DEPTH_MAX,
            err_max: DEFAULT_ERR_MAX,
            fanout_max: DEFAULT_FANOUT_MAX,
            in_max: DEFAULT_IN_MAX,
        }
    }
}
