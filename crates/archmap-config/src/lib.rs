// crates/archmap-config/src/lib.rs
// ============================================================================
// Module: Archmap Configuration
// Description: Configuration model, loading, overrides, and validation.
// Purpose: Construct the single validated configuration value at startup.
// Dependencies: archmap-core, archmap-store-sqlite, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! `archmap-config` defines the canonical configuration: server bind and
//! auth, span store settings, ingest queue capacity, rule thresholds with
//! per-tenant overrides, and the analysis cache TTL. Loading composes an
//! optional TOML file with `ARCHMAP_*` environment overrides and then
//! validates fail-closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod env;
pub mod model;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use env::apply_env_overrides;
pub use model::AnalysisConfig;
pub use model::AppConfig;
pub use model::AuthToken;
pub use model::ConfigError;
pub use model::IngestConfig;
pub use model::RateLimitConfig;
pub use model::ServerConfig;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

// ============================================================================
// SECTION: Loading
// ============================================================================

/// Loads configuration from an optional TOML file and process environment,
/// then validates it.
///
/// # Errors
///
/// Returns [`ConfigError`] when the file is unreadable or unparsable, an
/// override value fails to parse, or validation rejects the result.
pub fn load(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|error| {
                ConfigError::Io(format!("{}: {error}", path.display()))
            })?;
            AppConfig::from_toml(&text)?
        }
        None => AppConfig::default(),
    };
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    config.validate()?;
    Ok(config)
}
