// crates/archmap-config/src/model.rs
// ============================================================================
// Module: Archmap Configuration Model
// Description: Canonical configuration for server, store, ingest, analysis.
// Purpose: One validated source of truth constructed at startup.
// Dependencies: archmap-core, archmap-store-sqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! The configuration model is loaded once at startup from an optional TOML
//! file plus `ARCHMAP_*` environment overrides, then validated fail-closed.
//! Everything downstream receives the validated value by reference; there is
//! no process-wide mutable configuration state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;

use archmap_core::Thresholds;
use archmap_store_sqlite::SqliteStoreConfig;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default bind address for the HTTP server.
const DEFAULT_BIND: &str = "127.0.0.1:8350";
/// Default per-span payload cap in bytes.
const DEFAULT_MAX_SPAN_BYTES: usize = 16 * 1024;
/// Default maximum batch length.
const DEFAULT_MAX_BATCH_LEN: usize = 500;
/// Minimum batch length the contract requires deployments to accept.
const MIN_MAX_BATCH_LEN: usize = 100;
/// Default read deadline in milliseconds.
const DEFAULT_READ_DEADLINE_MS: u64 = 10_000;
/// Default per-tenant read budget per minute.
const DEFAULT_READS_PER_MINUTE: u64 = 600;
/// Default per-tenant ingest queue capacity.
const DEFAULT_QUEUE_CAPACITY: usize = 1_024;
/// Default analysis cache TTL in milliseconds.
const DEFAULT_CACHE_TTL_MS: u64 = 60_000;
/// Upper bound for the cache TTL; the contract caps it at minutes.
const MAX_CACHE_TTL_MS: u64 = 600_000;
/// Default store path.
const DEFAULT_STORE_PATH: &str = "archmap.db";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
///
/// # Invariants
/// - Validation fails closed: any violated constraint rejects the whole
///   configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("config io error: {0}")]
    Io(String),
    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A constraint was violated.
    #[error("invalid config: {0}")]
    Invalid(String),
    /// An environment override carried an unusable value.
    #[error("invalid environment override {name}: {message}")]
    EnvOverride {
        /// Environment variable name.
        name: &'static str,
        /// Failure description.
        message: String,
    },
}

// ============================================================================
// SECTION: Server Config
// ============================================================================

/// Tenant-bound bearer credential.
///
/// # Invariants
/// - `token` values are unique across the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    /// Bearer token presented by the caller.
    pub token: String,
    /// Tenant the token is bound to.
    pub tenant: String,
}

/// Per-tenant read rate ceiling.
///
/// # Invariants
/// - `reads_per_minute` is greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Read operations allowed per tenant per minute.
    pub reads_per_minute: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            reads_per_minute: DEFAULT_READS_PER_MINUTE,
        }
    }
}

/// HTTP server configuration.
///
/// # Invariants
/// - A non-loopback bind address requires at least one auth token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address, `host:port`.
    pub bind: String,
    /// Tenant-bound bearer tokens.
    pub auth: Vec<AuthToken>,
    /// Per-span payload cap in bytes.
    pub max_span_bytes: usize,
    /// Maximum accepted batch length.
    pub max_batch_len: usize,
    /// Default read deadline in milliseconds; callers may request less.
    pub read_deadline_ms: u64,
    /// Per-tenant read rate ceiling.
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            auth: Vec::new(),
            max_span_bytes: DEFAULT_MAX_SPAN_BYTES,
            max_batch_len: DEFAULT_MAX_BATCH_LEN,
            read_deadline_ms: DEFAULT_READ_DEADLINE_MS,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

// ============================================================================
// SECTION: Ingest and Analysis Config
// ============================================================================

/// Ingestion queue configuration.
///
/// # Invariants
/// - `queue_capacity` is greater than zero; overflow sheds new spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Bounded per-tenant ingest queue capacity.
    pub queue_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Analysis configuration: thresholds and caching.
///
/// # Invariants
/// - `cache_ttl_ms` is bounded; cached reads are also invalidated on ingest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Default rule thresholds.
    pub thresholds: Thresholds,
    /// Per-tenant threshold overrides keyed by tenant identifier.
    pub tenant_thresholds: BTreeMap<String, Thresholds>,
    /// Analysis cache TTL in milliseconds.
    pub cache_ttl_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            tenant_thresholds: BTreeMap::new(),
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
        }
    }
}

// ============================================================================
// SECTION: Application Config
// ============================================================================

/// Root configuration value.
///
/// # Invariants
/// - `validate` must pass before the configuration is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Span store settings.
    pub store: SqliteStoreConfig,
    /// Ingestion queue settings.
    pub ingest: IngestConfig,
    /// Analysis thresholds and caching.
    pub analysis: AnalysisConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            store: SqliteStoreConfig::for_path(PathBuf::from(DEFAULT_STORE_PATH)),
            ingest: IngestConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the document is malformed.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|error| ConfigError::Parse(error.to_string()))
    }

    /// Returns the thresholds applying to a tenant.
    #[must_use]
    pub fn thresholds_for(&self, tenant: &str) -> Thresholds {
        self.analysis
            .tenant_thresholds
            .get(tenant)
            .copied()
            .unwrap_or(self.analysis.thresholds)
    }

    /// Validates the whole configuration, failing closed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bind: SocketAddr = self
            .server
            .bind
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("bind address unparsable: {}", self.server.bind)))?;
        if !bind.ip().is_loopback() && self.server.auth.is_empty() {
            return Err(ConfigError::Invalid(
                "non-loopback bind disallowed without auth tokens".to_string(),
            ));
        }
        validate_auth_tokens(&self.server.auth)?;
        if self.server.max_span_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_span_bytes must be greater than zero".to_string(),
            ));
        }
        if self.server.max_batch_len < MIN_MAX_BATCH_LEN {
            return Err(ConfigError::Invalid(format!(
                "server.max_batch_len must be at least {MIN_MAX_BATCH_LEN}"
            )));
        }
        if self.server.read_deadline_ms == 0 {
            return Err(ConfigError::Invalid(
                "server.read_deadline_ms must be greater than zero".to_string(),
            ));
        }
        if self.server.rate_limit.reads_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "server.rate_limit.reads_per_minute must be greater than zero".to_string(),
            ));
        }
        if self.ingest.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "ingest.queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.analysis.cache_ttl_ms == 0 || self.analysis.cache_ttl_ms > MAX_CACHE_TTL_MS {
            return Err(ConfigError::Invalid(format!(
                "analysis.cache_ttl_ms must be in 1..={MAX_CACHE_TTL_MS}"
            )));
        }
        validate_thresholds("analysis.thresholds", &self.analysis.thresholds)?;
        for (tenant, thresholds) in &self.analysis.tenant_thresholds {
            if tenant.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "analysis.tenant_thresholds key must be non-empty".to_string(),
                ));
            }
            validate_thresholds(&format!("analysis.tenant_thresholds.{tenant}"), thresholds)?;
        }
        Ok(())
    }
}

/// Validates auth token shape and uniqueness.
fn validate_auth_tokens(tokens: &[AuthToken]) -> Result<(), ConfigError> {
    let mut seen = std::collections::BTreeSet::new();
    for auth in tokens {
        if auth.token.trim().is_empty() {
            return Err(ConfigError::Invalid("server.auth token must be non-empty".to_string()));
        }
        if auth.tenant.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "server.auth tenant must be non-empty".to_string(),
            ));
        }
        if !seen.insert(auth.token.as_str()) {
            return Err(ConfigError::Invalid("server.auth tokens must be unique".to_string()));
        }
    }
    Ok(())
}

/// Validates one threshold set.
fn validate_thresholds(context: &str, thresholds: &Thresholds) -> Result<(), ConfigError> {
    if !thresholds.lat_max_ms.is_finite() || thresholds.lat_max_ms <= 0.0 {
        return Err(ConfigError::Invalid(format!(
            "{context}.lat_max_ms must be a positive finite number"
        )));
    }
    if !thresholds.err_max.is_finite() || !(0.0..=1.0).contains(&thresholds.err_max) {
        return Err(ConfigError::Invalid(format!("{context}.err_max must be within [0, 1]")));
    }
    if thresholds.depth_max == 0 {
        return Err(ConfigError::Invalid(format!(
            "{context}.depth_max must be greater than zero"
        )));
    }
    if thresholds.fanout_max == 0 {
        return Err(ConfigError::Invalid(format!(
            "{context}.fanout_max must be greater than zero"
        )));
    }
    if thresholds.in_max == 0 {
        return Err(ConfigError::Invalid(format!(
            "{context}.in_max must be greater than zero"
        )));
    }
    Ok(())
}
