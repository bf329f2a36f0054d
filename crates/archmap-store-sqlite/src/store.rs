// crates/archmap-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Span Store
// Description: Durable SpanStore backed by SQLite WAL.
// Purpose: Persist spans idempotently with tenant-partitioned indexes.
// Dependencies: archmap-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`SpanStore`] using `SQLite`. Spans are
//! append-only rows keyed `(tenant_id, span_id)`; inserting a duplicate
//! identifier succeeds without writing. Queries run over the two
//! tenant-partitioned indexes `(tenant_id, trace_id, start_ms)` and
//! `(tenant_id, service_name, start_ms)`.
//!
//! Security posture: database contents are untrusted on load; rows that fail
//! to decode surface as corruption errors rather than panics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use archmap_core::DiscoveryRecord;
use archmap_core::Span;
use archmap_core::SpanFilter;
use archmap_core::SpanId;
use archmap_core::SpanKind;
use archmap_core::SpanStore;
use archmap_core::StoreError;
use archmap_core::TenantId;
use archmap_core::Timestamp;
use archmap_core::TraceId;
use archmap_core::interfaces::BatchOutcome;
use archmap_core::interfaces::BatchRejection;
use archmap_core::interfaces::PutOutcome;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::params;
use rusqlite::types::ToSql;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` span store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a configuration with defaults for the given database path.
    #[must_use]
    pub fn for_path(path: PathBuf) -> Self {
        Self {
            path,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw span payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or undecodable row.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or configuration.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Db(error.to_string())
    }
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Unavailable(message),
            SqliteStoreError::Db(message) => Self::Internal(message),
            SqliteStoreError::Corrupt(message) | SqliteStoreError::VersionMismatch(message) => {
                Self::Corrupt(message)
            }
            SqliteStoreError::Invalid(message) => Self::Rejected(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed span store with WAL support.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex, which makes
///   concurrent `put` operations serialisable at per-span granularity.
/// - Inserts are idempotent on `(tenant_id, span_id)`.
#[derive(Clone)]
pub struct SqliteSpanStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteSpanStore {
    /// Opens (or creates) the store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is unsafe, the database
    /// cannot be opened, or the stored schema version is incompatible.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        let connection = Connection::open(&config.path)
            .map_err(|error| SqliteStoreError::Io(error.to_string()))?;
        apply_pragmas(&connection, config)?;
        initialize_schema(&connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs a closure with the locked connection.
    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("connection mutex poisoned".to_string()))?;
        operation(&guard)
    }

    /// Inserts one span inside an already-locked connection.
    fn insert_span(
        connection: &Connection,
        tenant_id: &TenantId,
        span: &Span,
    ) -> Result<PutOutcome, SqliteStoreError> {
        let changed = connection.execute(
            "INSERT OR IGNORE INTO spans (
                tenant_id, span_id, trace_id, parent_span_id, service_name,
                operation, kind, start_ms, end_ms, latency_ms, status_code,
                error, downstream
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                tenant_id.as_str(),
                span.span_id.as_str(),
                span.trace_id.as_str(),
                span.parent_span_id.as_ref().map(SpanId::as_str),
                span.service_name,
                span.operation,
                span.kind.as_str(),
                span.start_time.as_unix_millis(),
                span.end_time.as_unix_millis(),
                span.latency_ms,
                span.status_code,
                span.error,
                span.downstream,
            ],
        )?;
        if changed == 0 {
            Ok(PutOutcome::Duplicate)
        } else {
            Ok(PutOutcome::Inserted)
        }
    }
}

impl SpanStore for SqliteSpanStore {
    fn put(&self, tenant_id: &TenantId, span: &Span) -> Result<PutOutcome, StoreError> {
        self.with_connection(|connection| Self::insert_span(connection, tenant_id, span))
            .map_err(StoreError::from)
    }

    fn put_batch(
        &self,
        tenant_id: &TenantId,
        spans: &[Span],
    ) -> Result<BatchOutcome, StoreError> {
        self.with_connection(|connection| {
            let mut outcome = BatchOutcome::default();
            for (index, span) in spans.iter().enumerate() {
                // A failure is fatal to the specific span only.
                match Self::insert_span(connection, tenant_id, span) {
                    Ok(_) => outcome.accepted += 1,
                    Err(error) => outcome.rejected.push(BatchRejection {
                        index,
                        reason: error.to_string(),
                    }),
                }
            }
            Ok(outcome)
        })
        .map_err(StoreError::from)
    }

    fn query(&self, tenant_id: &TenantId, filter: &SpanFilter) -> Result<Vec<Span>, StoreError> {
        self.with_connection(|connection| {
            let (sql, parameters) = build_query(tenant_id, filter);
            let mut statement = connection.prepare(&sql)?;
            let rows = statement.query_map(
                rusqlite::params_from_iter(parameters.iter().map(|parameter| parameter.as_ref())),
                decode_span_row,
            )?;
            let mut spans = Vec::new();
            for row in rows {
                spans.push(row?.ok_or_else(|| {
                    SqliteStoreError::Corrupt("span row with unknown kind".to_string())
                })?);
            }
            Ok(spans)
        })
        .map_err(StoreError::from)
    }

    fn span_count(&self, tenant_id: &TenantId) -> Result<u64, StoreError> {
        self.with_connection(|connection| {
            let count: i64 = connection.query_row(
                "SELECT COUNT(*) FROM spans WHERE tenant_id = ?1",
                params![tenant_id.as_str()],
                |row| row.get(0),
            )?;
            u64::try_from(count)
                .map_err(|_| SqliteStoreError::Corrupt("negative span count".to_string()))
        })
        .map_err(StoreError::from)
    }

    fn register_discovery(
        &self,
        tenant_id: &TenantId,
        record: &DiscoveryRecord,
    ) -> Result<(), StoreError> {
        self.with_connection(|connection| {
            connection.execute(
                "INSERT INTO discovery (tenant_id, service_name, declared_kind, description)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (tenant_id, service_name) DO UPDATE SET
                    declared_kind = excluded.declared_kind,
                    description = excluded.description",
                params![
                    tenant_id.as_str(),
                    record.service_name,
                    record.declared_kind,
                    record.description,
                ],
            )?;
            Ok(())
        })
        .map_err(StoreError::from)
    }

    fn discovery(&self, tenant_id: &TenantId) -> Result<Vec<DiscoveryRecord>, StoreError> {
        self.with_connection(|connection| {
            let mut statement = connection.prepare(
                "SELECT service_name, declared_kind, description
                 FROM discovery WHERE tenant_id = ?1 ORDER BY service_name",
            )?;
            let rows = statement.query_map(params![tenant_id.as_str()], |row| {
                Ok(DiscoveryRecord {
                    service_name: row.get(0)?,
                    declared_kind: row.get(1)?,
                    description: row.get(2)?,
                })
            })?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok(records)
        })
        .map_err(StoreError::from)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.with_connection(|connection| {
            let _: i64 = connection.query_row("SELECT 1", [], |row| row.get(0))?;
            Ok(())
        })
        .map_err(StoreError::from)
    }
}

// ============================================================================
// SECTION: Schema
// ============================================================================

/// Applies connection pragmas from the configuration.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    let busy_timeout_ms = i64::try_from(config.busy_timeout_ms).unwrap_or(i64::MAX);
    connection.pragma_update(None, "busy_timeout", busy_timeout_ms)?;
    connection.pragma_update(None, "journal_mode", config.journal_mode.pragma_value())?;
    connection.pragma_update(None, "synchronous", config.sync_mode.pragma_value())?;
    connection.pragma_update(None, "foreign_keys", "on")?;
    Ok(())
}

/// Creates tables and indexes, enforcing the schema version.
fn initialize_schema(connection: &Connection) -> Result<(), SqliteStoreError> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
         );
         CREATE TABLE IF NOT EXISTS spans (
            tenant_id TEXT NOT NULL,
            span_id TEXT NOT NULL,
            trace_id TEXT NOT NULL,
            parent_span_id TEXT,
            service_name TEXT NOT NULL,
            operation TEXT NOT NULL,
            kind TEXT NOT NULL,
            start_ms INTEGER NOT NULL,
            end_ms INTEGER NOT NULL,
            latency_ms REAL NOT NULL,
            status_code INTEGER,
            error TEXT,
            downstream TEXT,
            PRIMARY KEY (tenant_id, span_id)
         );
         CREATE INDEX IF NOT EXISTS idx_spans_tenant_trace_start
            ON spans (tenant_id, trace_id, start_ms);
         CREATE INDEX IF NOT EXISTS idx_spans_tenant_service_start
            ON spans (tenant_id, service_name, start_ms);
         CREATE TABLE IF NOT EXISTS discovery (
            tenant_id TEXT NOT NULL,
            service_name TEXT NOT NULL,
            declared_kind TEXT NOT NULL,
            description TEXT,
            PRIMARY KEY (tenant_id, service_name)
         );",
    )?;

    let stored: Option<String> = connection
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match stored {
        Some(value) if value == SCHEMA_VERSION.to_string() => Ok(()),
        Some(value) => Err(SqliteStoreError::VersionMismatch(format!(
            "stored schema version {value}, expected {SCHEMA_VERSION}"
        ))),
        None => {
            connection.execute(
                "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
                params![SCHEMA_VERSION.to_string()],
            )?;
            Ok(())
        }
    }
}

// ============================================================================
// SECTION: Query Building
// ============================================================================

/// Builds the filtered query and its positional parameters.
fn build_query(tenant_id: &TenantId, filter: &SpanFilter) -> (String, Vec<Box<dyn ToSql>>) {
    let mut sql = String::from(
        "SELECT trace_id, span_id, parent_span_id, service_name, operation, kind,
                start_ms, end_ms, latency_ms, status_code, error, downstream
         FROM spans WHERE tenant_id = ?",
    );
    let mut parameters: Vec<Box<dyn ToSql>> = vec![Box::new(tenant_id.as_str().to_string())];
    if let Some(start_after) = filter.start_after {
        sql.push_str(" AND start_ms >= ?");
        parameters.push(Box::new(start_after.as_unix_millis()));
    }
    if let Some(start_before) = filter.start_before {
        sql.push_str(" AND start_ms <= ?");
        parameters.push(Box::new(start_before.as_unix_millis()));
    }
    if let Some(service_name) = &filter.service_name {
        sql.push_str(" AND service_name = ?");
        parameters.push(Box::new(service_name.clone()));
    }
    if let Some(trace_id) = &filter.trace_id {
        sql.push_str(" AND trace_id = ?");
        parameters.push(Box::new(trace_id.as_str().to_string()));
    }
    if let Some(downstream) = &filter.downstream {
        sql.push_str(" AND downstream = ?");
        parameters.push(Box::new(downstream.clone()));
    }
    if filter.has_downstream {
        sql.push_str(" AND downstream IS NOT NULL");
    }
    sql.push_str(" ORDER BY start_ms, span_id");
    (sql, parameters)
}

/// Decodes one span row; `None` marks an unknown kind label.
fn decode_span_row(row: &Row<'_>) -> Result<Option<Span>, rusqlite::Error> {
    let kind_label: String = row.get(5)?;
    let Some(kind) = parse_kind(&kind_label) else {
        return Ok(None);
    };
    let trace_id: String = row.get(0)?;
    let span_id: String = row.get(1)?;
    let parent: Option<String> = row.get(2)?;
    Ok(Some(Span {
        trace_id: TraceId::new(trace_id),
        span_id: SpanId::new(span_id),
        parent_span_id: parent.map(SpanId::new),
        service_name: row.get(3)?,
        operation: row.get(4)?,
        kind,
        start_time: Timestamp::from_unix_millis(row.get(6)?),
        end_time: Timestamp::from_unix_millis(row.get(7)?),
        latency_ms: row.get(8)?,
        status_code: row.get(9)?,
        error: row.get(10)?,
        downstream: row.get(11)?,
    }))
}

/// Parses a stored span kind label.
fn parse_kind(label: &str) -> Option<SpanKind> {
    match label {
        "server" => Some(SpanKind::Server),
        "client" => Some(SpanKind::Client),
        "internal" => Some(SpanKind::Internal),
        _ => None,
    }
}

// ============================================================================
// SECTION: Path Safety
// ============================================================================

/// Validates the database path before opening.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let rendered = path.to_string_lossy();
    if rendered.trim().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must be non-empty".to_string()));
    }
    if rendered.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid(format!(
            "store path exceeds {MAX_TOTAL_PATH_LENGTH} characters"
        )));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(format!(
                "store path component exceeds {MAX_PATH_COMPONENT_LENGTH} characters"
            )));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path resolves to a directory".to_string(),
        ));
    }
    Ok(())
}
