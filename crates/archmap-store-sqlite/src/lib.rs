// crates/archmap-store-sqlite/src/lib.rs
// ============================================================================
// Module: Archmap SQLite Store
// Description: Durable, tenant-partitioned span persistence.
// Purpose: Provide the SpanStore implementation behind the ingestion front.
// Dependencies: archmap-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! `archmap-store-sqlite` implements [`archmap_core::SpanStore`] on `SQLite`
//! with WAL journaling. Inserts are idempotent on `(tenant, span_id)`, batch
//! writes report per-span outcomes, and every query is tenant-partitioned.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod store;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use store::SqliteSpanStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
