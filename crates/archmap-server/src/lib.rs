// crates/archmap-server/src/lib.rs
// ============================================================================
// Module: Archmap Server
// Description: Ingestion front and read surface over the analysis core.
// Purpose: Serve tenant-scoped ingest and analysis operations over HTTP.
// Dependencies: archmap-config, archmap-core, axum, axum-server, tokio, tracing
// ============================================================================

//! ## Overview
//! `archmap-server` hosts the two external surfaces of the system: the
//! ingestion front (span validation, bounded per-tenant queueing, durable
//! writes) and the read surface (architecture, issues, workflows, comparison,
//! graph analysis). Every operation except the liveness check is scoped to
//! the tenant bound to the caller's credential; reads are side-effect free
//! and honour caller deadlines without returning partial results.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod auth;
pub mod cache;
pub mod error;
pub mod ingest;
pub mod routes;
pub mod server;
pub mod service;
pub mod telemetry;
#[cfg(test)]
mod tests;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use auth::TENANT_HEADER;
pub use auth::TenantAuthenticator;
pub use error::ApiError;
pub use routes::DEADLINE_HEADER;
pub use routes::router;
pub use server::ServeError;
pub use server::serve;
pub use server::serve_on;
pub use service::AnalysisDocs;
pub use service::AnalysisService;
pub use telemetry::NoopMetrics;
pub use telemetry::ServerMetrics;
