// crates/archmap-server/src/server.rs
// ============================================================================
// Module: Archmap HTTP Server
// Description: Bind-and-serve entry points for the application router.
// Purpose: Run the read surface and ingestion front over a TCP listener.
// Dependencies: archmap-config, axum, axum-server, thiserror
// ============================================================================

//! ## Overview
//! The server binds the configured address and serves the application router
//! until shutdown. Tests and embedding hosts can serve over a pre-bound
//! listener instead, which is how ephemeral-port setups obtain their address.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::net::TcpListener;
use std::sync::Arc;

use archmap_config::AppConfig;
use thiserror::Error;

use crate::routes::router;
use crate::service::AnalysisService;
use crate::telemetry::ServerMetrics;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup and runtime errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Bind address failed to parse.
    #[error("invalid bind address: {0}")]
    InvalidBind(String),
    /// Listener or serve loop I/O failure.
    #[error("server io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Serving
// ============================================================================

/// Binds the configured address and serves until shutdown.
///
/// # Errors
///
/// Returns [`ServeError`] when the bind address is invalid or the serve loop
/// fails.
pub async fn serve(
    config: &AppConfig,
    service: Arc<AnalysisService>,
    metrics: Arc<dyn ServerMetrics>,
) -> Result<(), ServeError> {
    let address: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|_| ServeError::InvalidBind(config.server.bind.clone()))?;
    tracing::info!(%address, "archmap server listening");
    axum_server::bind(address)
        .serve(router(service, metrics).into_make_service())
        .await
        .map_err(|error| ServeError::Io(error.to_string()))
}

/// Serves over a pre-bound listener (ephemeral-port test setups).
///
/// # Errors
///
/// Returns [`ServeError::Io`] when the serve loop fails.
pub async fn serve_on(
    listener: TcpListener,
    service: Arc<AnalysisService>,
    metrics: Arc<dyn ServerMetrics>,
) -> Result<(), ServeError> {
    listener
        .set_nonblocking(true)
        .map_err(|error| ServeError::Io(error.to_string()))?;
    axum_server::from_tcp(listener)
        .map_err(|error| ServeError::Io(error.to_string()))?
        .serve(router(service, metrics).into_make_service())
        .await
        .map_err(|error| ServeError::Io(error.to_string()))
}
