// crates/archmap-cli/src/main.rs
// ============================================================================
// Module: Archmap CLI Entry Point
// Description: Command dispatcher for serving and offline span workflows.
// Purpose: Provide a safe CLI for running the server and bulk-loading spans.
// Dependencies: archmap-config, archmap-core, archmap-server,
//               archmap-store-sqlite, clap, serde_json, thiserror, tokio
// ============================================================================

//! ## Overview
//! The Archmap CLI runs the HTTP server, validates configuration files, and
//! bulk-loads span files into the store for offline analysis. Inputs are
//! untrusted: file sizes are capped and every span passes validation before
//! it reaches the store.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use archmap_config::ConfigError;
use archmap_core::Span;
use archmap_core::SpanStore;
use archmap_core::TenantId;
use archmap_server::AnalysisService;
use archmap_server::NoopMetrics;
use archmap_server::ServeError;
use archmap_server::serve;
use archmap_store_sqlite::SqliteSpanStore;
use archmap_store_sqlite::SqliteStoreError;
use clap::Parser;
use clap::Subcommand;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a span file accepted by `ingest-file`.
const MAX_SPAN_FILE_BYTES: u64 = 64 * 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI errors surfaced to the operator.
///
/// # Invariants
/// - Every variant renders a single actionable line.
#[derive(Debug, Error)]
enum CliError {
    /// Configuration loading or validation failed.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Store could not be opened or written.
    #[error("store error: {0}")]
    Store(#[from] SqliteStoreError),
    /// Server failed to start or crashed.
    #[error("serve error: {0}")]
    Serve(#[from] ServeError),
    /// Input file was unreadable, oversized, or malformed.
    #[error("input error: {0}")]
    Input(String),
}

// ============================================================================
// SECTION: Command Line
// ============================================================================

/// Archmap: architecture reconstruction from observability spans.
#[derive(Debug, Parser)]
#[command(name = "archmap", version, about)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Command to run.
    #[command(subcommand)]
    command: Command,
}

/// Supported commands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (ingest and read surface).
    Serve,
    /// Load and validate the configuration, then print a summary.
    CheckConfig,
    /// Bulk-load a JSON span file into the store for one tenant.
    IngestFile {
        /// Tenant the spans belong to.
        #[arg(long)]
        tenant: String,
        /// Path to a JSON array of spans.
        path: PathBuf,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve => run_serve(cli.config.as_deref()).await,
        Command::CheckConfig => run_check_config(cli.config.as_deref()),
        Command::IngestFile {
            tenant,
            path,
        } => run_ingest_file(cli.config.as_deref(), &tenant, &path),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(error = %error, "command failed");
            let _ = writeln!(std::io::stderr().lock(), "archmap: {error}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the tracing subscriber from `RUST_LOG` (default `info`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the HTTP server until shutdown.
async fn run_serve(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = archmap_config::load(config_path)?;
    let store = Arc::new(SqliteSpanStore::open(&config.store)?);
    let service = Arc::new(AnalysisService::new(store, config.clone()));
    serve(&config, service, Arc::new(NoopMetrics)).await?;
    Ok(())
}

/// Loads and validates the configuration, printing a short summary.
fn run_check_config(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = archmap_config::load(config_path)?;
    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "bind: {}", config.server.bind);
    let _ = writeln!(out, "store: {}", config.store.path.display());
    let _ = writeln!(out, "auth tokens: {}", config.server.auth.len());
    let _ = writeln!(out, "queue capacity: {}", config.ingest.queue_capacity);
    let _ = writeln!(out, "cache ttl ms: {}", config.analysis.cache_ttl_ms);
    let _ = writeln!(
        out,
        "thresholds: lat_max_ms={} depth_max={} err_max={} fanout_max={} in_max={}",
        config.analysis.thresholds.lat_max_ms,
        config.analysis.thresholds.depth_max,
        config.analysis.thresholds.err_max,
        config.analysis.thresholds.fanout_max,
        config.analysis.thresholds.in_max,
    );
    let _ = writeln!(out, "config ok");
    Ok(())
}

/// Bulk-loads a JSON span file into the store for one tenant.
fn run_ingest_file(
    config_path: Option<&Path>,
    tenant: &str,
    path: &Path,
) -> Result<(), CliError> {
    if tenant.trim().is_empty() {
        return Err(CliError::Input("tenant must be non-empty".to_string()));
    }
    let config = archmap_config::load(config_path)?;
    let spans = read_span_file(path)?;
    for (index, span) in spans.iter().enumerate() {
        span.validate().map_err(|error| {
            CliError::Input(format!("span at index {index} invalid: {error}"))
        })?;
    }

    let store = SqliteSpanStore::open(&config.store)?;
    let tenant_id = TenantId::new(tenant);
    let outcome = store
        .put_batch(&tenant_id, &spans)
        .map_err(|error| CliError::Input(error.to_string()))?;

    let mut out = std::io::stdout().lock();
    let _ = writeln!(out, "accepted: {}", outcome.accepted);
    for rejection in &outcome.rejected {
        let _ = writeln!(out, "rejected {}: {}", rejection.index, rejection.reason);
    }
    if outcome.rejected.is_empty() {
        Ok(())
    } else {
        Err(CliError::Input(format!("{} spans rejected", outcome.rejected.len())))
    }
}

/// Reads and parses a span file with a size cap.
fn read_span_file(path: &Path) -> Result<Vec<Span>, CliError> {
    let metadata = fs::metadata(path)
        .map_err(|error| CliError::Input(format!("{}: {error}", path.display())))?;
    if metadata.len() > MAX_SPAN_FILE_BYTES {
        return Err(CliError::Input(format!(
            "{} exceeds the {MAX_SPAN_FILE_BYTES} byte cap",
            path.display()
        )));
    }
    let text = fs::read_to_string(path)
        .map_err(|error| CliError::Input(format!("{}: {error}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|error| CliError::Input(format!("{}: {error}", path.display())))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod main_tests;
