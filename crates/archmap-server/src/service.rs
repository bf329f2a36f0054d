// crates/archmap-server/src/service.rs
// ============================================================================
// Module: Archmap Analysis Service
// Description: Long-lived service value behind every request handler.
// Purpose: Own the store handle, ingest queue, cache, and rate ceilings.
// Dependencies: archmap-config, archmap-core, tokio, serde_json
// ============================================================================

//! ## Overview
//! The analysis service is constructed once at startup and passed into
//! request handlers by reference; per-tenant state (queues, cache entries,
//! read budgets) lives inside keyed maps owned by this value, never in
//! process-wide mutable state. An analysis reads a private snapshot from the
//! store and computes everything downstream in memory; once the snapshot is
//! taken, computation does not reach back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use archmap_config::AppConfig;
use archmap_core::DiscoveryRecord;
use archmap_core::GraphMeasures;
use archmap_core::Span;
use archmap_core::SpanFilter;
use archmap_core::SpanId;
use archmap_core::SpanStore;
use archmap_core::SpanValidationError;
use archmap_core::StoreError;
use archmap_core::TenantId;
use archmap_core::Timestamp;
use archmap_core::analyze_graph;
use archmap_core::build_graph;
use archmap_core::interfaces::BatchRejection;
use archmap_core::reason::AnalysisState;
use archmap_core::run_analysis;

use crate::auth::TenantAuthenticator;
use crate::cache::AnalysisCache;
use crate::error::ApiError;
use crate::ingest::IngestQueue;

// ============================================================================
// SECTION: Analysis Documents
// ============================================================================

/// Everything one analysis run produces for the read surface.
///
/// # Invariants
/// - A pure function of (tenant, thresholds, snapshot content); documents
///   from one run are internally consistent.
#[derive(Debug)]
pub struct AnalysisDocs {
    /// Final reasoning state: graph, issues, categories, workflows.
    pub state: AnalysisState,
    /// Whole-graph structural measures for the analysis read.
    pub measures: GraphMeasures,
    /// Spans stored for the tenant at snapshot time.
    pub span_count: u64,
    /// When the analysis was computed.
    pub generated_at: Timestamp,
}

/// Batch ingest outcome with per-item granularity.
///
/// # Invariants
/// - `accepted + rejected.len()` equals the submitted batch length.
#[derive(Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct IngestBatchOutcome {
    /// Spans accepted into the ingest queue.
    pub accepted: u64,
    /// Per-item rejections with batch positions.
    pub rejected: Vec<BatchRejection>,
}

// ============================================================================
// SECTION: Read Budget
// ============================================================================

/// Per-tenant sliding-window read ceiling.
///
/// # Invariants
/// - A runaway tenant exhausts only its own budget.
struct ReadBudget {
    /// Reads allowed per tenant per minute.
    per_minute: u64,
    /// Window start and spent count per tenant.
    windows: Mutex<HashMap<TenantId, (Instant, u64)>>,
}

impl ReadBudget {
    /// Creates the budget with a per-minute allowance.
    fn new(per_minute: u64) -> Self {
        Self {
            per_minute,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Admits one read or rejects with a retryable error.
    fn admit(&self, tenant: &TenantId) -> Result<(), ApiError> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| ApiError::Internal("read budget registry poisoned".to_string()))?;
        let now = Instant::now();
        let entry = windows.entry(tenant.clone()).or_insert((now, 0));
        if now.duration_since(entry.0) >= Duration::from_secs(60) {
            *entry = (now, 0);
        }
        if entry.1 >= self.per_minute {
            return Err(ApiError::RateLimited);
        }
        entry.1 += 1;
        Ok(())
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Long-lived analysis service owning all per-tenant state.
pub struct AnalysisService {
    /// Span store handle.
    store: Arc<dyn SpanStore>,
    /// Validated application configuration.
    config: AppConfig,
    /// Token-to-tenant resolver.
    authenticator: TenantAuthenticator,
    /// Per-tenant analysis cache.
    cache: Arc<AnalysisCache<AnalysisDocs>>,
    /// Bounded ingest queue ahead of the store.
    queue: IngestQueue,
    /// Per-tenant read ceiling.
    read_budget: ReadBudget,
}

impl AnalysisService {
    /// Constructs the service from a store handle and validated config.
    #[must_use]
    pub fn new(store: Arc<dyn SpanStore>, config: AppConfig) -> Self {
        let cache = Arc::new(AnalysisCache::new(Duration::from_millis(
            config.analysis.cache_ttl_ms,
        )));
        let invalidation_cache = Arc::clone(&cache);
        let queue = IngestQueue::new(
            Arc::clone(&store),
            config.ingest.queue_capacity,
            Arc::new(move |tenant: &TenantId| invalidation_cache.invalidate(tenant)),
        );
        let authenticator = TenantAuthenticator::new(&config.server.auth);
        let read_budget = ReadBudget::new(config.server.rate_limit.reads_per_minute);
        Self {
            store,
            config,
            authenticator,
            cache,
            queue,
            read_budget,
        }
    }

    /// Returns the tenant authenticator.
    #[must_use]
    pub const fn authenticator(&self) -> &TenantAuthenticator {
        &self.authenticator
    }

    /// Resolves the effective read deadline for a request.
    ///
    /// Callers may lower the configured deadline, never raise it.
    #[must_use]
    pub fn read_deadline(&self, requested_ms: Option<u64>) -> Duration {
        let configured = self.config.server.read_deadline_ms;
        let effective = requested_ms.map_or(configured, |requested| {
            requested.clamp(1, configured)
        });
        Duration::from_millis(effective)
    }

    /// Returns the configured maximum batch length.
    #[must_use]
    pub const fn max_batch_len(&self) -> usize {
        self.config.server.max_batch_len
    }

    // ------------------------------------------------------------------
    // Ingest path
    // ------------------------------------------------------------------

    /// Validates and enqueues one span.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on constraint violations and
    /// [`ApiError::QueueSaturated`] when the tenant queue is full.
    pub fn ingest_span(&self, tenant: &TenantId, span: Span) -> Result<SpanId, ApiError> {
        self.validate_span(&span)?;
        let span_id = span.span_id.clone();
        self.queue.enqueue(tenant, span)?;
        // Accepted spans make any cached analysis stale immediately; the
        // write listener invalidates again once the row is queryable.
        self.cache.invalidate(tenant);
        Ok(span_id)
    }

    /// Validates and enqueues a batch with per-item outcomes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] when the batch exceeds the configured
    /// length cap; individual span failures land in the outcome.
    pub fn ingest_batch(
        &self,
        tenant: &TenantId,
        spans: Vec<Span>,
    ) -> Result<IngestBatchOutcome, ApiError> {
        if spans.len() > self.config.server.max_batch_len {
            return Err(ApiError::Validation(format!(
                "batch of {} spans exceeds cap of {}",
                spans.len(),
                self.config.server.max_batch_len
            )));
        }
        let mut outcome = IngestBatchOutcome::default();
        for (index, span) in spans.into_iter().enumerate() {
            let result = self
                .validate_span(&span)
                .and_then(|()| self.queue.enqueue(tenant, span));
            match result {
                Ok(()) => outcome.accepted += 1,
                Err(error) => outcome.rejected.push(BatchRejection {
                    index,
                    reason: error.to_string(),
                }),
            }
        }
        if outcome.accepted > 0 {
            self.cache.invalidate(tenant);
        }
        Ok(outcome)
    }

    /// Upserts a discovery record for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] on malformed records and store-mapped
    /// errors on write failure.
    pub async fn register_discovery(
        &self,
        tenant: &TenantId,
        record: DiscoveryRecord,
    ) -> Result<(), ApiError> {
        record
            .validate()
            .map_err(|error| ApiError::Validation(error.to_string()))?;
        let store = Arc::clone(&self.store);
        let write_tenant = tenant.clone();
        tokio::task::spawn_blocking(move || store.register_discovery(&write_tenant, &record))
            .await
            .map_err(|error| ApiError::Internal(error.to_string()))??;
        self.cache.invalidate(tenant);
        Ok(())
    }

    /// Validates span constraints and the payload byte cap.
    fn validate_span(&self, span: &Span) -> Result<(), ApiError> {
        span.validate().map_err(|error| ApiError::Validation(error.to_string()))?;
        let encoded = serde_json::to_vec(span)
            .map_err(|error| ApiError::Internal(error.to_string()))?;
        let cap = self.config.server.max_span_bytes;
        if encoded.len() > cap {
            let oversized = SpanValidationError::Oversized {
                max_bytes: cap,
                actual_bytes: encoded.len(),
            };
            return Err(ApiError::Validation(oversized.to_string()));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// Returns the tenant's analysis documents, computing them when no fresh
    /// cached value exists.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RateLimited`] when the tenant read budget is
    /// exhausted, [`ApiError::DeadlineExceeded`] when the deadline lapses
    /// (no partial results), and store-mapped errors on snapshot failure.
    pub async fn analysis(
        &self,
        tenant: &TenantId,
        deadline: Duration,
    ) -> Result<Arc<AnalysisDocs>, ApiError> {
        self.read_budget.admit(tenant)?;
        if let Some(docs) = self.cache.get(tenant) {
            return Ok(docs);
        }
        let docs = tokio::time::timeout(deadline, self.compute(tenant))
            .await
            .map_err(|_| ApiError::DeadlineExceeded)??;
        let docs = Arc::new(docs);
        self.cache.put(tenant, Arc::clone(&docs));
        Ok(docs)
    }

    /// Computes one analysis over a private snapshot.
    async fn compute(&self, tenant: &TenantId) -> Result<AnalysisDocs, ApiError> {
        let store = Arc::clone(&self.store);
        let snapshot_tenant = tenant.clone();
        let (spans, discovery, span_count) = tokio::task::spawn_blocking(move || {
            let spans = store.query(&snapshot_tenant, &SpanFilter::default())?;
            let discovery = store.discovery(&snapshot_tenant)?;
            let span_count = store.span_count(&snapshot_tenant)?;
            Ok::<_, StoreError>((spans, discovery, span_count))
        })
        .await
        .map_err(|error| ApiError::Internal(error.to_string()))??;

        let thresholds = self.config.thresholds_for(tenant.as_str());
        let graph = build_graph(&spans, &discovery);
        let measures = analyze_graph(&graph);
        let state = run_analysis(graph, thresholds);
        Ok(AnalysisDocs {
            state,
            measures,
            span_count,
            generated_at: now_timestamp(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current wall-clock time as a millisecond timestamp.
#[must_use]
pub fn now_timestamp() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
    Timestamp::from_unix_millis(millis)
}
