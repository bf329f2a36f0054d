// crates/archmap-server/src/tests.rs
// ============================================================================
// Module: Server Unit Tests
// Description: Auth, validation, queue shedding, caching, and rate limits.
// Purpose: Exercise the service layer against an in-memory span store.
// ============================================================================

//! ## Overview
//! Unit tests for the service layer:
//! - Tenant authentication fails closed
//! - Span validation rejects malformed payloads and oversized bodies
//! - The bounded ingest queue sheds the newest span when full
//! - Analysis results are cached per tenant and invalidated on ingest
//! - The per-tenant read budget rejects with a retryable error

#![allow(
    clippy::cast_possible_truncation,
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use archmap_config::AppConfig;
use archmap_config::AuthToken;
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
use axum::http::HeaderMap;
use axum::http::HeaderValue;

use crate::auth::TENANT_HEADER;
use crate::auth::TenantAuthenticator;
use crate::error::ApiError;
use crate::service::AnalysisService;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Keyed in-memory store used to exercise the service layer.
#[derive(Default)]
struct MemorySpanStore {
    /// Spans keyed by tenant and span identifier.
    spans: Mutex<HashMap<(String, String), Span>>,
    /// Discovery records keyed by tenant and service name.
    discovery: Mutex<BTreeMap<(String, String), DiscoveryRecord>>,
}

impl SpanStore for MemorySpanStore {
    fn put(&self, tenant_id: &TenantId, span: &Span) -> Result<PutOutcome, StoreError> {
        let key = (tenant_id.as_str().to_string(), span.span_id.as_str().to_string());
        let mut spans = self.spans.lock().expect("lock");
        if spans.contains_key(&key) {
            return Ok(PutOutcome::Duplicate);
        }
        spans.insert(key, span.clone());
        Ok(PutOutcome::Inserted)
    }

    fn put_batch(
        &self,
        tenant_id: &TenantId,
        spans: &[Span],
    ) -> Result<BatchOutcome, StoreError> {
        let mut outcome = BatchOutcome::default();
        for (index, span) in spans.iter().enumerate() {
            match self.put(tenant_id, span) {
                Ok(_) => outcome.accepted += 1,
                Err(error) => outcome.rejected.push(BatchRejection {
                    index,
                    reason: error.to_string(),
                }),
            }
        }
        Ok(outcome)
    }

    fn query(&self, tenant_id: &TenantId, _filter: &SpanFilter) -> Result<Vec<Span>, StoreError> {
        let spans = self.spans.lock().expect("lock");
        let mut matching: Vec<Span> = spans
            .iter()
            .filter(|((tenant, _), _)| tenant == tenant_id.as_str())
            .map(|(_, span)| span.clone())
            .collect();
        matching.sort_by(|left, right| left.span_id.as_str().cmp(right.span_id.as_str()));
        Ok(matching)
    }

    fn span_count(&self, tenant_id: &TenantId) -> Result<u64, StoreError> {
        Ok(self.query(tenant_id, &SpanFilter::default())?.len() as u64)
    }

    fn register_discovery(
        &self,
        tenant_id: &TenantId,
        record: &DiscoveryRecord,
    ) -> Result<(), StoreError> {
        self.discovery.lock().expect("lock").insert(
            (tenant_id.as_str().to_string(), record.service_name.clone()),
            record.clone(),
        );
        Ok(())
    }

    fn discovery(&self, tenant_id: &TenantId) -> Result<Vec<DiscoveryRecord>, StoreError> {
        Ok(self
            .discovery
            .lock()
            .expect("lock")
            .iter()
            .filter(|((tenant, _), _)| tenant == tenant_id.as_str())
            .map(|(_, record)| record.clone())
            .collect())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn sample_span(span_id: &str, latency_ms: f64) -> Span {
    Span {
        trace_id: TraceId::new("trace-1"),
        span_id: SpanId::new(span_id),
        parent_span_id: None,
        service_name: "api".to_string(),
        operation: "GET /orders".to_string(),
        kind: SpanKind::Client,
        start_time: Timestamp::from_unix_millis(1_000),
        end_time: Timestamp::from_unix_millis(1_000 + latency_ms.max(0.0) as i64),
        latency_ms,
        status_code: Some(200),
        error: None,
        downstream: Some("postgres://orders".to_string()),
    }
}

fn authed_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.auth = vec![AuthToken {
        token: "token-acme".to_string(),
        tenant: "acme".to_string(),
    }];
    config
}

fn service_with(config: AppConfig) -> AnalysisService {
    AnalysisService::new(Arc::new(MemorySpanStore::default()), config)
}

fn bearer_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("header value");
    headers.insert(axum::http::header::AUTHORIZATION, value);
    headers
}

fn tenant(id: &str) -> TenantId {
    TenantId::new(id)
}

// ============================================================================
// SECTION: Authentication
// ============================================================================

#[test]
fn missing_credential_is_denied() {
    let authenticator = TenantAuthenticator::new(&authed_config().server.auth);
    let result = authenticator.authenticate(&HeaderMap::new());
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[test]
fn unknown_token_is_denied() {
    let authenticator = TenantAuthenticator::new(&authed_config().server.auth);
    let result = authenticator.authenticate(&bearer_headers("token-unknown"));
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[test]
fn known_token_binds_its_tenant() {
    let authenticator = TenantAuthenticator::new(&authed_config().server.auth);
    let resolved = authenticator.authenticate(&bearer_headers("token-acme")).expect("auth");
    assert_eq!(resolved, tenant("acme"));
}

#[test]
fn tokenless_mode_requires_tenant_header() {
    let authenticator = TenantAuthenticator::new(&[]);
    assert!(matches!(
        authenticator.authenticate(&HeaderMap::new()),
        Err(ApiError::Unauthorized)
    ));

    let mut headers = HeaderMap::new();
    headers.insert(TENANT_HEADER, HeaderValue::from_static("acme"));
    let resolved = authenticator.authenticate(&headers).expect("auth");
    assert_eq!(resolved, tenant("acme"));
}

// ============================================================================
// SECTION: Ingest Validation
// ============================================================================

#[tokio::test]
async fn inverted_time_range_is_rejected() {
    let service = service_with(authed_config());
    let mut span = sample_span("s1", 100.0);
    span.end_time = Timestamp::from_unix_millis(500);
    let result = service.ingest_span(&tenant("acme"), span);
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn negative_latency_is_rejected() {
    let service = service_with(authed_config());
    let mut span = sample_span("s1", 100.0);
    span.latency_ms = -1.0;
    let result = service.ingest_span(&tenant("acme"), span);
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn oversized_payload_is_rejected() {
    let mut config = authed_config();
    config.server.max_span_bytes = 64;
    let service = service_with(config);
    let result = service.ingest_span(&tenant("acme"), sample_span("s1", 100.0));
    assert!(matches!(result, Err(ApiError::Validation(message)) if message.contains("exceeds cap")));
}

#[tokio::test]
async fn batch_over_length_cap_is_rejected_whole() {
    let mut config = authed_config();
    config.server.max_batch_len = 100;
    let service = service_with(config);
    let spans: Vec<Span> =
        (0..101).map(|index| sample_span(&format!("s{index}"), 10.0)).collect();
    let result = service.ingest_batch(&tenant("acme"), spans);
    assert!(matches!(result, Err(ApiError::Validation(_))));
}

#[tokio::test]
async fn batch_reports_per_item_rejections() {
    let service = service_with(authed_config());
    let mut bad = sample_span("s2", 10.0);
    bad.service_name = String::new();
    let outcome = service
        .ingest_batch(&tenant("acme"), vec![sample_span("s1", 10.0), bad])
        .expect("batch");
    assert_eq!(outcome.accepted, 1);
    assert_eq!(outcome.rejected.len(), 1);
    assert_eq!(outcome.rejected[0].index, 1);
}

// ============================================================================
// SECTION: Queue Shedding
// ============================================================================

#[tokio::test]
async fn saturated_queue_sheds_newest_span() {
    // Current-thread runtime: the drain task cannot run between enqueues, so
    // a capacity-one queue fills deterministically.
    let mut config = authed_config();
    config.ingest.queue_capacity = 1;
    let service = service_with(config);
    let acme = tenant("acme");

    assert!(service.ingest_span(&acme, sample_span("s1", 10.0)).is_ok());
    let shed = service.ingest_span(&acme, sample_span("s2", 10.0));
    assert!(matches!(shed, Err(ApiError::QueueSaturated)));
}

// ============================================================================
// SECTION: Caching and Deadlines
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn analysis_is_cached_until_ingest_invalidates() {
    let service = service_with(authed_config());
    let acme = tenant("acme");
    let deadline = Duration::from_secs(5);

    let first = service.analysis(&acme, deadline).await.expect("analysis");
    let second = service.analysis(&acme, deadline).await.expect("analysis");
    assert!(Arc::ptr_eq(&first, &second));

    service.ingest_span(&acme, sample_span("s1", 10.0)).expect("ingest");
    let third = service.analysis(&acme, deadline).await.expect("analysis");
    assert!(!Arc::ptr_eq(&second, &third));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_tenant_yields_empty_documents() {
    let service = service_with(authed_config());
    let docs = service.analysis(&tenant("acme"), Duration::from_secs(5)).await.expect("analysis");
    assert!(docs.state.graph.is_empty());
    assert!(docs.state.issues.is_empty());
    assert!(docs.state.workflows.is_empty());
    assert_eq!(docs.span_count, 0);
    assert!(docs.state.analysis_complete);
}

#[test]
fn caller_deadline_can_lower_but_not_raise() {
    let service = service_with(authed_config());
    assert_eq!(service.read_deadline(None), Duration::from_millis(10_000));
    assert_eq!(service.read_deadline(Some(500)), Duration::from_millis(500));
    assert_eq!(service.read_deadline(Some(60_000)), Duration::from_millis(10_000));
    assert_eq!(service.read_deadline(Some(0)), Duration::from_millis(1));
}

// ============================================================================
// SECTION: Read Budget
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exhausted_read_budget_is_retryable() {
    let mut config = authed_config();
    config.server.rate_limit.reads_per_minute = 2;
    let service = service_with(config);
    let acme = tenant("acme");
    let deadline = Duration::from_secs(5);

    service.analysis(&acme, deadline).await.expect("first read");
    service.analysis(&acme, deadline).await.expect("second read");
    let third = service.analysis(&acme, deadline).await;
    assert!(matches!(third, Err(ApiError::RateLimited)));

    // Another tenant keeps its own budget.
    service.analysis(&tenant("globex"), deadline).await.expect("other tenant");
}
