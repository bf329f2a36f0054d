// crates/archmap-server/src/routes.rs
// ============================================================================
// Module: Archmap HTTP Routes
// Description: Ingest and read-surface handlers over the analysis service.
// Purpose: Map HTTP requests onto the service with precise status codes.
// Dependencies: archmap-core, axum, serde_json, crate::{auth, error, service}
// ============================================================================

//! ## Overview
//! Route handlers authenticate the tenant, delegate to the analysis service,
//! and shape the response documents. All read operations are side-effect
//! free; ingest operations return 202 on accept, 400 on validation failure,
//! and 429 when the tenant queue is saturated. The liveness check answers
//! without authentication.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use archmap_core::DiscoveryRecord;
use archmap_core::IssueSeverity;
use archmap_core::Span;
use archmap_core::TenantId;
use archmap_core::compare_workflows;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;

use crate::error::ApiError;
use crate::service::AnalysisDocs;
use crate::service::AnalysisService;
use crate::service::now_timestamp;
use crate::telemetry::Operation;
use crate::telemetry::RequestEvent;
use crate::telemetry::RequestOutcome;
use crate::telemetry::ServerMetrics;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header a caller may use to lower the read deadline.
pub const DEADLINE_HEADER: &str = "x-deadline-ms";

// ============================================================================
// SECTION: Application State
// ============================================================================

/// Shared state behind every handler.
pub struct AppState {
    /// Analysis service constructed at startup.
    pub service: Arc<AnalysisService>,
    /// Metrics sink for request telemetry.
    pub metrics: Arc<dyn ServerMetrics>,
}

impl AppState {
    /// Records a counter and latency observation for a finished request.
    fn note(
        &self,
        operation: Operation,
        tenant: Option<TenantId>,
        started: Instant,
        outcome: RequestOutcome,
    ) {
        let event = RequestEvent {
            operation,
            outcome,
            tenant,
        };
        self.metrics.record_request(event.clone());
        self.metrics.record_latency(event, started.elapsed());
    }
}

/// Builds the application router.
#[must_use]
pub fn router(service: Arc<AnalysisService>, metrics: Arc<dyn ServerMetrics>) -> Router {
    let state = Arc::new(AppState {
        service,
        metrics,
    });
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/v1/spans", post(ingest_span))
        .route("/api/v1/spans/batch", post(ingest_batch))
        .route("/api/v1/discovery", post(register_discovery))
        .route("/api/v1/architecture/current", get(architecture_current))
        .route("/api/v1/architecture/issues", get(architecture_issues))
        .route("/api/v1/workflows/generated", get(workflows_generated))
        .route("/api/v1/workflows/comparison", get(workflows_comparison))
        .route("/api/v1/graph/analysis", get(graph_analysis))
        .fallback(not_found)
        .with_state(state)
}

/// Fallback handler for unknown paths.
async fn not_found() -> ApiError {
    ApiError::NotFound
}

// ============================================================================
// SECTION: Liveness
// ============================================================================

/// Liveness check; answers without authentication.
async fn healthz(State(state): State<Arc<AppState>>) -> Response {
    let started = Instant::now();
    let body = json!({
        "status": "healthy",
        "timestamp": now_timestamp().to_rfc3339(),
    });
    state.note(Operation::Health, None, started, RequestOutcome::Ok);
    Json(body).into_response()
}

// ============================================================================
// SECTION: Ingest Handlers
// ============================================================================

/// Accepts one span; 202 with the span identifier.
async fn ingest_span(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Span>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let outcome = authenticate(&state, &headers).and_then(|tenant| {
        let Json(span) = payload.map_err(reject_body)?;
        let span_id = state.service.ingest_span(&tenant, span)?;
        Ok((
            tenant,
            json!({ "status": "accepted", "span_id": span_id }),
        ))
    });
    respond(&state, Operation::IngestSpan, started, outcome, StatusCode::ACCEPTED)
}

/// Accepts a span batch; 202 with per-item outcomes.
async fn ingest_batch(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Vec<Span>>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let outcome = authenticate(&state, &headers).and_then(|tenant| {
        let Json(spans) = payload.map_err(reject_body)?;
        let batch = state.service.ingest_batch(&tenant, spans)?;
        let doc = serde_json::to_value(&batch)
            .map_err(|error| ApiError::Internal(error.to_string()))?;
        Ok((tenant, doc))
    });
    respond(&state, Operation::IngestBatch, started, outcome, StatusCode::ACCEPTED)
}

/// Upserts a service self-description; 202 on accept.
async fn register_discovery(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<DiscoveryRecord>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let outcome = match authenticate(&state, &headers) {
        Ok(tenant) => match payload.map_err(reject_body) {
            Ok(Json(record)) => state
                .service
                .register_discovery(&tenant, record)
                .await
                .map(|()| (tenant, json!({ "status": "accepted" }))),
            Err(error) => Err(error),
        },
        Err(error) => Err(error),
    };
    respond(&state, Operation::RegisterDiscovery, started, outcome, StatusCode::ACCEPTED)
}

// ============================================================================
// SECTION: Read Handlers
// ============================================================================

/// Current architecture: nodes, edges, metrics summary.
async fn architecture_current(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let outcome = read_docs(&state, &headers)
        .await
        .map(|(tenant, docs)| (tenant, architecture_current_doc(&docs)));
    respond(&state, Operation::ArchitectureCurrent, started, outcome, StatusCode::OK)
}

/// Ranked issue listing with severity buckets.
async fn architecture_issues(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let outcome = read_docs(&state, &headers)
        .await
        .map(|(tenant, docs)| (tenant, architecture_issues_doc(&docs)));
    respond(&state, Operation::ArchitectureIssues, started, outcome, StatusCode::OK)
}

/// The generated workflows, or an empty list.
async fn workflows_generated(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let outcome = read_docs(&state, &headers)
        .await
        .map(|(tenant, docs)| (tenant, json!({ "workflows": &docs.state.workflows })));
    respond(&state, Operation::WorkflowsGenerated, started, outcome, StatusCode::OK)
}

/// Comparison matrix with a recommendation.
async fn workflows_comparison(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let started = Instant::now();
    let outcome = read_docs(&state, &headers).await.and_then(|(tenant, docs)| {
        let comparison = compare_workflows(&docs.state.workflows, &docs.state.issues);
        let doc = serde_json::to_value(&comparison)
            .map_err(|error| ApiError::Internal(error.to_string()))?;
        Ok((tenant, doc))
    });
    respond(&state, Operation::WorkflowsComparison, started, outcome, StatusCode::OK)
}

/// Advanced graph measures: centrality, cycles, critical path.
async fn graph_analysis(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let started = Instant::now();
    let outcome = read_docs(&state, &headers)
        .await
        .map(|(tenant, docs)| (tenant, graph_analysis_doc(&docs)));
    respond(&state, Operation::GraphAnalysis, started, outcome, StatusCode::OK)
}

// ============================================================================
// SECTION: Handler Plumbing
// ============================================================================

/// Authenticates the tenant for a request.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<TenantId, ApiError> {
    state.service.authenticator().authenticate(headers)
}

/// Maps a JSON body rejection onto a validation error.
fn reject_body(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(format!("malformed request body: {}", rejection.body_text()))
}

/// Authenticates and fetches the tenant's analysis documents.
async fn read_docs(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<(TenantId, Arc<AnalysisDocs>), ApiError> {
    let tenant = authenticate(state, headers)?;
    let deadline = state.service.read_deadline(requested_deadline(headers));
    let docs = state.service.analysis(&tenant, deadline).await?;
    Ok((tenant, docs))
}

/// Parses the caller-provided deadline header, when present.
fn requested_deadline(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(DEADLINE_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

/// Finishes a request: records telemetry and shapes the response.
fn respond(
    state: &AppState,
    operation: Operation,
    started: Instant,
    outcome: Result<(TenantId, Value), ApiError>,
    success_status: StatusCode,
) -> Response {
    match outcome {
        Ok((tenant, doc)) => {
            state.note(operation, Some(tenant), started, RequestOutcome::Ok);
            (success_status, Json(doc)).into_response()
        }
        Err(error) => {
            state.note(operation, None, started, RequestOutcome::Error);
            error.into_response()
        }
    }
}

// ============================================================================
// SECTION: Document Builders
// ============================================================================

/// Builds the `architecture_current` document.
fn architecture_current_doc(docs: &AnalysisDocs) -> Value {
    let graph = &docs.state.graph;
    json!({
        "nodes": graph.nodes.values().collect::<Vec<_>>(),
        "edges": graph.edges.values().collect::<Vec<_>>(),
        "summary": {
            "node_count": graph.nodes.len(),
            "edge_count": graph.edges.len(),
            "span_count": docs.span_count,
            "generated_at": docs.generated_at.to_rfc3339(),
        },
    })
}

/// Builds the `architecture_issues` document.
fn architecture_issues_doc(docs: &AnalysisDocs) -> Value {
    let mut severity_counts: BTreeMap<&str, u64> = BTreeMap::new();
    for severity in
        [IssueSeverity::Critical, IssueSeverity::High, IssueSeverity::Medium, IssueSeverity::Low]
    {
        severity_counts.insert(severity.as_str(), 0);
    }
    for issue in &docs.state.issues {
        *severity_counts.entry(issue.severity.as_str()).or_insert(0) += 1;
    }
    json!({
        "issues": &docs.state.issues,
        "severity_counts": severity_counts,
    })
}

/// Builds the `graph_analysis` document.
fn graph_analysis_doc(docs: &AnalysisDocs) -> Value {
    json!({
        "centrality": docs.measures.centrality,
        "cycles": { "has_cycles": docs.measures.has_cycles },
        "critical_path": {
            "nodes": docs.measures.critical_path,
            "hops": docs.measures.critical_path_hops,
        },
    })
}
