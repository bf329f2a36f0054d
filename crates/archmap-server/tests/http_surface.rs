// crates/archmap-server/tests/http_surface.rs
// ============================================================================
// Module: HTTP Surface Tests
// Description: End-to-end exercise of ingest and read routes over TCP.
// Purpose: Validate status codes, auth, and the ingest-then-analyze flow
//          against a real listener and SQLite store.
// ============================================================================

//! ## Overview
//! End-to-end tests over a bound listener:
//! - Liveness answers without authentication
//! - Reads without a credential are denied
//! - An empty tenant yields empty documents with zero summaries
//! - Ingested spans become visible to the read surface
//! - Batch ingest reports per-item rejections
//! - A slow database dependency produces the three workflows

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

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use archmap_config::AppConfig;
use archmap_config::AuthToken;
use archmap_server::AnalysisService;
use archmap_server::NoopMetrics;
use archmap_server::serve_on;
use archmap_store_sqlite::SqliteSpanStore;
use archmap_store_sqlite::SqliteStoreConfig;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

// ============================================================================
// SECTION: Test Server
// ============================================================================

/// Running test server with its base URL.
struct TestServer {
    /// Base URL of the bound listener.
    base: String,
    /// Temp directory keeping the store alive for the test.
    _dir: TempDir,
}

/// Starts a server over a fresh SQLite store on an ephemeral port.
fn start_server() -> TestServer {
    let dir = TempDir::new().expect("tempdir");
    let store_config = SqliteStoreConfig::for_path(dir.path().join("spans.db"));
    let store = Arc::new(SqliteSpanStore::open(&store_config).expect("open store"));

    let mut config = AppConfig::default();
    config.server.auth = vec![AuthToken {
        token: "token-acme".to_string(),
        tenant: "acme".to_string(),
    }];
    config.validate().expect("valid config");

    let service = Arc::new(AnalysisService::new(store, config));
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let address = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = serve_on(listener, service, Arc::new(NoopMetrics)).await;
    });
    TestServer {
        base: format!("http://{address}"),
        _dir: dir,
    }
}

fn client() -> reqwest::Client {
    reqwest::Client::new()
}

fn span_payload(span_id: &str, downstream: &str, latency_ms: f64) -> Value {
    json!({
        "trace_id": "trace-1",
        "span_id": span_id,
        "service_name": "api",
        "operation": "GET /orders",
        "kind": "client",
        "start_time": 1_700_000_000_000_i64,
        "end_time": 1_700_000_000_000_i64 + latency_ms as i64,
        "latency_ms": latency_ms,
        "status_code": 200,
        "downstream": downstream,
    })
}

/// Polls a read until the span count reaches the expected value.
async fn await_span_count(server: &TestServer, expected: u64) -> Value {
    for _ in 0..100 {
        let body: Value = client()
            .get(format!("{}/api/v1/architecture/current", server.base))
            .bearer_auth("token-acme")
            .send()
            .await
            .expect("request")
            .json()
            .await
            .expect("json");
        if body["summary"]["span_count"] == json!(expected) {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("span count never reached {expected}");
}

// ============================================================================
// SECTION: Liveness and Auth
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn healthz_answers_without_auth() {
    let server = start_server();
    let response = client()
        .get(format!("{}/healthz", server.base))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].as_str().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reads_without_credential_are_denied() {
    let server = start_server();
    let response = client()
        .get(format!("{}/api/v1/architecture/current", server.base))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.expect("json");
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_path_is_a_json_404() {
    let server = start_server();
    let response = client()
        .get(format!("{}/api/v1/nope", server.base))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["detail"], "not found");
}

// ============================================================================
// SECTION: Empty Tenant
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn empty_tenant_yields_empty_documents() {
    let server = start_server();
    let current: Value = client()
        .get(format!("{}/api/v1/architecture/current", server.base))
        .bearer_auth("token-acme")
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(current["nodes"], json!([]));
    assert_eq!(current["edges"], json!([]));
    assert_eq!(current["summary"]["node_count"], json!(0));
    assert_eq!(current["summary"]["span_count"], json!(0));

    let issues: Value = client()
        .get(format!("{}/api/v1/architecture/issues", server.base))
        .bearer_auth("token-acme")
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(issues["issues"], json!([]));

    let workflows: Value = client()
        .get(format!("{}/api/v1/workflows/generated", server.base))
        .bearer_auth("token-acme")
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(workflows["workflows"], json!([]));
}

// ============================================================================
// SECTION: Ingest Flow
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn ingested_span_becomes_visible_to_reads() {
    let server = start_server();
    let response = client()
        .post(format!("{}/api/v1/spans", server.base))
        .bearer_auth("token-acme")
        .json(&span_payload("s1", "billing", 120.0))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["span_id"], "s1");

    let current = await_span_count(&server, 1).await;
    assert_eq!(current["summary"]["node_count"], json!(2));
    assert_eq!(current["summary"]["edge_count"], json!(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_span_is_a_400_with_detail() {
    let server = start_server();
    let mut payload = span_payload("s1", "billing", 120.0);
    payload["end_time"] = json!(1_000);
    let response = client()
        .post(format!("{}/api/v1/spans", server.base))
        .bearer_auth("token-acme")
        .json(&payload)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.expect("json");
    assert!(body["detail"].as_str().expect("detail").contains("precedes"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn batch_reports_per_item_status() {
    let server = start_server();
    let mut bad = span_payload("s2", "billing", 50.0);
    bad["service_name"] = json!("");
    let response = client()
        .post(format!("{}/api/v1/spans/batch", server.base))
        .bearer_auth("token-acme")
        .json(&json!([span_payload("s1", "billing", 50.0), bad]))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.expect("json");
    assert_eq!(body["accepted"], json!(1));
    assert_eq!(body["rejected"][0]["index"], json!(1));
}

// ============================================================================
// SECTION: Analysis Flow
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn slow_database_produces_three_workflows_and_recommendation() {
    let server = start_server();
    let spans: Vec<Value> = (0..10)
        .map(|index| span_payload(&format!("s{index}"), "postgres://users", 2_000.0))
        .collect();
    let response = client()
        .post(format!("{}/api/v1/spans/batch", server.base))
        .bearer_auth("token-acme")
        .json(&spans)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 202);

    await_span_count(&server, 10).await;

    let workflows: Value = client()
        .get(format!("{}/api/v1/workflows/generated", server.base))
        .bearer_auth("token-acme")
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    let listing = workflows["workflows"].as_array().expect("array");
    assert_eq!(listing.len(), 3);
    assert_eq!(listing[0]["id"], "workflow-minimal");
    assert_eq!(listing[1]["id"], "workflow-performance");
    assert_eq!(listing[2]["id"], "workflow-cost");

    let comparison: Value = client()
        .get(format!("{}/api/v1/workflows/comparison", server.base))
        .bearer_auth("token-acme")
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(comparison["matrix"].as_array().expect("matrix").len(), 3);
    assert_eq!(comparison["recommendation"], "workflow-minimal");

    let analysis: Value = client()
        .get(format!("{}/api/v1/graph/analysis", server.base))
        .bearer_auth("token-acme")
        .send()
        .await
        .expect("request")
        .json()
        .await
        .expect("json");
    assert_eq!(analysis["cycles"]["has_cycles"], json!(false));
    assert_eq!(analysis["critical_path"]["hops"], json!(1));
}
