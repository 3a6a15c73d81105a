//! Integration tests for ordered endpoint fallback
//!
//! Each candidate is a wiremock server answering `GET /v1/models`. These
//! tests pin down the resolver contract:
//! - candidates are probed in order and the first non-empty list wins
//! - later candidates are never contacted once one succeeds
//! - errors, bad bodies, empty lists and slow servers all count as failures
//! - exhausting every candidate is a `NoWorkingEndpoint` error

use lmtic::error::LmError;
use lmtic::models::{Endpoint, Protocol};
use lmtic::resolver::{EndpointResolver, ProbeError};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROBE_TIMEOUT: Duration = Duration::from_millis(300);

fn endpoint_for(name: &str, server: &MockServer) -> Endpoint {
    let addr = server.address();
    Endpoint::new(
        name,
        Protocol::Http,
        addr.ip().to_string(),
        u32::from(addr.port()),
        "/v1",
    )
    .expect("mock server address should be a valid endpoint")
}

fn model_list(ids: &[&str]) -> serde_json::Value {
    let data: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| json!({"id": id, "object": "model", "owned_by": "user"}))
        .collect();
    json!({"object": "list", "data": data})
}

async fn serve_models(server: &MockServer, ids: &[&str], expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_list(ids)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_first_working_candidate_wins() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;

    serve_models(&first, &["qwen-7b"], 1).await;
    // Never contacted: resolution stops at the first success
    serve_models(&second, &["llama3"], 0).await;

    let resolver = EndpointResolver::new(
        vec![endpoint_for("first", &first), endpoint_for("second", &second)],
        PROBE_TIMEOUT,
    )
    .unwrap();

    let resolved = resolver.resolve().await.expect("first candidate should work");
    assert_eq!(resolved.endpoint().name(), "first");
    assert_eq!(resolved.models().ids(), vec!["qwen-7b"]);
}

#[tokio::test]
async fn test_failed_candidates_are_skipped_in_order() {
    let broken = MockServer::start().await;
    let empty = MockServer::start().await;
    let garbage = MockServer::start().await;
    let working = MockServer::start().await;
    let spare = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&broken)
        .await;
    serve_models(&empty, &[], 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .expect(1)
        .mount(&garbage)
        .await;
    serve_models(&working, &["mistral-7b", "qwen2.5:14b"], 1).await;
    serve_models(&spare, &["phi3"], 0).await;

    let resolver = EndpointResolver::new(
        vec![
            endpoint_for("broken", &broken),
            endpoint_for("empty", &empty),
            endpoint_for("garbage", &garbage),
            endpoint_for("working", &working),
            endpoint_for("spare", &spare),
        ],
        PROBE_TIMEOUT,
    )
    .unwrap();

    let resolved = resolver.resolve().await.expect("fourth candidate should work");
    assert_eq!(resolved.endpoint().name(), "working");
    assert_eq!(resolved.models().len(), 2);
}

#[tokio::test]
async fn test_all_candidates_failing_is_an_error() {
    let missing = MockServer::start().await; // nothing mounted: 404
    let empty = MockServer::start().await;
    serve_models(&empty, &[], 1).await;

    let resolver = EndpointResolver::new(
        vec![endpoint_for("missing", &missing), endpoint_for("empty", &empty)],
        PROBE_TIMEOUT,
    )
    .unwrap();

    match resolver.resolve().await {
        Err(LmError::NoWorkingEndpoint { attempted, failures }) => {
            assert_eq!(attempted, 2);
            assert_eq!(failures.len(), 2);
            assert!(failures[0].starts_with("missing ("), "got: {}", failures[0]);
            assert!(failures[0].contains("404"), "got: {}", failures[0]);
            assert!(failures[1].contains("no models"), "got: {}", failures[1]);
        }
        other => panic!("expected NoWorkingEndpoint, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_candidate_times_out_and_next_is_used() {
    let slow = MockServer::start().await;
    let fast = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(model_list(&["slow-model"])),
        )
        .mount(&slow)
        .await;
    serve_models(&fast, &["fast-model"], 1).await;

    let resolver = EndpointResolver::new(
        vec![endpoint_for("slow", &slow), endpoint_for("fast", &fast)],
        PROBE_TIMEOUT,
    )
    .unwrap();

    let start = Instant::now();
    let resolved = resolver.resolve().await.expect("second candidate should work");
    let elapsed = start.elapsed();

    assert_eq!(resolved.endpoint().name(), "fast");
    assert!(
        elapsed < Duration::from_secs(3),
        "slow candidate should be abandoned after the probe timeout, took {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_probe_reports_each_failure_kind() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let endpoint = endpoint_for("unavailable", &server);
    let resolver = EndpointResolver::new(vec![endpoint.clone()], PROBE_TIMEOUT).unwrap();

    match resolver.probe(&endpoint).await {
        Err(ProbeError::Status { status }) => assert_eq!(status, 503),
        other => panic!("expected Status error, got {:?}", other),
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "list"})))
        .mount(&server)
        .await;
    let endpoint = endpoint_for("no-data", &server);

    assert!(matches!(
        resolver.probe(&endpoint).await,
        Err(ProbeError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_probe_uses_endpoint_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_list(&["custom"])))
        .expect(1)
        .mount(&server)
        .await;

    let addr = server.address();
    let endpoint = Endpoint::new(
        "custom-path",
        Protocol::Http,
        addr.ip().to_string(),
        u32::from(addr.port()),
        "/api/v2",
    )
    .unwrap();

    let resolver = EndpointResolver::new(vec![endpoint], PROBE_TIMEOUT).unwrap();
    let resolved = resolver.resolve().await.expect("custom path should be probed");
    assert_eq!(resolved.models().ids(), vec!["custom"]);
}
