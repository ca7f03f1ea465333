use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::*;
use crate::metrics;
use crate::test_utils::target_set;
use crate::test_utils::FakeRegistry;
use crate::Error;

fn registry() -> Arc<dyn TargetRegistry> {
    Arc::new(FakeRegistry::with_live(target_set(&[
        ("router2", "10.0.0.2:57400"),
        ("router1", "10.0.0.1:57400"),
    ])))
}

#[tokio::test]
async fn test_targets_route_lists_sorted_names() {
    let response = warp::test::request()
        .method("GET")
        .path("/api/v1/targets")
        .reply(&routes(registry()))
        .await;

    assert_eq!(response.status(), 200);
    let body: Vec<String> = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body, vec!["router1", "router2"]);
}

#[tokio::test]
async fn test_healthz_route() {
    let response = warp::test::request()
        .method("GET")
        .path("/api/v1/healthz")
        .reply(&routes(registry()))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), b"ok");
}

#[tokio::test]
async fn test_metrics_route_exposes_collector_metrics() {
    metrics::record_target_operation("delete", true);

    let response = warp::test::request()
        .method("GET")
        .path("/metrics")
        .reply(&routes(registry()))
        .await;

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("Content-Type"),
        Some(&"text/plain; charset=utf-8".parse().unwrap())
    );
    let body = String::from_utf8(response.body().to_vec()).unwrap();
    assert!(body.contains("target_operations_total"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = warp::test::request()
        .method("GET")
        .path("/api/v1/nothing")
        .reply(&routes(registry()))
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_server_binds_and_rejects_taken_address() {
    let shutdown = CancellationToken::new();

    let bound =
        start_admin_server("127.0.0.1:0".parse().unwrap(), registry(), shutdown.clone()).unwrap();
    assert_ne!(bound.port(), 0);

    let result = start_admin_server(bound, registry(), shutdown.clone());
    assert!(matches!(result, Err(Error::System(SystemError::AdminServer(_)))));

    shutdown.cancel();
}
