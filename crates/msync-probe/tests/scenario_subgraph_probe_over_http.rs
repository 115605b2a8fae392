//! Subgraph prober against a local mock server: auth header, retry schedule,
//! and degraded-mode fallback.

use httpmock::prelude::*;
use msync_probe::{probe, ProbeError, RemoteProber, SubgraphProber};
use msync_schemas::RetryPolicy;
use serde_json::json;

fn prober(server: &MockServer, key: Option<&str>) -> SubgraphProber {
    SubgraphProber::new(server.url("/subgraphs/agents"), key.map(str::to_string))
        .with_page_size(5)
        .with_retry(RetryPolicy::no_delay())
}

#[tokio::test]
async fn fetches_entities_with_bearer_key() -> anyhow::Result<()> {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/subgraphs/agents")
                .header("Authorization", "Bearer probe-key")
                .body_contains("agents(first: 5)");
            then.status(200).json_body(json!({
                "data": {"agents": [
                    {"registrationFile": {"name": "Weather Pro", "mcpEndpoint": "https://w.example/mcp"}},
                    {"registrationFile": {"name": "Maps", "mcpEndpoint": null}}
                ]}
            }));
        })
        .await;

    let set = probe(&prober(&server, Some("probe-key"))).await;
    mock.assert_async().await;

    assert!(set.contains_endpoint("https://w.example/mcp"));
    assert!(set.contains_display_name("weather pro"));
    assert!(set.contains_display_name("maps"));
    Ok(())
}

#[tokio::test]
async fn missing_key_never_touches_the_network() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.any_request();
            then.status(200);
        })
        .await;

    let p = prober(&server, None);
    assert!(matches!(p.fetch_entities().await, Err(ProbeError::Config(_))));
    assert!(probe(&p).await.is_empty());
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn server_errors_are_retried_then_degrade() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/subgraphs/agents");
            then.status(503).body("unavailable");
        })
        .await;

    let p = prober(&server, Some("k"));
    match p.fetch_entities().await {
        Err(ProbeError::Api { status: Some(503), .. }) => {}
        other => panic!("unexpected: {other:?}"),
    }
    mock.assert_hits_async(3).await;
}

#[tokio::test]
async fn auth_failures_are_not_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/subgraphs/agents");
            then.status(401).body("invalid key");
        })
        .await;

    let set = probe(&prober(&server, Some("wrong"))).await;
    assert!(set.is_empty());
    mock.assert_hits_async(1).await;
}
