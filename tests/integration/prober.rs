//! Probe behavior against real HTTP servers

use std::sync::Arc;
use std::time::Duration;

use endpoint_monitor::{
    clock::SystemClock,
    config::EndpointConfig,
    monitors::probe::{HttpProber, Prober},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn prober() -> HttpProber {
    HttpProber::new(Arc::new(SystemClock)).unwrap()
}

async fn graphql_server(response: ResponseTemplate) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_json(json!({ "query": "{ __typename }" })))
        .respond_with(response)
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_graphql_healthy() {
    let server = graphql_server(
        ResponseTemplate::new(200).set_body_json(json!({ "data": { "__typename": "Query" } })),
    )
    .await;

    let endpoint = EndpointConfig::graphql(format!("{}/graphql", server.uri()));
    let result = prober().check(&endpoint).await;

    assert!(result.success);
    assert_eq!(result.status_code, 200);
    assert_eq!(result.endpoint, endpoint.url);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_graphql_errors_body_with_200_is_healthy() {
    let server = graphql_server(
        ResponseTemplate::new(200)
            .set_body_json(json!({ "errors": [{ "message": "not authorized" }] })),
    )
    .await;

    let result = prober()
        .check(&EndpointConfig::graphql(format!("{}/graphql", server.uri())))
        .await;

    assert!(result.success);
}

#[tokio::test]
async fn test_graphql_server_error() {
    let server = graphql_server(ResponseTemplate::new(500).set_body_string("boom")).await;

    let result = prober()
        .check(&EndpointConfig::graphql(format!("{}/graphql", server.uri())))
        .await;

    assert!(!result.success);
    assert_eq!(result.status_code, 500);
    assert_eq!(result.message, "server returned status 500");
    assert_eq!(result.error.as_deref(), Some("status 500: boom"));
}

#[tokio::test]
async fn test_graphql_error_with_4xx() {
    let server = graphql_server(
        ResponseTemplate::new(400)
            .set_body_json(json!({ "errors": [{ "message": "Syntax Error" }] })),
    )
    .await;

    let result = prober()
        .check(&EndpointConfig::graphql(format!("{}/graphql", server.uri())))
        .await;

    assert!(!result.success);
    assert_eq!(result.status_code, 400);
    assert_eq!(result.message, "GraphQL error: Syntax Error (status 400)");
}

#[tokio::test]
async fn test_graphql_malformed_body() {
    let server =
        graphql_server(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .await;

    let result = prober()
        .check(&EndpointConfig::graphql(format!("{}/graphql", server.uri())))
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "malformed GraphQL response (status 200)");
}

#[tokio::test]
async fn test_timeout_is_a_failing_result() {
    let server = graphql_server(
        ResponseTemplate::new(200)
            .set_body_json(json!({ "data": {} }))
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let prober =
        HttpProber::with_timeout(Arc::new(SystemClock), Duration::from_millis(200)).unwrap();
    let result = prober
        .check(&EndpointConfig::graphql(format!("{}/graphql", server.uri())))
        .await;

    assert!(!result.success);
    assert_eq!(result.status_code, 0);
    assert_eq!(result.message, "server response timed out");
    assert!(result.error.is_some());
    assert!(result.response_time < Duration::from_secs(2));
}

#[tokio::test]
async fn test_connection_refused() {
    // bind and drop to get a port nothing listens on
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = prober()
        .check(&EndpointConfig::graphql(format!("http://127.0.0.1:{port}/graphql")))
        .await;

    assert!(!result.success);
    assert_eq!(result.status_code, 0);
    assert!(result.message.contains("connect"), "{}", result.message);

    // the underlying cause survives, not just the outermost reqwest message
    let error = result.error.unwrap();
    assert!(error.to_lowercase().contains("refused"), "{error}");
}

#[tokio::test]
async fn test_http_probe_with_body_pattern() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"degraded"}"#))
        .mount(&mock_server)
        .await;

    let url = format!("{}/health", mock_server.uri());

    let healthy = prober()
        .check(&EndpointConfig::http(&url).with_body_pattern("status"))
        .await;
    assert!(healthy.success);

    let unhealthy = prober()
        .check(&EndpointConfig::http(&url).with_body_pattern(r#""status":"ok""#))
        .await;
    assert!(!unhealthy.success);
    assert_eq!(unhealthy.status_code, 200);
}
