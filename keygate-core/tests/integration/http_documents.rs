//! Gate over the real HTTP transport, with documents served by wiremock

use keygate_core::{
    Decision, DocumentFetcher, DocumentKind, DocumentUrls, FetchConfig, FetchError, Gate,
    GateConfig, GateError, HttpFetcher,
};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> GateConfig {
    let base = server.uri();
    GateConfig {
        documents: DocumentUrls {
            tool_control: format!("{}/tool", base),
            status: format!("{}/status", base),
            block_list: format!("{}/blocked", base),
            approval_list: format!("{}/approved", base),
        },
        fetch: FetchConfig {
            timeout_ms: 300,
            connect_timeout_ms: 300,
        },
    }
}

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_http_gate_active_for_approved_paid_key() {
    let server = MockServer::start().await;
    serve(&server, "/tool", "ON\n").await;
    serve(&server, "/status", "PAID\n").await;
    serve(&server, "/blocked", "evil-key\n").await;
    serve(&server, "/approved", "key-1\nkey-2\n").await;

    let gate = Gate::with_http(config_for(&server)).unwrap();
    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Active);
    assert_eq!(gate.decide("evil-key").await.unwrap(), Decision::Blocked);
    assert_eq!(gate.decide("key-3").await.unwrap(), Decision::NotApproved);
}

#[tokio::test]
async fn test_http_gate_off_fetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/tool"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OFF"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("TRIAL"))
        .expect(0)
        .mount(&server)
        .await;

    let gate = Gate::with_http(config_for(&server)).unwrap();
    assert_eq!(gate.decide("key-1").await.unwrap(), Decision::Off);
    // expectations are verified when the server drops
}

#[tokio::test]
async fn test_http_gate_non_success_is_unavailable() {
    let server = MockServer::start().await;
    serve(&server, "/tool", "ON").await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503).set_body_string("PAID"))
        .mount(&server)
        .await;

    let gate = Gate::with_http(config_for(&server)).unwrap();
    let err = gate.decide("key-1").await.unwrap_err();
    assert_eq!(
        err,
        GateError::UpstreamUnavailable {
            document: DocumentKind::Status
        }
    );
}

#[tokio::test]
async fn test_http_fetcher_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let err = fetcher
        .fetch(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
}

#[tokio::test]
async fn test_http_fetcher_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("ON")
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(&FetchConfig {
        timeout_ms: 100,
        connect_timeout_ms: 100,
    })
    .unwrap();
    let err = fetcher
        .fetch(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Timeout { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_http_fetcher_connection_refused() {
    // bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let err = fetcher
        .fetch(&format!("http://{}/tool", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_http_fetcher_returns_raw_text() {
    let server = MockServer::start().await;
    serve(&server, "/doc", "  ON \n").await;

    let fetcher = HttpFetcher::new(&FetchConfig::default()).unwrap();
    let text = fetcher
        .fetch(&format!("{}/doc", server.uri()))
        .await
        .unwrap();
    // normalisation is the gate's job, not the transport's
    assert_eq!(text, "  ON \n");
}
