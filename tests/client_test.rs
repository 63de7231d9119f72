//! HTTP client behaviour against a mock archive: caching, status
//! handling, file writes and network events.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use citetree::api::{ApiError, ArxivClient, QueryRequest};
use citetree::events::{EventBus, NetBus};
use citetree::rate_limit::RateLimiter;
use tempfile::TempDir;

fn client_for(server: &mockito::ServerGuard) -> ArxivClient {
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(3)));
    ArxivClient::with_base_urls(server.url(), server.url(), limiter)
}

#[tokio::test]
async fn identical_queries_make_one_network_call() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/query")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(common::atom_feed(&[("2404.17906", "An Example", "A. Researcher")]))
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server);
    let request = QueryRequest::by_title("sample query");

    let first = client.query(&request, &[]).await.expect("first call");
    let second = client.query(&request, &[]).await.expect("cached call");
    assert_eq!(first, second);
    mock.assert_async().await;
}

#[tokio::test]
async fn distinct_queries_each_hit_the_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/query")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(common::atom_feed(&[]))
        .expect(2)
        .create_async()
        .await;

    let client = client_for(&server);
    client.query(&QueryRequest::by_title("one"), &[]).await.expect("first");
    client.query(&QueryRequest::by_title("two"), &[]).await.expect("second");
    mock.assert_async().await;
}

#[tokio::test]
async fn non_200_query_is_a_structured_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(mockito::Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let client = client_for(&server);
    let err = client
        .query(&QueryRequest::by_title("x"), &[])
        .await
        .expect_err("503 must fail");
    match err {
        ApiError::HttpStatus { code, .. } => assert_eq!(code, 503),
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_request_fails_before_any_network_use() {
    let server = mockito::Server::new_async().await;
    let client = client_for(&server);
    let err = client.query(&QueryRequest::default(), &[]).await;
    assert!(matches!(err, Err(ApiError::EmptyQuery)));
}

#[tokio::test]
async fn query_emits_a_network_event_per_body_read() {
    let mut server = mockito::Server::new_async().await;
    let body = common::atom_feed(&[("1.1", "T", "A")]);
    server
        .mock("GET", "/query")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(&body)
        .create_async()
        .await;

    let bus: NetBus = EventBus::new(8);
    let mut rx = bus.take_receiver().expect("fresh bus");
    let client = client_for(&server);

    client
        .query(&QueryRequest::by_title("x"), &[bus.clone()])
        .await
        .expect("query");
    // Cache hit: no second event.
    client
        .query(&QueryRequest::by_title("x"), &[bus])
        .await
        .expect("cached query");

    let events = common::drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].size, body.len());
}

#[tokio::test]
async fn download_source_writes_the_body_to_disk() {
    let mut server = mockito::Server::new_async().await;
    let payload = common::tgz_bytes(&[("a.txt", "alpha")]);
    server
        .mock("GET", "/src/2404.17906")
        .with_status(200)
        .with_body(&payload)
        .create_async()
        .await;

    let tmp = TempDir::new().expect("tempdir");
    let outfile = tmp.path().join("nested/dir/source.tar.gz");
    let bus: NetBus = EventBus::new(8);
    let mut rx = bus.take_receiver().expect("fresh bus");

    let client = client_for(&server);
    client
        .download_source("2404.17906", &outfile, &[bus])
        .await
        .expect("download");

    assert_eq!(std::fs::read(&outfile).expect("file written"), payload);
    let events = common::drain(&mut rx);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].size, payload.len());
    assert!(events[0].message.contains("2404.17906"));
}

#[tokio::test]
async fn non_200_pdf_leaves_no_file_behind() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/pdf/9999.00001").with_status(404).create_async().await;

    let tmp = TempDir::new().expect("tempdir");
    let outfile = tmp.path().join("missing.pdf");

    let client = client_for(&server);
    let err = client
        .download_pdf("9999.00001", &outfile, &[])
        .await
        .expect_err("404 must fail");
    assert!(matches!(err, ApiError::HttpStatus { code: 404, .. }));
    assert!(!outfile.exists());
}

#[tokio::test]
async fn safe_mode_spaces_requests_by_the_period() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(common::atom_feed(&[]))
        .expect(2)
        .create_async()
        .await;

    let limiter = Arc::new(RateLimiter::new(Duration::from_millis(200)));
    limiter.enable();
    let client = ArxivClient::with_base_urls(server.url(), server.url(), limiter);

    let start = Instant::now();
    client.query(&QueryRequest::by_title("one"), &[]).await.expect("first");
    client.query(&QueryRequest::by_title("two"), &[]).await.expect("second");
    // Each cache miss waits for its own tick: at least two periods.
    assert!(start.elapsed() >= Duration::from_millis(400));
}
