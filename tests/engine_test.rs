//! End-to-end crawl scenarios against a mock archive server.

mod common;

use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio::time::timeout;

use citetree::api::{ArxivClient, QueryRequest};
use citetree::events::EventBus;
use citetree::rate_limit::RateLimiter;
use citetree::tree::{CiteNode, CrawlEngine, RecordInfo};

fn match_title(title: &str) -> Matcher {
    Matcher::UrlEncoded("search_query".to_string(), format!("ti:{title}"))
}

fn match_id(id: &str) -> Matcher {
    Matcher::UrlEncoded("id_list".to_string(), id.to_string())
}

#[tokio::test]
async fn depth_zero_resolves_the_root_without_expanding() {
    let mut server = mockito::Server::new_async().await;
    let query_mock = server
        .mock("GET", "/query")
        .match_query(match_id("2404.17906"))
        .with_body(common::atom_feed(&[("2404.17906", "An Example", "A. Researcher")]))
        .expect(1)
        .create_async()
        .await;
    let src_mock = server
        .mock("GET", "/src/2404.17906")
        .with_body(common::source_with_bib(&common::bib_text(&[("k1", "A", "X")])))
        .expect(1)
        .create_async()
        .await;

    let engine = common::engine_for_server(&server.url(), 4);
    let (hooks, mut log_rx) = common::hooks_with_log_bus();

    let root = engine
        .make_root(&QueryRequest::by_id("2404.17906"), &hooks)
        .await
        .expect("root resolves");
    let info = root.info();
    assert_eq!(info.identifier, "2404.17906");
    assert_eq!(info.title, "An Example");
    assert_eq!(info.author, "A. Researcher");
    assert!(info.has_bibliography());
    assert!(!info.source_path.as_os_str().is_empty());

    engine.populate(Arc::clone(&root), 0, hooks).await;
    assert!(root.children().is_empty());

    let logs = common::drain(&mut log_rx);
    let crumbs: Vec<&String> = logs.iter().filter(|line| line.contains("2404.17906")).collect();
    assert_eq!(crumbs.len(), 1, "one breadcrumb for the root, got {logs:?}");

    query_mock.assert_async().await;
    src_mock.assert_async().await;
}

#[tokio::test]
async fn unresolvable_root_aborts_the_crawl() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(Matcher::Any)
        .with_body(common::atom_feed(&[]))
        .create_async()
        .await;

    let engine = common::engine_for_server(&server.url(), 4);
    let (hooks, _log_rx) = common::hooks_with_log_bus();
    let err = engine.make_root(&QueryRequest::by_title("nothing"), &hooks).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn depth_one_attaches_one_child_per_bibliography_entry_in_order() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(match_id("2404.17906"))
        .with_body(common::atom_feed(&[("2404.17906", "Root Paper", "R. Author")]))
        .create_async()
        .await;
    let bib = common::bib_text(&[("k1", "A. One", "First Cited"), ("k2", "B. Two", "Second Cited")]);
    server
        .mock("GET", "/src/2404.17906")
        .with_body(common::source_with_bib(&bib))
        .create_async()
        .await;
    server
        .mock("GET", "/query")
        .match_query(match_title("First Cited"))
        .with_body(common::atom_feed(&[("1111.11111", "First Cited", "A. One")]))
        .create_async()
        .await;
    server
        .mock("GET", "/query")
        .match_query(match_title("Second Cited"))
        .with_body(common::atom_feed(&[("2222.22222", "Second Cited", "B. Two")]))
        .create_async()
        .await;

    let engine = common::engine_for_server(&server.url(), 4);
    let (hooks, _log_rx) = common::hooks_with_log_bus();
    let root = engine
        .make_root(&QueryRequest::by_id("2404.17906"), &hooks)
        .await
        .expect("root resolves");
    engine.populate(Arc::clone(&root), 1, hooks).await;

    let children = root.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].info().title, "First Cited");
    assert_eq!(children[0].info().identifier, "1111.11111");
    assert_eq!(children[1].info().title, "Second Cited");
    assert_eq!(children[1].info().identifier, "2222.22222");

    // Depth 1: the children are leaves, their sources untouched.
    assert!(children[0].children().is_empty());
    assert!(children[1].children().is_empty());
    assert!(children[0].info().entry.is_some());
}

#[tokio::test]
async fn repeated_titles_resolve_through_the_cache_once() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(match_id("2404.17906"))
        .with_body(common::atom_feed(&[("2404.17906", "Root Paper", "R. Author")]))
        .create_async()
        .await;
    // Two bibliography entries citing the same title.
    let bib = common::bib_text(&[("k1", "A. One", "Shared Title"), ("k2", "B. Two", "Shared Title")]);
    server
        .mock("GET", "/src/2404.17906")
        .with_body(common::source_with_bib(&bib))
        .create_async()
        .await;
    let shared_mock = server
        .mock("GET", "/query")
        .match_query(match_title("Shared Title"))
        .with_body(common::atom_feed(&[("1111.11111", "Shared Title", "A. One")]))
        .expect(1)
        .create_async()
        .await;

    let engine = common::engine_for_server(&server.url(), 4);
    let (hooks, _log_rx) = common::hooks_with_log_bus();
    let root = engine
        .make_root(&QueryRequest::by_id("2404.17906"), &hooks)
        .await
        .expect("root resolves");
    engine.populate(Arc::clone(&root), 1, hooks).await;

    let children = root.children();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].info().identifier, "1111.11111");
    assert_eq!(children[1].info().identifier, "1111.11111");
    shared_mock.assert_async().await;
}

#[tokio::test]
async fn entry_resolving_to_an_empty_feed_becomes_an_empty_subtree() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(match_id("2404.17906"))
        .with_body(common::atom_feed(&[("2404.17906", "Root Paper", "R. Author")]))
        .create_async()
        .await;
    server
        .mock("GET", "/src/2404.17906")
        .with_body(common::source_with_bib(&common::bib_text(&[("k1", "G. Host", "Ghost Paper")])))
        .create_async()
        .await;
    server
        .mock("GET", "/query")
        .match_query(match_title("Ghost Paper"))
        .with_body(common::atom_feed(&[]))
        .create_async()
        .await;

    let engine = common::engine_for_server(&server.url(), 4);
    let (hooks, mut log_rx) = common::hooks_with_log_bus();
    let root = engine
        .make_root(&QueryRequest::by_id("2404.17906"), &hooks)
        .await
        .expect("root resolves");
    engine.populate(Arc::clone(&root), 2, hooks).await;

    let children = root.children();
    assert_eq!(children.len(), 1);
    let ghost = &children[0];
    assert!(ghost.info().identifier.is_empty());
    assert_eq!(ghost.info().title, "Ghost Paper");
    assert!(ghost.children().is_empty());

    let logs = common::drain(&mut log_rx);
    let failures: Vec<&String> =
        logs.iter().filter(|line| line.contains("Parsing XML Failed")).collect();
    assert_eq!(failures.len(), 1, "exactly one parse-failure event, got {logs:?}");
}

#[tokio::test]
async fn malformed_child_archive_does_not_disturb_its_siblings() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(match_id("2404.17906"))
        .with_body(common::atom_feed(&[("2404.17906", "Root Paper", "R. Author")]))
        .create_async()
        .await;
    let bib = common::bib_text(&[("k1", "A. One", "Good Child"), ("k2", "B. Two", "Bad Child")]);
    server
        .mock("GET", "/src/2404.17906")
        .with_body(common::source_with_bib(&bib))
        .create_async()
        .await;
    server
        .mock("GET", "/query")
        .match_query(match_title("Good Child"))
        .with_body(common::atom_feed(&[("1111.11111", "Good Child", "A. One")]))
        .create_async()
        .await;
    server
        .mock("GET", "/query")
        .match_query(match_title("Bad Child"))
        .with_body(common::atom_feed(&[("2222.22222", "Bad Child", "B. Two")]))
        .create_async()
        .await;
    // The good child's archive carries an empty bibliography.
    server
        .mock("GET", "/src/1111.11111")
        .with_body(common::source_with_bib(""))
        .create_async()
        .await;
    // The bad child's archive contains an entry type the extractor
    // rejects.
    let broken = {
        let encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Symlink);
        header.set_size(0);
        header.set_cksum();
        builder.append_link(&mut header, "link", "target").expect("append symlink");
        builder.into_inner().expect("finish tar").finish().expect("finish gzip")
    };
    server.mock("GET", "/src/2222.22222").with_body(&broken).create_async().await;

    let engine = common::engine_for_server(&server.url(), 4);
    let (hooks, mut log_rx) = common::hooks_with_log_bus();
    let root = engine
        .make_root(&QueryRequest::by_id("2404.17906"), &hooks)
        .await
        .expect("root resolves");
    engine.populate(Arc::clone(&root), 2, hooks).await;

    let children = root.children();
    assert_eq!(children.len(), 2);
    let good = &children[0];
    let bad = &children[1];
    assert_eq!(good.info().title, "Good Child");
    assert!(good.children().is_empty());
    assert!(good.info().has_bibliography());
    assert_eq!(bad.info().title, "Bad Child");
    assert!(bad.children().is_empty());
    assert!(!bad.info().has_bibliography());

    let logs = common::drain(&mut log_rx);
    assert!(
        logs.iter().any(|line| line.contains("Error:")),
        "the extraction failure is logged, got {logs:?}"
    );
}

#[tokio::test]
async fn depth_two_expands_grandchildren_before_returning() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(match_id("2404.17906"))
        .with_body(common::atom_feed(&[("2404.17906", "Root Paper", "R. Author")]))
        .create_async()
        .await;
    server
        .mock("GET", "/src/2404.17906")
        .with_body(common::source_with_bib(&common::bib_text(&[("k1", "A. One", "Child Paper")])))
        .create_async()
        .await;
    server
        .mock("GET", "/query")
        .match_query(match_title("Child Paper"))
        .with_body(common::atom_feed(&[("1111.11111", "Child Paper", "A. One")]))
        .create_async()
        .await;
    server
        .mock("GET", "/src/1111.11111")
        .with_body(common::source_with_bib(&common::bib_text(&[(
            "k2",
            "B. Two",
            "Grandchild Paper",
        )])))
        .create_async()
        .await;
    server
        .mock("GET", "/query")
        .match_query(match_title("Grandchild Paper"))
        .with_body(common::atom_feed(&[("3333.33333", "Grandchild Paper", "B. Two")]))
        .create_async()
        .await;

    let pool = Arc::new(Semaphore::new(2));
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(3)));
    let client = Arc::new(ArxivClient::with_base_urls(server.url(), server.url(), limiter));
    let engine = CrawlEngine::with_pool(client, Arc::clone(&pool));

    let (hooks, _log_rx) = common::hooks_with_log_bus();
    let root = engine
        .make_root(&QueryRequest::by_id("2404.17906"), &hooks)
        .await
        .expect("root resolves");
    engine.populate(Arc::clone(&root), 2, hooks).await;

    // The whole tree is in place once populate returns.
    let children = root.children();
    assert_eq!(children.len(), 1);
    let grandchildren = children[0].children();
    assert_eq!(grandchildren.len(), 1);
    assert_eq!(grandchildren[0].info().title, "Grandchild Paper");
    assert_eq!(grandchildren[0].info().identifier, "3333.33333");
    assert!(grandchildren[0].children().is_empty());

    // Every worker-pool permit was returned.
    assert_eq!(pool.available_permits(), 2);
}

#[tokio::test]
async fn pdf_visitor_downloads_into_the_output_directory() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/pdf/1234.56789")
        .with_body(b"%PDF-1.5 payload")
        .create_async()
        .await;

    let engine = common::engine_for_server(&server.url(), 4);
    let tmp = TempDir::new().expect("tempdir");

    let pdf_bus = EventBus::new(8);
    let mut pdf_rx = pdf_bus.take_receiver().expect("fresh bus");
    let visit = engine.pdf_visitor(tmp.path().to_path_buf(), Some(pdf_bus), None, Vec::new());

    let node = CiteNode::root(RecordInfo {
        identifier: "1234.56789".to_string(),
        title: "An A/B Study".to_string(),
        author: "A. Researcher".to_string(),
        ..RecordInfo::default()
    });
    visit(node).await;

    let expected = tmp.path().join("An AB Study_1234.56789.pdf");
    assert_eq!(std::fs::read(&expected).expect("pdf written"), b"%PDF-1.5 payload");

    let message = timeout(Duration::from_secs(1), pdf_rx.recv())
        .await
        .expect("timely")
        .expect("open");
    assert!(message.starts_with("PDF: "));
    assert!(message.contains("An A/B Study"));
}

#[tokio::test]
async fn pdf_visitor_reports_records_without_an_identifier() {
    let server = mockito::Server::new_async().await;
    let engine = common::engine_for_server(&server.url(), 4);
    let tmp = TempDir::new().expect("tempdir");

    let pdf_bus = EventBus::new(8);
    let mut pdf_rx = pdf_bus.take_receiver().expect("fresh bus");
    let visit = engine.pdf_visitor(tmp.path().to_path_buf(), Some(pdf_bus), None, Vec::new());

    let node = CiteNode::root(RecordInfo {
        title: "Unresolved Citation".to_string(),
        ..RecordInfo::default()
    });
    visit(node).await;

    let message = timeout(Duration::from_secs(1), pdf_rx.recv())
        .await
        .expect("timely")
        .expect("open");
    assert!(message.contains("Could not download PDF"));
    assert!(message.contains("Unresolved Citation"));
    assert_eq!(std::fs::read_dir(tmp.path()).expect("readdir").count(), 0);
}
