//! The one-shot `grow` entry point, from configuration to finished
//! tree and DOT output.

mod common;

use mockito::Matcher;
use tempfile::TempDir;

use citetree::config::{QueryMode, TreeConfig};
use citetree::tree::{PopulateHooks, traverse, visualize};

#[tokio::test]
async fn grow_builds_the_configured_tree_and_renders_dot() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/query")
        .match_query(Matcher::UrlEncoded("id_list".to_string(), "2404.17906".to_string()))
        .with_body(common::atom_feed(&[("2404.17906", "Root Paper", "R. Author")]))
        .create_async()
        .await;
    server
        .mock("GET", "/src/2404.17906")
        .with_body(common::source_with_bib(&common::bib_text(&[(
            "k1",
            "A. One",
            "Cited Work",
        )])))
        .create_async()
        .await;
    server
        .mock("GET", "/query")
        .match_query(Matcher::UrlEncoded("search_query".to_string(), "ti:Cited Work".to_string()))
        .with_body(common::atom_feed(&[("1111.11111", "Cited Work", "A. One")]))
        .create_async()
        .await;

    let config = TreeConfig::builder()
        .tui(false)
        .query_mode(QueryMode::Id)
        .query("2404.17906")
        .depth(1)
        .api_base(server.url())
        .src_base(server.url())
        .pool_capacity(Some(4))
        .build()
        .expect("valid config");

    let hooks = PopulateHooks { log_nodes: false, ..PopulateHooks::default() };
    let root = citetree::grow(&config, hooks).await.expect("crawl succeeds");

    let mut titles = Vec::new();
    traverse(&root, &mut |node| titles.push(node.info().title));
    assert_eq!(titles, ["Root Paper", "Cited Work"]);

    let tmp = TempDir::new().expect("tempdir");
    let dot_path = tmp.path().join("tree.gv");
    visualize(&root, &dot_path).expect("dot written");
    let dot = std::fs::read_to_string(&dot_path).expect("readable");
    assert!(dot.contains("digraph citations"));
    assert!(dot.contains("Root Paper"));
    assert!(dot.contains(" -> "));
}
