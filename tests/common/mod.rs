//! Shared fixtures for the integration tests: in-memory tarballs, Atom
//! feeds, bibliography text and engines pointed at a mock server.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use flate2::Compression;
use flate2::write::GzEncoder;
use tokio::sync::Semaphore;

use citetree::api::ArxivClient;
use citetree::events::{EventBus, LogBus};
use citetree::rate_limit::RateLimiter;
use citetree::tree::{CrawlEngine, PopulateHooks};

/// Build a gzipped tarball in memory from (path, contents) pairs; paths
/// ending in `/` become directory entries.
pub fn tgz_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        if path.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
            header.set_cksum();
            builder
                .append_data(&mut header, *path, std::io::empty())
                .expect("append dir");
        } else {
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, *path, contents.as_bytes())
                .expect("append file");
        }
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip")
}

/// A tarball whose only interesting content is a bibliography file.
pub fn source_with_bib(bib: &str) -> Vec<u8> {
    tgz_bytes(&[("paper/", ""), ("paper/main.tex", "\\cite{all}"), ("paper/citations.bib", bib)])
}

/// Render an Atom feed from (identifier, title, author) triples.
pub fn atom_feed(entries: &[(&str, &str, &str)]) -> String {
    let mut body = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?><feed xmlns="http://www.w3.org/2005/Atom">"#,
    );
    for (id, title, author) in entries {
        body.push_str(&format!(
            "<entry><id>http://arxiv.org/abs/{id}</id><title>{title}</title>\
             <author><name>{author}</name></author></entry>"
        ));
    }
    body.push_str("</feed>");
    body
}

/// Render bibliography text from (key, author, title) triples.
pub fn bib_text(entries: &[(&str, &str, &str)]) -> String {
    let mut out = String::new();
    for (key, author, title) in entries {
        out.push_str(&format!(
            "@article{{{key},\n  author = {{{author}}},\n  title = {{{title}}},\n}}\n\n"
        ));
    }
    out
}

/// Engine with isolated caches and a disabled limiter, pointed at a
/// mock server for both endpoints, on its own worker pool.
pub fn engine_for_server(url: &str, pool_permits: usize) -> CrawlEngine {
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(3)));
    let client = Arc::new(ArxivClient::with_base_urls(url, url, limiter));
    CrawlEngine::with_pool(client, Arc::new(Semaphore::new(pool_permits)))
}

/// Hooks with a log bus attached; returns the hooks and the bus's
/// receiver so tests can drain delivered breadcrumbs.
pub fn hooks_with_log_bus() -> (PopulateHooks, tokio::sync::mpsc::Receiver<String>) {
    let log_bus: LogBus = EventBus::new(256);
    let rx = log_bus.take_receiver().expect("fresh bus");
    let hooks = PopulateHooks { log_bus: Some(log_bus), ..PopulateHooks::default() };
    (hooks, rx)
}

/// Drain everything currently buffered on a receiver.
pub fn drain<T>(rx: &mut tokio::sync::mpsc::Receiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    while let Ok(item) = rx.try_recv() {
        out.push(item);
    }
    out
}
