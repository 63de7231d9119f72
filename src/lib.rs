//! citetree — recursive citation-tree crawler for arXiv preprints.
//!
//! Given a query (identifier, author or title), the crawl engine
//! resolves a root record, downloads and extracts its source archive,
//! parses the bibliography found inside and recursively repeats the
//! process for every cited work up to a depth bound. Expansion fans out
//! over a bounded worker pool, all traffic is memoised and optionally
//! paced by a global rate limiter, and progress flows to UI consumers
//! over typed event buses.

pub mod api;
pub mod archive;
pub mod bib;
pub mod cache;
pub mod config;
pub mod events;
pub mod logger;
pub mod rate_limit;
pub mod tree;
pub mod tui;
pub mod utils;

pub use api::{ApiError, ArxivClient, QueryRequest};
pub use config::{QueryMode, TreeConfig};
pub use events::{BusError, EventBus, LogBus, NetBus, NetworkEvent, PdfBus, TreeUpdateBus};
pub use tree::{
    CiteNode, CrawlEngine, PopulateHooks, RecordInfo, TreeError, traverse, visualize,
};

use std::sync::Arc;
use tokio::sync::Semaphore;

/// Build the engine a configuration describes: a client against its
/// endpoints on the process-wide limiter, tuned and enabled for safe
/// mode when requested.
pub async fn engine_for(config: &TreeConfig) -> CrawlEngine {
    let limiter = rate_limit::global();
    if config.safe() {
        limiter.reset(config.rate_period()).await;
        limiter.enable();
    }
    let client = Arc::new(ArxivClient::with_base_urls(
        config.api_base(),
        config.src_base(),
        limiter,
    ));
    match config.pool_capacity() {
        Some(capacity) => CrawlEngine::with_pool(client, Arc::new(Semaphore::new(capacity))),
        None => CrawlEngine::new(client),
    }
}

/// One-shot crawl: resolve the root for the configured query, expand it
/// to the configured depth and return the finished tree.
pub async fn grow(
    config: &TreeConfig,
    hooks: PopulateHooks,
) -> Result<Arc<CiteNode>, TreeError> {
    let engine = engine_for(config).await;
    let root = engine.make_root(&config.to_query_request(), &hooks).await?;
    engine.populate(Arc::clone(&root), config.depth(), hooks).await;
    Ok(root)
}
