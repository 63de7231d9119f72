//! The citation tree and the engine that grows it.

pub mod engine;
pub mod error;
pub mod node;
pub mod visualize;

pub use engine::{CrawlEngine, PopulateHooks, VisitFn, worker_pool, worker_pool_capacity};
pub use error::TreeError;
pub use node::{CiteNode, RecordInfo};
pub use visualize::visualize;

use std::sync::Arc;

/// Pre-order walk over the tree, invoking `cb` on every node exactly
/// once.
pub fn traverse(node: &Arc<CiteNode>, cb: &mut dyn FnMut(&Arc<CiteNode>)) {
    cb(node);
    for child in node.children() {
        traverse(child, cb);
    }
}
