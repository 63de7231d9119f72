//! Core configuration types for citation crawls.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::api::QueryRequest;
use crate::utils::{DEFAULT_OUTPUT_DIR, DEFAULT_RATE_PERIOD};

/// Which record field the root query searches by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Look up by canonical archive identifier.
    Id,
    /// Search by author name.
    Author,
    /// Search by title.
    #[default]
    Title,
}

/// Configuration for one crawl.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    pub(crate) query_mode: QueryMode,
    pub(crate) query: String,
    /// Recursion bound; 0 resolves the root only.
    pub(crate) depth: i32,
    /// Where PDFs are written.
    pub(crate) output_dir: PathBuf,
    /// Route every request through the global rate limiter.
    pub(crate) safe: bool,
    pub(crate) rate_period_secs: u64,
    /// Write a DOT graph here after the crawl, when set.
    pub(crate) viz_out: Option<PathBuf>,
    /// Suppress per-node progress logs.
    pub(crate) silent: bool,
    /// Launch the terminal UI instead of line mode.
    pub(crate) tui: bool,
    pub(crate) api_base: String,
    pub(crate) src_base: String,
    /// Worker-pool permits; `None` uses the process-wide pool.
    pub(crate) pool_capacity: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            query_mode: QueryMode::default(),
            query: String::new(),
            depth: 1,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            safe: false,
            rate_period_secs: DEFAULT_RATE_PERIOD.as_secs(),
            viz_out: None,
            silent: false,
            tui: true,
            api_base: crate::utils::ARXIV_API.to_string(),
            src_base: crate::utils::ARXIV_SRC.to_string(),
            pool_capacity: None,
        }
    }
}

impl TreeConfig {
    /// Start a fluent builder over the defaults.
    #[must_use]
    pub fn builder() -> super::TreeConfigBuilder {
        super::TreeConfigBuilder::default()
    }

    /// The root query this configuration describes.
    #[must_use]
    pub fn to_query_request(&self) -> QueryRequest {
        match self.query_mode {
            QueryMode::Id => QueryRequest::by_id(self.query.clone()),
            QueryMode::Author => QueryRequest::by_author(self.query.clone()),
            QueryMode::Title => QueryRequest::by_title(self.query.clone()),
        }
    }
}
