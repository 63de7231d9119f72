//! Read access to [`TreeConfig`] fields.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{QueryMode, TreeConfig};

impl TreeConfig {
    #[must_use]
    pub fn query_mode(&self) -> QueryMode {
        self.query_mode
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn depth(&self) -> i32 {
        self.depth
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn safe(&self) -> bool {
        self.safe
    }

    #[must_use]
    pub fn rate_period(&self) -> Duration {
        Duration::from_secs(self.rate_period_secs)
    }

    #[must_use]
    pub fn viz_out(&self) -> Option<&PathBuf> {
        self.viz_out.as_ref()
    }

    #[must_use]
    pub fn silent(&self) -> bool {
        self.silent
    }

    #[must_use]
    pub fn tui(&self) -> bool {
        self.tui
    }

    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    #[must_use]
    pub fn src_base(&self) -> &str {
        &self.src_base
    }

    #[must_use]
    pub fn pool_capacity(&self) -> Option<usize> {
        self.pool_capacity
    }
}
