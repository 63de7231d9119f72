//! Fluent builder for [`TreeConfig`].

use anyhow::{Result, bail};
use std::path::PathBuf;

use super::types::{QueryMode, TreeConfig};

/// Builder with validation at `build` time.
#[derive(Debug, Clone, Default)]
pub struct TreeConfigBuilder {
    config: TreeConfig,
}

impl TreeConfigBuilder {
    #[must_use]
    pub fn query_mode(mut self, mode: QueryMode) -> Self {
        self.config.query_mode = mode;
        self
    }

    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.config.query = query.into();
        self
    }

    #[must_use]
    pub fn depth(mut self, depth: i32) -> Self {
        self.config.depth = depth;
        self
    }

    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    #[must_use]
    pub fn safe(mut self, safe: bool) -> Self {
        self.config.safe = safe;
        self
    }

    #[must_use]
    pub fn rate_period_secs(mut self, secs: u64) -> Self {
        self.config.rate_period_secs = secs;
        self
    }

    #[must_use]
    pub fn viz_out(mut self, path: Option<PathBuf>) -> Self {
        self.config.viz_out = path;
        self
    }

    #[must_use]
    pub fn silent(mut self, silent: bool) -> Self {
        self.config.silent = silent;
        self
    }

    #[must_use]
    pub fn tui(mut self, tui: bool) -> Self {
        self.config.tui = tui;
        self
    }

    #[must_use]
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    #[must_use]
    pub fn src_base(mut self, base: impl Into<String>) -> Self {
        self.config.src_base = base.into();
        self
    }

    #[must_use]
    pub fn pool_capacity(mut self, capacity: Option<usize>) -> Self {
        self.config.pool_capacity = capacity;
        self
    }

    /// Validate and produce the configuration.
    pub fn build(self) -> Result<TreeConfig> {
        let config = self.config;
        if config.depth < 0 {
            bail!("depth must not be negative, got {}", config.depth);
        }
        if config.rate_period_secs == 0 {
            bail!("rate period must be at least one second");
        }
        if config.query.is_empty() && !config.tui {
            bail!("line mode needs a query; pass one or launch the TUI");
        }
        if let Some(capacity) = config.pool_capacity {
            if capacity == 0 {
                bail!("worker pool capacity must not be zero");
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults_for_tui() {
        let config = TreeConfig::builder().build().expect("tui default needs no query");
        assert!(config.tui());
        assert_eq!(config.depth(), 1);
    }

    #[test]
    fn line_mode_requires_a_query() {
        let err = TreeConfig::builder().tui(false).build();
        assert!(err.is_err());

        let config = TreeConfig::builder()
            .tui(false)
            .query_mode(QueryMode::Id)
            .query("2404.17906")
            .build()
            .expect("query set");
        assert_eq!(config.query(), "2404.17906");
    }

    #[test]
    fn rejects_invalid_bounds() {
        assert!(TreeConfig::builder().depth(-1).build().is_err());
        assert!(TreeConfig::builder().rate_period_secs(0).build().is_err());
        assert!(TreeConfig::builder().pool_capacity(Some(0)).build().is_err());
    }
}
