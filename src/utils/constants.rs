//! Process-wide defaults shared by the client, limiter and CLI.

use std::time::Duration;

/// Query endpoint base URL.
pub const ARXIV_API: &str = "https://export.arxiv.org/api";

/// Source and PDF download base URL.
pub const ARXIV_SRC: &str = "https://arxiv.org";

/// Minimum interval between outbound requests in safe mode.
pub const DEFAULT_RATE_PERIOD: Duration = Duration::from_secs(3);

/// Default directory for downloaded PDFs.
pub const DEFAULT_OUTPUT_DIR: &str = "arxiv-download-folder";

/// File extension of bibliography files inside a source archive.
pub const BIB_EXTENSION: &str = "bib";

/// Worker-pool permits per unit of hardware parallelism.
pub const POOL_PERMITS_PER_CPU: usize = 4;
