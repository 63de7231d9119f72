//! Error type for tree construction.

use crate::api::ApiError;
use crate::archive::ExtractError;
use crate::bib::BibError;

/// Errors surfaced while resolving or expanding tree nodes.
///
/// Only the root resolution propagates these to the caller; during
/// `populate` they are absorbed into log events and the crawl
/// continues with the node's siblings.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The archive returned no entries. In practice this usually means
    /// the caller's address is being rate-limited; retry after a
    /// cool-off.
    #[error("archive returned no entries for the query")]
    Unresolvable,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Bib(#[from] BibError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
