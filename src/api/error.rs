//! Error types for archive API operations.

/// Errors surfaced by the query builder and HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No searchable field was set on the query request.
    #[error("no searchable field set on the query request")]
    EmptyQuery,

    /// The archive answered with a non-200 status.
    #[error("status not ok for {id}: {code}")]
    HttpStatus { id: String, code: u16 },

    /// The HTTP client itself failed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Filesystem create/write/read failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
