//! Archive API surface: query building, the HTTP client and the Atom
//! response parser.

pub mod atom;
pub mod client;
pub mod error;
pub mod query;

pub use atom::{AtomAuthor, AtomEntry, AtomLink, parse_feed};
pub use client::ArxivClient;
pub use error::ApiError;
pub use query::QueryRequest;
