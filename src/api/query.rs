//! Query-request values and their URL encoding.

use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::cache::Cache;

/// One search against the archive's query endpoint.
///
/// At least one of `id_list`, `author` or `title` must be non-empty.
/// Two requests with identical fields are equal and hash identically,
/// which is what makes the value usable as a cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Comma-delimited identifiers.
    pub id_list: String,
    pub author: String,
    pub title: String,
    /// Result offset; omitted from the query string when zero.
    pub start: u32,
    /// Result cap; omitted from the query string when zero.
    pub max_results: u32,
    /// Category filter, e.g. `cs.RO`.
    pub category: String,
}

impl QueryRequest {
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { id_list: id.into(), ..Self::default() }
    }

    #[must_use]
    pub fn by_author(author: impl Into<String>) -> Self {
        Self { author: author.into(), ..Self::default() }
    }

    #[must_use]
    pub fn by_title(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Self::default() }
    }
}

/// Render `req` as the archive's query string, memoised in `cache`.
///
/// Field order is fixed: `search_query`, `id_list`, `start`,
/// `max_results`, `cat`. A title takes precedence over an author for
/// the `search_query` field.
pub fn build_query_string(
    cache: &Cache<QueryRequest, String>,
    req: &QueryRequest,
) -> Result<String, ApiError> {
    if let Some(cached) = cache.get(req) {
        return Ok(cached);
    }

    let mut parts: Vec<String> = Vec::new();
    if !req.title.is_empty() {
        parts.push(format!("search_query=ti:{}", req.title));
    } else if !req.author.is_empty() {
        parts.push(format!("search_query=au:{}", req.author));
    }
    if !req.id_list.is_empty() {
        parts.push(format!("id_list={}", req.id_list));
    }
    if req.start != 0 {
        parts.push(format!("start={}", req.start));
    }
    if req.max_results != 0 {
        parts.push(format!("max_results={}", req.max_results));
    }
    if !req.category.is_empty() {
        parts.push(format!("cat={}", req.category));
    }

    if parts.is_empty() {
        return Err(ApiError::EmptyQuery);
    }
    let rendered = parts.join("&");
    cache.set(req.clone(), rendered.clone());
    Ok(rendered)
}

/// Percent-escape a query string for use as a URL path segment.
///
/// Unreserved characters and the sub-delims the archive relies on
/// (`&`, `=`, `:` among them) pass through; everything else, spaces
/// included, becomes `%XX`.
#[must_use]
pub fn path_escape(s: &str) -> String {
    const SAFE: &[u8] = b"-._~$&+:=@!'()*";
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if b.is_ascii_alphanumeric() || SAFE.contains(&b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}
