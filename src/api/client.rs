//! HTTP client for the archive's query and download endpoints.
//!
//! Every operation consults the client's caches before touching the
//! network and passes through the shared rate limiter before every
//! actual request, so a crawl in safe mode is globally paced no matter
//! how many tasks fan out. Successful body reads are reported as
//! [`NetworkEvent`]s on every bus the caller supplies.

use std::path::Path;
use std::sync::Arc;

use crate::cache::Cache;
use crate::events::{NetBus, NetworkEvent};
use crate::rate_limit::RateLimiter;
use crate::utils::{ARXIV_API, ARXIV_SRC, safe_truncate_chars};

use super::error::ApiError;
use super::query::{self, QueryRequest};

/// Client for one archive host, holding the process-wide caches.
#[derive(Debug)]
pub struct ArxivClient {
    http: reqwest::Client,
    api_base: String,
    src_base: String,
    query_cache: Cache<QueryRequest, String>,
    body_cache: Cache<String, String>,
    limiter: Arc<RateLimiter>,
}

impl ArxivClient {
    /// Client against the live archive endpoints.
    #[must_use]
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self::with_base_urls(ARXIV_API, ARXIV_SRC, limiter)
    }

    /// Client against custom endpoints; tests point this at a local
    /// mock server.
    #[must_use]
    pub fn with_base_urls(
        api_base: impl Into<String>,
        src_base: impl Into<String>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            src_base: src_base.into(),
            query_cache: Cache::new(),
            body_cache: Cache::new(),
            limiter,
        }
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// GET the query endpoint for `req` and return the response body.
    ///
    /// The rendered query string is memoised per request value and the
    /// body per URL; a cache hit returns without touching the limiter
    /// or the network.
    pub async fn query(&self, req: &QueryRequest, buses: &[NetBus]) -> Result<String, ApiError> {
        let rendered = query::build_query_string(&self.query_cache, req)?;
        let url = format!("{}/query?{}", self.api_base, query::path_escape(&rendered));

        if let Some(body) = self.body_cache.get(&url) {
            log::debug!("query cache hit: {url}");
            return Ok(body);
        }

        self.limiter.wait_if_enabled().await;
        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus { id: rendered, code: status.as_u16() });
        }

        let body = resp.text().await?;
        self.body_cache.set(url, body.clone());
        self.emit(
            buses,
            NetworkEvent {
                message: safe_truncate_chars(&body, 1024).to_string(),
                size: body.len(),
            },
        )
        .await;
        Ok(body)
    }

    /// Download a record's gzipped source tarball to `outfile`.
    pub async fn download_source(
        &self,
        id: &str,
        outfile: &Path,
        buses: &[NetBus],
    ) -> Result<(), ApiError> {
        let url = format!("{}/src/{id}", self.src_base);
        self.fetch_to_file(&url, id, outfile, buses).await
    }

    /// Download a record's PDF to `outfile`.
    pub async fn download_pdf(
        &self,
        id: &str,
        outfile: &Path,
        buses: &[NetBus],
    ) -> Result<(), ApiError> {
        let url = format!("{}/pdf/{id}", self.src_base);
        self.fetch_to_file(&url, id, outfile, buses).await
    }

    async fn fetch_to_file(
        &self,
        url: &str,
        id: &str,
        outfile: &Path,
        buses: &[NetBus],
    ) -> Result<(), ApiError> {
        if let Some(parent) = outfile.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        self.limiter.wait_if_enabled().await;
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus { id: id.to_string(), code: status.as_u16() });
        }

        let body = resp.bytes().await?;
        self.emit(
            buses,
            NetworkEvent {
                message: format!("binary data for {}: {id}", outfile.display()),
                size: body.len(),
            },
        )
        .await;

        if let Err(err) = tokio::fs::write(outfile, &body).await {
            // Do not leave a half-written file behind.
            let _ = tokio::fs::remove_file(outfile).await;
            return Err(ApiError::Io(err));
        }
        Ok(())
    }

    async fn emit(&self, buses: &[NetBus], event: NetworkEvent) {
        for bus in buses {
            if let Err(err) = bus.send(event.clone()).await {
                log::debug!("network event not delivered: {err}");
            }
        }
    }
}
