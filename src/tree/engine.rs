//! The concurrent crawl engine.
//!
//! `populate` is a recursive bounded-parallel expander: every node's
//! visit callback fires immediately, its bibliography is fetched and
//! parsed, one child node is attached per bibliography entry in order,
//! and each child is expanded on its own task after acquiring a permit
//! from the shared worker pool. Per-node failures are absorbed into log
//! events; only the root resolution can abort a crawl.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use futures::future::BoxFuture;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::api::{ArxivClient, QueryRequest, atom};
use crate::archive;
use crate::bib::{self, BibEntry};
use crate::events::{LogBus, NetBus, PdfBus};
use crate::utils::{POOL_PERMITS_PER_CPU, pdf_path, safe_truncate_chars};

use super::error::TreeError;
use super::node::{CiteNode, RecordInfo};

/// Fire-and-forget callback invoked for every visited node.
pub type VisitFn = Arc<dyn Fn(Arc<CiteNode>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Number of permits the global worker pool is seeded with.
#[must_use]
pub fn worker_pool_capacity() -> usize {
    POOL_PERMITS_PER_CPU * num_cpus::get()
}

static WORKER_POOL: OnceLock<Arc<Semaphore>> = OnceLock::new();

/// The process-wide expansion pool shared by all concurrent crawls.
#[must_use]
pub fn worker_pool() -> Arc<Semaphore> {
    Arc::clone(WORKER_POOL.get_or_init(|| Arc::new(Semaphore::new(worker_pool_capacity()))))
}

/// Consumers and callbacks attached to one `populate` run.
#[derive(Clone)]
pub struct PopulateHooks {
    /// Invoked for every node as it is visited, on its own task.
    /// Panics here are not caught by the engine.
    pub on_visit: Option<VisitFn>,
    /// Receives breadcrumbs and absorbed per-node errors.
    pub log_bus: Option<LogBus>,
    /// Receive one event per HTTP body read.
    pub net_buses: Vec<NetBus>,
    /// Emit per-node progress through the log facade as well.
    pub log_nodes: bool,
}

impl Default for PopulateHooks {
    fn default() -> Self {
        Self { on_visit: None, log_bus: None, net_buses: Vec::new(), log_nodes: true }
    }
}

/// Ties client, caches, limiter and worker pool into one crawl surface.
/// Cloning is cheap and clones share all of them.
#[derive(Clone)]
pub struct CrawlEngine {
    client: Arc<ArxivClient>,
    pool: Arc<Semaphore>,
}

impl CrawlEngine {
    /// Engine on the process-wide worker pool.
    #[must_use]
    pub fn new(client: Arc<ArxivClient>) -> Self {
        Self::with_pool(client, worker_pool())
    }

    /// Engine on a caller-supplied pool; tests use this to pin the
    /// parallelism bound.
    #[must_use]
    pub fn with_pool(client: Arc<ArxivClient>, pool: Arc<Semaphore>) -> Self {
        Self { client, pool }
    }

    #[must_use]
    pub fn client(&self) -> &Arc<ArxivClient> {
        &self.client
    }

    /// Resolve the root record for `query` and return it as a
    /// parentless tree node.
    ///
    /// One query, one source download, one extraction, one bibliography
    /// scan. An empty result set fails with [`TreeError::Unresolvable`];
    /// a source archive without a bibliography is not an error, the
    /// node simply has nothing to expand into.
    pub async fn make_root(
        &self,
        query: &QueryRequest,
        hooks: &PopulateHooks,
    ) -> Result<Arc<CiteNode>, TreeError> {
        let mut info = RecordInfo::default();
        self.resolve_record(&mut info, query, hooks).await?;
        self.attach_bibliography(&mut info, hooks).await?;
        Ok(CiteNode::root(info))
    }

    /// Fill `info` from the first entry the archive returns for `query`.
    async fn resolve_record(
        &self,
        info: &mut RecordInfo,
        query: &QueryRequest,
        hooks: &PopulateHooks,
    ) -> Result<(), TreeError> {
        let body = self.client.query(query, &hooks.net_buses).await?;
        let entries = atom::parse_feed(&body);
        let Some(first) = entries.first() else {
            return Err(TreeError::Unresolvable);
        };
        info.identifier = first.id.rsplit('/').next().unwrap_or_default().to_string();
        info.title = first.title.clone();
        info.author = first.authors.first().map(|a| a.name.clone()).unwrap_or_default();
        Ok(())
    }

    /// Download and extract the node's source archive, then record the
    /// first bibliography file found inside it. Temp locations are left
    /// for the OS to clean up.
    async fn attach_bibliography(
        &self,
        info: &mut RecordInfo,
        hooks: &PopulateHooks,
    ) -> Result<(), TreeError> {
        let source_path = persist_temp_file(&info.identifier)?;
        info.source_path = source_path.clone();
        self.client
            .download_source(&info.identifier, &source_path, &hooks.net_buses)
            .await?;

        let extract_dir = persist_temp_dir(&info.identifier)?;
        let dir = extract_dir.clone();
        run_blocking(move || archive::extract_targz(&source_path, &dir)).await??;

        if let Some(bib) = run_blocking(move || archive::find_bibliography(&extract_dir)).await? {
            info.bib_path = bib;
        }
        Ok(())
    }

    /// Resolve the node's bibliography into one `RecordInfo` per cited
    /// work, in bibliography order.
    ///
    /// Acquires a bibliography first when the node does not have one
    /// yet; a node that still has none afterwards expands to nothing.
    /// Source downloads for the returned records are deferred to their
    /// own populate step.
    pub async fn expand(
        &self,
        node: &Arc<CiteNode>,
        hooks: &PopulateHooks,
    ) -> Result<Vec<RecordInfo>, TreeError> {
        let mut info = node.info();
        if !info.has_bibliography() {
            self.attach_bibliography(&mut info, hooks).await?;
            let (source_path, bib_path) = (info.source_path.clone(), info.bib_path.clone());
            node.update_info(move |record| {
                record.source_path = source_path;
                record.bib_path = bib_path;
            });
        }
        if !info.has_bibliography() {
            return Ok(Vec::new());
        }

        let bib_path = info.bib_path.clone();
        let entries = run_blocking(move || bib::read_bib_file(&bib_path)).await??;

        let mut infos = Vec::with_capacity(entries.len());
        for entry in entries {
            infos.push(self.resolve_entry(entry, hooks).await);
        }
        Ok(infos)
    }

    /// Resolve one bibliography entry to an archive identifier by
    /// querying for its title.
    ///
    /// Failures are absorbed: the entry still yields a record carrying
    /// whatever was resolved, so bibliography order is preserved and an
    /// unresolvable citation becomes an empty subtree.
    async fn resolve_entry(&self, entry: BibEntry, hooks: &PopulateHooks) -> RecordInfo {
        let mut info = RecordInfo { entry: Some(entry.clone()), ..RecordInfo::default() };
        let (author, title) = match bib::query_entry(&entry) {
            Ok(pair) => pair,
            Err(err) => {
                log::debug!("bibliography entry {} not resolvable: {err}", entry.key);
                return info;
            }
        };
        info.author = author;
        info.title = title.clone();

        match self.client.query(&QueryRequest::by_title(title), &hooks.net_buses).await {
            Ok(body) => {
                let entries = atom::parse_feed(&body);
                if let Some(first) = entries.first() {
                    info.identifier = first.id.rsplit('/').next().unwrap_or_default().to_string();
                } else {
                    log::warn!("no archive entry for {:?}", info.title);
                    self.emit_log(hooks, format!("Parsing XML Failed for {}", info.title)).await;
                }
            }
            Err(err) => {
                log::warn!("query failed for {:?}: {err}", info.title);
                self.emit_log(hooks, format!("Error: {err}")).await;
            }
        }
        info
    }

    /// Expand `root` to `depth` levels.
    ///
    /// Siblings expand in parallel under the worker-pool bound; the
    /// call returns only after every transitively spawned task has
    /// completed.
    pub async fn populate(&self, root: Arc<CiteNode>, depth: i32, hooks: PopulateHooks) {
        Self::populate_inner(self.clone(), root, depth, String::new(), Arc::new(hooks)).await;
    }

    fn populate_inner(
        engine: CrawlEngine,
        node: Arc<CiteNode>,
        depth: i32,
        prefix: String,
        hooks: Arc<PopulateHooks>,
    ) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            let info = node.info();
            let crumb = format!(
                "{prefix}{} {}: {}",
                info.identifier,
                safe_truncate_chars(&info.author, 20),
                safe_truncate_chars(&info.title, 60),
            );
            if hooks.log_nodes {
                log::info!("populating depth-{depth} tree for {crumb}");
            }
            if let Some(on_visit) = &hooks.on_visit {
                tokio::spawn(on_visit(Arc::clone(&node)));
            }
            engine.emit_log(&hooks, crumb).await;

            if depth <= 0 {
                return;
            }

            let infos = match engine.expand(&node, &hooks).await {
                Ok(infos) => infos,
                Err(err) => {
                    log::warn!("could not expand {}: {err}", info.identifier);
                    engine.emit_log(&hooks, format!("Error: {err}")).await;
                    let _ = node.install_children(Vec::new());
                    return;
                }
            };

            let children: Vec<Arc<CiteNode>> = infos
                .into_iter()
                .map(|child| CiteNode::child_of(&node, child))
                .collect();
            if !node.install_children(children.clone()) {
                log::warn!("children already installed for {}", info.identifier);
                return;
            }

            let mut tasks = JoinSet::new();
            for child in children {
                let Ok(permit) = Arc::clone(&engine.pool).acquire_owned().await else {
                    break;
                };
                let engine = engine.clone();
                let hooks = Arc::clone(&hooks);
                let prefix = format!("{prefix}-> ");
                tasks.spawn(async move {
                    let _permit = permit;
                    CrawlEngine::populate_inner(engine, child, depth - 1, prefix, hooks).await;
                });
            }
            while tasks.join_next().await.is_some() {}
        })
    }

    /// Visit callback that downloads each visited record's PDF into
    /// `output_dir` as `{title with '/' removed}_{id}.pdf`.
    ///
    /// Records without an identifier report "Could not download PDF"
    /// on the PDF bus; download failures land on the log bus and the
    /// file is not left on disk.
    #[must_use]
    pub fn pdf_visitor(
        &self,
        output_dir: PathBuf,
        pdf_bus: Option<PdfBus>,
        log_bus: Option<LogBus>,
        net_buses: Vec<NetBus>,
    ) -> VisitFn {
        let client = Arc::clone(&self.client);
        Arc::new(move |node: Arc<CiteNode>| -> BoxFuture<'static, ()> {
            let client = Arc::clone(&client);
            let output_dir = output_dir.clone();
            let pdf_bus = pdf_bus.clone();
            let log_bus = log_bus.clone();
            let net_buses = net_buses.clone();
            Box::pin(async move {
                let info = node.info();
                if info.identifier.is_empty() {
                    let message =
                        format!("Could not download PDF {}", safe_truncate_chars(&info.title, 40));
                    log::info!("{message}");
                    if let Some(bus) = &pdf_bus {
                        let _ = bus.send(message).await;
                    }
                    return;
                }

                let outfile = pdf_path(&output_dir, &info.title, &info.identifier);
                match client.download_pdf(&info.identifier, &outfile, &net_buses).await {
                    Ok(()) => {
                        let message = format!(
                            "PDF: {}: {}",
                            safe_truncate_chars(&info.author, 20),
                            safe_truncate_chars(&info.title, 60),
                        );
                        log::info!("{message}");
                        if let Some(bus) = &pdf_bus {
                            let _ = bus.send(message).await;
                        }
                    }
                    Err(err) => {
                        log::warn!("could not download PDF for {}: {err}", info.identifier);
                        if let Some(bus) = &log_bus {
                            let _ = bus.send(format!("Error: {err}")).await;
                        }
                    }
                }
            })
        })
    }

    async fn emit_log(&self, hooks: &PopulateHooks, message: String) {
        if let Some(bus) = &hooks.log_bus {
            if let Err(err) = bus.send(message).await {
                log::debug!("log event not delivered: {err}");
            }
        }
    }
}

/// Create a kept temp file named after the identifier; the OS temp
/// cleaner owns its lifetime.
fn persist_temp_file(id: &str) -> Result<PathBuf, TreeError> {
    let path = tempfile::Builder::new()
        .prefix(id)
        .tempfile()?
        .into_temp_path()
        .keep()
        .map_err(|err| TreeError::Io(err.error))?;
    Ok(path)
}

/// Create a kept temp directory named after the identifier.
fn persist_temp_dir(id: &str) -> Result<PathBuf, TreeError> {
    Ok(tempfile::Builder::new().prefix(id).tempdir()?.keep())
}

async fn run_blocking<T: Send + 'static>(
    f: impl FnOnce() -> T + Send + 'static,
) -> Result<T, TreeError> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| TreeError::Io(io::Error::other(err)))
}
