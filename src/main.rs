//! citetree binary: terminal UI by default, line mode on request.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{ArgAction, Parser};

use citetree::config::{QueryMode, TreeConfig};
use citetree::tree::{PopulateHooks, traverse, visualize};
use citetree::utils::DEFAULT_OUTPUT_DIR;

/// Build a citation tree rooted at an arXiv preprint.
#[derive(Debug, Parser)]
#[command(name = "citetree", version, about)]
struct Cli {
    /// Launch the terminal UI; pass `--tui false` for line mode.
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    tui: bool,

    /// Output directory for downloaded PDFs.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    dir: PathBuf,

    /// Write a DOT graph of the finished tree to this path.
    #[arg(long)]
    viz_out: Option<PathBuf>,

    /// Search by author name.
    #[arg(long, conflicts_with_all = ["title", "id"])]
    author: bool,

    /// Search by title (the default).
    #[arg(long, conflicts_with_all = ["author", "id"])]
    title: bool,

    /// Look up by archive identifier.
    #[arg(long, conflicts_with_all = ["author", "title"])]
    id: bool,

    /// Recursion depth; 0 resolves the root only.
    #[arg(long, default_value_t = 1)]
    depth: i32,

    /// Route every request through the shared rate limiter.
    #[arg(long)]
    safe: bool,

    /// Rate-limiter period in seconds.
    #[arg(long, default_value_t = 3)]
    rate_secs: u64,

    /// Suppress per-node progress logs.
    #[arg(long)]
    silent: bool,

    /// Append logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// The search value; prompted for in line mode when omitted.
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Without a log file, stderr records would fight the TUI for the
    // terminal; keep only warnings in that case.
    let quiet = cli.silent || (cli.tui && cli.log_file.is_none());
    citetree::logger::init(quiet, cli.log_file.as_deref())?;

    let mode = if cli.id {
        QueryMode::Id
    } else if cli.author {
        QueryMode::Author
    } else {
        QueryMode::Title
    };

    let mut query = cli.query.unwrap_or_default();
    if !cli.tui && query.is_empty() {
        query = prompt("query> ")?;
    }

    let config = TreeConfig::builder()
        .tui(cli.tui)
        .query_mode(mode)
        .query(query)
        .depth(cli.depth)
        .output_dir(cli.dir)
        .safe(cli.safe)
        .rate_period_secs(cli.rate_secs)
        .viz_out(cli.viz_out)
        .silent(cli.silent)
        .build()?;

    if config.tui() {
        citetree::tui::run(config).await
    } else {
        line_mode(config).await
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn line_mode(config: TreeConfig) -> Result<()> {
    citetree::logger::exit_on_interrupt();

    let engine = citetree::engine_for(&config).await;
    let hooks = PopulateHooks {
        on_visit: Some(engine.pdf_visitor(
            config.output_dir().to_path_buf(),
            None,
            None,
            Vec::new(),
        )),
        log_bus: None,
        net_buses: Vec::new(),
        log_nodes: !config.silent(),
    };

    let root = engine.make_root(&config.to_query_request(), &hooks).await?;
    engine.populate(Arc::clone(&root), config.depth(), hooks).await;

    let mut nodes = 0usize;
    traverse(&root, &mut |_| nodes += 1);
    log::info!("crawl finished with {nodes} nodes");

    if let Some(path) = config.viz_out() {
        visualize(&root, path)?;
        log::info!("wrote citation graph to {}", path.display());
    }

    // Visit tasks are fire-and-forget; give trailing PDF downloads a
    // moment to land before the process exits.
    tokio::time::sleep(Duration::from_secs(1)).await;
    Ok(())
}
