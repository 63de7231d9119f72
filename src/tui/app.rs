//! TUI state and event loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::future::BoxFuture;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;

use crate::config::{QueryMode, TreeConfig};
use crate::events::{EventBus, LogBus, NetBus, NetworkEvent, PdfBus, TreeUpdateBus};
use crate::tree::{CiteNode, PopulateHooks, VisitFn, visualize};

/// Scrollback kept per text pane.
const PANE_SCROLLBACK: usize = 200;

/// Samples kept for the network sparkline.
const NET_SAMPLES: usize = 120;

/// Run the TUI until the user quits.
pub async fn run(config: TreeConfig) -> Result<()> {
    let mut terminal = ratatui::init();
    let result = App::new(config).event_loop(&mut terminal).await;
    ratatui::restore();
    result
}

/// Which form row owns keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Focus {
    Mode,
    Query,
    Depth,
    Dir,
    Safe,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Mode => Self::Query,
            Self::Query => Self::Depth,
            Self::Depth => Self::Dir,
            Self::Dir => Self::Safe,
            Self::Safe => Self::Mode,
        }
    }
}

pub(super) struct FormState {
    pub(super) focus: Focus,
    pub(super) mode: QueryMode,
    pub(super) query: String,
    pub(super) depth: String,
    pub(super) dir: String,
    pub(super) safe: bool,
}

pub(super) struct App {
    config: TreeConfig,
    pub(super) form: FormState,
    pub(super) logs: Vec<String>,
    pub(super) pdfs: Vec<String>,
    pub(super) net_points: Vec<u64>,
    pub(super) net_last: Option<NetworkEvent>,
    pub(super) root: Option<Arc<CiteNode>>,
    pub(super) running: Arc<AtomicBool>,
    quit: bool,

    // Buses the UI subscribes to; clones of the send halves are wired
    // into each crawl.
    net_bus: NetBus,
    log_bus: LogBus,
    pdf_bus: PdfBus,
    tree_bus: TreeUpdateBus,
    net_rx: mpsc::Receiver<NetworkEvent>,
    log_rx: mpsc::Receiver<String>,
    pdf_rx: mpsc::Receiver<String>,
    tree_rx: mpsc::Receiver<bool>,

    root_tx: mpsc::Sender<Arc<CiteNode>>,
    root_rx: mpsc::Receiver<Arc<CiteNode>>,
}

impl App {
    fn new(config: TreeConfig) -> Self {
        let net_bus: NetBus = EventBus::new(64);
        // The log pump timestamps every line on its way through.
        let log_bus: LogBus =
            EventBus::with_transform(64, |line: String| {
                format!("{} {line}", chrono::Local::now().format("%H:%M:%S"))
            });
        let pdf_bus: PdfBus = EventBus::new(64);
        let tree_bus: TreeUpdateBus = EventBus::new(64);

        let net_rx = net_bus.take_receiver().expect("fresh bus");
        let log_rx = log_bus.take_receiver().expect("fresh bus");
        let pdf_rx = pdf_bus.take_receiver().expect("fresh bus");
        let tree_rx = tree_bus.take_receiver().expect("fresh bus");
        let (root_tx, root_rx) = mpsc::channel(1);

        let form = FormState {
            focus: Focus::Query,
            mode: config.query_mode(),
            query: config.query().to_string(),
            depth: config.depth().to_string(),
            dir: config.output_dir().display().to_string(),
            safe: config.safe(),
        };

        Self {
            config,
            form,
            logs: vec!["Awaiting New Query".to_string()],
            pdfs: Vec::new(),
            net_points: Vec::new(),
            net_last: None,
            root: None,
            running: Arc::new(AtomicBool::new(false)),
            quit: false,
            net_bus,
            log_bus,
            pdf_bus,
            tree_bus,
            net_rx,
            log_rx,
            pdf_rx,
            tree_rx,
            root_tx,
            root_rx,
        }
    }

    async fn event_loop(mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        // Redraw at roughly 15 Hz, draining input and buses in between.
        let mut tick = tokio::time::interval(Duration::from_millis(66));
        while !self.quit {
            tick.tick().await;
            while crossterm::event::poll(Duration::ZERO)? {
                if let Event::Key(key) = crossterm::event::read()? {
                    self.on_key(key);
                }
            }
            self.drain_buses();
            terminal.draw(|frame| super::ui::draw(frame, &self))?;
        }
        Ok(())
    }

    fn on_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit = true;
            return;
        }
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Tab => self.form.focus = self.form.focus.next(),
            KeyCode::Enter => self.start_crawl(),
            KeyCode::Left | KeyCode::Right if self.form.focus == Focus::Mode => {
                self.form.mode = match self.form.mode {
                    QueryMode::Id => QueryMode::Author,
                    QueryMode::Author => QueryMode::Title,
                    QueryMode::Title => QueryMode::Id,
                };
            }
            KeyCode::Char(' ') if self.form.focus == Focus::Safe => {
                self.form.safe = !self.form.safe;
            }
            KeyCode::Backspace => {
                if let Some(field) = self.focused_text_field() {
                    field.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.focused_text_field() {
                    field.push(c);
                }
            }
            _ => {}
        }
    }

    fn focused_text_field(&mut self) -> Option<&mut String> {
        match self.form.focus {
            Focus::Query => Some(&mut self.form.query),
            Focus::Depth => Some(&mut self.form.depth),
            Focus::Dir => Some(&mut self.form.dir),
            Focus::Mode | Focus::Safe => None,
        }
    }

    fn drain_buses(&mut self) {
        while let Ok(event) = self.net_rx.try_recv() {
            self.net_points.push(event.size as u64);
            if self.net_points.len() > NET_SAMPLES {
                self.net_points.remove(0);
            }
            self.net_last = Some(event);
        }
        while let Ok(line) = self.log_rx.try_recv() {
            push_bounded(&mut self.logs, line);
        }
        while let Ok(line) = self.pdf_rx.try_recv() {
            push_bounded(&mut self.pdfs, line);
        }
        while self.tree_rx.try_recv().is_ok() {
            // Re-render happens on the next draw; the signal only has
            // to wake the pane.
        }
        while let Ok(root) = self.root_rx.try_recv() {
            self.root = Some(root);
        }
    }

    /// Launch a crawl with the form's parameters on its own task. The
    /// UI keeps running; progress arrives over the buses.
    fn start_crawl(&mut self) {
        if self.running.load(Ordering::SeqCst) {
            push_bounded(&mut self.logs, "crawl already running".to_string());
            return;
        }
        let depth: i32 = self.form.depth.trim().parse().unwrap_or(1);
        let config = match TreeConfig::builder()
            .query_mode(self.form.mode)
            .query(self.form.query.trim())
            .depth(depth.max(0))
            .output_dir(self.form.dir.trim())
            .safe(self.form.safe)
            .rate_period_secs(self.config.rate_period().as_secs().max(1))
            .viz_out(self.config.viz_out().cloned())
            .silent(self.config.silent())
            .api_base(self.config.api_base())
            .src_base(self.config.src_base())
            .build()
        {
            Ok(config) => config,
            Err(err) => {
                push_bounded(&mut self.logs, format!("Error: {err}"));
                return;
            }
        };
        if config.query().is_empty() {
            push_bounded(&mut self.logs, "enter a query first".to_string());
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        self.root = None;

        let running = Arc::clone(&self.running);
        let net_bus = self.net_bus.clone();
        let log_bus = self.log_bus.clone();
        let pdf_bus = self.pdf_bus.clone();
        let tree_bus = self.tree_bus.clone();
        let root_tx = self.root_tx.clone();

        tokio::spawn(async move {
            let _ = log_bus.send("Parsing Query".to_string()).await;
            let engine = crate::engine_for(&config).await;

            let pdf_visit = engine.pdf_visitor(
                config.output_dir().to_path_buf(),
                Some(pdf_bus.clone()),
                Some(log_bus.clone()),
                vec![net_bus.clone()],
            );
            let visit_tree_bus = tree_bus.clone();
            let on_visit: VisitFn = Arc::new(move |node| -> BoxFuture<'static, ()> {
                let download = pdf_visit(node);
                let tree_bus = visit_tree_bus.clone();
                Box::pin(async move {
                    download.await;
                    let _ = tree_bus.send(true).await;
                })
            });

            let hooks = PopulateHooks {
                on_visit: Some(on_visit),
                log_bus: Some(log_bus.clone()),
                net_buses: vec![net_bus],
                log_nodes: !config.silent(),
            };

            match engine.make_root(&config.to_query_request(), &hooks).await {
                Ok(root) => {
                    let _ = root_tx.send(Arc::clone(&root)).await;
                    engine.populate(Arc::clone(&root), config.depth(), hooks).await;
                    if let Some(path) = config.viz_out() {
                        if let Err(err) = visualize(&root, path) {
                            let _ = log_bus.send(format!("Error: {err}")).await;
                        }
                    }
                    let _ = log_bus.send("Awaiting New Query".to_string()).await;
                }
                Err(err) => {
                    let _ = log_bus.send(format!("Error: {err}")).await;
                }
            }
            running.store(false, Ordering::SeqCst);
        });
    }
}

fn push_bounded(lines: &mut Vec<String>, line: String) {
    lines.push(line);
    if lines.len() > PANE_SCROLLBACK {
        lines.remove(0);
    }
}
