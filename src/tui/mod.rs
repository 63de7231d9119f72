//! Terminal UI.
//!
//! The UI is a pure consumer of the engine's event buses: a query form,
//! a log pane, a PDF pane, a network sparkline and the rendered tree.
//! It owns the buses it subscribes to and wires them into each crawl it
//! launches.

mod app;
mod ui;

pub use app::run;
