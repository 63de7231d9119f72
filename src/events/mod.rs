//! Typed event conduits between the crawl engine and UI consumers.

pub mod bus;
pub mod errors;
pub mod types;

pub use bus::EventBus;
pub use errors::BusError;
pub use types::{LogBus, NetBus, NetworkEvent, PdfBus, TreeUpdateBus};
