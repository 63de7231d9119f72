//! Error conditions for event-bus operations.

/// Error returned by [`EventBus::send`](crate::events::EventBus::send).
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The bus was disabled; new sends are refused.
    #[error("event bus is disabled")]
    Disabled,

    /// The pump or reader went away; the pipe is closed.
    #[error("event bus is closed")]
    Closed,
}
