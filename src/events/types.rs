//! Event payloads carried on the buses.

use serde::{Deserialize, Serialize};

use super::EventBus;

/// Emitted once per successful HTTP body read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkEvent {
    /// Human-readable description of the transfer (body excerpt or
    /// target path).
    pub message: String,
    /// Number of body bytes read.
    pub size: usize,
}

impl NetworkEvent {
    /// Build an event from a raw body string, keeping at most 1 KiB of
    /// it as the message. This is the canonical transform installed on
    /// network buses whose producers send raw strings.
    #[must_use]
    pub fn from_body(body: String) -> Self {
        let size = body.len();
        let message = crate::utils::safe_truncate_chars(&body, 1024).to_string();
        Self { message, size }
    }
}

/// Network activity bus: one event per HTTP body read.
pub type NetBus = EventBus<NetworkEvent>;

/// Engine progress bus: depth-prefixed breadcrumbs and error text.
pub type LogBus = EventBus<String>;

/// PDF download progress bus.
pub type PdfBus = EventBus<String>;

/// Tree re-render signal bus.
pub type TreeUpdateBus = EventBus<bool>;
