//! Single-producer single-consumer event pipe with a pump in between.
//!
//! A bus is two bounded slots and a background pump: senders put values
//! on the private inbound slot, the pump applies the bus transform,
//! records the result in the `last` slot and forwards it to the public
//! outbound slot where the one reader picks it up. The transform runs on
//! the pump task only, so it always sees a sequential stream.
//!
//! Capacity bounds both slots. Callers that ask for capacity 0 want a
//! rendezvous; tokio channels have a one-slot floor, so 0 maps to the
//! tightest bound and senders still park until the pump drains the slot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::errors::BusError;

type Transform<I, O> = Arc<dyn Fn(I) -> O + Send + Sync>;

/// Typed event conduit. `I` is what producers send, `O` what the reader
/// receives after the transform; they coincide for a plain pipe.
pub struct EventBus<I, O = I> {
    tx: mpsc::Sender<I>,
    enabled: Arc<AtomicBool>,
    last: Arc<Mutex<Option<O>>>,
    out_rx: Arc<Mutex<Option<mpsc::Receiver<O>>>>,
}

impl<I, O> Clone for EventBus<I, O> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            enabled: Arc::clone(&self.enabled),
            last: Arc::clone(&self.last),
            out_rx: Arc::clone(&self.out_rx),
        }
    }
}

impl<I> EventBus<I>
where
    I: Clone + Send + 'static,
{
    /// A pass-through bus: the transform is the identity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_transform(capacity, |v| v)
    }
}

impl<I, O> EventBus<I, O>
where
    I: Send + 'static,
    O: Clone + Send + 'static,
{
    /// A bus whose pump reshapes every value through `transform`.
    ///
    /// Must be called within a tokio runtime: the pump is spawned here.
    #[must_use]
    pub fn with_transform(capacity: usize, transform: impl Fn(I) -> O + Send + Sync + 'static) -> Self {
        let bound = capacity.max(1);
        let (tx, in_rx) = mpsc::channel::<I>(bound);
        let (out_tx, out_rx) = mpsc::channel::<O>(bound);
        let last: Arc<Mutex<Option<O>>> = Arc::new(Mutex::new(None));

        let transform: Transform<I, O> = Arc::new(transform);
        tokio::spawn(Self::pump(in_rx, out_tx, Arc::clone(&last), transform));

        Self {
            tx,
            enabled: Arc::new(AtomicBool::new(true)),
            last,
            out_rx: Arc::new(Mutex::new(Some(out_rx))),
        }
    }

    /// Move values inbound → transform → last → outbound until either
    /// side of the pipe closes.
    async fn pump(
        mut in_rx: mpsc::Receiver<I>,
        out_tx: mpsc::Sender<O>,
        last: Arc<Mutex<Option<O>>>,
        transform: Transform<I, O>,
    ) {
        while let Some(item) = in_rx.recv().await {
            let out = transform(item);
            *last.lock() = Some(out.clone());
            if out_tx.send(out).await.is_err() {
                // Reader went away; nothing left to deliver to.
                return;
            }
        }
    }

    /// Put a value on the inbound slot. Blocks when the slot is full,
    /// which is the backpressure fast producers rely on.
    pub async fn send(&self, value: I) -> Result<(), BusError> {
        if !self.is_enabled() {
            return Err(BusError::Disabled);
        }
        self.tx.send(value).await.map_err(|_| BusError::Closed)
    }

    /// Accept new sends again.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Refuse new sends. Values already in flight still reach the reader.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// The most recently delivered value, if any.
    #[must_use]
    pub fn get_last(&self) -> Option<O> {
        self.last.lock().clone()
    }

    /// Detach the public outbound slot. A bus has exactly one reader;
    /// the second call returns `None`.
    #[must_use]
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<O>> {
        self.out_rx.lock().take()
    }
}
