//! Global pacing of outbound requests against the archive host.
//!
//! The limiter is one tick source shared by every task in the process:
//! when enabled, each caller of [`RateLimiter::wait_if_enabled`] blocks
//! until the next tick, so consecutive requests are spaced at least one
//! period apart across the whole crawl rather than per subtree. When the
//! limiter is disabled, callers pass straight through.
//!
//! A process-wide instance lives behind [`global`]; tests construct
//! isolated instances with [`RateLimiter::new`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::utils::DEFAULT_RATE_PERIOD;

/// Minimum-interval request limiter.
///
/// The interval is created lazily on first wait so the limiter can be
/// constructed outside a runtime (e.g. in statics). All waiters share one
/// tick stream serialised through a mutex, which is exactly what gives
/// the global spacing guarantee.
#[derive(Debug)]
pub struct RateLimiter {
    enabled: AtomicBool,
    period: parking_lot::Mutex<Duration>,
    ticker: Mutex<Option<Interval>>,
}

impl RateLimiter {
    /// A disabled limiter ticking at `period` once enabled.
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            period: parking_lot::Mutex::new(period),
            ticker: Mutex::new(None),
        }
    }

    /// Start enforcing the interval. Idempotent.
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Stop enforcing the interval; waiters already parked on a tick
    /// still complete it.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Block until the next tick when the limiter is enabled; return
    /// immediately otherwise.
    pub async fn wait_if_enabled(&self) {
        if !self.is_enabled() {
            return;
        }
        let mut guard = self.ticker.lock().await;
        let period = *self.period.lock();
        let ticker = guard.get_or_insert_with(|| Self::make_interval(period));
        ticker.tick().await;
    }

    /// Replace the tick period. Takes effect for the next waiter.
    pub async fn reset(&self, period: Duration) {
        *self.period.lock() = period;
        // Drop the current interval so the next wait rebuilds it.
        *self.ticker.lock().await = None;
    }

    fn make_interval(period: Duration) -> Interval {
        // First tick after one full period, matching a ticker that was
        // just started; Delay keeps late ticks at least a period apart.
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_PERIOD)
    }
}

static GLOBAL_LIMITER: OnceLock<Arc<RateLimiter>> = OnceLock::new();

/// The process-wide limiter every production client routes through.
#[must_use]
pub fn global() -> Arc<RateLimiter> {
    Arc::clone(GLOBAL_LIMITER.get_or_init(|| Arc::new(RateLimiter::default())))
}
