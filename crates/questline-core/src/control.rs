//! Shared control state for the drift scheduler.
//!
//! A [`DriftControl`] is shared (usually behind an [`Arc`]) between the
//! drift loop and whoever drives it: the simulation binary's shutdown
//! handler, a test, or a future admin surface. The pause and stop flags
//! are atomics so the loop reads them without locking.
//!
//! [`Arc`]: std::sync::Arc

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Shortest drift interval a configuration may set.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Why the drift loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriftEndReason {
    /// Reached the configured `max_ticks`.
    MaxTicksReached,
    /// A stop was requested.
    Stopped,
}

/// Runtime controls for the drift loop.
#[derive(Debug)]
pub struct DriftControl {
    paused: AtomicBool,
    resume_notify: Notify,
    stop_requested: AtomicBool,
    stop_notify: Notify,
    tick_interval_ms: u64,
    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,
}

impl DriftControl {
    /// Create controls with the given interval and tick limit.
    ///
    /// The constructor accepts any interval (tests use `0`); configured
    /// intervals are bounded by [`EngineConfig::validate`].
    ///
    /// [`EngineConfig::validate`]: crate::config::EngineConfig::validate
    pub fn new(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            stop_notify: Notify::new(),
            tick_interval_ms,
            max_ticks,
        }
    }

    /// Whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the loop before its next tick.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the loop and wake it.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the loop is no longer paused or a stop is requested.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    /// Request a clean stop. A sleeping loop wakes immediately.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
        self.resume_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Sleep for the current tick interval, returning early on stop.
    pub async fn sleep_interval(&self) {
        let ms = self.tick_interval_ms();
        if ms == 0 || self.is_stop_requested() {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(tokio::time::Duration::from_millis(ms)) => {}
            () = self.stop_notify.notified() => {}
        }
    }

    /// Current tick interval in milliseconds.
    pub const fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms
    }

    /// The configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Whether `ticks_run` has reached the limit.
    pub const fn tick_limit_reached(&self, ticks_run: u64) -> bool {
        self.max_ticks > 0 && ticks_run >= self.max_ticks
    }
}
