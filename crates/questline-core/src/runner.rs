//! The passive drift scheduler.
//!
//! [`run_drift_loop`] is the external scheduler that drives passive drift:
//! every tick it samples one health reading per user and applies it
//! through the [`ProgressionService`], so drift goes through the same
//! versioned commit path as quest completions. A failure for one user is
//! logged and counted; it never stops the loop.

use tracing::{debug, info, warn};

use questline_types::{Attributes, UserId};

use crate::control::{DriftControl, DriftEndReason};
use crate::service::{ProgressionService, ServiceError};
use crate::signals::HealthSignalSource;
use crate::store::ProgressionStore;

/// Outcome of one drift tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftTickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Users whose drift committed, with their new attributes.
    pub applied: Vec<(UserId, Attributes)>,
    /// Users whose drift lost every commit attempt to a conflict.
    pub conflicted: Vec<UserId>,
    /// Users whose drift failed for any other reason.
    pub failed: Vec<UserId>,
}

/// Totals for a whole drift run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftRunSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Successful per-user drift applications.
    pub applied: u64,
    /// Per-user ticks dropped after exhausting commit retries.
    pub conflicts_exhausted: u64,
    /// Per-user ticks that failed for other reasons.
    pub failures: u64,
    /// Why the loop returned.
    pub end_reason: DriftEndReason,
}

/// Callback invoked after each drift tick.
pub trait DriftTickCallback: Send {
    /// Called once per tick after every user has been processed.
    fn on_tick(&mut self, report: &DriftTickReport);
}

/// A no-op callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl DriftTickCallback for NoOpCallback {
    fn on_tick(&mut self, _report: &DriftTickReport) {}
}

/// Run one drift tick for every user.
pub fn run_drift_tick<S: ProgressionStore>(
    service: &ProgressionService<S>,
    users: &[UserId],
    source: &mut dyn HealthSignalSource,
    tick: u64,
) -> DriftTickReport {
    let mut report = DriftTickReport {
        tick,
        ..DriftTickReport::default()
    };
    for &user in users {
        let reading = source.sample(user, tick);
        match service.apply_drift(user, &reading) {
            Ok(attributes) => report.applied.push((user, attributes)),
            Err(ServiceError::PersistenceConflict { attempts, .. }) => {
                warn!(%user, tick, attempts, "drift tick dropped after repeated conflicts");
                report.conflicted.push(user);
            }
            Err(e) => {
                warn!(%user, tick, error = %e, "drift tick failed");
                report.failed.push(user);
            }
        }
    }
    report
}

/// Apply passive drift to `users` until the tick limit or a stop request.
pub async fn run_drift_loop<S: ProgressionStore>(
    service: &ProgressionService<S>,
    users: &[UserId],
    source: &mut dyn HealthSignalSource,
    control: &DriftControl,
    callback: &mut dyn DriftTickCallback,
) -> DriftRunSummary {
    let mut summary = DriftRunSummary {
        ticks: 0,
        applied: 0,
        conflicts_exhausted: 0,
        failures: 0,
        end_reason: DriftEndReason::Stopped,
    };

    info!(
        users = users.len(),
        max_ticks = control.max_ticks(),
        tick_interval_ms = control.tick_interval_ms(),
        "drift loop starting"
    );

    loop {
        if control.is_paused() {
            info!("drift loop paused");
            control.wait_if_paused().await;
            info!("drift loop resumed");
        }

        if control.is_stop_requested() {
            summary.end_reason = DriftEndReason::Stopped;
            return summary;
        }

        let tick = summary.ticks.saturating_add(1);
        let report = run_drift_tick(service, users, source, tick);
        summary.ticks = tick;
        summary.applied = summary.applied.saturating_add(len_u64(report.applied.len()));
        summary.conflicts_exhausted = summary
            .conflicts_exhausted
            .saturating_add(len_u64(report.conflicted.len()));
        summary.failures = summary.failures.saturating_add(len_u64(report.failed.len()));
        debug!(
            tick,
            applied = report.applied.len(),
            conflicted = report.conflicted.len(),
            failed = report.failed.len(),
            "drift tick complete"
        );
        callback.on_tick(&report);

        if control.tick_limit_reached(summary.ticks) {
            summary.end_reason = DriftEndReason::MaxTicksReached;
            return summary;
        }

        control.sleep_interval().await;
    }
}

/// Log the end of a drift run.
pub fn log_drift_end(summary: &DriftRunSummary) {
    info!(
        reason = ?summary.end_reason,
        ticks = summary.ticks,
        applied = summary.applied,
        conflicts_exhausted = summary.conflicts_exhausted,
        failures = summary.failures,
        "drift loop ended"
    );
    if summary.ticks == 0 {
        warn!("drift loop ended with no ticks executed");
    }
}

fn len_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}
