//! The tracking poll loop.
//!
//! One task owns the database and the [`TrackingRun`]. Ticks fire on a fixed
//! interval; a failed tick is logged and the loop keeps going. When the
//! cancellation token fires, the loop exits and the run is finalized once.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, SubsecRound, Utc};
use ft_core::{
    ActivityMonitor, IdleDetector, SessionSummary, TrackerSettings, TrackingRun, Transition,
};
use ft_db::Database;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Wall-clock time truncated to whole seconds.
///
/// Run boundaries use it so they line up with tick samples, which are
/// stamped at whole seconds.
pub fn sample_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Polls until `cancel` fires, then closes the open session and saves the
/// run summary.
///
/// Must run on a multi-threaded runtime: sampling shells out and blocks.
pub async fn track<M: ActivityMonitor + Sync>(
    db: &mut Database,
    monitor: &M,
    detector: &IdleDetector,
    settings: TrackerSettings,
    poll_interval: Duration,
    cancel: CancellationToken,
) -> Result<Option<SessionSummary>> {
    let mut run = TrackingRun::start(settings, sample_time());
    tracing::info!(started_at = %run.started_at(), ?poll_interval, "tracking started");

    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Utc::now();
                let result = tokio::task::block_in_place(|| run.tick(db, detector, monitor, now));
                match result {
                    Ok(report) => {
                        if let Transition::Switched { switch, .. } = &report.transition {
                            tracing::debug!(from = ?switch.from, to = %switch.to, "switch logged");
                        }
                    }
                    Err(err) => tracing::error!(error = %err, "tick failed"),
                }
            }
            () = cancel.cancelled() => {
                tracing::info!("tracking loop shutting down");
                break;
            }
        }
    }

    let summary = tokio::task::block_in_place(|| run.finish(db, sample_time()))
        .context("failed to finalize tracking run")?;
    Ok(summary)
}
