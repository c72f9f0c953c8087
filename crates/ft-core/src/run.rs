//! One tracked run: the per-tick pipeline and its terminal summary.

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::idle::{DEFAULT_IDLE_THRESHOLD, IdleDetector};
use crate::monitor::{ActivityMonitor, ActivitySample, MonitorError, take_sample};
use crate::store::{ActivityStore, StoreError};
use crate::summary::{SessionSummary, summarize};
use crate::switch::SwitchLogger;
use crate::timeline::{DEFAULT_TIMELINE_INTERVAL, TimelineEntry, TimelineSampler};
use crate::tracker::{SessionTracker, Transition};
use crate::types::ValidationError;

/// Errors from a single tick or from finishing a run.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The foreground application could not be determined; the tick is skipped.
    #[error("activity sample failed")]
    Monitor(#[from] MonitorError),
    /// A write or read against the store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The run was already finalized.
    #[error("tracking run already finished")]
    RunFinished,
}

/// Tuning for a tracked run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    pub idle_threshold: TimeDelta,
    pub timeline_interval: TimeDelta,
    pub emit_initial_switch: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            idle_threshold: DEFAULT_IDLE_THRESHOLD,
            timeline_interval: DEFAULT_TIMELINE_INTERVAL,
            emit_initial_switch: false,
        }
    }
}

impl TrackerSettings {
    /// Builds settings from whole-second values.
    pub fn from_secs(
        idle_threshold_secs: u64,
        timeline_interval_secs: u64,
        emit_initial_switch: bool,
    ) -> Result<Self, ValidationError> {
        if timeline_interval_secs == 0 {
            return Err(ValidationError::NonPositive {
                field: "timeline interval",
                value: 0,
            });
        }
        Ok(Self {
            idle_threshold: seconds("idle threshold", idle_threshold_secs)?,
            timeline_interval: seconds("timeline interval", timeline_interval_secs)?,
            emit_initial_switch,
        })
    }
}

/// Converts a second count into a `TimeDelta`, rejecting overflow.
pub fn seconds(field: &'static str, value: u64) -> Result<TimeDelta, ValidationError> {
    i64::try_from(value)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or(ValidationError::OutOfRange { field, value })
}

/// Everything one tick produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub sample: ActivitySample,
    pub transition: Transition,
    pub timeline: Option<TimelineEntry>,
}

/// State of one tracked run, from start until its summary is saved.
#[derive(Debug)]
pub struct TrackingRun {
    started_at: DateTime<Utc>,
    settings: TrackerSettings,
    tracker: SessionTracker,
    timeline: TimelineSampler,
    finished: bool,
}

impl TrackingRun {
    pub const fn start(settings: TrackerSettings, started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            settings,
            tracker: SessionTracker::new(SwitchLogger::new(settings.emit_initial_switch)),
            timeline: TimelineSampler::new(settings.timeline_interval, started_at),
            finished: false,
        }
    }

    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub const fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Runs one tick at `now`.
    ///
    /// Idle state is read first, then the monitor (only when active); the
    /// session transition is applied before the timeline check. A monitor
    /// failure skips the tick without touching any state.
    pub fn tick<S, M>(
        &mut self,
        store: &mut S,
        detector: &IdleDetector,
        monitor: &M,
        now: DateTime<Utc>,
    ) -> Result<TickReport, TrackError>
    where
        S: ActivityStore + ?Sized,
        M: ActivityMonitor + ?Sized,
    {
        if self.finished {
            return Err(TrackError::RunFinished);
        }
        let sample = take_sample(detector, monitor, self.settings.idle_threshold, now)?;
        let transition = self.tracker.observe(store, &sample)?;
        let timeline = self.timeline.observe(store, &sample)?;
        Ok(TickReport {
            sample,
            transition,
            timeline,
        })
    }

    /// Closes the open session and saves the run summary for
    /// `[started_at, now]`.
    ///
    /// Returns `None` if the run was already finished. If a write fails the
    /// run stays unfinished and `finish` can be retried.
    pub fn finish<S: ActivityStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionSummary>, TrackError> {
        if self.finished {
            return Ok(None);
        }
        self.tracker.finalize(store, now)?;
        let summary = summarize(store, self.started_at, now)?;
        self.finished = true;
        Ok(Some(summary))
    }
}
