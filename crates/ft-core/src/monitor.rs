//! Foreground activity sampling.
//!
//! The OS accessors live outside this crate. They plug in through
//! [`ActivityMonitor`], which separates the one field the state machine
//! needs (the application name) from best-effort window metadata.

use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::idle::IdleDetector;
use crate::types::StateLabel;

/// Errors reported by an activity monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The platform could not report the requested field.
    #[error("{field} unavailable: {message}")]
    Unavailable {
        field: &'static str,
        message: String,
    },
    /// The platform reported a blank foreground application.
    #[error("foreground application name is empty")]
    EmptyAppName,
}

/// Foreground application and window metadata at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub app_name: String,
    pub window_title: String,
    pub bundle_id: String,
}

/// Source of foreground application information.
pub trait ActivityMonitor {
    /// Name of the frontmost application. Required.
    fn app_name(&self) -> Result<String, MonitorError>;

    /// Title of the frontmost window.
    fn window_title(&self) -> Result<String, MonitorError>;

    /// Platform bundle / class identifier of the frontmost application.
    fn bundle_id(&self) -> Result<String, MonitorError>;

    /// Samples all three fields.
    ///
    /// A missing application name is an error. Missing metadata is logged
    /// and replaced by an empty string.
    fn sample(&self) -> Result<WindowSnapshot, MonitorError> {
        let app_name = self.app_name()?;
        if app_name.trim().is_empty() {
            return Err(MonitorError::EmptyAppName);
        }
        Ok(WindowSnapshot {
            app_name,
            window_title: best_effort("window title", self.window_title()),
            bundle_id: best_effort("bundle id", self.bundle_id()),
        })
    }
}

fn best_effort(field: &'static str, result: Result<String, MonitorError>) -> String {
    result.unwrap_or_else(|err| {
        tracing::warn!(field, error = %err, "window metadata unavailable");
        String::new()
    })
}

/// One observation of user state, produced once per tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitySample {
    pub timestamp: DateTime<Utc>,
    pub label: StateLabel,
    pub window_title: String,
    pub bundle_id: String,
}

impl ActivitySample {
    /// An idle sample; idle carries no window metadata.
    pub const fn idle(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            label: StateLabel::Idle,
            window_title: String::new(),
            bundle_id: String::new(),
        }
    }

    pub fn active(
        timestamp: DateTime<Utc>,
        snapshot: WindowSnapshot,
    ) -> Result<Self, MonitorError> {
        let label = StateLabel::app(snapshot.app_name).map_err(|_| MonitorError::EmptyAppName)?;
        Ok(Self {
            timestamp,
            label,
            window_title: snapshot.window_title,
            bundle_id: snapshot.bundle_id,
        })
    }
}

/// Builds the sample for one tick.
///
/// The idle detector is consulted first; the monitor is only queried when
/// the user is active. Idle state is judged at the exact `now`, while the
/// sample is stamped at whole seconds like session durations.
pub fn take_sample<M: ActivityMonitor + ?Sized>(
    detector: &IdleDetector,
    monitor: &M,
    idle_threshold: TimeDelta,
    now: DateTime<Utc>,
) -> Result<ActivitySample, MonitorError> {
    let timestamp = now.trunc_subsecs(0);
    if detector.is_idle_at(idle_threshold, now) {
        return Ok(ActivitySample::idle(timestamp));
    }
    ActivitySample::active(timestamp, monitor.sample()?)
}
