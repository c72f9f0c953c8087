//! Idle detection from human input activity.
//!
//! Input producers (keyboard and pointer subscriptions) report activity
//! through [`IdleDetector::record_activity`] or [`ActivityPulse`]s, from any
//! thread. The poll loop asks [`IdleDetector::is_idle`] once per tick.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};

/// Default time without input before the user counts as idle.
pub const DEFAULT_IDLE_THRESHOLD: TimeDelta = TimeDelta::seconds(60);

/// A single "input activity happened" signal.
///
/// Pulses carry no payload beyond the moment they were produced, so a move,
/// click, scroll or key press all look the same here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityPulse {
    pub at: DateTime<Utc>,
}

impl ActivityPulse {
    pub fn now() -> Self {
        Self { at: Utc::now() }
    }
}

/// Tracks the time of the last human input.
///
/// The timestamp is guarded by a single mutex that is held only for the
/// duration of one read or one write.
#[derive(Debug)]
pub struct IdleDetector {
    last_activity: Mutex<DateTime<Utc>>,
}

impl IdleDetector {
    /// Creates a detector that treats `now` as the last activity.
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_activity: Mutex::new(now),
        }
    }

    /// Records input activity at the current time.
    pub fn record_activity(&self) {
        self.record_activity_at(Utc::now());
    }

    /// Records input activity at `at`.
    ///
    /// Pulses can arrive out of order from several producers; the last
    /// activity time never moves backwards.
    pub fn record_activity_at(&self, at: DateTime<Utc>) {
        let mut last = self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if at > *last {
            *last = at;
        }
    }

    pub fn apply(&self, pulse: ActivityPulse) {
        self.record_activity_at(pulse.at);
    }

    /// Returns true if no input arrived within `threshold` of now.
    pub fn is_idle(&self, threshold: TimeDelta) -> bool {
        self.is_idle_at(threshold, Utc::now())
    }

    /// Returns true iff `now - last_activity > threshold`.
    ///
    /// The boundary instant itself still counts as active.
    pub fn is_idle_at(&self, threshold: TimeDelta, now: DateTime<Utc>) -> bool {
        let last = *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        now - last > threshold
    }
}
