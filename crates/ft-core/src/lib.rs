//! Core domain logic for the focus tracker.
//!
//! This crate contains the activity-session state machine:
//! - Idle detection from input activity pulses
//! - Session tracking: one open session per contiguous state, switch events
//! - Timeline sampling on an independent fixed cadence
//! - Run summaries and the focus score
//!
//! Storage and OS access are external and plug in through [`ActivityStore`]
//! and [`ActivityMonitor`].

mod idle;
pub mod monitor;
mod run;
pub mod session;
pub mod store;
pub mod summary;
pub mod switch;
pub mod timeline;
pub mod tracker;
mod types;

#[cfg(test)]
mod testing;

pub use idle::{ActivityPulse, DEFAULT_IDLE_THRESHOLD, IdleDetector};
pub use monitor::{ActivityMonitor, ActivitySample, MonitorError, WindowSnapshot};
pub use run::{TickReport, TrackError, TrackerSettings, TrackingRun, seconds};
pub use session::{NewSession, SessionRecord, SessionUpdate};
pub use store::{ActivityStore, StoreError};
pub use summary::{SessionSummary, focus_score, summarize};
pub use switch::{SwitchEvent, SwitchLogger};
pub use timeline::{DEFAULT_TIMELINE_INTERVAL, TimelineEntry, TimelineSampler};
pub use tracker::{ClosedSession, SessionTracker, Transition};
pub use types::{IDLE_LABEL, SessionId, StateLabel, ValidationError};
