//! Activity session records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::ActivitySample;
use crate::types::{SessionId, StateLabel};

/// A session about to be opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub label: StateLabel,
    pub start_time: DateTime<Utc>,
    pub window_title: String,
    pub bundle_id: String,
}

impl NewSession {
    pub fn from_sample(sample: &ActivitySample) -> Self {
        Self {
            label: sample.label.clone(),
            start_time: sample.timestamp,
            window_title: sample.window_title.clone(),
            bundle_id: sample.bundle_id.clone(),
        }
    }
}

/// New end time and duration for an existing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUpdate {
    pub id: SessionId,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
}

/// A stored activity session.
///
/// `end_time` is `None` only until the first refresh after opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub label: StateLabel,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: i64,
    pub window_title: String,
    pub bundle_id: String,
    pub is_open: bool,
}

/// Whole seconds between `start` and `end`, never negative.
pub fn elapsed_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().max(0)
}
