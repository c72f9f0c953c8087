//! Fixed-cadence timeline snapshots, independent of session boundaries.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::monitor::ActivitySample;
use crate::store::{ActivityStore, StoreError};
use crate::types::StateLabel;

/// Default spacing between timeline entries.
pub const DEFAULT_TIMELINE_INTERVAL: TimeDelta = TimeDelta::seconds(30);

/// A point-in-time snapshot of the tracked state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub timestamp: DateTime<Utc>,
    pub label: StateLabel,
    pub is_idle: bool,
    pub window_title: String,
    pub bundle_id: String,
}

impl TimelineEntry {
    pub fn from_sample(sample: &ActivitySample) -> Self {
        Self {
            timestamp: sample.timestamp,
            label: sample.label.clone(),
            is_idle: sample.label.is_idle(),
            window_title: sample.window_title.clone(),
            bundle_id: sample.bundle_id.clone(),
        }
    }
}

/// Logs a timeline entry whenever at least `interval` has elapsed since the
/// previous one.
///
/// Elapsed time is measured from the last log, not counted in ticks, so
/// delayed ticks never bunch entries up.
#[derive(Debug, Clone)]
pub struct TimelineSampler {
    interval: TimeDelta,
    last_logged: DateTime<Utc>,
}

impl TimelineSampler {
    /// The first entry becomes due one interval after `started_at`.
    pub const fn new(interval: TimeDelta, started_at: DateTime<Utc>) -> Self {
        Self {
            interval,
            last_logged: started_at,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now - self.last_logged >= self.interval
    }

    /// Appends an entry for `sample` if one is due.
    ///
    /// The cadence only advances once the write succeeded, so a failed
    /// append is retried on the next tick.
    pub fn observe<S: ActivityStore + ?Sized>(
        &mut self,
        store: &mut S,
        sample: &ActivitySample,
    ) -> Result<Option<TimelineEntry>, StoreError> {
        if !self.is_due(sample.timestamp) {
            return Ok(None);
        }
        let entry = TimelineEntry::from_sample(sample);
        store.append_timeline(&entry)?;
        self.last_logged = sample.timestamp;
        tracing::debug!(label = %entry.label, idle = entry.is_idle, "timeline entry logged");
        Ok(Some(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, at, sample};

    #[test]
    fn first_entry_waits_one_interval() {
        let mut store = MemoryStore::default();
        let mut sampler = TimelineSampler::new(DEFAULT_TIMELINE_INTERVAL, at(0));

        assert!(sampler.observe(&mut store, &sample(25, "Editor")).unwrap().is_none());
        let entry = sampler.observe(&mut store, &sample(30, "Editor")).unwrap().unwrap();
        assert_eq!(entry.timestamp, at(30));
        assert!(!entry.is_idle);
        assert_eq!(store.timeline.len(), 1);
    }

    #[test]
    fn delayed_tick_does_not_bunch_entries() {
        let mut store = MemoryStore::default();
        let mut sampler = TimelineSampler::new(DEFAULT_TIMELINE_INTERVAL, at(0));

        // A stalled loop resumes at 75s; only one entry is written, and the
        // next is due 30s after that.
        sampler.observe(&mut store, &sample(75, "Editor")).unwrap();
        assert!(sampler.observe(&mut store, &sample(80, "Editor")).unwrap().is_none());
        assert!(sampler.observe(&mut store, &sample(105, "Editor")).unwrap().is_some());
        assert_eq!(store.timeline.len(), 2);
    }

    #[test]
    fn entry_count_depends_only_on_duration() {
        let labels = ["A", "B", "IDLE", "A", "C", "IDLE", "B"];
        for (interval_secs, duration_secs) in [(30, 300), (30, 62), (20, 95)] {
            let mut store = MemoryStore::default();
            let mut sampler = TimelineSampler::new(TimeDelta::seconds(interval_secs), at(0));
            let mut tick = 0;
            let mut offset = 0;
            while offset <= duration_secs {
                let label = labels[tick % labels.len()];
                sampler.observe(&mut store, &sample(offset, label)).unwrap();
                tick += 1;
                offset += 5;
            }
            let expected = duration_secs / interval_secs;
            let count = i64::try_from(store.timeline.len()).unwrap();
            assert!(
                count == expected || count == expected + 1,
                "{count} entries for {duration_secs}s at {interval_secs}s"
            );
        }
    }

    #[test]
    fn failed_append_is_retried_next_tick() {
        let mut store = MemoryStore::default();
        let mut sampler = TimelineSampler::new(DEFAULT_TIMELINE_INTERVAL, at(0));

        store.fail_next = Some("append timeline entry");
        assert!(sampler.observe(&mut store, &sample(30, "Editor")).is_err());
        assert!(store.timeline.is_empty());

        let entry = sampler.observe(&mut store, &sample(35, "Editor")).unwrap();
        assert_eq!(entry.map(|e| e.timestamp), Some(at(35)));
    }
}
