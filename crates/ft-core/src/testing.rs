//! In-memory store and fixtures shared by unit tests.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::monitor::ActivitySample;
use crate::session::{NewSession, SessionRecord, SessionUpdate};
use crate::store::{ActivityStore, StoreError};
use crate::summary::SessionSummary;
use crate::switch::SwitchEvent;
use crate::timeline::TimelineEntry;
use crate::types::{SessionId, StateLabel};

/// Fixed epoch for test timelines.
pub fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap() + TimeDelta::seconds(offset_secs)
}

pub fn label(name: &str) -> StateLabel {
    name.parse().unwrap()
}

pub fn sample(offset_secs: i64, name: &str) -> ActivitySample {
    let label = label(name);
    let window_title = if label.is_idle() {
        String::new()
    } else {
        format!("{name} window @{offset_secs}")
    };
    ActivitySample {
        timestamp: at(offset_secs),
        label,
        window_title,
        bundle_id: String::new(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub sessions: Vec<SessionRecord>,
    pub switches: Vec<SwitchEvent>,
    pub timeline: Vec<TimelineEntry>,
    pub summaries: Vec<SessionSummary>,
    /// Makes the next write with this operation name fail.
    pub fail_next: Option<&'static str>,
}

#[derive(Debug, thiserror::Error)]
#[error("injected failure")]
struct Injected;

impl MemoryStore {
    fn check(&mut self, operation: &'static str) -> Result<(), StoreError> {
        if self.fail_next == Some(operation) {
            self.fail_next = None;
            return Err(StoreError::new(operation, Injected));
        }
        Ok(())
    }

    fn apply(&mut self, update: &SessionUpdate, close: bool) {
        let session = self
            .sessions
            .iter_mut()
            .find(|s| s.id == update.id)
            .expect("session exists");
        session.end_time = Some(update.end_time);
        session.duration_seconds = update.duration_seconds;
        if close {
            session.is_open = false;
        }
    }

    pub fn open_sessions(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_open).count()
    }
}

impl ActivityStore for MemoryStore {
    fn start_session(
        &mut self,
        close: Option<&SessionUpdate>,
        switch: Option<&SwitchEvent>,
        open: &NewSession,
    ) -> Result<SessionId, StoreError> {
        self.check("start session")?;
        if let Some(update) = close {
            self.apply(update, true);
        }
        if let Some(switch) = switch {
            self.switches.push(switch.clone());
        }
        let id = SessionId::new(i64::try_from(self.sessions.len()).unwrap() + 1);
        self.sessions.push(SessionRecord {
            id,
            label: open.label.clone(),
            start_time: open.start_time,
            end_time: None,
            duration_seconds: 0,
            window_title: open.window_title.clone(),
            bundle_id: open.bundle_id.clone(),
            is_open: true,
        });
        Ok(id)
    }

    fn refresh_session(&mut self, update: &SessionUpdate) -> Result<(), StoreError> {
        self.check("refresh session")?;
        self.apply(update, false);
        Ok(())
    }

    fn close_session(&mut self, update: &SessionUpdate) -> Result<(), StoreError> {
        self.check("close session")?;
        self.apply(update, true);
        Ok(())
    }

    fn append_timeline(&mut self, entry: &TimelineEntry) -> Result<(), StoreError> {
        self.check("append timeline entry")?;
        self.timeline.push(entry.clone());
        Ok(())
    }

    fn sessions_started_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.start_time >= start && s.start_time <= end)
            .cloned()
            .collect())
    }

    fn switches_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SwitchEvent>, StoreError> {
        Ok(self
            .switches
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp <= end)
            .cloned()
            .collect())
    }

    fn insert_summary(&mut self, summary: &SessionSummary) -> Result<i64, StoreError> {
        self.check("insert summary")?;
        self.summaries.push(summary.clone());
        Ok(i64::try_from(self.summaries.len()).unwrap())
    }
}
