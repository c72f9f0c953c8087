//! Session tracker: turns per-tick samples into non-overlapping sessions.
//!
//! The tracker either has no session yet or owns exactly one open
//! session. Each sample either extends that session (same label) or closes
//! it and opens the next one (label changed), logging a switch event.
//!
//! Window metadata is captured when a session opens and is not refreshed
//! while the label stays the same.

use chrono::{DateTime, Utc};

use crate::monitor::ActivitySample;
use crate::session::{NewSession, SessionUpdate, elapsed_seconds};
use crate::store::{ActivityStore, StoreError};
use crate::switch::{SwitchEvent, SwitchLogger};
use crate::types::{SessionId, StateLabel};

/// The single open session owned by the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenSession {
    pub id: SessionId,
    pub label: StateLabel,
    pub start_time: DateTime<Utc>,
    pub window_title: String,
    pub bundle_id: String,
}

impl OpenSession {
    fn new(id: SessionId, sample: &ActivitySample) -> Self {
        Self {
            id,
            label: sample.label.clone(),
            start_time: sample.timestamp,
            window_title: sample.window_title.clone(),
            bundle_id: sample.bundle_id.clone(),
        }
    }

    fn update_at(&self, now: DateTime<Utc>) -> SessionUpdate {
        SessionUpdate {
            id: self.id,
            end_time: now,
            duration_seconds: elapsed_seconds(self.start_time, now),
        }
    }
}

/// A session after its final refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedSession {
    pub id: SessionId,
    pub label: StateLabel,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
}

impl ClosedSession {
    fn from_open(open: &OpenSession, update: SessionUpdate) -> Self {
        Self {
            id: open.id,
            label: open.label.clone(),
            start_time: open.start_time,
            end_time: update.end_time,
            duration_seconds: update.duration_seconds,
        }
    }
}

/// Outcome of feeding one sample to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// First session of the run.
    Opened {
        id: SessionId,
        switch: Option<SwitchEvent>,
    },
    /// Same label as before; the open session was refreshed.
    Extended { id: SessionId, duration_seconds: i64 },
    /// Label changed.
    Switched {
        closed: ClosedSession,
        switch: SwitchEvent,
        opened: SessionId,
    },
}

#[derive(Debug, Default)]
pub struct SessionTracker {
    open: Option<OpenSession>,
    switches: SwitchLogger,
}

impl SessionTracker {
    pub const fn new(switches: SwitchLogger) -> Self {
        Self {
            open: None,
            switches,
        }
    }

    pub const fn current(&self) -> Option<&OpenSession> {
        self.open.as_ref()
    }

    /// Applies one sample.
    ///
    /// If the store rejects a write the tracker keeps its previous state, so
    /// the next tick retries the same logical operation.
    pub fn observe<S: ActivityStore + ?Sized>(
        &mut self,
        store: &mut S,
        sample: &ActivitySample,
    ) -> Result<Transition, StoreError> {
        let now = sample.timestamp;

        let Some(open) = self.open.as_ref() else {
            let switch = self.switches.initial(&sample.label, now);
            let id = store.start_session(None, switch.as_ref(), &NewSession::from_sample(sample))?;
            tracing::info!(session = %id, label = %sample.label, "session started");
            self.open = Some(OpenSession::new(id, sample));
            return Ok(Transition::Opened { id, switch });
        };

        let update = open.update_at(now);

        if open.label == sample.label {
            store.refresh_session(&update)?;
            tracing::debug!(
                session = %open.id,
                label = %open.label,
                duration_seconds = update.duration_seconds,
                "session extended"
            );
            return Ok(Transition::Extended {
                id: open.id,
                duration_seconds: update.duration_seconds,
            });
        }

        let switch = SwitchEvent::between(&open.label, &sample.label, now);
        let opened = store.start_session(
            Some(&update),
            Some(&switch),
            &NewSession::from_sample(sample),
        )?;
        let closed = ClosedSession::from_open(open, update);
        tracing::info!(
            session = %closed.id,
            label = %closed.label,
            duration_seconds = closed.duration_seconds,
            "session closed"
        );
        tracing::info!(
            session = %opened,
            from = %closed.label,
            to = %sample.label,
            "session started"
        );
        self.open = Some(OpenSession::new(opened, sample));

        Ok(Transition::Switched {
            closed,
            switch,
            opened,
        })
    }

    /// Closes the open session at `now`, if any.
    ///
    /// This is the terminal transition of a run; calling it again returns
    /// `None` because no session remains open.
    pub fn finalize<S: ActivityStore + ?Sized>(
        &mut self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<Option<ClosedSession>, StoreError> {
        let Some(open) = self.open.as_ref() else {
            return Ok(None);
        };
        let update = open.update_at(now);
        store.close_session(&update)?;
        let closed = ClosedSession::from_open(open, update);
        tracing::info!(
            session = %closed.id,
            label = %closed.label,
            duration_seconds = closed.duration_seconds,
            "session closed"
        );
        self.open = None;
        Ok(Some(closed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, at, label, sample};

    fn run_ticks(tracker: &mut SessionTracker, store: &mut MemoryStore, labels: &[&str]) {
        for (i, name) in labels.iter().enumerate() {
            let offset = i64::try_from(i).unwrap() * 5;
            tracker.observe(store, &sample(offset, name)).unwrap();
        }
    }

    #[test]
    fn idle_interlude_scenario() {
        let mut store = MemoryStore::default();
        let mut tracker = SessionTracker::default();

        run_ticks(&mut tracker, &mut store, &["A", "A", "A", "IDLE", "IDLE", "B"]);
        tracker.finalize(&mut store, at(30)).unwrap();

        let summary: Vec<_> = store
            .sessions
            .iter()
            .map(|s| (s.label.to_string(), s.duration_seconds, s.is_open))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A".to_string(), 15, false),
                ("IDLE".to_string(), 10, false),
                ("B".to_string(), 5, false),
            ]
        );

        let switches: Vec<_> = store
            .switches
            .iter()
            .map(|s| (s.from.clone(), s.to.clone()))
            .collect();
        assert_eq!(
            switches,
            vec![
                (Some(label("A")), label("IDLE")),
                (Some(label("IDLE")), label("B")),
            ]
        );
    }

    #[test]
    fn sessions_partition_the_run() {
        let mut store = MemoryStore::default();
        let mut tracker = SessionTracker::default();
        let labels = ["A", "B", "B", "IDLE", "A", "A", "A", "C", "IDLE", "IDLE", "C"];

        run_ticks(&mut tracker, &mut store, &labels);
        let end = at(i64::try_from(labels.len()).unwrap() * 5);
        tracker.finalize(&mut store, end).unwrap();

        let transitions = labels.windows(2).filter(|w| w[0] != w[1]).count();
        // Every label change closes one session; finalize closes the last.
        assert_eq!(store.sessions.len(), transitions + 1);
        assert_eq!(store.switches.len(), transitions);
        assert_eq!(store.open_sessions(), 0);

        let total: i64 = store.sessions.iter().map(|s| s.duration_seconds).sum();
        assert_eq!(total, (end - at(0)).num_seconds());

        for pair in store.sessions.windows(2) {
            assert_eq!(pair[0].end_time, Some(pair[1].start_time));
        }
    }

    #[test]
    fn continuous_idle_is_one_session() {
        let mut store = MemoryStore::default();
        let mut tracker = SessionTracker::default();

        for offset in (0..=65).step_by(5) {
            tracker.observe(&mut store, &sample(offset, "IDLE")).unwrap();
        }
        tracker.finalize(&mut store, at(65)).unwrap();

        assert_eq!(store.sessions.len(), 1);
        assert_eq!(store.sessions[0].duration_seconds, 65);
        assert!(store.switches.is_empty());
    }

    #[test]
    fn metadata_is_frozen_at_session_start() {
        let mut store = MemoryStore::default();
        let mut tracker = SessionTracker::default();

        tracker.observe(&mut store, &sample(0, "Editor")).unwrap();
        tracker.observe(&mut store, &sample(5, "Editor")).unwrap();

        assert_eq!(store.sessions[0].window_title, "Editor window @0");
        assert_eq!(tracker.current().unwrap().window_title, "Editor window @0");
    }

    #[test]
    fn initial_switch_when_enabled() {
        let mut store = MemoryStore::default();
        let mut tracker = SessionTracker::new(SwitchLogger::new(true));

        run_ticks(&mut tracker, &mut store, &["A", "B"]);

        assert_eq!(store.switches.len(), 2);
        assert_eq!(store.switches[0].from, None);
        assert_eq!(store.switches[0].to, label("A"));
    }

    #[test]
    fn failed_switch_leaves_state_untouched() {
        let mut store = MemoryStore::default();
        let mut tracker = SessionTracker::default();
        tracker.observe(&mut store, &sample(0, "A")).unwrap();
        let before = tracker.current().cloned();

        store.fail_next = Some("start session");
        let err = tracker.observe(&mut store, &sample(5, "B")).unwrap_err();
        assert_eq!(err.operation(), "start session");
        assert_eq!(tracker.current().cloned(), before);
        assert!(store.switches.is_empty());

        let retried = tracker.observe(&mut store, &sample(10, "B")).unwrap();
        assert!(matches!(retried, Transition::Switched { .. }));
        assert_eq!(store.sessions[0].duration_seconds, 10);
    }

    #[test]
    fn finalize_runs_once() {
        let mut store = MemoryStore::default();
        let mut tracker = SessionTracker::default();
        tracker.observe(&mut store, &sample(0, "A")).unwrap();

        let closed = tracker.finalize(&mut store, at(7)).unwrap().unwrap();
        assert_eq!(closed.duration_seconds, 7);
        assert!(tracker.finalize(&mut store, at(9)).unwrap().is_none());
        assert_eq!(store.sessions[0].duration_seconds, 7);
    }

    #[test]
    fn finalize_without_session_is_noop() {
        let mut store = MemoryStore::default();
        let mut tracker = SessionTracker::default();
        assert!(tracker.finalize(&mut store, at(0)).unwrap().is_none());
        assert!(store.sessions.is_empty());
    }
}
