//! Persistence contract consumed by the tracker and summarizer.

use std::error::Error as StdError;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::session::{NewSession, SessionRecord, SessionUpdate};
use crate::summary::SessionSummary;
use crate::switch::SwitchEvent;
use crate::timeline::TimelineEntry;
use crate::types::SessionId;

/// A failed store operation.
#[derive(Debug, Error)]
#[error("failed to {operation}")]
pub struct StoreError {
    operation: &'static str,
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl StoreError {
    pub fn new(
        operation: &'static str,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }

    pub const fn operation(&self) -> &'static str {
        self.operation
    }
}

/// Durable storage for sessions, switches, timeline entries and summaries.
///
/// Every write is synchronous and reports its own failure. Callers do not
/// mutate in-memory state until a write has succeeded.
pub trait ActivityStore {
    /// Opens a session, optionally closing the previous one and logging a
    /// switch. All parts are applied atomically.
    fn start_session(
        &mut self,
        close: Option<&SessionUpdate>,
        switch: Option<&SwitchEvent>,
        open: &NewSession,
    ) -> Result<SessionId, StoreError>;

    /// Updates the end time and duration of a still-open session.
    fn refresh_session(&mut self, update: &SessionUpdate) -> Result<(), StoreError>;

    /// Final refresh of a session; it is no longer open afterwards.
    fn close_session(&mut self, update: &SessionUpdate) -> Result<(), StoreError>;

    fn append_timeline(&mut self, entry: &TimelineEntry) -> Result<(), StoreError>;

    /// Sessions whose start time lies in `[start, end]`, oldest first.
    fn sessions_started_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>, StoreError>;

    /// Switch events with a timestamp in `[start, end]`, oldest first.
    fn switches_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SwitchEvent>, StoreError>;

    /// Stores a new summary and returns its row id.
    fn insert_summary(&mut self, summary: &SessionSummary) -> Result<i64, StoreError>;
}
