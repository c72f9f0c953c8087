//! Run summaries and the focus score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;
use crate::store::{ActivityStore, StoreError};
use crate::switch::SwitchEvent;

/// Aggregate activity over one tracked run or reporting window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub total_active_seconds: i64,
    pub total_idle_seconds: i64,
    pub app_switches: i64,
    pub focus_score: f64,
}

/// Percentage of tracked time spent active.
///
/// Returns `0.0` when no time was tracked at all.
#[expect(
    clippy::cast_precision_loss,
    reason = "second counts stay far below 2^52"
)]
pub fn focus_score(active_seconds: i64, idle_seconds: i64) -> f64 {
    let active = active_seconds.max(0);
    let total = active + idle_seconds.max(0);
    if total == 0 {
        return 0.0;
    }
    active as f64 / total as f64 * 100.0
}

impl SessionSummary {
    /// Aggregates sessions and switches already filtered to the window.
    pub fn from_records(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        sessions: &[SessionRecord],
        switches: &[SwitchEvent],
    ) -> Self {
        let (idle, active): (Vec<_>, Vec<_>) = sessions.iter().partition(|s| s.label.is_idle());
        let total_active_seconds = active.iter().map(|s| s.duration_seconds).sum();
        let total_idle_seconds = idle.iter().map(|s| s.duration_seconds).sum();
        let app_switches = i64::try_from(switches.len()).unwrap_or(i64::MAX);

        Self {
            id: None,
            start_time: start,
            end_time: end,
            total_active_seconds,
            total_idle_seconds,
            app_switches,
            focus_score: focus_score(total_active_seconds, total_idle_seconds),
        }
    }
}

/// Computes and stores a summary for `[start, end]`.
///
/// Each call inserts a new, independent summary record.
pub fn summarize<S: ActivityStore + ?Sized>(
    store: &mut S,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<SessionSummary, StoreError> {
    let sessions = store.sessions_started_between(start, end)?;
    let switches = store.switches_between(start, end)?;
    let mut summary = SessionSummary::from_records(start, end, &sessions, &switches);
    summary.id = Some(store.insert_summary(&summary)?);
    tracing::info!(
        active_seconds = summary.total_active_seconds,
        idle_seconds = summary.total_idle_seconds,
        switches = summary.app_switches,
        focus_score = summary.focus_score,
        "summary saved"
    );
    Ok(summary)
}
