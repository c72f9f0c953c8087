//! Switch events: one record per state transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::StateLabel;

/// A transition from one tracked state to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchEvent {
    /// `None` only for a synthetic first switch of a run.
    pub from: Option<StateLabel>,
    pub to: StateLabel,
    pub timestamp: DateTime<Utc>,
}

impl SwitchEvent {
    /// Switch logged when the label changes from `from` to `to`.
    pub fn between(from: &StateLabel, to: &StateLabel, at: DateTime<Utc>) -> Self {
        Self {
            from: Some(from.clone()),
            to: to.clone(),
            timestamp: at,
        }
    }
}

/// Decides which transitions produce switch events.
///
/// Every label change logs a switch. Whether opening the first session of a
/// run also logs one (with no `from`) is a policy choice, off by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchLogger {
    emit_initial: bool,
}

impl SwitchLogger {
    pub const fn new(emit_initial: bool) -> Self {
        Self { emit_initial }
    }

    /// Switch to log when the first session of a run opens.
    pub fn initial(&self, to: &StateLabel, at: DateTime<Utc>) -> Option<SwitchEvent> {
        self.emit_initial.then(|| SwitchEvent {
            from: None,
            to: to.clone(),
            timestamp: at,
        })
    }
}
