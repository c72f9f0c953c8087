//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Textual marker stored for idle sessions and timeline entries.
pub const IDLE_LABEL: &str = "IDLE";

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// An interval that must be positive was zero.
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: u64 },

    /// The value does not fit in the supported time range.
    #[error("{field} is out of range: {value}")]
    OutOfRange { field: &'static str, value: u64 },
}

/// What the user is doing at a given instant: idle, or focused on an app.
///
/// Sessions are maximal runs of an identical label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum StateLabel {
    /// No human input within the idle threshold.
    Idle,
    /// A foreground application, by name.
    App(String),
}

impl StateLabel {
    /// Creates an application label, rejecting blank names.
    pub fn app(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "application name",
            });
        }
        Ok(Self::App(name))
    }

    /// Returns the stored form of the label.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Idle => IDLE_LABEL,
            Self::App(name) => name,
        }
    }

    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StateLabel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == IDLE_LABEL {
            Ok(Self::Idle)
        } else {
            Self::app(s)
        }
    }
}

impl TryFrom<String> for StateLabel {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == IDLE_LABEL {
            Ok(Self::Idle)
        } else {
            Self::app(value)
        }
    }
}

impl From<StateLabel> for String {
    fn from(label: StateLabel) -> Self {
        match label {
            StateLabel::Idle => IDLE_LABEL.to_string(),
            StateLabel::App(name) => name,
        }
    }
}

/// Identifier assigned to an activity session by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(i64);

impl SessionId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
