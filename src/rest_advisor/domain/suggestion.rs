//! The rest suggestion produced by the rule engine (§4.F).

use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier for a rest suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionId(Uuid);

impl SuggestionId {
    /// Creates a new random suggestion identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a suggestion identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }

    /// Parses a suggestion identifier from its canonical string form.
    ///
    /// # Errors
    ///
    /// Returns an error when `value` is not a valid UUID.
    pub fn parse(value: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(value).map(Self)
    }
}

impl Default for SuggestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What triggered a rest suggestion evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    /// A subtask's session ended, handing focus back to its parent.
    SubtaskEnd,
    /// The running task changed.
    TaskSwitch,
}

impl TriggerType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SubtaskEnd => "subtask_end",
            Self::TaskSwitch => "task_switch",
        }
    }
}

/// Error returned when parsing a [`TriggerType`] from persisted storage.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown trigger type: {0}")]
pub struct ParseTriggerTypeError(pub String);

impl TryFrom<&str> for TriggerType {
    type Error = ParseTriggerTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "subtask_end" => Ok(Self::SubtaskEnd),
            "task_switch" => Ok(Self::TaskSwitch),
            other => Err(ParseTriggerTypeError(other.to_owned())),
        }
    }
}

/// The lifecycle status of a rest suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionStatus {
    /// Awaiting a response; at most one may exist at a time.
    Pending,
    /// The user accepted the suggested rest.
    Accepted,
    /// The suggestion was superseded or dismissed.
    Ignored,
}

impl SuggestionStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Ignored => "ignored",
        }
    }
}

/// Error returned when parsing a [`SuggestionStatus`] from persisted storage.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown suggestion status: {0}")]
pub struct ParseSuggestionStatusError(pub String);

impl TryFrom<&str> for SuggestionStatus {
    type Error = ParseSuggestionStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "ignored" => Ok(Self::Ignored),
            other => Err(ParseSuggestionStatusError(other.to_owned())),
        }
    }
}

/// A rest suggestion produced by the rule engine (§3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestSuggestion {
    /// Suggestion identifier.
    pub id: SuggestionId,
    /// What triggered this evaluation.
    pub trigger_type: TriggerType,
    /// The anchor task, if any.
    pub task_id: Option<TaskId>,
    /// Continuous focus duration at trigger time, seconds.
    pub focus_seconds: i64,
    /// Distinct task switches within the trailing 1800 seconds.
    pub switch_count_30m: i64,
    /// Relative deviation from the task's historical median focus block.
    pub deviation_ratio: f64,
    /// Suggested rest duration in minutes: 0, 3, 8, or 15.
    pub suggested_minutes: i64,
    /// Rule identifiers that fired, in evaluation order.
    pub reasons: Vec<String>,
    /// Current status.
    pub status: SuggestionStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
