//! Task aggregate: hierarchical, single-active-context timing target.

use super::{MAX_TITLE_LEN, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Task lifecycle status (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created but never started, or returned to rest after a stop.
    Idle,
    /// The single active context; at most one task may hold this status.
    Running,
    /// Timing suspended; resumable without losing history.
    Paused,
    /// A session was finalized; the task may be started again.
    Stopped,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        }
    }
}

/// Error returned when parsing a [`TaskStatus`] from persisted storage.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "idle" => Ok(Self::Idle),
            "running" => Ok(Self::Running),
            "paused" => Ok(Self::Paused),
            "stopped" => Ok(Self::Stopped),
            other => Err(ParseTaskStatusError(other.to_owned())),
        }
    }
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted parent identifier, if any.
    pub parent_id: Option<TaskId>,
    /// Persisted title.
    pub title: String,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted soft-delete timestamp, if archived.
    pub archived_at: Option<DateTime<Utc>>,
}

/// Task aggregate root.
///
/// Status and parent are mutated exclusively by the timing state machine
/// (status) and the task repository (parent, via reparent); [`Task`] itself
/// only validates and stores the values, it does not decide legality of a
/// transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    parent_id: Option<TaskId>,
    title: String,
    status: TaskStatus,
    created_at: DateTime<Utc>,
    archived_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new, idle root or child task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::TitleTooLong`] when `title` fails validation.
    pub fn new(
        title: &str,
        parent_id: Option<TaskId>,
        clock: &impl Clock,
    ) -> Result<Self, TaskDomainError> {
        let title = validate_title(title)?;
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            parent_id,
            title,
            status: TaskStatus::Idle,
            created_at: timestamp,
            archived_at: None,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub const fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            parent_id: data.parent_id,
            title: data.title,
            status: data.status,
            created_at: data.created_at,
            archived_at: data.archived_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the parent identifier, if any.
    #[must_use]
    pub const fn parent_id(&self) -> Option<TaskId> {
        self.parent_id
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the soft-delete timestamp, if archived.
    #[must_use]
    pub const fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    /// Returns `true` when the task has been soft-deleted.
    #[must_use]
    pub const fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Renames the task. Renaming to the current title is a no-op the caller
    /// may still choose to persist as an event-less operation (§8 round-trip).
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::TitleTooLong`] when `title` fails validation.
    pub fn rename(&mut self, title: &str) -> Result<(), TaskDomainError> {
        self.title = validate_title(title)?;
        Ok(())
    }

    /// Sets the lifecycle status. Legality is the timing state machine's
    /// responsibility; this setter only records the outcome.
    pub const fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Sets the parent identifier. Cycle-freedom is the task repository's
    /// responsibility; this setter only records the outcome.
    pub const fn set_parent_id(&mut self, parent_id: Option<TaskId>) {
        self.parent_id = parent_id;
    }

    /// Marks the task archived at the given clock time.
    pub fn archive(&mut self, clock: &impl Clock) {
        self.archived_at = Some(clock.utc());
    }
}

/// Validates and normalizes a task title.
///
/// # Errors
///
/// Returns [`TaskDomainError::EmptyTitle`] if `title` is empty after
/// trimming, or [`TaskDomainError::TitleTooLong`] if it exceeds
/// [`MAX_TITLE_LEN`] characters.
pub fn validate_title(title: &str) -> Result<String, TaskDomainError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTitle);
    }
    let char_count = trimmed.chars().count();
    if char_count > MAX_TITLE_LEN {
        return Err(TaskDomainError::TitleTooLong(char_count));
    }
    Ok(trimmed.to_owned())
}
