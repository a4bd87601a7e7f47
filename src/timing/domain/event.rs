//! The append-only timing event: the sole source of truth for durations.

use crate::task::domain::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of a persisted timing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The task became the running context.
    Start,
    /// The task was suspended without finalizing its session.
    Pause,
    /// A paused task resumed running.
    Resume,
    /// The task's current session finalized.
    Stop,
    /// The task's parent changed.
    Reparent,
    /// A tag was attached to the task.
    TagAdd,
    /// A tag was detached from the task.
    TagRemove,
}

impl EventKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Stop => "stop",
            Self::Reparent => "reparent",
            Self::TagAdd => "tag_add",
            Self::TagRemove => "tag_remove",
        }
    }
}

/// Error returned when parsing an [`EventKind`] from persisted storage.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown event kind: {0}")]
pub struct ParseEventKindError(pub String);

impl TryFrom<&str> for EventKind {
    type Error = ParseEventKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "start" => Ok(Self::Start),
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "stop" => Ok(Self::Stop),
            "reparent" => Ok(Self::Reparent),
            "tag_add" => Ok(Self::TagAdd),
            "tag_remove" => Ok(Self::TagRemove),
            other => Err(ParseEventKindError(other.to_owned())),
        }
    }
}

/// Payload carried by a `reparent` event (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReparentPayload {
    /// The task's parent before the reparent, if any.
    pub from: Option<TaskId>,
    /// The task's parent after the reparent, if any.
    pub to: Option<TaskId>,
}

/// Payload carried by a `tag_add`/`tag_remove` event (§6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPayload {
    /// The affected tag's name.
    pub tag: String,
}

/// An immutable timing event, never updated or deleted after append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEvent {
    /// Monotonically increasing sequence number assigned by the store.
    pub sequence: i64,
    /// The task the event pertains to.
    pub task_id: TaskId,
    /// The event kind.
    pub kind: EventKind,
    /// The event timestamp; shared by every event of one command.
    pub at: DateTime<Utc>,
    /// Raw JSON payload, schema dependent on `kind`. `None` for
    /// start/pause/resume/stop, which carry no payload.
    pub payload: Option<String>,
}

impl TimeEvent {
    /// Deserializes the payload as a [`ReparentPayload`].
    ///
    /// # Errors
    ///
    /// Returns an error if `payload` is absent or not valid JSON for the
    /// expected shape.
    pub fn reparent_payload(&self) -> Result<ReparentPayload, serde_json::Error> {
        let raw = self.payload.as_deref().unwrap_or("null");
        serde_json::from_str(raw)
    }

    /// Deserializes the payload as a [`TagPayload`].
    ///
    /// # Errors
    ///
    /// Returns an error if `payload` is absent or not valid JSON for the
    /// expected shape.
    pub fn tag_payload(&self) -> Result<TagPayload, serde_json::Error> {
        let raw = self.payload.as_deref().unwrap_or("null");
        serde_json::from_str(raw)
    }
}

/// A single timing event queued for append, prior to sequence assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeEvent {
    /// The task the event pertains to.
    pub task_id: TaskId,
    /// The event kind.
    pub kind: EventKind,
    /// The shared command timestamp.
    pub at: DateTime<Utc>,
    /// Serialized payload, if any.
    pub payload: Option<String>,
}

impl NewTimeEvent {
    /// Builds a payload-less event (start/pause/resume/stop).
    #[must_use]
    pub const fn bare(task_id: TaskId, kind: EventKind, at: DateTime<Utc>) -> Self {
        Self {
            task_id,
            kind,
            at,
            payload: None,
        }
    }

    /// Builds a `reparent` event.
    #[must_use]
    pub fn reparent(task_id: TaskId, at: DateTime<Utc>, from: Option<TaskId>, to: Option<TaskId>) -> Self {
        let payload = serde_json::to_string(&ReparentPayload { from, to })
            .unwrap_or_else(|_| "null".to_owned());
        Self {
            task_id,
            kind: EventKind::Reparent,
            at,
            payload: Some(payload),
        }
    }

    /// Builds a `tag_add` or `tag_remove` event.
    #[must_use]
    pub fn tag(task_id: TaskId, kind: EventKind, at: DateTime<Utc>, tag_name: &str) -> Self {
        let payload = serde_json::to_string(&TagPayload {
            tag: tag_name.to_owned(),
        })
        .unwrap_or_else(|_| "null".to_owned());
        Self {
            task_id,
            kind,
            at,
            payload: Some(payload),
        }
    }
}
