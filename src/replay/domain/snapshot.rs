//! Snapshot types returned by `get_overview` (§6).

use crate::rest_advisor::domain::RestSuggestion;
use crate::task::domain::{TagId, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Range;

/// Per-task durations over a query window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOverview {
    /// Task identifier.
    pub id: TaskId,
    /// Parent identifier, if any.
    pub parent_id: Option<TaskId>,
    /// Task title.
    pub title: String,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Attached tag names.
    pub tags: Vec<String>,
    /// Own running time within the window, seconds.
    pub exclusive_seconds: i64,
    /// Own plus every descendant's running time within the window, seconds.
    pub inclusive_seconds: i64,
}

/// The result of `get_overview(range)` (§4.G, §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewSnapshot {
    /// The window the snapshot was computed over.
    pub range: Range,
    /// The moment the snapshot was generated.
    pub generated_at: DateTime<Utc>,
    /// The currently running task, if any.
    pub active_task_id: Option<TaskId>,
    /// The pending rest suggestion, if any.
    pub rest_suggestion: Option<RestSuggestion>,
    /// Every non-archived task with its durations over the window.
    pub tasks: Vec<TaskOverview>,
}

/// A tag and how many tasks it is currently attached to (§10.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSummary {
    /// Tag identifier.
    pub id: TagId,
    /// Tag name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Number of tasks this tag is currently attached to.
    pub usage_count: i64,
}
