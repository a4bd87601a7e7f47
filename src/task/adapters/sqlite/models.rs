//! Diesel row models for task and tag persistence.

use crate::storage::schema::{tags, task_tags, tasks};
use crate::task::domain::{PersistedTaskData, Tag, TagId, Task, TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRow {
    /// Internal task identifier, stored as its canonical UUID string.
    pub id: String,
    /// Parent task identifier, if any.
    pub parent_id: Option<String>,
    /// Task title.
    pub title: String,
    /// Lifecycle status, stored as its canonical string.
    pub status: String,
    /// Creation timestamp, unix seconds.
    pub created_at: i64,
    /// Soft-delete timestamp, unix seconds, if archived.
    pub archived_at: Option<i64>,
}

/// Insert or update model for task records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskRecord {
    /// Internal task identifier, stored as its canonical UUID string.
    pub id: String,
    /// Parent task identifier, if any.
    pub parent_id: Option<String>,
    /// Task title.
    pub title: String,
    /// Lifecycle status, stored as its canonical string.
    pub status: String,
    /// Creation timestamp, unix seconds.
    pub created_at: i64,
    /// Soft-delete timestamp, unix seconds, if archived.
    pub archived_at: Option<i64>,
}

impl TaskRecord {
    /// Flattens a domain [`Task`] into its persisted row shape.
    pub fn from_domain(task: &Task) -> Self {
        Self {
            id: task.id().to_string(),
            parent_id: task.parent_id().map(|id| id.to_string()),
            title: task.title().to_owned(),
            status: task.status().as_str().to_owned(),
            created_at: task.created_at().timestamp(),
            archived_at: task.archived_at().map(|at| at.timestamp()),
        }
    }
}

/// Converts a persisted row back into a domain [`Task`].
///
/// # Errors
///
/// Returns an error message when the row contains a malformed identifier,
/// status, or timestamp; such corruption indicates storage was mutated
/// outside this crate.
pub fn row_to_task(row: TaskRow) -> Result<Task, String> {
    let id = TaskId::parse(&row.id).map_err(|err| format!("malformed task id: {err}"))?;
    let parent_id = row
        .parent_id
        .map(|value| TaskId::parse(&value).map_err(|err| format!("malformed parent id: {err}")))
        .transpose()?;
    let status = TaskStatus::try_from(row.status.as_str())
        .map_err(|err| format!("malformed task status: {err}"))?;
    let created_at = seconds_to_datetime(row.created_at)?;
    let archived_at = row.archived_at.map(seconds_to_datetime).transpose()?;
    Ok(Task::from_persisted(PersistedTaskData {
        id,
        parent_id,
        title: row.title,
        status,
        created_at,
        archived_at,
    }))
}

fn seconds_to_datetime(seconds: i64) -> Result<DateTime<Utc>, String> {
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| format!("timestamp {seconds} out of range"))
}

/// Query result row for tag records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TagRow {
    /// Internal tag identifier, stored as its canonical UUID string.
    pub id: String,
    /// Tag name.
    pub name: String,
    /// Creation timestamp, unix seconds.
    pub created_at: i64,
}

/// Insert model for tag records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tags)]
pub struct NewTagRow {
    /// Internal tag identifier, stored as its canonical UUID string.
    pub id: String,
    /// Tag name.
    pub name: String,
    /// Creation timestamp, unix seconds.
    pub created_at: i64,
}

impl NewTagRow {
    /// Flattens a domain [`Tag`] into its persisted row shape.
    pub fn from_domain(tag: &Tag) -> Self {
        Self {
            id: tag.id().to_string(),
            name: tag.name().to_owned(),
            created_at: tag.created_at().timestamp(),
        }
    }
}

/// Converts a persisted row back into a domain [`Tag`].
///
/// # Errors
///
/// Returns an error message when the row contains a malformed identifier or
/// timestamp.
pub fn row_to_tag(row: TagRow) -> Result<Tag, String> {
    let id = TagId::parse(&row.id).map_err(|err| format!("malformed tag id: {err}"))?;
    let created_at = seconds_to_datetime(row.created_at)?;
    Ok(Tag::from_persisted(id, row.name, created_at))
}

/// Insert model for task/tag assignment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = task_tags)]
pub struct TaskTagRecord {
    /// Tagged task identifier, as its canonical UUID string.
    pub task_id: String,
    /// Attached tag identifier, as its canonical UUID string.
    pub tag_id: String,
}
