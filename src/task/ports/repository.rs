//! The task repository port: the task tree and tag assignments, persisted.

use crate::task::domain::{Tag, TagId, Task, TaskId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a [`TaskRepository`] implementation.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// No task exists with the given identifier.
    #[error("task {0} not found")]
    NotFound(TaskId),

    /// The task (or an ancestor) is archived and rejects further mutation.
    #[error("task {0} is archived")]
    Archived(TaskId),

    /// The requested reparent would introduce a cycle in the task tree.
    #[error("reparenting task {0} would introduce a cycle")]
    CycleDetected(TaskId),

    /// No tag exists with the given identifier.
    #[error("tag {0} not found")]
    TagNotFound(TagId),

    /// The underlying storage backend failed.
    #[error("task storage failure: {0}")]
    Persistence(Arc<dyn StdError + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a storage-layer error as a [`TaskRepositoryError::Persistence`].
    pub fn persistence(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(source))
    }
}

/// Persisted task tree and tag catalogue (§4.B, §4.C).
///
/// Implementations must enforce that a task's ancestors never form a cycle
/// and that archived tasks (and their descendants) reject further mutation
/// other than un-archiving-adjacent operations explicitly permitted by the
/// service layer.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a new task.
    async fn insert_task(&self, task: Task) -> Result<Task, TaskRepositoryError>;

    /// Fetches a task by identifier.
    async fn get_task(&self, id: TaskId) -> Result<Task, TaskRepositoryError>;

    /// Lists every task, including archived ones, in creation order.
    async fn list_tasks(&self) -> Result<Vec<Task>, TaskRepositoryError>;

    /// Lists the direct children of `parent_id` (or every root task when
    /// `parent_id` is `None`).
    async fn list_children(&self, parent_id: Option<TaskId>) -> Result<Vec<Task>, TaskRepositoryError>;

    /// Returns every ancestor of `id`, nearest first, to support cycle
    /// detection and subtree archival.
    async fn ancestors(&self, id: TaskId) -> Result<Vec<TaskId>, TaskRepositoryError>;

    /// Returns every descendant of `id` (not including `id` itself).
    async fn descendants(&self, id: TaskId) -> Result<Vec<TaskId>, TaskRepositoryError>;

    /// Persists an updated task (title, status, parent, archival).
    async fn update_task(&self, task: Task) -> Result<Task, TaskRepositoryError>;

    /// Permanently removes the given tasks and their tag assignments.
    async fn delete_tasks(&self, ids: &[TaskId]) -> Result<(), TaskRepositoryError>;

    /// Finds a tag by exact name, if one exists.
    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, TaskRepositoryError>;

    /// Inserts a new tag.
    async fn insert_tag(&self, tag: Tag) -> Result<Tag, TaskRepositoryError>;

    /// Lists every tag.
    async fn list_tags(&self) -> Result<Vec<Tag>, TaskRepositoryError>;

    /// Attaches `tag_id` to `task_id`. Idempotent.
    async fn attach_tag(&self, task_id: TaskId, tag_id: TagId) -> Result<bool, TaskRepositoryError>;

    /// Detaches `tag_id` from `task_id`. Idempotent.
    async fn detach_tag(&self, task_id: TaskId, tag_id: TagId) -> Result<bool, TaskRepositoryError>;

    /// Lists the tags attached to `task_id`.
    async fn tags_for_task(&self, task_id: TaskId) -> Result<Vec<Tag>, TaskRepositoryError>;

    /// Counts how many tasks each tag is attached to. Tags with zero
    /// assignments are absent from the map rather than mapped to `0`.
    async fn tag_usage_counts(&self) -> Result<HashMap<TagId, i64>, TaskRepositoryError>;
}
