//! The event log repository port: append-only, sequence-ordered.

use crate::task::domain::TaskId;
use crate::timing::domain::{NewTimeEvent, TimeEvent};
use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by an [`EventLogRepository`] implementation.
#[derive(Debug, Clone, Error)]
pub enum EventLogRepositoryError {
    /// The underlying storage backend failed.
    #[error("event log storage failure: {0}")]
    Persistence(Arc<dyn StdError + Send + Sync>),
}

impl EventLogRepositoryError {
    /// Wraps a storage-layer error as [`EventLogRepositoryError::Persistence`].
    pub fn persistence(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(source))
    }
}

/// Append-only timing event log (§4.B).
///
/// Appending is the only legal way to change a task's running state,
/// parent, or tag membership; sequence numbers are assigned by the store
/// and are strictly increasing across commits.
#[async_trait]
pub trait EventLogRepository: Send + Sync {
    /// Appends a batch of events produced by one command, assigning each a
    /// sequence number in order.
    async fn append(&self, events: Vec<NewTimeEvent>) -> Result<Vec<TimeEvent>, EventLogRepositoryError>;

    /// Returns every event in sequence order, optionally restricted to one
    /// task, for replay.
    async fn stream_all(&self) -> Result<Vec<TimeEvent>, EventLogRepositoryError>;

    /// Returns every event pertaining to `task_id`, in sequence order.
    async fn stream_for_task(&self, task_id: TaskId) -> Result<Vec<TimeEvent>, EventLogRepositoryError>;

    /// Returns the most recent event pertaining to `task_id`, if any.
    async fn latest_for_task(&self, task_id: TaskId) -> Result<Option<TimeEvent>, EventLogRepositoryError>;

    /// Permanently removes every event pertaining to any of `task_ids`.
    /// Used only by hard delete (§6); the append-only guarantee otherwise
    /// holds for the lifetime of a task.
    async fn delete_for_tasks(&self, task_ids: &[TaskId]) -> Result<(), EventLogRepositoryError>;
}
