//! The timing transaction port: the single-commit boundary for one timing
//! intent's event appends and task-mirror writes (§4.D).
//!
//! A command that both appends an event and derives a task's new status from
//! it must commit both in the same storage transaction; a crash between the
//! two must be impossible.

use crate::task::domain::{Task, TaskId, TaskStatus};
use crate::timing::domain::{EventKind, TimeEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// One write belonging to a timing intent. Every op passed to the same
/// [`TimingTransaction::commit`] call lands in a single transaction.
#[derive(Debug, Clone)]
pub enum TimingWriteOp {
    /// Appends a timing event for `task_id`.
    AppendEvent {
        task_id: TaskId,
        kind: EventKind,
        at: DateTime<Utc>,
    },
    /// Writes `status` to `task`'s mirror row.
    SetStatus { task: Task, status: TaskStatus },
    /// Inserts a newly created task row.
    InsertTask(Task),
}

/// The events appended and the tasks inserted or updated by one
/// [`TimingTransaction::commit`] call, in the order their ops were given.
#[derive(Debug, Clone, Default)]
pub struct TimingWriteResult {
    /// Events appended, in op order.
    pub events: Vec<TimeEvent>,
    /// Tasks inserted or updated, in op order.
    pub tasks: Vec<Task>,
}

/// Errors surfaced by a [`TimingTransaction`] implementation.
#[derive(Debug, Clone, Error)]
pub enum TimingTransactionError {
    /// The underlying storage backend failed.
    #[error("timing transaction storage failure: {0}")]
    Persistence(Arc<dyn StdError + Send + Sync>),
}

impl TimingTransactionError {
    /// Wraps a storage-layer error as [`TimingTransactionError::Persistence`].
    pub fn persistence(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(source))
    }
}

/// Commits every event append and task-mirror write belonging to one timing
/// intent as a single atomic write.
#[async_trait]
pub trait TimingTransaction: Send + Sync {
    /// Applies `ops` atomically, returning the events and tasks they produced
    /// in the order the ops were given.
    async fn commit(&self, ops: Vec<TimingWriteOp>) -> Result<TimingWriteResult, TimingTransactionError>;
}
