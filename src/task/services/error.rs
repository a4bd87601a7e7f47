//! Errors surfaced by the task lifecycle service.

use crate::task::domain::TaskDomainError;
use crate::task::ports::TaskRepositoryError;
use crate::timing::ports::EventLogRepositoryError;
use crate::timing::services::TimingError;
use thiserror::Error;

/// Errors raised while creating, renaming, reparenting, archiving, deleting,
/// or tagging a task.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// A title or tag name failed domain validation.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task repository failed, or an invariant (not found, archived,
    /// cycle) was violated.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),

    /// The event log failed.
    #[error(transparent)]
    EventLog(#[from] EventLogRepositoryError),

    /// Stopping a running or paused subtree member before archiving failed.
    #[error(transparent)]
    Timing(#[from] TimingError),

    /// `delete_tasks` was called with `hard = true` but a member is not
    /// archived.
    #[error("task {0} must be archived before hard delete")]
    NotArchived(crate::task::domain::TaskId),
}
