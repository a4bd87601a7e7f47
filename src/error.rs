//! Top-level error type returned by the Command Surface.
//!
//! Every layer below (domain validation, repository ports, services) defines
//! its own narrow `thiserror` enum; this module composes them into the single
//! stable error kind external collaborators match on.

use crate::replay::domain::ParseRangeError;
use crate::replay::services::ReplayError;
use crate::rest_advisor::ports::RestSuggestionRepositoryError;
use crate::rest_advisor::services::RestAdvisorError;
use crate::task::domain::TaskDomainError;
use crate::task::ports::TaskRepositoryError;
use crate::task::services::TaskLifecycleError;
use crate::timing::ports::{EventLogRepositoryError, TimingTransactionError};
use crate::timing::services::TimingError;
use thiserror::Error;

/// Stable error kind surfaced by every core command.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input failed validation before any write was attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The referenced task has been archived.
    #[error("task is archived: {0}")]
    Archived(String),

    /// The requested transition is illegal from the entity's current state.
    #[error("invalid state transition: {0}")]
    InvalidState(String),

    /// The requested reparent would introduce a cycle in the task tree.
    #[error("cycle detected: {0}")]
    CycleDetected(String),

    /// A uniqueness constraint would be violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The underlying storage backend failed (I/O or migration).
    #[error("storage error: {0}")]
    StorageError(String),

    /// An internal invariant was violated; surfaced for diagnostics only.
    #[error("internal invariant violation: {0}")]
    Internal(String),
}

/// Result type returned by every Command Surface operation.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<TaskDomainError> for CoreError {
    fn from(err: TaskDomainError) -> Self {
        match err {
            TaskDomainError::EmptyTitle | TaskDomainError::TitleTooLong(_) => {
                Self::InvalidInput(err.to_string())
            }
            TaskDomainError::EmptyTagName | TaskDomainError::TagNameTooLong(_) => {
                Self::InvalidInput(err.to_string())
            }
        }
    }
}

impl From<TaskRepositoryError> for CoreError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(id) => Self::NotFound(id.to_string()),
            TaskRepositoryError::Archived(id) => Self::Archived(id.to_string()),
            TaskRepositoryError::CycleDetected(id) => Self::CycleDetected(id.to_string()),
            TaskRepositoryError::TagNotFound(id) => Self::NotFound(id.to_string()),
            TaskRepositoryError::Persistence(source) => Self::StorageError(source.to_string()),
        }
    }
}

impl From<EventLogRepositoryError> for CoreError {
    fn from(err: EventLogRepositoryError) -> Self {
        match err {
            EventLogRepositoryError::Persistence(source) => Self::StorageError(source.to_string()),
        }
    }
}

impl From<RestSuggestionRepositoryError> for CoreError {
    fn from(err: RestSuggestionRepositoryError) -> Self {
        match err {
            RestSuggestionRepositoryError::NotFound(id) => Self::NotFound(id.to_string()),
            RestSuggestionRepositoryError::Persistence(source) => {
                Self::StorageError(source.to_string())
            }
        }
    }
}

impl From<TimingTransactionError> for CoreError {
    fn from(err: TimingTransactionError) -> Self {
        match err {
            TimingTransactionError::Persistence(source) => Self::StorageError(source.to_string()),
        }
    }
}

impl From<TimingError> for CoreError {
    fn from(err: TimingError) -> Self {
        match err {
            TimingError::InvalidState(message) => Self::InvalidState(message),
            TimingError::TaskRepository(source) => source.into(),
            TimingError::Transaction(source) => source.into(),
        }
    }
}

impl From<TaskLifecycleError> for CoreError {
    fn from(err: TaskLifecycleError) -> Self {
        match err {
            TaskLifecycleError::Domain(source) => source.into(),
            TaskLifecycleError::Repository(source) => source.into(),
            TaskLifecycleError::EventLog(source) => source.into(),
            TaskLifecycleError::Timing(source) => source.into(),
            TaskLifecycleError::NotArchived(id) => {
                Self::InvalidState(format!("task {id} must be archived before hard delete"))
            }
        }
    }
}

impl From<RestAdvisorError> for CoreError {
    fn from(err: RestAdvisorError) -> Self {
        match err {
            RestAdvisorError::EventLog(source) => source.into(),
            RestAdvisorError::Repository(source) => source.into(),
        }
    }
}

impl From<ParseRangeError> for CoreError {
    fn from(err: ParseRangeError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<ReplayError> for CoreError {
    fn from(err: ReplayError) -> Self {
        match err {
            ReplayError::TaskRepository(source) => source.into(),
            ReplayError::EventLog(source) => source.into(),
        }
    }
}
