//! Errors surfaced by the timing state machine.

use crate::task::ports::TaskRepositoryError;
use crate::timing::ports::TimingTransactionError;
use thiserror::Error;

/// Errors raised while planning or executing a timing intent.
#[derive(Debug, Error)]
pub enum TimingError {
    /// The requested transition is illegal from the task's current status.
    #[error("invalid state transition: {0}")]
    InvalidState(String),

    /// The task repository failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),

    /// The event append and its task-mirror update failed to commit.
    #[error(transparent)]
    Transaction(#[from] TimingTransactionError),
}
