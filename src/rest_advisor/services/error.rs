//! Errors surfaced by the rest advisor rule engine.

use crate::rest_advisor::ports::RestSuggestionRepositoryError;
use crate::timing::ports::EventLogRepositoryError;
use thiserror::Error;

/// Errors raised while evaluating or responding to a rest suggestion.
#[derive(Debug, Error)]
pub enum RestAdvisorError {
    /// The event log failed.
    #[error(transparent)]
    EventLog(#[from] EventLogRepositoryError),

    /// The rest suggestion store failed, or an unknown id was referenced.
    #[error(transparent)]
    Repository(#[from] RestSuggestionRepositoryError),
}
