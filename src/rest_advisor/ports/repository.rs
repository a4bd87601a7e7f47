//! The rest suggestion repository port.

use crate::rest_advisor::domain::{RestSuggestion, SuggestionId};
use async_trait::async_trait;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a [`RestSuggestionRepository`] implementation.
#[derive(Debug, Clone, Error)]
pub enum RestSuggestionRepositoryError {
    /// No suggestion exists with the given identifier.
    #[error("rest suggestion {0} not found")]
    NotFound(SuggestionId),

    /// The underlying storage backend failed.
    #[error("rest suggestion storage failure: {0}")]
    Persistence(Arc<dyn StdError + Send + Sync>),
}

impl RestSuggestionRepositoryError {
    /// Wraps a storage-layer error as
    /// [`RestSuggestionRepositoryError::Persistence`].
    pub fn persistence(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(source))
    }
}

/// Persisted rest suggestions (§3, §4.F).
#[async_trait]
pub trait RestSuggestionRepository: Send + Sync {
    /// Inserts a new suggestion.
    async fn insert(&self, suggestion: RestSuggestion) -> Result<RestSuggestion, RestSuggestionRepositoryError>;

    /// Fetches a suggestion by identifier.
    async fn get(&self, id: SuggestionId) -> Result<RestSuggestion, RestSuggestionRepositoryError>;

    /// Returns the current pending suggestion, if any. At most one exists.
    async fn pending(&self) -> Result<Option<RestSuggestion>, RestSuggestionRepositoryError>;

    /// Persists an updated suggestion (status transition).
    async fn update(&self, suggestion: RestSuggestion) -> Result<RestSuggestion, RestSuggestionRepositoryError>;
}
