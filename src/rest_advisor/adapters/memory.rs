//! In-memory [`RestSuggestionRepository`], used by tests and ephemeral
//! sessions.

use crate::rest_advisor::domain::{RestSuggestion, SuggestionId, SuggestionStatus};
use crate::rest_advisor::ports::{RestSuggestionRepository, RestSuggestionRepositoryError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
struct State {
    suggestions: HashMap<SuggestionId, RestSuggestion>,
    order: Vec<SuggestionId>,
}

/// Thread-safe in-memory rest suggestion store.
#[derive(Default)]
pub struct InMemoryRestSuggestionRepository {
    state: RwLock<State>,
}

impl InMemoryRestSuggestionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_read(state: &RwLock<State>) -> std::sync::RwLockReadGuard<'_, State> {
    state.read().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn lock_write(state: &RwLock<State>) -> std::sync::RwLockWriteGuard<'_, State> {
    state.write().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[async_trait]
impl RestSuggestionRepository for InMemoryRestSuggestionRepository {
    async fn insert(&self, suggestion: RestSuggestion) -> Result<RestSuggestion, RestSuggestionRepositoryError> {
        let mut state = lock_write(&self.state);
        state.order.push(suggestion.id);
        state.suggestions.insert(suggestion.id, suggestion.clone());
        Ok(suggestion)
    }

    async fn get(&self, id: SuggestionId) -> Result<RestSuggestion, RestSuggestionRepositoryError> {
        lock_read(&self.state)
            .suggestions
            .get(&id)
            .cloned()
            .ok_or(RestSuggestionRepositoryError::NotFound(id))
    }

    async fn pending(&self) -> Result<Option<RestSuggestion>, RestSuggestionRepositoryError> {
        let state = lock_read(&self.state);
        Ok(state
            .order
            .iter()
            .rev()
            .filter_map(|id| state.suggestions.get(id))
            .find(|suggestion| suggestion.status == SuggestionStatus::Pending)
            .cloned())
    }

    async fn update(&self, suggestion: RestSuggestion) -> Result<RestSuggestion, RestSuggestionRepositoryError> {
        let mut state = lock_write(&self.state);
        if !state.suggestions.contains_key(&suggestion.id) {
            return Err(RestSuggestionRepositoryError::NotFound(suggestion.id));
        }
        state.suggestions.insert(suggestion.id, suggestion.clone());
        Ok(suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest_advisor::domain::TriggerType;
    use chrono::Utc;

    fn new_suggestion() -> RestSuggestion {
        RestSuggestion {
            id: SuggestionId::new(),
            trigger_type: TriggerType::TaskSwitch,
            task_id: None,
            focus_seconds: 1800,
            switch_count_30m: 1,
            deviation_ratio: 0.0,
            suggested_minutes: 3,
            reasons: vec!["R3".to_owned()],
            status: SuggestionStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn pending_returns_the_most_recent_pending_suggestion() {
        let repository = InMemoryRestSuggestionRepository::new();
        let mut first = new_suggestion();
        first.status = SuggestionStatus::Ignored;
        repository.insert(first).await.expect("insert first");

        let second = new_suggestion();
        let second_id = second.id;
        repository.insert(second).await.expect("insert second");

        let pending = repository.pending().await.expect("pending").expect("present");
        assert_eq!(pending.id, second_id);
    }

    #[tokio::test]
    async fn update_missing_suggestion_is_not_found() {
        let repository = InMemoryRestSuggestionRepository::new();
        let err = repository
            .update(new_suggestion())
            .await
            .expect_err("missing suggestion");
        assert!(matches!(err, RestSuggestionRepositoryError::NotFound(_)));
    }
}
