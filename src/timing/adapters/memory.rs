//! In-memory [`EventLogRepository`], used by tests and ephemeral sessions.

use crate::task::domain::TaskId;
use crate::timing::domain::{NewTimeEvent, TimeEvent};
use crate::timing::ports::{EventLogRepository, EventLogRepositoryError};
use async_trait::async_trait;
use std::sync::RwLock;

#[derive(Default)]
struct State {
    events: Vec<TimeEvent>,
    next_sequence: i64,
}

/// Thread-safe in-memory event log.
#[derive(Default)]
pub struct InMemoryEventLogRepository {
    state: RwLock<State>,
}

impl InMemoryEventLogRepository {
    /// Creates an empty event log.
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
impl EventLogRepository for InMemoryEventLogRepository {
    async fn append(&self, events: Vec<NewTimeEvent>) -> Result<Vec<TimeEvent>, EventLogRepositoryError> {
        let mut state = lock_write(&self.state);
        let mut persisted = Vec::with_capacity(events.len());
        for new_event in events {
            let sequence = state.next_sequence;
            state.next_sequence += 1;
            let event = TimeEvent {
                sequence,
                task_id: new_event.task_id,
                kind: new_event.kind,
                at: new_event.at,
                payload: new_event.payload,
            };
            state.events.push(event.clone());
            persisted.push(event);
        }
        Ok(persisted)
    }

    async fn stream_all(&self) -> Result<Vec<TimeEvent>, EventLogRepositoryError> {
        Ok(lock_read(&self.state).events.clone())
    }

    async fn stream_for_task(&self, task_id: TaskId) -> Result<Vec<TimeEvent>, EventLogRepositoryError> {
        Ok(lock_read(&self.state)
            .events
            .iter()
            .filter(|event| event.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn latest_for_task(&self, task_id: TaskId) -> Result<Option<TimeEvent>, EventLogRepositoryError> {
        Ok(lock_read(&self.state)
            .events
            .iter()
            .rev()
            .find(|event| event.task_id == task_id)
            .cloned())
    }

    async fn delete_for_tasks(&self, task_ids: &[TaskId]) -> Result<(), EventLogRepositoryError> {
        let mut state = lock_write(&self.state);
        state.events.retain(|event| !task_ids.contains(&event.task_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::domain::EventKind;
    use chrono::Utc;

    #[tokio::test]
    async fn append_assigns_increasing_sequence() {
        let log = InMemoryEventLogRepository::new();
        let task_id = TaskId::new();
        let at = Utc::now();
        let persisted = log
            .append(vec![
                NewTimeEvent::bare(task_id, EventKind::Start, at),
                NewTimeEvent::bare(task_id, EventKind::Stop, at),
            ])
            .await
            .expect("append");
        assert_eq!(persisted[0].sequence, 0);
        assert_eq!(persisted[1].sequence, 1);
    }

    #[tokio::test]
    async fn latest_for_task_returns_most_recent() {
        let log = InMemoryEventLogRepository::new();
        let task_id = TaskId::new();
        let at = Utc::now();
        log.append(vec![NewTimeEvent::bare(task_id, EventKind::Start, at)])
            .await
            .expect("append");
        log.append(vec![NewTimeEvent::bare(task_id, EventKind::Pause, at)])
            .await
            .expect("append");
        let latest = log.latest_for_task(task_id).await.expect("latest");
        assert_eq!(latest.map(|event| event.kind), Some(EventKind::Pause));
    }
}
