//! Deterministic recomputation of per-task durations from the event log
//! (§4.E).

use crate::replay::domain::{Range, Window};
use crate::task::domain::{TaskId, TaskStatus};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::timing::domain::EventKind;
use crate::timing::ports::{EventLogRepository, EventLogRepositoryError};
use mockable::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised while replaying the event log.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The task repository failed.
    #[error(transparent)]
    TaskRepository(#[from] TaskRepositoryError),

    /// The event log failed.
    #[error(transparent)]
    EventLog(#[from] EventLogRepositoryError),
}

/// A task's exclusive and inclusive running seconds over a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDuration {
    /// Own running time within the window, seconds.
    pub exclusive_seconds: i64,
    /// Own plus every descendant's running time within the window, seconds.
    pub inclusive_seconds: i64,
}

/// Recomputes per-task durations by replaying the append-only event log.
pub struct ReplayAggregator<TR, EL, C>
where
    TR: TaskRepository,
    EL: EventLogRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<TR>,
    events: Arc<EL>,
    clock: Arc<C>,
}

impl<TR, EL, C> ReplayAggregator<TR, EL, C>
where
    TR: TaskRepository,
    EL: EventLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new aggregator over the given repositories and clock.
    #[must_use]
    pub const fn new(tasks: Arc<TR>, events: Arc<EL>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            events,
            clock,
        }
    }

    /// Computes per-task durations over `range`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] if either repository fails.
    pub async fn durations(&self, range: Range) -> Result<HashMap<TaskId, TaskDuration>, ReplayError> {
        let now = self.clock.utc();
        let window = Window::resolve(range, now);

        let tasks = self.tasks.list_tasks().await?;
        let parent_map: HashMap<TaskId, Option<TaskId>> =
            tasks.iter().map(|task| (task.id(), task.parent_id())).collect();

        let events = self.events.stream_all().await?;
        let exclusive = replay_exclusive(&tasks, &events, &window);
        let inclusive = roll_up_inclusive(&parent_map, &exclusive);

        debug!(
            task_count = tasks.len(),
            event_count = events.len(),
            "replayed event log"
        );

        Ok(tasks
            .iter()
            .map(|task| {
                let id = task.id();
                (
                    id,
                    TaskDuration {
                        exclusive_seconds: *exclusive.get(&id).unwrap_or(&0),
                        inclusive_seconds: *inclusive.get(&id).unwrap_or(&0),
                    },
                )
            })
            .collect())
    }

    /// Returns the currently running task, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::TaskRepository`] if the task repository fails.
    pub async fn active_task(&self) -> Result<Option<TaskId>, ReplayError> {
        Ok(self
            .tasks
            .list_tasks()
            .await?
            .into_iter()
            .find(|task| task.status() == TaskStatus::Running)
            .map(|task| task.id()))
    }
}

fn replay_exclusive(
    tasks: &[crate::task::domain::Task],
    events: &[crate::timing::domain::TimeEvent],
    window: &Window,
) -> HashMap<TaskId, i64> {
    let mut exclusive: HashMap<TaskId, i64> = tasks.iter().map(|task| (task.id(), 0)).collect();
    let mut running_since: HashMap<TaskId, i64> = HashMap::new();

    for event in events {
        match event.kind {
            EventKind::Start | EventKind::Resume => {
                running_since.insert(event.task_id, event.at.timestamp());
            }
            EventKind::Pause | EventKind::Stop => {
                if let Some(start) = running_since.remove(&event.task_id) {
                    add_clipped_interval(&mut exclusive, event.task_id, start, event.at.timestamp(), window);
                }
            }
            EventKind::Reparent | EventKind::TagAdd | EventKind::TagRemove => {}
        }
    }

    for (task_id, start) in running_since {
        add_clipped_interval(&mut exclusive, task_id, start, window.t1, window);
    }

    exclusive
}

fn add_clipped_interval(
    exclusive: &mut HashMap<TaskId, i64>,
    task_id: TaskId,
    start: i64,
    end: i64,
    window: &Window,
) {
    let clipped_end = window.clamp_end(end);
    let clipped_start = window.clamp_start(start);
    let contribution = (clipped_end - clipped_start).max(0);
    if contribution > 0 {
        *exclusive.entry(task_id).or_insert(0) += contribution;
    }
}

fn roll_up_inclusive(
    parent_map: &HashMap<TaskId, Option<TaskId>>,
    exclusive: &HashMap<TaskId, i64>,
) -> HashMap<TaskId, i64> {
    let mut children: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for (&id, &parent) in parent_map {
        if let Some(parent_id) = parent {
            children.entry(parent_id).or_default().push(id);
        }
    }

    let mut inclusive = HashMap::new();
    for &id in parent_map.keys() {
        compute_inclusive(id, &children, exclusive, &mut inclusive);
    }
    inclusive
}

fn compute_inclusive(
    id: TaskId,
    children: &HashMap<TaskId, Vec<TaskId>>,
    exclusive: &HashMap<TaskId, i64>,
    memo: &mut HashMap<TaskId, i64>,
) -> i64 {
    if let Some(&value) = memo.get(&id) {
        return value;
    }
    let own = *exclusive.get(&id).unwrap_or(&0);
    let child_total: i64 = children
        .get(&id)
        .into_iter()
        .flatten()
        .map(|&child_id| compute_inclusive(child_id, children, exclusive, memo))
        .sum();
    let total = own + child_total;
    memo.insert(id, total);
    total
}
