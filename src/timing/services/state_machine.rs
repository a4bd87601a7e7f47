//! Enforces the single-active-context invariant and translates intents into
//! event sequences (§4.D).

use super::error::TimingError;
use crate::task::domain::{Task, TaskId, TaskStatus};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::timing::domain::EventKind;
use crate::timing::ports::{TimingTransaction, TimingWriteOp};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Result of a successful timing intent: the primary task or tasks touched.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The task the intent was directed at, after the transition.
    pub task: Task,
    /// A second task also mutated by the same intent (the paused or resumed
    /// peer), if any.
    pub companion: Option<Task>,
}

/// Orchestrates start/pause/resume/stop/insert-subtask intents.
pub struct TimingStateMachine<TR, TX, C>
where
    TR: TaskRepository,
    TX: TimingTransaction,
    C: Clock + Send + Sync,
{
    tasks: Arc<TR>,
    transaction: Arc<TX>,
    clock: Arc<C>,
}

impl<TR, TX, C> TimingStateMachine<TR, TX, C>
where
    TR: TaskRepository,
    TX: TimingTransaction,
    C: Clock + Send + Sync,
{
    /// Creates a new state machine over the given task repository, timing
    /// transaction committer, and clock.
    #[must_use]
    pub const fn new(tasks: Arc<TR>, transaction: Arc<TX>, clock: Arc<C>) -> Self {
        Self {
            tasks,
            transaction,
            clock,
        }
    }

    async fn fetch_live(&self, id: TaskId) -> Result<Task, TimingError> {
        let task = self.tasks.get_task(id).await?;
        if task.is_archived() {
            return Err(TaskRepositoryError::Archived(id).into());
        }
        Ok(task)
    }

    async fn currently_running(&self, excluding: TaskId) -> Result<Option<Task>, TimingError> {
        let tasks = self.tasks.list_tasks().await?;
        Ok(tasks
            .into_iter()
            .find(|task| task.status() == TaskStatus::Running && task.id() != excluding))
    }

    /// Starts `id`. Pauses the current runner first, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::TaskRepository`] with
    /// [`TaskRepositoryError::Archived`] if `id` is archived, or
    /// [`TimingError::InvalidState`] if `id` is already running or paused.
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn start(&self, id: TaskId) -> Result<TransitionOutcome, TimingError> {
        let task = self.fetch_live(id).await?;
        if !matches!(task.status(), TaskStatus::Idle | TaskStatus::Stopped) {
            return Err(TimingError::InvalidState(format!(
                "task {id} cannot start from status {:?}",
                task.status()
            )));
        }

        let at = self.clock.utc();
        let running = self.currently_running(id).await?;

        let mut ops = Vec::with_capacity(4);
        if let Some(running) = &running {
            ops.push(pause_op(running.id(), at));
            ops.push(set_status_op(running.clone(), TaskStatus::Paused));
        }
        ops.push(start_op(id, at));
        ops.push(set_status_op(task, TaskStatus::Running));

        let mut tasks = self.transaction.commit(ops).await?.tasks.into_iter();
        let companion = if running.is_some() { tasks.next() } else { None };
        let task = tasks.next().ok_or_else(missing_task)?;
        debug!("started task");
        Ok(TransitionOutcome { task, companion })
    }

    /// Pauses `id`.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::InvalidState`] if `id` is not running.
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn pause(&self, id: TaskId) -> Result<TransitionOutcome, TimingError> {
        let task = self.fetch_live(id).await?;
        if task.status() != TaskStatus::Running {
            return Err(TimingError::InvalidState(format!(
                "task {id} cannot pause from status {:?}",
                task.status()
            )));
        }
        let at = self.clock.utc();
        let ops = vec![pause_op(id, at), set_status_op(task, TaskStatus::Paused)];
        let mut tasks = self.transaction.commit(ops).await?.tasks.into_iter();
        let task = tasks.next().ok_or_else(missing_task)?;
        debug!("paused task");
        Ok(TransitionOutcome {
            task,
            companion: None,
        })
    }

    /// Resumes `id`. Pauses the current runner first, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::InvalidState`] if `id` is not paused.
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn resume(&self, id: TaskId) -> Result<TransitionOutcome, TimingError> {
        let task = self.fetch_live(id).await?;
        if task.status() != TaskStatus::Paused {
            return Err(TimingError::InvalidState(format!(
                "task {id} cannot resume from status {:?}",
                task.status()
            )));
        }

        let at = self.clock.utc();
        let running = self.currently_running(id).await?;

        let mut ops = Vec::with_capacity(4);
        if let Some(running) = &running {
            ops.push(pause_op(running.id(), at));
            ops.push(set_status_op(running.clone(), TaskStatus::Paused));
        }
        ops.push(resume_op(id, at));
        ops.push(set_status_op(task, TaskStatus::Running));

        let mut tasks = self.transaction.commit(ops).await?.tasks.into_iter();
        let companion = if running.is_some() { tasks.next() } else { None };
        let task = tasks.next().ok_or_else(missing_task)?;
        debug!("resumed task");
        Ok(TransitionOutcome { task, companion })
    }

    /// Stops `id`, finalizing its current session. Auto-resumes a still-paused
    /// parent left behind by [`Self::insert_subtask_and_start`], unless some
    /// other task has since become the globally running one.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::InvalidState`] if `id` is idle or already
    /// stopped.
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn stop(&self, id: TaskId) -> Result<TransitionOutcome, TimingError> {
        let task = self.fetch_live(id).await?;
        if !matches!(task.status(), TaskStatus::Running | TaskStatus::Paused) {
            return Err(TimingError::InvalidState(format!(
                "task {id} cannot stop from status {:?}",
                task.status()
            )));
        }

        let at = self.clock.utc();
        let parent = match task.parent_id() {
            Some(parent_id) => Some(self.tasks.get_task(parent_id).await?),
            None => None,
        };
        let another_task_is_running = self.currently_running(id).await?.is_some();
        let should_resume_parent =
            parent.as_ref().is_some_and(|parent| parent.status() == TaskStatus::Paused) && !another_task_is_running;

        let mut ops = vec![stop_op(id, at), set_status_op(task, TaskStatus::Stopped)];
        if should_resume_parent {
            let parent = parent.expect("should_resume_parent implies parent is Some");
            ops.push(resume_op(parent.id(), at));
            ops.push(set_status_op(parent, TaskStatus::Running));
        }

        let mut tasks = self.transaction.commit(ops).await?.tasks.into_iter();
        let task = tasks.next().ok_or_else(missing_task)?;
        let companion = if should_resume_parent { tasks.next() } else { None };

        debug!("stopped task");
        Ok(TransitionOutcome { task, companion })
    }

    /// Creates a child of `parent_id` and starts it, pausing the parent.
    ///
    /// # Errors
    ///
    /// Returns [`TimingError::InvalidState`] if `parent_id` is not running,
    /// or any [`TaskDomainError`](crate::task::domain::TaskDomainError)
    /// wrapped by the caller if `title` fails validation.
    #[instrument(skip(self, title), fields(parent_id = %parent_id))]
    pub async fn insert_subtask_and_start(
        &self,
        parent_id: TaskId,
        child: Task,
    ) -> Result<TransitionOutcome, TimingError> {
        let parent = self.fetch_live(parent_id).await?;
        if parent.status() != TaskStatus::Running {
            return Err(TimingError::InvalidState(format!(
                "task {parent_id} is not running; cannot insert and start a subtask"
            )));
        }

        let at = self.clock.utc();
        let child = self.tasks.insert_task(child).await?;

        let ops = vec![
            pause_op(parent_id, at),
            set_status_op(parent, TaskStatus::Paused),
            start_op(child.id(), at),
            set_status_op(child, TaskStatus::Running),
        ];

        let mut tasks = self.transaction.commit(ops).await?.tasks.into_iter();
        let parent = tasks.next().ok_or_else(missing_task)?;
        let child = tasks.next().ok_or_else(missing_task)?;

        debug!("inserted and started subtask");
        Ok(TransitionOutcome {
            task: child,
            companion: Some(parent),
        })
    }
}

fn missing_task() -> TimingError {
    TimingError::InvalidState("timing transaction produced no task".to_owned())
}

fn pause_op(task_id: TaskId, at: DateTime<Utc>) -> TimingWriteOp {
    TimingWriteOp::AppendEvent {
        task_id,
        kind: EventKind::Pause,
        at,
    }
}

fn resume_op(task_id: TaskId, at: DateTime<Utc>) -> TimingWriteOp {
    TimingWriteOp::AppendEvent {
        task_id,
        kind: EventKind::Resume,
        at,
    }
}

fn start_op(task_id: TaskId, at: DateTime<Utc>) -> TimingWriteOp {
    TimingWriteOp::AppendEvent {
        task_id,
        kind: EventKind::Start,
        at,
    }
}

fn stop_op(task_id: TaskId, at: DateTime<Utc>) -> TimingWriteOp {
    TimingWriteOp::AppendEvent {
        task_id,
        kind: EventKind::Stop,
        at,
    }
}

fn set_status_op(task: Task, status: TaskStatus) -> TimingWriteOp {
    TimingWriteOp::SetStatus { task, status }
}
