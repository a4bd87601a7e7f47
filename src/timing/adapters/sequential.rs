//! A backend-agnostic [`TimingTransaction`] that applies each op in turn
//! through the ordinary repository ports, with no shared-transaction
//! guarantee. Used where the store has no single connection to share (the
//! in-memory adapters, primarily tests).

use crate::task::ports::TaskRepository;
use crate::timing::domain::NewTimeEvent;
use crate::timing::ports::{
    EventLogRepository, TimingTransaction, TimingTransactionError, TimingWriteOp, TimingWriteResult,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Applies a timing intent's ops one at a time against the task and event
/// repository ports.
pub struct SequentialTimingTransaction<TR, EL>
where
    TR: TaskRepository,
    EL: EventLogRepository,
{
    tasks: Arc<TR>,
    events: Arc<EL>,
}

impl<TR, EL> SequentialTimingTransaction<TR, EL>
where
    TR: TaskRepository,
    EL: EventLogRepository,
{
    /// Creates a transaction applier over the given repositories.
    #[must_use]
    pub const fn new(tasks: Arc<TR>, events: Arc<EL>) -> Self {
        Self { tasks, events }
    }
}

#[async_trait]
impl<TR, EL> TimingTransaction for SequentialTimingTransaction<TR, EL>
where
    TR: TaskRepository,
    EL: EventLogRepository,
{
    async fn commit(&self, ops: Vec<TimingWriteOp>) -> Result<TimingWriteResult, TimingTransactionError> {
        let mut result = TimingWriteResult::default();
        for op in ops {
            match op {
                TimingWriteOp::AppendEvent { task_id, kind, at } => {
                    let mut persisted = self
                        .events
                        .append(vec![NewTimeEvent::bare(task_id, kind, at)])
                        .await
                        .map_err(TimingTransactionError::persistence)?;
                    result.events.append(&mut persisted);
                }
                TimingWriteOp::SetStatus { mut task, status } => {
                    task.set_status(status);
                    let task = self
                        .tasks
                        .update_task(task)
                        .await
                        .map_err(TimingTransactionError::persistence)?;
                    result.tasks.push(task);
                }
                TimingWriteOp::InsertTask(task) => {
                    let task = self
                        .tasks
                        .insert_task(task)
                        .await
                        .map_err(TimingTransactionError::persistence)?;
                    result.tasks.push(task);
                }
            }
        }
        Ok(result)
    }
}
