//! Orchestration for the timing state machine.

mod error;
mod state_machine;

pub use error::TimingError;
pub use state_machine::{TimingStateMachine, TransitionOutcome};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::adapters::memory::InMemoryTaskRepository;
    use crate::task::domain::{Task, TaskStatus};
    use crate::task::ports::TaskRepository;
    use crate::timing::adapters::{InMemoryEventLogRepository, SequentialTimingTransaction};
    use mockable::{Clock, DefaultClock};
    use rstest::rstest;
    use std::sync::Arc;

    type Fixture = (
        Arc<InMemoryTaskRepository>,
        TimingStateMachine<
            InMemoryTaskRepository,
            SequentialTimingTransaction<InMemoryTaskRepository, InMemoryEventLogRepository>,
            DefaultClock,
        >,
    );

    fn fixture() -> Fixture {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let events = Arc::new(InMemoryEventLogRepository::new());
        let transaction = Arc::new(SequentialTimingTransaction::new(tasks.clone(), events));
        let machine = TimingStateMachine::new(tasks.clone(), transaction, Arc::new(DefaultClock));
        (tasks, machine)
    }

    #[tokio::test]
    async fn start_from_idle_succeeds() {
        let (tasks, machine) = fixture();
        let clock = DefaultClock;
        let task = Task::new("A", None, &clock).expect("valid title");
        let id = task.id();
        tasks.insert_task(task).await.expect("insert");

        let outcome = machine.start(id).await.expect("start");
        assert_eq!(outcome.task.status(), TaskStatus::Running);
        assert!(outcome.companion.is_none());
    }

    #[tokio::test]
    async fn starting_second_task_pauses_first() {
        let (tasks, machine) = fixture();
        let clock = DefaultClock;
        let a = Task::new("A", None, &clock).expect("valid title");
        let b = Task::new("B", None, &clock).expect("valid title");
        let a_id = a.id();
        let b_id = b.id();
        tasks.insert_task(a).await.expect("insert a");
        tasks.insert_task(b).await.expect("insert b");

        machine.start(a_id).await.expect("start a");
        let outcome = machine.start(b_id).await.expect("start b");

        assert_eq!(outcome.task.status(), TaskStatus::Running);
        let companion = outcome.companion.expect("a was paused");
        assert_eq!(companion.id(), a_id);
        assert_eq!(companion.status(), TaskStatus::Paused);
    }

    #[rstest]
    #[case(TaskStatus::Running)]
    #[case(TaskStatus::Paused)]
    #[tokio::test]
    async fn starting_an_active_task_is_invalid(#[case] status: TaskStatus) {
        let (tasks, machine) = fixture();
        let clock = DefaultClock;
        let mut task = Task::new("A", None, &clock).expect("valid title");
        task.set_status(status);
        let id = task.id();
        tasks.insert_task(task).await.expect("insert");

        let err = machine.start(id).await.expect_err("already active");
        assert!(matches!(err, TimingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn stop_auto_resumes_paused_parent() {
        let (tasks, machine) = fixture();
        let clock = DefaultClock;
        let parent = Task::new("Parent", None, &clock).expect("valid title");
        let parent_id = parent.id();
        tasks.insert_task(parent).await.expect("insert parent");
        machine.start(parent_id).await.expect("start parent");

        let child = Task::new("Child", Some(parent_id), &clock).expect("valid title");
        let outcome = machine
            .insert_subtask_and_start(parent_id, child)
            .await
            .expect("insert subtask");
        let child_id = outcome.task.id();

        let stop_outcome = machine.stop(child_id).await.expect("stop child");
        let resumed_parent = stop_outcome.companion.expect("parent auto-resumed");
        assert_eq!(resumed_parent.id(), parent_id);
        assert_eq!(resumed_parent.status(), TaskStatus::Running);
    }

    #[tokio::test]
    async fn insert_subtask_requires_running_parent() {
        let (tasks, machine) = fixture();
        let clock = DefaultClock;
        let parent = Task::new("Parent", None, &clock).expect("valid title");
        let parent_id = parent.id();
        tasks.insert_task(parent).await.expect("insert parent");

        let child = Task::new("Child", Some(parent_id), &clock).expect("valid title");
        let err = machine
            .insert_subtask_and_start(parent_id, child)
            .await
            .expect_err("parent is idle");
        assert!(matches!(err, TimingError::InvalidState(_)));
    }

    #[tokio::test]
    async fn stop_on_idle_task_is_invalid() {
        let (tasks, machine) = fixture();
        let clock = DefaultClock;
        let task = Task::new("A", None, &clock).expect("valid title");
        let id = task.id();
        tasks.insert_task(task).await.expect("insert");

        let err = machine.stop(id).await.expect_err("idle task cannot stop");
        assert!(matches!(err, TimingError::InvalidState(_)));
    }
}
