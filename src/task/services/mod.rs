//! Orchestration for task CRUD, archival, reparenting, and tagging.

mod error;
mod lifecycle;

pub use error::TaskLifecycleError;
pub use lifecycle::TaskLifecycleService;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::adapters::memory::InMemoryTaskRepository;
    use crate::task::ports::{TaskRepository, TaskRepositoryError};
    use crate::timing::adapters::{InMemoryEventLogRepository, SequentialTimingTransaction};
    use crate::timing::services::TimingStateMachine;
    use mockable::DefaultClock;
    use std::sync::Arc;

    type Transaction = SequentialTimingTransaction<InMemoryTaskRepository, InMemoryEventLogRepository>;

    type Fixture = (
        Arc<InMemoryTaskRepository>,
        Arc<TimingStateMachine<InMemoryTaskRepository, Transaction, DefaultClock>>,
        TaskLifecycleService<InMemoryTaskRepository, InMemoryEventLogRepository, Transaction, DefaultClock>,
    );

    fn fixture() -> Fixture {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let events = Arc::new(InMemoryEventLogRepository::new());
        let clock = Arc::new(DefaultClock);
        let transaction = Arc::new(SequentialTimingTransaction::new(tasks.clone(), events.clone()));
        let timing = Arc::new(TimingStateMachine::new(tasks.clone(), transaction, clock.clone()));
        let service = TaskLifecycleService::new(tasks.clone(), events, timing.clone(), clock);
        (tasks, timing, service)
    }

    #[tokio::test]
    async fn create_task_is_idle_root() {
        let (_tasks, _timing, service) = fixture();
        let task = service.create_task("Write report", None).await.expect("create");
        assert!(task.parent_id().is_none());
    }

    #[tokio::test]
    async fn create_task_rejects_archived_parent() {
        let (_tasks, _timing, service) = fixture();
        let parent = service.create_task("Parent", None).await.expect("create parent");
        service.archive_task(parent.id()).await.expect("archive");

        let err = service
            .create_task("Child", Some(parent.id()))
            .await
            .expect_err("archived parent");
        assert!(matches!(
            err,
            TaskLifecycleError::Repository(TaskRepositoryError::Archived(_))
        ));
    }

    #[tokio::test]
    async fn rename_round_trip_preserves_title() {
        let (_tasks, _timing, service) = fixture();
        let task = service.create_task("Draft", None).await.expect("create");
        let renamed = service.rename_task(task.id(), "Final").await.expect("rename");
        let restored = service
            .rename_task(renamed.id(), "Draft")
            .await
            .expect("rename back");
        assert_eq!(restored.title(), "Draft");
    }

    #[tokio::test]
    async fn reparent_to_self_is_cycle() {
        let (_tasks, _timing, service) = fixture();
        let task = service.create_task("A", None).await.expect("create");
        let err = service
            .reparent_task(task.id(), Some(task.id()))
            .await
            .expect_err("self cycle");
        assert!(matches!(
            err,
            TaskLifecycleError::Repository(TaskRepositoryError::CycleDetected(_))
        ));
    }

    #[tokio::test]
    async fn reparent_to_descendant_is_cycle() {
        let (_tasks, _timing, service) = fixture();
        let x = service.create_task("X", None).await.expect("create x");
        let y = service
            .create_task("Y", Some(x.id()))
            .await
            .expect("create y under x");

        let err = service
            .reparent_task(x.id(), Some(y.id()))
            .await
            .expect_err("descendant cycle");
        assert!(matches!(
            err,
            TaskLifecycleError::Repository(TaskRepositoryError::CycleDetected(_))
        ));
    }

    #[tokio::test]
    async fn archive_stops_running_subtree_member() {
        let (_tasks, timing, service) = fixture();
        let parent = service.create_task("Parent", None).await.expect("create parent");
        let child = service
            .create_task("Child", Some(parent.id()))
            .await
            .expect("create child");
        timing.start(child.id()).await.expect("start child");

        let archived = service.archive_task(parent.id()).await.expect("archive");
        assert_eq!(archived.len(), 2);
        assert!(archived.iter().all(crate::task::domain::Task::is_archived));
    }

    #[tokio::test]
    async fn add_tag_twice_is_idempotent() {
        let (tasks, _timing, service) = fixture();
        let task = service.create_task("A", None).await.expect("create");
        service.add_tag(task.id(), "deep-work").await.expect("first add");
        service.add_tag(task.id(), "deep-work").await.expect("second add");

        let tags = tasks.tags_for_task(task.id()).await.expect("tags");
        assert_eq!(tags.len(), 1);
    }

    #[tokio::test]
    async fn remove_unknown_tag_is_a_no_op() {
        let (_tasks, _timing, service) = fixture();
        let task = service.create_task("A", None).await.expect("create");
        service
            .remove_tag(task.id(), "never-added")
            .await
            .expect("no-op removal");
    }

    #[tokio::test]
    async fn hard_delete_requires_archived_members() {
        let (_tasks, _timing, service) = fixture();
        let task = service.create_task("A", None).await.expect("create");
        let err = service
            .delete_tasks(&[task.id()], true)
            .await
            .expect_err("not archived");
        assert!(matches!(err, TaskLifecycleError::NotArchived(_)));
    }
}
