//! Orchestrates task CRUD, archival, reparenting, and tag assignment.

use super::error::TaskLifecycleError;
use crate::task::domain::{Tag, TaskId, TaskStatus, Task, validate_tag_name};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use crate::timing::domain::EventKind;
use crate::timing::domain::NewTimeEvent;
use crate::timing::ports::{EventLogRepository, TimingTransaction};
use crate::timing::services::TimingStateMachine;
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Orchestrates the Task Repository operations of §4.C.
pub struct TaskLifecycleService<TR, EL, TX, C>
where
    TR: TaskRepository,
    EL: EventLogRepository,
    TX: TimingTransaction,
    C: Clock + Send + Sync,
{
    tasks: Arc<TR>,
    events: Arc<EL>,
    timing: Arc<TimingStateMachine<TR, TX, C>>,
    clock: Arc<C>,
}

impl<TR, EL, TX, C> TaskLifecycleService<TR, EL, TX, C>
where
    TR: TaskRepository,
    EL: EventLogRepository,
    TX: TimingTransaction,
    C: Clock + Send + Sync,
{
    /// Creates a new service over the given repositories, state machine, and
    /// clock.
    #[must_use]
    pub const fn new(
        tasks: Arc<TR>,
        events: Arc<EL>,
        timing: Arc<TimingStateMachine<TR, TX, C>>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            tasks,
            events,
            timing,
            clock,
        }
    }

    /// Creates a new task under `parent_id`, or as a root task if `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] if `title` fails validation,
    /// [`TaskLifecycleError::Repository`] with [`TaskRepositoryError::NotFound`]
    /// if `parent_id` does not exist, or with
    /// [`TaskRepositoryError::Archived`] if the parent is archived.
    #[instrument(skip(self, title), fields(parent_id = ?parent_id))]
    pub async fn create_task(
        &self,
        title: &str,
        parent_id: Option<TaskId>,
    ) -> Result<Task, TaskLifecycleError> {
        if let Some(parent_id) = parent_id {
            let parent = self.tasks.get_task(parent_id).await?;
            if parent.is_archived() {
                return Err(TaskRepositoryError::Archived(parent_id).into());
            }
        }
        let task = Task::new(title, parent_id, self.clock.as_ref())?;
        let task = self.tasks.insert_task(task).await?;
        info!(task_id = %task.id(), "created task");
        Ok(task)
    }

    /// Renames `id`. Renaming to the current title is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] if `title` fails validation, or
    /// [`TaskLifecycleError::Repository`] with [`TaskRepositoryError::NotFound`]
    /// if `id` does not exist.
    #[instrument(skip(self, title), fields(task_id = %id))]
    pub async fn rename_task(&self, id: TaskId, title: &str) -> Result<Task, TaskLifecycleError> {
        let mut task = self.tasks.get_task(id).await?;
        task.rename(title)?;
        let task = self.tasks.update_task(task).await?;
        Ok(task)
    }

    /// Reparents `id` to `new_parent_id` (or makes it a root task).
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] with
    /// [`TaskRepositoryError::CycleDetected`] if `new_parent_id` equals `id`
    /// or is a descendant of `id`, with [`TaskRepositoryError::NotFound`] if
    /// either task is missing, or with [`TaskRepositoryError::Archived`] if
    /// the new parent is archived.
    #[instrument(skip(self), fields(task_id = %id, new_parent_id = ?new_parent_id))]
    pub async fn reparent_task(
        &self,
        id: TaskId,
        new_parent_id: Option<TaskId>,
    ) -> Result<Task, TaskLifecycleError> {
        let mut task = self.tasks.get_task(id).await?;

        if let Some(candidate) = new_parent_id {
            if candidate == id {
                return Err(TaskRepositoryError::CycleDetected(id).into());
            }
            let parent = self.tasks.get_task(candidate).await?;
            if parent.is_archived() {
                return Err(TaskRepositoryError::Archived(candidate).into());
            }
            let ancestors = self.tasks.ancestors(candidate).await?;
            if ancestors.contains(&id) {
                return Err(TaskRepositoryError::CycleDetected(id).into());
            }
        }

        let old_parent_id = task.parent_id();
        task.set_parent_id(new_parent_id);
        let task = self.tasks.update_task(task).await?;

        let at = self.clock.utc();
        self.events
            .append(vec![NewTimeEvent::reparent(id, at, old_parent_id, new_parent_id)])
            .await?;

        Ok(task)
    }

    /// Archives `id` and its entire subtree, stopping any running or paused
    /// member first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] with
    /// [`TaskRepositoryError::NotFound`] if `id` does not exist.
    #[instrument(skip(self), fields(task_id = %id))]
    pub async fn archive_task(&self, id: TaskId) -> Result<Vec<Task>, TaskLifecycleError> {
        let mut member_ids = vec![id];
        member_ids.extend(self.tasks.descendants(id).await?);

        for member_id in &member_ids {
            let member = self.tasks.get_task(*member_id).await?;
            if matches!(member.status(), TaskStatus::Running | TaskStatus::Paused) {
                self.timing.stop(*member_id).await?;
            }
        }

        let mut archived = Vec::with_capacity(member_ids.len());
        for member_id in member_ids {
            let mut member = self.tasks.get_task(member_id).await?;
            member.archive(self.clock.as_ref());
            archived.push(self.tasks.update_task(member).await?);
        }

        info!(task_id = %id, subtree_size = archived.len(), "archived task subtree");
        Ok(archived)
    }

    /// Deletes `ids`. Soft delete sets `archived_at`; hard delete permanently
    /// removes the task rows, tag assignments, and events, requiring every
    /// member to already be archived.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotArchived`] if `hard` is requested for
    /// a member that is not archived, or [`TaskLifecycleError::Repository`]
    /// with [`TaskRepositoryError::NotFound`] if any id is missing.
    #[instrument(skip(self), fields(count = ids.len(), hard))]
    pub async fn delete_tasks(&self, ids: &[TaskId], hard: bool) -> Result<(), TaskLifecycleError> {
        if hard {
            for id in ids {
                let task = self.tasks.get_task(*id).await?;
                if !task.is_archived() {
                    return Err(TaskLifecycleError::NotArchived(*id));
                }
            }
            self.tasks.delete_tasks(ids).await?;
            self.events.delete_for_tasks(ids).await?;
            warn!(count = ids.len(), "hard-deleted tasks and their events");
        } else {
            for id in ids {
                let mut task = self.tasks.get_task(*id).await?;
                task.archive(self.clock.as_ref());
                self.tasks.update_task(task).await?;
            }
            info!(count = ids.len(), "soft-deleted tasks");
        }
        Ok(())
    }

    /// Attaches `tag_name` to `task_id`, creating the tag if it does not yet
    /// exist. Idempotent: attaching an already-present tag emits no event.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] if `tag_name` fails validation,
    /// or [`TaskLifecycleError::Repository`] with
    /// [`TaskRepositoryError::NotFound`] if `task_id` does not exist.
    #[instrument(skip(self, tag_name), fields(task_id = %task_id))]
    pub async fn add_tag(&self, task_id: TaskId, tag_name: &str) -> Result<Tag, TaskLifecycleError> {
        let name = validate_tag_name(tag_name)?;
        let tag = match self.tasks.find_tag_by_name(&name).await? {
            Some(tag) => tag,
            None => {
                let tag = Tag::new(&name, self.clock.utc())?;
                self.tasks.insert_tag(tag).await?
            }
        };

        let attached = self.tasks.attach_tag(task_id, tag.id()).await?;
        if attached {
            let at = self.clock.utc();
            self.events
                .append(vec![NewTimeEvent::tag(task_id, EventKind::TagAdd, at, &name)])
                .await?;
        }
        Ok(tag)
    }

    /// Detaches `tag_name` from `task_id`. Idempotent: removing an absent
    /// tag, or one not attached to `task_id`, emits no event.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] with
    /// [`TaskRepositoryError::NotFound`] if `task_id` does not exist.
    #[instrument(skip(self, tag_name), fields(task_id = %task_id))]
    pub async fn remove_tag(&self, task_id: TaskId, tag_name: &str) -> Result<(), TaskLifecycleError> {
        let Some(tag) = self.tasks.find_tag_by_name(tag_name).await? else {
            return Ok(());
        };

        let detached = self.tasks.detach_tag(task_id, tag.id()).await?;
        if detached {
            let at = self.clock.utc();
            self.events
                .append(vec![NewTimeEvent::tag(
                    task_id,
                    EventKind::TagRemove,
                    at,
                    tag.name(),
                )])
                .await?;
        }
        Ok(())
    }
}
