//! The Command Surface (§4.G): the operation API external collaborators
//! consume. Every timing transition commits its event append and the
//! task-status mirror update it implies inside a single storage transaction;
//! a mutating command also optionally triggers the rest advisor and emits a
//! single "data changed" notification on success.

use super::notify::ChangeNotifier;
use crate::config::RestAdvisorThresholds;
use crate::error::CoreResult;
use crate::replay::domain::{OverviewSnapshot, Range, TagSummary, TaskOverview};
use crate::replay::services::{ReplayAggregator, TaskDuration};
use crate::rest_advisor::domain::{RestSuggestion, SuggestionId, TriggerType};
use crate::rest_advisor::ports::RestSuggestionRepository;
use crate::rest_advisor::services::RestAdvisor;
use crate::task::domain::{Tag, Task, TaskId};
use crate::task::ports::TaskRepository;
use crate::task::services::TaskLifecycleService;
use crate::timing::ports::{EventLogRepository, TimingTransaction};
use crate::timing::services::{TimingStateMachine, TransitionOutcome};
use mockable::Clock;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::instrument;

/// The operation API exposed to external collaborators (the task tree UI,
/// the command-string parser, the navigation shell, and the host IPC
/// bridge). The core never renders, polls, or parses user text itself.
pub struct CommandSurface<TR, EL, TX, RS, C>
where
    TR: TaskRepository,
    EL: EventLogRepository,
    TX: TimingTransaction,
    RS: RestSuggestionRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<TR>,
    lifecycle: TaskLifecycleService<TR, EL, TX, C>,
    timing: Arc<TimingStateMachine<TR, TX, C>>,
    aggregator: ReplayAggregator<TR, EL, C>,
    advisor: RestAdvisor<EL, RS, C>,
    clock: Arc<C>,
    notifier: ChangeNotifier,
}

impl<TR, EL, TX, RS, C> CommandSurface<TR, EL, TX, RS, C>
where
    TR: TaskRepository,
    EL: EventLogRepository,
    TX: TimingTransaction,
    RS: RestSuggestionRepository,
    C: Clock + Send + Sync,
{
    /// Assembles a command surface over the given repositories, timing
    /// transaction committer, clock, and rest advisor thresholds.
    #[must_use]
    pub fn new(
        tasks: Arc<TR>,
        events: Arc<EL>,
        transaction: Arc<TX>,
        suggestions: Arc<RS>,
        clock: Arc<C>,
        rest_advisor_thresholds: RestAdvisorThresholds,
    ) -> Self {
        let timing = Arc::new(TimingStateMachine::new(tasks.clone(), transaction, clock.clone()));
        let lifecycle = TaskLifecycleService::new(tasks.clone(), events.clone(), timing.clone(), clock.clone());
        let aggregator = ReplayAggregator::new(tasks.clone(), events.clone(), clock.clone());
        let advisor = RestAdvisor::new(events, suggestions, clock.clone(), rest_advisor_thresholds);
        Self {
            tasks,
            lifecycle,
            timing,
            aggregator,
            advisor,
            clock,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Subscribes to "data changed" notifications emitted after every
    /// successful mutating command's commit.
    #[must_use]
    pub fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.notifier.subscribe()
    }

    /// Liveness probe.
    #[must_use]
    pub const fn ping(&self) -> &'static str {
        "pong"
    }

    /// Creates a new task.
    ///
    /// # Errors
    ///
    /// See §4.G: *InvalidInput*, *NotFound*, *Archived*.
    #[instrument(skip(self, title), fields(parent_id = ?parent_id))]
    pub async fn create_task(&self, title: &str, parent_id: Option<TaskId>) -> CoreResult<TaskId> {
        let task = self.lifecycle.create_task(title, parent_id).await?;
        self.notifier.notify_changed();
        Ok(task.id())
    }

    /// Renames a task. Renaming to the current title is a no-op.
    ///
    /// # Errors
    ///
    /// See §4.G: *InvalidInput*, *NotFound*.
    pub async fn rename_task(&self, id: TaskId, title: &str) -> CoreResult<Task> {
        let task = self.lifecycle.rename_task(id, title).await?;
        self.notifier.notify_changed();
        Ok(task)
    }

    /// Reparents a task, or makes it a root task when `new_parent_id` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// See §4.G: *CycleDetected*, *NotFound*, *Archived*.
    pub async fn reparent_task(&self, id: TaskId, new_parent_id: Option<TaskId>) -> CoreResult<Task> {
        let task = self.lifecycle.reparent_task(id, new_parent_id).await?;
        self.notifier.notify_changed();
        Ok(task)
    }

    /// Archives a task and its entire subtree, stopping any running or
    /// paused member first.
    ///
    /// # Errors
    ///
    /// See §4.G: *NotFound*.
    pub async fn archive_task(&self, id: TaskId) -> CoreResult<Vec<Task>> {
        let archived = self.lifecycle.archive_task(id).await?;
        self.notifier.notify_changed();
        Ok(archived)
    }

    /// Deletes tasks, soft by default. `hard = true` requires every member
    /// already archived.
    ///
    /// # Errors
    ///
    /// See §4.G: *NotFound*, *InvalidState* (hard delete of a non-archived
    /// task).
    pub async fn delete_tasks(&self, ids: &[TaskId], hard: bool) -> CoreResult<()> {
        self.lifecycle.delete_tasks(ids, hard).await?;
        self.notifier.notify_changed();
        Ok(())
    }

    /// Starts a task, pausing the current runner first if one exists.
    ///
    /// # Errors
    ///
    /// See §4.G: *InvalidState*, *NotFound*, *Archived*.
    pub async fn start_task(&self, id: TaskId) -> CoreResult<TransitionOutcome> {
        let outcome = self.timing.start(id).await?;
        self.evaluate_switch(&outcome).await?;
        self.notifier.notify_changed();
        Ok(outcome)
    }

    /// Pauses the running task.
    ///
    /// # Errors
    ///
    /// See §4.G: *InvalidState*, *NotFound*.
    pub async fn pause_task(&self, id: TaskId) -> CoreResult<TransitionOutcome> {
        let outcome = self.timing.pause(id).await?;
        self.notifier.notify_changed();
        Ok(outcome)
    }

    /// Resumes a paused task, pausing the current runner first if one
    /// exists.
    ///
    /// # Errors
    ///
    /// See §4.G: *InvalidState*, *NotFound*.
    pub async fn resume_task(&self, id: TaskId) -> CoreResult<TransitionOutcome> {
        let outcome = self.timing.resume(id).await?;
        self.evaluate_switch(&outcome).await?;
        self.notifier.notify_changed();
        Ok(outcome)
    }

    /// Stops a task, finalizing its current session. Triggers the rest
    /// advisor's `subtask_end` evaluation when the task has a parent.
    ///
    /// # Errors
    ///
    /// See §4.G: *InvalidState*, *NotFound*.
    pub async fn stop_task(&self, id: TaskId) -> CoreResult<TransitionOutcome> {
        let outcome = self.timing.stop(id).await?;
        if outcome.task.parent_id().is_some() {
            self.advisor.evaluate(TriggerType::SubtaskEnd, outcome.task.id()).await?;
        }
        self.notifier.notify_changed();
        Ok(outcome)
    }

    /// Creates a child of `parent_id` and starts it, pausing the parent.
    ///
    /// # Errors
    ///
    /// See §4.G: *InvalidInput*, *InvalidState* (parent not running).
    pub async fn insert_subtask_and_start(&self, parent_id: TaskId, title: &str) -> CoreResult<TaskId> {
        let child = Task::new(title, Some(parent_id), self.clock.as_ref())?;
        let outcome = self.timing.insert_subtask_and_start(parent_id, child).await?;
        self.evaluate_switch(&outcome).await?;
        self.notifier.notify_changed();
        Ok(outcome.task.id())
    }

    /// Attaches `tag_name` to `task_id`, creating the tag if absent.
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// See §4.G: *InvalidInput*, *NotFound*.
    pub async fn add_tag_to_task(&self, task_id: TaskId, tag_name: &str) -> CoreResult<Tag> {
        let tag = self.lifecycle.add_tag(task_id, tag_name).await?;
        self.notifier.notify_changed();
        Ok(tag)
    }

    /// Detaches `tag_name` from `task_id`. Idempotent.
    ///
    /// # Errors
    ///
    /// See §4.G: *NotFound*.
    pub async fn remove_tag_from_task(&self, task_id: TaskId, tag_name: &str) -> CoreResult<()> {
        self.lifecycle.remove_tag(task_id, tag_name).await?;
        self.notifier.notify_changed();
        Ok(())
    }

    /// Accepts or ignores a rest suggestion.
    ///
    /// # Errors
    ///
    /// See §4.G: *NotFound*.
    pub async fn respond_rest_suggestion(&self, id: SuggestionId, accept: bool) -> CoreResult<RestSuggestion> {
        let suggestion = self.advisor.respond(id, accept).await?;
        self.notifier.notify_changed();
        Ok(suggestion)
    }

    /// Computes the overview snapshot over `range`: every non-archived
    /// task's durations, the active task, and the pending rest suggestion
    /// (§6). Read-only; emits no notification.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the task repository or event log fails.
    pub async fn get_overview(&self, range: Range) -> CoreResult<OverviewSnapshot> {
        let durations = self.aggregator.durations(range).await?;
        let active_task_id = self.aggregator.active_task().await?;
        let rest_suggestion = self.advisor.pending().await?;
        let generated_at = self.clock.utc();

        let mut tasks = Vec::new();
        for task in self.tasks.list_tasks().await?.into_iter().filter(|task| !task.is_archived()) {
            let tags = self
                .tasks
                .tags_for_task(task.id())
                .await?
                .into_iter()
                .map(|tag| tag.name().to_owned())
                .collect();
            let duration = durations.get(&task.id()).copied().unwrap_or(TaskDuration {
                exclusive_seconds: 0,
                inclusive_seconds: 0,
            });
            tasks.push(TaskOverview {
                id: task.id(),
                parent_id: task.parent_id(),
                title: task.title().to_owned(),
                status: task.status(),
                created_at: task.created_at(),
                tags,
                exclusive_seconds: duration.exclusive_seconds,
                inclusive_seconds: duration.inclusive_seconds,
            });
        }

        Ok(OverviewSnapshot {
            range,
            generated_at,
            active_task_id,
            rest_suggestion,
            tasks,
        })
    }

    /// Computes a single task's durations over `range` (§10.6), regardless of
    /// archival status.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such task exists, or a storage error if the
    /// task repository or event log fails.
    pub async fn get_task(&self, id: TaskId, range: Range) -> CoreResult<TaskOverview> {
        let task = self.tasks.get_task(id).await?;
        let durations = self.aggregator.durations(range).await?;
        let tags = self
            .tasks
            .tags_for_task(id)
            .await?
            .into_iter()
            .map(|tag| tag.name().to_owned())
            .collect();
        let duration = durations.get(&id).copied().unwrap_or(TaskDuration {
            exclusive_seconds: 0,
            inclusive_seconds: 0,
        });
        Ok(TaskOverview {
            id: task.id(),
            parent_id: task.parent_id(),
            title: task.title().to_owned(),
            status: task.status(),
            created_at: task.created_at(),
            tags,
            exclusive_seconds: duration.exclusive_seconds,
            inclusive_seconds: duration.inclusive_seconds,
        })
    }

    /// Lists every tag together with how many tasks currently carry it
    /// (§10.6).
    ///
    /// # Errors
    ///
    /// Returns a storage error if the task repository fails.
    pub async fn list_tags(&self) -> CoreResult<Vec<TagSummary>> {
        let tags = self.tasks.list_tags().await?;
        let counts = self.tasks.tag_usage_counts().await?;
        Ok(tags
            .into_iter()
            .map(|tag| {
                let usage_count = counts.get(&tag.id()).copied().unwrap_or(0);
                TagSummary {
                    id: tag.id(),
                    name: tag.name().to_owned(),
                    created_at: tag.created_at(),
                    usage_count,
                }
            })
            .collect())
    }

    /// Evaluates a `task_switch` rest suggestion for the companion task a
    /// start/resume paused, if any.
    async fn evaluate_switch(&self, outcome: &TransitionOutcome) -> CoreResult<()> {
        if let Some(companion) = &outcome.companion {
            self.advisor.evaluate(TriggerType::TaskSwitch, companion.id()).await?;
        }
        Ok(())
    }
}
