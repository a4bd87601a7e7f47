//! Behavioural integration tests for [`CommandSurface`].
//!
//! These tests exercise the command surface over the in-memory adapters in
//! realistic higher-level flows: creating and timing a task tree, switching
//! between tasks, and reading back the overview.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use chrono::{DateTime, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use timefiles::command::CommandSurface;
use timefiles::config::RestAdvisorThresholds;
use timefiles::replay::domain::Range;
use timefiles::rest_advisor::adapters::InMemoryRestSuggestionRepository;
use timefiles::rest_advisor::domain::SuggestionStatus;
use timefiles::task::adapters::memory::InMemoryTaskRepository;
use timefiles::timing::adapters::{InMemoryEventLogRepository, SequentialTimingTransaction};

/// A clock callers can advance between commands, for deterministic multi-step
/// scenarios.
#[derive(Clone)]
struct SteppedClock(Arc<Mutex<DateTime<Utc>>>);

impl SteppedClock {
    fn at(seconds: i64) -> Self {
        Self(Arc::new(Mutex::new(Utc.timestamp_opt(seconds, 0).single().expect("valid timestamp"))))
    }

    fn advance_to(&self, seconds: i64) {
        let mut guard = self.0.lock().expect("clock lock");
        *guard = Utc.timestamp_opt(seconds, 0).single().expect("valid timestamp");
    }
}

impl Clock for SteppedClock {
    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock lock")
    }
}

type Transaction = SequentialTimingTransaction<InMemoryTaskRepository, InMemoryEventLogRepository>;

type Surface = CommandSurface<
    InMemoryTaskRepository,
    InMemoryEventLogRepository,
    Transaction,
    InMemoryRestSuggestionRepository,
    SteppedClock,
>;

/// Builds a fresh command surface sharing the given clock.
fn build(clock: &SteppedClock) -> Surface {
    let tasks = Arc::new(InMemoryTaskRepository::new());
    let events = Arc::new(InMemoryEventLogRepository::new());
    let transaction = Arc::new(SequentialTimingTransaction::new(tasks.clone(), events.clone()));
    CommandSurface::new(
        tasks,
        events,
        transaction,
        Arc::new(InMemoryRestSuggestionRepository::new()),
        Arc::new(clock.clone()),
        RestAdvisorThresholds::default(),
    )
}

/// Provides a command surface with a clock fixed at the epoch, for tests
/// that don't care about elapsed time.
#[fixture]
fn surface() -> Surface {
    build(&SteppedClock::at(0))
}

#[tokio::test]
async fn starting_a_second_task_pauses_the_first() {
    let clock = SteppedClock::at(0);
    let surface = build(&clock);

    let a = surface.create_task("Write report", None).await.expect("create a");
    let b = surface.create_task("Answer email", None).await.expect("create b");

    clock.advance_to(100);
    surface.start_task(a).await.expect("start a");

    clock.advance_to(160);
    let outcome = surface.start_task(b).await.expect("start b");
    assert_eq!(outcome.companion.expect("a paused").id(), a);

    clock.advance_to(200);
    let overview = surface.get_overview(Range::All).await.expect("overview");
    assert_eq!(overview.active_task_id, Some(b));
    let durations: HashMap<_, _> = overview.tasks.iter().map(|task| (task.id, task.exclusive_seconds)).collect();
    assert_eq!(durations.get(&a).copied().expect("a has a duration"), 60);
    assert_eq!(durations.get(&b).copied().expect("b has a duration"), 40);
}

#[tokio::test]
async fn inserting_a_subtask_pauses_the_parent_and_auto_resumes_on_stop() {
    let clock = SteppedClock::at(0);
    let surface = build(&clock);

    let parent = surface.create_task("Parent", None).await.expect("create parent");
    surface.start_task(parent).await.expect("start parent");

    clock.advance_to(300);
    let child = surface
        .insert_subtask_and_start(parent, "Quick interrupt")
        .await
        .expect("insert subtask");

    clock.advance_to(420);
    let stop_outcome = surface.stop_task(child).await.expect("stop child");
    let resumed_parent = stop_outcome.companion.expect("parent auto-resumed");
    assert_eq!(resumed_parent.id(), parent);

    clock.advance_to(500);
    let overview = surface.get_overview(Range::All).await.expect("overview");
    let durations: HashMap<_, _> = overview.tasks.iter().map(|task| (task.id, task.inclusive_seconds)).collect();
    assert_eq!(durations.get(&parent).copied().expect("parent has a duration"), 500);
}

#[tokio::test]
async fn archiving_a_task_stops_it_and_excludes_it_from_the_overview() {
    let clock = SteppedClock::at(0);
    let surface = build(&clock);

    let task = surface.create_task("Draft", None).await.expect("create");
    surface.start_task(task).await.expect("start");

    clock.advance_to(50);
    surface.archive_task(task).await.expect("archive");

    let overview = surface.get_overview(Range::All).await.expect("overview");
    assert!(overview.tasks.iter().all(|overview_task| overview_task.id != task));
}

#[tokio::test]
async fn hard_delete_purges_events_for_the_deleted_task_only() {
    let clock = SteppedClock::at(0);
    let surface = build(&clock);

    let kept = surface.create_task("Kept", None).await.expect("create kept");
    let removed = surface.create_task("Removed", None).await.expect("create removed");
    surface.start_task(kept).await.expect("start kept");
    clock.advance_to(10);
    surface.stop_task(kept).await.expect("stop kept");

    surface.archive_task(removed).await.expect("archive removed");
    surface.delete_tasks(&[removed], true).await.expect("hard delete removed");

    let overview = surface.get_overview(Range::All).await.expect("overview");
    let durations: HashMap<_, _> = overview.tasks.iter().map(|task| (task.id, task.exclusive_seconds)).collect();
    assert_eq!(durations.get(&kept).copied().expect("kept has a duration"), 10);
    assert!(!durations.contains_key(&removed));
}

#[rstest]
#[tokio::test]
async fn tagging_a_task_is_idempotent_and_reflected_in_the_overview(surface: Surface) {
    let task = surface.create_task("Draft", None).await.expect("create");
    surface.add_tag_to_task(task, "deep-work").await.expect("first add");
    surface.add_tag_to_task(task, "deep-work").await.expect("second add");

    let overview = surface.get_overview(Range::All).await.expect("overview");
    let overview_task = overview.tasks.iter().find(|t| t.id == task).expect("task present");
    assert_eq!(overview_task.tags, vec!["deep-work".to_owned()]);

    surface.remove_tag_from_task(task, "deep-work").await.expect("remove");
    let overview = surface.get_overview(Range::All).await.expect("overview");
    let overview_task = overview.tasks.iter().find(|t| t.id == task).expect("task present");
    assert!(overview_task.tags.is_empty());
}

#[tokio::test]
async fn a_long_focus_block_produces_a_pending_rest_suggestion() {
    let clock = SteppedClock::at(0);
    let surface = build(&clock);

    let a = surface.create_task("Deep work", None).await.expect("create a");
    let b = surface.create_task("Other work", None).await.expect("create b");
    surface.start_task(a).await.expect("start a");

    clock.advance_to(5400);
    surface.start_task(b).await.expect("switch to b");

    let overview = surface.get_overview(Range::All).await.expect("overview");
    let suggestion = overview.rest_suggestion.expect("a suggestion was raised");
    assert_eq!(suggestion.suggested_minutes, 15);
    assert_eq!(suggestion.reasons, vec!["R1".to_owned()]);

    let responded = surface
        .respond_rest_suggestion(suggestion.id, true)
        .await
        .expect("respond");
    assert_eq!(responded.status, SuggestionStatus::Accepted);
}

#[rstest]
#[tokio::test]
async fn list_tags_reports_usage_counts(surface: Surface) {
    let a = surface.create_task("Draft", None).await.expect("create a");
    let b = surface.create_task("Review", None).await.expect("create b");
    surface.add_tag_to_task(a, "deep-work").await.expect("tag a");
    surface.add_tag_to_task(b, "deep-work").await.expect("tag b");
    surface.add_tag_to_task(a, "writing").await.expect("tag a again");

    let tags = surface.list_tags().await.expect("list tags");
    let by_name: HashMap<_, _> = tags.iter().map(|tag| (tag.name.clone(), tag.usage_count)).collect();
    assert_eq!(by_name.get("deep-work").copied(), Some(2));
    assert_eq!(by_name.get("writing").copied(), Some(1));
}

#[tokio::test]
async fn get_task_matches_the_overview_entry_and_survives_archival() {
    let clock = SteppedClock::at(0);
    let surface = build(&clock);

    let task = surface.create_task("Draft", None).await.expect("create");
    surface.start_task(task).await.expect("start");
    clock.advance_to(90);
    surface.stop_task(task).await.expect("stop");

    let fetched = surface.get_task(task, Range::All).await.expect("get task");
    assert_eq!(fetched.exclusive_seconds, 90);
    assert_eq!(fetched.inclusive_seconds, 90);

    surface.archive_task(task).await.expect("archive");
    let after_archive = surface.get_task(task, Range::All).await.expect("get archived task");
    assert_eq!(after_archive.exclusive_seconds, 90);
}

#[rstest]
#[tokio::test]
async fn data_changed_notifications_fire_on_mutation(surface: Surface) {
    let mut receiver = surface.subscribe_changes();
    surface.create_task("Draft", None).await.expect("create");
    receiver.recv().await.expect("notification delivered");
}

#[rstest]
#[tokio::test]
async fn ping_reports_liveness(surface: Surface) {
    assert_eq!(surface.ping(), "pong");
}
