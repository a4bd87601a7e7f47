//! Replay-based duration aggregation.

mod aggregator;

pub use aggregator::{ReplayAggregator, ReplayError, TaskDuration};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::domain::Range;
    use crate::task::adapters::memory::InMemoryTaskRepository;
    use crate::task::domain::Task;
    use crate::task::ports::TaskRepository;
    use crate::timing::adapters::{InMemoryEventLogRepository, SequentialTimingTransaction};
    use crate::timing::services::TimingStateMachine;
    use chrono::{DateTime, TimeZone, Utc};
    use mockable::{Clock, DefaultClock};
    use std::sync::Arc;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    #[tokio::test]
    async fn single_active_context_scenario_s1() {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let events = Arc::new(InMemoryEventLogRepository::new());
        let clock = DefaultClock;

        let a = Task::new("A", None, &clock).expect("valid title");
        let b = Task::new("B", None, &clock).expect("valid title");
        let a_id = a.id();
        let b_id = b.id();
        tasks.insert_task(a).await.expect("insert a");
        tasks.insert_task(b).await.expect("insert b");
        let transaction = Arc::new(SequentialTimingTransaction::new(tasks.clone(), events.clone()));

        let timing_at_100 = TimingStateMachine::new(tasks.clone(), transaction.clone(), Arc::new(FixedClock(at(100))));
        timing_at_100.start(a_id).await.expect("start a at 100");

        let timing_at_160 = TimingStateMachine::new(tasks.clone(), transaction, Arc::new(FixedClock(at(160))));
        timing_at_160.start(b_id).await.expect("start b at 160");

        let aggregator = ReplayAggregator::new(tasks, events, Arc::new(FixedClock(at(200))));
        let durations = aggregator.durations(Range::All).await.expect("durations");

        assert_eq!(durations[&a_id].exclusive_seconds, 60);
        assert_eq!(durations[&b_id].exclusive_seconds, 40);
    }

    #[tokio::test]
    async fn subtask_auto_resume_scenario_s2() {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let events = Arc::new(InMemoryEventLogRepository::new());
        let clock = DefaultClock;

        let parent = Task::new("P", None, &clock).expect("valid title");
        let parent_id = parent.id();
        tasks.insert_task(parent).await.expect("insert parent");
        let transaction = Arc::new(SequentialTimingTransaction::new(tasks.clone(), events.clone()));

        let timing_at_0 = TimingStateMachine::new(tasks.clone(), transaction.clone(), Arc::new(FixedClock(at(0))));
        timing_at_0.start(parent_id).await.expect("start parent at 0");

        let child = Task::new("child", Some(parent_id), &clock).expect("valid title");
        let timing_at_300 =
            TimingStateMachine::new(tasks.clone(), transaction.clone(), Arc::new(FixedClock(at(300))));
        let outcome = timing_at_300
            .insert_subtask_and_start(parent_id, child)
            .await
            .expect("insert subtask at 300");
        let child_id = outcome.task.id();

        let timing_at_420 = TimingStateMachine::new(tasks.clone(), transaction, Arc::new(FixedClock(at(420))));
        timing_at_420.stop(child_id).await.expect("stop child at 420");

        let aggregator = ReplayAggregator::new(tasks, events, Arc::new(FixedClock(at(500))));
        let durations = aggregator.durations(Range::All).await.expect("durations");

        assert_eq!(durations[&parent_id].exclusive_seconds, 380);
        assert_eq!(durations[&child_id].exclusive_seconds, 120);
        assert_eq!(durations[&parent_id].inclusive_seconds, 500);
    }

    #[tokio::test]
    async fn replay_is_deterministic_scenario_s3() {
        let tasks = Arc::new(InMemoryTaskRepository::new());
        let events = Arc::new(InMemoryEventLogRepository::new());
        let clock = DefaultClock;

        let parent = Task::new("P", None, &clock).expect("valid title");
        let parent_id = parent.id();
        tasks.insert_task(parent).await.expect("insert parent");
        let transaction = Arc::new(SequentialTimingTransaction::new(tasks.clone(), events.clone()));
        let timing_at_0 = TimingStateMachine::new(tasks.clone(), transaction, Arc::new(FixedClock(at(0))));
        timing_at_0.start(parent_id).await.expect("start parent");

        let aggregator = ReplayAggregator::new(tasks, events, Arc::new(FixedClock(at(500))));
        let first = aggregator.durations(Range::All).await.expect("first replay");
        let second = aggregator.durations(Range::All).await.expect("second replay");
        assert_eq!(first, second);
    }
}
