//! The rest suggestion rule engine (§4.F): computes focus/switch/deviation
//! inputs from the event log and applies rules R1-R6 in order.

use super::error::RestAdvisorError;
use crate::config::RestAdvisorThresholds;
use crate::rest_advisor::domain::{RestSuggestion, SuggestionId, SuggestionStatus, TriggerType};
use crate::rest_advisor::ports::RestSuggestionRepository;
use crate::task::domain::TaskId;
use crate::timing::domain::{EventKind, TimeEvent};
use crate::timing::ports::EventLogRepository;
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Evaluates rest suggestions at switch and subtask-end trigger points and
/// persists the resulting [`RestSuggestion`], superseding any prior pending
/// one.
pub struct RestAdvisor<EL, RS, C>
where
    EL: EventLogRepository,
    RS: RestSuggestionRepository,
    C: Clock + Send + Sync,
{
    events: Arc<EL>,
    suggestions: Arc<RS>,
    clock: Arc<C>,
    thresholds: RestAdvisorThresholds,
}

impl<EL, RS, C> RestAdvisor<EL, RS, C>
where
    EL: EventLogRepository,
    RS: RestSuggestionRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new rest advisor over the given repositories, clock, and
    /// rule thresholds.
    #[must_use]
    pub const fn new(events: Arc<EL>, suggestions: Arc<RS>, clock: Arc<C>, thresholds: RestAdvisorThresholds) -> Self {
        Self {
            events,
            suggestions,
            clock,
            thresholds,
        }
    }

    /// Evaluates a rest suggestion for `subject_task_id`, the task whose
    /// focus block just ended (either it was stopped, or it was paused to
    /// make way for another running task).
    ///
    /// Always inserts a new suggestion, even when `suggested_minutes` is 0;
    /// a zero-minute suggestion is itself a rule outcome (R6).
    ///
    /// # Errors
    ///
    /// Returns [`RestAdvisorError`] if the event log or suggestion store
    /// fails.
    #[instrument(skip(self), fields(task_id = %subject_task_id, ?trigger))]
    pub async fn evaluate(
        &self,
        trigger: TriggerType,
        subject_task_id: TaskId,
    ) -> Result<RestSuggestion, RestAdvisorError> {
        let now = self.clock.utc();
        let task_events = self.events.stream_for_task(subject_task_id).await?;
        let blocks = focus_blocks(&task_events, self.thresholds.focus_gap_merge_seconds);
        let focus_seconds = blocks.last().copied().unwrap_or(0);
        let deviation_ratio = deviation_ratio(focus_seconds, &blocks[..blocks.len().saturating_sub(1)]);

        let all_events = self.events.stream_all().await?;
        let since = now - chrono::Duration::seconds(self.thresholds.switch_window_seconds);
        let switch_count_30m = count_recent_switches(&all_events, since);

        let (suggested_minutes, reasons) =
            evaluate_rules(focus_seconds, switch_count_30m, deviation_ratio, &self.thresholds);

        if let Some(pending) = self.suggestions.pending().await? {
            let mut superseded = pending;
            superseded.status = SuggestionStatus::Ignored;
            self.suggestions.update(superseded).await?;
        }

        let suggestion = RestSuggestion {
            id: SuggestionId::new(),
            trigger_type: trigger,
            task_id: Some(subject_task_id),
            focus_seconds,
            switch_count_30m,
            deviation_ratio,
            suggested_minutes,
            reasons,
            status: SuggestionStatus::Pending,
            created_at: now,
        };
        let suggestion = self.suggestions.insert(suggestion).await?;
        debug!(suggested_minutes, "evaluated rest suggestion");
        Ok(suggestion)
    }

    /// Returns the current pending suggestion, if any.
    ///
    /// # Errors
    ///
    /// Returns [`RestAdvisorError::Repository`] if the suggestion store
    /// fails.
    pub async fn pending(&self) -> Result<Option<RestSuggestion>, RestAdvisorError> {
        Ok(self.suggestions.pending().await?)
    }

    /// Transitions suggestion `id` to `accepted` or `ignored`.
    ///
    /// # Errors
    ///
    /// Returns [`RestAdvisorError::Repository`] with
    /// [`crate::rest_advisor::ports::RestSuggestionRepositoryError::NotFound`]
    /// if `id` does not exist.
    pub async fn respond(&self, id: SuggestionId, accept: bool) -> Result<RestSuggestion, RestAdvisorError> {
        let mut suggestion = self.suggestions.get(id).await?;
        suggestion.status = if accept {
            SuggestionStatus::Accepted
        } else {
            SuggestionStatus::Ignored
        };
        Ok(self.suggestions.update(suggestion).await?)
    }
}

/// Segments a single task's own events into focus blocks: maximal runs of
/// `running` intervals separated only by pauses shorter than
/// `merge_threshold_seconds`. The last element, if any, is the block that
/// just closed.
fn focus_blocks(events: &[TimeEvent], merge_threshold_seconds: i64) -> Vec<i64> {
    let mut intervals: Vec<(i64, i64)> = Vec::new();
    let mut running_since: Option<i64> = None;
    for event in events {
        match event.kind {
            EventKind::Start | EventKind::Resume => running_since = Some(event.at.timestamp()),
            EventKind::Pause | EventKind::Stop => {
                if let Some(start) = running_since.take() {
                    intervals.push((start, event.at.timestamp()));
                }
            }
            EventKind::Reparent | EventKind::TagAdd | EventKind::TagRemove => {}
        }
    }

    let mut blocks = Vec::new();
    let mut current: Option<(i64, i64)> = None;
    for (start, end) in intervals {
        current = match current {
            Some((block_start, block_end)) if start - block_end < merge_threshold_seconds => {
                Some((block_start, end))
            }
            Some((block_start, block_end)) => {
                blocks.push(block_end - block_start);
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((block_start, block_end)) = current {
        blocks.push(block_end - block_start);
    }
    blocks
}

/// The relative deviation of `focus_seconds` from the median of
/// `prior_blocks`. `0.0` when there is no prior history.
fn deviation_ratio(focus_seconds: i64, prior_blocks: &[i64]) -> f64 {
    let Some(expected) = median(prior_blocks) else {
        return 0.0;
    };
    if expected <= 0.0 {
        return 0.0;
    }
    #[expect(clippy::float_arithmetic, reason = "deviation ratio is inherently a ratio of durations")]
    {
        (f64::from(i32::try_from(focus_seconds).unwrap_or(i32::MAX)) - expected).abs() / expected
    }
}

fn median(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;
    #[expect(clippy::float_arithmetic, reason = "median of integer seconds is a ratio by construction")]
    let value = if sorted.len() % 2 == 0 {
        let low = i32::try_from(sorted[mid - 1]).unwrap_or(i32::MAX);
        let high = i32::try_from(sorted[mid]).unwrap_or(i32::MAX);
        f64::from(low + high) / 2.0
    } else {
        f64::from(i32::try_from(sorted[mid]).unwrap_or(i32::MAX))
    };
    Some(value)
}

/// Counts `start`/`resume` events targeting a task id different from the
/// immediately prior running task, within `[since, +inf)`.
fn count_recent_switches(events: &[TimeEvent], since: DateTime<Utc>) -> i64 {
    let mut current_running: Option<TaskId> = None;
    let mut count = 0i64;
    for event in events {
        match event.kind {
            EventKind::Start | EventKind::Resume => {
                if current_running != Some(event.task_id) {
                    if event.at >= since {
                        count += 1;
                    }
                    current_running = Some(event.task_id);
                }
            }
            EventKind::Pause | EventKind::Stop => {
                if current_running == Some(event.task_id) {
                    current_running = None;
                }
            }
            EventKind::Reparent | EventKind::TagAdd | EventKind::TagRemove => {}
        }
    }
    count
}

/// Applies rules R1-R6 in order, returning the discrete suggested minutes
/// (the maximum over every fired rule's contribution) and the ordered list
/// of rule identifiers that fired.
fn evaluate_rules(
    focus_seconds: i64,
    switch_count_30m: i64,
    deviation_ratio: f64,
    thresholds: &RestAdvisorThresholds,
) -> (i64, Vec<String>) {
    let mut suggested = 0i64;
    let mut reasons = Vec::new();

    if focus_seconds >= thresholds.long_focus_seconds {
        suggested = suggested.max(15);
        reasons.push("R1".to_owned());
    }
    if focus_seconds >= thresholds.medium_focus_seconds && focus_seconds < thresholds.long_focus_seconds {
        suggested = suggested.max(8);
        reasons.push("R2".to_owned());
    }
    if focus_seconds >= thresholds.short_focus_seconds && focus_seconds < thresholds.medium_focus_seconds {
        suggested = suggested.max(3);
        reasons.push("R3".to_owned());
    }
    if switch_count_30m >= thresholds.fragmented_switch_count {
        suggested = suggested.max(8);
        reasons.push("R4".to_owned());
    }
    if deviation_ratio >= thresholds.overrun_deviation_ratio && focus_seconds >= thresholds.overrun_minimum_focus_seconds
    {
        suggested = suggested.max(3);
        reasons.push("R5".to_owned());
    }
    if focus_seconds < thresholds.quick_task_focus_seconds && switch_count_30m < thresholds.quick_task_switch_count {
        suggested = suggested.max(0);
        reasons.push("R6".to_owned());
    }

    (suggested, reasons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest_advisor::adapters::InMemoryRestSuggestionRepository;
    use crate::timing::adapters::InMemoryEventLogRepository;
    use crate::timing::domain::NewTimeEvent;
    use chrono::TimeZone;
    use mockable::DefaultClock;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    #[test]
    fn long_focus_suggests_fifteen_minutes() {
        let thresholds = RestAdvisorThresholds::default();
        let (minutes, reasons) = evaluate_rules(5400, 0, 0.0, &thresholds);
        assert_eq!(minutes, 15);
        assert_eq!(reasons, vec!["R1".to_owned()]);
    }

    #[test]
    fn fragmented_and_short_focus_combine_to_scenario_s5() {
        let thresholds = RestAdvisorThresholds::default();
        let (minutes, reasons) = evaluate_rules(1800, 5, 0.0, &thresholds);
        assert_eq!(minutes, 8);
        assert_eq!(reasons, vec!["R3".to_owned(), "R4".to_owned()]);
    }

    #[test]
    fn quick_task_suggests_no_rest() {
        let thresholds = RestAdvisorThresholds::default();
        let (minutes, reasons) = evaluate_rules(300, 1, 0.0, &thresholds);
        assert_eq!(minutes, 0);
        assert_eq!(reasons, vec!["R6".to_owned()]);
    }

    #[test]
    fn no_rule_fires_in_the_dead_zone() {
        let thresholds = RestAdvisorThresholds::default();
        let (minutes, reasons) = evaluate_rules(700, 3, 0.0, &thresholds);
        assert_eq!(minutes, 0);
        assert!(reasons.is_empty());
    }

    #[test]
    fn focus_blocks_merge_short_pauses_and_split_long_ones() {
        let task_id = TaskId::new();
        let kinds = [
            (EventKind::Start, 0),
            (EventKind::Pause, 600),
            (EventKind::Resume, 650),
            (EventKind::Pause, 900),
            (EventKind::Resume, 1200),
            (EventKind::Stop, 1300),
        ];
        let events: Vec<TimeEvent> = kinds
            .into_iter()
            .enumerate()
            .map(|(sequence, (kind, seconds))| TimeEvent {
                sequence: i64::try_from(sequence).unwrap_or_default(),
                task_id,
                kind,
                at: at(seconds),
                payload: None,
            })
            .collect();
        let blocks = focus_blocks(&events, 120);
        assert_eq!(blocks, vec![900, 100]);
    }

    #[tokio::test]
    async fn evaluate_supersedes_prior_pending_suggestion() {
        let events = Arc::new(InMemoryEventLogRepository::new());
        let suggestions = Arc::new(InMemoryRestSuggestionRepository::new());
        let task_id = TaskId::new();
        events
            .append(vec![
                NewTimeEvent::bare(task_id, EventKind::Start, at(0)),
                NewTimeEvent::bare(task_id, EventKind::Pause, at(2000)),
            ])
            .await
            .expect("seed events");

        let advisor = RestAdvisor::new(
            events,
            suggestions.clone(),
            Arc::new(FixedClock(at(2000))),
            RestAdvisorThresholds::default(),
        );
        let first = advisor
            .evaluate(TriggerType::TaskSwitch, task_id)
            .await
            .expect("first evaluation");
        let second = advisor
            .evaluate(TriggerType::TaskSwitch, task_id)
            .await
            .expect("second evaluation");

        let first_reloaded = suggestions.get(first.id).await.expect("reload first");
        assert_eq!(first_reloaded.status, SuggestionStatus::Ignored);
        assert_eq!(second.status, SuggestionStatus::Pending);
        assert!(suggestions.pending().await.expect("pending").is_some());
    }

    #[tokio::test]
    async fn respond_transitions_status() {
        let events = Arc::new(InMemoryEventLogRepository::new());
        let suggestions = Arc::new(InMemoryRestSuggestionRepository::new());
        let task_id = TaskId::new();
        events
            .append(vec![NewTimeEvent::bare(task_id, EventKind::Start, at(0))])
            .await
            .expect("seed");
        let advisor = RestAdvisor::new(
            events,
            suggestions,
            Arc::new(DefaultClock),
            RestAdvisorThresholds::default(),
        );
        let suggestion = advisor
            .evaluate(TriggerType::TaskSwitch, task_id)
            .await
            .expect("evaluate");
        let accepted = advisor.respond(suggestion.id, true).await.expect("respond");
        assert_eq!(accepted.status, SuggestionStatus::Accepted);
    }
}
