//! Diesel row models for rest suggestion persistence.

use crate::rest_advisor::domain::{RestSuggestion, SuggestionId, SuggestionStatus, TriggerType};
use crate::storage::schema::rest_suggestions;
use crate::task::domain::TaskId;
use chrono::DateTime;
use diesel::prelude::*;

/// Query result row for rest suggestion records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = rest_suggestions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RestSuggestionRow {
    /// Internal suggestion identifier, stored as its canonical UUID string.
    pub id: String,
    /// Trigger that produced the suggestion, stored as its canonical string.
    pub trigger_type: String,
    /// Anchor task identifier, if any.
    pub task_id: Option<String>,
    /// Continuous focus duration at trigger time, seconds.
    pub focus_seconds: i64,
    /// Distinct task switches within the trailing 1800 seconds.
    pub switch_count_30m: i64,
    /// Relative deviation from the task's historical median focus block.
    pub deviation_ratio: f64,
    /// Suggested rest duration in minutes.
    pub suggested_minutes: i64,
    /// JSON-encoded array of rule identifiers that fired.
    pub reasons: String,
    /// Suggestion status, stored as its canonical string.
    pub status: String,
    /// Creation timestamp, unix seconds.
    pub created_at: i64,
}

/// Insert or update model for rest suggestion records.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = rest_suggestions)]
pub struct RestSuggestionRecord {
    /// Internal suggestion identifier, stored as its canonical UUID string.
    pub id: String,
    /// Trigger that produced the suggestion, stored as its canonical string.
    pub trigger_type: String,
    /// Anchor task identifier, if any.
    pub task_id: Option<String>,
    /// Continuous focus duration at trigger time, seconds.
    pub focus_seconds: i64,
    /// Distinct task switches within the trailing 1800 seconds.
    pub switch_count_30m: i64,
    /// Relative deviation from the task's historical median focus block.
    pub deviation_ratio: f64,
    /// Suggested rest duration in minutes.
    pub suggested_minutes: i64,
    /// JSON-encoded array of rule identifiers that fired.
    pub reasons: String,
    /// Suggestion status, stored as its canonical string.
    pub status: String,
    /// Creation timestamp, unix seconds.
    pub created_at: i64,
}

impl RestSuggestionRecord {
    /// Flattens a domain [`RestSuggestion`] into its persisted row shape.
    ///
    /// # Panics
    ///
    /// Never: `reasons` is a `Vec<String>` and always serializes.
    #[must_use]
    pub fn from_domain(suggestion: &RestSuggestion) -> Self {
        Self {
            id: suggestion.id.to_string(),
            trigger_type: suggestion.trigger_type.as_str().to_owned(),
            task_id: suggestion.task_id.map(|id| id.to_string()),
            focus_seconds: suggestion.focus_seconds,
            switch_count_30m: suggestion.switch_count_30m,
            deviation_ratio: suggestion.deviation_ratio,
            suggested_minutes: suggestion.suggested_minutes,
            reasons: serde_json::to_string(&suggestion.reasons).unwrap_or_else(|_| "[]".to_owned()),
            status: suggestion.status.as_str().to_owned(),
            created_at: suggestion.created_at.timestamp(),
        }
    }
}

/// Converts a persisted row back into a domain [`RestSuggestion`].
///
/// # Errors
///
/// Returns an error message when the row contains a malformed identifier,
/// enum, timestamp, or JSON payload.
pub fn row_to_suggestion(row: RestSuggestionRow) -> Result<RestSuggestion, String> {
    let id = SuggestionId::parse(&row.id).map_err(|err| format!("malformed suggestion id: {err}"))?;
    let trigger_type =
        TriggerType::try_from(row.trigger_type.as_str()).map_err(|err| format!("malformed trigger type: {err}"))?;
    let task_id = row
        .task_id
        .map(|value| TaskId::parse(&value).map_err(|err| format!("malformed task id: {err}")))
        .transpose()?;
    let status = SuggestionStatus::try_from(row.status.as_str())
        .map_err(|err| format!("malformed suggestion status: {err}"))?;
    let created_at = DateTime::from_timestamp(row.created_at, 0)
        .ok_or_else(|| format!("timestamp {} out of range", row.created_at))?;
    let reasons: Vec<String> =
        serde_json::from_str(&row.reasons).map_err(|err| format!("malformed reasons payload: {err}"))?;
    Ok(RestSuggestion {
        id,
        trigger_type,
        task_id,
        focus_seconds: row.focus_seconds,
        switch_count_30m: row.switch_count_30m,
        deviation_ratio: row.deviation_ratio,
        suggested_minutes: row.suggested_minutes,
        reasons,
        status,
        created_at,
    })
}
