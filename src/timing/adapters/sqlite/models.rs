//! Diesel row models for timing event persistence.

use crate::storage::schema::time_events;
use crate::task::domain::TaskId;
use crate::timing::domain::{EventKind, NewTimeEvent, TimeEvent};
use chrono::DateTime;
use diesel::prelude::*;

/// Query result row for timing event records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = time_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TimeEventRow {
    /// Sequence number assigned by the store.
    pub sequence: i64,
    /// Associated task identifier.
    pub task_id: String,
    /// Event kind, stored as its canonical string.
    pub kind: String,
    /// Event timestamp, unix seconds.
    pub at: i64,
    /// Optional JSON payload.
    pub payload: Option<String>,
}

/// Insert model for timing event records; `sequence` is store-assigned.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = time_events)]
pub struct NewTimeEventRow {
    /// Associated task identifier.
    pub task_id: String,
    /// Event kind, stored as its canonical string.
    pub kind: String,
    /// Event timestamp, unix seconds.
    pub at: i64,
    /// Optional JSON payload.
    pub payload: Option<String>,
}

impl NewTimeEventRow {
    /// Flattens a domain [`NewTimeEvent`] into its persisted row shape.
    pub fn from_domain(event: &NewTimeEvent) -> Self {
        Self {
            task_id: event.task_id.to_string(),
            kind: event.kind.as_str().to_owned(),
            at: event.at.timestamp(),
            payload: event.payload.clone(),
        }
    }
}

/// Converts a persisted row back into a domain [`TimeEvent`].
///
/// # Errors
///
/// Returns an error message when the row contains a malformed identifier,
/// kind, or timestamp.
pub fn row_to_event(row: TimeEventRow) -> Result<TimeEvent, String> {
    let task_id = TaskId::parse(&row.task_id).map_err(|err| format!("malformed task id: {err}"))?;
    let kind = EventKind::try_from(row.kind.as_str()).map_err(|err| format!("malformed event kind: {err}"))?;
    let at = DateTime::from_timestamp(row.at, 0)
        .ok_or_else(|| format!("timestamp {} out of range", row.at))?;
    Ok(TimeEvent {
        sequence: row.sequence,
        task_id,
        kind,
        at,
        payload: row.payload,
    })
}
