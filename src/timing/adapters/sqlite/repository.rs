//! SQLite-backed [`EventLogRepository`] implementation.

use super::models::{NewTimeEventRow, TimeEventRow, row_to_event};
use crate::storage::SqlitePool;
use crate::storage::schema::time_events;
use crate::task::domain::TaskId;
use crate::timing::domain::{NewTimeEvent, TimeEvent};
use crate::timing::ports::{EventLogRepository, EventLogRepositoryError};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

type EventLogResult<T> = Result<T, EventLogRepositoryError>;

/// SQLite-backed event log, appending through the writer pool and reading
/// from the reader pool.
#[derive(Debug, Clone)]
pub struct SqliteEventLogRepository {
    writer: SqlitePool,
    reader: SqlitePool,
}

impl SqliteEventLogRepository {
    /// Creates a repository from the storage layer's writer and reader pools.
    #[must_use]
    pub const fn new(writer: SqlitePool, reader: SqlitePool) -> Self {
        Self { writer, reader }
    }

    async fn run_write<F, T>(&self, f: F) -> EventLogResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> EventLogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.writer.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(EventLogRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(EventLogRepositoryError::persistence)?
    }

    async fn run_read<F, T>(&self, f: F) -> EventLogResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> EventLogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.reader.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(EventLogRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(EventLogRepositoryError::persistence)?
    }
}

fn decode_rows(rows: Vec<TimeEventRow>) -> EventLogResult<Vec<TimeEvent>> {
    rows.into_iter()
        .map(|row| row_to_event(row).map_err(|err| EventLogRepositoryError::persistence(std::io::Error::other(err))))
        .collect()
}

#[async_trait]
impl EventLogRepository for SqliteEventLogRepository {
    async fn append(&self, events: Vec<NewTimeEvent>) -> EventLogResult<Vec<TimeEvent>> {
        self.run_write(move |connection| {
            connection
                .transaction(|connection| {
                    let mut persisted = Vec::with_capacity(events.len());
                    for new_event in &events {
                        let row = NewTimeEventRow::from_domain(new_event);
                        diesel::insert_into(time_events::table)
                            .values(&row)
                            .execute(connection)?;
                        let inserted = time_events::table
                            .order(time_events::sequence.desc())
                            .select(TimeEventRow::as_select())
                            .first::<TimeEventRow>(connection)?;
                        persisted.push(inserted);
                    }
                    diesel::result::QueryResult::Ok(persisted)
                })
                .map_err(EventLogRepositoryError::persistence)
                .and_then(decode_rows)
        })
        .await
    }

    async fn stream_all(&self) -> EventLogResult<Vec<TimeEvent>> {
        self.run_read(|connection| {
            let rows = time_events::table
                .order(time_events::sequence.asc())
                .select(TimeEventRow::as_select())
                .load(connection)
                .map_err(EventLogRepositoryError::persistence)?;
            decode_rows(rows)
        })
        .await
    }

    async fn stream_for_task(&self, task_id: TaskId) -> EventLogResult<Vec<TimeEvent>> {
        self.run_read(move |connection| {
            let rows = time_events::table
                .filter(time_events::task_id.eq(task_id.to_string()))
                .order(time_events::sequence.asc())
                .select(TimeEventRow::as_select())
                .load(connection)
                .map_err(EventLogRepositoryError::persistence)?;
            decode_rows(rows)
        })
        .await
    }

    async fn latest_for_task(&self, task_id: TaskId) -> EventLogResult<Option<TimeEvent>> {
        self.run_read(move |connection| {
            let row = time_events::table
                .filter(time_events::task_id.eq(task_id.to_string()))
                .order(time_events::sequence.desc())
                .select(TimeEventRow::as_select())
                .first::<TimeEventRow>(connection)
                .optional()
                .map_err(EventLogRepositoryError::persistence)?;
            row.map(row_to_event)
                .transpose()
                .map_err(|err| EventLogRepositoryError::persistence(std::io::Error::other(err)))
        })
        .await
    }

    async fn delete_for_tasks(&self, task_ids: &[TaskId]) -> EventLogResult<()> {
        let id_strings: Vec<String> = task_ids.iter().map(ToString::to_string).collect();
        self.run_write(move |connection| {
            diesel::delete(time_events::table.filter(time_events::task_id.eq_any(&id_strings)))
                .execute(connection)
                .map_err(EventLogRepositoryError::persistence)?;
            Ok(())
        })
        .await
    }
}
