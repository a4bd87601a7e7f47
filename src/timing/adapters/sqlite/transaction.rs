//! The SQLite [`TimingTransaction`]: every op of one timing intent commits
//! on a single writer-pool connection inside one transaction (spec.md:49,
//! spec.md:141 — a crash between an event append and its mirror update is
//! impossible).

use super::models::{NewTimeEventRow, TimeEventRow, row_to_event};
use crate::storage::SqlitePool;
use crate::storage::schema::{tasks, time_events};
use crate::task::adapters::sqlite::models::TaskRecord;
use crate::task::domain::Task;
use crate::timing::domain::NewTimeEvent;
use crate::timing::ports::{TimingTransaction, TimingTransactionError, TimingWriteOp, TimingWriteResult};
use async_trait::async_trait;
use diesel::prelude::*;

/// Raw output of one [`SqliteTimingTransaction::commit`] call, decoded into
/// domain types after the transaction has committed.
struct RawCommit {
    event_rows: Vec<TimeEventRow>,
    tasks: Vec<Task>,
}

/// Commits a timing intent's event appends and task-mirror writes on the
/// writer pool, inside a single transaction.
#[derive(Debug, Clone)]
pub struct SqliteTimingTransaction {
    writer: SqlitePool,
}

impl SqliteTimingTransaction {
    /// Creates a transaction committer over the storage layer's writer pool.
    #[must_use]
    pub const fn new(writer: SqlitePool) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl TimingTransaction for SqliteTimingTransaction {
    async fn commit(&self, ops: Vec<TimingWriteOp>) -> Result<TimingWriteResult, TimingTransactionError> {
        let pool = self.writer.clone();
        let raw = tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TimingTransactionError::persistence)?;
            connection
                .transaction(|connection| {
                    let mut raw = RawCommit {
                        event_rows: Vec::new(),
                        tasks: Vec::new(),
                    };
                    for op in ops {
                        match op {
                            TimingWriteOp::AppendEvent { task_id, kind, at } => {
                                let new_event = NewTimeEvent::bare(task_id, kind, at);
                                let row = NewTimeEventRow::from_domain(&new_event);
                                diesel::insert_into(time_events::table)
                                    .values(&row)
                                    .execute(connection)?;
                                let inserted = time_events::table
                                    .order(time_events::sequence.desc())
                                    .select(TimeEventRow::as_select())
                                    .first::<TimeEventRow>(connection)?;
                                raw.event_rows.push(inserted);
                            }
                            TimingWriteOp::SetStatus { mut task, status } => {
                                task.set_status(status);
                                let record = TaskRecord::from_domain(&task);
                                let updated =
                                    diesel::update(tasks::table.filter(tasks::id.eq(task.id().to_string())))
                                        .set(&record)
                                        .execute(connection)?;
                                if updated == 0 {
                                    return Err(diesel::result::Error::NotFound);
                                }
                                raw.tasks.push(task);
                            }
                            TimingWriteOp::InsertTask(task) => {
                                let record = TaskRecord::from_domain(&task);
                                diesel::insert_into(tasks::table).values(&record).execute(connection)?;
                                raw.tasks.push(task);
                            }
                        }
                    }
                    diesel::result::QueryResult::Ok(raw)
                })
                .map_err(TimingTransactionError::persistence)
        })
        .await
        .map_err(TimingTransactionError::persistence)??;

        let events = raw
            .event_rows
            .into_iter()
            .map(|row| row_to_event(row).map_err(|err| TimingTransactionError::persistence(std::io::Error::other(err))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TimingWriteResult {
            events,
            tasks: raw.tasks,
        })
    }
}
