//! SQLite-backed [`TaskRepository`] implementation.

use super::models::{NewTagRow, TagRow, TaskRecord, TaskRow, TaskTagRecord, row_to_tag, row_to_task};
use crate::storage::SqlitePool;
use crate::storage::schema::{task_tags, tags, tasks};
use crate::task::domain::{Tag, TagId, Task, TaskId};
use crate::task::ports::{TaskRepository, TaskRepositoryError};
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::collections::HashMap;

type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// SQLite-backed task repository, reading from the reader pool and writing
/// through the single-connection writer pool (§4.A).
#[derive(Debug, Clone)]
pub struct SqliteTaskRepository {
    writer: SqlitePool,
    reader: SqlitePool,
}

impl SqliteTaskRepository {
    /// Creates a repository from the storage layer's writer and reader pools.
    #[must_use]
    pub const fn new(writer: SqlitePool, reader: SqlitePool) -> Self {
        Self { writer, reader }
    }

    async fn run_write<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.writer.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }

    async fn run_read<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.reader.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

fn load_task_row(connection: &mut SqliteConnection, id: TaskId) -> TaskRepositoryResult<TaskRow> {
    tasks::table
        .filter(tasks::id.eq(id.to_string()))
        .select(TaskRow::as_select())
        .first(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)?
        .ok_or(TaskRepositoryError::NotFound(id))
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert_task(&self, task: Task) -> TaskRepositoryResult<Task> {
        let record = TaskRecord::from_domain(&task);
        self.run_write(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&record)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(())
        })
        .await?;
        Ok(task)
    }

    async fn get_task(&self, id: TaskId) -> TaskRepositoryResult<Task> {
        self.run_read(move |connection| {
            let row = load_task_row(connection, id)?;
            row_to_task(row).map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err)))
        })
        .await
    }

    async fn list_tasks(&self) -> TaskRepositoryResult<Vec<Task>> {
        self.run_read(|connection| {
            let rows = tasks::table
                .order(tasks::created_at.asc())
                .select(TaskRow::as_select())
                .load(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter()
                .map(|row| {
                    row_to_task(row)
                        .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err)))
                })
                .collect()
        })
        .await
    }

    async fn list_children(&self, parent_id: Option<TaskId>) -> TaskRepositoryResult<Vec<Task>> {
        let parent_value = parent_id.map(|id| id.to_string());
        self.run_read(move |connection| {
            let query = tasks::table
                .order(tasks::created_at.asc())
                .select(TaskRow::as_select());
            let rows = match parent_value {
                Some(value) => query.filter(tasks::parent_id.eq(value)).load(connection),
                None => query.filter(tasks::parent_id.is_null()).load(connection),
            }
            .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter()
                .map(|row| {
                    row_to_task(row)
                        .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err)))
                })
                .collect()
        })
        .await
    }

    async fn ancestors(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        self.run_read(move |connection| {
            let mut result = Vec::new();
            let mut current = load_task_row(connection, id)?
                .parent_id
                .map(|value| TaskId::parse(&value))
                .transpose()
                .map_err(TaskRepositoryError::persistence)?;
            while let Some(ancestor_id) = current {
                result.push(ancestor_id);
                current = load_task_row(connection, ancestor_id)?
                    .parent_id
                    .map(|value| TaskId::parse(&value))
                    .transpose()
                    .map_err(|err| TaskRepositoryError::persistence(err))?;
            }
            Ok(result)
        })
        .await
    }

    async fn descendants(&self, id: TaskId) -> TaskRepositoryResult<Vec<TaskId>> {
        self.run_read(move |connection| {
            load_task_row(connection, id)?;
            let all_rows = tasks::table
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            let mut result = Vec::new();
            let mut frontier = vec![id.to_string()];
            while let Some(current) = frontier.pop() {
                for row in &all_rows {
                    if row.parent_id.as_deref() == Some(current.as_str()) {
                        result.push(
                            TaskId::parse(&row.id).map_err(TaskRepositoryError::persistence)?,
                        );
                        frontier.push(row.id.clone());
                    }
                }
            }
            Ok(result)
        })
        .await
    }

    async fn update_task(&self, task: Task) -> TaskRepositoryResult<Task> {
        let record = TaskRecord::from_domain(&task);
        let id = task.id();
        self.run_write(move |connection| {
            let updated = diesel::update(tasks::table.filter(tasks::id.eq(id.to_string())))
                .set(&record)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            if updated == 0 {
                return Err(TaskRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await?;
        Ok(task)
    }

    async fn delete_tasks(&self, ids: &[TaskId]) -> TaskRepositoryResult<()> {
        let id_strings: Vec<String> = ids.iter().map(ToString::to_string).collect();
        self.run_write(move |connection| {
            connection
                .transaction(|connection| {
                    diesel::delete(task_tags::table.filter(task_tags::task_id.eq_any(&id_strings)))
                        .execute(connection)?;
                    diesel::delete(tasks::table.filter(tasks::id.eq_any(&id_strings)))
                        .execute(connection)?;
                    diesel::result::QueryResult::Ok(())
                })
                .map_err(TaskRepositoryError::persistence)
        })
        .await
    }

    async fn find_tag_by_name(&self, name: &str) -> TaskRepositoryResult<Option<Tag>> {
        let name = name.to_owned();
        self.run_read(move |connection| {
            let row = tags::table
                .filter(tags::name.eq(&name))
                .select(TagRow::as_select())
                .first(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            row.map(row_to_tag)
                .transpose()
                .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err)))
        })
        .await
    }

    async fn insert_tag(&self, tag: Tag) -> TaskRepositoryResult<Tag> {
        let record = NewTagRow::from_domain(&tag);
        self.run_write(move |connection| {
            diesel::insert_into(tags::table)
                .values(&record)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(())
        })
        .await?;
        Ok(tag)
    }

    async fn list_tags(&self) -> TaskRepositoryResult<Vec<Tag>> {
        self.run_read(|connection| {
            let rows = tags::table
                .order(tags::created_at.asc())
                .select(TagRow::as_select())
                .load(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter()
                .map(|row| {
                    row_to_tag(row)
                        .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err)))
                })
                .collect()
        })
        .await
    }

    async fn attach_tag(&self, task_id: TaskId, tag_id: TagId) -> TaskRepositoryResult<bool> {
        self.run_write(move |connection| {
            load_task_row(connection, task_id)?;
            let record = TaskTagRecord {
                task_id: task_id.to_string(),
                tag_id: tag_id.to_string(),
            };
            let inserted = diesel::insert_or_ignore_into(task_tags::table)
                .values(&record)
                .execute(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(inserted > 0)
        })
        .await
    }

    async fn detach_tag(&self, task_id: TaskId, tag_id: TagId) -> TaskRepositoryResult<bool> {
        self.run_write(move |connection| {
            let deleted = diesel::delete(
                task_tags::table
                    .filter(task_tags::task_id.eq(task_id.to_string()))
                    .filter(task_tags::tag_id.eq(tag_id.to_string())),
            )
            .execute(connection)
            .map_err(TaskRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn tags_for_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Tag>> {
        self.run_read(move |connection| {
            let rows = tags::table
                .inner_join(task_tags::table.on(task_tags::tag_id.eq(tags::id)))
                .filter(task_tags::task_id.eq(task_id.to_string()))
                .select(TagRow::as_select())
                .load(connection)
                .map_err(TaskRepositoryError::persistence)?;
            rows.into_iter()
                .map(|row| {
                    row_to_tag(row)
                        .map_err(|err| TaskRepositoryError::persistence(std::io::Error::other(err)))
                })
                .collect()
        })
        .await
    }

    async fn tag_usage_counts(&self) -> TaskRepositoryResult<HashMap<TagId, i64>> {
        self.run_read(|connection| {
            let tag_ids: Vec<String> = task_tags::table
                .select(task_tags::tag_id)
                .load(connection)
                .map_err(TaskRepositoryError::persistence)?;
            let mut counts: HashMap<TagId, i64> = HashMap::new();
            for tag_id in tag_ids {
                let tag_id = TagId::parse(&tag_id).map_err(TaskRepositoryError::persistence)?;
                *counts.entry(tag_id).or_insert(0) += 1;
            }
            Ok(counts)
        })
        .await
    }
}
