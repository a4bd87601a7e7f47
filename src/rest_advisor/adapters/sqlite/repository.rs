//! SQLite-backed [`RestSuggestionRepository`] implementation.

use super::models::{RestSuggestionRecord, RestSuggestionRow, row_to_suggestion};
use crate::rest_advisor::domain::{RestSuggestion, SuggestionId, SuggestionStatus};
use crate::rest_advisor::ports::{RestSuggestionRepository, RestSuggestionRepositoryError};
use crate::storage::SqlitePool;
use crate::storage::schema::rest_suggestions;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

type RestSuggestionResult<T> = Result<T, RestSuggestionRepositoryError>;

/// SQLite-backed rest suggestion store, reading from the reader pool and
/// writing through the single-connection writer pool (§4.A).
#[derive(Debug, Clone)]
pub struct SqliteRestSuggestionRepository {
    writer: SqlitePool,
    reader: SqlitePool,
}

impl SqliteRestSuggestionRepository {
    /// Creates a repository from the storage layer's writer and reader pools.
    #[must_use]
    pub const fn new(writer: SqlitePool, reader: SqlitePool) -> Self {
        Self { writer, reader }
    }

    async fn run_write<F, T>(&self, f: F) -> RestSuggestionResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> RestSuggestionResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.writer.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RestSuggestionRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RestSuggestionRepositoryError::persistence)?
    }

    async fn run_read<F, T>(&self, f: F) -> RestSuggestionResult<T>
    where
        F: FnOnce(&mut SqliteConnection) -> RestSuggestionResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.reader.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(RestSuggestionRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(RestSuggestionRepositoryError::persistence)?
    }
}

fn decode_row(row: RestSuggestionRow) -> RestSuggestionResult<RestSuggestion> {
    row_to_suggestion(row).map_err(|err| RestSuggestionRepositoryError::persistence(std::io::Error::other(err)))
}

#[async_trait]
impl RestSuggestionRepository for SqliteRestSuggestionRepository {
    async fn insert(&self, suggestion: RestSuggestion) -> RestSuggestionResult<RestSuggestion> {
        let record = RestSuggestionRecord::from_domain(&suggestion);
        self.run_write(move |connection| {
            diesel::insert_into(rest_suggestions::table)
                .values(&record)
                .execute(connection)
                .map_err(RestSuggestionRepositoryError::persistence)?;
            Ok(())
        })
        .await?;
        Ok(suggestion)
    }

    async fn get(&self, id: SuggestionId) -> RestSuggestionResult<RestSuggestion> {
        self.run_read(move |connection| {
            let row = rest_suggestions::table
                .filter(rest_suggestions::id.eq(id.to_string()))
                .select(RestSuggestionRow::as_select())
                .first(connection)
                .optional()
                .map_err(RestSuggestionRepositoryError::persistence)?
                .ok_or(RestSuggestionRepositoryError::NotFound(id))?;
            decode_row(row)
        })
        .await
    }

    async fn pending(&self) -> RestSuggestionResult<Option<RestSuggestion>> {
        self.run_read(|connection| {
            let row = rest_suggestions::table
                .filter(rest_suggestions::status.eq(SuggestionStatus::Pending.as_str()))
                .order(rest_suggestions::created_at.desc())
                .select(RestSuggestionRow::as_select())
                .first(connection)
                .optional()
                .map_err(RestSuggestionRepositoryError::persistence)?;
            row.map(decode_row).transpose()
        })
        .await
    }

    async fn update(&self, suggestion: RestSuggestion) -> RestSuggestionResult<RestSuggestion> {
        let record = RestSuggestionRecord::from_domain(&suggestion);
        let id = suggestion.id;
        self.run_write(move |connection| {
            let updated = diesel::update(rest_suggestions::table.filter(rest_suggestions::id.eq(id.to_string())))
                .set(&record)
                .execute(connection)
                .map_err(RestSuggestionRepositoryError::persistence)?;
            if updated == 0 {
                return Err(RestSuggestionRepositoryError::NotFound(id));
            }
            Ok(())
        })
        .await?;
        Ok(suggestion)
    }
}
