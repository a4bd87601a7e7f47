//! Connection pooling for the embedded store.
//!
//! SQLite serializes writers at the file level; the Rust side mirrors that by
//! splitting a single-connection writer pool (capacity 1, enforcing §4.A's
//! "exclusive write lock per command") from a multi-connection reader pool
//! that serves `get_overview`/`ping` concurrently with the writer.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError};
use diesel::sqlite::SqliteConnection;
use thiserror::Error;

use super::migrations::{MigrationError, run_pending_migrations};

/// Pool type shared by the writer and reader handles.
pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Errors raised while opening the embedded store.
#[derive(Debug, Error)]
pub enum StorageOpenError {
    /// The connection pool could not be built.
    #[error("failed to build connection pool: {0}")]
    Pool(#[from] PoolError),

    /// Migrations failed to apply.
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// The initial writer connection could not be checked out.
    #[error("failed to acquire writer connection: {0}")]
    Acquire(#[from] diesel::r2d2::Error),
}

/// Writer and reader pools over the same on-disk (or in-memory) database.
#[derive(Debug, Clone)]
pub struct StoragePools {
    /// Single-connection pool serializing all write transactions.
    pub writer: SqlitePool,
    /// Multi-connection pool serving concurrent read-only queries.
    pub reader: SqlitePool,
}

impl StoragePools {
    /// Opens the store at `database_url`, running any pending migrations.
    ///
    /// `database_url` is a filesystem path or `:memory:`. Pool sizes come
    /// from [`crate::config::TimeFilesConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`StorageOpenError`] when the pool cannot be built or
    /// migrations fail to apply.
    pub fn open(
        database_url: &str,
        writer_pool_size: u32,
        reader_pool_size: u32,
    ) -> Result<Self, StorageOpenError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let writer = Pool::builder()
            .max_size(writer_pool_size.max(1))
            .connection_customizer(Box::new(WriterConnectionCustomizer))
            .build(manager.clone())?;
        let reader = Pool::builder()
            .max_size(reader_pool_size.max(1))
            .connection_customizer(Box::new(ReaderConnectionCustomizer))
            .build(manager)?;

        let mut connection = writer.get()?;
        run_pending_migrations(&mut connection)?;

        Ok(Self { writer, reader })
    }
}

/// Sets the per-connection pragmas the writer pool relies on.
#[derive(Debug)]
struct WriterConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for WriterConnectionCustomizer {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Sets the per-connection pragmas the reader pool relies on, additionally
/// forbidding writes so a reader connection can never bypass the writer's
/// exclusive lock.
#[derive(Debug)]
struct ReaderConnectionCustomizer;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ReaderConnectionCustomizer {
    fn on_acquire(&self, connection: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        connection
            .batch_execute(
                "PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON; PRAGMA query_only = ON;",
            )
            .map_err(diesel::r2d2::Error::QueryError)
    }
}
