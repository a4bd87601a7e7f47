//! The Command Surface (§4.G): the single operation API external
//! collaborators drive the core through.

mod notify;
mod surface;

pub use notify::ChangeNotifier;
pub use surface::CommandSurface;

use crate::config::TimeFilesConfig;
use crate::rest_advisor::adapters::sqlite::SqliteRestSuggestionRepository;
use crate::storage::{StorageOpenError, StoragePools, reconcile_mirror};
use crate::task::adapters::sqlite::SqliteTaskRepository;
use crate::timing::adapters::sqlite::{SqliteEventLogRepository, SqliteTimingTransaction};
use mockable::DefaultClock;
use std::sync::Arc;

/// A [`CommandSurface`] wired to the embedded SQLite store and the system
/// clock; the shape every host process actually constructs.
pub type SqliteCommandSurface = CommandSurface<
    SqliteTaskRepository,
    SqliteEventLogRepository,
    SqliteTimingTransaction,
    SqliteRestSuggestionRepository,
    DefaultClock,
>;

/// Opens the embedded store at `config.database_url` and assembles a command
/// surface over it, using the system clock.
///
/// # Errors
///
/// Returns [`StorageOpenError`] if the store cannot be opened or its
/// migrations fail to apply.
pub fn open(config: &TimeFilesConfig) -> Result<SqliteCommandSurface, StorageOpenError> {
    let pools = StoragePools::open(&config.database_url, config.writer_pool_size, config.reader_pool_size)?;
    reconcile_mirror(&mut pools.writer.get()?)?;
    let tasks = Arc::new(SqliteTaskRepository::new(pools.writer.clone(), pools.reader.clone()));
    let events = Arc::new(SqliteEventLogRepository::new(pools.writer.clone(), pools.reader.clone()));
    let transaction = Arc::new(SqliteTimingTransaction::new(pools.writer.clone()));
    let suggestions = Arc::new(SqliteRestSuggestionRepository::new(pools.writer, pools.reader));
    Ok(CommandSurface::new(
        tasks,
        events,
        transaction,
        suggestions,
        Arc::new(DefaultClock),
        config.rest_advisor,
    ))
}
