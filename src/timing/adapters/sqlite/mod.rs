//! SQLite-backed event log adapter.

mod models;
mod repository;
mod transaction;

pub use repository::SqliteEventLogRepository;
pub use transaction::SqliteTimingTransaction;
