//! SQLite-backed task adapter.

pub(crate) mod models;
mod repository;

pub use repository::SqliteTaskRepository;
