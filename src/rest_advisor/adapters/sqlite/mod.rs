//! SQLite-backed rest suggestion adapter.

mod models;
mod repository;

pub use repository::SqliteRestSuggestionRepository;
