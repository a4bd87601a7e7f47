//! Port contracts bridging the task domain to storage adapters.

mod repository;

pub use repository::{TaskRepository, TaskRepositoryError};
