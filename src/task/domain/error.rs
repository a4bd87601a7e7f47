//! Error types for task domain validation.

use thiserror::Error;

/// Maximum title length accepted by [`super::Task::rename`] and creation.
pub const MAX_TITLE_LEN: usize = 500;

/// Maximum tag name length.
pub const MAX_TAG_NAME_LEN: usize = 100;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The title exceeds the maximum persisted length.
    #[error("task title exceeds {MAX_TITLE_LEN} characters")]
    TitleTooLong(usize),

    /// The tag name is empty after trimming.
    #[error("tag name must not be empty")]
    EmptyTagName,

    /// The tag name exceeds the maximum persisted length.
    #[error("tag name exceeds {MAX_TAG_NAME_LEN} characters")]
    TagNameTooLong(usize),
}
