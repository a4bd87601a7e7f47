//! Tag domain values: free-form labels attachable to any task.

use super::{MAX_TAG_NAME_LEN, TagId, TaskDomainError, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named label, independent of any task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    id: TagId,
    name: String,
    created_at: DateTime<Utc>,
}

impl Tag {
    /// Creates a new tag.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTagName`] or
    /// [`TaskDomainError::TagNameTooLong`] when `name` fails validation.
    pub fn new(name: &str, created_at: DateTime<Utc>) -> Result<Self, TaskDomainError> {
        let name = validate_tag_name(name)?;
        Ok(Self {
            id: TagId::new(),
            name,
            created_at,
        })
    }

    /// Reconstructs a tag from persisted storage.
    #[must_use]
    pub const fn from_persisted(id: TagId, name: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            created_at,
        }
    }

    /// Returns the tag identifier.
    #[must_use]
    pub const fn id(&self) -> TagId {
        self.id
    }

    /// Returns the tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A single task-to-tag assignment. Idempotent: attaching an already-present
/// tag, or removing an absent one, is not an observable change (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTag {
    /// The tagged task.
    pub task_id: TaskId,
    /// The attached tag.
    pub tag_id: TagId,
}

/// Validates and normalizes a tag name.
///
/// # Errors
///
/// Returns [`TaskDomainError::EmptyTagName`] if `name` is empty after
/// trimming, or [`TaskDomainError::TagNameTooLong`] if it exceeds
/// [`MAX_TAG_NAME_LEN`] characters.
pub fn validate_tag_name(name: &str) -> Result<String, TaskDomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TaskDomainError::EmptyTagName);
    }
    let char_count = trimmed.chars().count();
    if char_count > MAX_TAG_NAME_LEN {
        return Err(TaskDomainError::TagNameTooLong(char_count));
    }
    Ok(trimmed.to_owned())
}
