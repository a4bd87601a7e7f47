//! Pure task domain types: identifiers, validation, and the aggregate itself.

mod error;
mod ids;
mod tag;
mod task;

pub use error::{MAX_TAG_NAME_LEN, MAX_TITLE_LEN, TaskDomainError};
pub use ids::{TagId, TaskId};
pub use tag::{Tag, TaskTag, validate_tag_name};
pub use task::{ParseTaskStatusError, PersistedTaskData, Task, TaskStatus, validate_title};

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;
    use rstest::rstest;

    #[test]
    fn new_task_is_idle() {
        let clock = DefaultClock;
        let task = Task::new("Write report", None, &clock).expect("valid title");
        assert_eq!(task.status(), TaskStatus::Idle);
        assert!(task.parent_id().is_none());
        assert!(!task.is_archived());
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn empty_title_is_rejected(#[case] title: &str) {
        let clock = DefaultClock;
        let err = Task::new(title, None, &clock).expect_err("empty title");
        assert_eq!(err, TaskDomainError::EmptyTitle);
    }

    #[test]
    fn title_over_limit_is_rejected() {
        let clock = DefaultClock;
        let title = "x".repeat(MAX_TITLE_LEN + 1);
        let err = Task::new(&title, None, &clock).expect_err("too long");
        assert_eq!(err, TaskDomainError::TitleTooLong(MAX_TITLE_LEN + 1));
    }

    #[test]
    fn rename_trims_and_validates() {
        let clock = DefaultClock;
        let mut task = Task::new("Draft", None, &clock).expect("valid title");
        task.rename("  Final  ").expect("valid rename");
        assert_eq!(task.title(), "Final");
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            TaskStatus::Idle,
            TaskStatus::Running,
            TaskStatus::Paused,
            TaskStatus::Stopped,
        ] {
            let parsed = TaskStatus::try_from(status.as_str()).expect("known status");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        let err = TaskStatus::try_from("blocked").expect_err("unknown status");
        assert_eq!(err, ParseTaskStatusError("blocked".to_owned()));
    }

    #[test]
    fn empty_tag_name_is_rejected() {
        let err = validate_tag_name(" ").expect_err("empty tag name");
        assert_eq!(err, TaskDomainError::EmptyTagName);
    }
}
