//! Pure replay types: query windows and the snapshot shape.

mod range;
mod snapshot;

pub use range::{ParseRangeError, Range, Window};
pub use snapshot::{OverviewSnapshot, TagSummary, TaskOverview};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn all_range_has_no_lower_bound() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let window = Window::resolve(Range::All, now);
        assert_eq!(window.t0, None);
        assert_eq!(window.t1, now.timestamp());
    }

    #[test]
    fn day_range_is_trailing_86400_seconds() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 12, 0, 0).unwrap();
        let window = Window::resolve(Range::Day, now);
        assert_eq!(window.t0, Some(now.timestamp() - 86_400));
    }

    #[test]
    fn range_round_trips_through_str() {
        for range in [Range::All, Range::Day, Range::Week, Range::Today] {
            let encoded = match range {
                Range::All => "all",
                Range::Day => "day",
                Range::Week => "week",
                Range::Today => "today",
            };
            assert_eq!(Range::try_from(encoded), Ok(range));
        }
    }
}
