//! Query windows accepted by [`crate::replay::services::ReplayAggregator`].

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// A named query window (§4.G `get_overview`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Range {
    /// The entire event history, unbounded.
    All,
    /// The trailing 86,400 seconds.
    Day,
    /// The trailing 7 × 86,400 seconds.
    Week,
    /// From local midnight to now.
    Today,
}

/// Error returned when parsing a [`Range`] from an external request.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown range: {0}")]
pub struct ParseRangeError(pub String);

impl TryFrom<&str> for Range {
    type Error = ParseRangeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "all" => Ok(Self::All),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "today" => Ok(Self::Today),
            other => Err(ParseRangeError(other.to_owned())),
        }
    }
}

/// The resolved `[t0, t1]` window, in unix seconds. `t0` is `None` for
/// [`Range::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Inclusive lower bound, `None` when unbounded.
    pub t0: Option<i64>,
    /// Inclusive upper bound: the moment the window was resolved.
    pub t1: i64,
}

impl Window {
    /// Resolves `range` against `now`.
    #[must_use]
    pub fn resolve(range: Range, now: DateTime<Utc>) -> Self {
        let t1 = now.timestamp();
        let t0 = match range {
            Range::All => None,
            Range::Day => Some(t1 - SECONDS_PER_DAY),
            Range::Week => Some(t1 - 7 * SECONDS_PER_DAY),
            Range::Today => Some(local_midnight(now)),
        };
        Self { t0, t1 }
    }

    /// Clamps `value` into the window's lower bound.
    #[must_use]
    pub fn clamp_start(&self, value: i64) -> i64 {
        match self.t0 {
            Some(t0) => value.max(t0),
            None => value,
        }
    }

    /// Clamps `value` into the window's upper bound.
    #[must_use]
    pub const fn clamp_end(&self, value: i64) -> i64 {
        if value < self.t1 { value } else { self.t1 }
    }
}

fn local_midnight(now: DateTime<Utc>) -> i64 {
    let local_now = Local.from_utc_datetime(&now.naive_utc());
    let local_midnight = local_now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| local_now.naive_local());
    Local
        .from_local_datetime(&local_midnight)
        .single()
        .map_or_else(|| now.timestamp(), |dt| dt.with_timezone(&Utc).timestamp())
}
