//! Rate Limiting Infrastructure
//!
//! Calendar-day windows and the arithmetic of a per-day quota. Storage of the
//! counters lives with the domain that owns them.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::fmt;

/// ISO date (`YYYY-MM-DD`) identifying one quota window
///
/// The date is taken in a fixed UTC offset so that every process agrees on
/// when a day starts, whatever the host timezone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(String);

impl DayKey {
    const FORMAT: &'static str = "%Y-%m-%d";

    /// Day containing `instant` as seen from `offset`
    pub fn at(instant: DateTime<Utc>, offset: &FixedOffset) -> Self {
        Self(
            instant
                .with_timezone(offset)
                .format(Self::FORMAT)
                .to_string(),
        )
    }

    /// Day containing the current instant
    pub fn today(offset: &FixedOffset) -> Self {
        Self::at(Utc::now(), offset)
    }

    /// Parse a stored key; rejects anything that is not a real calendar date
    pub fn parse(value: &str) -> Option<Self> {
        NaiveDate::parse_from_str(value, Self::FORMAT)
            .ok()
            .map(|date| Self(date.format(Self::FORMAT).to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fixed number of allowed events per calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyQuota {
    pub max_per_day: u32,
}

impl DailyQuota {
    pub const fn new(max_per_day: u32) -> Self {
        Self { max_per_day }
    }

    /// Whether one more event fits after `used` events today
    pub fn allows(&self, used: u32) -> bool {
        used < self.max_per_day
    }

    /// Events left today; negative when `used` already exceeds the quota
    pub fn remaining(&self, used: u32) -> i64 {
        i64::from(self.max_per_day) - i64::from(used)
    }
}
