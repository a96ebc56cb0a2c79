use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

use crate::error::{Error, Result};

static RE_DAYS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,4})[dD]?$").unwrap());

/// A trailing window of whole calendar days ending today (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    days: u32,
}

impl Window {
    /// Create a window of `days > 0` days.
    pub fn new(days: u32) -> Result<Self> {
        if days == 0 {
            return Err(Error::invalid("window must cover at least one day"));
        }
        Ok(Self { days })
    }

    /// Parse a window string: `"7"`, `"7d"`, `"30D"`.
    pub fn parse(s: &str) -> Result<Self> {
        let caps = RE_DAYS
            .captures(s.trim())
            .ok_or_else(|| Error::invalid(format!("unrecognized window: {s}")))?;
        let days: u32 = caps[1]
            .parse()
            .map_err(|_| Error::invalid(format!("unrecognized window: {s}")))?;
        Self::new(days)
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Ordered day buckets, oldest first, ending at `today` inclusive.
    /// Exactly `days` entries; days with no activity are still present.
    pub fn day_buckets(&self, today: NaiveDate) -> Vec<NaiveDate> {
        (0..self.days)
            .rev()
            .map(|offset| today - Duration::days(offset as i64))
            .collect()
    }

    /// The current period as a half-open instant range `[now - days, now)`.
    pub fn period_bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (now - Duration::days(self.days as i64), now)
    }

    /// The immediately preceding period of equal length,
    /// `[now - 2*days, now - days)`.
    pub fn prev_period_bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = now - Duration::days(2 * self.days as i64);
        let end = now - Duration::days(self.days as i64);
        (start, end)
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.days)
    }
}
