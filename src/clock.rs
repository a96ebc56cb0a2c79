use chrono::{DateTime, Utc};

/// Source of the ambient current time.
///
/// Every aggregate depends on "now" (window bounds, overdue checks, bucket
/// skeletons), so the engine takes a clock at construction instead of calling
/// `Utc::now()` inline. Tests pin time with [`FixedClock`].
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at a single instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}
