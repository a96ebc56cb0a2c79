use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, Utc, Weekday};

/// Format an instant the way the store keeps timestamps
/// (`2026-03-15T12:00:00Z`). Lexicographic order matches chronological order,
/// so range predicates in SQL compare these directly.
pub fn ts(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Short weekday label for chart axes.
pub fn weekday_label(d: NaiveDate) -> &'static str {
    match d.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Elapsed fractional days between two instants, floored at zero. Event logs
/// occasionally carry a completion stamped before the task's own `created_at`
/// (clock skew on import); negative lead times are treated as zero.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let secs = (to - from).num_seconds();
    if secs <= 0 {
        0.0
    } else {
        secs as f64 / 86_400.0
    }
}

/// Round to one decimal place, for displayed day averages.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_ts_format() {
        assert_eq!(ts(at("2026-03-15T12:00:00Z")), "2026-03-15T12:00:00Z");
    }

    #[test]
    fn test_weekday_label() {
        // 2026-03-16 is a Monday
        assert_eq!(weekday_label(NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()), "Mon");
        assert_eq!(weekday_label(NaiveDate::from_ymd_opt(2026, 3, 22).unwrap()), "Sun");
    }

    #[test]
    fn test_days_between() {
        let t0 = at("2026-03-15T00:00:00Z");
        let t1 = at("2026-03-16T12:00:00Z");
        assert_eq!(days_between(t0, t1), 1.5);
    }

    #[test]
    fn test_days_between_floors_negative() {
        let t0 = at("2026-03-16T00:00:00Z");
        let t1 = at("2026-03-15T00:00:00Z");
        assert_eq!(days_between(t0, t1), 0.0);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(1.25), 1.3);
        assert_eq!(round1(1.24), 1.2);
        assert_eq!(round1(0.0), 0.0);
    }
}
