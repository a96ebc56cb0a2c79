//! Pure numeric helpers for the productivity scorer. Zero denominators are
//! outcomes with defined values, never errors.

/// Relative percentage change between consecutive periods, rounded to the
/// nearest integer. A zero prior period always reads as +100, even when the
/// current period is also zero.
///
/// One helper feeds both the throughput trend and the productivity trend;
/// they are the same value under two labels.
pub fn trend_pct(current: i64, previous: i64) -> i64 {
    if previous == 0 {
        return 100;
    }
    (((current - previous) as f64 / previous as f64) * 100.0).round() as i64
}

/// Lead-time trend, sign-inverted for display: lead time going down is an
/// improvement, so it is reported as a positive trend. A zero prior average
/// yields 0 (no baseline to compare against).
pub fn lead_time_trend_pct(current_avg: f64, previous_avg: f64) -> i64 {
    if previous_avg == 0.0 {
        return 0;
    }
    let raw = (((current_avg - previous_avg) / previous_avg) * 100.0).round() as i64;
    -raw
}

/// Composite performance score in [0, 999]:
/// velocity (completions per day, up to 400) + speed (lead time, up to 300)
/// + volume (absolute completions, up to 300). A period with no completions
/// scores 0 — there is no speed component without a measured lead time.
pub fn performance_score(completed_this_period: i64, avg_lead_time_days: f64, days: u32) -> i64 {
    if completed_this_period <= 0 {
        return 0;
    }
    let velocity = (completed_this_period as f64 / days as f64 * 400.0).min(400.0);
    let speed = (2.0 / avg_lead_time_days.max(0.1) * 300.0).min(300.0);
    let volume = (completed_this_period as f64 / 20.0 * 300.0).min(300.0);
    ((velocity + speed + volume).round() as i64).min(999)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_pct_zero_previous_always_100() {
        assert_eq!(trend_pct(0, 0), 100);
        assert_eq!(trend_pct(5, 0), 100);
    }

    #[test]
    fn test_trend_pct_change() {
        assert_eq!(trend_pct(15, 10), 50);
        assert_eq!(trend_pct(5, 10), -50);
        assert_eq!(trend_pct(10, 10), 0);
        assert_eq!(trend_pct(0, 4), -100);
        // 1/3 rounds to the nearest integer
        assert_eq!(trend_pct(4, 3), 33);
    }

    #[test]
    fn test_lead_time_trend_inverts_sign() {
        // Lead time dropped from 4 to 2 days: 50% faster, reported +50
        assert_eq!(lead_time_trend_pct(2.0, 4.0), 50);
        // Lead time grew: reported negative
        assert_eq!(lead_time_trend_pct(4.0, 2.0), -100);
        assert_eq!(lead_time_trend_pct(3.0, 3.0), 0);
    }

    #[test]
    fn test_lead_time_trend_zero_baseline() {
        assert_eq!(lead_time_trend_pct(0.0, 0.0), 0);
        assert_eq!(lead_time_trend_pct(5.0, 0.0), 0);
    }

    #[test]
    fn test_score_zero_completions() {
        assert_eq!(performance_score(0, 0.0, 7), 0);
    }

    #[test]
    fn test_score_caps_at_999() {
        // Huge throughput, instant completions: all three components max out
        assert_eq!(performance_score(1000, 0.0, 1), 999);
    }

    #[test]
    fn test_score_components() {
        // 7 completions over 7 days, 2-day average lead time:
        // velocity = 400, speed = 300, volume = 7/20*300 = 105
        assert_eq!(performance_score(7, 2.0, 7), 805);
        // Slow completions drag the speed component down:
        // velocity = 400, speed = 2/10*300 = 60, volume = 105
        assert_eq!(performance_score(7, 10.0, 7), 565);
    }

    #[test]
    fn test_score_always_in_range() {
        for completed in [0, 1, 3, 19, 20, 21, 500, 10_000] {
            for lead in [0.0, 0.05, 0.1, 1.0, 2.0, 365.0] {
                for days in [1, 7, 30, 90] {
                    let s = performance_score(completed, lead, days);
                    assert!((0..=999).contains(&s), "score {s} out of range");
                }
            }
        }
    }
}
