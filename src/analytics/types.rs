use chrono::NaiveDate;
use serde::Serialize;

use crate::model::Status;

/// One day bucket of the completion/creation trend. The sequence always has
/// exactly `days` entries, oldest first; quiet days carry zero counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Short weekday label ("Mon", "Tue", …).
    pub label: String,
    pub completed: i64,
    pub created: i64,
}

/// Histogram of active (non-completed) tasks by priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityDistribution {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub urgent: i64,
}

impl PriorityDistribution {
    pub fn total(&self) -> i64 {
        self.low + self.medium + self.high + self.urgent
    }
}

/// Throughput, lead time, and the composite performance score, each with a
/// period-over-period trend percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProductivityMetrics {
    pub completed_this_period: i64,
    /// Mean lead time over the period's completions, one decimal place.
    pub avg_lead_time_days: f64,
    /// All-time completion count in scope.
    pub total_completed: i64,
    /// Composite score in [0, 999].
    pub performance_score: i64,
    pub throughput_trend_pct: i64,
    /// Sign-inverted: a lead-time decrease (an improvement) reads positive.
    pub lead_time_trend_pct: i64,
    /// Intentionally identical to `throughput_trend_pct`; both come from one
    /// shared helper so they cannot drift.
    pub productivity_trend_pct: i64,
}

/// Average dwell time per workflow status, over recent completed tasks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EfficiencyRow {
    pub status: Status,
    pub avg_days: f64,
}

/// One calendar date of the 90-day completion heatmap. Dates with zero
/// completions are omitted entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatmapPoint {
    pub date: NaiveDate,
    pub count: i64,
}

/// Everything the analytics engine produces for one caller, assembled from
/// independent sub-queries. Recomputed per request; never cached.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub trends: Vec<TrendPoint>,
    pub distribution: PriorityDistribution,
    pub productivity: ProductivityMetrics,
    pub efficiency: Vec<EfficiencyRow>,
    pub heatmap: Vec<HeatmapPoint>,
    pub insights: Vec<String>,
}

impl Dashboard {
    /// Static zeroed baseline for graceful degradation when the store is
    /// unavailable. Callers substitute this instead of surfacing the error.
    pub fn fallback(days: u32) -> Self {
        Self {
            trends: (0..days)
                .map(|_| TrendPoint {
                    label: String::new(),
                    completed: 0,
                    created: 0,
                })
                .collect(),
            distribution: PriorityDistribution::default(),
            productivity: ProductivityMetrics::default(),
            efficiency: vec![
                EfficiencyRow {
                    status: Status::Todo,
                    avg_days: 0.0,
                },
                EfficiencyRow {
                    status: Status::InProgress,
                    avg_days: 0.0,
                },
                EfficiencyRow {
                    status: Status::Review,
                    avg_days: 0.0,
                },
            ],
            heatmap: Vec::new(),
            insights: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_total() {
        let d = PriorityDistribution {
            low: 1,
            medium: 2,
            high: 3,
            urgent: 4,
        };
        assert_eq!(d.total(), 10);
        assert_eq!(PriorityDistribution::default().total(), 0);
    }

    #[test]
    fn test_fallback_shape() {
        let f = Dashboard::fallback(7);
        assert_eq!(f.trends.len(), 7);
        assert!(f.trends.iter().all(|p| p.completed == 0 && p.created == 0));
        assert_eq!(f.efficiency.len(), 3);
        assert!(f.heatmap.is_empty());
        assert!(f.insights.is_empty());
        assert_eq!(f.productivity.performance_score, 0);
    }
}
