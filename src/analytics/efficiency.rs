//! Per-status dwell-time accumulation over ordered task histories.

use crate::date_util::{days_between, round1};
use crate::model::{EventAction, HistoryEvent, Status};

use super::types::EfficiencyRow;

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    total_days: f64,
    count: u32,
}

/// Running dwell totals for the three pre-completion statuses.
#[derive(Debug, Default)]
pub struct DwellAccumulator {
    todo: Bucket,
    in_progress: Bucket,
    review: Bucket,
}

impl DwellAccumulator {
    /// Walk one task's ordered history. Each consecutive event pair
    /// `(current, next)` attributes the elapsed time to the status the task
    /// was in after `current`: its `new_value`, or TODO for the creation
    /// event. Statuses outside {TODO, IN_PROGRESS, REVIEW} absorb nothing.
    pub fn add_history(&mut self, history: &[HistoryEvent]) {
        for pair in history.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let status = match &current.action {
                EventAction::Created => Some(Status::Todo),
                EventAction::StatusChanged => current
                    .new_value
                    .as_deref()
                    .and_then(|v| Status::parse(v).ok()),
                EventAction::Other(_) => None,
            };
            let bucket = match status {
                Some(Status::Todo) => &mut self.todo,
                Some(Status::InProgress) => &mut self.in_progress,
                Some(Status::Review) => &mut self.review,
                Some(Status::Completed) | None => continue,
            };
            bucket.total_days += days_between(current.created_at, next.created_at);
            bucket.count += 1;
        }
    }

    /// Averages per status, one decimal place. An empty TODO or IN_PROGRESS
    /// bucket reports 0; an empty REVIEW bucket reports the historical 0.5
    /// placeholder. That asymmetry is longstanding observed behavior and is
    /// kept as-is.
    pub fn rows(&self) -> Vec<EfficiencyRow> {
        vec![
            EfficiencyRow {
                status: Status::Todo,
                avg_days: avg_or(self.todo, 0.0),
            },
            EfficiencyRow {
                status: Status::InProgress,
                avg_days: avg_or(self.in_progress, 0.0),
            },
            EfficiencyRow {
                status: Status::Review,
                avg_days: avg_or(self.review, 0.5),
            },
        ]
    }
}

fn avg_or(bucket: Bucket, fallback: f64) -> f64 {
    if bucket.count == 0 {
        fallback
    } else {
        round1(bucket.total_days / bucket.count as f64)
    }
}
