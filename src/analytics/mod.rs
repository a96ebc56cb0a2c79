pub mod efficiency;
pub mod insights;
pub mod scope;
pub mod score;
pub mod types;

pub use types::*;

use chrono::Duration;
use std::collections::HashMap;

use crate::clock::Clock;
use crate::date_util::{days_between, round1, weekday_label};
use crate::error::{Error, Result};
use crate::model::{Priority, Scope, TaskRecord};
use crate::storage::repository::{self, EventFilter, EventRow, TaskFilter, TimeRange};
use crate::storage::Database;
use crate::window::Window;
use efficiency::DwellAccumulator;
use insights::InsightInputs;
use scope::ActorScope;

/// How many recently-completed tasks feed the dwell-time averages.
const EFFICIENCY_SAMPLE: u32 = 30;

/// Trailing window of the completion heatmap, in days.
const HEATMAP_DAYS: i64 = 90;

/// Counts of completed and created lifecycle transitions per calendar day.
///
/// Returns exactly `days` points, oldest first, ending today; days without
/// activity carry zeros. Completions match tasks the caller created or is
/// assigned to under personal scope; creations match the creator only.
pub async fn completion_trends(
    db: &Database,
    clock: &dyn Clock,
    caller_id: i64,
    scope: Scope,
    days: u32,
) -> Result<Vec<TrendPoint>> {
    let window = Window::new(days)?;
    let now = clock.now_utc();
    let buckets = window.day_buckets(now.date_naive());

    let start = buckets[0].and_hms_opt(0, 0, 0).unwrap().and_utc();
    let end = start + Duration::days(days as i64);
    let range = TimeRange::new(start, end);

    let completed_filter =
        EventFilter::completions(ActorScope::for_trend_completions(scope, caller_id));
    let created_filter = EventFilter::creations(ActorScope::for_trend_creations(scope, caller_id));

    let (completed, created) = db
        .reader()
        .call(move |conn| {
            let completed = repository::group_events_by_day(conn, &completed_filter, &range)?;
            let created = repository::group_events_by_day(conn, &created_filter, &range)?;
            Ok::<_, rusqlite::Error>((completed, created))
        })
        .await
        .map_err(Error::unavailable)?;

    let completed: HashMap<_, _> = completed.into_iter().collect();
    let created: HashMap<_, _> = created.into_iter().collect();

    Ok(buckets
        .into_iter()
        .map(|day| TrendPoint {
            label: weekday_label(day).to_string(),
            completed: completed.get(&day).copied().unwrap_or(0),
            created: created.get(&day).copied().unwrap_or(0),
        })
        .collect())
}

/// Histogram of active (non-completed) tasks by priority. Zero tasks is a
/// valid all-zero result, not an error.
pub async fn priority_distribution(
    db: &Database,
    caller_id: i64,
    scope: Scope,
) -> Result<PriorityDistribution> {
    let tasks = active_tasks(db, ActorScope::for_active_tasks(scope, caller_id)).await?;

    let mut dist = PriorityDistribution::default();
    for task in &tasks {
        match task.priority {
            Priority::Low => dist.low += 1,
            Priority::Medium => dist.medium += 1,
            Priority::High => dist.high += 1,
            Priority::Urgent => dist.urgent += 1,
        }
    }
    Ok(dist)
}

/// Throughput, lead time, and composite score for the trailing period, with
/// period-over-period trends. Personal scope considers assigned tasks only.
pub async fn productivity(
    db: &Database,
    clock: &dyn Clock,
    caller_id: i64,
    scope: Scope,
    days: u32,
) -> Result<ProductivityMetrics> {
    let window = Window::new(days)?;
    let now = clock.now_utc();
    let (cur_start, cur_end) = window.period_bounds(now);
    let (prev_start, prev_end) = window.prev_period_bounds(now);

    let filter = EventFilter::completions(ActorScope::for_assigned_work(scope, caller_id));

    let (current, previous, total_completed) = db
        .reader()
        .call(move |conn| {
            let cur_range = TimeRange::new(cur_start, cur_end);
            let prev_range = TimeRange::new(prev_start, prev_end);
            let current = repository::list_events(conn, &filter, &cur_range, true)?;
            let previous = repository::list_events(conn, &filter, &prev_range, true)?;
            let total = repository::count_events(conn, &filter, None)?;
            Ok::<_, rusqlite::Error>((current, previous, total))
        })
        .await
        .map_err(Error::unavailable)?;

    let completed_this_period = current.len() as i64;
    let completed_prev_period = previous.len() as i64;
    let avg_lead = avg_lead_days(&current);
    let prev_avg_lead = avg_lead_days(&previous);

    // One shared helper drives both labels so they cannot drift.
    let throughput_trend = score::trend_pct(completed_this_period, completed_prev_period);

    Ok(ProductivityMetrics {
        completed_this_period,
        avg_lead_time_days: round1(avg_lead),
        total_completed,
        performance_score: score::performance_score(completed_this_period, avg_lead, days),
        throughput_trend_pct: throughput_trend,
        lead_time_trend_pct: score::lead_time_trend_pct(avg_lead, prev_avg_lead),
        productivity_trend_pct: throughput_trend,
    })
}

/// Mean lead time in fractional days over a set of completion events, 0 when
/// the set is empty. Events without joined task metadata contribute zero.
fn avg_lead_days(completions: &[EventRow]) -> f64 {
    if completions.is_empty() {
        return 0.0;
    }
    let sum: f64 = completions
        .iter()
        .map(|row| match row.task_created_at {
            Some(created) => days_between(created, row.event.created_at),
            None => 0.0,
        })
        .sum();
    sum / completions.len() as f64
}

/// Average dwell time per workflow status over the 30 most-recently-completed
/// tasks in scope.
pub async fn status_efficiency(
    db: &Database,
    caller_id: i64,
    scope: Scope,
) -> Result<Vec<EfficiencyRow>> {
    let actor = ActorScope::for_assigned_work(scope, caller_id);
    let tasks = db
        .reader()
        .call(move |conn| {
            repository::list_recent_completed_with_history(conn, actor, EFFICIENCY_SAMPLE)
        })
        .await
        .map_err(Error::unavailable)?;

    let mut acc = DwellAccumulator::default();
    for task in &tasks {
        acc.add_history(&task.history);
    }
    Ok(acc.rows())
}

/// Completion counts per calendar date over the trailing 90 days. Dates with
/// zero completions are omitted, unlike the trend series.
pub async fn completion_heatmap(
    db: &Database,
    clock: &dyn Clock,
    caller_id: i64,
    scope: Scope,
) -> Result<Vec<HeatmapPoint>> {
    let now = clock.now_utc();
    let range = TimeRange::new(now - Duration::days(HEATMAP_DAYS), now);
    let filter = EventFilter::completions(ActorScope::for_assigned_work(scope, caller_id));

    let days = db
        .reader()
        .call(move |conn| repository::group_events_by_day(conn, &filter, &range))
        .await
        .map_err(Error::unavailable)?;

    Ok(days
        .into_iter()
        .map(|(date, count)| HeatmapPoint { date, count })
        .collect())
}

/// The deterministic insight feed: fixed-order rules over the other
/// aggregates, truncated to four observations.
pub async fn insight_feed(
    db: &Database,
    clock: &dyn Clock,
    caller_id: i64,
    scope: Scope,
    days: u32,
) -> Result<Vec<String>> {
    let metrics = productivity(db, clock, caller_id, scope, days).await?;
    let tasks = active_tasks(db, ActorScope::for_active_tasks(scope, caller_id)).await?;

    Ok(insights::generate(&InsightInputs {
        scope,
        now: clock.now_utc(),
        active_tasks: &tasks,
        completed_this_period: metrics.completed_this_period,
        performance_score: metrics.performance_score,
    }))
}

/// Assemble the full dashboard. The sub-queries are independent read-only
/// aggregates, so they are dispatched concurrently; either all of them
/// complete or the call fails as a whole — partial results are never
/// returned. Callers degrade to [`Dashboard::fallback`] on failure.
pub async fn dashboard(
    db: &Database,
    clock: &dyn Clock,
    caller_id: i64,
    scope: Scope,
    days: u32,
) -> Result<Dashboard> {
    let (trends, distribution, productivity, efficiency, heatmap, active) = tokio::try_join!(
        completion_trends(db, clock, caller_id, scope, days),
        priority_distribution(db, caller_id, scope),
        self::productivity(db, clock, caller_id, scope, days),
        status_efficiency(db, caller_id, scope),
        completion_heatmap(db, clock, caller_id, scope),
        active_tasks(db, ActorScope::for_active_tasks(scope, caller_id)),
    )?;

    let insights = insights::generate(&InsightInputs {
        scope,
        now: clock.now_utc(),
        active_tasks: &active,
        completed_this_period: productivity.completed_this_period,
        performance_score: productivity.performance_score,
    });

    Ok(Dashboard {
        trends,
        distribution,
        productivity,
        efficiency,
        heatmap,
        insights,
    })
}

async fn active_tasks(db: &Database, actor: ActorScope) -> Result<Vec<TaskRecord>> {
    db.reader()
        .call(move |conn| {
            repository::list_tasks(
                conn,
                &TaskFilter {
                    active_only: true,
                    actor,
                },
            )
        })
        .await
        .map_err(Error::unavailable)
}
