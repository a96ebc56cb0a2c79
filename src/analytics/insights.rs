//! Deterministic rule engine turning computed aggregates into a short feed of
//! natural-language observations.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::model::{Priority, Scope, TaskRecord};

/// Aggregates the rules read. All fields are snapshots computed by the
/// engine for the same request; the generator itself touches no storage.
#[derive(Debug)]
pub struct InsightInputs<'a> {
    pub scope: Scope,
    pub now: DateTime<Utc>,
    /// Active tasks in creator-or-assignee scope.
    pub active_tasks: &'a [TaskRecord],
    pub completed_this_period: i64,
    pub performance_score: i64,
}

/// At most this many observations are surfaced, in rule order — earlier rules
/// win, the list is never re-sorted by importance.
const MAX_INSIGHTS: usize = 4;

/// Evaluate the rules in fixed order; each appends at most one message.
/// Identical inputs always produce an identical ordered list.
pub fn generate(inputs: &InsightInputs) -> Vec<String> {
    let mut out = Vec::new();

    // 1. Overdue active tasks
    let overdue = inputs
        .active_tasks
        .iter()
        .filter(|t| t.due_date.is_some_and(|due| due < inputs.now))
        .count();
    if overdue > 0 {
        let msg = match inputs.scope {
            Scope::Personal => {
                let verb = if overdue == 1 { "needs" } else { "need" };
                format!(
                    "You have {overdue} overdue {} that {verb} attention.",
                    plural(overdue, "task")
                )
            }
            Scope::Global => {
                let there = if overdue == 1 { "There is" } else { "There are" };
                format!(
                    "{there} {overdue} overdue {} across the team.",
                    plural(overdue, "task")
                )
            }
        };
        out.push(msg);
    }

    // 2. Throughput vs. a baseline of 5 completions per period
    if inputs.completed_this_period > 10 {
        let pct = (inputs.completed_this_period as f64 / 5.0 * 100.0).round() as i64;
        out.push(format!(
            "Throughput is running {pct}% above baseline this period."
        ));
    } else if inputs.completed_this_period > 0 {
        out.push(format!(
            "Momentum is building: {} {} completed this period.",
            inputs.completed_this_period,
            plural(inputs.completed_this_period as usize, "task")
        ));
    }

    // 3. Elite performance tier
    if inputs.performance_score > 800 {
        out.push("Elite consistency: performance is in the top tier.".to_string());
    }

    // 4. Urgent work pending
    let urgent = inputs
        .active_tasks
        .iter()
        .filter(|t| t.priority == Priority::Urgent)
        .count();
    if urgent > 0 {
        out.push(format!(
            "{urgent} urgent {} immediate focus.",
            if urgent == 1 {
                "task requires"
            } else {
                "tasks require"
            }
        ));
    }

    // 5. Org-wide activity (global scope only)
    if inputs.scope == Scope::Global {
        let assignees: HashSet<i64> = inputs
            .active_tasks
            .iter()
            .filter_map(|t| t.assignee_id)
            .collect();
        if !assignees.is_empty() {
            out.push(format!(
                "{} team {} active work in flight.",
                assignees.len(),
                if assignees.len() == 1 {
                    "member has"
                } else {
                    "members have"
                }
            ));
        }
    }

    out.truncate(MAX_INSIGHTS);
    out
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}
