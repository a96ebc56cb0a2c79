use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Task priority, stored as an uppercase string in the `tasks` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            other => Err(Error::invalid(format!("unknown priority: {other}"))),
        }
    }
}

/// Workflow status, stored as an uppercase string in the `tasks` table and in
/// `task_events.new_value` for `status_changed` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Todo,
    InProgress,
    Review,
    Completed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "TODO",
            Status::InProgress => "IN_PROGRESS",
            Status::Review => "REVIEW",
            Status::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "TODO" => Ok(Status::Todo),
            "IN_PROGRESS" => Ok(Status::InProgress),
            "REVIEW" => Ok(Status::Review),
            "COMPLETED" => Ok(Status::Completed),
            other => Err(Error::invalid(format!("unknown status: {other}"))),
        }
    }
}

/// Lifecycle event action. The log is free-form; actions the engine does not
/// recognize are preserved as `Other` and ignored by the aggregators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Created,
    StatusChanged,
    Other(String),
}

impl EventAction {
    pub const CREATED: &'static str = "created";
    pub const STATUS_CHANGED: &'static str = "status_changed";

    pub fn as_str(&self) -> &str {
        match self {
            EventAction::Created => Self::CREATED,
            EventAction::StatusChanged => Self::STATUS_CHANGED,
            EventAction::Other(s) => s,
        }
    }

    pub fn from_db(s: &str) -> Self {
        match s {
            Self::CREATED => EventAction::Created,
            Self::STATUS_CHANGED => EventAction::StatusChanged,
            other => EventAction::Other(other.to_string()),
        }
    }
}

/// Whether an aggregate covers one caller's own tasks or the whole org.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Personal,
    Global,
}

impl Scope {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "personal" => Ok(Scope::Personal),
            "global" => Ok(Scope::Global),
            other => Err(Error::invalid(format!("unknown scope: {other}"))),
        }
    }
}

/// A current task snapshot, as read from the `tasks` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    pub creator_id: i64,
    pub assignee_id: Option<i64>,
    pub priority: Priority,
    pub status: Status,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One row of the append-only task lifecycle log. Immutable once written;
/// ordering within a task is by `created_at` ascending.
#[derive(Debug, Clone)]
pub struct HistoryEvent {
    pub id: i64,
    pub task_id: i64,
    pub action: EventAction,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A completed task joined with its full ordered event history.
#[derive(Debug, Clone)]
pub struct TaskWithHistory {
    pub task: TaskRecord,
    pub history: Vec<HistoryEvent>,
}

/// One lifecycle event as it appears in an import file.
#[derive(Debug, Clone, Deserialize)]
pub struct EventImport {
    pub action: String,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A task snapshot plus its event history, as exported by the task tracker.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskImport {
    #[serde(flatten)]
    pub task: TaskRecord,
    #[serde(default)]
    pub events: Vec<EventImport>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_round_trip() {
        for p in [Priority::Low, Priority::Medium, Priority::High, Priority::Urgent] {
            assert_eq!(Priority::parse(p.as_str()).unwrap(), p);
        }
        assert!(Priority::parse("CRITICAL").is_err());
    }

    #[test]
    fn test_status_round_trip() {
        for s in [Status::Todo, Status::InProgress, Status::Review, Status::Completed] {
            assert_eq!(Status::parse(s.as_str()).unwrap(), s);
        }
        assert!(Status::parse("DONE").is_err());
    }

    #[test]
    fn test_event_action_preserves_unknown() {
        assert_eq!(EventAction::from_db("created"), EventAction::Created);
        assert_eq!(EventAction::from_db("status_changed"), EventAction::StatusChanged);
        let other = EventAction::from_db("priority_changed");
        assert_eq!(other, EventAction::Other("priority_changed".to_string()));
        assert_eq!(other.as_str(), "priority_changed");
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(Scope::parse("personal").unwrap(), Scope::Personal);
        assert_eq!(Scope::parse("GLOBAL").unwrap(), Scope::Global);
        match Scope::parse("team") {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("expected InvalidArgument, got {other:?}"),
        }
    }
}
