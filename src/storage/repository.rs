use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::analytics::scope::ActorScope;
use crate::date_util::ts;
use crate::model::{
    EventAction, HistoryEvent, Priority, Status, TaskRecord, TaskWithHistory,
};

/// Half-open instant range `[start, end)`.
#[derive(Debug, Clone, Copy)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Predicate over the event log. `action`/`new_value` match columns on the
/// event row; `actor` restricts via the joined task's creator/assignee.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter<'a> {
    pub action: Option<&'a str>,
    pub new_value: Option<&'a str>,
    pub actor: ActorScope,
}

impl EventFilter<'_> {
    /// `status_changed` events that moved a task into COMPLETED.
    pub fn completions(actor: ActorScope) -> Self {
        Self {
            action: Some(EventAction::STATUS_CHANGED),
            new_value: Some(Status::Completed.as_str()),
            actor,
        }
    }

    /// Task creation events.
    pub fn creations(actor: ActorScope) -> Self {
        Self {
            action: Some(EventAction::CREATED),
            new_value: None,
            actor,
        }
    }
}

/// Predicate over task snapshots.
#[derive(Debug, Clone, Copy)]
pub struct TaskFilter {
    pub active_only: bool,
    pub actor: ActorScope,
}

/// An event row, optionally joined with its task's creation time
/// (needed for lead-time computation).
#[derive(Debug, Clone)]
pub struct EventRow {
    pub event: HistoryEvent,
    pub task_created_at: Option<DateTime<Utc>>,
}

/// Row counts and log bounds for the status command.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoreStats {
    pub task_count: i64,
    pub event_count: i64,
    pub first_event_at: Option<String>,
    pub last_event_at: Option<String>,
}

fn parse_ts(s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn conv_err(e: crate::error::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}

// ── Event queries ──────────────────────────────────────────────────

/// WHERE fragment for an event query; placeholder indices line up with the
/// bind order in `bind_event_params`.
fn event_where(filter: &EventFilter, range: Option<&TimeRange>) -> String {
    let mut clause = String::new();
    let mut idx = 1;
    if filter.action.is_some() {
        clause.push_str(&format!(" AND e.action = ?{idx}"));
        idx += 1;
    }
    if filter.new_value.is_some() {
        clause.push_str(&format!(" AND e.new_value = ?{idx}"));
        idx += 1;
    }
    if range.is_some() {
        clause.push_str(&format!(
            " AND e.created_at >= ?{idx} AND e.created_at < ?{}",
            idx + 1
        ));
        idx += 2;
    }
    clause.push_str(&filter.actor.where_clause(idx));
    clause
}

fn bind_event_params(
    stmt: &mut rusqlite::Statement<'_>,
    filter: &EventFilter,
    range: Option<&TimeRange>,
) -> rusqlite::Result<()> {
    let mut idx = 1;
    if let Some(action) = filter.action {
        stmt.raw_bind_parameter(idx, action)?;
        idx += 1;
    }
    if let Some(value) = filter.new_value {
        stmt.raw_bind_parameter(idx, value)?;
        idx += 1;
    }
    if let Some(range) = range {
        stmt.raw_bind_parameter(idx, ts(range.start))?;
        stmt.raw_bind_parameter(idx + 1, ts(range.end))?;
        idx += 2;
    }
    filter.actor.bind(stmt, idx)?;
    Ok(())
}

/// Count events matching the filter, optionally restricted to a range.
pub fn count_events(
    conn: &Connection,
    filter: &EventFilter,
    range: Option<&TimeRange>,
) -> rusqlite::Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM task_events e JOIN tasks t ON t.task_id = e.task_id
         WHERE 1=1{}",
        event_where(filter, range)
    );
    let mut stmt = conn.prepare(&sql)?;
    bind_event_params(&mut stmt, filter, range)?;
    let mut rows = stmt.raw_query();
    let row = rows.next()?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
    row.get(0)
}

/// Count matching events per UTC calendar day. Days with zero matches are
/// absent from the result; callers needing a dense day skeleton fill it in.
pub fn group_events_by_day(
    conn: &Connection,
    filter: &EventFilter,
    range: &TimeRange,
) -> rusqlite::Result<Vec<(NaiveDate, i64)>> {
    let sql = format!(
        "SELECT date(e.created_at), COUNT(*)
         FROM task_events e JOIN tasks t ON t.task_id = e.task_id
         WHERE 1=1{}
         GROUP BY date(e.created_at)
         ORDER BY date(e.created_at)",
        event_where(filter, Some(range))
    );
    let mut stmt = conn.prepare(&sql)?;
    bind_event_params(&mut stmt, filter, Some(range))?;

    let mut out = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let day: String = row.get(0)?;
        let count: i64 = row.get(1)?;
        let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        out.push((date, count));
    }
    Ok(out)
}

/// List matching events in chronological order. With `include_task_meta` the
/// owning task's `created_at` is joined in for lead-time math.
pub fn list_events(
    conn: &Connection,
    filter: &EventFilter,
    range: &TimeRange,
    include_task_meta: bool,
) -> rusqlite::Result<Vec<EventRow>> {
    let task_col = if include_task_meta {
        ", t.created_at"
    } else {
        ""
    };
    let sql = format!(
        "SELECT e.event_id, e.task_id, e.action, e.old_value, e.new_value, e.created_at{task_col}
         FROM task_events e JOIN tasks t ON t.task_id = e.task_id
         WHERE 1=1{}
         ORDER BY e.created_at",
        event_where(filter, Some(range))
    );
    let mut stmt = conn.prepare(&sql)?;
    bind_event_params(&mut stmt, filter, Some(range))?;

    let mut out = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        let action: String = row.get(2)?;
        let created: String = row.get(5)?;
        let task_created_at = if include_task_meta {
            let s: String = row.get(6)?;
            Some(parse_ts(&s)?)
        } else {
            None
        };
        out.push(EventRow {
            event: HistoryEvent {
                id: row.get(0)?,
                task_id: row.get(1)?,
                action: EventAction::from_db(&action),
                old_value: row.get(3)?,
                new_value: row.get(4)?,
                created_at: parse_ts(&created)?,
            },
            task_created_at,
        });
    }
    Ok(out)
}

// ── Task queries ───────────────────────────────────────────────────

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<TaskRecord> {
    let priority: String = row.get(4)?;
    let status: String = row.get(5)?;
    let due: Option<String> = row.get(6)?;
    let created: String = row.get(7)?;
    Ok(TaskRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        creator_id: row.get(2)?,
        assignee_id: row.get(3)?,
        priority: Priority::parse(&priority).map_err(conv_err)?,
        status: Status::parse(&status).map_err(conv_err)?,
        due_date: due.as_deref().map(parse_ts).transpose()?,
        created_at: parse_ts(&created)?,
    })
}

const TASK_COLUMNS: &str =
    "t.task_id, t.title, t.creator_id, t.assignee_id, t.priority, t.status, t.due_date, t.created_at";

/// List task snapshots matching the filter.
pub fn list_tasks(conn: &Connection, filter: &TaskFilter) -> rusqlite::Result<Vec<TaskRecord>> {
    let active = if filter.active_only {
        " AND t.status != 'COMPLETED'"
    } else {
        ""
    };
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks t WHERE 1=1{active}{} ORDER BY t.task_id",
        filter.actor.where_clause(1)
    );
    let mut stmt = conn.prepare(&sql)?;
    filter.actor.bind(&mut stmt, 1)?;

    let mut out = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        out.push(row_to_task(row)?);
    }
    Ok(out)
}

/// The `limit` most-recently-completed tasks in scope, each with its full
/// event history in chronological order. Recency is by the task's last
/// COMPLETED transition in the log.
pub fn list_recent_completed_with_history(
    conn: &Connection,
    actor: ActorScope,
    limit: u32,
) -> rusqlite::Result<Vec<TaskWithHistory>> {
    let sql = format!(
        "SELECT {TASK_COLUMNS},
                (SELECT MAX(e.created_at) FROM task_events e
                 WHERE e.task_id = t.task_id
                   AND e.action = 'status_changed'
                   AND e.new_value = 'COMPLETED') AS completed_at
         FROM tasks t
         WHERE t.status = 'COMPLETED'{}
         ORDER BY completed_at DESC
         LIMIT ?{}",
        actor.where_clause(1),
        match actor {
            ActorScope::All => 1,
            ActorScope::Creator(_) | ActorScope::Assignee(_) => 2,
            ActorScope::CreatorOrAssignee(_) => 3,
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let next = actor.bind(&mut stmt, 1)?;
    stmt.raw_bind_parameter(next, limit)?;

    let mut tasks = Vec::new();
    let mut rows = stmt.raw_query();
    while let Some(row) = rows.next()? {
        tasks.push(row_to_task(row)?);
    }
    drop(rows);
    drop(stmt);

    let mut out = Vec::with_capacity(tasks.len());
    for task in tasks {
        let history = task_history(conn, task.id)?;
        out.push(TaskWithHistory { task, history });
    }
    Ok(out)
}

/// A single task's event log, ordered by `created_at` ascending.
pub fn task_history(conn: &Connection, task_id: i64) -> rusqlite::Result<Vec<HistoryEvent>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, task_id, action, old_value, new_value, created_at
         FROM task_events WHERE task_id = ?1
         ORDER BY created_at, event_id",
    )?;
    let events = stmt
        .query_map(params![task_id], |row| {
            let action: String = row.get(2)?;
            let created: String = row.get(5)?;
            Ok(HistoryEvent {
                id: row.get(0)?,
                task_id: row.get(1)?,
                action: EventAction::from_db(&action),
                old_value: row.get(3)?,
                new_value: row.get(4)?,
                created_at: parse_ts(&created)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(events)
}

// ── Ingestion ──────────────────────────────────────────────────────

/// Insert or update a task snapshot. The event log is untouched.
pub fn upsert_task(conn: &Connection, task: &TaskRecord) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO tasks (task_id, title, creator_id, assignee_id, priority, status,
                            due_date, created_at, imported_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
         ON CONFLICT(task_id) DO UPDATE SET
            title=excluded.title, creator_id=excluded.creator_id,
            assignee_id=excluded.assignee_id, priority=excluded.priority,
            status=excluded.status, due_date=excluded.due_date,
            created_at=excluded.created_at, imported_at=excluded.imported_at",
        params![
            task.id,
            task.title,
            task.creator_id,
            task.assignee_id,
            task.priority.as_str(),
            task.status.as_str(),
            task.due_date.map(ts),
            ts(task.created_at),
        ],
    )?;
    Ok(())
}

/// Append one lifecycle event. Insert-only — the log is never updated or
/// deleted through this module.
pub fn record_event(
    conn: &Connection,
    task_id: i64,
    action: &str,
    old_value: Option<&str>,
    new_value: Option<&str>,
    created_at: DateTime<Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO task_events (task_id, action, old_value, new_value, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![task_id, action, old_value, new_value, ts(created_at)],
    )?;
    Ok(())
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value) VALUES (?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> rusqlite::Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}

// ── Status ─────────────────────────────────────────────────────────

pub fn store_stats(conn: &Connection) -> rusqlite::Result<StoreStats> {
    let task_count: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
    let (event_count, first_event_at, last_event_at) = conn.query_row(
        "SELECT COUNT(*), MIN(created_at), MAX(created_at) FROM task_events",
        [],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    Ok(StoreStats {
        task_count,
        event_count,
        first_event_at,
        last_event_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scope;
    use crate::storage::Database;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn task(id: i64, creator: i64, assignee: Option<i64>, status: Status) -> TaskRecord {
        TaskRecord {
            id,
            title: format!("Task {id}"),
            creator_id: creator,
            assignee_id: assignee,
            priority: Priority::Medium,
            status,
            due_date: None,
            created_at: at("2026-03-01T09:00:00Z"),
        }
    }

    async fn seed(db: &Database) {
        db.writer()
            .call(|conn| {
                upsert_task(conn, &task(1, 10, Some(20), Status::Completed))?;
                upsert_task(conn, &task(2, 20, Some(10), Status::InProgress))?;
                upsert_task(conn, &task(3, 30, None, Status::Todo))?;

                record_event(conn, 1, "created", None, None, at("2026-03-01T09:00:00Z"))?;
                record_event(
                    conn,
                    1,
                    "status_changed",
                    Some("TODO"),
                    Some("IN_PROGRESS"),
                    at("2026-03-02T09:00:00Z"),
                )?;
                record_event(
                    conn,
                    1,
                    "status_changed",
                    Some("IN_PROGRESS"),
                    Some("COMPLETED"),
                    at("2026-03-04T09:00:00Z"),
                )?;
                record_event(conn, 2, "created", None, None, at("2026-03-02T10:00:00Z"))?;
                record_event(conn, 3, "created", None, None, at("2026-03-03T11:00:00Z"))?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_count_events_with_scope() {
        let db = Database::open_memory().await.unwrap();
        seed(&db).await;

        db.reader()
            .call(|conn| {
                let all = count_events(conn, &EventFilter::completions(ActorScope::All), None)?;
                assert_eq!(all, 1);

                // Caller 20 is assignee of the completed task
                let mine = count_events(
                    conn,
                    &EventFilter::completions(ActorScope::Assignee(20)),
                    None,
                )?;
                assert_eq!(mine, 1);

                let not_mine = count_events(
                    conn,
                    &EventFilter::completions(ActorScope::Assignee(30)),
                    None,
                )?;
                assert_eq!(not_mine, 0);

                // Creations attributed to creators only
                let created_by_10 = count_events(
                    conn,
                    &EventFilter::creations(ActorScope::Creator(10)),
                    None,
                )?;
                assert_eq!(created_by_10, 1);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_count_events_respects_range() {
        let db = Database::open_memory().await.unwrap();
        seed(&db).await;

        db.reader()
            .call(|conn| {
                let range = TimeRange::new(at("2026-03-02T00:00:00Z"), at("2026-03-03T00:00:00Z"));
                let n = count_events(
                    conn,
                    &EventFilter::creations(ActorScope::All),
                    Some(&range),
                )?;
                assert_eq!(n, 1); // only task 2's creation falls inside
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_group_events_by_day_omits_empty_days() {
        let db = Database::open_memory().await.unwrap();
        seed(&db).await;

        db.reader()
            .call(|conn| {
                let range = TimeRange::new(at("2026-03-01T00:00:00Z"), at("2026-03-10T00:00:00Z"));
                let days =
                    group_events_by_day(conn, &EventFilter::creations(ActorScope::All), &range)?;
                let dates: Vec<String> =
                    days.iter().map(|(d, _)| d.to_string()).collect();
                assert_eq!(dates, vec!["2026-03-01", "2026-03-02", "2026-03-03"]);
                assert!(days.iter().all(|(_, c)| *c == 1));
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_events_joins_task_created_at() {
        let db = Database::open_memory().await.unwrap();
        seed(&db).await;

        db.reader()
            .call(|conn| {
                let range = TimeRange::new(at("2026-03-01T00:00:00Z"), at("2026-03-10T00:00:00Z"));
                let rows = list_events(
                    conn,
                    &EventFilter::completions(ActorScope::All),
                    &range,
                    true,
                )?;
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].event.task_id, 1);
                assert_eq!(rows[0].task_created_at, Some(at("2026-03-01T09:00:00Z")));
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_tasks_active_only() {
        let db = Database::open_memory().await.unwrap();
        seed(&db).await;

        db.reader()
            .call(|conn| {
                let active = list_tasks(
                    conn,
                    &TaskFilter {
                        active_only: true,
                        actor: ActorScope::All,
                    },
                )?;
                assert_eq!(active.len(), 2);
                assert!(active.iter().all(|t| t.status != Status::Completed));

                let mine = list_tasks(
                    conn,
                    &TaskFilter {
                        active_only: true,
                        actor: ActorScope::for_active_tasks(Scope::Personal, 10),
                    },
                )?;
                // Caller 10 is assignee of task 2, creator of task 1 (completed)
                assert_eq!(mine.len(), 1);
                assert_eq!(mine[0].id, 2);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_recent_completed_with_history_ordering() {
        let db = Database::open_memory().await.unwrap();
        seed(&db).await;

        // A second completed task, finished later than task 1
        db.writer()
            .call(|conn| {
                upsert_task(conn, &task(4, 10, Some(20), Status::Completed))?;
                record_event(conn, 4, "created", None, None, at("2026-03-05T09:00:00Z"))?;
                record_event(
                    conn,
                    4,
                    "status_changed",
                    Some("TODO"),
                    Some("COMPLETED"),
                    at("2026-03-06T09:00:00Z"),
                )?;
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();

        db.reader()
            .call(|conn| {
                let recent = list_recent_completed_with_history(conn, ActorScope::All, 30)?;
                assert_eq!(recent.len(), 2);
                assert_eq!(recent[0].task.id, 4); // most recent completion first
                assert_eq!(recent[1].task.id, 1);
                assert_eq!(recent[1].history.len(), 3);
                assert!(recent[1]
                    .history
                    .windows(2)
                    .all(|w| w[0].created_at <= w[1].created_at));

                let limited = list_recent_completed_with_history(conn, ActorScope::All, 1)?;
                assert_eq!(limited.len(), 1);
                assert_eq!(limited[0].task.id, 4);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_config_round_trip() {
        let db = Database::open_memory().await.unwrap();
        db.writer()
            .call(|conn| {
                assert_eq!(get_config(conn, "user_id")?, None);
                set_config(conn, "user_id", "42")?;
                assert_eq!(get_config(conn, "user_id")?, Some("42".to_string()));
                set_config(conn, "user_id", "43")?;
                assert_eq!(get_config(conn, "user_id")?, Some("43".to_string()));
                assert_eq!(list_config(conn)?.len(), 1);
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_store_stats() {
        let db = Database::open_memory().await.unwrap();
        seed(&db).await;

        let stats = db.reader().call(|conn| store_stats(conn)).await.unwrap();
        assert_eq!(stats.task_count, 3);
        assert_eq!(stats.event_count, 5);
        assert_eq!(stats.first_event_at.as_deref(), Some("2026-03-01T09:00:00Z"));
        assert_eq!(stats.last_event_at.as_deref(), Some("2026-03-04T09:00:00Z"));
    }
}
