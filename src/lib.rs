pub mod analytics;
pub mod clock;
pub mod date_util;
pub mod error;
pub mod model;
pub mod storage;
pub mod window;

pub use analytics::{
    Dashboard, EfficiencyRow, HeatmapPoint, PriorityDistribution, ProductivityMetrics, TrendPoint,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use model::{
    EventAction, HistoryEvent, Priority, Scope, Status, TaskImport, TaskRecord,
};
pub use storage::Database;
pub use window::Window;

// Re-export repository types needed by the binary crate, but not the module itself
pub use storage::repository::StoreStats;

use std::sync::Arc;

use storage::repository;

/// What an import run touched.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct ImportReport {
    pub tasks: usize,
    pub events: usize,
}

/// Main entry point: the analytics engine over a local task store.
///
/// All aggregate methods are pure functions of the store contents and the
/// injected clock; nothing is cached between calls.
pub struct TaskPulse {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl TaskPulse {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    /// Construct with an explicit clock (fixed in tests).
    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Analytics ──────────────────────────────────────────────────

    pub async fn completion_trends(
        &self,
        caller_id: i64,
        scope: Scope,
        days: u32,
    ) -> Result<Vec<TrendPoint>> {
        analytics::completion_trends(&self.db, &*self.clock, caller_id, scope, days).await
    }

    pub async fn priority_distribution(
        &self,
        caller_id: i64,
        scope: Scope,
    ) -> Result<PriorityDistribution> {
        analytics::priority_distribution(&self.db, caller_id, scope).await
    }

    pub async fn productivity(
        &self,
        caller_id: i64,
        scope: Scope,
        days: u32,
    ) -> Result<ProductivityMetrics> {
        analytics::productivity(&self.db, &*self.clock, caller_id, scope, days).await
    }

    pub async fn status_efficiency(
        &self,
        caller_id: i64,
        scope: Scope,
    ) -> Result<Vec<EfficiencyRow>> {
        analytics::status_efficiency(&self.db, caller_id, scope).await
    }

    pub async fn completion_heatmap(
        &self,
        caller_id: i64,
        scope: Scope,
    ) -> Result<Vec<HeatmapPoint>> {
        analytics::completion_heatmap(&self.db, &*self.clock, caller_id, scope).await
    }

    pub async fn insight_feed(
        &self,
        caller_id: i64,
        scope: Scope,
        days: u32,
    ) -> Result<Vec<String>> {
        analytics::insight_feed(&self.db, &*self.clock, caller_id, scope, days).await
    }

    pub async fn dashboard(&self, caller_id: i64, scope: Scope, days: u32) -> Result<Dashboard> {
        analytics::dashboard(&self.db, &*self.clock, caller_id, scope, days).await
    }

    // ── Ingestion ──────────────────────────────────────────────────

    /// Ingest exported tasks with their event histories, atomically.
    /// Task snapshots are upserted; events are appended as given — importing
    /// the same export twice duplicates its events.
    pub async fn import_tasks(&self, imports: Vec<TaskImport>) -> Result<ImportReport> {
        let report = self
            .db
            .writer()
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut events = 0usize;
                for import in &imports {
                    repository::upsert_task(&tx, &import.task)?;
                    for event in &import.events {
                        repository::record_event(
                            &tx,
                            import.task.id,
                            &event.action,
                            event.old_value.as_deref(),
                            event.new_value.as_deref(),
                            event.created_at,
                        )?;
                        events += 1;
                    }
                }
                tx.commit()?;
                Ok::<ImportReport, rusqlite::Error>(ImportReport {
                    tasks: imports.len(),
                    events,
                })
            })
            .await?;
        Ok(report)
    }

    // ── Config ─────────────────────────────────────────────────────

    /// The caller id used when the CLI is invoked without `--user`.
    pub async fn default_user_id(&self) -> Result<Option<i64>> {
        let raw = self.config_get("user_id").await?;
        raw.map(|s| {
            s.parse::<i64>()
                .map_err(|_| Error::Config(format!("user_id is not numeric: {s}")))
        })
        .transpose()
    }

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        self.db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .writer()
            .call({
                let key = key.to_string();
                let value = value.to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        self.db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }

    // ── Status ─────────────────────────────────────────────────────

    pub async fn store_stats(&self) -> Result<StoreStats> {
        self.db
            .reader()
            .call(|conn| repository::store_stats(conn))
            .await
            .map_err(|e| Error::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_import_and_query() {
        let db = Database::open_memory().await.unwrap();
        let engine = TaskPulse::with_clock(
            db,
            Arc::new(FixedClock("2026-03-20T12:00:00Z".parse().unwrap())),
        );

        let imports: Vec<TaskImport> = serde_json::from_str(
            r#"[
                {
                    "id": 1,
                    "title": "Ship the release",
                    "creator_id": 10,
                    "assignee_id": 20,
                    "priority": "HIGH",
                    "status": "COMPLETED",
                    "due_date": null,
                    "created_at": "2026-03-16T00:00:00Z",
                    "events": [
                        {"action": "created", "created_at": "2026-03-16T00:00:00Z"},
                        {"action": "status_changed", "old_value": "TODO",
                         "new_value": "COMPLETED", "created_at": "2026-03-18T00:00:00Z"}
                    ]
                }
            ]"#,
        )
        .unwrap();

        let report = engine.import_tasks(imports).await.unwrap();
        assert_eq!(report.tasks, 1);
        assert_eq!(report.events, 2);

        let stats = engine.store_stats().await.unwrap();
        assert_eq!(stats.task_count, 1);
        assert_eq!(stats.event_count, 2);

        let metrics = engine.productivity(20, Scope::Personal, 7).await.unwrap();
        assert_eq!(metrics.completed_this_period, 1);
        assert_eq!(metrics.avg_lead_time_days, 2.0);
    }

    #[tokio::test]
    async fn test_default_user_id() {
        let db = Database::open_memory().await.unwrap();
        let engine = TaskPulse::new(db);

        assert_eq!(engine.default_user_id().await.unwrap(), None);
        engine.config_set("user_id", "42").await.unwrap();
        assert_eq!(engine.default_user_id().await.unwrap(), Some(42));

        engine.config_set("user_id", "alice").await.unwrap();
        assert!(engine.default_user_id().await.is_err());
    }
}
