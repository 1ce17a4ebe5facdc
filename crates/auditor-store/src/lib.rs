//! Embedded persistent spill store (§4.C): makes the in-flight submission
//! queue crash-safe by mirroring every accepted, unclaimed [`Task`] to a
//! single SQLite file.

mod task;

pub use task::{Instruction, Task};

use anyhow::{Context, Result};
use auditor_record::Record;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

/// Owns the single SQLite file backing the queue's durability. Only one
/// owner mutates it at a time — no cross-process concurrency is needed
/// (§4.C).
pub struct SpillStore {
    pool: SqlitePool,
}

impl SpillStore {
    /// Opens (creating if absent) the spill file at `path` and applies
    /// migrations.
    pub async fn start(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{path}"))
            .with_context(|| format!("invalid spill store path {path}"))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("failed to open spill store")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("spill store migrate failed")?;

        Ok(Self { pool })
    }

    /// Flushes and releases the underlying connection pool.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Inserts or replaces a row by its `(record_id, site_id, instruction)`
    /// primary key. Committed before returning (§4.C durability).
    pub async fn put(&self, task: &Task) -> Result<()> {
        let record_blob = task.record.as_json();
        sqlx::query(
            r#"
            insert into tasks (record_id, site_id, instruction, record_blob, retries_remaining, retries_total, scheduled_after)
            values (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            on conflict (record_id, site_id, instruction) do update set
                record_blob = excluded.record_blob,
                retries_remaining = excluded.retries_remaining,
                retries_total = excluded.retries_total,
                scheduled_after = excluded.scheduled_after
            "#,
        )
        .bind(task.record_id())
        .bind(task.site_id())
        .bind(task.instruction.as_str())
        .bind(record_blob)
        .bind(task.retries_remaining as i64)
        .bind(task.retries_total as i64)
        .bind(task.scheduled_after)
        .execute(&self.pool)
        .await
        .context("spill store put failed")?;
        Ok(())
    }

    pub async fn delete(&self, record_id: &str, site_id: &str, instruction: Instruction) -> Result<()> {
        sqlx::query(
            "delete from tasks where record_id = ?1 and site_id = ?2 and instruction = ?3",
        )
        .bind(record_id)
        .bind(site_id)
        .bind(instruction.as_str())
        .execute(&self.pool)
        .await
        .context("spill store delete failed")?;
        Ok(())
    }

    /// Returns every row in the store. A row that fails to parse (malformed
    /// `record_blob` JSON, or an unrecognized `instruction` tag) is logged
    /// and skipped rather than aborting start-up (§4.C failure semantics).
    pub async fn get_all(&self) -> Result<Vec<Task>> {
        let rows = sqlx::query(
            "select record_id, site_id, instruction, record_blob, retries_remaining, retries_total, scheduled_after from tasks",
        )
        .fetch_all(&self.pool)
        .await
        .context("spill store get_all failed")?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in rows {
            let record_id: String = row.get("record_id");
            let instruction_tag: String = row.get("instruction");
            let record_blob: String = row.get("record_blob");
            let retries_remaining: i64 = row.get("retries_remaining");
            let retries_total: i64 = row.get("retries_total");
            let scheduled_after: Option<DateTime<Utc>> = row.get("scheduled_after");

            let Some(instruction) = Instruction::from_str(&instruction_tag) else {
                tracing::warn!(record_id, instruction_tag, "skipping row with unrecognized instruction");
                continue;
            };

            let record = match Record::from_json_str(&record_blob) {
                Ok(record) => record,
                Err(err) => {
                    tracing::warn!(record_id, %err, "skipping corrupted spill store row");
                    continue;
                }
            };

            tasks.push(Task {
                record,
                instruction,
                retries_remaining: retries_remaining.max(0) as u32,
                retries_total: retries_total.max(0) as u32,
                scheduled_after,
            });
        }
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditor_record::Record;
    use chrono::TimeZone;

    fn sample_task(id: &str, instruction: Instruction) -> Task {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Task::new(Record::new(id, start), instruction, 3)
    }

    #[tokio::test]
    async fn put_then_get_all_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let store = SpillStore::start(path.to_str().unwrap()).await.unwrap();

        let task = sample_task("rec-1", Instruction::Add);
        store.put(&task).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].record_id(), "rec-1");
        assert_eq!(all[0].instruction, Instruction::Add);

        store.close().await;
    }

    #[tokio::test]
    async fn put_replaces_by_primary_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let store = SpillStore::start(path.to_str().unwrap()).await.unwrap();

        let mut task = sample_task("rec-1", Instruction::Add);
        store.put(&task).await.unwrap();
        task.retries_remaining = 1;
        store.put(&task).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].retries_remaining, 1);
    }

    #[tokio::test]
    async fn delete_removes_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let store = SpillStore::start(path.to_str().unwrap()).await.unwrap();

        let task = sample_task("rec-1", Instruction::Add);
        store.put(&task).await.unwrap();
        store.delete("rec-1", task.site_id(), Instruction::Add).await.unwrap();

        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn distinct_instructions_are_distinct_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");
        let store = SpillStore::start(path.to_str().unwrap()).await.unwrap();

        store.put(&sample_task("rec-1", Instruction::Add)).await.unwrap();
        store.put(&sample_task("rec-1", Instruction::Update)).await.unwrap();

        assert_eq!(store.get_all().await.unwrap().len(), 2);
    }
}
