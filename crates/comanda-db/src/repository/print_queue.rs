//! # Print Queue Repository
//!
//! Outbox of print jobs. The engine only appends; a separate consumer renders
//! and dispatches.
//!
//! ## The Outbox Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  close_order                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   SINGLE TRANSACTION                            │   │
//! │  │  1. orders / tables / ingredients / customers documents         │   │
//! │  │  2. INSERT INTO print_jobs (job_type, printer_name, payload)    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ← receipt exists iff the sale exists                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  PRINT CONSUMER                                                        │
//! │  1. SELECT ... WHERE printed_at IS NULL ORDER BY created_at            │
//! │  2. success → mark_printed   failure → mark_failed (attempts += 1)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use comanda_core::{PrintJob, PrintJobType};

use crate::error::{DbError, DbResult};

/// One queued print job.
#[derive(Debug, Clone, FromRow)]
pub struct PrintQueueEntry {
    pub id: String,
    pub job_type: PrintJobType,
    pub printer_name: String,
    /// The full [`PrintJob`] as JSON.
    pub payload: String,
    pub created_at: DateTime<Utc>,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub printed_at: Option<DateTime<Utc>>,
}

impl PrintQueueEntry {
    /// Decodes the stored job.
    pub fn job(&self) -> DbResult<PrintJob> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

/// Appends a job through any executor (pool or open transaction).
pub(crate) async fn insert_job<'e, E>(
    executor: E,
    job: &PrintJob,
    printer_name: &str,
) -> DbResult<PrintQueueEntry>
where
    E: Executor<'e, Database = Sqlite>,
{
    let entry = PrintQueueEntry {
        id: Uuid::new_v4().to_string(),
        job_type: job.job_type(),
        printer_name: printer_name.to_string(),
        payload: serde_json::to_string(job)?,
        created_at: Utc::now(),
        attempts: 0,
        last_error: None,
        printed_at: None,
    };

    debug!(
        job_id = %entry.id,
        job_type = %entry.job_type,
        printer = %entry.printer_name,
        "Queuing print job"
    );

    sqlx::query(
        r#"
        INSERT INTO print_jobs (id, job_type, printer_name, payload, created_at, attempts)
        VALUES (?1, ?2, ?3, ?4, ?5, 0)
        "#,
    )
    .bind(&entry.id)
    .bind(entry.job_type)
    .bind(&entry.printer_name)
    .bind(&entry.payload)
    .bind(entry.created_at)
    .execute(executor)
    .await?;

    Ok(entry)
}

/// Repository for the print queue.
#[derive(Debug, Clone)]
pub struct PrintQueueRepository {
    pool: SqlitePool,
}

impl PrintQueueRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PrintQueueRepository { pool }
    }

    /// Appends a job outside any transaction (pre-checks, reprints).
    pub async fn enqueue(&self, job: &PrintJob, printer_name: &str) -> DbResult<PrintQueueEntry> {
        insert_job(&self.pool, job, printer_name).await
    }

    /// Jobs not yet printed, oldest first.
    pub async fn get_pending(&self, limit: u32) -> DbResult<Vec<PrintQueueEntry>> {
        let entries = sqlx::query_as::<_, PrintQueueEntry>(
            r#"
            SELECT id, job_type, printer_name, payload, created_at,
                   attempts, last_error, printed_at
            FROM print_jobs
            WHERE printed_at IS NULL
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    pub async fn mark_printed(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE print_jobs SET printed_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Print job", id));
        }
        Ok(())
    }

    /// Records a dispatch failure; the job stays pending.
    pub async fn mark_failed(&self, id: &str, error: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE print_jobs SET
                attempts = attempts + 1,
                last_error = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Print job", id));
        }
        Ok(())
    }

    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM print_jobs WHERE printed_at IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use comanda_core::print::ShiftReportPayload;
    use comanda_core::Money;

    fn shift_report() -> PrintJob {
        PrintJob::ShiftReport(ShiftReportPayload {
            register_id: "reg-1".to_string(),
            opened_at: Utc::now(),
            closed_at: Utc::now(),
            starting_cash: Money::from_cents(10_000),
            expected_cash: Money::from_cents(25_000),
            counted_cash: Money::from_cents(24_900),
        })
    }

    #[tokio::test]
    async fn test_enqueue_and_read_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let queue = db.print_queue();

        let entry = queue.enqueue(&shift_report(), "office").await.unwrap();
        assert_eq!(entry.job_type, PrintJobType::ShiftReport);

        let pending = queue.get_pending(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].printer_name, "office");
        match pending[0].job().unwrap() {
            PrintJob::ShiftReport(report) => assert_eq!(report.register_id, "reg-1"),
            other => panic!("unexpected job: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_mark_printed_removes_from_pending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let queue = db.print_queue();

        let entry = queue.enqueue(&shift_report(), "office").await.unwrap();
        queue.mark_failed(&entry.id, "paper out").await.unwrap();

        let pending = queue.get_pending(10).await.unwrap();
        assert_eq!(pending[0].attempts, 1);
        assert_eq!(pending[0].last_error.as_deref(), Some("paper out"));

        queue.mark_printed(&entry.id).await.unwrap();
        assert_eq!(queue.count_pending().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mark_unknown_job_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.print_queue().mark_printed("nope").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
