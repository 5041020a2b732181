use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ImageThumbnail,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::ImageThumbnail => "image_thumbnail",
        }
    }
}

/// A unit of deferred work picked up by the queue worker.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProcessingJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub attempts: i32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcessingJob {
    pub async fn enqueue<'e>(
        executor: impl PgExecutor<'e>,
        kind: JobKind,
        payload: serde_json::Value,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO processing_jobs (kind, payload)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(kind.as_str())
        .bind(payload)
        .fetch_one(executor)
        .await
    }

    /// Claims up to `batch_size` pending jobs for this worker pass, flipping
    /// them to running. SKIP LOCKED keeps concurrent workers off the same
    /// rows.
    pub async fn claim_batch(pool: &PgPool, batch_size: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE processing_jobs
            SET status = 'running', attempts = attempts + 1, updated_at = NOW()
            WHERE id IN (
                SELECT id FROM processing_jobs
                WHERE status = 'pending'
                ORDER BY created_at
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(batch_size)
        .fetch_all(pool)
        .await
    }

    pub async fn mark_done(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE processing_jobs SET status = 'done', last_error = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns the job to pending for a retry, or fails it for good once
    /// the attempt budget is spent.
    pub async fn mark_failed(
        pool: &PgPool,
        id: Uuid,
        error: &str,
        max_attempts: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE processing_jobs
            SET status = CASE WHEN attempts >= $3 THEN 'failed' ELSE 'pending' END,
                last_error = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .bind(max_attempts)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// The admin "restart queue" action: anything stuck in running longer
    /// than `stuck_minutes` goes back to pending.
    pub async fn reset_stuck(pool: &PgPool, stuck_minutes: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE processing_jobs
            SET status = 'pending', updated_at = NOW()
            WHERE status = 'running'
              AND updated_at < NOW() - make_interval(mins => $1::int)
            "#,
        )
        .bind(stuck_minutes)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn counts_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM processing_jobs GROUP BY status",
        )
        .fetch_all(pool)
        .await
    }
}
