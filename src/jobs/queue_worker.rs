use sqlx::PgPool;
use uuid::Uuid;

use crate::models::image::Image;
use crate::models::processing_job::{JobKind, ProcessingJob};
use crate::services::image_processor;

const MAX_ATTEMPTS: i32 = 3;

#[derive(Debug, Default)]
pub struct WorkerStats {
    pub claimed: usize,
    pub done: usize,
    pub failed: usize,
}

/// One pass of the background queue worker.
///
/// Claims a batch of pending jobs (pending -> running, SKIP LOCKED), runs
/// each and records the outcome. A failing job goes back to pending until
/// its attempt budget runs out, then stays failed with its last error.
pub async fn run_pending_jobs(
    pool: &PgPool,
    batch_size: i64,
) -> Result<WorkerStats, sqlx::Error> {
    let mut stats = WorkerStats::default();

    let jobs = ProcessingJob::claim_batch(pool, batch_size).await?;
    stats.claimed = jobs.len();

    if stats.claimed > 0 {
        tracing::info!(claimed = stats.claimed, "Queue worker pass started");
    }

    for job in jobs {
        match run_single_job(pool, &job).await {
            Ok(()) => {
                ProcessingJob::mark_done(pool, job.id).await?;
                stats.done += 1;
            }
            Err(JobError::Database(e)) => {
                // Leave the job running; the stuck-job reset will reclaim it
                tracing::error!(job_id = %job.id, error = %e, "Database error while running job");
                stats.failed += 1;
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %job.id,
                    attempts = job.attempts,
                    error = %e,
                    "Job failed"
                );
                ProcessingJob::mark_failed(pool, job.id, &e.to_string(), MAX_ATTEMPTS).await?;
                stats.failed += 1;
            }
        }
    }

    if stats.claimed > 0 {
        tracing::info!(?stats, "Queue worker pass completed");
    }

    Ok(stats)
}

#[derive(thiserror::Error, Debug)]
enum JobError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Malformed job payload")]
    BadPayload,

    #[error("Image not found")]
    ImageNotFound,

    #[error("Image processing failed: {0}")]
    Processing(#[from] image_processor::ImageProcessingError),
}

async fn run_single_job(pool: &PgPool, job: &ProcessingJob) -> Result<(), JobError> {
    match job.kind {
        JobKind::ImageThumbnail => {
            let image_id: Uuid = job
                .payload
                .get("image_id")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse().ok())
                .ok_or(JobError::BadPayload)?;

            let image = Image::find_by_id(pool, image_id)
                .await?
                .ok_or(JobError::ImageNotFound)?;

            let thumbnail = image_processor::make_thumbnail(&image.data)?;
            Image::set_thumbnail(pool, image.id, thumbnail).await?;

            tracing::debug!(image_id = %image.id, "Thumbnail generated");
            Ok(())
        }
    }
}
