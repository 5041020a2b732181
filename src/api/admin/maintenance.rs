use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;
use tower_sessions::Session;

use crate::api::middleware::{auth::get_authenticated_admin, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::Result;
use crate::models::processing_job::ProcessingJob;

#[derive(Debug, Serialize)]
struct PlatformStats {
    users: i64,
    vendors: i64,
    packages: i64,
    access_keys_active: i64,
    advertisements: i64,
    products: i64,
    withdrawals_pending: i64,
    queue: HashMap<String, i64>,
}

async fn stats(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<PlatformStats>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    let (users, vendors): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE role = 'vendor') FROM users",
    )
    .fetch_one(&state.pool)
    .await?;

    let packages: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM packages")
        .fetch_one(&state.pool)
        .await?;
    let access_keys_active: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM access_keys WHERE status = 'active'")
            .fetch_one(&state.pool)
            .await?;
    let advertisements: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM advertisements")
        .fetch_one(&state.pool)
        .await?;
    let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&state.pool)
        .await?;
    let withdrawals_pending: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM withdrawal_requests WHERE status = 'pending'")
            .fetch_one(&state.pool)
            .await?;

    let queue = ProcessingJob::counts_by_status(&state.pool)
        .await?
        .into_iter()
        .collect();

    Ok(ok(PlatformStats {
        users,
        vendors,
        packages,
        access_keys_active,
        advertisements,
        products,
        withdrawals_pending,
        queue,
    }))
}

#[derive(Debug, Serialize)]
struct QueueRestartData {
    reset_jobs: u64,
}

/// The back-office "restart queue" button: returns jobs stuck in running
/// back to pending so the worker picks them up again.
async fn restart_queue(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<QueueRestartData>>> {
    let admin = get_authenticated_admin(&state.pool, &session).await?;

    let reset_jobs =
        ProcessingJob::reset_stuck(&state.pool, state.config.stuck_job_minutes).await?;

    tracing::info!(admin_id = %admin.id, reset_jobs, "Queue restart requested");

    Ok(ok_with_message("Queue restarted", QueueRestartData { reset_jobs }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/maintenance/stats", get(stats))
        .route("/maintenance/queue/restart", post(restart_queue))
}
