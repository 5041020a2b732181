use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::middleware::{auth::get_authenticated_admin, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::withdrawal::{WithdrawalRequest, WithdrawalStatus};
use crate::services::wallet;

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<WithdrawalStatus>,
}

async fn list_requests(
    State(state): State<AppState>,
    session: Session,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<WithdrawalRequest>>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    let status = query.status.unwrap_or(WithdrawalStatus::Pending);
    let requests = WithdrawalRequest::list_by_status(&state.pool, status).await?;
    Ok(ok(requests))
}

async fn approve(
    State(state): State<AppState>,
    session: Session,
    Path(request_id): Path<Uuid>,
) -> Result<Json<ApiResponse<WithdrawalRequest>>> {
    let admin = get_authenticated_admin(&state.pool, &session).await?;

    let request = wallet::approve_withdrawal(&state.pool, request_id, admin.id).await?;
    Ok(ok_with_message("Withdrawal approved", request))
}

#[derive(Debug, Deserialize)]
struct RejectBody {
    reason: String,
}

async fn reject(
    State(state): State<AppState>,
    session: Session,
    Path(request_id): Path<Uuid>,
    ApiJson(body): ApiJson<RejectBody>,
) -> Result<Json<ApiResponse<WithdrawalRequest>>> {
    let admin = get_authenticated_admin(&state.pool, &session).await?;

    if body.reason.trim().is_empty() {
        return Err(AppError::Validation(
            "A rejection reason is required".to_string(),
        ));
    }

    let request =
        wallet::reject_withdrawal(&state.pool, request_id, admin.id, &body.reason).await?;
    Ok(ok_with_message("Withdrawal rejected", request))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/withdrawals", get(list_requests))
        .route("/withdrawals/:id/approve", post(approve))
        .route("/withdrawals/:id/reject", post(reject))
}
