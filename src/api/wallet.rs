use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::middleware::{auth::AuthUser, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::transaction::Transaction;
use crate::models::withdrawal::WithdrawalRequest;
use crate::services::wallet;

const RECENT_TRANSACTIONS: i64 = 10;
const PAGE_SIZE_MAX: i64 = 100;

#[derive(Debug, Serialize)]
struct WalletData {
    balance_cents: i64,
    held_cents: i64,
    recent_transactions: Vec<Transaction>,
}

async fn wallet_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<WalletData>>> {
    let recent =
        Transaction::list_for_user(&state.pool, user.id, RECENT_TRANSACTIONS, 0).await?;

    Ok(ok(WalletData {
        balance_cents: user.balance_cents,
        held_cents: user.held_cents,
        recent_transactions: recent,
    }))
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> Result<Json<ApiResponse<Vec<Transaction>>>> {
    let limit = page.limit.unwrap_or(50).clamp(1, PAGE_SIZE_MAX);
    let offset = page.offset.unwrap_or(0).max(0);

    let transactions = Transaction::list_for_user(&state.pool, user.id, limit, offset).await?;
    Ok(ok(transactions))
}

#[derive(Debug, Deserialize)]
struct WithdrawalBody {
    amount_cents: i64,
    payout_details: serde_json::Value,
}

async fn request_withdrawal(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<WithdrawalBody>,
) -> Result<Json<ApiResponse<WithdrawalRequest>>> {
    if !body.payout_details.is_object() {
        return Err(AppError::Validation(
            "payout_details must be an object".to_string(),
        ));
    }

    let request =
        wallet::request_withdrawal(&state.pool, &user, body.amount_cents, body.payout_details)
            .await?;

    Ok(ok_with_message("Withdrawal requested", request))
}

async fn list_withdrawals(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Vec<WithdrawalRequest>>>> {
    let requests = WithdrawalRequest::list_for_user(&state.pool, user.id).await?;
    Ok(ok(requests))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wallet", get(wallet_summary))
        .route("/wallet/transactions", get(list_transactions))
        .route("/withdrawals", get(list_withdrawals).post(request_withdrawal))
}
