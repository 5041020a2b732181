use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        }
    }
}

/// A cash-out request. The amount is held on the user's wallet while
/// pending; approval burns the hold, rejection returns it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub amount_cents: i64,
    pub status: WithdrawalStatus,
    pub payout_details: serde_json::Value,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WithdrawalRequest {
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        amount_cents: i64,
        payout_details: serde_json::Value,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO withdrawal_requests (user_id, amount_cents, payout_details)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(amount_cents)
        .bind(payout_details)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM withdrawal_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM withdrawal_requests WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_status(
        pool: &PgPool,
        status: WithdrawalStatus,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM withdrawal_requests WHERE status = $1 ORDER BY created_at",
        )
        .bind(status.as_str())
        .fetch_all(pool)
        .await
    }

    /// Settles a pending request. Guarded on status = 'pending' so a request
    /// can only be decided once; returns false if someone else got there
    /// first.
    pub async fn decide<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        status: WithdrawalStatus,
        decided_by: Uuid,
        reason: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE withdrawal_requests
            SET status = $2, decided_by = $3, decided_at = NOW(), reason = $4
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(decided_by)
        .bind(reason)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
