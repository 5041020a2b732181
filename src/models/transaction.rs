use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    AdReward,
    TeaserReward,
    ReferralBonus,
    Purchase,
    Sale,
    KeyCommission,
    Withdrawal,
    WithdrawalRefund,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::AdReward => "ad_reward",
            TxKind::TeaserReward => "teaser_reward",
            TxKind::ReferralBonus => "referral_bonus",
            TxKind::Purchase => "purchase",
            TxKind::Sale => "sale",
            TxKind::KeyCommission => "key_commission",
            TxKind::Withdrawal => "withdrawal",
            TxKind::WithdrawalRefund => "withdrawal_refund",
        }
    }
}

/// Append-only ledger row. Every earning, spend and settlement writes one
/// of these in the same database transaction as the balance change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TxKind,
    /// Signed: credits positive, debits negative.
    pub amount_cents: i64,
    pub reference_id: Option<Uuid>,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub async fn record<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
        kind: TxKind,
        amount_cents: i64,
        reference_id: Option<Uuid>,
        note: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO transactions (user_id, kind, amount_cents, reference_id, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(amount_cents)
        .bind(reference_id)
        .bind(note)
        .fetch_one(executor)
        .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM transactions
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn sum_for_user_kind(
        pool: &PgPool,
        user_id: Uuid,
        kind: TxKind,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(amount_cents), 0) FROM transactions WHERE user_id = $1 AND kind = $2",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .fetch_one(pool)
        .await
    }
}
