use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Vendor,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub role: Role,
    pub package_id: Option<Uuid>,
    pub referred_by: Option<Uuid>,
    pub referral_code: String,
    pub balance_cents: i64,
    pub held_cents: i64,
    pub commission_rate_bps: Option<i32>,
    #[serde(skip_serializing)]
    pub api_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateUserData {
    pub email: String,
    pub password_hash: String,
    pub display_name: String,
    pub package_id: Option<Uuid>,
    pub referred_by: Option<Uuid>,
    pub referral_code: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_vendor(&self) -> bool {
        self.role == Role::Vendor
    }

    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        data: CreateUserData,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (email, password_hash, display_name, package_id, referred_by, referral_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(&data.display_name)
        .bind(data.package_id)
        .bind(data.referred_by)
        .bind(&data.referral_code)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_token_hash(
        pool: &PgPool,
        token_hash: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE api_token_hash = $1")
            .bind(token_hash)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_referral_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE referral_code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Stores the digest of a freshly minted API token, replacing any
    /// previous one.
    pub async fn set_api_token_hash(
        pool: &PgPool,
        id: Uuid,
        token_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET api_token_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token_hash)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Takes the user's row lock for the rest of the transaction. Flows that
    /// count this user's rows before inserting (daily limits, course caps)
    /// lock first so concurrent requests line up instead of both passing the
    /// count.
    pub async fn lock_row<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1 FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }

    /// Adds funds to the user's balance. Callers pair this with a ledger row
    /// in the same transaction.
    pub async fn credit<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        amount_cents: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET balance_cents = balance_cents + $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(amount_cents)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Removes funds, guarded so the balance can never go negative. Returns
    /// false when the user lacks the funds.
    pub async fn debit<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        amount_cents: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET balance_cents = balance_cents - $2, updated_at = NOW()
            WHERE id = $1 AND balance_cents >= $2
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Moves funds from balance to held, backing a pending withdrawal.
    pub async fn hold_funds<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        amount_cents: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET balance_cents = balance_cents - $2,
                held_cents = held_cents + $2,
                updated_at = NOW()
            WHERE id = $1 AND balance_cents >= $2
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Returns held funds to the spendable balance (withdrawal rejected).
    pub async fn release_held<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        amount_cents: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET balance_cents = balance_cents + $2,
                held_cents = held_cents - $2,
                updated_at = NOW()
            WHERE id = $1 AND held_cents >= $2
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Burns held funds once a withdrawal is paid out.
    pub async fn consume_held<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        amount_cents: i64,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET held_cents = held_cents - $2, updated_at = NOW()
            WHERE id = $1 AND held_cents >= $2
            "#,
        )
        .bind(id)
        .bind(amount_cents)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Promotes a user to vendor with the given commission rate.
    pub async fn make_vendor(
        pool: &PgPool,
        id: Uuid,
        commission_rate_bps: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = 'vendor', commission_rate_bps = $2, updated_at = NOW()
            WHERE id = $1 AND role = 'member'
            "#,
        )
        .bind(id)
        .bind(commission_rate_bps)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn update_commission(
        pool: &PgPool,
        id: Uuid,
        commission_rate_bps: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET commission_rate_bps = $2, updated_at = NOW()
            WHERE id = $1 AND role = 'vendor'
            "#,
        )
        .bind(id)
        .bind(commission_rate_bps)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn revoke_vendor(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = 'member', commission_rate_bps = NULL, updated_at = NOW()
            WHERE id = $1 AND role = 'vendor'
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn list_vendors(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE role = 'vendor' ORDER BY created_at")
            .fetch_all(pool)
            .await
    }

    pub async fn count_referrals(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE referred_by = $1")
            .bind(id)
            .fetch_one(pool)
            .await
    }
}
