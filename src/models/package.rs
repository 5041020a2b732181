use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// A purchasable service tier. Limits here govern how much a user can earn
/// per day and how many courses they can take.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Package {
    pub id: Uuid,
    pub name: String,
    pub price_cents: i64,
    pub daily_ad_limit: i32,
    pub daily_teaser_limit: i32,
    pub course_limit: i32,
    pub referral_bonus_cents: i64,
    pub min_withdrawal_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PackageData {
    pub name: String,
    pub price_cents: i64,
    pub daily_ad_limit: i32,
    pub daily_teaser_limit: i32,
    pub course_limit: i32,
    pub referral_bonus_cents: i64,
    pub min_withdrawal_cents: i64,
}

impl Package {
    pub async fn create(pool: &PgPool, data: PackageData) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO packages
                (name, price_cents, daily_ad_limit, daily_teaser_limit, course_limit,
                 referral_bonus_cents, min_withdrawal_cents)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(data.price_cents)
        .bind(data.daily_ad_limit)
        .bind(data.daily_teaser_limit)
        .bind(data.course_limit)
        .bind(data.referral_bonus_cents)
        .bind(data.min_withdrawal_cents)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM packages WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM packages
            WHERE is_active OR $1
            ORDER BY price_cents
            "#,
        )
        .bind(include_inactive)
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: PackageData) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE packages
            SET name = $2, price_cents = $3, daily_ad_limit = $4, daily_teaser_limit = $5,
                course_limit = $6, referral_bonus_cents = $7, min_withdrawal_cents = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.price_cents)
        .bind(data.daily_ad_limit)
        .bind(data.daily_teaser_limit)
        .bind(data.course_limit)
        .bind(data.referral_bonus_cents)
        .bind(data.min_withdrawal_cents)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Deletes a package outright. Fails with a foreign key violation when
    /// users or access keys still reference it; callers surface that as a
    /// conflict.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM packages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn set_active(pool: &PgPool, id: Uuid, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE packages SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
