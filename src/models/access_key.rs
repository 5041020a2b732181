use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KeyStatus {
    Active,
    Used,
    Revoked,
}

impl KeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyStatus::Active => "active",
            KeyStatus::Used => "used",
            KeyStatus::Revoked => "revoked",
        }
    }
}

/// Single-use registration code granting a purchased package. Keys can be
/// allocated to a vendor, who earns commission when theirs is redeemed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessKey {
    pub id: Uuid,
    pub code: String,
    pub package_id: Uuid,
    pub status: KeyStatus,
    pub vendor_id: Option<Uuid>,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AccessKey {
    /// A key registers exactly one user: it must still be active, never
    /// consumed, and not past its expiry.
    pub fn can_be_used(&self, now: DateTime<Utc>) -> bool {
        self.status == KeyStatus::Active
            && self.used_by.is_none()
            && self.expires_at.map_or(true, |e| e > now)
    }

    pub async fn create_batch(
        pool: &PgPool,
        package_id: Uuid,
        codes: &[String],
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut keys = Vec::with_capacity(codes.len());
        let mut tx = pool.begin().await?;
        for code in codes {
            let key = sqlx::query_as::<_, Self>(
                r#"
                INSERT INTO access_keys (code, package_id, expires_at)
                VALUES ($1, $2, $3)
                RETURNING *
                "#,
            )
            .bind(code)
            .bind(package_id)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;
            keys.push(key);
        }
        tx.commit().await?;
        Ok(keys)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM access_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM access_keys WHERE code = $1")
            .bind(code)
            .fetch_optional(pool)
            .await
    }

    /// Marks the key as used by `user_id`. Guarded so a key that raced
    /// another registration (or was revoked meanwhile) is not consumed
    /// twice; returns false in that case.
    pub async fn consume<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE access_keys
            SET status = 'used', used_by = $2, used_at = NOW()
            WHERE id = $1 AND status = 'active' AND used_by IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Only unused keys can be revoked.
    pub async fn revoke(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE access_keys
            SET status = 'revoked'
            WHERE id = $1 AND status = 'active' AND used_by IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Hands `count` unallocated active keys of a package to a vendor.
    /// Returns how many were actually assigned.
    pub async fn assign_to_vendor(
        pool: &PgPool,
        package_id: Uuid,
        vendor_id: Uuid,
        count: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE access_keys
            SET vendor_id = $2
            WHERE id IN (
                SELECT id FROM access_keys
                WHERE package_id = $1 AND status = 'active' AND vendor_id IS NULL
                ORDER BY created_at
                LIMIT $3
            )
            "#,
        )
        .bind(package_id)
        .bind(vendor_id)
        .bind(count)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn list(
        pool: &PgPool,
        status: Option<KeyStatus>,
        package_id: Option<Uuid>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM access_keys
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR package_id = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(package_id)
        .fetch_all(pool)
        .await
    }

    pub async fn vendor_key_counts(
        pool: &PgPool,
        vendor_id: Uuid,
    ) -> Result<(i64, i64), sqlx::Error> {
        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'active'),
                COUNT(*) FILTER (WHERE status = 'used')
            FROM access_keys WHERE vendor_id = $1
            "#,
        )
        .bind(vendor_id)
        .fetch_one(pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn key(status: KeyStatus, used_by: Option<Uuid>, expires_at: Option<DateTime<Utc>>) -> AccessKey {
        AccessKey {
            id: Uuid::new_v4(),
            code: "EH-TEST-0001".to_string(),
            package_id: Uuid::new_v4(),
            status,
            vendor_id: None,
            used_by,
            used_at: None,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn active_unused_key_can_be_used() {
        let k = key(KeyStatus::Active, None, None);
        assert!(k.can_be_used(Utc::now()));
    }

    #[test]
    fn used_key_cannot_be_reused() {
        let k = key(KeyStatus::Used, Some(Uuid::new_v4()), None);
        assert!(!k.can_be_used(Utc::now()));
    }

    #[test]
    fn revoked_key_cannot_be_used() {
        let k = key(KeyStatus::Revoked, None, None);
        assert!(!k.can_be_used(Utc::now()));
    }

    #[test]
    fn expired_key_cannot_be_used() {
        let now = Utc::now();
        let k = key(KeyStatus::Active, None, Some(now - Duration::hours(1)));
        assert!(!k.can_be_used(now));
    }

    #[test]
    fn key_with_future_expiry_can_be_used() {
        let now = Utc::now();
        let k = key(KeyStatus::Active, None, Some(now + Duration::days(30)));
        assert!(k.can_be_used(now));
    }
}
