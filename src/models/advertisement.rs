use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdStatus {
    Pending,
    Approved,
    Paused,
    Rejected,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Pending => "pending",
            AdStatus::Approved => "approved",
            AdStatus::Paused => "paused",
            AdStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Advertisement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub target_url: String,
    pub image_id: Option<Uuid>,
    pub reward_cents: i64,
    pub status: AdStatus,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdData {
    pub title: String,
    pub body: String,
    pub target_url: String,
    pub image_id: Option<Uuid>,
    pub reward_cents: i64,
}

impl Advertisement {
    /// Valid lifecycle moves. New ads start pending; only approved ads are
    /// shown to users and only those can be paused.
    pub fn can_transition_to(&self, next: AdStatus) -> bool {
        use AdStatus::*;
        matches!(
            (self.status, next),
            (Pending, Approved) | (Pending, Rejected) | (Approved, Paused) | (Paused, Approved)
        )
    }

    pub async fn create(pool: &PgPool, data: AdData) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO advertisements (title, body, target_url, image_id, reward_cents)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.body)
        .bind(&data.target_url)
        .bind(data.image_id)
        .bind(data.reward_cents)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM advertisements WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, status: Option<AdStatus>) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM advertisements
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await
    }

    pub async fn update(pool: &PgPool, id: Uuid, data: AdData) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE advertisements
            SET title = $2, body = $3, target_url = $4, image_id = $5, reward_cents = $6,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&data.title)
        .bind(&data.body)
        .bind(&data.target_url)
        .bind(data.image_id)
        .bind(data.reward_cents)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Applies a status transition, guarded on the expected current status
    /// so two admins deciding at once cannot both win.
    pub async fn set_status(
        pool: &PgPool,
        id: Uuid,
        from: AdStatus,
        to: AdStatus,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE advertisements
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn increment_view_count<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE advertisements SET view_count = view_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }
}

/// One rewarded view of an ad. The unique constraint on
/// (advertisement_id, user_id, viewed_on) makes rewards once-per-day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdView {
    pub id: Uuid,
    pub advertisement_id: Uuid,
    pub user_id: Uuid,
    pub viewed_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl AdView {
    /// Records today's view. Returns None when the user already viewed this
    /// ad today (the insert hits the unique constraint).
    pub async fn record<'e>(
        executor: impl PgExecutor<'e>,
        advertisement_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO ad_views (advertisement_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (advertisement_id, user_id, viewed_on) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(advertisement_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn count_today<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM ad_views WHERE user_id = $1 AND viewed_on = CURRENT_DATE",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ad(status: AdStatus) -> Advertisement {
        Advertisement {
            id: Uuid::new_v4(),
            title: "Try Acme".to_string(),
            body: "Acme does things".to_string(),
            target_url: "https://acme.example".to_string(),
            image_id: None,
            reward_cents: 25,
            status,
            view_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn pending_ad_can_be_approved_or_rejected() {
        let a = ad(AdStatus::Pending);
        assert!(a.can_transition_to(AdStatus::Approved));
        assert!(a.can_transition_to(AdStatus::Rejected));
        assert!(!a.can_transition_to(AdStatus::Paused));
    }

    #[test]
    fn approved_ad_can_only_be_paused() {
        let a = ad(AdStatus::Approved);
        assert!(a.can_transition_to(AdStatus::Paused));
        assert!(!a.can_transition_to(AdStatus::Rejected));
        assert!(!a.can_transition_to(AdStatus::Pending));
    }

    #[test]
    fn paused_ad_can_resume() {
        let a = ad(AdStatus::Paused);
        assert!(a.can_transition_to(AdStatus::Approved));
        assert!(!a.can_transition_to(AdStatus::Rejected));
    }

    #[test]
    fn rejected_ad_is_terminal() {
        let a = ad(AdStatus::Rejected);
        for next in [AdStatus::Pending, AdStatus::Approved, AdStatus::Paused] {
            assert!(!a.can_transition_to(next));
        }
    }
}
