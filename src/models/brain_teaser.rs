use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BrainTeaser {
    pub id: Uuid,
    pub question: String,
    /// JSONB array of answer strings.
    pub choices: serde_json::Value,
    pub correct_choice: i32,
    pub reward_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Client-facing view of a teaser. The correct answer is never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct TeaserView {
    pub id: Uuid,
    pub question: String,
    pub choices: serde_json::Value,
    pub reward_cents: i64,
}

impl From<BrainTeaser> for TeaserView {
    fn from(t: BrainTeaser) -> Self {
        Self {
            id: t.id,
            question: t.question,
            choices: t.choices,
            reward_cents: t.reward_cents,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeaserData {
    pub question: String,
    pub choices: Vec<String>,
    pub correct_choice: i32,
    pub reward_cents: i64,
}

impl BrainTeaser {
    pub fn is_correct(&self, choice: i32) -> bool {
        choice == self.correct_choice
    }

    pub fn choice_count(&self) -> usize {
        self.choices.as_array().map_or(0, |a| a.len())
    }

    /// A choice index is only meaningful inside the choices array.
    pub fn is_valid_choice(&self, choice: i32) -> bool {
        choice >= 0 && (choice as usize) < self.choice_count()
    }

    pub async fn create(pool: &PgPool, data: TeaserData) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO brain_teasers (question, choices, correct_choice, reward_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&data.question)
        .bind(serde_json::json!(data.choices))
        .bind(data.correct_choice)
        .bind(data.reward_cents)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM brain_teasers WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_active(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM brain_teasers WHERE is_active ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn set_active(pool: &PgPool, id: Uuid, is_active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE brain_teasers SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(is_active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

/// A user's single shot at a teaser. The unique constraint on
/// (brain_teaser_id, user_id) makes attempts one-time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TeaserAttempt {
    pub id: Uuid,
    pub brain_teaser_id: Uuid,
    pub user_id: Uuid,
    pub chosen: i32,
    pub correct: bool,
    pub attempted_at: DateTime<Utc>,
}

impl TeaserAttempt {
    /// Records the attempt. Returns None when the user already attempted
    /// this teaser.
    pub async fn record<'e>(
        executor: impl PgExecutor<'e>,
        brain_teaser_id: Uuid,
        user_id: Uuid,
        chosen: i32,
        correct: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO teaser_attempts (brain_teaser_id, user_id, chosen, correct)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (brain_teaser_id, user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(brain_teaser_id)
        .bind(user_id)
        .bind(chosen)
        .bind(correct)
        .fetch_optional(executor)
        .await
    }

    pub async fn count_correct_today<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM teaser_attempts
            WHERE user_id = $1 AND correct AND attempted_at::date = CURRENT_DATE
            "#,
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn teaser() -> BrainTeaser {
        BrainTeaser {
            id: Uuid::new_v4(),
            question: "2 + 2?".to_string(),
            choices: serde_json::json!(["3", "4", "5"]),
            correct_choice: 1,
            reward_cents: 10,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn correct_choice_matches() {
        let t = teaser();
        assert!(t.is_correct(1));
        assert!(!t.is_correct(0));
    }

    #[test]
    fn choice_bounds_are_enforced() {
        let t = teaser();
        assert!(t.is_valid_choice(0));
        assert!(t.is_valid_choice(2));
        assert!(!t.is_valid_choice(3));
        assert!(!t.is_valid_choice(-1));
    }

    #[test]
    fn view_omits_answer() {
        let view = TeaserView::from(teaser());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("correct_choice").is_none());
        assert_eq!(json["question"], "2 + 2?");
    }
}
