use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub content_url: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseData {
    pub title: String,
    pub description: String,
    pub content_url: String,
}

impl Course {
    pub async fn create(pool: &PgPool, data: CourseData) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO courses (title, description, content_url)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.content_url)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_published(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM courses WHERE is_published ORDER BY created_at")
            .fetch_all(pool)
            .await
    }

    pub async fn set_published(
        pool: &PgPool,
        id: Uuid,
        is_published: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE courses SET is_published = $2 WHERE id = $1")
            .bind(id)
            .bind(is_published)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseEnrollment {
    pub id: Uuid,
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub enrolled_at: DateTime<Utc>,
}

impl CourseEnrollment {
    /// Enrolls the user. Returns None when already enrolled.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        course_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO course_enrollments (course_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (course_id, user_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn count_for_user<'e>(
        executor: impl PgExecutor<'e>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM course_enrollments WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(executor)
            .await
    }

    pub async fn list_courses_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<Course>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT c.* FROM courses c
            JOIN course_enrollments e ON e.course_id = c.id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
