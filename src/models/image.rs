use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub thumbnail: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

/// Row without the image bytes, for listings and API responses.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ImageMeta {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub has_thumbnail: bool,
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub async fn create(
        pool: &PgPool,
        owner_id: Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<ImageMeta, sqlx::Error> {
        sqlx::query_as::<_, ImageMeta>(
            r#"
            INSERT INTO images (owner_id, filename, content_type, data)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, filename, content_type,
                      thumbnail IS NOT NULL AS has_thumbnail, created_at
            "#,
        )
        .bind(owner_id)
        .bind(filename)
        .bind(content_type)
        .bind(data)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM images WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn set_thumbnail<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
        thumbnail: Vec<u8>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE images SET thumbnail = $2 WHERE id = $1")
            .bind(id)
            .bind(thumbnail)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
