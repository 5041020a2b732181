use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    Listed,
    SoldOut,
    Delisted,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i32,
    pub image_id: Option<Uuid>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductData {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub stock: i32,
    pub image_id: Option<Uuid>,
}

impl Product {
    pub fn is_buyable(&self) -> bool {
        self.status == ProductStatus::Listed && self.stock > 0
    }

    pub async fn create(
        pool: &PgPool,
        seller_id: Uuid,
        data: ProductData,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO products (seller_id, title, description, price_cents, stock, image_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(seller_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.price_cents)
        .bind(data.stock)
        .bind(data.image_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_listed(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM products WHERE status = 'listed' ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// Takes one unit of stock, flipping the product to sold_out when the
    /// last unit goes. Returns false when there was no stock to take.
    pub async fn take_stock<'e>(
        executor: impl PgExecutor<'e>,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - 1,
                status = CASE WHEN stock - 1 = 0 THEN 'sold_out' ELSE status END,
                updated_at = NOW()
            WHERE id = $1 AND status = 'listed' AND stock > 0
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Sellers (or admins) can pull a listing at any time.
    pub async fn delist(pool: &PgPool, id: Uuid, seller_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET status = 'delisted', updated_at = NOW()
            WHERE id = $1 AND seller_id = $2 AND status != 'delisted'
            "#,
        )
        .bind(id)
        .bind(seller_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(status: ProductStatus, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            title: "Handmade mug".to_string(),
            description: "A mug".to_string(),
            price_cents: 1500,
            stock,
            image_id: None,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn listed_product_with_stock_is_buyable() {
        assert!(product(ProductStatus::Listed, 3).is_buyable());
    }

    #[test]
    fn sold_out_and_delisted_products_are_not_buyable() {
        assert!(!product(ProductStatus::SoldOut, 0).is_buyable());
        assert!(!product(ProductStatus::Delisted, 5).is_buyable());
        assert!(!product(ProductStatus::Listed, 0).is_buyable());
    }
}
