use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::api::middleware::{auth::AuthUser, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::product::{Product, ProductData};
use crate::services::marketplace;

async fn list_products(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<ApiResponse<Vec<Product>>>> {
    let products = Product::list_listed(&state.pool).await?;
    Ok(ok(products))
}

async fn create_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(data): ApiJson<ProductData>,
) -> Result<Json<ApiResponse<Product>>> {
    if data.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if data.price_cents <= 0 {
        return Err(AppError::Validation("Price must be positive".to_string()));
    }
    if data.stock <= 0 {
        return Err(AppError::Validation("Stock must be positive".to_string()));
    }

    let product = Product::create(&state.pool, user.id, data).await?;
    Ok(ok_with_message("Product listed", product))
}

#[derive(Debug, Serialize)]
struct PurchaseData {
    product: Product,
    paid_cents: i64,
    seller_net_cents: i64,
    platform_fee_cents: i64,
}

async fn buy_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PurchaseData>>> {
    let result =
        marketplace::purchase(&state.pool, &user, product_id, state.config.platform_fee_bps)
            .await?;

    Ok(ok_with_message(
        "Purchase successful",
        PurchaseData {
            product: result.product,
            paid_cents: result.paid_cents,
            seller_net_cents: result.seller_net_cents,
            platform_fee_cents: result.platform_fee_cents,
        },
    ))
}

async fn delist_product(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    if !Product::delist(&state.pool, product_id, user.id).await? {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    Ok(crate::api::ok_message("Product delisted"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id/buy", post(buy_product))
        .route("/products/:id/delist", post(delist_product))
}
