use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    product::Product,
    transaction::{Transaction, TxKind},
    user::User,
};
use crate::services::wallet;

#[derive(thiserror::Error, Debug)]
pub enum PurchaseError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Product not found")]
    ProductNotFound,

    #[error("Product is not available")]
    NotAvailable,

    #[error("You cannot buy your own product")]
    OwnProduct,

    #[error("Insufficient funds")]
    InsufficientFunds,
}

pub struct PurchaseResult {
    pub product: Product,
    pub paid_cents: i64,
    pub seller_net_cents: i64,
    pub platform_fee_cents: i64,
}

/// Buys one unit of a product with wallet funds.
///
/// Debits the buyer, credits the seller minus the platform fee, takes a
/// unit of stock and writes the paired purchase/sale ledger rows, all in
/// one database transaction. The debit and the stock take are both
/// guarded, so concurrent buyers cannot overdraw a wallet or oversell a
/// listing.
#[tracing::instrument(skip(pool, buyer), fields(buyer_id = %buyer.id, product_id = %product_id))]
pub async fn purchase(
    pool: &PgPool,
    buyer: &User,
    product_id: Uuid,
    platform_fee_bps: i64,
) -> Result<PurchaseResult, PurchaseError> {
    let product = Product::find_by_id(pool, product_id)
        .await?
        .ok_or(PurchaseError::ProductNotFound)?;

    if !product.is_buyable() {
        return Err(PurchaseError::NotAvailable);
    }

    if product.seller_id == buyer.id {
        return Err(PurchaseError::OwnProduct);
    }

    let fee = wallet::basis_points(product.price_cents, platform_fee_bps);
    let seller_net = product.price_cents - fee;

    let mut tx = pool.begin().await?;

    if !Product::take_stock(&mut *tx, product.id).await? {
        return Err(PurchaseError::NotAvailable);
    }

    if !User::debit(&mut *tx, buyer.id, product.price_cents).await? {
        tx.rollback().await?;
        return Err(PurchaseError::InsufficientFunds);
    }

    User::credit(&mut *tx, product.seller_id, seller_net).await?;

    Transaction::record(
        &mut *tx,
        buyer.id,
        TxKind::Purchase,
        -product.price_cents,
        Some(product.id),
        "Product purchase",
    )
    .await?;

    Transaction::record(
        &mut *tx,
        product.seller_id,
        TxKind::Sale,
        seller_net,
        Some(product.id),
        "Product sale (net of platform fee)",
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        paid_cents = product.price_cents,
        seller_net_cents = seller_net,
        platform_fee_cents = fee,
        "Purchase completed"
    );

    let paid_cents = product.price_cents;

    // Reload to reflect the new stock/status
    let product = Product::find_by_id(pool, product.id)
        .await?
        .ok_or(PurchaseError::ProductNotFound)?;

    Ok(PurchaseResult {
        product,
        paid_cents,
        seller_net_cents: seller_net,
        platform_fee_cents: fee,
    })
}
