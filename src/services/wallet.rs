use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    package::Package,
    transaction::{Transaction, TxKind},
    user::User,
    withdrawal::{WithdrawalRequest, WithdrawalStatus},
};

#[derive(thiserror::Error, Debug)]
pub enum WalletError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Amount must be positive")]
    InvalidAmount,

    #[error("Amount is below the package minimum withdrawal")]
    BelowMinimum,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Withdrawal request not found")]
    RequestNotFound,

    #[error("Request has already been decided")]
    AlreadyDecided,

    #[error("User has no package")]
    NoPackage,
}

/// Fraction of `amount_cents` expressed in basis points, floored.
pub fn basis_points(amount_cents: i64, bps: i64) -> i64 {
    amount_cents * bps / 10_000
}

/// Opens a withdrawal request, moving the amount from the user's spendable
/// balance into held funds.
#[tracing::instrument(skip(pool, user, payout_details), fields(user_id = %user.id))]
pub async fn request_withdrawal(
    pool: &PgPool,
    user: &User,
    amount_cents: i64,
    payout_details: serde_json::Value,
) -> Result<WithdrawalRequest, WalletError> {
    if amount_cents <= 0 {
        return Err(WalletError::InvalidAmount);
    }

    let package_id = user.package_id.ok_or(WalletError::NoPackage)?;
    let package = Package::find_by_id(pool, package_id)
        .await?
        .ok_or(WalletError::NoPackage)?;

    if amount_cents < package.min_withdrawal_cents {
        return Err(WalletError::BelowMinimum);
    }

    let mut tx = pool.begin().await?;

    // Guarded move; a concurrent spend of the same funds makes this a no-op
    if !User::hold_funds(&mut *tx, user.id, amount_cents).await? {
        return Err(WalletError::InsufficientFunds);
    }

    let request = WithdrawalRequest::create(&mut *tx, user.id, amount_cents, payout_details).await?;

    tx.commit().await?;

    tracing::info!(request_id = %request.id, amount_cents, "Withdrawal requested, funds held");

    Ok(request)
}

/// Admin approval: the held funds leave the platform and a withdrawal
/// ledger row is written.
#[tracing::instrument(skip(pool), fields(request_id = %request_id, admin_id = %admin_id))]
pub async fn approve_withdrawal(
    pool: &PgPool,
    request_id: Uuid,
    admin_id: Uuid,
) -> Result<WithdrawalRequest, WalletError> {
    let request = WithdrawalRequest::find_by_id(pool, request_id)
        .await?
        .ok_or(WalletError::RequestNotFound)?;

    let mut tx = pool.begin().await?;

    if !WithdrawalRequest::decide(&mut *tx, request.id, WithdrawalStatus::Approved, admin_id, None)
        .await?
    {
        return Err(WalletError::AlreadyDecided);
    }

    if !User::consume_held(&mut *tx, request.user_id, request.amount_cents).await? {
        // Held funds must cover every pending request; a shortfall means
        // the books are wrong, so refuse to settle.
        tx.rollback().await?;
        tracing::error!(request_id = %request.id, "Held funds short of withdrawal amount");
        return Err(WalletError::InsufficientFunds);
    }

    Transaction::record(
        &mut *tx,
        request.user_id,
        TxKind::Withdrawal,
        -request.amount_cents,
        Some(request.id),
        "Withdrawal approved",
    )
    .await?;

    tx.commit().await?;

    tracing::info!(amount_cents = request.amount_cents, "Withdrawal approved");

    WithdrawalRequest::find_by_id(pool, request.id)
        .await?
        .ok_or(WalletError::RequestNotFound)
}

/// Admin rejection: held funds return to the spendable balance.
#[tracing::instrument(skip(pool, reason), fields(request_id = %request_id, admin_id = %admin_id))]
pub async fn reject_withdrawal(
    pool: &PgPool,
    request_id: Uuid,
    admin_id: Uuid,
    reason: &str,
) -> Result<WithdrawalRequest, WalletError> {
    let request = WithdrawalRequest::find_by_id(pool, request_id)
        .await?
        .ok_or(WalletError::RequestNotFound)?;

    let mut tx = pool.begin().await?;

    if !WithdrawalRequest::decide(
        &mut *tx,
        request.id,
        WithdrawalStatus::Rejected,
        admin_id,
        Some(reason),
    )
    .await?
    {
        return Err(WalletError::AlreadyDecided);
    }

    if !User::release_held(&mut *tx, request.user_id, request.amount_cents).await? {
        tx.rollback().await?;
        tracing::error!(request_id = %request.id, "Held funds short of withdrawal amount");
        return Err(WalletError::InsufficientFunds);
    }

    Transaction::record(
        &mut *tx,
        request.user_id,
        TxKind::WithdrawalRefund,
        request.amount_cents,
        Some(request.id),
        "Withdrawal rejected, funds returned",
    )
    .await?;

    tx.commit().await?;

    tracing::info!(amount_cents = request.amount_cents, "Withdrawal rejected");

    WithdrawalRequest::find_by_id(pool, request.id)
        .await?
        .ok_or(WalletError::RequestNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basis_points_math() {
        assert_eq!(basis_points(10_000, 500), 500); // 5% of $100
        assert_eq!(basis_points(10_000, 0), 0);
        assert_eq!(basis_points(1, 500), 0); // floors, never rounds up
        assert_eq!(basis_points(2_500, 1_000), 250);
    }
}
