use chrono::Utc;
use sqlx::PgPool;

use crate::models::{
    access_key::AccessKey,
    package::Package,
    transaction::{Transaction, TxKind},
    user::{CreateUserData, User},
};
use crate::services::{codes, password, token, wallet};

#[derive(thiserror::Error, Debug)]
pub enum RegistrationError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Access key not found")]
    KeyNotFound,

    #[error("Access key has already been used or is no longer valid")]
    KeyNotUsable,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Unknown referral code")]
    UnknownReferralCode,

    #[error("Password hashing failed: {0}")]
    Password(#[from] password::PasswordError),

    #[error("Code generation failed: {0}")]
    Code(#[from] codes::CodeError),

    #[error("Token generation failed: {0}")]
    Token(#[from] token::TokenError),
}

pub struct RegisterRequest {
    pub access_key: String,
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub referral_code: Option<String>,
}

pub struct RegisterResult {
    pub user: User,
    pub api_token: String,
}

/// Registers a new user against a purchased access key.
///
/// The flow:
/// 1. Validates the key (active, unused, unexpired)
/// 2. Creates the user with the key's package
/// 3. Consumes the key (guarded single-use update)
/// 4. Credits the referrer's bonus, if a referral code was given
/// 5. Credits the selling vendor's commission, if the key was allocated
///
/// Steps 2-5 run in one database transaction; a key that loses the
/// consume race aborts the whole registration.
#[tracing::instrument(skip(pool, request), fields(email = %request.email))]
pub async fn register(
    pool: &PgPool,
    request: RegisterRequest,
) -> Result<RegisterResult, RegistrationError> {
    tracing::info!("Starting registration");

    // 1. Load and validate the access key
    let key = AccessKey::find_by_code(pool, &request.access_key)
        .await?
        .ok_or(RegistrationError::KeyNotFound)?;

    if !key.can_be_used(Utc::now()) {
        return Err(RegistrationError::KeyNotUsable);
    }

    let package = Package::find_by_id(pool, key.package_id)
        .await?
        .ok_or(RegistrationError::KeyNotUsable)?;

    if User::find_by_email(pool, &request.email).await?.is_some() {
        return Err(RegistrationError::EmailTaken);
    }

    // 2. Resolve the referrer before opening the transaction
    let referrer = match &request.referral_code {
        Some(code) => Some(
            User::find_by_referral_code(pool, code)
                .await?
                .ok_or(RegistrationError::UnknownReferralCode)?,
        ),
        None => None,
    };

    let password_hash = password::hash_password(&request.password)?;
    let referral_code = codes::generate_referral_code()?;

    let mut tx = pool.begin().await?;

    // 3. Create the user on the key's package
    let user = User::create(
        &mut *tx,
        CreateUserData {
            email: request.email,
            password_hash,
            display_name: request.display_name,
            package_id: Some(key.package_id),
            referred_by: referrer.as_ref().map(|r| r.id),
            referral_code,
        },
    )
    .await?;

    // 4. Consume the key; losing the race means someone else redeemed it
    if !AccessKey::consume(&mut *tx, key.id, user.id).await? {
        tx.rollback().await?;
        tracing::warn!(key_id = %key.id, "Access key lost the consume race");
        return Err(RegistrationError::KeyNotUsable);
    }

    // 5. Referral bonus
    if let Some(referrer) = &referrer {
        if package.referral_bonus_cents > 0 {
            User::credit(&mut *tx, referrer.id, package.referral_bonus_cents).await?;
            Transaction::record(
                &mut *tx,
                referrer.id,
                TxKind::ReferralBonus,
                package.referral_bonus_cents,
                Some(user.id),
                "Referral signup bonus",
            )
            .await?;

            tracing::info!(
                referrer_id = %referrer.id,
                bonus_cents = package.referral_bonus_cents,
                "Referral bonus credited"
            );
        }
    }

    // 6. Vendor commission on the redeemed key
    if let Some(vendor_id) = key.vendor_id {
        let vendor = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(vendor_id)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(vendor) = vendor {
            let rate = vendor.commission_rate_bps.unwrap_or(0) as i64;
            let commission = wallet::basis_points(package.price_cents, rate);

            if commission > 0 {
                User::credit(&mut *tx, vendor.id, commission).await?;
                Transaction::record(
                    &mut *tx,
                    vendor.id,
                    TxKind::KeyCommission,
                    commission,
                    Some(key.id),
                    "Access key sale commission",
                )
                .await?;

                tracing::info!(
                    vendor_id = %vendor.id,
                    commission_cents = commission,
                    "Vendor commission credited"
                );
            }
        }
    }

    tx.commit().await?;

    // 7. Mint the user's first API token
    let minted = token::mint_token()?;
    User::set_api_token_hash(pool, user.id, &minted.digest).await?;

    tracing::info!(user_id = %user.id, package_id = %key.package_id, "Registration completed");

    Ok(RegisterResult {
        user,
        api_token: minted.token,
    })
}

#[derive(thiserror::Error, Debug)]
pub enum LoginError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Password verification failed: {0}")]
    Password(#[from] password::PasswordError),

    #[error("Token generation failed: {0}")]
    Token(#[from] token::TokenError),
}

/// Verifies credentials and rotates the user's API token.
#[tracing::instrument(skip(pool, password))]
pub async fn login(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<RegisterResult, LoginError> {
    let user = User::find_by_email(pool, email)
        .await?
        .ok_or(LoginError::InvalidCredentials)?;

    if !password::verify_password(password, &user.password_hash)? {
        return Err(LoginError::InvalidCredentials);
    }

    let minted = token::mint_token()?;
    User::set_api_token_hash(pool, user.id, &minted.digest).await?;

    tracing::info!(user_id = %user.id, "Login succeeded, token rotated");

    Ok(RegisterResult {
        user,
        api_token: minted.token,
    })
}
