use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    advertisement::{AdStatus, AdView, Advertisement},
    brain_teaser::{BrainTeaser, TeaserAttempt},
    package::Package,
    transaction::{Transaction, TxKind},
    user::User,
};

#[derive(thiserror::Error, Debug)]
pub enum RewardError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Advertisement not found")]
    AdNotFound,

    #[error("Advertisement is not available")]
    AdNotAvailable,

    #[error("Brain teaser not found")]
    TeaserNotFound,

    #[error("Invalid choice")]
    InvalidChoice,

    #[error("Already completed")]
    AlreadyDone,

    #[error("Daily limit reached")]
    DailyLimitReached,

    #[error("User has no package")]
    NoPackage,
}

pub struct RewardOutcome {
    pub rewarded_cents: i64,
    pub correct: Option<bool>,
}

async fn user_package(pool: &PgPool, user: &User) -> Result<Package, RewardError> {
    let package_id = user.package_id.ok_or(RewardError::NoPackage)?;
    Package::find_by_id(pool, package_id)
        .await?
        .ok_or(RewardError::NoPackage)
}

fn under_daily_limit(count_today: i64, limit: i32) -> bool {
    count_today < limit as i64
}

/// Credits a user for viewing an ad.
///
/// One reward per ad per day, capped by the package's daily ad limit. The
/// view row, balance credit and ledger row commit together.
#[tracing::instrument(skip(pool, user), fields(user_id = %user.id, ad_id = %ad_id))]
pub async fn credit_ad_view(
    pool: &PgPool,
    user: &User,
    ad_id: Uuid,
) -> Result<RewardOutcome, RewardError> {
    let ad = Advertisement::find_by_id(pool, ad_id)
        .await?
        .ok_or(RewardError::AdNotFound)?;

    if ad.status != AdStatus::Approved {
        return Err(RewardError::AdNotAvailable);
    }

    let package = user_package(pool, user).await?;

    let mut tx = pool.begin().await?;

    // Locking the user row serializes this user's reward flows; two
    // concurrent views of different ads would otherwise both pass the count.
    User::lock_row(&mut *tx, user.id).await?;

    let views_today = AdView::count_today(&mut *tx, user.id).await?;
    if !under_daily_limit(views_today, package.daily_ad_limit) {
        return Err(RewardError::DailyLimitReached);
    }

    // Unique (ad, user, day) constraint carries the once-per-day rule
    let view = AdView::record(&mut *tx, ad.id, user.id).await?;
    if view.is_none() {
        return Err(RewardError::AlreadyDone);
    }

    Advertisement::increment_view_count(&mut *tx, ad.id).await?;
    User::credit(&mut *tx, user.id, ad.reward_cents).await?;
    Transaction::record(
        &mut *tx,
        user.id,
        TxKind::AdReward,
        ad.reward_cents,
        Some(ad.id),
        "Advertisement view reward",
    )
    .await?;

    tx.commit().await?;

    tracing::info!(reward_cents = ad.reward_cents, "Ad view rewarded");

    Ok(RewardOutcome {
        rewarded_cents: ad.reward_cents,
        correct: None,
    })
}

/// Settles a brain teaser answer.
///
/// Each user gets exactly one attempt per teaser, ever. A correct answer
/// is rewarded unless the package's daily teaser limit is spent; a wrong
/// answer still burns the attempt.
#[tracing::instrument(skip(pool, user), fields(user_id = %user.id, teaser_id = %teaser_id))]
pub async fn credit_teaser_answer(
    pool: &PgPool,
    user: &User,
    teaser_id: Uuid,
    choice: i32,
) -> Result<RewardOutcome, RewardError> {
    let teaser = BrainTeaser::find_by_id(pool, teaser_id)
        .await?
        .ok_or(RewardError::TeaserNotFound)?;

    if !teaser.is_active {
        return Err(RewardError::TeaserNotFound);
    }

    if !teaser.is_valid_choice(choice) {
        return Err(RewardError::InvalidChoice);
    }

    let package = user_package(pool, user).await?;
    let correct = teaser.is_correct(choice);

    let mut tx = pool.begin().await?;

    User::lock_row(&mut *tx, user.id).await?;

    if correct {
        let correct_today = TeaserAttempt::count_correct_today(&mut *tx, user.id).await?;
        if !under_daily_limit(correct_today, package.daily_teaser_limit) {
            return Err(RewardError::DailyLimitReached);
        }
    }

    let attempt = TeaserAttempt::record(&mut *tx, teaser.id, user.id, choice, correct).await?;
    if attempt.is_none() {
        return Err(RewardError::AlreadyDone);
    }

    let rewarded_cents = if correct {
        User::credit(&mut *tx, user.id, teaser.reward_cents).await?;
        Transaction::record(
            &mut *tx,
            user.id,
            TxKind::TeaserReward,
            teaser.reward_cents,
            Some(teaser.id),
            "Brain teaser reward",
        )
        .await?;
        teaser.reward_cents
    } else {
        0
    };

    tx.commit().await?;

    tracing::info!(correct, rewarded_cents, "Teaser attempt settled");

    Ok(RewardOutcome {
        rewarded_cents,
        correct: Some(correct),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_under_daily_limit_below_cap() {
        assert!(under_daily_limit(0, 5));
        assert!(under_daily_limit(4, 5));
    }

    #[test]
    fn test_daily_limit_is_exclusive_at_the_cap() {
        assert!(!under_daily_limit(5, 5));
        assert!(!under_daily_limit(6, 5));
    }

    #[test]
    fn test_zero_limit_allows_nothing() {
        assert!(!under_daily_limit(0, 0));
    }
}
