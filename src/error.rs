use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Daily limit reached")]
    LimitReached,

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::InsufficientFunds | AppError::LimitReached => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Driver and internal details stay in the logs, not the response
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Database error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// True when the driver reported a foreign key violation, i.e. the row is
/// still referenced by other tables.
pub fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

impl From<crate::services::registration::RegistrationError> for AppError {
    fn from(e: crate::services::registration::RegistrationError) -> Self {
        use crate::services::registration::RegistrationError::*;
        match e {
            Database(e) => AppError::Database(e),
            KeyNotFound => AppError::NotFound("Access key not found".to_string()),
            KeyNotUsable => {
                AppError::Conflict("Access key has already been used or is no longer valid".to_string())
            }
            EmailTaken => AppError::Conflict("Email is already registered".to_string()),
            UnknownReferralCode => AppError::Validation("Unknown referral code".to_string()),
            Password(e) => AppError::Internal(e.into()),
            Code(e) => AppError::Internal(e.into()),
            Token(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<crate::services::registration::LoginError> for AppError {
    fn from(e: crate::services::registration::LoginError) -> Self {
        use crate::services::registration::LoginError::*;
        match e {
            Database(e) => AppError::Database(e),
            InvalidCredentials => AppError::Unauthorized,
            Password(e) => AppError::Internal(e.into()),
            Token(e) => AppError::Internal(e.into()),
        }
    }
}

impl From<crate::services::rewards::RewardError> for AppError {
    fn from(e: crate::services::rewards::RewardError) -> Self {
        use crate::services::rewards::RewardError::*;
        match e {
            Database(e) => AppError::Database(e),
            AdNotFound => AppError::NotFound("Advertisement not found".to_string()),
            AdNotAvailable => AppError::Conflict("Advertisement is not available".to_string()),
            TeaserNotFound => AppError::NotFound("Brain teaser not found".to_string()),
            InvalidChoice => AppError::Validation("Invalid choice".to_string()),
            AlreadyDone => AppError::Conflict("Already completed".to_string()),
            DailyLimitReached => AppError::LimitReached,
            NoPackage => AppError::Conflict("User has no package".to_string()),
        }
    }
}

impl From<crate::services::wallet::WalletError> for AppError {
    fn from(e: crate::services::wallet::WalletError) -> Self {
        use crate::services::wallet::WalletError::*;
        match e {
            Database(e) => AppError::Database(e),
            InvalidAmount => AppError::Validation("Amount must be positive".to_string()),
            BelowMinimum => {
                AppError::Validation("Amount is below the package minimum withdrawal".to_string())
            }
            InsufficientFunds => AppError::InsufficientFunds,
            RequestNotFound => AppError::NotFound("Withdrawal request not found".to_string()),
            AlreadyDecided => AppError::Conflict("Request has already been decided".to_string()),
            NoPackage => AppError::Conflict("User has no package".to_string()),
        }
    }
}

impl From<crate::services::marketplace::PurchaseError> for AppError {
    fn from(e: crate::services::marketplace::PurchaseError) -> Self {
        use crate::services::marketplace::PurchaseError::*;
        match e {
            Database(e) => AppError::Database(e),
            ProductNotFound => AppError::NotFound("Product not found".to_string()),
            NotAvailable => AppError::Conflict("Product is not available".to_string()),
            OwnProduct => AppError::Validation("You cannot buy your own product".to_string()),
            InsufficientFunds => AppError::InsufficientFunds,
        }
    }
}

impl From<crate::services::qr_generator::QrGenerationError> for AppError {
    fn from(e: crate::services::qr_generator::QrGenerationError) -> Self {
        AppError::Internal(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::ErrorKind;
    use std::borrow::Cow;
    use std::error::Error as StdError;

    #[derive(Debug)]
    struct StubDbError(ErrorKind);

    impl std::fmt::Display for StubDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "constraint violation")
        }
    }

    impl StdError for StubDbError {}

    impl sqlx::error::DatabaseError for StubDbError {
        fn message(&self) -> &str {
            "constraint violation"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            None
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.0 {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                ErrorKind::NotNullViolation => ErrorKind::NotNullViolation,
                ErrorKind::CheckViolation => ErrorKind::CheckViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(StubDbError(kind)))
    }

    #[test]
    fn test_detects_foreign_key_violation() {
        assert!(is_foreign_key_violation(&db_error(
            ErrorKind::ForeignKeyViolation
        )));
    }

    #[test]
    fn test_other_errors_are_not_foreign_key_violations() {
        assert!(!is_foreign_key_violation(&db_error(
            ErrorKind::UniqueViolation
        )));
        assert!(!is_foreign_key_violation(&sqlx::Error::RowNotFound));
    }
}
