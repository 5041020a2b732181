use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sqlx::PgPool;
use tower_sessions::Session;
use uuid::Uuid;

use super::session::{AppState, SESSION_KEY_ADMIN_ID};
use crate::error::AppError;
use crate::models::user::User;
use crate::services::token;

/// Extractor for the bearer-token-authenticated user on `/api/v1`.
///
/// Tokens are looked up by digest; the raw token never touches the
/// database.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let raw_token = header_value
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let digest = token::digest_token(raw_token);

        let user = User::find_by_token_hash(&state.pool, &digest)
            .await?
            .ok_or(AppError::Unauthorized)?;

        Ok(AuthUser(user))
    }
}

/// Loads the session-authenticated admin for `/admin` handlers.
pub async fn get_authenticated_admin(pool: &PgPool, session: &Session) -> Result<User, AppError> {
    let admin_id: Uuid = session
        .get(SESSION_KEY_ADMIN_ID)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session error: {e}")))?
        .ok_or(AppError::Unauthorized)?;

    let user = User::find_by_id(pool, admin_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }

    Ok(user)
}
