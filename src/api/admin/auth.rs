use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::extract::ApiJson;
use crate::api::middleware::session::{AppState, SESSION_KEY_ADMIN_ID};
use crate::api::{ok_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::user::User;
use crate::services::password;

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginBody>,
) -> Result<Json<ApiResponse<()>>> {
    let user = User::find_by_email(&state.pool, &body.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = password::verify_password(&body.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.into()))?;

    if !valid || !user.is_admin() {
        return Err(AppError::Unauthorized);
    }

    session
        .insert(SESSION_KEY_ADMIN_ID, user.id)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session error: {e}")))?;

    tracing::info!(admin_id = %user.id, "Admin logged in");

    Ok(ok_message("Logged in"))
}

async fn logout(session: Session) -> Result<Json<ApiResponse<()>>> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Session error: {e}")))?;

    Ok(ok_message("Logged out"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}
