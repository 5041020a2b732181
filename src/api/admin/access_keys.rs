use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::middleware::{auth::get_authenticated_admin, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::access_key::{AccessKey, KeyStatus};
use crate::models::package::Package;
use crate::services::codes;

const MAX_BATCH: i64 = 1000;

#[derive(Debug, Deserialize)]
struct GenerateBody {
    package_id: Uuid,
    count: i64,
    expires_at: Option<DateTime<Utc>>,
}

async fn generate_keys(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<GenerateBody>,
) -> Result<Json<ApiResponse<Vec<AccessKey>>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    if body.count < 1 || body.count > MAX_BATCH {
        return Err(AppError::Validation(format!(
            "count must be between 1 and {MAX_BATCH}"
        )));
    }

    let package = Package::find_by_id(&state.pool, body.package_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Package not found".to_string()))?;

    let codes: Vec<String> = (0..body.count)
        .map(|_| codes::generate_key_code())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| AppError::Internal(e.into()))?;

    let keys = AccessKey::create_batch(&state.pool, package.id, &codes, body.expires_at).await?;

    tracing::info!(
        package_id = %package.id,
        count = keys.len(),
        "Access key batch generated"
    );

    Ok(ok_with_message("Keys generated", keys))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<KeyStatus>,
    package_id: Option<Uuid>,
}

async fn list_keys(
    State(state): State<AppState>,
    session: Session,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<AccessKey>>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    let keys = AccessKey::list(&state.pool, query.status, query.package_id).await?;
    Ok(ok(keys))
}

async fn revoke_key(
    State(state): State<AppState>,
    session: Session,
    Path(key_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    if !AccessKey::revoke(&state.pool, key_id).await? {
        return Err(AppError::Conflict(
            "Key does not exist or has already been used".to_string(),
        ));
    }

    Ok(crate::api::ok_message("Key revoked"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/access-keys", get(list_keys).post(generate_keys))
        .route("/access-keys/:id/revoke", post(revoke_key))
}
