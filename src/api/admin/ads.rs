use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::extract::{ApiJson, ApiQuery};
use crate::api::middleware::{auth::get_authenticated_admin, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::advertisement::{AdData, AdStatus, Advertisement};

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<AdStatus>,
}

async fn list_ads(
    State(state): State<AppState>,
    session: Session,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Advertisement>>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    let ads = Advertisement::list(&state.pool, query.status).await?;
    Ok(ok(ads))
}

fn validate_ad(data: &AdData) -> Result<()> {
    if data.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if data.reward_cents <= 0 {
        return Err(AppError::Validation("Reward must be positive".to_string()));
    }
    url::Url::parse(&data.target_url)
        .map_err(|_| AppError::Validation("target_url is not a valid URL".to_string()))?;
    Ok(())
}

async fn create_ad(
    State(state): State<AppState>,
    session: Session,
    ApiJson(data): ApiJson<AdData>,
) -> Result<Json<ApiResponse<Advertisement>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    validate_ad(&data)?;

    let ad = Advertisement::create(&state.pool, data).await?;
    Ok(ok_with_message("Advertisement created", ad))
}

async fn update_ad(
    State(state): State<AppState>,
    session: Session,
    Path(ad_id): Path<Uuid>,
    ApiJson(data): ApiJson<AdData>,
) -> Result<Json<ApiResponse<Advertisement>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    validate_ad(&data)?;

    if !Advertisement::update(&state.pool, ad_id, data).await? {
        return Err(AppError::NotFound("Advertisement not found".to_string()));
    }

    let ad = Advertisement::find_by_id(&state.pool, ad_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Advertisement not found".to_string()))?;
    Ok(ok_with_message("Advertisement updated", ad))
}

async fn transition(state: &AppState, ad_id: Uuid, to: AdStatus) -> Result<Advertisement> {
    let ad = Advertisement::find_by_id(&state.pool, ad_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Advertisement not found".to_string()))?;

    if !ad.can_transition_to(to) {
        return Err(AppError::Conflict(format!(
            "Cannot move advertisement from {} to {}",
            ad.status.as_str(),
            to.as_str()
        )));
    }

    // Guarded on the status we just read; a racing admin loses here
    if !Advertisement::set_status(&state.pool, ad.id, ad.status, to).await? {
        return Err(AppError::Conflict(
            "Advertisement status changed concurrently".to_string(),
        ));
    }

    Advertisement::find_by_id(&state.pool, ad.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Advertisement not found".to_string()))
}

async fn approve_ad(
    State(state): State<AppState>,
    session: Session,
    Path(ad_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Advertisement>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    let ad = transition(&state, ad_id, AdStatus::Approved).await?;
    Ok(ok_with_message("Advertisement approved", ad))
}

async fn reject_ad(
    State(state): State<AppState>,
    session: Session,
    Path(ad_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Advertisement>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    let ad = transition(&state, ad_id, AdStatus::Rejected).await?;
    Ok(ok_with_message("Advertisement rejected", ad))
}

async fn pause_ad(
    State(state): State<AppState>,
    session: Session,
    Path(ad_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Advertisement>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    let ad = transition(&state, ad_id, AdStatus::Paused).await?;
    Ok(ok_with_message("Advertisement paused", ad))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ads", get(list_ads).post(create_ad))
        .route("/ads/:id", put(update_ad))
        .route("/ads/:id/approve", post(approve_ad))
        .route("/ads/:id/reject", post(reject_ad))
        .route("/ads/:id/pause", post(pause_ad))
}
