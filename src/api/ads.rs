use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::middleware::{auth::AuthUser, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::Result;
use crate::models::advertisement::{AdStatus, Advertisement};
use crate::services::rewards;

async fn list_ads(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<ApiResponse<Vec<Advertisement>>>> {
    let ads = Advertisement::list(&state.pool, Some(AdStatus::Approved)).await?;
    Ok(ok(ads))
}

#[derive(Debug, Serialize)]
struct ViewData {
    rewarded_cents: i64,
}

async fn view_ad(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(ad_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ViewData>>> {
    let outcome = rewards::credit_ad_view(&state.pool, &user, ad_id).await?;

    Ok(ok_with_message(
        "View rewarded",
        ViewData {
            rewarded_cents: outcome.rewarded_cents,
        },
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ads", get(list_ads))
        .route("/ads/:id/view", post(view_ad))
}
