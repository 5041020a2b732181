use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::{auth::AuthUser, session::AppState};
use crate::api::{ok, ApiResponse};
use crate::error::Result;
use crate::models::transaction::{Transaction, TxKind};
use crate::models::user::User;
use crate::services::qr_generator;

#[derive(Debug, Serialize)]
struct ReferralData {
    referral_code: String,
    signup_link: String,
    signup_count: i64,
    bonus_total_cents: i64,
}

async fn referral_summary(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<ReferralData>>> {
    let signup_count = User::count_referrals(&state.pool, user.id).await?;
    let bonus_total_cents =
        Transaction::sum_for_user_kind(&state.pool, user.id, TxKind::ReferralBonus).await?;

    let signup_link =
        qr_generator::referral_link(&state.config.base_url, &user.referral_code)?.to_string();

    Ok(ok(ReferralData {
        referral_code: user.referral_code,
        signup_link,
        signup_count,
        bonus_total_cents,
    }))
}

async fn referral_qr(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Response> {
    let svg = qr_generator::generate_referral_qr_svg(&state.config.base_url, &user.referral_code)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/svg+xml")],
        svg,
    )
        .into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/referrals", get(referral_summary))
        .route("/referrals/qr", get(referral_qr))
}
