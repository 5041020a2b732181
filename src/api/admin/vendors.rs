use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::api::middleware::{auth::get_authenticated_admin, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::access_key::AccessKey;
use crate::models::user::User;

const MAX_COMMISSION_BPS: i32 = 5000;

fn validate_rate(commission_rate_bps: i32) -> Result<()> {
    if !(0..=MAX_COMMISSION_BPS).contains(&commission_rate_bps) {
        return Err(AppError::Validation(format!(
            "commission_rate_bps must be between 0 and {MAX_COMMISSION_BPS}"
        )));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct MakeVendorBody {
    user_id: Uuid,
    commission_rate_bps: i32,
}

/// Promotes an existing member to vendor.
async fn make_vendor(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<MakeVendorBody>,
) -> Result<Json<ApiResponse<User>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    validate_rate(body.commission_rate_bps)?;

    if !User::make_vendor(&state.pool, body.user_id, body.commission_rate_bps).await? {
        return Err(AppError::Conflict(
            "User does not exist or is not a plain member".to_string(),
        ));
    }

    let vendor = User::find_by_id(&state.pool, body.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    tracing::info!(vendor_id = %vendor.id, rate_bps = body.commission_rate_bps, "Vendor created");

    Ok(ok_with_message("Vendor created", vendor))
}

#[derive(Debug, Serialize)]
struct VendorSummary {
    vendor: User,
    unsold_keys: i64,
    sold_keys: i64,
}

async fn list_vendors(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<VendorSummary>>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    let vendors = User::list_vendors(&state.pool).await?;

    let mut summaries = Vec::with_capacity(vendors.len());
    for vendor in vendors {
        let (unsold, sold) = AccessKey::vendor_key_counts(&state.pool, vendor.id).await?;
        summaries.push(VendorSummary {
            vendor,
            unsold_keys: unsold,
            sold_keys: sold,
        });
    }

    Ok(ok(summaries))
}

#[derive(Debug, Deserialize)]
struct CommissionBody {
    commission_rate_bps: i32,
}

async fn update_commission(
    State(state): State<AppState>,
    session: Session,
    Path(vendor_id): Path<Uuid>,
    ApiJson(body): ApiJson<CommissionBody>,
) -> Result<Json<ApiResponse<()>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    validate_rate(body.commission_rate_bps)?;

    if !User::update_commission(&state.pool, vendor_id, body.commission_rate_bps).await? {
        return Err(AppError::NotFound("Vendor not found".to_string()));
    }

    Ok(crate::api::ok_message("Commission updated"))
}

#[derive(Debug, Deserialize)]
struct AssignKeysBody {
    package_id: Uuid,
    count: i64,
}

#[derive(Debug, Serialize)]
struct AssignKeysData {
    assigned: u64,
}

/// Allocates a batch of unsold keys to a vendor for resale.
async fn assign_keys(
    State(state): State<AppState>,
    session: Session,
    Path(vendor_id): Path<Uuid>,
    ApiJson(body): ApiJson<AssignKeysBody>,
) -> Result<Json<ApiResponse<AssignKeysData>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    if body.count < 1 {
        return Err(AppError::Validation("count must be positive".to_string()));
    }

    let vendor = User::find_by_id(&state.pool, vendor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Vendor not found".to_string()))?;

    if !vendor.is_vendor() {
        return Err(AppError::Conflict("User is not a vendor".to_string()));
    }

    let assigned =
        AccessKey::assign_to_vendor(&state.pool, body.package_id, vendor.id, body.count).await?;

    tracing::info!(vendor_id = %vendor.id, assigned, "Keys assigned to vendor");

    Ok(ok_with_message("Keys assigned", AssignKeysData { assigned }))
}

async fn demote_vendor(
    State(state): State<AppState>,
    session: Session,
    Path(vendor_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    if !User::revoke_vendor(&state.pool, vendor_id).await? {
        return Err(AppError::NotFound("Vendor not found".to_string()));
    }

    Ok(crate::api::ok_message("Vendor demoted"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vendors", get(list_vendors).post(make_vendor))
        .route("/vendors/:id/commission", put(update_commission))
        .route("/vendors/:id/assign-keys", post(assign_keys))
        .route("/vendors/:id/demote", post(demote_vendor))
}
