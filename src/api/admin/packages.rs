use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::api::middleware::{auth::get_authenticated_admin, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::{is_foreign_key_violation, AppError, Result};
use crate::models::package::{Package, PackageData};

fn validate_package(data: &PackageData) -> Result<()> {
    if data.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    if data.price_cents < 0 || data.referral_bonus_cents < 0 || data.min_withdrawal_cents < 0 {
        return Err(AppError::Validation("Amounts cannot be negative".to_string()));
    }
    if data.daily_ad_limit < 0 || data.daily_teaser_limit < 0 || data.course_limit < 0 {
        return Err(AppError::Validation("Limits cannot be negative".to_string()));
    }
    Ok(())
}

async fn list_packages(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<Package>>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    let packages = Package::list(&state.pool, true).await?;
    Ok(ok(packages))
}

async fn create_package(
    State(state): State<AppState>,
    session: Session,
    ApiJson(data): ApiJson<PackageData>,
) -> Result<Json<ApiResponse<Package>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    validate_package(&data)?;

    let package = Package::create(&state.pool, data).await?;
    Ok(ok_with_message("Package created", package))
}

async fn update_package(
    State(state): State<AppState>,
    session: Session,
    Path(package_id): Path<Uuid>,
    ApiJson(data): ApiJson<PackageData>,
) -> Result<Json<ApiResponse<Package>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    validate_package(&data)?;

    if !Package::update(&state.pool, package_id, data).await? {
        return Err(AppError::NotFound("Package not found".to_string()));
    }

    let package = Package::find_by_id(&state.pool, package_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Package not found".to_string()))?;
    Ok(ok_with_message("Package updated", package))
}

async fn delete_package(
    State(state): State<AppState>,
    session: Session,
    Path(package_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    match Package::delete(&state.pool, package_id).await {
        Ok(true) => Ok(crate::api::ok_message("Package deleted")),
        Ok(false) => Err(AppError::NotFound("Package not found".to_string())),
        Err(e) if is_foreign_key_violation(&e) => Err(AppError::Conflict(
            "Package is still referenced by users or access keys".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

async fn set_active(state: &AppState, package_id: Uuid, active: bool) -> Result<()> {
    if !Package::set_active(&state.pool, package_id, active).await? {
        return Err(AppError::NotFound("Package not found".to_string()));
    }
    Ok(())
}

async fn activate_package(
    State(state): State<AppState>,
    session: Session,
    Path(package_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    set_active(&state, package_id, true).await?;
    Ok(crate::api::ok_message("Package activated"))
}

async fn deactivate_package(
    State(state): State<AppState>,
    session: Session,
    Path(package_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    get_authenticated_admin(&state.pool, &session).await?;
    set_active(&state, package_id, false).await?;
    Ok(crate::api::ok_message("Package deactivated"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/packages", get(list_packages).post(create_package))
        .route("/packages/:id", put(update_package).delete(delete_package))
        .route("/packages/:id/activate", post(activate_package))
        .route("/packages/:id/deactivate", post(deactivate_package))
}
