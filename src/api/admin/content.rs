use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::api::middleware::{auth::get_authenticated_admin, session::AppState};
use crate::api::{ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::brain_teaser::{BrainTeaser, TeaserData};
use crate::models::course::{Course, CourseData};

async fn create_teaser(
    State(state): State<AppState>,
    session: Session,
    ApiJson(data): ApiJson<TeaserData>,
) -> Result<Json<ApiResponse<BrainTeaser>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    if data.choices.len() < 2 {
        return Err(AppError::Validation(
            "A teaser needs at least two choices".to_string(),
        ));
    }
    if data.correct_choice < 0 || data.correct_choice as usize >= data.choices.len() {
        return Err(AppError::Validation(
            "correct_choice is out of range".to_string(),
        ));
    }
    if data.reward_cents <= 0 {
        return Err(AppError::Validation("Reward must be positive".to_string()));
    }

    let teaser = BrainTeaser::create(&state.pool, data).await?;
    Ok(ok_with_message("Teaser created", teaser))
}

async fn deactivate_teaser(
    State(state): State<AppState>,
    session: Session,
    Path(teaser_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    if !BrainTeaser::set_active(&state.pool, teaser_id, false).await? {
        return Err(AppError::NotFound("Teaser not found".to_string()));
    }
    Ok(crate::api::ok_message("Teaser deactivated"))
}

async fn create_course(
    State(state): State<AppState>,
    session: Session,
    ApiJson(data): ApiJson<CourseData>,
) -> Result<Json<ApiResponse<Course>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    if data.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    let course = Course::create(&state.pool, data).await?;
    Ok(ok_with_message("Course created", course))
}

async fn publish_course(
    State(state): State<AppState>,
    session: Session,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    if !Course::set_published(&state.pool, course_id, true).await? {
        return Err(AppError::NotFound("Course not found".to_string()));
    }
    Ok(crate::api::ok_message("Course published"))
}

async fn unpublish_course(
    State(state): State<AppState>,
    session: Session,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    get_authenticated_admin(&state.pool, &session).await?;

    if !Course::set_published(&state.pool, course_id, false).await? {
        return Err(AppError::NotFound("Course not found".to_string()));
    }
    Ok(crate::api::ok_message("Course unpublished"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/teasers", post(create_teaser))
        .route("/teasers/:id/deactivate", post(deactivate_teaser))
        .route("/courses", post(create_course))
        .route("/courses/:id/publish", post(publish_course))
        .route("/courses/:id/unpublish", post(unpublish_course))
}
