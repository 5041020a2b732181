use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::api::middleware::{auth::AuthUser, session::AppState};
use crate::api::{ok, ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::course::{Course, CourseEnrollment};
use crate::models::package::Package;
use crate::models::user::User;

async fn list_courses(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<ApiResponse<Vec<Course>>>> {
    let courses = Course::list_published(&state.pool).await?;
    Ok(ok(courses))
}

async fn enroll(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CourseEnrollment>>> {
    let course = Course::find_by_id(&state.pool, course_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

    if !course.is_published {
        return Err(AppError::NotFound("Course not found".to_string()));
    }

    let package_id = user
        .package_id
        .ok_or_else(|| AppError::Conflict("User has no package".to_string()))?;
    let package = Package::find_by_id(&state.pool, package_id)
        .await?
        .ok_or_else(|| AppError::Conflict("User has no package".to_string()))?;

    // Lock the user row so two concurrent enrollments cannot both pass the
    // course cap check.
    let mut tx = state.pool.begin().await?;
    User::lock_row(&mut *tx, user.id).await?;

    let enrolled = CourseEnrollment::count_for_user(&mut *tx, user.id).await?;
    if enrolled >= package.course_limit as i64 {
        return Err(AppError::LimitReached);
    }

    let enrollment = CourseEnrollment::create(&mut *tx, course.id, user.id)
        .await?
        .ok_or_else(|| AppError::Conflict("Already enrolled".to_string()))?;

    tx.commit().await?;

    Ok(ok_with_message("Enrolled", enrollment))
}

async fn enrolled_courses(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<ApiResponse<Vec<Course>>>> {
    let courses = CourseEnrollment::list_courses_for_user(&state.pool, user.id).await?;
    Ok(ok(courses))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/enrolled", get(enrolled_courses))
        .route("/courses/:id/enroll", post(enroll))
}
