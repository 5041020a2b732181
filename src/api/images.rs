use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::extract::ApiJson;
use crate::api::middleware::{auth::AuthUser, session::AppState};
use crate::api::{ok_with_message, ApiResponse};
use crate::error::{AppError, Result};
use crate::models::image::{Image, ImageMeta};
use crate::models::processing_job::{JobKind, ProcessingJob};

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Request body ceiling for uploads. Base64 inflates the raw bytes by 4/3,
/// and the JSON framing needs a little room on top; axum's 2 MB default
/// would reject a full-size upload before the handler ever ran.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES / 3 * 4 + 64 * 1024;

const ALLOWED_CONTENT_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

#[derive(Debug, Deserialize)]
struct UploadBody {
    filename: String,
    content_type: String,
    /// Base64-encoded image bytes.
    data: String,
}

async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<UploadBody>,
) -> Result<Json<ApiResponse<ImageMeta>>> {
    if !ALLOWED_CONTENT_TYPES.contains(&body.content_type.as_str()) {
        return Err(AppError::Validation("Unsupported content type".to_string()));
    }

    let data = base64::engine::general_purpose::STANDARD
        .decode(&body.data)
        .map_err(|_| AppError::Validation("data is not valid base64".to_string()))?;

    if data.is_empty() || data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "Image must be between 1 byte and 5 MiB".to_string(),
        ));
    }

    let meta = Image::create(
        &state.pool,
        user.id,
        &body.filename,
        &body.content_type,
        data,
    )
    .await?;

    // Thumbnail generation happens off the request path
    ProcessingJob::enqueue(
        &state.pool,
        JobKind::ImageThumbnail,
        serde_json::json!({ "image_id": meta.id }),
    )
    .await?;

    Ok(ok_with_message("Image uploaded", meta))
}

async fn serve(image: Image, thumbnail: bool) -> Result<Response> {
    let (bytes, content_type) = if thumbnail {
        let thumb = image
            .thumbnail
            .ok_or_else(|| AppError::NotFound("Thumbnail not ready".to_string()))?;
        (thumb, "image/png".to_string())
    } else {
        (image.data, image.content_type)
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        bytes,
    )
        .into_response())
}

async fn get_image(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(image_id): Path<Uuid>,
) -> Result<Response> {
    let image = Image::find_by_id(&state.pool, image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    serve(image, false).await
}

async fn get_thumbnail(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(image_id): Path<Uuid>,
) -> Result<Response> {
    let image = Image::find_by_id(&state.pool, image_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".to_string()))?;
    serve(image, true).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/images", post(upload_image))
        .route("/images/:id", get(get_image))
        .route("/images/:id/thumbnail", get(get_thumbnail))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;

    #[test]
    fn test_body_limit_admits_a_maximum_size_upload() {
        // Encoded length of MAX_UPLOAD_BYTES raw bytes, per the standard
        // base64 engine's 3-to-4 expansion with padding.
        let encoded_len = base64::engine::general_purpose::STANDARD
            .encode(vec![0u8; MAX_UPLOAD_BYTES])
            .len();

        assert!(UPLOAD_BODY_LIMIT > encoded_len + 1024);
    }
}
