//! Skin-image analysis endpoint.

use axum::extract::{Multipart, State};
use axum::{Extension, Json};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, AuthUser};
use crate::clinical::{normalize_image, record_analysis, SkinAnalysisResponse};

/// Upload cap for the multipart body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// `POST /api/ai/skin-analysis`: multipart upload, image in the `file` field.
pub async fn analyze(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<SkinAnalysisResponse>, ApiError> {
    let mut image_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed upload: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {e}")))?;
            image_bytes = Some(bytes);
        }
    }
    let bytes = image_bytes.ok_or_else(|| ApiError::BadRequest("No image file provided".into()))?;

    let image_base64 = tokio::task::spawn_blocking(move || normalize_image(&bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("Image task failed: {e}")))??;

    let conn = ctx.core.lock_db()?;
    let response = record_analysis(&conn, &user.user_id, image_base64)?;
    Ok(Json(response))
}
