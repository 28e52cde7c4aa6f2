use axum::{
    Extension,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use estate_types::api::{Claims, ImageUploadResponse, SessionKind};

use crate::auth::{AppState, db_call};
use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::storage::image_extension;

/// POST /properties/{id}/images. Raw image body. The owner or any admin may
/// upload; the public URL is appended to the listing's gallery.
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(property_id): Path<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let extension = image_extension(content_type)
        .ok_or_else(|| ApiError::UnsupportedMediaType(content_type.to_string()))?;

    if body.is_empty() {
        return Err(ApiError::BadRequest("Image body is empty".into()));
    }
    if body.len() > state.max_image_bytes {
        return Err(ApiError::PayloadTooLarge(state.max_image_bytes));
    }

    let pid = property_id.to_string();
    let owner = db_call(&state, move |db| db.get_property(&pid))
        .await?
        .ok_or(ApiError::NotFound("Property"))?
        .property
        .user_id;
    if claims.kind == SessionKind::User && owner != claims.sub.to_string() {
        // Looks the same as a missing listing to non-owners.
        return Err(ApiError::NotFound("Property"));
    }

    let (url, images) = attach_image(&state, property_id, extension, &body).await?;

    info!("Stored image {} ({} bytes) for property {}", url, body.len(), property_id);
    Ok((StatusCode::CREATED, Json(ImageUploadResponse { url, images })))
}

/// Write the image, then append its URL to the listing. If the listing is
/// gone by then, its image directory is removed again.
async fn attach_image(
    state: &AppState,
    property_id: Uuid,
    extension: &str,
    data: &[u8],
) -> Result<(String, Vec<String>), ApiError> {
    let key = state
        .storage
        .save_property_image(property_id, extension, data)
        .await?;
    let url = format!("{}/storage/{}", state.public_url.trim_end_matches('/'), key);

    let (pid, stored) = (property_id.to_string(), url.clone());
    let appended = db_call(state, move |db| db.add_property_image(&pid, &stored)).await?;
    let Some(images) = appended else {
        if let Err(e) = state.storage.delete_property_images(property_id).await {
            warn!("Orphaned image for deleted property {}: {}", property_id, e);
        }
        return Err(ApiError::NotFound("Property"));
    };
    Ok((url, images))
}
