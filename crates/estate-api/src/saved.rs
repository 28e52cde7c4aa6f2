use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use estate_types::api::Claims;

use crate::auth::{AppState, db_call};
use crate::convert;
use crate::error::ApiError;
use crate::extract::{Json, Path};

/// GET /me/saved. Bookmarked listings, most recently saved first.
pub async fn list_saved(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let rows = db_call(&state, move |db| db.list_saved_for_user(&uid)).await?;
    Ok(Json(convert::properties(rows)?))
}

/// POST /properties/{id}/save. 201 on a new bookmark, 200 if already saved.
pub async fn save(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (pid, uid) = (property_id.to_string(), claims.sub.to_string());
    let saved_id = Uuid::new_v4().to_string();

    let inserted = db_call(&state, move |db| -> anyhow::Result<Option<bool>> {
        if db.get_property(&pid)?.is_none() {
            return Ok(None);
        }
        Ok(Some(db.save_property(&saved_id, &uid, &pid)?))
    })
    .await?
    .ok_or(ApiError::NotFound("Property"))?;

    Ok(if inserted { StatusCode::CREATED } else { StatusCode::OK })
}

/// DELETE /properties/{id}/save
pub async fn unsave(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (pid, uid) = (property_id.to_string(), claims.sub.to_string());
    let removed = db_call(&state, move |db| db.unsave_property(&uid, &pid)).await?;
    if !removed {
        return Err(ApiError::NotFound("Saved property"));
    }
    Ok(StatusCode::NO_CONTENT)
}
