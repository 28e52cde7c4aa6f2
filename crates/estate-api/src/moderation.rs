//! Admin views over users, listings and bookmarks. Every call passes the
//! requesting admin's id from the verified session down to the database,
//! which re-checks it.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use estate_types::api::{Claims, PropertyPatch, VerificationRequest};
use estate_types::models::{SavedPropertyDetail, UserSummary};

use crate::auth::{AppState, db_call};
use crate::convert;
use crate::error::ApiError;
use crate::extract::{Json, Path, Query};
use crate::validation;

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    /// Lowercased needle, or `None` when there is nothing to search for.
    fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

fn user_matches(summary: &UserSummary, needle: &str) -> bool {
    let user = &summary.user;
    contains(Some(&user.email), needle)
        || contains(Some(&user.full_name), needle)
        || contains(user.phone.as_deref(), needle)
}

fn saved_matches(detail: &SavedPropertyDetail, needle: &str) -> bool {
    contains(Some(&detail.property_title), needle)
        || contains(Some(&detail.user_name), needle)
        || contains(detail.user_email.as_deref(), needle)
        || contains(detail.property_address.as_deref(), needle)
}

/// GET /admin/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let stats = db_call(&state, move |db| db.admin_dashboard_stats(&requester)).await?;
    Ok(Json(stats))
}

// -- Users --

/// GET /admin/users?search=
pub async fn list_users(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let rows = db_call(&state, move |db| db.admin_list_users(&requester)).await?;

    let mut users = rows
        .into_iter()
        .map(convert::user_summary)
        .collect::<anyhow::Result<Vec<_>>>()?;
    if let Some(needle) = query.needle() {
        users.retain(|u| user_matches(u, &needle));
    }
    Ok(Json(users))
}

/// DELETE /admin/users/{id}. Their listings stay, orphaned.
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let target = user_id.to_string();
    let removed = db_call(&state, move |db| db.admin_delete_user(&requester, &target)).await?;
    if !removed {
        return Err(ApiError::NotFound("User"));
    }
    info!("Admin {} deleted user {}", claims.sub, user_id);
    Ok(StatusCode::NO_CONTENT)
}

// -- Listings --

/// GET /admin/properties
pub async fn list_properties(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let rows = db_call(&state, move |db| {
        db.admin_get_all_properties_with_owners(&requester)
    })
    .await?;
    let properties = rows
        .into_iter()
        .map(convert::property_with_owner)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Json(properties))
}

/// PATCH /admin/properties/{id}. Keys outside the editable set are ignored.
pub async fn update_property(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(property_id): Path<Uuid>,
    Json(patch): Json<PropertyPatch>,
) -> Result<impl IntoResponse, ApiError> {
    validation::property_patch(&patch)?;

    let requester = claims.sub.to_string();
    let pid = property_id.to_string();
    let row = db_call(&state, move |db| -> Result<_, ApiError> {
        if !db.admin_update_property(&requester, &pid, &patch)? {
            return Ok(None);
        }
        Ok(db.get_property(&pid)?)
    })
    .await?
    .ok_or(ApiError::NotFound("Property"))?;

    Ok(Json(convert::property_with_owner(row)?))
}

/// PUT /admin/properties/{id}/verification
pub async fn set_verification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(property_id): Path<Uuid>,
    Json(req): Json<VerificationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let pid = property_id.to_string();
    let row = db_call(&state, move |db| -> Result<_, ApiError> {
        if !db.update_property_verification(&requester, &pid, req.verified)? {
            return Ok(None);
        }
        Ok(db.get_property(&pid)?)
    })
    .await?
    .ok_or(ApiError::NotFound("Property"))?;

    info!(
        "Admin {} set verification of {} to {}",
        claims.sub, property_id, row.property.verification_status
    );
    Ok(Json(convert::property_with_owner(row)?))
}

/// DELETE /admin/properties/{id}. Bookmarks go with it, then its images.
pub async fn delete_property(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(property_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let pid = property_id.to_string();
    let removed = db_call(&state, move |db| db.admin_delete_property(&requester, &pid)).await?;
    if !removed {
        return Err(ApiError::NotFound("Property"));
    }

    if let Err(e) = state.storage.delete_property_images(property_id).await {
        warn!("Property {} deleted but images remain: {}", property_id, e);
    }
    info!("Admin {} deleted property {}", claims.sub, property_id);
    Ok(StatusCode::NO_CONTENT)
}

// -- Bookmarks --

/// GET /admin/saved-properties?search=
pub async fn list_saved(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let rows = db_call(&state, move |db| db.admin_list_saved_properties(&requester)).await?;

    let mut saved = rows
        .into_iter()
        .map(convert::saved_detail)
        .collect::<anyhow::Result<Vec<_>>>()?;
    if let Some(needle) = query.needle() {
        saved.retain(|s| saved_matches(s, &needle));
    }
    Ok(Json(saved))
}

/// DELETE /admin/saved-properties/{id}
pub async fn delete_saved(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(saved_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let sid = saved_id.to_string();
    let removed =
        db_call(&state, move |db| db.admin_delete_saved_property(&requester, &sid)).await?;
    if !removed {
        return Err(ApiError::NotFound("Saved property"));
    }
    Ok(StatusCode::NO_CONTENT)
}
