use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{info, warn};
use uuid::Uuid;

use estate_types::api::{
    AdminLoginResponse, Claims, CreateAdminRequest, CreatedResponse, LoginRequest, SessionKind,
    UpdateAdminRequest,
};

use crate::auth::{AppState, db_call, end_session, start_session};
use crate::convert;
use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::validation;

/// POST /admin/auth/login. An empty credential match is a plain 401.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    let plain = req.password;
    let rows = db_call(&state, move |db| db.get_admin_by_credentials(&email, &plain)).await?;

    let Some(row) = rows.into_iter().next() else {
        warn!("Failed admin login attempt");
        return Err(ApiError::invalid_credentials());
    };
    let admin = convert::admin_credentials(row)?;

    let (token, expires_at) =
        start_session(&state, admin.id, SessionKind::Admin, &admin.email).await?;
    info!("Admin {} signed in", admin.id);

    Ok(Json(AdminLoginResponse {
        admin,
        token,
        expires_at,
    }))
}

/// POST /admin/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    end_session(&state, &claims).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let aid = claims.sub.to_string();
    let row = db_call(&state, move |db| db.get_admin(&aid))
        .await?
        .ok_or(ApiError::NotFound("Admin"))?;
    Ok(Json(convert::admin(row)?))
}

// -- Admin accounts --

/// GET /admin/admins
pub async fn list_admins(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let rows = db_call(&state, move |db| db.list_admins(&requester)).await?;
    let admins = rows
        .into_iter()
        .map(convert::admin)
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(Json(admins))
}

/// POST /admin/admins
pub async fn create_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::create_admin(&req)?;

    let requester = claims.sub.to_string();
    let email = req.email.trim().to_lowercase();
    let name = req.name.trim().to_string();
    let id = db_call(&state, move |db| {
        db.create_admin(&requester, &email, &name, &req.password, req.status)
    })
    .await
    .map_err(|e| match e {
        ApiError::Conflict(_) => ApiError::Conflict("An admin with this email already exists".into()),
        other => other,
    })?;

    let id: Uuid = id.parse().map_err(anyhow::Error::from)?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PUT /admin/admins/{id}. Password is only changed when supplied.
pub async fn update_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(admin_id): Path<Uuid>,
    Json(req): Json<UpdateAdminRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::update_admin(&req)?;

    let requester = claims.sub.to_string();
    let target = admin_id.to_string();
    let row = db_call(&state, move |db| -> Result<_, ApiError> {
        let password = req.password.as_deref().filter(|p| !p.is_empty());
        let found =
            db.update_admin_with_password(&requester, &target, req.name.trim(), password, req.status)?;
        if !found {
            return Ok(None);
        }
        Ok(db.get_admin(&target)?)
    })
    .await?
    .ok_or(ApiError::NotFound("Admin"))?;

    Ok(Json(convert::admin(row)?))
}

/// DELETE /admin/admins/{id}. Self-deletion is refused.
pub async fn delete_admin(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(admin_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = claims.sub.to_string();
    let target = admin_id.to_string();
    let removed = db_call(&state, move |db| db.delete_admin(&requester, &target)).await?;
    if !removed {
        return Err(ApiError::NotFound("Admin"));
    }
    info!("Admin {} deleted admin {}", claims.sub, admin_id);
    Ok(StatusCode::NO_CONTENT)
}
