use std::sync::Arc;

use axum::{Extension, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};
use uuid::Uuid;

use estate_crypto::{password, token};
use estate_db::{Database, format_timestamp};
use estate_types::api::{AuthResponse, Claims, LoginRequest, SessionKind, SignupRequest};

use crate::convert;
use crate::error::ApiError;
use crate::extract::Json;
use crate::storage::ImageStorage;
use crate::validation;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub storage: ImageStorage,
    pub jwt_secret: String,
    /// Base URL that stored image keys are appended to.
    pub public_url: String,
    pub admin_session: Duration,
    pub user_session: Duration,
    pub max_image_bytes: usize,
    pub search_radius_km: f64,
}

/// Run a blocking database call off the async runtime.
pub(crate) async fn db_call<F, T, E>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(Into::into)
}

/// Insert a session row and sign a token bound to it.
pub(crate) async fn start_session(
    state: &AppState,
    subject: Uuid,
    kind: SessionKind,
    email: &str,
) -> Result<(String, DateTime<Utc>), ApiError> {
    let lifetime = match kind {
        SessionKind::Admin => state.admin_session,
        SessionKind::User => state.user_session,
    };
    let sid = Uuid::new_v4();
    let expires_at = Utc::now() + lifetime;

    let stored_expiry = format_timestamp(expires_at);
    db_call(state, move |db| {
        db.create_session(
            &sid.to_string(),
            &subject.to_string(),
            kind.as_str(),
            &stored_expiry,
        )
    })
    .await?;

    let token = token::issue_token(&state.jwt_secret, subject, sid, kind, email, expires_at)?;
    Ok((token, expires_at))
}

pub(crate) async fn end_session(state: &AppState, claims: &Claims) -> Result<(), ApiError> {
    let sid = claims.sid.to_string();
    db_call(state, move |db| db.delete_session(&sid)).await?;
    Ok(())
}

/// POST /auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validation::signup(&req)?;

    let email = req.email.trim().to_lowercase();
    let plain = req.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })??;

    let user_id = Uuid::new_v4();
    let full_name = req.full_name.trim().to_string();
    let phone = req.phone.filter(|p| !p.is_empty());

    let (uid, mail) = (user_id.to_string(), email.clone());
    let row = db_call(&state, move |db| {
        db.create_user(&uid, &mail, &full_name, phone.as_deref(), &password_hash)
            .map_err(|e| {
                if estate_db::error::is_conflict(&e) {
                    ApiError::Conflict("User already registered".into())
                } else {
                    e.into()
                }
            })?;
        db.get_user_by_id(&uid)?.ok_or(ApiError::Internal)
    })
    .await?;

    let (token, expires_at) = start_session(&state, user_id, SessionKind::User, &email).await?;
    info!("User {} signed up", user_id);

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: convert::user(row)?,
            token,
            expires_at,
        }),
    ))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim().to_lowercase();
    let plain = req.password;
    let row = db_call(&state, move |db| db.authenticate_user(&email, &plain))
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    let user = convert::user(row)?;
    let (token, expires_at) = start_session(&state, user.id, SessionKind::User, &user.email).await?;

    Ok(Json(AuthResponse {
        user,
        token,
        expires_at,
    }))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    end_session(&state, &claims).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let uid = claims.sub.to_string();
    let row = db_call(&state, move |db| db.get_user_by_id(&uid))
        .await?
        .ok_or(ApiError::NotFound("User"))?;
    Ok(Json(convert::user(row)?))
}
