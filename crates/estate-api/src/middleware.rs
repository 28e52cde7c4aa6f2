use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::debug;

use estate_crypto::token;
use estate_types::api::{Claims, SessionKind};

use crate::auth::{AppState, db_call};
use crate::error::ApiError;

type BearerHeader = Option<TypedHeader<Authorization<Bearer>>>;

/// Check the token signature and expiry, then that its session row is still
/// live. Admin tokens additionally require the admin to still be active.
async fn authenticate(
    state: &AppState,
    header: BearerHeader,
    wanted: Option<SessionKind>,
) -> Result<Claims, ApiError> {
    let TypedHeader(Authorization(bearer)) = header.ok_or_else(ApiError::unauthorized)?;

    let claims = token::decode_token(&state.jwt_secret, bearer.token()).map_err(|e| {
        debug!("Rejected token: {}", e);
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;

    if wanted.is_some_and(|kind| kind != claims.kind) {
        return Err(ApiError::Forbidden(match claims.kind {
            SessionKind::User => "Admin session required".into(),
            SessionKind::Admin => "User session required".into(),
        }));
    }

    let sid = claims.sid.to_string();
    let sub = claims.sub.to_string();
    let kind = claims.kind;
    let live = db_call(state, move |db| -> anyhow::Result<bool> {
        let Some(session) = db.get_live_session(&sid)? else {
            return Ok(false);
        };
        if session.subject_id != sub || session.kind != kind.as_str() {
            return Ok(false);
        }
        if kind == SessionKind::Admin {
            return Ok(db.is_active_admin(&sub)?);
        }
        Ok(true)
    })
    .await?;

    if !live {
        return Err(ApiError::Unauthorized("Session has ended".into()));
    }
    Ok(claims)
}

/// Any signed-in caller, user or admin.
pub async fn require_auth(
    State(state): State<AppState>,
    header: BearerHeader,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, header, None).await?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub async fn require_user(
    State(state): State<AppState>,
    header: BearerHeader,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, header, Some(SessionKind::User)).await?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Active admins only. Handlers behind this take the requesting-admin id
/// from the inserted [`Claims`].
pub async fn require_admin(
    State(state): State<AppState>,
    header: BearerHeader,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, header, Some(SessionKind::Admin)).await?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
