use anyhow::Result;
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use estate_types::api::{Claims, SessionKind};

/// Sign a session token for `subject`, bound to session `sid` and valid until `expires_at`.
pub fn issue_token(
    secret: &str,
    subject: Uuid,
    sid: Uuid,
    kind: SessionKind,
    email: &str,
    expires_at: DateTime<Utc>,
) -> Result<String> {
    let claims = Claims {
        sub: subject,
        sid,
        kind,
        email: email.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Verify signature and expiry. Session-row checks happen in the caller.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}
