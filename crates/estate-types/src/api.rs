use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::{AdminCredentials, AdminStatus, PropertyType, User};

// -- Sessions --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    User,
    Admin,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::User => "user",
            SessionKind::Admin => "admin",
        }
    }
}

/// JWT claims shared by the token issuer and the auth middleware.
/// `sid` names the server-side session row the token is bound to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub sid: Uuid,
    pub kind: SessionKind,
    pub email: String,
    pub exp: usize,
}

// -- End-user auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// -- Admin auth --

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminLoginResponse {
    pub admin: AdminCredentials,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateAdminRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub status: AdminStatus,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateAdminRequest {
    pub name: String,
    pub password: Option<String>,
    pub status: Option<AdminStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    /// Whether a row was actually changed.
    pub found: bool,
}

// -- Properties --

/// Body of an owner's create or update. Ownership, verification and counters
/// are not part of this type, so an owner cannot set them.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyInput {
    pub title: String,
    pub description: Option<String>,
    pub address: String,
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub beds: Option<i64>,
    pub baths: Option<i64>,
    pub sqft: Option<i64>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub mobile_number: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Admin edit of a listing. Only the columns named here can change; any other
/// key in the JSON object (`id`, `user_id`, `created_at`, `updated_at`, ...)
/// is ignored. Nullable columns use `Some(None)` to mean "set to NULL".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub address: Option<String>,
    pub price: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<PropertyType>,
    #[serde(default, deserialize_with = "nullable")]
    pub beds: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub baths: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub sqft: Option<Option<i64>>,
    #[serde(default, alias = "imageUrl", deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
    pub images: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub mobile_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub longitude: Option<Option<f64>>,
    pub verification_status: Option<bool>,
    pub views_count: Option<i64>,
}

/// Distinguishes an explicit JSON `null` from a missing key.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerificationRequest {
    pub verified: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageUploadResponse {
    pub url: String,
    pub images: Vec<String>,
}
