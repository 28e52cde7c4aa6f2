use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Listing kind. Stored as lowercase text, constrained by a CHECK in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Sale,
    Rent,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Sale => "sale",
            PropertyType::Rent => "rent",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(PropertyType::Sale),
            "rent" => Ok(PropertyType::Rent),
            other => Err(format!("unknown property type '{}'", other)),
        }
    }
}

/// Only active admins may invoke privileged operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminStatus {
    #[default]
    Active,
    Inactive,
}

impl AdminStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminStatus::Active => "active",
            AdminStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for AdminStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(AdminStatus::Active),
            "inactive" => Ok(AdminStatus::Inactive),
            other => Err(format!("unknown admin status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User row as seen from the admin user-management view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    pub listed_properties: i64,
    pub total_views: i64,
}

/// Public-safe admin identity returned by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredentials {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub status: AdminStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
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
    pub images: Vec<String>,
    pub mobile_number: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub verification_status: bool,
    pub views_count: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A listing joined with its owner. Owner fields are `None` when the owning
/// user no longer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyWithOwner {
    #[serde(flatten)]
    pub property: Property,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedProperty {
    pub id: Uuid,
    pub user_id: Uuid,
    pub property_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Bookmark enriched with the listing and user it links, for moderation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPropertyDetail {
    #[serde(flatten)]
    pub saved: SavedProperty,
    pub property_title: String,
    pub property_type: Option<PropertyType>,
    pub property_price: Option<f64>,
    pub property_address: Option<String>,
    pub user_name: String,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_properties: i64,
    pub total_saved_properties: i64,
    pub recent_properties_added: i64,
    pub recent_users: i64,
}
