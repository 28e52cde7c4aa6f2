//! Row to wire-model conversion. Ids and timestamps are stored as text;
//! a row that fails to parse is a server fault, never a client one.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use estate_db::models::{
    AdminCredentialsRow, AdminRow, PropertyOwnerRow, PropertyRow, SavedDetailRow, UserRow,
    UserSummaryRow,
};
use estate_types::models::{
    Admin, AdminCredentials, Property, PropertyType, PropertyWithOwner, SavedProperty,
    SavedPropertyDetail, User, UserSummary,
};

const UNKNOWN_PROPERTY: &str = "Unknown Property";
const UNKNOWN_USER: &str = "Unknown User";

fn id(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("bad stored id '{}'", raw))
}

fn ts(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("bad stored timestamp '{}'", raw))?
        .with_timezone(&Utc))
}

fn opt_ts(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(ts).transpose()
}

pub fn user(row: UserRow) -> Result<User> {
    Ok(User {
        id: id(&row.id)?,
        last_sign_in_at: opt_ts(row.last_sign_in_at.as_deref())?,
        created_at: ts(&row.created_at)?,
        updated_at: ts(&row.updated_at)?,
        email: row.email,
        full_name: row.full_name,
        phone: row.phone,
    })
}

pub fn user_summary(row: UserSummaryRow) -> Result<UserSummary> {
    Ok(UserSummary {
        user: user(row.user)?,
        listed_properties: row.listed_properties,
        total_views: row.total_views,
    })
}

pub fn admin(row: AdminRow) -> Result<Admin> {
    Ok(Admin {
        id: id(&row.id)?,
        status: row.status.parse().map_err(anyhow::Error::msg)?,
        last_login: opt_ts(row.last_login.as_deref())?,
        created_at: ts(&row.created_at)?,
        updated_at: ts(&row.updated_at)?,
        email: row.email,
        name: row.name,
    })
}

pub fn admin_credentials(row: AdminCredentialsRow) -> Result<AdminCredentials> {
    Ok(AdminCredentials {
        id: id(&row.id)?,
        email: row.email,
        name: row.name,
    })
}

pub fn property(row: PropertyRow) -> Result<Property> {
    Ok(Property {
        id: id(&row.id)?,
        kind: row.kind.parse().map_err(anyhow::Error::msg)?,
        user_id: id(&row.user_id)?,
        created_at: ts(&row.created_at)?,
        updated_at: ts(&row.updated_at)?,
        title: row.title,
        description: row.description,
        address: row.address,
        price: row.price,
        beds: row.beds,
        baths: row.baths,
        sqft: row.sqft,
        image_url: row.image_url,
        images: row.images,
        mobile_number: row.mobile_number,
        latitude: row.latitude,
        longitude: row.longitude,
        verification_status: row.verification_status,
        views_count: row.views_count,
    })
}

pub fn property_with_owner(row: PropertyOwnerRow) -> Result<PropertyWithOwner> {
    Ok(PropertyWithOwner {
        property: property(row.property)?,
        owner_name: row.owner_name,
        owner_email: row.owner_email,
    })
}

pub fn properties(rows: Vec<PropertyRow>) -> Result<Vec<Property>> {
    rows.into_iter().map(property).collect()
}

/// Bookmarks whose listing or user has vanished get placeholder names.
pub fn saved_detail(row: SavedDetailRow) -> Result<SavedPropertyDetail> {
    let saved = SavedProperty {
        id: id(&row.saved.id)?,
        user_id: id(&row.saved.user_id)?,
        property_id: id(&row.saved.property_id)?,
        created_at: ts(&row.saved.created_at)?,
    };
    let property_type: Option<PropertyType> = row
        .property_type
        .map(|k| k.parse())
        .transpose()
        .map_err(anyhow::Error::msg)?;

    Ok(SavedPropertyDetail {
        saved,
        property_title: row.property_title.unwrap_or_else(|| UNKNOWN_PROPERTY.to_string()),
        property_type,
        property_price: row.property_price,
        property_address: row.property_address,
        user_name: row.user_name.unwrap_or_else(|| UNKNOWN_USER.to_string()),
        user_email: row.user_email,
    })
}
