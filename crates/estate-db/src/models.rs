//! Database row types. These map directly to SQLite rows.
//! Ids and timestamps stay as stored text; the API layer parses them.
use rusqlite::Row;
use rusqlite::types::Type;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub last_sign_in_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct UserSummaryRow {
    pub user: UserRow,
    pub listed_properties: i64,
    pub total_views: i64,
}

#[derive(Debug, Clone)]
pub struct AdminRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub status: String,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Public-safe projection returned by a credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredentialsRow {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct PropertyRow {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub address: String,
    pub price: f64,
    pub kind: String,
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
    pub user_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct PropertyOwnerRow {
    pub property: PropertyRow,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SavedRow {
    pub id: String,
    pub user_id: String,
    pub property_id: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct SavedDetailRow {
    pub saved: SavedRow,
    pub property_title: Option<String>,
    pub property_type: Option<String>,
    pub property_price: Option<f64>,
    pub property_address: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionRow {
    pub id: String,
    pub subject_id: String,
    pub kind: String,
    pub created_at: String,
    pub expires_at: String,
}

// -- Column lists and row mappers shared by the query modules --

pub(crate) const USER_COLUMNS: &str =
    "u.id, u.email, u.full_name, u.phone, u.password_hash, u.last_sign_in_at, u.created_at, u.updated_at";

pub(crate) const ADMIN_COLUMNS: &str =
    "a.id, a.email, a.name, a.password_hash, a.status, a.last_login, a.created_at, a.updated_at";

pub(crate) const PROPERTY_COLUMNS: &str = "p.id, p.title, p.description, p.address, p.price, p.type, \
     p.beds, p.baths, p.sqft, p.image_url, p.images, p.mobile_number, p.latitude, p.longitude, \
     p.verification_status, p.views_count, p.user_id, p.created_at, p.updated_at";

/// Number of columns in [`PROPERTY_COLUMNS`].
pub(crate) const PROPERTY_COLUMN_COUNT: usize = 19;

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        phone: row.get(3)?,
        password_hash: row.get(4)?,
        last_sign_in_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub(crate) fn admin_from_row(row: &Row<'_>) -> rusqlite::Result<AdminRow> {
    Ok(AdminRow {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        status: row.get(4)?,
        last_login: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub(crate) fn property_from_row(row: &Row<'_>) -> rusqlite::Result<PropertyRow> {
    let images_json: String = row.get(10)?;
    let images: Vec<String> = serde_json::from_str(&images_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Ok(PropertyRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        address: row.get(3)?,
        price: row.get(4)?,
        kind: row.get(5)?,
        beds: row.get(6)?,
        baths: row.get(7)?,
        sqft: row.get(8)?,
        image_url: row.get(9)?,
        images,
        mobile_number: row.get(11)?,
        latitude: row.get(12)?,
        longitude: row.get(13)?,
        verification_status: row.get(14)?,
        views_count: row.get(15)?,
        user_id: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

/// Property columns followed by owner name and email from a LEFT JOIN.
pub(crate) fn property_owner_from_row(row: &Row<'_>) -> rusqlite::Result<PropertyOwnerRow> {
    Ok(PropertyOwnerRow {
        property: property_from_row(row)?,
        owner_name: row.get(PROPERTY_COLUMN_COUNT)?,
        owner_email: row.get(PROPERTY_COLUMN_COUNT + 1)?,
    })
}

pub(crate) fn images_to_json(images: &[String]) -> String {
    serde_json::to_string(images).unwrap_or_else(|_| "[]".to_string())
}
