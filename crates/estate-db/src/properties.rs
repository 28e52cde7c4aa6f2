use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

use estate_types::api::PropertyInput;

use crate::models::{
    PROPERTY_COLUMNS, PropertyOwnerRow, PropertyRow, images_to_json, property_from_row,
    property_owner_from_row,
};
use crate::{Database, timestamp};

impl Database {
    /// Insert a listing owned by `user_id`. Verification always starts false.
    pub fn insert_property(&self, id: &str, user_id: &str, input: &PropertyInput) -> Result<()> {
        let now = timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO properties (id, title, description, address, price, type, beds, baths, sqft,
                     image_url, images, mobile_number, latitude, longitude, verification_status,
                     views_count, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, 0, 0, ?15, ?16, ?16)",
                params![
                    id,
                    input.title,
                    input.description,
                    input.address,
                    input.price,
                    input.kind.as_str(),
                    input.beds,
                    input.baths,
                    input.sqft,
                    primary_image(input),
                    images_to_json(&input.images),
                    input.mobile_number,
                    input.latitude,
                    input.longitude,
                    user_id,
                    now,
                ],
            )?;
            Ok(())
        })
    }

    /// Single listing joined with its owner, if it exists.
    pub fn get_property(&self, id: &str) -> Result<Option<PropertyOwnerRow>> {
        self.with_conn(|conn| query_property_with_owner(conn, id))
    }

    /// All listings, newest first.
    pub fn list_properties(&self) -> Result<Vec<PropertyRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM properties p ORDER BY p.created_at DESC",
                PROPERTY_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], property_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_properties_by_user(&self, user_id: &str) -> Result<Vec<PropertyRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM properties p WHERE p.user_id = ?1 ORDER BY p.created_at DESC",
                PROPERTY_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], property_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Owner edit. Matches only when `user_id` owns the row, so a non-owner
    /// sees the same `false` as a missing listing.
    pub fn update_owned_property(
        &self,
        id: &str,
        user_id: &str,
        input: &PropertyInput,
    ) -> Result<bool> {
        let now = timestamp();
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE properties SET title = ?1, description = ?2, address = ?3, price = ?4, type = ?5,
                     beds = ?6, baths = ?7, sqft = ?8, image_url = ?9, images = ?10, mobile_number = ?11,
                     latitude = ?12, longitude = ?13, updated_at = ?14
                 WHERE id = ?15 AND user_id = ?16",
                params![
                    input.title,
                    input.description,
                    input.address,
                    input.price,
                    input.kind.as_str(),
                    input.beds,
                    input.baths,
                    input.sqft,
                    primary_image(input),
                    images_to_json(&input.images),
                    input.mobile_number,
                    input.latitude,
                    input.longitude,
                    now,
                    id,
                    user_id,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_owned_property(&self, id: &str, user_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM properties WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn increment_views(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE properties SET views_count = views_count + 1 WHERE id = ?1",
                [id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Append an image URL to a listing. The first image also becomes the
    /// primary `image_url`. Returns the new image list, or `None` if the
    /// listing is gone.
    pub fn add_property_image(&self, id: &str, url: &str) -> Result<Option<Vec<String>>> {
        let now = timestamp();
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(current) = query_property(&tx, id)? else {
                return Ok(None);
            };

            let mut images = current.images;
            if !images.iter().any(|existing| existing == url) {
                images.push(url.to_string());
            }
            let image_url = current.image_url.unwrap_or_else(|| url.to_string());

            tx.execute(
                "UPDATE properties SET images = ?1, image_url = ?2, updated_at = ?3 WHERE id = ?4",
                params![images_to_json(&images), image_url, now, id],
            )?;
            tx.commit()?;
            Ok(Some(images))
        })
    }
}

/// Explicit primary image, else the first of the gallery.
fn primary_image(input: &PropertyInput) -> Option<String> {
    input
        .image_url
        .clone()
        .filter(|url| !url.is_empty())
        .or_else(|| input.images.first().cloned())
}

pub(crate) fn query_property(conn: &Connection, id: &str) -> Result<Option<PropertyRow>> {
    let sql = format!("SELECT {} FROM properties p WHERE p.id = ?1", PROPERTY_COLUMNS);
    let row = conn.query_row(&sql, [id], property_from_row).optional()?;
    Ok(row)
}

fn query_property_with_owner(conn: &Connection, id: &str) -> Result<Option<PropertyOwnerRow>> {
    // LEFT JOIN: a listing whose owner was deleted still resolves.
    let sql = format!(
        "SELECT {}, u.full_name, u.email
         FROM properties p
         LEFT JOIN users u ON p.user_id = u.id
         WHERE p.id = ?1",
        PROPERTY_COLUMNS
    );
    let row = conn.query_row(&sql, [id], property_owner_from_row).optional()?;
    Ok(row)
}
