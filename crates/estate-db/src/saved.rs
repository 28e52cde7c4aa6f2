use anyhow::Result;
use rusqlite::params;

use crate::models::{PROPERTY_COLUMNS, PropertyRow, property_from_row};
use crate::{Database, timestamp};

impl Database {
    /// Bookmark a listing. Returns false when it was already saved.
    pub fn save_property(&self, id: &str, user_id: &str, property_id: &str) -> Result<bool> {
        let now = timestamp();
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO saved_properties (id, user_id, property_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, user_id, property_id, now],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn unsave_property(&self, user_id: &str, property_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM saved_properties WHERE user_id = ?1 AND property_id = ?2",
                params![user_id, property_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Listings the user bookmarked, most recently saved first.
    pub fn list_saved_for_user(&self, user_id: &str) -> Result<Vec<PropertyRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {}
                 FROM saved_properties s
                 JOIN properties p ON p.id = s.property_id
                 WHERE s.user_id = ?1
                 ORDER BY s.created_at DESC",
                PROPERTY_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], property_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
