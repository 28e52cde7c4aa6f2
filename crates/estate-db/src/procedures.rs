//! Privileged operations.
//!
//! Each admin operation takes the id of the requesting admin, which callers
//! must take from a verified session, never from request input. The id is
//! re-checked against `admins.status = 'active'` inside the same transaction
//! as the mutation, so a failed check never leaves a partial write.

use std::sync::OnceLock;

use chrono::{Duration, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Transaction, params, params_from_iter};
use tracing::{info, warn};
use uuid::Uuid;

use estate_crypto::password;
use estate_types::api::PropertyPatch;
use estate_types::models::{AdminStatus, DashboardStats};

use crate::error::DbError;
use crate::models::{
    ADMIN_COLUMNS, AdminCredentialsRow, AdminRow, PROPERTY_COLUMNS, PropertyOwnerRow,
    SavedDetailRow, SavedRow, USER_COLUMNS, UserSummaryRow, admin_from_row, images_to_json,
    property_owner_from_row, user_from_row,
};
use crate::{Database, format_timestamp, timestamp};

const NOT_ACTIVE_ADMIN: &str = "User is not an active admin.";

/// Window used for the "recent" dashboard counters.
const RECENT_DAYS: i64 = 30;

/// Hash a password for storage in `admins` or `users`.
pub fn hash_password(plain: &str) -> Result<String, DbError> {
    Ok(password::hash_password(plain)?)
}

impl Database {
    /// Run `f` inside one transaction on the locked connection.
    /// Commits on `Ok`, rolls back on `Err`.
    fn procedure<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, DbError>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    // -- Credentials --

    /// Id of the active admin with this email and password, touching
    /// `last_login`. Unknown email, inactive account and wrong password all
    /// return `None`.
    pub fn verify_password(&self, email: &str, plain: &str) -> Result<Option<String>, DbError> {
        let candidate = self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, password_hash FROM admins WHERE email = ?1 AND status = 'active'",
                    [email],
                    |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
                )
                .optional()?;
            Ok(row)
        })?;

        // Hash verification runs outside the connection lock.
        let verified = match candidate {
            Some((id, hash)) => password::verify_password(plain, &hash).then_some(id),
            None => {
                // Same work as a real check so timing does not reveal the email.
                if let Some(dummy) = dummy_hash() {
                    let _ = password::verify_password(plain, dummy);
                }
                None
            }
        };

        let Some(id) = verified else {
            return Ok(None);
        };

        let now = timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE admins SET last_login = ?1, updated_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            Ok(())
        })?;

        Ok(Some(id))
    }

    /// Public-safe identity for valid credentials; empty on any failure.
    pub fn get_admin_by_credentials(
        &self,
        email: &str,
        plain: &str,
    ) -> Result<Vec<AdminCredentialsRow>, DbError> {
        let Some(id) = self.verify_password(email, plain)? else {
            return Ok(vec![]);
        };

        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, email, name FROM admins WHERE id = ?1")?;
            let rows = stmt
                .query_map([&id], |row| {
                    Ok(AdminCredentialsRow {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(rows)
    }

    pub fn is_active_admin(&self, admin_id: &str) -> Result<bool, DbError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
        is_active_admin(&conn, admin_id)
    }

    pub fn get_admin(&self, admin_id: &str) -> Result<Option<AdminRow>, DbError> {
        Ok(self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM admins a WHERE a.id = ?1", ADMIN_COLUMNS);
            Ok(conn.query_row(&sql, [admin_id], admin_from_row).optional()?)
        })?)
    }

    // -- Admin accounts --

    pub fn create_admin(
        &self,
        requesting_admin_id: &str,
        email: &str,
        name: &str,
        plain: &str,
        status: AdminStatus,
    ) -> Result<String, DbError> {
        let hash = hash_password(plain)?;
        let id = Uuid::new_v4().to_string();
        let now = timestamp();

        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            tx.execute(
                "INSERT INTO admins (id, email, name, password_hash, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![id, email, name, hash, status.as_str(), now],
            )?;
            Ok(())
        })?;

        info!("Admin {} created admin {} ({})", requesting_admin_id, id, email);
        Ok(id)
    }

    /// Edit another admin. The password is re-hashed only when supplied and
    /// status is kept when `None`. Self-edits are refused. Returns whether a
    /// row matched.
    pub fn update_admin_with_password(
        &self,
        requesting_admin_id: &str,
        admin_id: &str,
        name: &str,
        plain: Option<&str>,
        status: Option<AdminStatus>,
    ) -> Result<bool, DbError> {
        if requesting_admin_id == admin_id {
            return Err(DbError::PermissionDenied(
                "You cannot edit your own account".to_string(),
            ));
        }

        let hash = plain.map(hash_password).transpose()?;
        let now = timestamp();

        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let changed = tx.execute(
                "UPDATE admins SET
                     name = ?1,
                     password_hash = COALESCE(?2, password_hash),
                     status = COALESCE(?3, status),
                     updated_at = ?4
                 WHERE id = ?5",
                params![name, hash, status.map(|s| s.as_str()), now, admin_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Remove another admin and their sessions. Self-deletion is refused.
    pub fn delete_admin(&self, requesting_admin_id: &str, admin_id: &str) -> Result<bool, DbError> {
        if requesting_admin_id == admin_id {
            return Err(DbError::PermissionDenied(
                "You cannot delete your own account".to_string(),
            ));
        }

        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            tx.execute("DELETE FROM sessions WHERE subject_id = ?1", [admin_id])?;
            let removed = tx.execute("DELETE FROM admins WHERE id = ?1", [admin_id])?;
            Ok(removed > 0)
        })
    }

    pub fn list_admins(&self, requesting_admin_id: &str) -> Result<Vec<AdminRow>, DbError> {
        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let sql = format!("SELECT {} FROM admins a ORDER BY a.created_at DESC", ADMIN_COLUMNS);
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map([], admin_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Listings --

    /// Set the verification flag. Repeating a call leaves the flag unchanged
    /// but still advances `updated_at`.
    pub fn update_property_verification(
        &self,
        requesting_admin_id: &str,
        property_id: &str,
        verified: bool,
    ) -> Result<bool, DbError> {
        let now = timestamp();
        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let changed = tx.execute(
                "UPDATE properties SET verification_status = ?1, updated_at = ?2 WHERE id = ?3",
                params![verified, now, property_id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Every listing with its owner's name and email, newest first.
    pub fn admin_get_all_properties_with_owners(
        &self,
        requesting_admin_id: &str,
    ) -> Result<Vec<PropertyOwnerRow>, DbError> {
        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let sql = format!(
                "SELECT {}, u.full_name, u.email
                 FROM properties p
                 LEFT JOIN users u ON p.user_id = u.id
                 ORDER BY p.created_at DESC",
                PROPERTY_COLUMNS
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map([], property_owner_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Apply an admin edit. Only allow-listed columns are written, each as a
    /// bound parameter; `updated_at` is always refreshed.
    pub fn admin_update_property(
        &self,
        requesting_admin_id: &str,
        property_id: &str,
        patch: &PropertyPatch,
    ) -> Result<bool, DbError> {
        let mut assignments = patch_assignments(patch);
        assignments.push(("updated_at", Value::Text(timestamp())));

        let set_clause = assignments
            .iter()
            .enumerate()
            .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE properties SET {} WHERE id = ?{}",
            set_clause,
            assignments.len() + 1
        );

        let mut values: Vec<Value> = assignments.into_iter().map(|(_, v)| v).collect();
        values.push(Value::Text(property_id.to_string()));

        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let changed = tx.execute(&sql, params_from_iter(values.iter()))?;
            Ok(changed > 0)
        })
    }

    pub fn admin_delete_property(
        &self,
        requesting_admin_id: &str,
        property_id: &str,
    ) -> Result<bool, DbError> {
        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let removed = tx.execute("DELETE FROM properties WHERE id = ?1", [property_id])?;
            Ok(removed > 0)
        })
    }

    // -- Users --

    /// Users newest first, each with how many listings they own and the
    /// views those listings have collected.
    pub fn admin_list_users(
        &self,
        requesting_admin_id: &str,
    ) -> Result<Vec<UserSummaryRow>, DbError> {
        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let sql = format!(
                "SELECT {}, COUNT(p.id), COALESCE(SUM(p.views_count), 0)
                 FROM users u
                 LEFT JOIN properties p ON p.user_id = u.id
                 GROUP BY u.id
                 ORDER BY u.created_at DESC",
                USER_COLUMNS
            );
            let mut stmt = tx.prepare(&sql)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(UserSummaryRow {
                        user: user_from_row(row)?,
                        listed_properties: row.get(8)?,
                        total_views: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Delete a user with their bookmarks and sessions. Their listings stay.
    pub fn admin_delete_user(&self, requesting_admin_id: &str, user_id: &str) -> Result<bool, DbError> {
        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            tx.execute("DELETE FROM saved_properties WHERE user_id = ?1", [user_id])?;
            tx.execute("DELETE FROM sessions WHERE subject_id = ?1", [user_id])?;
            let removed = tx.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
            if removed == 0 {
                warn!("Admin {} tried to delete unknown user {}", requesting_admin_id, user_id);
            }
            Ok(removed > 0)
        })
    }

    // -- Dashboard and bookmarks --

    pub fn admin_dashboard_stats(&self, requesting_admin_id: &str) -> Result<DashboardStats, DbError> {
        let since = format_timestamp(Utc::now() - Duration::days(RECENT_DAYS));
        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let count = |sql: &str| -> Result<i64, DbError> {
                Ok(tx.query_row(sql, [], |r| r.get(0))?)
            };
            let count_since = |sql: &str| -> Result<i64, DbError> {
                Ok(tx.query_row(sql, [&since], |r| r.get(0))?)
            };

            Ok(DashboardStats {
                total_users: count("SELECT COUNT(*) FROM users")?,
                total_properties: count("SELECT COUNT(*) FROM properties")?,
                total_saved_properties: count("SELECT COUNT(*) FROM saved_properties")?,
                recent_properties_added: count_since(
                    "SELECT COUNT(*) FROM properties WHERE created_at >= ?1",
                )?,
                recent_users: count_since("SELECT COUNT(*) FROM users WHERE created_at >= ?1")?,
            })
        })
    }

    /// Every bookmark with the listing and user it links, newest first.
    pub fn admin_list_saved_properties(
        &self,
        requesting_admin_id: &str,
    ) -> Result<Vec<SavedDetailRow>, DbError> {
        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let mut stmt = tx.prepare(
                "SELECT s.id, s.user_id, s.property_id, s.created_at,
                        p.title, p.type, p.price, p.address, u.full_name, u.email
                 FROM saved_properties s
                 LEFT JOIN properties p ON p.id = s.property_id
                 LEFT JOIN users u ON u.id = s.user_id
                 ORDER BY s.created_at DESC",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(SavedDetailRow {
                        saved: SavedRow {
                            id: row.get(0)?,
                            user_id: row.get(1)?,
                            property_id: row.get(2)?,
                            created_at: row.get(3)?,
                        },
                        property_title: row.get(4)?,
                        property_type: row.get(5)?,
                        property_price: row.get(6)?,
                        property_address: row.get(7)?,
                        user_name: row.get(8)?,
                        user_email: row.get(9)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn admin_delete_saved_property(
        &self,
        requesting_admin_id: &str,
        saved_id: &str,
    ) -> Result<bool, DbError> {
        self.procedure(|tx| {
            ensure_active_admin(tx, requesting_admin_id)?;
            let removed = tx.execute("DELETE FROM saved_properties WHERE id = ?1", [saved_id])?;
            Ok(removed > 0)
        })
    }
}

fn is_active_admin(conn: &Connection, admin_id: &str) -> Result<bool, DbError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM admins WHERE id = ?1 AND status = 'active')",
        [admin_id],
        |row| row.get(0),
    )?;
    Ok(exists)
}

fn ensure_active_admin(conn: &Connection, admin_id: &str) -> Result<(), DbError> {
    if is_active_admin(conn, admin_id)? {
        Ok(())
    } else {
        warn!("Privileged call refused for {}", admin_id);
        Err(DbError::PermissionDenied(NOT_ACTIVE_ADMIN.to_string()))
    }
}

/// Column/value pairs for the fields present in `patch`. Column names come
/// only from this list.
fn patch_assignments(patch: &PropertyPatch) -> Vec<(&'static str, Value)> {
    let mut out: Vec<(&'static str, Value)> = Vec::new();

    if let Some(v) = &patch.title {
        out.push(("title", Value::Text(v.clone())));
    }
    if let Some(v) = &patch.description {
        out.push(("description", text_or_null(v)));
    }
    if let Some(v) = &patch.address {
        out.push(("address", Value::Text(v.clone())));
    }
    if let Some(v) = patch.price {
        out.push(("price", Value::Real(v)));
    }
    if let Some(v) = patch.kind {
        out.push(("type", Value::Text(v.as_str().to_string())));
    }
    if let Some(v) = patch.beds {
        out.push(("beds", int_or_null(v)));
    }
    if let Some(v) = patch.baths {
        out.push(("baths", int_or_null(v)));
    }
    if let Some(v) = patch.sqft {
        out.push(("sqft", int_or_null(v)));
    }
    if let Some(v) = &patch.image_url {
        out.push(("image_url", text_or_null(v)));
    }
    if let Some(v) = &patch.images {
        out.push(("images", Value::Text(images_to_json(v))));
    }
    if let Some(v) = &patch.mobile_number {
        out.push(("mobile_number", text_or_null(v)));
    }
    if let Some(v) = patch.latitude {
        out.push(("latitude", v.map_or(Value::Null, Value::Real)));
    }
    if let Some(v) = patch.longitude {
        out.push(("longitude", v.map_or(Value::Null, Value::Real)));
    }
    if let Some(v) = patch.verification_status {
        out.push(("verification_status", Value::Integer(v as i64)));
    }
    if let Some(v) = patch.views_count {
        out.push(("views_count", Value::Integer(v)));
    }

    out
}

fn text_or_null(v: &Option<String>) -> Value {
    v.clone().map_or(Value::Null, Value::Text)
}

fn int_or_null(v: Option<i64>) -> Value {
    v.map_or(Value::Null, Value::Integer)
}

/// Fixed hash used to equalise timing for unknown emails.
pub(crate) fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| password::hash_password("timing-equaliser").ok())
        .as_deref()
}
