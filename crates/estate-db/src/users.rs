use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, params};

use estate_crypto::password;

use crate::models::{USER_COLUMNS, UserRow, user_from_row};
use crate::procedures::dummy_hash;
use crate::{Database, timestamp};

impl Database {
    pub fn create_user(
        &self,
        id: &str,
        email: &str,
        full_name: &str,
        phone: Option<&str>,
        password_hash: &str,
    ) -> Result<()> {
        let now = timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, full_name, phone, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                params![id, email, full_name, phone, password_hash, now],
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "u.email = ?1", email))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "u.id = ?1", id))
    }

    /// The user with this email and password, touching `last_sign_in_at`.
    /// Unknown email and wrong password both return `None`.
    pub fn authenticate_user(&self, email: &str, plain: &str) -> Result<Option<UserRow>> {
        let candidate = self.get_user_by_email(email)?;

        // Hash verification runs outside the connection lock.
        let Some(user) = candidate else {
            if let Some(dummy) = dummy_hash() {
                let _ = password::verify_password(plain, dummy);
            }
            return Ok(None);
        };
        if !password::verify_password(plain, &user.password_hash) {
            return Ok(None);
        }

        self.touch_user_sign_in(&user.id)?;
        self.get_user_by_id(&user.id)
    }

    pub fn touch_user_sign_in(&self, id: &str) -> Result<()> {
        let now = timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET last_sign_in_at = ?1, updated_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, predicate: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {} FROM users u WHERE {}", USER_COLUMNS, predicate);
    let row = conn.query_row(&sql, [value], user_from_row).optional()?;
    Ok(row)
}
