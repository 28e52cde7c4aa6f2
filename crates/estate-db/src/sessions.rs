use anyhow::Result;
use rusqlite::{OptionalExtension, params};

use crate::models::SessionRow;
use crate::{Database, timestamp};

impl Database {
    pub fn create_session(
        &self,
        id: &str,
        subject_id: &str,
        kind: &str,
        expires_at: &str,
    ) -> Result<()> {
        let now = timestamp();
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO sessions (id, subject_id, kind, created_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id, subject_id, kind, now, expires_at],
            )?;
            Ok(())
        })
    }

    /// The session, only while it has not expired.
    pub fn get_live_session(&self, id: &str) -> Result<Option<SessionRow>> {
        let now = timestamp();
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id, subject_id, kind, created_at, expires_at
                     FROM sessions WHERE id = ?1 AND expires_at > ?2",
                    params![id, now],
                    |row| {
                        Ok(SessionRow {
                            id: row.get(0)?,
                            subject_id: row.get(1)?,
                            kind: row.get(2)?,
                            created_at: row.get(3)?,
                            expires_at: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    pub fn delete_session(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
            Ok(removed > 0)
        })
    }

    /// Remove every expired session. Returns how many were pruned.
    pub fn prune_expired_sessions(&self) -> Result<usize> {
        let now = timestamp();
        self.with_conn(|conn| {
            let removed = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now])?;
            Ok(removed)
        })
    }
}
