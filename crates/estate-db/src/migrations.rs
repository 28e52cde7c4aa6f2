use anyhow::Result;
use rusqlite::{Connection, params};
use tracing::info;
use uuid::Uuid;

use crate::timestamp;

/// Bootstrap admin, created once so the first real admin can be added.
pub const SEED_ADMIN_EMAIL: &str = "admin@example.com";
pub const SEED_ADMIN_PASSWORD: &str = "changeme123";
pub const SEED_ADMIN_NAME: &str = "System Admin";

pub fn run(conn: &mut Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        let tx = conn.transaction()?;
        tx.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                email           TEXT NOT NULL UNIQUE,
                full_name       TEXT NOT NULL,
                phone           TEXT,
                password_hash   TEXT NOT NULL,
                last_sign_in_at TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE admins (
                id              TEXT PRIMARY KEY,
                email           TEXT NOT NULL UNIQUE,
                name            TEXT NOT NULL,
                password_hash   TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'active'
                                CHECK (status IN ('active', 'inactive')),
                last_login      TEXT,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE INDEX idx_admins_status ON admins(status);

            -- user_id is a soft reference: listings outlive their owner.
            CREATE TABLE properties (
                id                  TEXT PRIMARY KEY,
                title               TEXT NOT NULL,
                description         TEXT,
                address             TEXT NOT NULL,
                price               REAL NOT NULL,
                type                TEXT NOT NULL CHECK (type IN ('sale', 'rent')),
                beds                INTEGER,
                baths               INTEGER,
                sqft                INTEGER,
                image_url           TEXT,
                images              TEXT NOT NULL DEFAULT '[]',
                mobile_number       TEXT,
                latitude            REAL,
                longitude           REAL,
                verification_status INTEGER NOT NULL DEFAULT 0,
                views_count         INTEGER NOT NULL DEFAULT 0,
                user_id             TEXT NOT NULL,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE INDEX idx_properties_created ON properties(created_at);
            CREATE INDEX idx_properties_user ON properties(user_id);

            CREATE TABLE saved_properties (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                property_id TEXT NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, property_id)
            );

            CREATE TABLE sessions (
                id          TEXT PRIMARY KEY,
                subject_id  TEXT NOT NULL,
                kind        TEXT NOT NULL CHECK (kind IN ('user', 'admin')),
                created_at  TEXT NOT NULL,
                expires_at  TEXT NOT NULL
            );

            CREATE INDEX idx_sessions_subject ON sessions(subject_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
        tx.commit()?;
    }

    if version < 2 {
        info!("Running migration v2 (seed admin {})", SEED_ADMIN_EMAIL);
        let hash = estate_crypto::password::hash_password(SEED_ADMIN_PASSWORD)?;
        let now = timestamp();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO admins (id, email, name, password_hash, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'active', ?5, ?5)",
            params![Uuid::new_v4().to_string(), SEED_ADMIN_EMAIL, SEED_ADMIN_NAME, hash, now],
        )?;
        tx.execute("INSERT INTO schema_version (version) VALUES (2)", [])?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}
