use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "changeme",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ESTATE_JWT_SECRET is unset or still a placeholder")]
    InsecureSecret,

    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub storage_dir: PathBuf,
    pub public_url: String,
    pub admin_session_hours: i64,
    pub user_session_days: i64,
    pub max_image_bytes: usize,
    pub search_radius_km: f64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = get("ESTATE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::InsecureSecret);
        }

        let host = get("ESTATE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parsed(&get, "ESTATE_PORT", 3000)?;
        let public_url = get("ESTATE_PUBLIC_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let config = Config {
            host,
            port,
            db_path: get("ESTATE_DB_PATH").unwrap_or_else(|| "estate.db".into()).into(),
            jwt_secret,
            storage_dir: get("ESTATE_STORAGE_DIR")
                .unwrap_or_else(|| "./storage".into())
                .into(),
            public_url,
            admin_session_hours: parsed(&get, "ESTATE_ADMIN_SESSION_HOURS", 8)?,
            user_session_days: parsed(&get, "ESTATE_USER_SESSION_DAYS", 30)?,
            max_image_bytes: parsed(&get, "ESTATE_MAX_IMAGE_BYTES", 5 * 1024 * 1024)?,
            search_radius_km: parsed(&get, "ESTATE_SEARCH_RADIUS_KM", 10.0)?,
        };

        if config.admin_session_hours <= 0 {
            return Err(invalid("ESTATE_ADMIN_SESSION_HOURS", config.admin_session_hours));
        }
        if config.user_session_days <= 0 {
            return Err(invalid("ESTATE_USER_SESSION_DAYS", config.user_session_days));
        }
        if !(config.search_radius_km > 0.0) {
            return Err(invalid("ESTATE_SEARCH_RADIUS_KM", config.search_radius_km));
        }
        Ok(config)
    }
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn parsed<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| invalid(key, raw)),
    }
}
