use thiserror::Error;

/// Failures of the privileged operations in [`crate::procedures`].
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        if is_unique_violation(&err) {
            return DbError::Conflict(err.to_string());
        }
        DbError::Other(err.into())
    }
}

pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Unique-constraint failure carried inside an `anyhow` error from the
/// non-privileged query paths.
pub fn is_conflict(err: &anyhow::Error) -> bool {
    err.downcast_ref::<rusqlite::Error>()
        .is_some_and(is_unique_violation)
}
