use std::collections::BTreeMap;

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use estate_db::DbError;

/// Field name to human-readable problem.
pub type FieldErrors = BTreeMap<String, String>;

/// Every handler failure. Rendered as `{message, code, details, hint}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed")]
    Validation(FieldErrors),

    #[error("Payload too large: limit is {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// The request could not be parsed into the handler's input.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Internal server error")]
    Internal,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: &'static str,
    details: Option<serde_json::Value>,
    hint: Option<&'static str>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiError::Rejected { status, .. } => *status,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "permission_denied",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_failed",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::UnsupportedMediaType(_) => "unsupported_media_type",
            ApiError::Rejected { status, .. } => match *status {
                StatusCode::UNPROCESSABLE_ENTITY => "invalid_body",
                StatusCode::UNSUPPORTED_MEDIA_TYPE => "unsupported_media_type",
                StatusCode::PAYLOAD_TOO_LARGE => "payload_too_large",
                _ => "bad_request",
            },
            ApiError::Internal => "internal",
        }
    }

    fn hint(&self) -> Option<&'static str> {
        match self {
            ApiError::Unauthorized(_) => Some("Sign in again to obtain a fresh token"),
            ApiError::UnsupportedMediaType(_) => Some("Send the raw image with an image/* content type"),
            _ => None,
        }
    }

    pub fn unauthorized() -> Self {
        ApiError::Unauthorized("Authentication required".into())
    }

    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid login credentials".into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match &self {
            ApiError::Validation(fields) => serde_json::to_value(fields).ok(),
            _ => None,
        };
        let body = ErrorBody {
            message: self.to_string(),
            code: self.code(),
            details,
            hint: self.hint(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            DbError::Conflict(msg) => ApiError::Conflict(msg),
            DbError::NotFound(_) => ApiError::NotFound("Record"),
            DbError::Other(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if estate_db::error::is_conflict(&err) {
            return ApiError::Conflict("Record already exists".into());
        }
        error!("Internal error: {:#}", err);
        ApiError::Internal
    }
}
