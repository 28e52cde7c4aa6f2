pub mod admin;
pub mod auth;
pub mod convert;
pub mod error;
pub mod extract;
pub mod images;
pub mod middleware;
pub mod moderation;
pub mod properties;
pub mod router;
pub mod saved;
pub mod storage;
pub mod validation;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use router::router;
