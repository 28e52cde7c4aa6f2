use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::{require_admin, require_auth, require_user};
use crate::{admin, images, moderation, properties, saved};

/// JSON bodies never need more than this.
const JSON_BODY_LIMIT: usize = 256 * 1024;

/// The full HTTP surface: public browsing, signed-in user routes, admin
/// routes and static image serving.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/admin/auth/login", post(admin::login))
        .route("/properties", get(properties::list_properties))
        .route("/properties/{id}", get(properties::get_property))
        .with_state(state.clone());

    let user_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/properties", post(properties::create_property))
        .route(
            "/properties/{id}",
            put(properties::update_property).delete(properties::delete_property),
        )
        .route("/properties/{id}/save", post(saved::save).delete(saved::unsave))
        .route("/me/properties", get(properties::my_properties))
        .route("/me/saved", get(saved::list_saved))
        .layer(middleware::from_fn_with_state(state.clone(), require_user))
        .with_state(state.clone());

    // Owner or admin; the handler checks ownership for user sessions.
    let upload_routes = Router::new()
        .route("/properties/{id}/images", post(images::upload_image))
        .layer(DefaultBodyLimit::max(state.max_image_bytes + 1))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/admin/auth/logout", post(admin::logout))
        .route("/admin/auth/me", get(admin::me))
        .route("/admin/stats", get(moderation::stats))
        .route("/admin/users", get(moderation::list_users))
        .route("/admin/users/{id}", delete(moderation::delete_user))
        .route("/admin/admins", get(admin::list_admins).post(admin::create_admin))
        .route(
            "/admin/admins/{id}",
            put(admin::update_admin).delete(admin::delete_admin),
        )
        .route("/admin/properties", get(moderation::list_properties))
        .route(
            "/admin/properties/{id}",
            delete(moderation::delete_property).patch(moderation::update_property),
        )
        .route(
            "/admin/properties/{id}/verification",
            put(moderation::set_verification),
        )
        .route("/admin/saved-properties", get(moderation::list_saved))
        .route("/admin/saved-properties/{id}", delete(moderation::delete_saved))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin))
        .with_state(state.clone());

    let json_routes = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(JSON_BODY_LIMIT));

    Router::new()
        .merge(json_routes)
        .merge(upload_routes)
        .nest_service("/storage", ServeDir::new(state.storage.root()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
