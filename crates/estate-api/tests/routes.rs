use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use estate_api::storage::ImageStorage;
use estate_api::{AppState, AppStateInner, router};
use estate_db::Database;

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "changeme123";

struct TestApp {
    router: Router,
    _storage: TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let storage_dir = tempfile::tempdir().unwrap();
        let state: AppState = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            storage: ImageStorage::new(storage_dir.path().to_path_buf()).await.unwrap(),
            jwt_secret: "integration-test-secret".into(),
            public_url: "http://localhost:3000".into(),
            admin_session: chrono::Duration::hours(8),
            user_session: chrono::Duration::days(30),
            max_image_bytes: 1024,
            search_radius_km: 10.0,
        });
        Self {
            router: router(state),
            _storage: storage_dir,
        }
    }

    async fn raw(&self, req: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let (status, bytes) = self.raw(req).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn admin_token(&self) -> String {
        self.admin_login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    async fn admin_login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/admin/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn signup(&self, email: &str, name: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": "correct-horse",
                    "full_name": name,
                    "phone": "9876543210",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn list(&self, token: &str, title: &str, price: f64, kind: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/properties",
                Some(token),
                Some(listing(title, price, kind)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        // Keeps created_at strictly increasing between listings.
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        body["id"].as_str().unwrap().to_string()
    }
}

fn listing(title: &str, price: f64, kind: &str) -> Value {
    json!({
        "title": title,
        "description": "Corner unit with a balcony",
        "address": "Linking Road, Bandra West, Mumbai",
        "price": price,
        "type": kind,
        "beds": 2,
        "baths": 2,
        "sqft": 900,
        "mobile_number": "9876543210",
        "latitude": 19.0607,
        "longitude": 72.8362,
    })
}

#[tokio::test]
async fn seeded_admin_can_log_in() {
    let app = TestApp::new().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/admin/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["admin"]["email"], ADMIN_EMAIL);
    assert_eq!(body["admin"]["name"], "System Admin");
    assert!(body["admin"].get("password_hash").is_none());

    let token = body["token"].as_str().unwrap();
    let (status, me) = app.call(Method::GET, "/admin/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["status"], "active");
    assert!(!me["last_login"].is_null());
}

#[tokio::test]
async fn bad_credentials_are_indistinguishable() {
    let app = TestApp::new().await;

    let (wrong_status, wrong_body) = app
        .call(
            Method::POST,
            "/admin/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": "wrongpass" })),
        )
        .await;
    let (ghost_status, ghost_body) = app
        .call(
            Method::POST,
            "/admin/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": ADMIN_PASSWORD })),
        )
        .await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(ghost_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, ghost_body);
}

#[tokio::test]
async fn admin_routes_reject_users_and_anonymous_callers() {
    let app = TestApp::new().await;
    let user = app.signup("riya@example.com", "Riya Shah").await;

    let (status, _) = app.call(Method::GET, "/admin/stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call(Method::GET, "/admin/stats", Some(&user), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(Method::GET, "/admin/stats", Some("not.a.jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rent_listing_is_visible_to_admin_until_deleted() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;
    let admin = app.admin_token().await;

    let id = app.list(&owner, "Sea-facing 2BHK", 25_000.0, "rent").await;

    let (status, all) = app.call(Method::GET, "/admin/properties", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0]["id"], id.as_str());
    assert_eq!(all[0]["type"], "rent");
    assert_eq!(all[0]["price"], 25_000.0);
    assert_eq!(all[0]["verification_status"], false);
    assert_eq!(all[0]["owner_name"], "Owner One");
    assert_eq!(all[0]["owner_email"], "owner@example.com");

    let uri = format!("/admin/properties/{}", id);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, all) = app.call(Method::GET, "/admin/properties", Some(&admin), None).await;
    assert!(all.as_array().unwrap().is_empty());
    let (status, _) = app.call(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_patch_cannot_touch_protected_fields() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;
    let admin = app.admin_token().await;
    let id = app.list(&owner, "Sea-facing 2BHK", 25_000.0, "rent").await;

    let (_, before) = app
        .call(Method::GET, &format!("/properties/{}", id), None, None)
        .await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let (status, after) = app
        .call(
            Method::PATCH,
            &format!("/admin/properties/{}", id),
            Some(&admin),
            Some(json!({
                "id": "00000000-0000-0000-0000-000000000000",
                "user_id": "00000000-0000-0000-0000-000000000000",
                "created_at": "2001-01-01T00:00:00Z",
                "title": "Sea-facing 2BHK, renovated",
                "imageUrl": "https://cdn.example.com/cover.jpg",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", after);
    assert_eq!(after["id"], before["id"]);
    assert_eq!(after["user_id"], before["user_id"]);
    assert_eq!(after["created_at"], before["created_at"]);
    assert_eq!(after["title"], "Sea-facing 2BHK, renovated");
    assert_eq!(after["image_url"], "https://cdn.example.com/cover.jpg");

    let before_ts: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(before["updated_at"].clone()).unwrap();
    let after_ts: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(after["updated_at"].clone()).unwrap();
    assert!(after_ts > before_ts);
}

#[tokio::test]
async fn verification_toggle() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;
    let admin = app.admin_token().await;
    let id = app.list(&owner, "Villa", 9_000_000.0, "sale").await;
    let uri = format!("/admin/properties/{}/verification", id);

    for _ in 0..2 {
        let (status, body) = app
            .call(Method::PUT, &uri, Some(&admin), Some(json!({ "verified": true })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["verification_status"], true);
    }

    // Owners cannot reach the admin route.
    let (status, _) = app
        .call(Method::PUT, &uri, Some(&owner), Some(json!({ "verified": false })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_input_cannot_self_verify() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;

    let mut body = listing("Villa", 9_000_000.0, "sale");
    body["verification_status"] = json!(true);
    let (status, err) = app.call(Method::POST, "/properties", Some(&owner), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["code"], "invalid_body");
    assert!(err["message"].as_str().unwrap().contains("verification_status"));

    let (_, mine) = app.call(Method::GET, "/me/properties", Some(&owner), None).await;
    assert!(mine.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;

    let (status, err) = app
        .call(Method::GET, "/properties/not-a-uuid", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "bad_request");

    let (status, err) = app
        .call(Method::GET, "/properties?min_price=cheap", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "bad_request");

    let mut body = listing("Villa", 9_000_000.0, "sale");
    body["type"] = json!("lease");
    let (status, err) = app.call(Method::POST, "/properties", Some(&owner), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["code"], "invalid_body");

    let req = Request::builder()
        .method(Method::POST)
        .uri("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, bytes) = app.raw(req).await;
    let err: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "bad_request");
    assert!(err["message"].is_string());
}

#[tokio::test]
async fn listing_validation_reports_fields() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;

    let mut body = listing("", 0.0, "sale");
    body["mobile_number"] = json!("12345");
    let (status, err) = app.call(Method::POST, "/properties", Some(&owner), Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err["code"], "validation_failed");
    assert_eq!(err["details"]["title"], "Title is required");
    assert_eq!(err["details"]["price"], "Price must be greater than 0");
    assert_eq!(err["details"]["mobile_number"], "Mobile number must be 10 digits");
}

#[tokio::test]
async fn only_the_owner_edits_a_listing() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;
    let other = app.signup("other@example.com", "Someone Else").await;
    let id = app.list(&owner, "Studio", 12_000.0, "rent").await;
    let uri = format!("/properties/{}", id);

    let edit = listing("Hijacked", 1.0, "sale");
    let (status, _) = app.call(Method::PUT, &uri, Some(&other), Some(edit.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.call(Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = app.call(Method::PUT, &uri, Some(&owner), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Hijacked");

    let (_, mine) = app.call(Method::GET, "/me/properties", Some(&owner), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
    let (_, theirs) = app.call(Method::GET, "/me/properties", Some(&other), None).await;
    assert!(theirs.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn browse_filters_by_price_range() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;
    app.list(&owner, "Budget flat", 400_000.0, "sale").await;
    app.list(&owner, "Mid flat", 2_500_000.0, "sale").await;
    app.list(&owner, "Penthouse", 15_000_000.0, "sale").await;

    let (status, hits) = app
        .call(Method::GET, "/properties?price_range=2000000-5000000", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let hits = hits.as_array().unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0]["price"], 2_500_000.0);

    let (_, rentals) = app.call(Method::GET, "/properties?type=rent", None, None).await;
    assert!(rentals.as_array().unwrap().is_empty());

    // Newest first.
    let (_, all) = app.call(Method::GET, "/properties", None, None).await;
    let titles: Vec<&str> = all
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Penthouse", "Mid flat", "Budget flat"]);

    // Listings sit in Bandra; Pune is well outside 10 km.
    let (_, near) = app
        .call(Method::GET, "/properties?lat=19.0596&lng=72.8295", None, None)
        .await;
    assert_eq!(near.as_array().unwrap().len(), 3);
    let (_, far) = app
        .call(Method::GET, "/properties?lat=18.5204&lng=73.8567", None, None)
        .await;
    assert!(far.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn detail_counts_views() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;
    let id = app.list(&owner, "Studio", 12_000.0, "rent").await;
    let uri = format!("/properties/{}", id);

    app.call(Method::GET, &uri, None, None).await;
    let (status, body) = app.call(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["views_count"], 2);
    assert_eq!(body["owner_name"], "Owner One");

    let (status, _) = app
        .call(Method::GET, "/properties/00000000-0000-0000-0000-000000000000", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new().await;
    let user = app.signup("riya@example.com", "Riya Shah").await;

    let (status, me) = app.call(Method::GET, "/auth/me", Some(&user), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "riya@example.com");

    let (status, _) = app.call(Method::POST, "/auth/logout", Some(&user), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::GET, "/auth/me", Some(&user), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging back in issues a fresh, working token.
    let (status, body) = app
        .call(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "riya@example.com", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    let (status, _) = app.call(Method::GET, "/auth/me", Some(token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn duplicate_signup_conflicts() {
    let app = TestApp::new().await;
    app.signup("riya@example.com", "Riya Shah").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "email": "riya@example.com",
                "password": "another-password",
                "full_name": "Riya Again",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_management_lifecycle() {
    let app = TestApp::new().await;
    let root = app.admin_token().await;

    let (status, created) = app
        .call(
            Method::POST,
            "/admin/admins",
            Some(&root),
            Some(json!({ "email": "ops@example.com", "name": "Ops", "password": "ops-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let ops_id = created["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            Method::POST,
            "/admin/admins",
            Some(&root),
            Some(json!({ "email": "ops@example.com", "name": "Ops 2", "password": "ops-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let ops = app.admin_login("ops@example.com", "ops-password").await;
    let (status, admins) = app.call(Method::GET, "/admin/admins", Some(&ops), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(admins.as_array().unwrap().len(), 2);

    // Deactivation cuts off the live session immediately.
    let (status, updated) = app
        .call(
            Method::PUT,
            &format!("/admin/admins/{}", ops_id),
            Some(&root),
            Some(json!({ "name": "Ops", "status": "inactive" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "inactive");
    let (status, _) = app.call(Method::GET, "/admin/auth/me", Some(&ops), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/admin/admins/{}", ops_id),
            Some(&root),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn admins_cannot_delete_themselves() {
    let app = TestApp::new().await;
    let root = app.admin_token().await;
    let (_, me) = app.call(Method::GET, "/admin/auth/me", Some(&root), None).await;
    let id = me["id"].as_str().unwrap();

    let (status, body) = app
        .call(Method::DELETE, &format!("/admin/admins/{}", id), Some(&root), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");
}

#[tokio::test]
async fn admins_cannot_edit_themselves() {
    let app = TestApp::new().await;
    let root = app.admin_token().await;
    let (_, me) = app.call(Method::GET, "/admin/auth/me", Some(&root), None).await;
    let id = me["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/admin/admins/{}", id),
            Some(&root),
            Some(json!({ "name": "Root", "status": "inactive" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");

    let (status, me) = app.call(Method::GET, "/admin/auth/me", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["status"], "active");
    assert_eq!(me["name"], "System Admin");

    // Still able to sign in afresh.
    app.admin_token().await;
}

#[tokio::test]
async fn bookmarks_and_moderation() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;
    let fan = app.signup("fan@example.com", "Keen Buyer").await;
    let admin = app.admin_token().await;
    let id = app.list(&owner, "Garden villa", 8_500_000.0, "sale").await;
    let save_uri = format!("/properties/{}/save", id);

    let (status, _) = app.call(Method::POST, &save_uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.call(Method::POST, &save_uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, saved) = app.call(Method::GET, "/me/saved", Some(&fan), None).await;
    assert_eq!(saved.as_array().unwrap().len(), 1);

    let (_, stats) = app.call(Method::GET, "/admin/stats", Some(&admin), None).await;
    assert_eq!(stats["total_users"], 2);
    assert_eq!(stats["total_properties"], 1);
    assert_eq!(stats["total_saved_properties"], 1);

    let (_, found) = app
        .call(Method::GET, "/admin/saved-properties?search=keen", Some(&admin), None)
        .await;
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["property_title"], "Garden villa");
    assert_eq!(found[0]["user_email"], "fan@example.com");
    let (_, none) = app
        .call(Method::GET, "/admin/saved-properties?search=nobody", Some(&admin), None)
        .await;
    assert!(none.as_array().unwrap().is_empty());

    let saved_id = found[0]["id"].as_str().unwrap();
    let (status, _) = app
        .call(
            Method::DELETE,
            &format!("/admin/saved-properties/{}", saved_id),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call(Method::DELETE, &save_uri, Some(&fan), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_user_listing_and_deletion() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;
    let admin = app.admin_token().await;
    let id = app.list(&owner, "Studio", 12_000.0, "rent").await;
    app.call(Method::GET, &format!("/properties/{}", id), None, None).await;

    let (status, users) = app
        .call(Method::GET, "/admin/users?search=owner", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["listed_properties"], 1);
    assert_eq!(users[0]["total_views"], 1);
    assert!(users[0].get("password_hash").is_none());

    let user_id = users[0]["id"].as_str().unwrap();
    let (status, _) = app
        .call(Method::DELETE, &format!("/admin/users/{}", user_id), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The deleted user's session is gone; their listing stays, orphaned.
    let (status, _) = app.call(Method::GET, "/auth/me", Some(&owner), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (_, all) = app.call(Method::GET, "/admin/properties", Some(&admin), None).await;
    assert!(all[0]["owner_name"].is_null());
}

#[tokio::test]
async fn image_upload_is_served_back() {
    let app = TestApp::new().await;
    let owner = app.signup("owner@example.com", "Owner One").await;
    let other = app.signup("other@example.com", "Someone Else").await;
    let id = app.list(&owner, "Studio", 12_000.0, "rent").await;
    let uri = format!("/properties/{}/images", id);

    let upload = |token: &str, content_type: &str, bytes: Vec<u8>| {
        Request::builder()
            .method(Method::POST)
            .uri(&uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(bytes))
            .unwrap()
    };

    let (status, bytes) = app.raw(upload(&owner, "image/png", b"fake-png".to_vec())).await;
    assert_eq!(status, StatusCode::CREATED);
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    let url = body["url"].as_str().unwrap().to_string();
    let prefix = format!("http://localhost:3000/storage/properties/{}/", id);
    assert!(url.starts_with(&prefix), "{}", url);
    assert!(url.ends_with(".png"));

    let (_, detail) = app.call(Method::GET, &format!("/properties/{}", id), None, None).await;
    assert_eq!(detail["image_url"], url.as_str());
    assert_eq!(detail["images"][0], url.as_str());

    let path = url.trim_start_matches("http://localhost:3000");
    let (status, served) = app
        .raw(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, b"fake-png");

    let (status, _) = app.raw(upload(&owner, "application/pdf", b"%PDF".to_vec())).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, _) = app.raw(upload(&owner, "image/jpeg", vec![0u8; 1025])).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (status, _) = app.raw(upload(&other, "image/png", b"intruder".to_vec())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let admin = app.admin_token().await;
    let (status, _) = app.raw(upload(&admin, "image/webp", b"admin-pic".to_vec())).await;
    assert_eq!(status, StatusCode::CREATED);
}
