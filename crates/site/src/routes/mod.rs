//! HTTP route handlers for the site.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (all listings, or ?q= search)
//! GET  /health                 - Health check
//! GET  /cars/{id}              - Listing detail page
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//!
//! # Dashboard (requires auth)
//! GET  /dashboard              - The seller's own listings
//! POST /dashboard/cars/{id}/delete       - Delete a listing (record + photos)
//! GET  /dashboard/new          - New-listing composer
//! POST /dashboard/new          - Publish the composed listing
//! POST /dashboard/new/images   - Upload one photo (multipart)
//! POST /dashboard/new/images/{name}/delete - Remove one pending photo
//! ```

pub mod auth;
pub mod cars;
pub mod dashboard;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/cars/{id}/delete", post(dashboard::delete))
        .route("/new", get(dashboard::new::page).post(dashboard::new::create))
        .route("/new/images", post(dashboard::new::upload))
        .route(
            "/new/images/{name}/delete",
            post(dashboard::new::delete_image),
        )
}

/// Create all routes for the site.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Listing detail
        .route("/cars/{id}", get(cars::show))
        // Auth routes
        .nest("/auth", auth_routes())
        // Dashboard routes
        .nest("/dashboard", dashboard_routes())
}
