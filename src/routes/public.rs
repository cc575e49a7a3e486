use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Read-only pages plus the registration and login forms.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /
        // All posts, newest first.
        .route("/", get(handlers::list_posts))
        // GET /post/{id}
        // One post with its comments; the comment form shows for logged-in users.
        .route("/post/{id}", get(handlers::show_post))
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/about", get(handlers::about))
        .route("/contact", get(handlers::contact))
}
