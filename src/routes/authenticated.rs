use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every route here is wrapped by the login middleware in `create_router`, so the
/// handlers only run for logged-in users.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /logout
        // Clears the session and returns to the home page.
        .route("/logout", get(handlers::logout))
        // POST /post/{id}/comment
        // Adds a comment as the current user.
        .route("/post/{id}/comment", post(handlers::add_comment))
}
