use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Post management. Each handler takes `AdminUser`, which rejects anonymous
/// visitors and readers with 403 before the handler body runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /new-post
        .route(
            "/new-post",
            get(handlers::new_post_page).post(handlers::create_post),
        )
        // GET/POST /edit-post/{id}
        // Edits keep the post's id, author and date.
        .route(
            "/edit-post/{id}",
            get(handlers::edit_post_page).post(handlers::edit_post),
        )
        // GET /delete/{id}
        // Deletes the post and, by cascade, its comments.
        .route("/delete/{id}", get(handlers::delete_post))
}
