use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use sha2::{Digest, Sha512};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tower_sessions::{
    Expiry, SessionManagerLayer, SessionStore,
    cookie::{Key, SameSite, time::Duration},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod services;
pub mod views;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::AppError;
pub use repository::{RepositoryState, SqliteRepository};

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "blog_session";

/// Sessions expire after this many days without a request.
const SESSION_EXPIRY_DAYS: i64 = 7;

/// AppState
///
/// The single, immutable container shared by every request: the repository and
/// the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: abstracts database access.
    pub repo: RepositoryState,
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Extractors pull only the component they need out of the shared AppState.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Wraps the `authenticated_routes`. Extracting `AuthUser` redirects anonymous
/// requests to the login page before the inner handler is reached.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

async fn not_found() -> AppError {
    AppError::NotFound
}

/// Derives the 64-byte cookie signing key from the configured secret, so any
/// secret length is accepted.
fn signing_key(secret: &str) -> Key {
    Key::from(Sha512::digest(secret.as_bytes()).as_slice())
}

/// create_router
///
/// Assembles the routing structure, the session layer (backed by `session_store`)
/// and the observability layers, and registers the application state.
pub fn create_router<Store>(state: AppState, session_store: Store) -> Router
where
    Store: SessionStore + Clone,
{
    // 1. Sessions: signed cookie referencing a server-side record.
    let session_layer = SessionManagerLayer::new(session_store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_secure(state.config.secure_cookies())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(signing_key(&state.config.secret_key));

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: Protected by the `auth_middleware`.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Admin Routes: the `AdminUser` extractor in each handler answers 403.
        .merge(admin::admin_routes())
        .nest_service("/static", ServeDir::new("static"))
        .fallback(not_found)
        .with_state(state)
        .layer(session_layer);

    // 3. Observability and Correlation Layers (Applied outermost)
    base_router.layer(
        ServiceBuilder::new()
            // 3a. Request ID Generation: a UUID for every incoming request.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            // 3b. Request Tracing: wraps the request/response lifecycle in a span.
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            // 3c. Request ID Propagation: echoes x-request-id back to the client.
            .layer(PropagateRequestIdLayer::new(x_request_id)),
    )
}

/// trace_span_logger
///
/// Builds the `http_request` span for `TraceLayer`, tagging it with method, URI
/// and the request id so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
