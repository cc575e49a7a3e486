use blog_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router, db,
    repository::{RepositoryState, SqliteRepository},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Initializes configuration, logging, the database, the session store and the
/// HTTP server, in that order.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    // RUST_LOG wins; otherwise debug for this crate and request logs from tower_http.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_portal=debug,tower_http=info".into());

    // 3. Initialize Logging based on Environment
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Database Initialization (SQLite) and schema migrations
    let pool = db::connect(&config.db_url)
        .await
        .expect("FATAL: Failed to open the database. Check DATABASE_URL.");
    db::migrate(&pool)
        .await
        .expect("FATAL: Failed to run database migrations.");

    let repo = Arc::new(SqliteRepository::new(pool.clone())) as RepositoryState;

    // 5. Session Store: sessions live in the same database.
    let session_store = SqliteStore::new(pool);
    session_store
        .migrate()
        .await
        .expect("FATAL: Failed to create the session table.");

    // 6. Unified State Assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState { repo, config };

    // 7. Router and Server Startup
    let app = create_router(app_state, session_store);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
