use std::env;

/// Fallback signing secret for local development only.
pub const LOCAL_SECRET_KEY: &str = "local-development-secret-key-do-not-use-in-production";

/// Default database for local runs: a `posts.db` file in the working directory.
pub const LOCAL_DATABASE_URL: &str = "sqlite://posts.db";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5002";

/// AppConfig
///
/// Holds the application's entire configuration state. It is immutable once loaded
/// and is pulled into handlers and extractors via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // SQLite connection string, e.g. `sqlite://posts.db`.
    pub db_url: String,
    // Runtime environment marker. Controls log format and cookie security.
    pub env: Env,
    // Secret the session cookie signing key is derived from.
    pub secret_key: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
}

/// Env
///
/// Local runs get pretty logs, plain-HTTP cookies and fallback secrets;
/// production gets JSON logs, `Secure` cookies and mandatory secrets.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for tests: in-memory database, local mode.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            env: Env::Local,
            secret_key: LOCAL_SECRET_KEY.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics in production if `SECRET_KEY` or `DATABASE_URL` is not set, so the server
    /// never starts with a guessable signing key or a throwaway database.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").unwrap_or_else(|_| LOCAL_DATABASE_URL.to_string()),
                secret_key: env::var("SECRET_KEY").unwrap_or_else(|_| LOCAL_SECRET_KEY.to_string()),
                bind_addr,
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                secret_key: env::var("SECRET_KEY").expect("FATAL: SECRET_KEY required in prod"),
                bind_addr,
            },
        }
    }

    /// Session cookies carry the `Secure` flag only in production.
    pub fn secure_cookies(&self) -> bool {
        self.env == Env::Production
    }
}
