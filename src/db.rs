//! Connection pool and schema setup.

use sqlx::{
    SqlitePool,
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;

/// Schema migrations embedded from `./migrations`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens a pool for `db_url`, creating the database file if needed.
///
/// Foreign keys are switched on for every connection; the cascade from posts to
/// comments depends on it.
pub async fn connect(db_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(db_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

/// A private in-memory database. Pinned to a single connection that never expires,
/// since every new SQLite memory connection would see an empty database.
pub async fn connect_in_memory() -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}
