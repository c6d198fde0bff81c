//! Database initialization and migration runner.
//!
//! SYSTEM CONTEXT
//! ==============
//! `LocalStore::open` uses this module to create the SQLx pool and bring the
//! `items` collection into existence before the first operation runs.
//!
//! SCHEMA
//! ======
//! Exactly one schema version exists. There is no upgrade path beyond the
//! initial migration; a second version would need its own migration file.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Current schema version, matching the newest file in `src/db/migrations`.
pub const SCHEMA_VERSION: i64 = 1;

const BUSY_TIMEOUT_SECS: u64 = 5;

/// Whether `database_url` names a private in-memory database.
#[must_use]
pub fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Initialize the SQLite connection pool and run migrations.
///
/// The database file is created when missing. In-memory databases live only
/// as long as their connection, so the pool is pinned to a single connection
/// that never idles out.
///
/// # Errors
///
/// Returns an error if the URL is malformed, the database cannot be opened,
/// or the migration fails.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

    let pool_options = if is_memory_url(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    let pool = pool_options.connect_with(options).await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}
