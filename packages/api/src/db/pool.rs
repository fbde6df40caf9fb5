//! Connection pool construction and schema migrations.

use std::str::FromStr;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};

use crate::error::StorageError;
use crate::settings::DatabaseSettings;

/// Embedded schema from `migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open a pool for `settings.url` and bring the schema up to date.
///
/// An in-memory database lives only as long as its connection, so for
/// `sqlite::memory:` the pool is pinned to one connection that never expires.
pub async fn connect(settings: &DatabaseSettings) -> Result<SqlitePool, StorageError> {
    let in_memory = settings.url.contains(":memory:");

    let mut options = SqliteConnectOptions::from_str(&settings.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(settings.query_timeout());
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let mut pool_options = SqlitePoolOptions::new().acquire_timeout(settings.query_timeout());
    pool_options = if in_memory {
        pool_options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        pool_options.max_connections(settings.max_connections)
    };

    let pool = pool_options.connect_with(options).await?;
    MIGRATOR.run(&pool).await?;
    tracing::info!(url = %settings.url, "database ready");
    Ok(pool)
}
