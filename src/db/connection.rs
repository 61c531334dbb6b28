// SQLite connection pool setup

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{migrate::MigrateDatabase, Sqlite, SqlitePool};
use tracing::info;

use crate::db::migration::run_migrations;

pub async fn establish_connection(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let in_memory = database_url.contains(":memory:");

    // Create database if it doesn't exist
    if !in_memory && !Sqlite::database_exists(database_url).await.unwrap_or(false) {
        info!("Creating database at {}", database_url);
        Sqlite::create_database(database_url).await?;
    }

    // Every pooled connection to :memory: would open its own empty database
    let max_connections = if in_memory { 1 } else { 5 };

    let mut options = SqlitePoolOptions::new().max_connections(max_connections);
    if in_memory {
        // Closing the only connection would drop the database with it
        options = options.idle_timeout(None).max_lifetime(None);
    }

    let pool = options.connect(database_url).await?;

    // Enable WAL mode for better concurrency
    if !in_memory {
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
    }

    run_migrations(&pool).await?;

    Ok(pool)
}
