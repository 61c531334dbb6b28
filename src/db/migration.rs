use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // Coordinates are stored as degrees * 10^4 so key equality is exact
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS weather_cache (
            lat_e4 INTEGER NOT NULL,
            lon_e4 INTEGER NOT NULL,
            timezone TEXT NOT NULL,
            payload TEXT NOT NULL,
            aqi INTEGER NOT NULL,
            aqi_status TEXT NOT NULL,
            last_updated INTEGER NOT NULL,
            next_update_time INTEGER NOT NULL,
            PRIMARY KEY (lat_e4, lon_e4, timezone)
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS active_regions (
            lat_e4 INTEGER NOT NULL,
            lon_e4 INTEGER NOT NULL,
            timezone TEXT NOT NULL,
            last_requested_at INTEGER NOT NULL,
            request_count INTEGER NOT NULL DEFAULT 1,
            created_at INTEGER NOT NULL,
            PRIMARY KEY (lat_e4, lon_e4, timezone)
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS request_log (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            timezone TEXT NOT NULL,
            requested_at INTEGER NOT NULL,
            source TEXT NOT NULL
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_active_regions_last_requested
         ON active_regions(last_requested_at)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_request_log_requested_at
         ON request_log(requested_at)"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
