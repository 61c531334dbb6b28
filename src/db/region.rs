use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

use super::{from_millis, to_millis, StoreError};
use crate::cache::{ActiveRegionRegistry, CoordinateKey};
use crate::models::ActiveRegion;

#[derive(Clone)]
pub struct SqliteRegionRegistry {
    pool: Pool<Sqlite>,
}

impl SqliteRegionRegistry {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

pub async fn record_visit(
    pool: &Pool<Sqlite>,
    key: &CoordinateKey,
    at: DateTime<Utc>,
) -> Result<(), StoreError> {
    let at = to_millis(at);

    sqlx::query(
        "INSERT INTO active_regions (lat_e4, lon_e4, timezone, last_requested_at, request_count, created_at)
         VALUES (?, ?, ?, ?, 1, ?)
         ON CONFLICT(lat_e4, lon_e4, timezone) DO UPDATE SET
            last_requested_at = excluded.last_requested_at,
            request_count = active_regions.request_count + 1"
    )
    .bind(key.lat_e4())
    .bind(key.lon_e4())
    .bind(key.timezone())
    .bind(at)
    .bind(at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn list_active(
    pool: &Pool<Sqlite>,
    cutoff: DateTime<Utc>,
) -> Result<Vec<CoordinateKey>, StoreError> {
    let rows = sqlx::query(
        "SELECT lat_e4, lon_e4, timezone FROM active_regions
         WHERE last_requested_at >= ?
         ORDER BY last_requested_at DESC"
    )
    .bind(to_millis(cutoff))
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| -> Result<CoordinateKey, StoreError> {
            Ok(CoordinateKey::from_fixed(
                row.try_get("lat_e4")?,
                row.try_get("lon_e4")?,
                row.try_get::<String, _>("timezone")?,
            ))
        })
        .collect()
}

pub async fn sweep(pool: &Pool<Sqlite>, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM active_regions WHERE last_requested_at < ?")
        .bind(to_millis(cutoff))
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn get_region(
    pool: &Pool<Sqlite>,
    key: &CoordinateKey,
) -> Result<Option<ActiveRegion>, StoreError> {
    let row = sqlx::query(
        "SELECT last_requested_at, request_count, created_at FROM active_regions
         WHERE lat_e4 = ? AND lon_e4 = ? AND timezone = ?"
    )
    .bind(key.lat_e4())
    .bind(key.lon_e4())
    .bind(key.timezone())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(ActiveRegion {
            key: key.clone(),
            last_requested_at: from_millis(row.try_get("last_requested_at")?)?,
            request_count: row.try_get("request_count")?,
            created_at: from_millis(row.try_get("created_at")?)?,
        })),
        None => Ok(None),
    }
}

#[async_trait]
impl ActiveRegionRegistry for SqliteRegionRegistry {
    async fn record_visit(&self, key: &CoordinateKey, at: DateTime<Utc>) -> Result<(), StoreError> {
        record_visit(&self.pool, key, at).await
    }

    async fn list_active(&self, cutoff: DateTime<Utc>) -> Result<Vec<CoordinateKey>, StoreError> {
        list_active(&self.pool, cutoff).await
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        sweep(&self.pool, cutoff).await
    }

    async fn get(&self, key: &CoordinateKey) -> Result<Option<ActiveRegion>, StoreError> {
        get_region(&self.pool, key).await
    }
}
