use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Row, Sqlite};

use super::{from_millis, to_millis, StoreError};
use crate::cache::{build_entry, CacheStore, CoordinateKey};
use crate::models::{CacheEntry, Forecast};

#[derive(Clone)]
pub struct SqliteCacheStore {
    pool: Pool<Sqlite>,
}

impl SqliteCacheStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

pub async fn get_entry(
    pool: &Pool<Sqlite>,
    key: &CoordinateKey,
) -> Result<Option<CacheEntry>, StoreError> {
    let row = sqlx::query(
        r#"SELECT payload, aqi, aqi_status, last_updated, next_update_time
           FROM weather_cache
           WHERE lat_e4 = ? AND lon_e4 = ? AND timezone = ?"#
    )
    .bind(key.lat_e4())
    .bind(key.lon_e4())
    .bind(key.timezone())
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let payload: String = row.try_get("payload")?;
    Ok(Some(CacheEntry {
        key: key.clone(),
        payload: serde_json::from_str(&payload)?,
        aqi: row.try_get("aqi")?,
        aqi_status: row.try_get("aqi_status")?,
        last_updated: from_millis(row.try_get("last_updated")?)?,
        next_update_time: from_millis(row.try_get("next_update_time")?)?,
    }))
}

pub async fn upsert_entry(pool: &Pool<Sqlite>, entry: &CacheEntry) -> Result<(), StoreError> {
    let payload = serde_json::to_string(&entry.payload)?;

    sqlx::query(
        r#"
        INSERT INTO weather_cache
        (lat_e4, lon_e4, timezone, payload, aqi, aqi_status, last_updated, next_update_time)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(lat_e4, lon_e4, timezone) DO UPDATE SET
            payload = excluded.payload,
            aqi = excluded.aqi,
            aqi_status = excluded.aqi_status,
            last_updated = excluded.last_updated,
            next_update_time = excluded.next_update_time
        "#
    )
    .bind(entry.key.lat_e4())
    .bind(entry.key.lon_e4())
    .bind(entry.key.timezone())
    .bind(payload)
    .bind(entry.aqi)
    .bind(&entry.aqi_status)
    .bind(to_millis(entry.last_updated))
    .bind(to_millis(entry.next_update_time))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn count_entries(pool: &Pool<Sqlite>) -> Result<i64, StoreError> {
    let count = sqlx::query("SELECT COUNT(*) FROM weather_cache")
        .fetch_one(pool)
        .await?
        .try_get::<i64, _>(0)?;

    Ok(count)
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &CoordinateKey) -> Result<Option<CacheEntry>, StoreError> {
        get_entry(&self.pool, key).await
    }

    async fn upsert(
        &self,
        key: &CoordinateKey,
        payload: &Forecast,
        aqi: i64,
        aqi_status: &str,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry, StoreError> {
        let entry = build_entry(key, payload, aqi, aqi_status, now);
        upsert_entry(&self.pool, &entry).await?;
        Ok(entry)
    }
}
