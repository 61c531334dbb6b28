use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};

use super::{from_millis, to_millis, StoreError};
use crate::cache::{CoordinateKey, RequestLog};
use crate::models::{DataSource, RequestLogEntry};

#[derive(Clone)]
pub struct SqliteRequestLog {
    pool: Pool<Sqlite>,
}

impl SqliteRequestLog {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestLog for SqliteRequestLog {
    async fn append(&self, entry: &RequestLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO request_log (latitude, longitude, timezone, requested_at, source)
             VALUES (?, ?, ?, ?, ?)"
        )
        .bind(entry.key.latitude())
        .bind(entry.key.longitude())
        .bind(entry.key.timezone())
        .bind(to_millis(entry.requested_at))
        .bind(entry.source.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<RequestLogEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT latitude, longitude, timezone, requested_at, source
             FROM request_log
             ORDER BY id DESC
             LIMIT ?"
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let source: String = row.try_get("source")?;
            let Some(source) = DataSource::parse(&source) else {
                continue;
            };
            let timezone: String = row.try_get("timezone")?;
            entries.push(RequestLogEntry {
                key: CoordinateKey::new(row.try_get("latitude")?, row.try_get("longitude")?, &timezone),
                requested_at: from_millis(row.try_get("requested_at")?)?,
                source,
            });
        }

        Ok(entries)
    }
}
