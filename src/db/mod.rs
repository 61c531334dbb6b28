pub mod cache_entry;
pub mod connection;
pub mod migration;
pub mod region;
pub mod request_log;

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use cache_entry::SqliteCacheStore;
pub use region::SqliteRegionRegistry;
pub use request_log::SqliteRequestLog;

/// Failure of a cache, registry or request-log operation.
///
/// Never surfaced to a weather caller: the service degrades reads to a miss
/// and writes to best effort.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Payload serialization error: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub(crate) fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn from_millis(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis).ok_or(StoreError::InvalidTimestamp(millis))
}
