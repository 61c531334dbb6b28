pub mod keys;
pub mod memory;
pub mod region;
pub mod request_log;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};

use crate::db::StoreError;
use crate::models::{CacheEntry, Forecast};
use crate::scheduler::boundary::next_boundary;

pub use keys::CoordinateKey;
pub use memory::MemoryCacheStore;
pub use region::{ActiveRegionRegistry, MemoryRegionRegistry};
pub use request_log::{MemoryRequestLog, RequestLog};

/// Durable map from coordinate key to the latest snapshot for it.
///
/// Writes are full-snapshot upserts: concurrent writers for one key
/// converge to last-writer-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &CoordinateKey) -> Result<Option<CacheEntry>, StoreError>;

    /// Insert or replace the entry for `key`, stamping `last_updated = now`
    /// and targeting the next 00:00/12:00 local boundary.
    async fn upsert(
        &self,
        key: &CoordinateKey,
        payload: &Forecast,
        aqi: i64,
        aqi_status: &str,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry, StoreError>;
}

/// Build the entry an upsert at `now` should persist
pub fn build_entry(
    key: &CoordinateKey,
    payload: &Forecast,
    aqi: i64,
    aqi_status: &str,
    now: DateTime<Utc>,
) -> CacheEntry {
    CacheEntry {
        key: key.clone(),
        payload: payload.clone(),
        aqi,
        aqi_status: aqi_status.to_string(),
        last_updated: now,
        next_update_time: next_update_time(now),
    }
}

/// Next 00:00 or 12:00 local server time strictly after `now`
pub fn next_update_time(now: DateTime<Utc>) -> DateTime<Utc> {
    next_boundary(&now.with_timezone(&Local)).with_timezone(&Utc)
}

/// Oldest `last_requested_at` still counted as active.
///
/// A window too large to represent keeps every region active.
pub fn active_cutoff(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    chrono::Duration::try_days(window_days.max(0))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
