//! In-memory weather cache implementation using Moka

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use tracing::debug;

use super::{build_entry, keys::CoordinateKey, CacheStore};
use crate::db::StoreError;
use crate::models::{CacheEntry, Forecast};

/// Process-local CacheStore.
///
/// No TTL is configured: freshness is decided by `CacheEntry::is_fresh` and
/// age alone never removes an entry. Unlike the SQLite store this backend is
/// bounded by `CACHE_MAX_CAPACITY`; once full, moka evicts the least useful
/// keys and a later lookup for them is a plain miss that refetches.
#[derive(Clone)]
pub struct MemoryCacheStore {
    cache: Cache<CoordinateKey, CacheEntry>,
}

impl MemoryCacheStore {
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(capacity).build();

        Self { cache }
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &CoordinateKey) -> Result<Option<CacheEntry>, StoreError> {
        let result = self.cache.get(key).await;
        if result.is_some() {
            debug!("Cache hit for key: {}", key);
        } else {
            debug!("Cache miss for key: {}", key);
        }
        Ok(result)
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
        self.cache.insert(key.clone(), entry.clone()).await;
        debug!(
            "Cached weather for {} until next boundary {}",
            key, entry.next_update_time
        );
        Ok(entry)
    }
}
