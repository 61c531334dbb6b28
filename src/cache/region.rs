//! Active region tracking

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use super::keys::CoordinateKey;
use crate::db::StoreError;
use crate::models::ActiveRegion;

/// Liveness registry for recently requested coordinates.
///
/// `list_active` and `sweep` take the same cutoff instant: a region is
/// active when `last_requested_at >= cutoff` and swept when older.
#[async_trait]
pub trait ActiveRegionRegistry: Send + Sync {
    /// Create with `request_count = 1`, or bump the count and touch
    /// `last_requested_at`
    async fn record_visit(&self, key: &CoordinateKey, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Active keys, most recently requested first
    async fn list_active(&self, cutoff: DateTime<Utc>) -> Result<Vec<CoordinateKey>, StoreError>;

    /// Delete regions not requested since `cutoff`, returning how many
    async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn get(&self, key: &CoordinateKey) -> Result<Option<ActiveRegion>, StoreError>;
}

#[derive(Default)]
pub struct MemoryRegionRegistry {
    regions: RwLock<HashMap<CoordinateKey, ActiveRegion>>,
}

impl MemoryRegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.regions.read().await.len()
    }
}

#[async_trait]
impl ActiveRegionRegistry for MemoryRegionRegistry {
    async fn record_visit(&self, key: &CoordinateKey, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut regions = self.regions.write().await;
        regions
            .entry(key.clone())
            .and_modify(|region| {
                region.last_requested_at = at;
                region.request_count += 1;
            })
            .or_insert_with(|| ActiveRegion {
                key: key.clone(),
                last_requested_at: at,
                request_count: 1,
                created_at: at,
            });
        debug!("Recorded visit for region {}", key);
        Ok(())
    }

    async fn list_active(&self, cutoff: DateTime<Utc>) -> Result<Vec<CoordinateKey>, StoreError> {
        let regions = self.regions.read().await;
        let mut active: Vec<&ActiveRegion> = regions
            .values()
            .filter(|region| region.last_requested_at >= cutoff)
            .collect();
        active.sort_by(|a, b| b.last_requested_at.cmp(&a.last_requested_at));
        Ok(active.into_iter().map(|region| region.key.clone()).collect())
    }

    async fn sweep(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut regions = self.regions.write().await;
        let before = regions.len();
        regions.retain(|_, region| region.last_requested_at >= cutoff);
        Ok((before - regions.len()) as u64)
    }

    async fn get(&self, key: &CoordinateKey) -> Result<Option<ActiveRegion>, StoreError> {
        Ok(self.regions.read().await.get(key).cloned())
    }
}
