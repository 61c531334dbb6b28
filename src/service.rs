//! Request-facing weather cache facade.
//!
//! `get_weather` validates and normalizes the coordinate, records the visit,
//! serves a fresh cache entry when one exists and otherwise fetches from
//! upstream. Persistence failures never reach the caller: each one is
//! captured as a [`Degradation`] and logged. Only validation and upstream
//! forecast failures are returned as errors.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{ActiveRegionRegistry, CacheStore, CoordinateKey, RequestLog};
use crate::db::StoreError;
use crate::models::{DataSource, RequestLogEntry, WeatherSnapshot};
use crate::scheduler::clock::Clock;
use crate::state::Storage;
use crate::upstream::{FetchError, Fetcher};
use crate::validation::{validate_coordinates, ValidationError};

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Upstream fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// A persistence failure that was swallowed on the request path
#[derive(Error, Debug)]
pub enum Degradation {
    #[error("visit not recorded: {0}")]
    VisitNotRecorded(StoreError),

    #[error("cache read failed, treated as miss: {0}")]
    CacheReadFailed(StoreError),

    #[error("cache write failed, snapshot served unpersisted: {0}")]
    CacheWriteFailed(StoreError),

    #[error("request log append failed: {0}")]
    RequestLogFailed(StoreError),
}

/// Per-region failure inside a refresh batch
#[derive(Error, Debug)]
pub enum RefreshError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("cache write failed: {0}")]
    Store(#[from] StoreError),

    #[error("refresh exceeded {0:?}")]
    Timeout(Duration),
}

/// Snapshot plus every degradation hit while producing it
#[derive(Debug)]
pub struct Lookup {
    pub snapshot: WeatherSnapshot,
    pub degraded: Vec<Degradation>,
}

pub struct WeatherService {
    fetcher: Arc<dyn Fetcher>,
    cache: Arc<dyn CacheStore>,
    regions: Arc<dyn ActiveRegionRegistry>,
    request_log: Arc<dyn RequestLog>,
    clock: Arc<dyn Clock>,
    freshness: chrono::Duration,
}

impl WeatherService {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        storage: &Storage,
        clock: Arc<dyn Clock>,
        freshness: Duration,
    ) -> Self {
        Self {
            fetcher,
            cache: storage.cache.clone(),
            regions: storage.regions.clone(),
            request_log: storage.request_log.clone(),
            clock,
            freshness: chrono::Duration::from_std(freshness)
                .unwrap_or_else(|_| chrono::Duration::hours(12)),
        }
    }

    /// Fresh snapshot for a coordinate, from cache or upstream
    pub async fn get_weather(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.lookup(latitude, longitude, timezone)
            .await
            .map(|lookup| lookup.snapshot)
    }

    /// Same as `get_weather`, also reporting swallowed persistence failures
    pub async fn lookup(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<Lookup, WeatherError> {
        validate_coordinates(latitude, longitude, timezone)?;
        let key = CoordinateKey::new(latitude, longitude, timezone);
        let now = self.clock.now();
        let mut degraded = Vec::new();

        if let Err(e) = self.regions.record_visit(&key, now).await {
            degraded.push(self.degrade(&key, Degradation::VisitNotRecorded(e)));
        }

        let cached = match self.cache.get(&key).await {
            Ok(entry) => entry,
            Err(e) => {
                degraded.push(self.degrade(&key, Degradation::CacheReadFailed(e)));
                None
            }
        };

        if let Some(entry) = cached.filter(|entry| entry.is_fresh(now, self.freshness)) {
            debug!(key = %key, last_updated = %entry.last_updated, "Serving weather from cache");
            self.log_request(&key, now, DataSource::Cache, &mut degraded).await;
            return Ok(Lookup {
                snapshot: entry.to_snapshot(DataSource::Cache),
                degraded,
            });
        }

        // No stale fallback: a failed fetch is the caller's error
        let fetched = self
            .fetcher
            .fetch(key.latitude(), key.longitude(), key.timezone())
            .await
            .map_err(|e| {
                warn!(key = %key, error = %e, "Upstream fetch failed");
                e
            })?;

        let written_at = self.clock.now();
        if let Err(e) = self
            .cache
            .upsert(
                &key,
                &fetched.forecast,
                fetched.air_quality.index,
                &fetched.air_quality.status,
                written_at,
            )
            .await
        {
            degraded.push(self.degrade(&key, Degradation::CacheWriteFailed(e)));
        }

        info!(key = %key, aqi = fetched.air_quality.index, "Serving weather from upstream");
        self.log_request(&key, written_at, DataSource::Api, &mut degraded).await;

        Ok(Lookup {
            snapshot: WeatherSnapshot::from_fetched(&fetched, DataSource::Api),
            degraded,
        })
    }

    /// Fetch and persist one region for the batch refresh.
    ///
    /// Unlike the request path this neither records a visit nor writes the
    /// request log, and a failed write is an error.
    pub async fn refresh_region(&self, key: &CoordinateKey) -> Result<(), RefreshError> {
        let fetched = self
            .fetcher
            .fetch(key.latitude(), key.longitude(), key.timezone())
            .await?;

        self.cache
            .upsert(
                key,
                &fetched.forecast,
                fetched.air_quality.index,
                &fetched.air_quality.status,
                self.clock.now(),
            )
            .await?;

        debug!(key = %key, "Refreshed region");
        Ok(())
    }

    async fn log_request(
        &self,
        key: &CoordinateKey,
        at: DateTime<Utc>,
        source: DataSource,
        degraded: &mut Vec<Degradation>,
    ) {
        let entry = RequestLogEntry {
            key: key.clone(),
            requested_at: at,
            source,
        };
        if let Err(e) = self.request_log.append(&entry).await {
            degraded.push(self.degrade(key, Degradation::RequestLogFailed(e)));
        }
    }

    fn degrade(&self, key: &CoordinateKey, degradation: Degradation) -> Degradation {
        warn!(key = %key, "Degraded: {}", degradation);
        degradation
    }
}
