//! Shared fixtures: stub fetcher, failing stores, manual-clock harness

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::cache::{ActiveRegionRegistry, CacheStore, CoordinateKey, RequestLog};
use crate::config::Config;
use crate::db::StoreError;
use crate::models::{
    ActiveRegion, AirQuality, CacheEntry, FetchedWeather, Forecast, HourlyPoint, RequestLogEntry,
};
use crate::scheduler::clock::{Clock, ManualClock};
use crate::state::{AppState, Storage};
use crate::upstream::{FetchError, Fetcher};

/// A local wall-clock time on a date with no DST transition
pub fn local_at(hour: u32, minute: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(2026, 7, 15, hour, minute, 0)
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}

pub fn shanghai() -> CoordinateKey {
    CoordinateKey::new(31.2304, 121.4737, "Asia/Shanghai")
}

pub fn sample_weather(now: DateTime<Utc>, temperature: f64) -> FetchedWeather {
    let point = |hours: i64| HourlyPoint {
        time: now + chrono::Duration::hours(hours),
        temperature_c: Some(temperature + hours as f64 * 0.1),
        relative_humidity: Some(62.0),
        wind_speed_kmh: Some(9.3),
        wind_gusts_kmh: Some(17.8),
        uv_index: Some(2.0),
        precipitation_probability: Some(15.0),
    };
    FetchedWeather {
        forecast: Forecast {
            current: point(0),
            hourly: (1..=48).map(point).collect(),
        },
        air_quality: AirQuality::measured(42),
    }
}

/// Fetcher double: counts calls, can fail, hang or stall per coordinate.
/// Each call returns a distinct temperature so refreshes are observable.
pub struct StubFetcher {
    clock: Arc<dyn Clock>,
    calls: AtomicUsize,
    failing: Mutex<HashSet<CoordinateKey>>,
    hanging: Mutex<HashSet<CoordinateKey>>,
    latency: Mutex<Option<Duration>>,
    notify: Option<mpsc::UnboundedSender<tokio::time::Instant>>,
}

impl StubFetcher {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            calls: AtomicUsize::new(0),
            failing: Mutex::new(HashSet::new()),
            hanging: Mutex::new(HashSet::new()),
            latency: Mutex::new(None),
            notify: None,
        }
    }

    /// Also report the (tokio) instant of every call
    pub fn with_calls(clock: Arc<dyn Clock>) -> (Self, mpsc::UnboundedReceiver<tokio::time::Instant>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut fetcher = Self::new(clock);
        fetcher.notify = Some(tx);
        (fetcher, rx)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_for(&self, key: &CoordinateKey) {
        self.failing.lock().unwrap().insert(key.clone());
    }

    pub fn recover(&self, key: &CoordinateKey) {
        self.failing.lock().unwrap().remove(key);
    }

    pub fn hang_for(&self, key: &CoordinateKey) {
        self.hanging.lock().unwrap().insert(key.clone());
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<FetchedWeather, FetchError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(tx) = &self.notify {
            let _ = tx.send(tokio::time::Instant::now());
        }

        let key = CoordinateKey::new(latitude, longitude, timezone);
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let hang = self.hanging.lock().unwrap().contains(&key);
        if hang {
            futures::future::pending::<()>().await;
        }
        if self.failing.lock().unwrap().contains(&key) {
            return Err(FetchError::Status { provider: "forecast", status: 503 });
        }

        Ok(sample_weather(self.clock.now(), 20.0 + call as f64))
    }
}

pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &CoordinateKey) -> Result<Option<CacheEntry>, StoreError> {
        Err(StoreError::Unavailable("cache offline".to_string()))
    }

    async fn upsert(
        &self,
        _key: &CoordinateKey,
        _payload: &Forecast,
        _aqi: i64,
        _aqi_status: &str,
        _now: DateTime<Utc>,
    ) -> Result<CacheEntry, StoreError> {
        Err(StoreError::Unavailable("cache offline".to_string()))
    }
}

pub struct FailingRegistry;

#[async_trait]
impl ActiveRegionRegistry for FailingRegistry {
    async fn record_visit(&self, _key: &CoordinateKey, _at: DateTime<Utc>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("registry offline".to_string()))
    }

    async fn list_active(&self, _cutoff: DateTime<Utc>) -> Result<Vec<CoordinateKey>, StoreError> {
        Err(StoreError::Unavailable("registry offline".to_string()))
    }

    async fn sweep(&self, _cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        Err(StoreError::Unavailable("registry offline".to_string()))
    }

    async fn get(&self, _key: &CoordinateKey) -> Result<Option<ActiveRegion>, StoreError> {
        Err(StoreError::Unavailable("registry offline".to_string()))
    }
}

pub struct FailingRequestLog;

#[async_trait]
impl RequestLog for FailingRequestLog {
    async fn append(&self, _entry: &RequestLogEntry) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("log offline".to_string()))
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<RequestLogEntry>, StoreError> {
        Err(StoreError::Unavailable("log offline".to_string()))
    }
}

/// Cache store that fails only for selected keys on write
pub struct FlakyWriteCacheStore {
    inner: Arc<dyn CacheStore>,
    rejected: HashSet<CoordinateKey>,
}

impl FlakyWriteCacheStore {
    pub fn new(inner: Arc<dyn CacheStore>, rejected: &[CoordinateKey]) -> Self {
        Self {
            inner,
            rejected: rejected.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl CacheStore for FlakyWriteCacheStore {
    async fn get(&self, key: &CoordinateKey) -> Result<Option<CacheEntry>, StoreError> {
        self.inner.get(key).await
    }

    async fn upsert(
        &self,
        key: &CoordinateKey,
        payload: &Forecast,
        aqi: i64,
        aqi_status: &str,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry, StoreError> {
        if self.rejected.contains(key) {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.inner.upsert(key, payload, aqi, aqi_status, now).await
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub fetcher: Arc<StubFetcher>,
    pub storage: Storage,
    pub state: AppState,
}

pub fn test_config() -> Config {
    Config {
        refresh_delay: Duration::from_millis(100),
        refresh_region_timeout: Duration::from_secs(30),
        ..Config::default()
    }
}

impl Harness {
    pub fn new(storage: Storage, start: DateTime<Utc>) -> Self {
        let clock = Arc::new(ManualClock::new(start));
        let fetcher = Arc::new(StubFetcher::new(clock.clone()));
        Self::with_fetcher(storage, clock, fetcher)
    }

    pub fn with_fetcher(storage: Storage, clock: Arc<ManualClock>, fetcher: Arc<StubFetcher>) -> Self {
        let state = AppState::assemble(test_config(), storage.clone(), fetcher.clone(), clock.clone());
        Self {
            clock,
            fetcher,
            storage,
            state,
        }
    }
}
