// Configuration for:
// - storage backend and database connection string
// - upstream forecast / air-quality endpoints, timeouts and rate limit
// - freshness window, liveness window and refresh pacing

use dotenv::dotenv;
use std::env;
use std::time::Duration;

/// Upper bounds for window settings; larger values fall back to the defaults
pub const MAX_FRESHNESS_HOURS: u64 = 24 * 365;
pub const MAX_ACTIVE_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "in_memory" => Self::Memory,
            _ => Self::Sqlite,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub storage_backend: StorageBackend,
    pub forecast_api_url: String,
    pub air_quality_api_url: String,
    pub upstream_timeout: Duration,
    pub upstream_rate_limit: Option<u32>,
    pub forecast_days: u32,
    pub freshness_window: Duration,
    pub active_window_days: i64,
    pub refresh_delay: Duration,
    pub refresh_region_timeout: Duration,
    pub cache_max_capacity: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:weather_cache.db".to_string(),
            storage_backend: StorageBackend::Sqlite,
            forecast_api_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            air_quality_api_url: "https://air-quality-api.open-meteo.com/v1/air-quality"
                .to_string(),
            upstream_timeout: Duration::from_secs(10),
            upstream_rate_limit: None,
            forecast_days: 3,
            freshness_window: Duration::from_secs(12 * 60 * 60),
            active_window_days: 10,
            refresh_delay: Duration::from_millis(100),
            refresh_region_timeout: Duration::from_secs(30),
            cache_max_capacity: 10_000,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let database_url = env::var("DATABASE_URL").unwrap_or(defaults.database_url);
        let storage_backend = env::var("STORAGE_BACKEND")
            .map(|v| StorageBackend::parse(&v))
            .unwrap_or(defaults.storage_backend);
        let forecast_api_url = env::var("FORECAST_API_URL").unwrap_or(defaults.forecast_api_url);
        let air_quality_api_url =
            env::var("AIR_QUALITY_API_URL").unwrap_or(defaults.air_quality_api_url);
        let upstream_timeout = env::var("UPSTREAM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.upstream_timeout);
        let upstream_rate_limit = env::var("UPSTREAM_RATE_LIMIT")
            .map(|v| v.parse().ok())
            .unwrap_or(None)
            .filter(|limit: &u32| *limit > 0);
        let forecast_days = env::var("FORECAST_DAYS")
            .map(|v| v.parse().unwrap_or(defaults.forecast_days))
            .unwrap_or(defaults.forecast_days);
        let freshness_window = env::var("FRESHNESS_HOURS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|hours| (1..=MAX_FRESHNESS_HOURS).contains(hours))
            .and_then(|hours| hours.checked_mul(60 * 60))
            .map(Duration::from_secs)
            .unwrap_or(defaults.freshness_window);
        let active_window_days = env::var("ACTIVE_WINDOW_DAYS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|days| (1..=MAX_ACTIVE_WINDOW_DAYS).contains(days))
            .unwrap_or(defaults.active_window_days);
        let refresh_delay = env::var("REFRESH_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.refresh_delay);
        let refresh_region_timeout = env::var("REFRESH_REGION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.refresh_region_timeout);
        let cache_max_capacity = env::var("CACHE_MAX_CAPACITY")
            .map(|v| v.parse().unwrap_or(defaults.cache_max_capacity))
            .unwrap_or(defaults.cache_max_capacity);

        Self {
            database_url,
            storage_backend,
            forecast_api_url,
            air_quality_api_url,
            upstream_timeout,
            upstream_rate_limit,
            forecast_days,
            freshness_window,
            active_window_days,
            refresh_delay,
            refresh_region_timeout,
            cache_max_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parse() {
        assert_eq!(StorageBackend::parse("memory"), StorageBackend::Memory);
        assert_eq!(StorageBackend::parse(" In-Memory "), StorageBackend::Memory);
        assert_eq!(StorageBackend::parse("sqlite"), StorageBackend::Sqlite);
        assert_eq!(StorageBackend::parse("anything"), StorageBackend::Sqlite);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.freshness_window, Duration::from_secs(43_200));
        assert_eq!(config.active_window_days, 10);
        assert_eq!(config.refresh_delay, Duration::from_millis(100));
        assert!(config.upstream_rate_limit.is_none());
    }

    #[test]
    fn test_out_of_range_windows_fall_back_to_defaults() {
        env::set_var("FRESHNESS_HOURS", "18446744073709551615");
        env::set_var("ACTIVE_WINDOW_DAYS", "9223372036854775807");
        let config = Config::from_env();
        assert_eq!(config.freshness_window, Duration::from_secs(43_200));
        assert_eq!(config.active_window_days, 10);

        env::set_var("FRESHNESS_HOURS", "0");
        env::set_var("ACTIVE_WINDOW_DAYS", "-3");
        let config = Config::from_env();
        assert_eq!(config.freshness_window, Duration::from_secs(43_200));
        assert_eq!(config.active_window_days, 10);

        env::set_var("FRESHNESS_HOURS", "6");
        env::set_var("ACTIVE_WINDOW_DAYS", "30");
        let config = Config::from_env();
        assert_eq!(config.freshness_window, Duration::from_secs(6 * 3600));
        assert_eq!(config.active_window_days, 30);

        env::remove_var("FRESHNESS_HOURS");
        env::remove_var("ACTIVE_WINDOW_DAYS");
    }
}
