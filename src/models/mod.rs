// Snapshot, cache entry, active region and request log models
// shared by the service, the stores and the scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::keys::CoordinateKey;

/// AQI substituted when the air-quality provider is unavailable
pub const DEFAULT_AQI: i64 = 50;
pub const DEFAULT_AQI_STATUS: &str = "moderate-default";

/// Where a snapshot handed to the caller came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Cache,
    Api,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Api => "api",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "cache" => Some(Self::Cache),
            "api" => Some(Self::Api),
            _ => None,
        }
    }
}

/// Whether an AQI value is a real provider reading or the fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AqiSource {
    Measured,
    Default,
}

/// One point of the hourly forecast series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub time: DateTime<Utc>,
    pub temperature_c: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_gusts_kmh: Option<f64>,
    pub uv_index: Option<f64>,
    pub precipitation_probability: Option<f64>,
}

/// Normalized forecast; this is the payload blob persisted in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub current: HourlyPoint,
    pub hourly: Vec<HourlyPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQuality {
    pub index: i64,
    pub status: String,
    pub source: AqiSource,
}

impl AirQuality {
    /// A real reading, labelled by US AQI band
    pub fn measured(index: i64) -> Self {
        Self {
            index,
            status: aqi_status(index).to_string(),
            source: AqiSource::Measured,
        }
    }

    pub fn fallback() -> Self {
        Self {
            index: DEFAULT_AQI,
            status: DEFAULT_AQI_STATUS.to_string(),
            source: AqiSource::Default,
        }
    }

    /// Rebuild from the stored index and label
    pub fn from_stored(index: i64, status: String) -> Self {
        let source = if status == DEFAULT_AQI_STATUS {
            AqiSource::Default
        } else {
            AqiSource::Measured
        };
        Self { index, status, source }
    }
}

/// US EPA AQI band label
pub fn aqi_status(index: i64) -> &'static str {
    match index {
        i64::MIN..=50 => "good",
        51..=100 => "moderate",
        101..=150 => "unhealthy-for-sensitive-groups",
        151..=200 => "unhealthy",
        201..=300 => "very-unhealthy",
        _ => "hazardous",
    }
}

/// What the fetcher hands back: forecast plus air quality
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedWeather {
    pub forecast: Forecast,
    pub air_quality: AirQuality,
}

/// Snapshot delivered to the downstream consumer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: HourlyPoint,
    pub forecast: Vec<HourlyPoint>,
    pub aqi: i64,
    pub aqi_status: String,
    pub aqi_source: AqiSource,
    pub source: DataSource,
}

impl WeatherSnapshot {
    pub fn from_fetched(fetched: &FetchedWeather, source: DataSource) -> Self {
        Self {
            current: fetched.forecast.current.clone(),
            forecast: fetched.forecast.hourly.clone(),
            aqi: fetched.air_quality.index,
            aqi_status: fetched.air_quality.status.clone(),
            aqi_source: fetched.air_quality.source,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CoordinateKey,
    pub payload: Forecast,
    pub aqi: i64,
    pub aqi_status: String,
    pub last_updated: DateTime<Utc>,
    pub next_update_time: DateTime<Utc>,
}

impl CacheEntry {
    /// Rolling freshness check, independent of `next_update_time`
    pub fn is_fresh(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        now.signed_duration_since(self.last_updated) < window
    }

    pub fn to_snapshot(&self, source: DataSource) -> WeatherSnapshot {
        let air_quality = AirQuality::from_stored(self.aqi, self.aqi_status.clone());
        WeatherSnapshot {
            current: self.payload.current.clone(),
            forecast: self.payload.hourly.clone(),
            aqi: air_quality.index,
            aqi_status: air_quality.status,
            aqi_source: air_quality.source,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveRegion {
    pub key: CoordinateKey,
    pub last_requested_at: DateTime<Utc>,
    pub request_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub key: CoordinateKey,
    pub requested_at: DateTime<Utc>,
    pub source: DataSource,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(hour: u32) -> HourlyPoint {
        HourlyPoint {
            time: Utc.with_ymd_and_hms(2026, 10, 16, hour, 0, 0).unwrap(),
            temperature_c: Some(20.5),
            relative_humidity: Some(60.0),
            wind_speed_kmh: Some(8.2),
            wind_gusts_kmh: None,
            uv_index: Some(3.0),
            precipitation_probability: Some(10.0),
        }
    }

    #[test]
    fn test_aqi_bands() {
        assert_eq!(aqi_status(0), "good");
        assert_eq!(aqi_status(50), "good");
        assert_eq!(aqi_status(51), "moderate");
        assert_eq!(aqi_status(150), "unhealthy-for-sensitive-groups");
        assert_eq!(aqi_status(200), "unhealthy");
        assert_eq!(aqi_status(300), "very-unhealthy");
        assert_eq!(aqi_status(301), "hazardous");
    }

    #[test]
    fn test_fallback_is_distinguishable() {
        let fallback = AirQuality::fallback();
        assert_eq!(fallback.index, 50);
        assert_eq!(fallback.status, "moderate-default");
        assert_eq!(fallback.source, AqiSource::Default);

        // A real reading of 50 carries a different label
        let measured = AirQuality::measured(50);
        assert_eq!(measured.status, "good");
        assert_ne!(measured, fallback);

        let stored = AirQuality::from_stored(50, DEFAULT_AQI_STATUS.to_string());
        assert_eq!(stored.source, AqiSource::Default);
    }

    #[test]
    fn test_freshness_window_is_rolling() {
        let written = Utc.with_ymd_and_hms(2026, 10, 16, 11, 59, 0).unwrap();
        let entry = CacheEntry {
            key: CoordinateKey::new(31.2304, 121.4737, "Asia/Shanghai"),
            payload: Forecast { current: point(12), hourly: vec![point(13)] },
            aqi: 42,
            aqi_status: "good".to_string(),
            last_updated: written,
            next_update_time: Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap(),
        };
        let window = chrono::Duration::hours(12);

        // Past next_update_time but still inside the rolling window
        assert!(entry.is_fresh(written + chrono::Duration::hours(11), window));
        assert!(!entry.is_fresh(written + chrono::Duration::hours(12), window));
        assert!(!entry.is_fresh(written + chrono::Duration::hours(13), window));

        let snapshot = entry.to_snapshot(DataSource::Cache);
        assert_eq!(snapshot.source, DataSource::Cache);
        assert_eq!(snapshot.current, point(12));
        assert_eq!(snapshot.forecast, vec![point(13)]);
        assert_eq!(snapshot.aqi_source, AqiSource::Measured);
    }

    #[test]
    fn test_data_source_round_trip() {
        assert_eq!(DataSource::parse(DataSource::Cache.as_str()), Some(DataSource::Cache));
        assert_eq!(DataSource::parse(DataSource::Api.as_str()), Some(DataSource::Api));
        assert_eq!(DataSource::parse("other"), None);
    }
}
