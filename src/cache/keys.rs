//! Coordinate key normalization

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-point scale for cache keys: 4 decimal places (~11m).
pub const COORDINATE_SCALE: f64 = 10_000.0;

/// Identity shared by the weather cache and the active-region registry.
///
/// Latitude and longitude are held as fixed-point integers so that two raw
/// coordinates within 0.00005° of each other compare (and hash) equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinateKey {
    lat_e4: i64,
    lon_e4: i64,
    timezone: String,
}

impl CoordinateKey {
    /// Create a key from raw coordinates, rounding to 4 decimal places
    pub fn new(latitude: f64, longitude: f64, timezone: &str) -> Self {
        Self {
            lat_e4: to_fixed(latitude),
            lon_e4: to_fixed(longitude),
            timezone: timezone.trim().to_string(),
        }
    }

    /// Rebuild a key from its stored fixed-point form
    pub fn from_fixed(lat_e4: i64, lon_e4: i64, timezone: impl Into<String>) -> Self {
        Self {
            lat_e4,
            lon_e4,
            timezone: timezone.into(),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.lat_e4 as f64 / COORDINATE_SCALE
    }

    pub fn longitude(&self) -> f64 {
        self.lon_e4 as f64 / COORDINATE_SCALE
    }

    pub fn lat_e4(&self) -> i64 {
        self.lat_e4
    }

    pub fn lon_e4(&self) -> i64 {
        self.lon_e4
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}:{:.4}:{}", self.latitude(), self.longitude(), self.timezone)
    }
}

fn to_fixed(value: f64) -> i64 {
    (value * COORDINATE_SCALE).round() as i64
}
