use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::models::{AirQuality, Forecast, HourlyPoint};
use crate::upstream::client::FetchError;

/// Hours kept after the current point
pub const MAX_FORECAST_POINTS: usize = 48;

pub const HOURLY_VARIABLES: &str = "temperature_2m,relative_humidity_2m,wind_speed_10m,wind_gusts_10m,uv_index,precipitation_probability";

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub utc_offset_seconds: i64,
    #[serde(default)]
    pub hourly: Option<HourlySeries>,
}

/// Column-oriented hourly arrays; `time` holds local wall-clock minutes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relative_humidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_speed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub wind_gusts_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub uv_index: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirQualityResponse {
    #[serde(default)]
    pub current: Option<AirQualityCurrent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AirQualityCurrent {
    #[serde(default)]
    pub us_aqi: Option<f64>,
}

/// Normalize the hourly series around `now`.
///
/// The first point at or after `now` becomes current; up to
/// `MAX_FORECAST_POINTS` following points become the forecast.
pub fn parse_forecast(response: &ForecastResponse, now: DateTime<Utc>) -> Result<Forecast, FetchError> {
    let series = response
        .hourly
        .as_ref()
        .ok_or_else(|| FetchError::Parse("missing hourly series".to_string()))?;

    let len = series.time.len();
    if len == 0 {
        return Err(FetchError::Parse("empty hourly series".to_string()));
    }

    let offset = i32::try_from(response.utc_offset_seconds)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            FetchError::Parse(format!("invalid utc_offset_seconds: {}", response.utc_offset_seconds))
        })?;

    let temperature = column("temperature_2m", &series.temperature_2m, len)?;
    let humidity = column("relative_humidity_2m", &series.relative_humidity_2m, len)?;
    let wind_speed = column("wind_speed_10m", &series.wind_speed_10m, len)?;
    let wind_gusts = column("wind_gusts_10m", &series.wind_gusts_10m, len)?;
    let uv_index = column("uv_index", &series.uv_index, len)?;
    let precipitation = column("precipitation_probability", &series.precipitation_probability, len)?;

    let mut points = Vec::with_capacity(len);
    for (i, raw) in series.time.iter().enumerate() {
        points.push(HourlyPoint {
            time: parse_local_time(raw, &offset)?,
            temperature_c: value_at(temperature, i),
            relative_humidity: value_at(humidity, i),
            wind_speed_kmh: value_at(wind_speed, i),
            wind_gusts_kmh: value_at(wind_gusts, i),
            uv_index: value_at(uv_index, i),
            precipitation_probability: value_at(precipitation, i),
        });
    }

    let current_index = points
        .iter()
        .position(|point| point.time >= now)
        .ok_or_else(|| FetchError::Parse("no hourly point at or after now".to_string()))?;

    let current = points[current_index].clone();
    let hourly = points
        .into_iter()
        .skip(current_index + 1)
        .take(MAX_FORECAST_POINTS)
        .collect();

    Ok(Forecast { current, hourly })
}

/// A response without an index is treated as a provider failure
pub fn parse_air_quality(response: &AirQualityResponse) -> Result<AirQuality, FetchError> {
    let index = response
        .current
        .as_ref()
        .and_then(|current| current.us_aqi)
        .filter(|value| value.is_finite() && *value >= 0.0)
        .ok_or_else(|| FetchError::Parse("missing current.us_aqi".to_string()))?;

    Ok(AirQuality::measured(index.round() as i64))
}

// An absent variable is all-null; a present one must line up with `time`
fn column<'a>(
    name: &str,
    values: &'a [Option<f64>],
    len: usize,
) -> Result<Option<&'a [Option<f64>]>, FetchError> {
    if values.is_empty() {
        return Ok(None);
    }
    if values.len() != len {
        return Err(FetchError::Parse(format!(
            "hourly.{name} has {} values for {len} timestamps",
            values.len()
        )));
    }
    Ok(Some(values))
}

fn value_at(column: Option<&[Option<f64>]>, index: usize) -> Option<f64> {
    column.and_then(|values| values[index])
}

fn parse_local_time(raw: &str, offset: &FixedOffset) -> Result<DateTime<Utc>, FetchError> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| FetchError::Parse(format!("invalid hourly timestamp: {raw}")))?;

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| FetchError::Parse(format!("unrepresentable hourly timestamp: {raw}")))
}
