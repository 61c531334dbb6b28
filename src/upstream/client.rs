use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Config;
use crate::upstream::models::{AirQualityResponse, ForecastResponse, HOURLY_VARIABLES};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} provider returned status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{0} provider request timed out")]
    Timeout(&'static str),

    #[error("Parse error: {0}")]
    Parse(String),
}

const FORECAST: &str = "forecast";
const AIR_QUALITY: &str = "air-quality";

/// Client for the open-meteo forecast and air-quality endpoints.
///
/// Every call is bounded by the reqwest client timeout. When a rate limit is
/// configured both endpoints draw from one shared quota.
#[derive(Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    forecast_url: String,
    air_quality_url: String,
    forecast_days: u32,
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl OpenMeteoClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("weather-cache-service/", env!("CARGO_PKG_VERSION")))
            .timeout(config.upstream_timeout)
            .build()?;

        let limiter = config
            .upstream_rate_limit
            .and_then(NonZeroU32::new)
            .map(|rate| Arc::new(RateLimiter::direct(Quota::per_second(rate))));

        info!(
            "Initializing upstream client: forecast={}, air_quality={}, timeout={:?}, rate_limit={:?}",
            config.forecast_api_url,
            config.air_quality_api_url,
            config.upstream_timeout,
            config.upstream_rate_limit
        );

        Ok(Self {
            http,
            forecast_url: config.forecast_api_url.clone(),
            air_quality_url: config.air_quality_api_url.clone(),
            forecast_days: config.forecast_days,
            limiter,
        })
    }

    /// Hourly forecast series for a point
    pub async fn get_forecast(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<ForecastResponse, FetchError> {
        self.throttle().await;
        debug!("Requesting forecast for ({}, {}) tz={}", latitude, longitude, timezone);

        let response = self
            .http
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("timezone", timezone.to_string()),
                ("forecast_days", self.forecast_days.to_string()),
                ("hourly", HOURLY_VARIABLES.to_string()),
            ])
            .send()
            .await
            .map_err(|e| classify(FORECAST, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { provider: FORECAST, status: status.as_u16() });
        }

        response
            .json::<ForecastResponse>()
            .await
            .map_err(|e| classify(FORECAST, e))
    }

    /// Current US AQI for a point
    pub async fn get_air_quality(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<AirQualityResponse, FetchError> {
        self.throttle().await;
        debug!("Requesting air quality for ({}, {}) tz={}", latitude, longitude, timezone);

        let response = self
            .http
            .get(&self.air_quality_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("timezone", timezone.to_string()),
                ("current", "us_aqi".to_string()),
            ])
            .send()
            .await
            .map_err(|e| classify(AIR_QUALITY, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { provider: AIR_QUALITY, status: status.as_u16() });
        }

        response
            .json::<AirQualityResponse>()
            .await
            .map_err(|e| classify(AIR_QUALITY, e))
    }

    async fn throttle(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

fn classify(provider: &'static str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(provider)
    } else if err.is_decode() {
        FetchError::Parse(format!("{provider} response body: {err}"))
    } else {
        FetchError::Http(err)
    }
}
