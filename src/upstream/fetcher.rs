use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{AirQuality, FetchedWeather, DEFAULT_AQI, DEFAULT_AQI_STATUS};
use crate::scheduler::clock::Clock;
use crate::upstream::client::{FetchError, OpenMeteoClient};
use crate::upstream::models::{parse_air_quality, parse_forecast, AirQualityResponse, ForecastResponse};

/// Produces a normalized snapshot for a point from the upstream providers
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<FetchedWeather, FetchError>;
}

pub struct HttpFetcher {
    client: OpenMeteoClient,
    clock: Arc<dyn Clock>,
}

impl HttpFetcher {
    pub fn new(client: OpenMeteoClient, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        latitude: f64,
        longitude: f64,
        timezone: &str,
    ) -> Result<FetchedWeather, FetchError> {
        // Both calls are in flight together; the join waits for both
        let (forecast, air_quality) = join(
            self.client.get_forecast(latitude, longitude, timezone),
            self.client.get_air_quality(latitude, longitude, timezone),
        )
        .await;

        assemble(forecast, air_quality, self.clock.now(), latitude, longitude)
    }
}

/// Combine the two provider results.
///
/// A forecast failure fails the whole fetch. An air-quality failure is
/// replaced by the default reading and only logged.
pub fn assemble(
    forecast: Result<ForecastResponse, FetchError>,
    air_quality: Result<AirQualityResponse, FetchError>,
    now: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
) -> Result<FetchedWeather, FetchError> {
    let forecast = parse_forecast(&forecast?, now)?;

    let air_quality = match air_quality.and_then(|response| parse_air_quality(&response)) {
        Ok(reading) => {
            debug!(lat = latitude, lon = longitude, aqi = reading.index, "Air quality reading received");
            reading
        }
        Err(e) => {
            warn!(
                lat = latitude,
                lon = longitude,
                error = %e,
                "Air quality unavailable, substituting default aqi={} status={}",
                DEFAULT_AQI,
                DEFAULT_AQI_STATUS
            );
            AirQuality::fallback()
        }
    };

    Ok(FetchedWeather { forecast, air_quality })
}
