use crate::cache::WeatherCache;
use common::errors::AppError;
use common::http_client::HttpClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

/// Forecast timezone sent with every request; hour 0 is local midnight there
const FORECAST_TIMEZONE: &str = "Europe/Madrid";

#[derive(Debug, Serialize)]
struct ForecastQuery<'a> {
    latitude: f64,
    longitude: f64,
    hourly: &'a str,
    temperature_unit: &'a str,
    timezone: &'a str,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: HourlySeries,
}

#[derive(Debug, Deserialize)]
struct HourlySeries {
    temperature_2m: Vec<Option<f64>>,
}

pub struct OpenMeteoClient {
    http_client: HttpClient,
    cache: Arc<WeatherCache>,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(http_client: HttpClient, cache: Arc<WeatherCache>, base_url: String) -> Self {
        Self {
            http_client,
            cache,
            base_url,
        }
    }

    /// Current temperature for a city, in Celsius.
    ///
    /// Served from the cache when present. Otherwise one forecast request is
    /// made and the first hourly sample is cached under `city`. `Ok(None)`
    /// means the upstream returned a null sample.
    #[instrument(skip(self), fields(city = %city))]
    pub async fn get_temperature(
        &self,
        city: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<f64>, AppError> {
        if let Some(cached) = self.cache.get(city).await {
            info!(city = %city, "Cache hit");
            return Ok(Some(cached));
        }

        info!(city = %city, "Fetching forecast from API");

        let query = ForecastQuery {
            latitude,
            longitude,
            hourly: "temperature_2m",
            temperature_unit: "celsius",
            timezone: FORECAST_TIMEZONE,
        };
        let response: ForecastResponse = self.http_client.get_json(&self.base_url, &query).await?;

        let first = response
            .hourly
            .temperature_2m
            .first()
            .copied()
            .ok_or_else(|| AppError::internal("Forecast contained no hourly temperature samples"))?;

        if let Some(temperature) = first {
            self.cache.set(city.to_string(), temperature).await;
        }

        Ok(first)
    }
}
